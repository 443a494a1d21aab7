use crate::{
    entities::{categories, courses, enrollments, lessons},
    error::{Result, ServiceError},
    services::category::CategoryService,
};
use chrono::Utc;
use log::{debug, info};
use models::{
    course::{CourseOrdering, CourseSortField, Difficulty, validate_course_fields},
    role::{Capability, Principal},
    slug::resolve_slug,
    validation::ValidationError,
};
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, Condition, ConnectionTrait,
    DatabaseConnection, EntityTrait, ModelTrait, Order, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect, Select,
    prelude::Expr,
    sea_query::{Func, LikeExpr},
};
use std::collections::HashMap;
use uuid::Uuid;

pub const DEFAULT_PER_PAGE: u64 = 20;
pub const MAX_PER_PAGE: u64 = 100;

const LIKE_ESCAPE: char = '\\';

fn escape_like(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(c, '%' | '_' | LIKE_ESCAPE) {
            escaped.push(LIKE_ESCAPE);
        }
        escaped.push(c);
    }
    escaped
}

/// Filters and paging of a course listing
#[derive(Debug, Clone)]
pub struct CourseQuery {
    pub page: u64,
    pub per_page: u64,
    pub category: Option<String>,
    pub difficulty: Option<Difficulty>,
    pub free: Option<bool>,
    pub search: Option<String>,
    /// Teachers only: restrict to courses they own
    pub my_courses: bool,
    pub ordering: CourseOrdering,
}

impl Default for CourseQuery {
    fn default() -> Self {
        Self {
            page: 1,
            per_page: DEFAULT_PER_PAGE,
            category: None,
            difficulty: None,
            free: None,
            search: None,
            my_courses: false,
            ordering: CourseOrdering::default(),
        }
    }
}

/// A listed course with its aggregate counts
#[derive(Debug, Clone)]
pub struct CourseSummary {
    pub course: courses::Model,
    pub category: Option<categories::Model>,
    pub lessons_count: u64,
    pub students_count: u64,
}

#[derive(Debug, Clone)]
pub struct CourseDetail {
    pub course: courses::Model,
    pub category: Option<categories::Model>,
    pub lessons: Vec<lessons::Model>,
    pub enrolled_students_count: u64,
    /// Whether the caller is enrolled
    pub is_enrolled: bool,
}

pub struct NewCourse {
    pub title: String,
    pub slug: Option<String>,
    pub description: String,
    pub category_id: Option<Uuid>,
    pub thumbnail: Option<String>,
    pub difficulty: Difficulty,
    pub price_cents: i64,
    pub duration_hours: i32,
    pub is_published: bool,
}

/// Partial update; `None` leaves a field untouched
#[derive(Debug, Default)]
pub struct CourseChanges {
    pub title: Option<String>,
    pub description: Option<String>,
    pub category_id: Option<Option<Uuid>>,
    pub thumbnail: Option<Option<String>>,
    pub difficulty: Option<Difficulty>,
    pub price_cents: Option<i64>,
    pub duration_hours: Option<i32>,
    pub is_published: Option<bool>,
}

pub struct CourseService;

impl CourseService {
    /// Courses the principal may see: published ones, plus a teacher's own
    pub fn visible_to(principal: &Principal) -> Condition {
        let published = courses::Column::IsPublished.eq(true);
        if principal.is_teacher() {
            Condition::any()
                .add(published)
                .add(courses::Column::TeacherId.eq(principal.user_id.as_str()))
        } else {
            Condition::all().add(published)
        }
    }

    /// Query courses with pagination and filtering
    pub async fn list(
        db: &DatabaseConnection,
        principal: &Principal,
        params: CourseQuery,
    ) -> Result<(Vec<CourseSummary>, u64)> {
        if params.page == 0 {
            return Err(ValidationError::new("page", "must be at least 1").into());
        }
        if params.per_page == 0 || params.per_page > MAX_PER_PAGE {
            return Err(ValidationError::new(
                "per_page",
                format!("must be between 1 and {MAX_PER_PAGE}"),
            )
            .into());
        }

        let mut condition = Condition::all().add(Self::visible_to(principal));

        if params.my_courses && principal.is_teacher() {
            condition = condition.add(courses::Column::TeacherId.eq(principal.user_id.as_str()));
        }

        if let Some(slug) = params.category.as_deref() {
            match CategoryService::find_by_slug(db, slug).await? {
                Some(category) => {
                    condition = condition.add(courses::Column::CategoryId.eq(category.id));
                }
                None => return Ok((Vec::new(), 0)),
            }
        }

        if let Some(difficulty) = params.difficulty {
            condition = condition.add(courses::Column::Difficulty.eq(difficulty));
        }

        match params.free {
            Some(true) => condition = condition.add(courses::Column::PriceCents.eq(0)),
            Some(false) => condition = condition.add(courses::Column::PriceCents.gt(0)),
            None => {}
        }

        if let Some(search) = params.search.as_deref().map(str::trim)
            && !search.is_empty()
        {
            condition = condition.add(Self::build_search_condition(search));
        }

        let query =
            Self::apply_ordering(courses::Entity::find().filter(condition), params.ordering);

        let total_items = query.clone().count(db).await?;
        let paginator = query.paginate(db, params.per_page);
        let courses = paginator.fetch_page(params.page - 1).await?; // SeaORM uses 0-based pages

        debug!(
            "Listed {} of {total_items} courses for {} (page {})",
            courses.len(),
            principal.user_id,
            params.page
        );

        Ok((Self::summarize(db, courses).await?, total_items))
    }

    /// Case-insensitive substring match over title, description and teacher.
    /// Wildcards in the search text match literally.
    fn build_search_condition(search: &str) -> Condition {
        let pattern = format!("%{}%", escape_like(&search.to_lowercase()));
        [
            courses::Column::Title,
            courses::Column::Description,
            courses::Column::TeacherId,
        ]
        .into_iter()
        .fold(Condition::any(), |condition, column| {
            condition.add(
                Expr::expr(Func::lower(Expr::col(column)))
                    .like(LikeExpr::new(pattern.clone()).escape(LIKE_ESCAPE)),
            )
        })
    }

    fn apply_ordering(
        query: Select<courses::Entity>,
        ordering: CourseOrdering,
    ) -> Select<courses::Entity> {
        let column = match ordering.field {
            CourseSortField::CreatedAt => courses::Column::CreatedAt,
            CourseSortField::Price => courses::Column::PriceCents,
            CourseSortField::Title => courses::Column::Title,
        };
        let order = if ordering.descending {
            Order::Desc
        } else {
            Order::Asc
        };

        // tie-break on id so pages are stable
        query.order_by(column, order).order_by_asc(courses::Column::Id)
    }

    /// Attaches categories, lesson counts and student counts to a page of courses
    pub async fn summarize<C: ConnectionTrait>(
        db: &C,
        courses: Vec<courses::Model>,
    ) -> Result<Vec<CourseSummary>> {
        if courses.is_empty() {
            return Ok(Vec::new());
        }

        let course_ids: Vec<Uuid> = courses.iter().map(|c| c.id).collect();
        let category_ids: Vec<Uuid> = courses.iter().filter_map(|c| c.category_id).collect();

        let (categories, lesson_counts, student_counts) = futures::try_join!(
            categories::Entity::find()
                .filter(categories::Column::Id.is_in(category_ids))
                .all(db),
            lessons::Entity::find()
                .select_only()
                .column(lessons::Column::CourseId)
                .column_as(Expr::col(lessons::Column::Id).count(), "count")
                .filter(lessons::Column::CourseId.is_in(course_ids.clone()))
                .group_by(lessons::Column::CourseId)
                .into_tuple::<(Uuid, i64)>()
                .all(db),
            enrollments::Entity::find()
                .select_only()
                .column(enrollments::Column::CourseId)
                .column_as(Expr::col(enrollments::Column::Id).count(), "count")
                .filter(enrollments::Column::CourseId.is_in(course_ids))
                .group_by(enrollments::Column::CourseId)
                .into_tuple::<(Uuid, i64)>()
                .all(db),
        )?;

        let categories: HashMap<Uuid, categories::Model> =
            categories.into_iter().map(|c| (c.id, c)).collect();
        let lesson_counts: HashMap<Uuid, i64> = lesson_counts.into_iter().collect();
        let student_counts: HashMap<Uuid, i64> = student_counts.into_iter().collect();

        Ok(courses
            .into_iter()
            .map(|course| CourseSummary {
                category: course.category_id.and_then(|id| categories.get(&id).cloned()),
                lessons_count: lesson_counts.get(&course.id).copied().unwrap_or(0) as u64,
                students_count: student_counts.get(&course.id).copied().unwrap_or(0) as u64,
                course,
            })
            .collect())
    }

    /// Fetches a course the principal may see, or `NotFound`
    pub async fn find_visible<C: ConnectionTrait>(
        db: &C,
        principal: &Principal,
        id: Uuid,
    ) -> Result<courses::Model> {
        courses::Entity::find_by_id(id)
            .filter(Self::visible_to(principal))
            .one(db)
            .await?
            .ok_or_else(|| ServiceError::not_found("course", id))
    }

    /// Fetches a course the principal may manage
    pub async fn find_owned<C: ConnectionTrait>(
        db: &C,
        principal: &Principal,
        id: Uuid,
    ) -> Result<courses::Model> {
        principal.require(Capability::ManageCourses)?;
        let course = Self::find_visible(db, principal, id).await?;
        principal.require_owner(Capability::ManageCourses, &course.teacher_id, "course")?;
        Ok(course)
    }

    /// Get a single course with its lessons and enrollment figures
    pub async fn get(
        db: &DatabaseConnection,
        principal: &Principal,
        id: Uuid,
    ) -> Result<CourseDetail> {
        let course = Self::find_visible(db, principal, id).await?;

        let (category, lessons, enrolled_students_count, own_enrollments) = futures::try_join!(
            course.find_related(categories::Entity).one(db),
            lessons::Entity::find()
                .filter(lessons::Column::CourseId.eq(course.id))
                .order_by_asc(lessons::Column::Order)
                .all(db),
            enrollments::Entity::find()
                .filter(enrollments::Column::CourseId.eq(course.id))
                .count(db),
            enrollments::Entity::find()
                .filter(enrollments::Column::CourseId.eq(course.id))
                .filter(enrollments::Column::StudentId.eq(principal.user_id.as_str()))
                .count(db),
        )?;

        Ok(CourseDetail {
            course,
            category,
            lessons,
            enrolled_students_count,
            is_enrolled: own_enrollments > 0,
        })
    }

    /// Creates a course owned by the calling teacher
    pub async fn create(
        db: &DatabaseConnection,
        principal: &Principal,
        new: NewCourse,
    ) -> Result<courses::Model> {
        principal.require(Capability::ManageCourses)?;
        validate_course_fields(
            Some(&new.title),
            Some(new.price_cents),
            Some(new.duration_hours),
        )?;
        let slug = resolve_slug(new.slug.as_deref(), &new.title)?;
        if let Some(category_id) = new.category_id {
            CategoryService::ensure_exists(db, category_id).await?;
        }

        let now = Utc::now();
        let course = courses::ActiveModel {
            id: Set(Uuid::new_v4()),
            title: Set(new.title.trim().to_owned()),
            slug: Set(slug.clone()),
            description: Set(new.description),
            teacher_id: Set(principal.user_id.clone()),
            category_id: Set(new.category_id),
            thumbnail: Set(new.thumbnail),
            difficulty: Set(new.difficulty),
            price_cents: Set(new.price_cents),
            duration_hours: Set(new.duration_hours),
            is_published: Set(new.is_published),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(db)
        .await
        .map_err(|e| {
            ServiceError::from_unique_violation(e, || {
                format!("a course with slug '{slug}' already exists")
            })
        })?;

        info!("Course {} ('{}') created by {}", course.id, course.slug, principal.user_id);
        Ok(course)
    }

    pub async fn update(
        db: &DatabaseConnection,
        principal: &Principal,
        id: Uuid,
        changes: CourseChanges,
    ) -> Result<courses::Model> {
        let course = Self::find_owned(db, principal, id).await?;
        validate_course_fields(
            changes.title.as_deref(),
            changes.price_cents,
            changes.duration_hours,
        )?;
        if let Some(Some(category_id)) = changes.category_id {
            CategoryService::ensure_exists(db, category_id).await?;
        }

        let mut active: courses::ActiveModel = course.into();
        if let Some(title) = changes.title {
            active.title = Set(title.trim().to_owned());
        }
        if let Some(description) = changes.description {
            active.description = Set(description);
        }
        if let Some(category_id) = changes.category_id {
            active.category_id = Set(category_id);
        }
        if let Some(thumbnail) = changes.thumbnail {
            active.thumbnail = Set(thumbnail);
        }
        if let Some(difficulty) = changes.difficulty {
            active.difficulty = Set(difficulty);
        }
        if let Some(price_cents) = changes.price_cents {
            active.price_cents = Set(price_cents);
        }
        if let Some(duration_hours) = changes.duration_hours {
            active.duration_hours = Set(duration_hours);
        }
        if let Some(is_published) = changes.is_published {
            active.is_published = Set(is_published);
        }
        active.updated_at = Set(Utc::now());

        Ok(active.update(db).await?)
    }

    /// Deletes a course with its lessons, enrollments and progress
    pub async fn delete(db: &DatabaseConnection, principal: &Principal, id: Uuid) -> Result<()> {
        let course = Self::find_owned(db, principal, id).await?;
        courses::Entity::delete_by_id(course.id).exec(db).await?;
        info!("Course {id} deleted by {}", principal.user_id);
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::test_utils::{Fixture, TEACHER, setup, student, teacher};
    use models::role::Role;

    fn new_course(title: &str, price_cents: i64, is_published: bool) -> NewCourse {
        NewCourse {
            title: title.to_owned(),
            slug: None,
            description: format!("All about {title}"),
            category_id: None,
            thumbnail: None,
            difficulty: Difficulty::Beginner,
            price_cents,
            duration_hours: 4,
            is_published,
        }
    }

    #[tokio::test]
    async fn test_create_assigns_owner_and_slug() {
        let db = setup().await;
        let course = CourseService::create(&db, &teacher(), new_course("Intro to Rust", 0, true))
            .await
            .unwrap();

        assert_eq!(course.teacher_id, TEACHER);
        assert_eq!(course.slug, "intro-to-rust");
        assert!(course.is_free());
    }

    #[tokio::test]
    async fn test_create_rejects_bad_fields() {
        let db = setup().await;
        let err = CourseService::create(&db, &teacher(), new_course("Rust", -100, true))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Validation(ref e) if e.field == "price_cents"));

        let err = CourseService::create(&db, &student("s1"), new_course("Rust", 0, true))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Permission(_)));
    }

    #[tokio::test]
    async fn test_duplicate_slug_conflicts() {
        let db = setup().await;
        CourseService::create(&db, &teacher(), new_course("Rust", 0, true))
            .await
            .unwrap();
        let err = CourseService::create(&db, &teacher(), new_course("Rust", 0, true))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_students_only_see_published_courses() {
        let db = setup().await;
        let draft = Fixture::course(&db, 1, false).await;
        Fixture::published_course(&db, 2).await;

        let (courses, total) = CourseService::list(&db, &student("s1"), CourseQuery::default())
            .await
            .unwrap();
        assert_eq!(total, 1);
        assert_eq!(courses[0].lessons_count, 2);

        let err = CourseService::get(&db, &student("s1"), draft.course.id)
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::NotFound { .. }));

        // the owner still sees the draft
        let (_, total) = CourseService::list(&db, &teacher(), CourseQuery::default())
            .await
            .unwrap();
        assert_eq!(total, 2);

        let other = Principal::new("teacher-2", Role::Teacher);
        let (_, total) = CourseService::list(&db, &other, CourseQuery::default())
            .await
            .unwrap();
        assert_eq!(total, 1);
    }

    #[tokio::test]
    async fn test_filters_ordering_and_paging() {
        let db = setup().await;
        for (title, price) in [("Algebra", 0), ("Biology", 1500), ("Chemistry", 500)] {
            CourseService::create(&db, &teacher(), new_course(title, price, true))
                .await
                .unwrap();
        }

        let query = CourseQuery {
            free: Some(false),
            ordering: "-price".parse().unwrap(),
            ..Default::default()
        };
        let (courses, total) = CourseService::list(&db, &student("s1"), query).await.unwrap();
        assert_eq!(total, 2);
        let titles: Vec<_> = courses.iter().map(|c| c.course.title.as_str()).collect();
        assert_eq!(titles, ["Biology", "Chemistry"]);

        let query = CourseQuery {
            search: Some("CHEM".into()),
            ..Default::default()
        };
        let (courses, _) = CourseService::list(&db, &student("s1"), query).await.unwrap();
        assert_eq!(courses.len(), 1);
        assert_eq!(courses[0].course.title, "Chemistry");

        let query = CourseQuery {
            page: 2,
            per_page: 2,
            ordering: "title".parse().unwrap(),
            ..Default::default()
        };
        let (courses, total) = CourseService::list(&db, &student("s1"), query).await.unwrap();
        assert_eq!(total, 3);
        assert_eq!(courses.len(), 1);
        assert_eq!(courses[0].course.title, "Chemistry");

        let query = CourseQuery {
            per_page: MAX_PER_PAGE + 1,
            ..Default::default()
        };
        let err = CourseService::list(&db, &student("s1"), query).await.unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));

        let query = CourseQuery {
            category: Some("missing".into()),
            ..Default::default()
        };
        let (courses, total) = CourseService::list(&db, &student("s1"), query).await.unwrap();
        assert!(courses.is_empty());
        assert_eq!(total, 0);
    }

    #[tokio::test]
    async fn test_search_matches_wildcards_literally() {
        let db = setup().await;
        for title in ["100% Rust", "Algebra"] {
            CourseService::create(&db, &teacher(), new_course(title, 0, true))
                .await
                .unwrap();
        }

        let search = |text: &str| CourseQuery {
            search: Some(text.to_owned()),
            ..Default::default()
        };

        let (courses, total) = CourseService::list(&db, &student("s1"), search("%"))
            .await
            .unwrap();
        assert_eq!(total, 1);
        assert_eq!(courses[0].course.title, "100% Rust");

        let (_, total) = CourseService::list(&db, &student("s1"), search("_"))
            .await
            .unwrap();
        assert_eq!(total, 0);

        assert_eq!(escape_like(r"50%_a\b"), r"50\%\_a\\b");
    }

    #[tokio::test]
    async fn test_detail_reports_enrollment() {
        let db = setup().await;
        let fx = Fixture::published_course(&db, 3).await;
        fx.enroll(&db, "s1").await;

        let detail = CourseService::get(&db, &student("s1"), fx.course.id)
            .await
            .unwrap();
        assert!(detail.is_enrolled);
        assert_eq!(detail.enrolled_students_count, 1);
        let orders: Vec<_> = detail.lessons.iter().map(|l| l.order).collect();
        assert_eq!(orders, [0, 1, 2]);

        let detail = CourseService::get(&db, &student("s2"), fx.course.id)
            .await
            .unwrap();
        assert!(!detail.is_enrolled);
    }

    #[tokio::test]
    async fn test_only_owner_may_update() {
        let db = setup().await;
        let fx = Fixture::published_course(&db, 0).await;

        let other = Principal::new("teacher-2", Role::Teacher);
        let err = CourseService::update(&db, &other, fx.course.id, CourseChanges::default())
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Permission(_)));

        let updated = CourseService::update(
            &db,
            &teacher(),
            fx.course.id,
            CourseChanges {
                price_cents: Some(999),
                is_published: Some(false),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(updated.price_cents, 999);
        assert!(!updated.is_published);

        CourseService::delete(&db, &teacher(), fx.course.id)
            .await
            .unwrap();
        let err = CourseService::get(&db, &teacher(), fx.course.id)
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::NotFound { .. }));
    }
}
