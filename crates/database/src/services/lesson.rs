use crate::{
    entities::lessons,
    error::{Result, ServiceError},
    services::{course::CourseService, progress::ProgressEngine},
};
use chrono::Utc;
use log::info;
use models::{
    lesson::{ContentType, LessonContent, validate_lesson_fields},
    role::Principal,
};
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, ConnectionTrait, DatabaseConnection,
    EntityTrait, QueryFilter, QueryOrder, TransactionTrait,
};
use uuid::Uuid;

pub struct NewLesson {
    pub course_id: Uuid,
    pub title: String,
    pub description: String,
    pub content_type: ContentType,
    pub content: String,
    pub video_url: String,
    pub file_ref: Option<String>,
    pub order: i32,
    pub duration_minutes: i32,
}

#[derive(Debug, Default)]
pub struct LessonChanges {
    pub title: Option<String>,
    pub description: Option<String>,
    pub content_type: Option<ContentType>,
    pub content: Option<String>,
    pub video_url: Option<String>,
    pub file_ref: Option<Option<String>>,
    pub order: Option<i32>,
    pub duration_minutes: Option<i32>,
}

pub struct LessonService;

impl LessonService {
    /// Lessons of a visible course, in order
    pub async fn list_for_course(
        db: &DatabaseConnection,
        principal: &Principal,
        course_id: Uuid,
    ) -> Result<Vec<lessons::Model>> {
        let course = CourseService::find_visible(db, principal, course_id).await?;

        Ok(lessons::Entity::find()
            .filter(lessons::Column::CourseId.eq(course.id))
            .order_by_asc(lessons::Column::Order)
            .all(db)
            .await?)
    }

    pub async fn get(
        db: &DatabaseConnection,
        principal: &Principal,
        id: Uuid,
    ) -> Result<lessons::Model> {
        let lesson = Self::find(db, id).await?;
        // a lesson is only as visible as its course
        CourseService::find_visible(db, principal, lesson.course_id).await?;
        Ok(lesson)
    }

    async fn find<C: ConnectionTrait>(db: &C, id: Uuid) -> Result<lessons::Model> {
        lessons::Entity::find_by_id(id)
            .one(db)
            .await?
            .ok_or_else(|| ServiceError::not_found("lesson", id))
    }

    /// Adds a lesson and brings every enrollment of the course up to date
    pub async fn create(
        db: &DatabaseConnection,
        principal: &Principal,
        new: NewLesson,
    ) -> Result<lessons::Model> {
        validate_lesson_fields(Some(&new.title), Some(new.order), Some(new.duration_minutes))?;
        LessonContent {
            content_type: new.content_type,
            content: &new.content,
            video_url: &new.video_url,
            file_ref: new.file_ref.as_deref(),
        }
        .validate()?;

        let txn = db.begin().await?;
        let course = CourseService::find_owned(&txn, principal, new.course_id).await?;

        let now = Utc::now();
        let order = new.order;
        let lesson = lessons::ActiveModel {
            id: Set(Uuid::new_v4()),
            course_id: Set(course.id),
            title: Set(new.title.trim().to_owned()),
            description: Set(new.description),
            content_type: Set(new.content_type),
            content: Set(new.content),
            video_url: Set(new.video_url),
            file_ref: Set(new.file_ref),
            order: Set(new.order),
            duration_minutes: Set(new.duration_minutes),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&txn)
        .await
        .map_err(|e| order_conflict(e, order))?;

        ProgressEngine::recompute_course(&txn, course.id, now).await?;
        txn.commit().await?;

        info!("Lesson {} added to course {}", lesson.id, course.id);
        Ok(lesson)
    }

    pub async fn update(
        db: &DatabaseConnection,
        principal: &Principal,
        id: Uuid,
        changes: LessonChanges,
    ) -> Result<lessons::Model> {
        let lesson = Self::find(db, id).await?;
        CourseService::find_owned(db, principal, lesson.course_id).await?;
        validate_lesson_fields(
            changes.title.as_deref(),
            changes.order,
            changes.duration_minutes,
        )?;

        // the merged content must still suit its type
        let file_ref = match &changes.file_ref {
            Some(file_ref) => file_ref.as_deref(),
            None => lesson.file_ref.as_deref(),
        };
        LessonContent {
            content_type: changes.content_type.unwrap_or(lesson.content_type),
            content: changes.content.as_deref().unwrap_or(&lesson.content),
            video_url: changes.video_url.as_deref().unwrap_or(&lesson.video_url),
            file_ref,
        }
        .validate()?;

        let order = changes.order.unwrap_or(lesson.order);
        let mut active: lessons::ActiveModel = lesson.into();
        if let Some(title) = changes.title {
            active.title = Set(title.trim().to_owned());
        }
        if let Some(description) = changes.description {
            active.description = Set(description);
        }
        if let Some(content_type) = changes.content_type {
            active.content_type = Set(content_type);
        }
        if let Some(content) = changes.content {
            active.content = Set(content);
        }
        if let Some(video_url) = changes.video_url {
            active.video_url = Set(video_url);
        }
        if let Some(file_ref) = changes.file_ref {
            active.file_ref = Set(file_ref);
        }
        if let Some(order) = changes.order {
            active.order = Set(order);
        }
        if let Some(duration_minutes) = changes.duration_minutes {
            active.duration_minutes = Set(duration_minutes);
        }
        active.updated_at = Set(Utc::now());

        active.update(db).await.map_err(|e| order_conflict(e, order))
    }

    /// Removes a lesson with its progress records and recomputes the course
    pub async fn delete(db: &DatabaseConnection, principal: &Principal, id: Uuid) -> Result<()> {
        let txn = db.begin().await?;
        let lesson = Self::find(&txn, id).await?;
        let course = CourseService::find_owned(&txn, principal, lesson.course_id).await?;

        lessons::Entity::delete_by_id(lesson.id).exec(&txn).await?;
        ProgressEngine::recompute_course(&txn, course.id, Utc::now()).await?;
        txn.commit().await?;

        info!("Lesson {id} removed from course {}", course.id);
        Ok(())
    }
}

fn order_conflict(err: sea_orm::DbErr, order: i32) -> ServiceError {
    ServiceError::from_unique_violation(err, || {
        format!("a lesson with order {order} already exists in this course")
    })
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{
        entities::enrollments,
        test_utils::{Fixture, setup, student, teacher},
    };

    fn text_lesson(course_id: Uuid, order: i32) -> NewLesson {
        NewLesson {
            course_id,
            title: format!("Part {order}"),
            description: String::new(),
            content_type: ContentType::Text,
            content: "Read this".into(),
            video_url: String::new(),
            file_ref: None,
            order,
            duration_minutes: 15,
        }
    }

    #[tokio::test]
    async fn test_create_validates_content() {
        let db = setup().await;
        let fx = Fixture::published_course(&db, 0).await;

        let mut lesson = text_lesson(fx.course.id, 0);
        lesson.content_type = ContentType::File;
        let err = LessonService::create(&db, &teacher(), lesson)
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Validation(ref e) if e.field == "file_ref"));

        let mut lesson = text_lesson(fx.course.id, 0);
        lesson.duration_minutes = -5;
        let err = LessonService::create(&db, &teacher(), lesson)
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));
    }

    #[tokio::test]
    async fn test_duplicate_order_conflicts() {
        let db = setup().await;
        let fx = Fixture::published_course(&db, 1).await;

        let err = LessonService::create(&db, &teacher(), text_lesson(fx.course.id, 0))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Conflict(_)));

        let err = LessonService::create(&db, &student("s1"), text_lesson(fx.course.id, 1))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Permission(_)));
    }

    #[tokio::test]
    async fn test_adding_and_removing_lessons_recomputes_enrollments() {
        let db = setup().await;
        let fx = Fixture::published_course(&db, 1).await;
        let enrollment = fx.enroll(&db, "s1").await;
        fx.insert_progress(&db, &enrollment, 0, true).await;
        ProgressEngine::recompute(&db, enrollment.clone(), Utc::now())
            .await
            .unwrap();

        let added = LessonService::create(&db, &teacher(), text_lesson(fx.course.id, 1))
            .await
            .unwrap();
        let reloaded = enrollments::Entity::find_by_id(enrollment.id)
            .one(&db)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(reloaded.progress_percentage, 50);
        assert!(reloaded.completed);

        LessonService::delete(&db, &teacher(), added.id).await.unwrap();
        let reloaded = enrollments::Entity::find_by_id(enrollment.id)
            .one(&db)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(reloaded.progress_percentage, 100);
    }

    #[tokio::test]
    async fn test_update_keeps_content_valid() {
        let db = setup().await;
        let fx = Fixture::published_course(&db, 2).await;
        let lesson = &fx.lessons[0];

        // switching to video without a URL leaves the text body as embed code
        let updated = LessonService::update(
            &db,
            &teacher(),
            lesson.id,
            LessonChanges {
                content_type: Some(ContentType::Video),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(updated.content_type, ContentType::Video);

        let err = LessonService::update(
            &db,
            &teacher(),
            lesson.id,
            LessonChanges {
                content_type: Some(ContentType::File),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));

        let err = LessonService::update(
            &db,
            &teacher(),
            lesson.id,
            LessonChanges {
                order: Some(1),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ServiceError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_lessons_of_draft_course_are_hidden() {
        let db = setup().await;
        let fx = Fixture::course(&db, 2, false).await;

        let err = LessonService::list_for_course(&db, &student("s1"), fx.course.id)
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::NotFound { .. }));
        let err = LessonService::get(&db, &student("s1"), fx.lessons[0].id)
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::NotFound { .. }));

        let lessons = LessonService::list_for_course(&db, &teacher(), fx.course.id)
            .await
            .unwrap();
        assert_eq!(lessons.len(), 2);
    }
}
