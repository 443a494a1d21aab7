use crate::dtos::{category::CategoryRef, double_option, lesson::LessonResponse};
use chrono::{DateTime, Utc};
use database::{
    entities::courses,
    services::course::{CourseChanges, CourseDetail, CourseQuery, CourseSummary, NewCourse},
};
use models::{
    ValidationError,
    course::{CourseOrdering, Difficulty},
};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

#[derive(Debug, Serialize, ToSchema)]
pub struct CourseResponse {
    pub id: Uuid,
    pub title: String,
    pub slug: String,
    pub description: String,
    pub teacher_id: String,
    pub category: Option<CategoryRef>,
    pub thumbnail: Option<String>,
    pub difficulty: String,
    pub price_cents: i64,
    pub is_free: bool,
    pub duration_hours: i32,
    pub is_published: bool,
    pub lessons_count: u64,
    pub students_count: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl CourseResponse {
    fn new(
        course: courses::Model,
        category: Option<CategoryRef>,
        lessons_count: u64,
        students_count: u64,
    ) -> Self {
        Self {
            is_free: course.is_free(),
            difficulty: course.difficulty.as_str().to_owned(),
            id: course.id,
            title: course.title,
            slug: course.slug,
            description: course.description,
            teacher_id: course.teacher_id,
            category,
            thumbnail: course.thumbnail,
            price_cents: course.price_cents,
            duration_hours: course.duration_hours,
            is_published: course.is_published,
            lessons_count,
            students_count,
            created_at: course.created_at,
            updated_at: course.updated_at,
        }
    }
}

impl From<CourseSummary> for CourseResponse {
    fn from(summary: CourseSummary) -> Self {
        Self::new(
            summary.course,
            summary.category.map(Into::into),
            summary.lessons_count,
            summary.students_count,
        )
    }
}

/// A freshly written course; counts are reported as zero
impl From<courses::Model> for CourseResponse {
    fn from(course: courses::Model) -> Self {
        Self::new(course, None, 0, 0)
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CourseDetailResponse {
    #[serde(flatten)]
    pub course: CourseResponse,
    pub lessons: Vec<LessonResponse>,
    pub is_enrolled: bool,
}

impl From<CourseDetail> for CourseDetailResponse {
    fn from(detail: CourseDetail) -> Self {
        let lessons_count = detail.lessons.len() as u64;
        Self {
            course: CourseResponse::new(
                detail.course,
                detail.category.map(Into::into),
                lessons_count,
                detail.enrolled_students_count,
            ),
            lessons: detail.lessons.into_iter().map(Into::into).collect(),
            is_enrolled: detail.is_enrolled,
        }
    }
}

/// Compact form embedded in enrollment responses
#[derive(Debug, Serialize, ToSchema)]
pub struct CourseRef {
    pub id: Uuid,
    pub title: String,
    pub slug: String,
    pub teacher_id: String,
}

impl From<courses::Model> for CourseRef {
    fn from(course: courses::Model) -> Self {
        Self {
            id: course.id,
            title: course.title,
            slug: course.slug,
            teacher_id: course.teacher_id,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PaginatedCoursesResponse {
    pub courses: Vec<CourseResponse>,
    pub pagination: PaginationMeta,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PaginationMeta {
    pub page: u64,
    pub per_page: u64,
    pub total_pages: u64,
    pub total_items: u64,
    pub has_next: bool,
    pub has_prev: bool,
}

impl PaginationMeta {
    pub fn new(page: u64, per_page: u64, total_items: u64) -> Self {
        let total_pages = total_items.div_ceil(per_page);
        Self {
            page,
            per_page,
            total_pages,
            total_items,
            has_next: page < total_pages,
            has_prev: page > 1,
        }
    }
}

#[derive(Debug, Deserialize, ToSchema, IntoParams)]
pub struct CourseQueryParams {
    #[serde(default = "default_page")]
    pub page: u64,

    #[serde(default = "default_per_page")]
    pub per_page: u64,

    /// Category slug
    pub category: Option<String>,
    /// beginner, intermediate or advanced
    pub difficulty: Option<String>,
    pub free: Option<bool>,
    pub search: Option<String>,
    /// Teachers only: list just the courses they own
    #[serde(default)]
    pub my_courses: bool,
    /// created_at, price or title; prefix with '-' for descending
    pub ordering: Option<String>,
}

fn default_page() -> u64 {
    1
}

fn default_per_page() -> u64 {
    database::services::course::DEFAULT_PER_PAGE
}

impl TryFrom<CourseQueryParams> for CourseQuery {
    type Error = ValidationError;

    fn try_from(params: CourseQueryParams) -> Result<Self, Self::Error> {
        let difficulty = params
            .difficulty
            .as_deref()
            .map(|d| {
                Difficulty::from_str(d).map_err(|_| {
                    ValidationError::new(
                        "difficulty",
                        "expected beginner, intermediate or advanced",
                    )
                })
            })
            .transpose()?;

        let ordering = params
            .ordering
            .as_deref()
            .map(CourseOrdering::from_str)
            .transpose()?
            .unwrap_or_default();

        Ok(Self {
            page: params.page,
            per_page: params.per_page,
            category: params.category,
            difficulty,
            free: params.free,
            search: params.search,
            my_courses: params.my_courses,
            ordering,
        })
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateCourseRequest {
    pub title: String,
    /// Derived from the title when omitted
    pub slug: Option<String>,
    #[serde(default)]
    pub description: String,
    pub category_id: Option<Uuid>,
    pub thumbnail: Option<String>,
    #[serde(default)]
    #[schema(value_type = String)]
    pub difficulty: Difficulty,
    #[serde(default)]
    pub price_cents: i64,
    #[serde(default)]
    pub duration_hours: i32,
    #[serde(default)]
    pub is_published: bool,
}

impl From<CreateCourseRequest> for NewCourse {
    fn from(req: CreateCourseRequest) -> Self {
        Self {
            title: req.title,
            slug: req.slug,
            description: req.description,
            category_id: req.category_id,
            thumbnail: req.thumbnail,
            difficulty: req.difficulty,
            price_cents: req.price_cents,
            duration_hours: req.duration_hours,
            is_published: req.is_published,
        }
    }
}

/// Omitted fields are left as they are; `null` clears the nullable ones
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct UpdateCourseRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<Uuid>)]
    pub category_id: Option<Option<Uuid>>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub thumbnail: Option<Option<String>>,
    #[schema(value_type = Option<String>)]
    pub difficulty: Option<Difficulty>,
    pub price_cents: Option<i64>,
    pub duration_hours: Option<i32>,
    pub is_published: Option<bool>,
}

impl From<UpdateCourseRequest> for CourseChanges {
    fn from(req: UpdateCourseRequest) -> Self {
        Self {
            title: req.title,
            description: req.description,
            category_id: req.category_id,
            thumbnail: req.thumbnail,
            difficulty: req.difficulty,
            price_cents: req.price_cents,
            duration_hours: req.duration_hours,
            is_published: req.is_published,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use models::course::CourseSortField;

    fn params(difficulty: Option<&str>, ordering: Option<&str>) -> CourseQueryParams {
        CourseQueryParams {
            page: 1,
            per_page: 20,
            category: None,
            difficulty: difficulty.map(str::to_owned),
            free: None,
            search: None,
            my_courses: false,
            ordering: ordering.map(str::to_owned),
        }
    }

    #[test]
    fn test_query_params_conversion() {
        let query = CourseQuery::try_from(params(Some("advanced"), Some("-price"))).unwrap();
        assert_eq!(query.difficulty, Some(Difficulty::Advanced));
        assert_eq!(query.ordering.field, CourseSortField::Price);
        assert!(query.ordering.descending);

        let err = CourseQuery::try_from(params(Some("expert"), None)).unwrap_err();
        assert_eq!(err.field, "difficulty");

        let err = CourseQuery::try_from(params(None, Some("rating"))).unwrap_err();
        assert_eq!(err.field, "ordering");
    }

    #[test]
    fn test_update_distinguishes_null_from_absent() {
        let req: UpdateCourseRequest =
            serde_json::from_str(r#"{"category_id": null, "price_cents": 0}"#).unwrap();
        assert_eq!(req.category_id, Some(None));
        assert_eq!(req.thumbnail, None);
        assert_eq!(req.price_cents, Some(0));
    }

    #[test]
    fn test_pagination_meta() {
        let meta = PaginationMeta::new(2, 20, 41);
        assert_eq!(meta.total_pages, 3);
        assert!(meta.has_next);
        assert!(meta.has_prev);

        let meta = PaginationMeta::new(1, 20, 0);
        assert_eq!(meta.total_pages, 0);
        assert!(!meta.has_next);
        assert!(!meta.has_prev);
    }
}
