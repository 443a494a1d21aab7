use crate::dtos::double_option;
use chrono::{DateTime, Utc};
use database::{
    entities::lessons,
    services::lesson::{LessonChanges, NewLesson},
};
use models::lesson::ContentType;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Serialize, ToSchema)]
pub struct LessonResponse {
    pub id: Uuid,
    pub course_id: Uuid,
    pub title: String,
    pub description: String,
    pub content_type: String,
    pub content: String,
    pub video_url: String,
    pub file_ref: Option<String>,
    pub order: i32,
    pub duration_minutes: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<lessons::Model> for LessonResponse {
    fn from(lesson: lessons::Model) -> Self {
        Self {
            id: lesson.id,
            course_id: lesson.course_id,
            title: lesson.title,
            description: lesson.description,
            content_type: lesson.content_type.as_str().to_owned(),
            content: lesson.content,
            video_url: lesson.video_url,
            file_ref: lesson.file_ref,
            order: lesson.order,
            duration_minutes: lesson.duration_minutes,
            created_at: lesson.created_at,
            updated_at: lesson.updated_at,
        }
    }
}

/// Compact form embedded in progress responses
#[derive(Debug, Serialize, ToSchema)]
pub struct LessonRef {
    pub id: Uuid,
    pub title: String,
    pub order: i32,
    pub duration_minutes: i32,
}

impl From<lessons::Model> for LessonRef {
    fn from(lesson: lessons::Model) -> Self {
        Self {
            id: lesson.id,
            title: lesson.title,
            order: lesson.order,
            duration_minutes: lesson.duration_minutes,
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateLessonRequest {
    pub course_id: Uuid,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    #[schema(value_type = String)]
    pub content_type: ContentType,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub video_url: String,
    pub file_ref: Option<String>,
    pub order: i32,
    #[serde(default)]
    pub duration_minutes: i32,
}

impl From<CreateLessonRequest> for NewLesson {
    fn from(req: CreateLessonRequest) -> Self {
        Self {
            course_id: req.course_id,
            title: req.title,
            description: req.description,
            content_type: req.content_type,
            content: req.content,
            video_url: req.video_url,
            file_ref: req.file_ref,
            order: req.order,
            duration_minutes: req.duration_minutes,
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateLessonRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    #[schema(value_type = Option<String>)]
    pub content_type: Option<ContentType>,
    pub content: Option<String>,
    pub video_url: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub file_ref: Option<Option<String>>,
    pub order: Option<i32>,
    pub duration_minutes: Option<i32>,
}

impl From<UpdateLessonRequest> for LessonChanges {
    fn from(req: UpdateLessonRequest) -> Self {
        Self {
            title: req.title,
            description: req.description,
            content_type: req.content_type,
            content: req.content,
            video_url: req.video_url,
            file_ref: req.file_ref,
            order: req.order,
            duration_minutes: req.duration_minutes,
        }
    }
}
