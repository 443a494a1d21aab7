use models::lesson::{ContentType, LessonContent};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "lessons")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub course_id: Uuid,
    pub title: String,
    pub description: String,
    pub content_type: ContentType,
    pub content: String,     // text body or video embed code
    pub video_url: String,   // empty unless the lesson is a hosted video
    pub file_ref: Option<String>,
    pub order: i32, // unique within the course
    pub duration_minutes: i32,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::courses::Entity",
        from = "Column::CourseId",
        to = "super::courses::Column::Id",
        on_delete = "Cascade"
    )]
    Course,
    #[sea_orm(has_many = "super::progress_records::Entity")]
    ProgressRecords,
}

impl Related<super::courses::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Course.def()
    }
}

impl Related<super::progress_records::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ProgressRecords.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub fn content(&self) -> LessonContent<'_> {
        LessonContent {
            content_type: self.content_type,
            content: &self.content,
            video_url: &self.video_url,
            file_ref: self.file_ref.as_deref(),
        }
    }
}
