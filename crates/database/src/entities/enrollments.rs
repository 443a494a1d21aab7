use models::progress::EnrollmentCompletion;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "enrollments")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub student_id: String,
    pub course_id: Uuid,
    pub enrolled_at: DateTimeUtc,
    pub completed: bool,
    pub completed_at: Option<DateTimeUtc>,
    /// Cached value, only written by the progress engine
    pub progress_percentage: i16,
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
    pub fn completion(&self) -> EnrollmentCompletion {
        EnrollmentCompletion {
            completed: self.completed,
            completed_at: self.completed_at,
        }
    }
}
