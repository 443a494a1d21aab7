use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Teacher dashboards and ownership checks
        manager
            .create_index(
                Index::create()
                    .name("idx_courses_teacher_id")
                    .table(Courses::Table)
                    .col(Courses::TeacherId)
                    .to_owned(),
            )
            .await?;

        // Catalog listing filters
        manager
            .create_index(
                Index::create()
                    .name("idx_courses_category_id")
                    .table(Courses::Table)
                    .col(Courses::CategoryId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_courses_is_published_created_at")
                    .table(Courses::Table)
                    .col(Courses::IsPublished)
                    .col(Courses::CreatedAt)
                    .to_owned(),
            )
            .await?;

        // Enrollment counts per course
        manager
            .create_index(
                Index::create()
                    .name("idx_enrollments_course_id")
                    .table(Enrollments::Table)
                    .col(Enrollments::CourseId)
                    .to_owned(),
            )
            .await?;

        // Cascades from lesson deletion
        manager
            .create_index(
                Index::create()
                    .name("idx_progress_records_lesson_id")
                    .table(ProgressRecords::Table)
                    .col(ProgressRecords::LessonId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        for name in [
            "idx_progress_records_lesson_id",
            "idx_enrollments_course_id",
            "idx_courses_is_published_created_at",
            "idx_courses_category_id",
            "idx_courses_teacher_id",
        ] {
            manager
                .drop_index(Index::drop().name(name).to_owned())
                .await?;
        }

        Ok(())
    }
}

#[derive(Iden)]
enum Courses {
    Table,
    TeacherId,
    CategoryId,
    IsPublished,
    CreatedAt,
}

#[derive(Iden)]
enum Enrollments {
    Table,
    CourseId,
}

#[derive(Iden)]
enum ProgressRecords {
    Table,
    LessonId,
}
