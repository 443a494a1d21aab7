use crate::{
    entities::{courses, enrollments},
    error::Result,
    services::course::{CourseService, CourseSummary},
};
use models::role::{Capability, Principal};
use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, JoinType, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, RelationTrait,
};
use serde::Serialize;

/// Aggregates over every course a teacher owns
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TeacherStats {
    pub total_courses: u64,
    pub published_courses: u64,
    /// Distinct students across all courses
    pub total_students: u64,
    pub total_enrollments: u64,
}

pub struct TeacherService;

impl TeacherService {
    /// Every course the teacher owns, drafts included, newest first
    pub async fn teacher_courses(
        db: &DatabaseConnection,
        principal: &Principal,
    ) -> Result<Vec<CourseSummary>> {
        principal.require(Capability::ViewTeacherStats)?;

        let courses = courses::Entity::find()
            .filter(courses::Column::TeacherId.eq(principal.user_id.as_str()))
            .order_by_desc(courses::Column::CreatedAt)
            .all(db)
            .await?;

        CourseService::summarize(db, courses).await
    }

    pub async fn teacher_stats(
        db: &DatabaseConnection,
        principal: &Principal,
    ) -> Result<TeacherStats> {
        principal.require(Capability::ViewTeacherStats)?;
        let owned = courses::Column::TeacherId.eq(principal.user_id.as_str());

        let enrollments_of_owned = || {
            enrollments::Entity::find()
                .join(JoinType::InnerJoin, enrollments::Relation::Course.def())
                .filter(owned.clone())
        };

        let (total_courses, published_courses, total_enrollments, students) = futures::try_join!(
            courses::Entity::find().filter(owned.clone()).count(db),
            courses::Entity::find()
                .filter(owned.clone())
                .filter(courses::Column::IsPublished.eq(true))
                .count(db),
            enrollments_of_owned().count(db),
            enrollments_of_owned()
                .select_only()
                .column(enrollments::Column::StudentId)
                .distinct()
                .into_tuple::<String>()
                .all(db),
        )?;

        Ok(TeacherStats {
            total_courses,
            published_courses,
            total_students: students.len() as u64,
            total_enrollments,
        })
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{
        error::ServiceError,
        test_utils::{Fixture, setup, student, teacher},
    };

    #[tokio::test]
    async fn test_stats_count_distinct_students() {
        let db = setup().await;
        let first = Fixture::published_course(&db, 2).await;
        let second = Fixture::published_course(&db, 1).await;
        Fixture::course(&db, 0, false).await;

        first.enroll(&db, "s1").await;
        first.enroll(&db, "s2").await;
        second.enroll(&db, "s1").await;

        let stats = TeacherService::teacher_stats(&db, &teacher()).await.unwrap();
        assert_eq!(
            stats,
            TeacherStats {
                total_courses: 3,
                published_courses: 2,
                total_students: 2,
                total_enrollments: 3,
            }
        );

        let courses = TeacherService::teacher_courses(&db, &teacher())
            .await
            .unwrap();
        assert_eq!(courses.len(), 3);
        let students: u64 = courses.iter().map(|c| c.students_count).sum();
        assert_eq!(students, 3);
    }

    #[tokio::test]
    async fn test_students_have_no_stats() {
        let db = setup().await;
        let err = TeacherService::teacher_stats(&db, &student("s1"))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Permission(_)));
    }
}
