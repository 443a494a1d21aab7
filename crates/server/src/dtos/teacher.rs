use database::services::teacher::TeacherStats;
use serde::Serialize;
use utoipa::ToSchema;

#[derive(Debug, Serialize, ToSchema)]
pub struct TeacherStatsResponse {
    pub total_courses: u64,
    pub published_courses: u64,
    pub total_students: u64,
    pub total_enrollments: u64,
}

impl From<TeacherStats> for TeacherStatsResponse {
    fn from(stats: TeacherStats) -> Self {
        Self {
            total_courses: stats.total_courses,
            published_courses: stats.published_courses,
            total_students: stats.total_students,
            total_enrollments: stats.total_enrollments,
        }
    }
}
