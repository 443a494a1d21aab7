use crate::dtos::{course::CourseRef, lesson::LessonRef};
use chrono::{DateTime, Utc};
use database::{
    entities::{enrollments, progress_records},
    services::enrollment::{EnrollmentDetail, EnrollmentSummary, LessonCompletion, ProgressEntry},
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Serialize, ToSchema)]
pub struct EnrollmentResponse {
    pub id: Uuid,
    pub student_id: String,
    pub course: CourseRef,
    pub enrolled_at: DateTime<Utc>,
    pub completed: bool,
    pub completed_at: Option<DateTime<Utc>>,
    pub progress_percentage: u8,
}

impl EnrollmentResponse {
    pub fn new(enrollment: enrollments::Model, course: CourseRef) -> Self {
        Self {
            id: enrollment.id,
            student_id: enrollment.student_id,
            course,
            enrolled_at: enrollment.enrolled_at,
            completed: enrollment.completed,
            completed_at: enrollment.completed_at,
            progress_percentage: percentage(enrollment.progress_percentage),
        }
    }
}

impl From<EnrollmentSummary> for EnrollmentResponse {
    fn from(summary: EnrollmentSummary) -> Self {
        Self::new(summary.enrollment, summary.course.into())
    }
}

fn percentage(stored: i16) -> u8 {
    stored.clamp(0, 100) as u8
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ProgressResponse {
    pub id: Uuid,
    pub lesson: LessonRef,
    pub completed: bool,
    pub completed_at: Option<DateTime<Utc>>,
}

impl From<ProgressEntry> for ProgressResponse {
    fn from(entry: ProgressEntry) -> Self {
        Self {
            id: entry.record.id,
            lesson: entry.lesson.into(),
            completed: entry.record.completed,
            completed_at: entry.record.completed_at,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct EnrollmentDetailResponse {
    #[serde(flatten)]
    pub enrollment: EnrollmentResponse,
    pub completed_lessons: u64,
    pub total_lessons: u64,
    pub progress: Vec<ProgressResponse>,
}

impl From<EnrollmentDetail> for EnrollmentDetailResponse {
    fn from(detail: EnrollmentDetail) -> Self {
        Self {
            enrollment: EnrollmentResponse::new(detail.enrollment, detail.course.into()),
            completed_lessons: detail.snapshot.completed_lessons,
            total_lessons: detail.snapshot.total_lessons,
            progress: detail.progress.into_iter().map(Into::into).collect(),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct EnrollmentStatusResponse {
    pub is_enrolled: bool,
    pub enrollment: Option<EnrollmentDetailResponse>,
}

impl From<Option<EnrollmentDetail>> for EnrollmentStatusResponse {
    fn from(detail: Option<EnrollmentDetail>) -> Self {
        Self {
            is_enrolled: detail.is_some(),
            enrollment: detail.map(Into::into),
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CompleteLessonRequest {
    pub lesson_id: Uuid,
}

/// A progress record without its lesson, as written by a completion
#[derive(Debug, Serialize, ToSchema)]
pub struct ProgressRecordResponse {
    pub id: Uuid,
    pub lesson_id: Uuid,
    pub completed: bool,
    pub completed_at: Option<DateTime<Utc>>,
}

impl From<progress_records::Model> for ProgressRecordResponse {
    fn from(record: progress_records::Model) -> Self {
        Self {
            id: record.id,
            lesson_id: record.lesson_id,
            completed: record.completed,
            completed_at: record.completed_at,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CompleteLessonResponse {
    pub progress: ProgressRecordResponse,
    pub progress_percentage: u8,
    pub course_completed: bool,
    pub completed_at: Option<DateTime<Utc>>,
    /// Whether this request is the one that completed the course
    pub newly_completed: bool,
}

impl From<LessonCompletion> for CompleteLessonResponse {
    fn from(completion: LessonCompletion) -> Self {
        Self {
            progress: completion.progress.into(),
            progress_percentage: percentage(completion.enrollment.progress_percentage),
            course_completed: completion.enrollment.completed,
            completed_at: completion.enrollment.completed_at,
            newly_completed: completion.newly_completed,
        }
    }
}
