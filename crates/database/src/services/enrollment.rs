//! Enrollment lifecycle and lesson completion.
//!
//! Completing a lesson is a two-step write: the progress record is persisted,
//! then [`ProgressEngine::recompute`] refreshes the enrollment, both inside one
//! transaction that holds the enrollment row lock.

use crate::{
    entities::{courses, enrollments, lessons, progress_records},
    error::{Result, ServiceError, is_unique_violation},
    services::{course::CourseService, progress::ProgressEngine},
};
use chrono::{DateTime, Utc};
use log::{debug, info};
use models::{
    progress::{LessonMark, ProgressSnapshot},
    role::{Capability, Principal},
};
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, ConnectionTrait, DatabaseConnection,
    EntityTrait, QueryFilter, QueryOrder, QuerySelect, TransactionTrait,
};
use uuid::Uuid;

/// Result of an enroll request. Enrolling twice is not an error.
#[derive(Debug, Clone, PartialEq)]
pub enum EnrollOutcome {
    Created(enrollments::Model),
    AlreadyEnrolled(enrollments::Model),
}

impl EnrollOutcome {
    pub fn is_created(&self) -> bool {
        matches!(self, Self::Created(_))
    }

    pub fn enrollment(&self) -> &enrollments::Model {
        match self {
            Self::Created(e) | Self::AlreadyEnrolled(e) => e,
        }
    }

    pub fn into_enrollment(self) -> enrollments::Model {
        match self {
            Self::Created(e) | Self::AlreadyEnrolled(e) => e,
        }
    }
}

/// State after a complete-lesson request
#[derive(Debug, Clone)]
pub struct LessonCompletion {
    pub progress: progress_records::Model,
    pub enrollment: enrollments::Model,
    /// Whether this request completed the course
    pub newly_completed: bool,
}

/// A progress record with the lesson it tracks
#[derive(Debug, Clone)]
pub struct ProgressEntry {
    pub record: progress_records::Model,
    pub lesson: lessons::Model,
}

#[derive(Debug, Clone)]
pub struct EnrollmentSummary {
    pub enrollment: enrollments::Model,
    pub course: courses::Model,
}

#[derive(Debug, Clone)]
pub struct EnrollmentDetail {
    pub enrollment: enrollments::Model,
    pub course: courses::Model,
    pub progress: Vec<ProgressEntry>,
    pub snapshot: ProgressSnapshot,
}

pub struct EnrollmentService;

impl EnrollmentService {
    /// Enrolls the calling student into a published course
    pub async fn enroll(
        db: &DatabaseConnection,
        principal: &Principal,
        course_id: Uuid,
    ) -> Result<EnrollOutcome> {
        principal.require(Capability::Enroll)?;

        let course = courses::Entity::find_by_id(course_id)
            .one(db)
            .await?
            .ok_or_else(|| ServiceError::not_found("course", course_id))?;
        if !course.is_published {
            return Err(ServiceError::CourseNotPublished);
        }

        if let Some(existing) = Self::find_own(db, principal, course.id).await? {
            debug!("{} is already enrolled in course {}", principal.user_id, course.id);
            return Ok(EnrollOutcome::AlreadyEnrolled(existing));
        }

        let inserted = enrollments::ActiveModel {
            id: Set(Uuid::new_v4()),
            student_id: Set(principal.user_id.clone()),
            course_id: Set(course.id),
            enrolled_at: Set(Utc::now()),
            completed: Set(false),
            completed_at: Set(None),
            progress_percentage: Set(0),
        }
        .insert(db)
        .await;

        match inserted {
            Ok(enrollment) => {
                info!("{} enrolled in course {}", principal.user_id, course.id);
                Ok(EnrollOutcome::Created(enrollment))
            }
            // a concurrent request won the insert
            Err(err) if is_unique_violation(&err) => Self::find_own(db, principal, course.id)
                .await?
                .map(EnrollOutcome::AlreadyEnrolled)
                .ok_or(ServiceError::Database(err)),
            Err(err) => Err(err.into()),
        }
    }

    /// The principal's own enrollment in a course, if any
    async fn find_own<C: ConnectionTrait>(
        db: &C,
        principal: &Principal,
        course_id: Uuid,
    ) -> Result<Option<enrollments::Model>> {
        Ok(enrollments::Entity::find()
            .filter(enrollments::Column::StudentId.eq(principal.user_id.as_str()))
            .filter(enrollments::Column::CourseId.eq(course_id))
            .one(db)
            .await?)
    }

    /// Students see their own enrollments, teachers those in courses they teach
    async fn find_visible<C: ConnectionTrait>(
        db: &C,
        principal: &Principal,
        id: Uuid,
    ) -> Result<(enrollments::Model, courses::Model)> {
        let not_found = || ServiceError::not_found("enrollment", id);

        let (enrollment, course) = enrollments::Entity::find_by_id(id)
            .find_also_related(courses::Entity)
            .one(db)
            .await?
            .ok_or_else(not_found)?;
        let course = course.ok_or_else(not_found)?;

        let visible = enrollment.student_id == principal.user_id
            || (principal.is_teacher() && course.teacher_id == principal.user_id);
        if !visible {
            return Err(not_found());
        }
        Ok((enrollment, course))
    }

    /// Drops the calling student's enrollment along with its progress
    pub async fn unenroll(
        db: &DatabaseConnection,
        principal: &Principal,
        enrollment_id: Uuid,
    ) -> Result<()> {
        principal.require(Capability::Enroll)?;

        let enrollment = enrollments::Entity::find_by_id(enrollment_id)
            .filter(enrollments::Column::StudentId.eq(principal.user_id.as_str()))
            .one(db)
            .await?
            .ok_or_else(|| ServiceError::not_found("enrollment", enrollment_id))?;

        enrollments::Entity::delete_by_id(enrollment.id)
            .exec(db)
            .await?;
        info!(
            "{} unenrolled from course {}",
            principal.user_id, enrollment.course_id
        );
        Ok(())
    }

    /// Newest first
    pub async fn list_enrollments(
        db: &DatabaseConnection,
        principal: &Principal,
    ) -> Result<Vec<EnrollmentSummary>> {
        let query = enrollments::Entity::find().find_also_related(courses::Entity);
        let query = if principal.is_teacher() {
            query.filter(courses::Column::TeacherId.eq(principal.user_id.as_str()))
        } else {
            query.filter(enrollments::Column::StudentId.eq(principal.user_id.as_str()))
        };

        let rows = query
            .order_by_desc(enrollments::Column::EnrolledAt)
            .all(db)
            .await?;

        Ok(rows
            .into_iter()
            .filter_map(|(enrollment, course)| {
                course.map(|course| EnrollmentSummary { enrollment, course })
            })
            .collect())
    }

    /// Progress records of an enrollment in lesson order
    pub async fn list_progress(
        db: &DatabaseConnection,
        principal: &Principal,
        enrollment_id: Uuid,
    ) -> Result<Vec<ProgressEntry>> {
        let (enrollment, _) = Self::find_visible(db, principal, enrollment_id).await?;
        Self::progress_entries(db, enrollment.id).await
    }

    async fn progress_entries<C: ConnectionTrait>(
        db: &C,
        enrollment_id: Uuid,
    ) -> Result<Vec<ProgressEntry>> {
        let rows = progress_records::Entity::find()
            .find_also_related(lessons::Entity)
            .filter(progress_records::Column::EnrollmentId.eq(enrollment_id))
            .order_by_asc(lessons::Column::Order)
            .all(db)
            .await?;

        Ok(rows
            .into_iter()
            .filter_map(|(record, lesson)| lesson.map(|lesson| ProgressEntry { record, lesson }))
            .collect())
    }

    async fn detail<C: ConnectionTrait>(
        db: &C,
        enrollment: enrollments::Model,
        course: courses::Model,
    ) -> Result<EnrollmentDetail> {
        let progress = Self::progress_entries(db, enrollment.id).await?;
        let snapshot = ProgressEngine::snapshot(db, &enrollment).await?;
        Ok(EnrollmentDetail {
            enrollment,
            course,
            progress,
            snapshot,
        })
    }

    pub async fn get_enrollment_detail(
        db: &DatabaseConnection,
        principal: &Principal,
        enrollment_id: Uuid,
    ) -> Result<EnrollmentDetail> {
        let (enrollment, course) = Self::find_visible(db, principal, enrollment_id).await?;
        Self::detail(db, enrollment, course).await
    }

    /// The caller's enrollment in a course, or `None` when not enrolled
    pub async fn enrollment_status(
        db: &DatabaseConnection,
        principal: &Principal,
        course_id: Uuid,
    ) -> Result<Option<EnrollmentDetail>> {
        let course = CourseService::find_visible(db, principal, course_id).await?;
        match Self::find_own(db, principal, course.id).await? {
            Some(enrollment) => Ok(Some(Self::detail(db, enrollment, course).await?)),
            None => Ok(None),
        }
    }

    /// Every course the calling student is enrolled in, with progress
    pub async fn my_courses(
        db: &DatabaseConnection,
        principal: &Principal,
    ) -> Result<Vec<EnrollmentDetail>> {
        principal.require(Capability::Enroll)?;

        let mut details = Vec::new();
        for summary in Self::list_enrollments(db, principal).await? {
            details.push(Self::detail(db, summary.enrollment, summary.course).await?);
        }
        Ok(details)
    }

    /// Marks a lesson done for the calling student and refreshes the enrollment
    pub async fn complete_lesson(
        db: &DatabaseConnection,
        principal: &Principal,
        enrollment_id: Uuid,
        lesson_id: Uuid,
    ) -> Result<LessonCompletion> {
        Self::complete_lesson_at(db, principal, enrollment_id, lesson_id, Utc::now()).await
    }

    /// [`Self::complete_lesson`] with an explicit clock
    pub async fn complete_lesson_at(
        db: &DatabaseConnection,
        principal: &Principal,
        enrollment_id: Uuid,
        lesson_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<LessonCompletion> {
        principal.require(Capability::TrackProgress)?;

        let txn = db.begin().await?;

        // serializes concurrent completions against the same enrollment
        let enrollment = enrollments::Entity::find_by_id(enrollment_id)
            .lock_exclusive()
            .one(&txn)
            .await?
            .filter(|e| e.student_id == principal.user_id)
            .ok_or_else(|| ServiceError::not_found("enrollment", enrollment_id))?;

        lessons::Entity::find_by_id(lesson_id)
            .one(&txn)
            .await?
            .filter(|l| l.course_id == enrollment.course_id)
            .ok_or(ServiceError::LessonNotInCourse(lesson_id))?;

        let existing = progress_records::Entity::find()
            .filter(progress_records::Column::EnrollmentId.eq(enrollment.id))
            .filter(progress_records::Column::LessonId.eq(lesson_id))
            .one(&txn)
            .await?;

        let (progress, changed) = match existing {
            Some(record) => {
                let mut mark = record.mark();
                if mark.complete(now) {
                    let mut active: progress_records::ActiveModel = record.into();
                    active.completed = Set(mark.completed);
                    active.completed_at = Set(mark.completed_at);
                    (active.update(&txn).await?, true)
                } else {
                    (record, false)
                }
            }
            None => {
                let mut mark = LessonMark::default();
                mark.complete(now);
                let record = progress_records::ActiveModel {
                    id: Set(Uuid::new_v4()),
                    enrollment_id: Set(enrollment.id),
                    lesson_id: Set(lesson_id),
                    completed: Set(mark.completed),
                    completed_at: Set(mark.completed_at),
                }
                .insert(&txn)
                .await?;
                (record, true)
            }
        };

        let was_completed = enrollment.completed;
        let enrollment = if changed {
            ProgressEngine::recompute(&txn, enrollment, now).await?
        } else {
            debug!(
                "Lesson {lesson_id} already completed in enrollment {}",
                enrollment.id
            );
            enrollment
        };

        txn.commit().await?;

        Ok(LessonCompletion {
            progress,
            newly_completed: !was_completed && enrollment.completed,
            enrollment,
        })
    }
}
