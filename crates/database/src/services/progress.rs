//! Keeps an enrollment's cached percentage and completion flag in line with
//! its progress records.
//!
//! Callers persist a progress mutation first and then call [`ProgressEngine::recompute`]
//! on the same connection or transaction. Nothing here is triggered implicitly.

use crate::entities::{enrollments, lessons, progress_records};
use chrono::{DateTime, Utc};
use log::{debug, info};
use models::progress::ProgressSnapshot;
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, ConnectionTrait, DbErr, EntityTrait,
    PaginatorTrait, QueryFilter, QuerySelect, sea_query::Expr,
};
use uuid::Uuid;

pub struct ProgressEngine;

impl ProgressEngine {
    /// Reads the current lesson and completion counts for an enrollment
    pub async fn snapshot<C: ConnectionTrait>(
        db: &C,
        enrollment: &enrollments::Model,
    ) -> Result<ProgressSnapshot, DbErr> {
        let total_lessons = lessons::Entity::find()
            .filter(lessons::Column::CourseId.eq(enrollment.course_id))
            .count(db)
            .await?;

        if total_lessons == 0 {
            return Ok(ProgressSnapshot::new(0, 0));
        }

        let completed_lessons = progress_records::Entity::find()
            .filter(progress_records::Column::EnrollmentId.eq(enrollment.id))
            .filter(progress_records::Column::Completed.eq(true))
            .count(db)
            .await?;

        Ok(ProgressSnapshot::new(completed_lessons, total_lessons))
    }

    /// Recomputes the enrollment's percentage and, the first time it reaches
    /// 100, marks the enrollment completed at `now`.
    ///
    /// Only the percentage is written from `enrollment`. The completion flag is
    /// set by a conditional update that matches incomplete rows only, so an
    /// outdated model can neither clear it nor restamp `completed_at`.
    pub async fn recompute<C: ConnectionTrait>(
        db: &C,
        enrollment: enrollments::Model,
        now: DateTime<Utc>,
    ) -> Result<enrollments::Model, DbErr> {
        let snapshot = Self::snapshot(db, &enrollment).await?;
        let percentage = i16::from(snapshot.percentage);

        let mut completion = enrollment.completion();
        let reaches_completion = completion.advance(snapshot.percentage, now);

        if !reaches_completion && percentage == enrollment.progress_percentage {
            debug!(
                "Enrollment {} unchanged at {}% ({}/{} lessons)",
                enrollment.id, percentage, snapshot.completed_lessons, snapshot.total_lessons
            );
            return Ok(enrollment);
        }

        if reaches_completion {
            let flipped = enrollments::Entity::update_many()
                .col_expr(enrollments::Column::Completed, Expr::value(true))
                .col_expr(enrollments::Column::CompletedAt, Expr::value(now))
                .filter(enrollments::Column::Id.eq(enrollment.id))
                .filter(enrollments::Column::Completed.eq(false))
                .exec(db)
                .await?;
            if flipped.rows_affected == 1 {
                info!(
                    "Student {} completed course {} (enrollment {})",
                    enrollment.student_id, enrollment.course_id, enrollment.id
                );
            }
        }

        // completion columns stay Unchanged and are read back from the row
        let mut active: enrollments::ActiveModel = enrollment.into();
        active.progress_percentage = Set(percentage);

        active.update(db).await
    }

    /// Recomputes every enrollment of a course, after its lesson count changed.
    /// Returns the number of enrollments visited.
    ///
    /// Locks the rows the same way lesson completion does, so the two never
    /// interleave on one enrollment.
    pub async fn recompute_course<C: ConnectionTrait>(
        db: &C,
        course_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<usize, DbErr> {
        let enrollments = enrollments::Entity::find()
            .filter(enrollments::Column::CourseId.eq(course_id))
            .lock_exclusive()
            .all(db)
            .await?;

        let count = enrollments.len();
        for enrollment in enrollments {
            Self::recompute(db, enrollment, now).await?;
        }

        debug!("Recomputed {count} enrollments of course {course_id}");
        Ok(count)
    }
}
