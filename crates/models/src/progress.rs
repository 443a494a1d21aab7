//! Pure progress arithmetic and the two completion state machines.
//!
//! Storage-facing code reads the counts and timestamps, runs them through
//! these types, and writes back whatever changed.

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Percentage of a course that has been completed, rounded down.
///
/// A course without lessons is never completable and reports 0.
pub fn progress_percentage(completed_lessons: u64, total_lessons: u64) -> u8 {
    if total_lessons == 0 {
        return 0;
    }
    let percentage = completed_lessons.saturating_mul(100) / total_lessons;
    percentage.min(100) as u8
}

/// Counts behind an enrollment's percentage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ProgressSnapshot {
    pub total_lessons: u64,
    pub completed_lessons: u64,
    pub percentage: u8,
}

impl ProgressSnapshot {
    pub fn new(completed_lessons: u64, total_lessons: u64) -> Self {
        Self {
            total_lessons,
            completed_lessons,
            percentage: progress_percentage(completed_lessons, total_lessons),
        }
    }

    pub fn is_complete(&self) -> bool {
        self.percentage == 100
    }
}

/// Completion state of an enrollment: incomplete until the percentage first
/// reaches 100, completed forever after
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EnrollmentCompletion {
    pub completed: bool,
    pub completed_at: Option<DateTime<Utc>>,
}

impl EnrollmentCompletion {
    /// Applies a freshly computed percentage. Returns true if this call made
    /// the enrollment complete.
    pub fn advance(&mut self, percentage: u8, now: DateTime<Utc>) -> bool {
        if percentage < 100 || self.completed {
            return false;
        }
        self.completed = true;
        self.completed_at = Some(now);
        true
    }
}

/// Completion state of one lesson within one enrollment
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LessonMark {
    pub completed: bool,
    pub completed_at: Option<DateTime<Utc>>,
}

impl LessonMark {
    /// Marks the lesson done. Returns true if the state changed; repeated
    /// calls leave the first timestamp in place.
    pub fn complete(&mut self, now: DateTime<Utc>) -> bool {
        if self.completed {
            return false;
        }
        self.completed = true;
        if self.completed_at.is_none() {
            self.completed_at = Some(now);
        }
        true
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn at(hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 1, hour, 0, 0).unwrap()
    }

    #[test]
    fn test_progress_percentage_floors() {
        assert_eq!(progress_percentage(0, 4), 0);
        assert_eq!(progress_percentage(3, 4), 75);
        assert_eq!(progress_percentage(4, 4), 100);
        assert_eq!(progress_percentage(1, 3), 33);
        assert_eq!(progress_percentage(2, 3), 66);
        assert_eq!(progress_percentage(6, 7), 85);
    }

    #[test]
    fn test_progress_percentage_empty_course() {
        assert_eq!(progress_percentage(0, 0), 0);
        assert_eq!(progress_percentage(5, 0), 0);
    }

    #[test]
    fn test_progress_percentage_matches_formula() {
        for total in 1..=25u64 {
            for completed in 0..=total {
                let expected = (completed * 100 / total) as u8;
                assert_eq!(progress_percentage(completed, total), expected);
            }
        }
    }

    #[test]
    fn test_progress_percentage_clamps() {
        assert_eq!(progress_percentage(9, 4), 100);
        assert_eq!(progress_percentage(u64::MAX, 1), 100);
    }

    #[test]
    fn test_snapshot() {
        let snapshot = ProgressSnapshot::new(3, 4);
        assert_eq!(snapshot.percentage, 75);
        assert!(!snapshot.is_complete());
        assert!(ProgressSnapshot::new(4, 4).is_complete());
        assert!(!ProgressSnapshot::new(0, 0).is_complete());
    }

    #[test]
    fn test_enrollment_completion_fires_once() {
        let mut state = EnrollmentCompletion {
            completed: false,
            completed_at: None,
        };

        assert!(!state.advance(75, at(9)));
        assert!(!state.completed);
        assert_eq!(state.completed_at, None);

        assert!(state.advance(100, at(10)));
        assert!(state.completed);
        assert_eq!(state.completed_at, Some(at(10)));

        // later recomputations never move the timestamp
        assert!(!state.advance(100, at(11)));
        assert_eq!(state.completed_at, Some(at(10)));
    }

    #[test]
    fn test_enrollment_completion_ratchet() {
        let mut state = EnrollmentCompletion {
            completed: true,
            completed_at: Some(at(10)),
        };

        assert!(!state.advance(50, at(12)));
        assert!(!state.advance(0, at(13)));
        assert!(state.completed);
        assert_eq!(state.completed_at, Some(at(10)));
    }

    #[test]
    fn test_lesson_mark_complete_is_idempotent() {
        let mut mark = LessonMark {
            completed: false,
            completed_at: None,
        };

        let first = at(8);
        assert!(mark.complete(first));
        assert_eq!(mark.completed_at, Some(first));

        assert!(!mark.complete(first + Duration::minutes(5)));
        assert_eq!(mark.completed_at, Some(first));
    }

    #[test]
    fn test_lesson_mark_keeps_existing_timestamp() {
        let mut mark = LessonMark {
            completed: false,
            completed_at: Some(at(7)),
        };

        assert!(mark.complete(at(9)));
        assert_eq!(mark.completed_at, Some(at(7)));
    }
}
