use crate::validation::{ValidationError, non_negative, not_blank};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use strum::{AsRefStr, EnumString};

#[cfg(feature = "database")]
use sea_orm::{DeriveActiveEnum, EnumIter};

/// Maximum length of a course title
pub const MAX_TITLE_LEN: usize = 200;

/// How demanding a course is
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, EnumString, AsRefStr,
)]
#[cfg_attr(feature = "database", derive(EnumIter, DeriveActiveEnum))]
#[cfg_attr(feature = "database", sea_orm(rs_type = "String", db_type = "Text"))]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Difficulty {
    #[default]
    #[cfg_attr(feature = "database", sea_orm(string_value = "beginner"))]
    Beginner,
    #[cfg_attr(feature = "database", sea_orm(string_value = "intermediate"))]
    Intermediate,
    #[cfg_attr(feature = "database", sea_orm(string_value = "advanced"))]
    Advanced,
}

impl Difficulty {
    pub fn as_str(&self) -> &str {
        self.as_ref()
    }
}

/// Checks the caller-supplied course fields that have value constraints
pub fn validate_course_fields(
    title: Option<&str>,
    price_cents: Option<i64>,
    duration_hours: Option<i32>,
) -> Result<(), ValidationError> {
    if let Some(title) = title {
        not_blank("title", title)?;
        if title.chars().count() > MAX_TITLE_LEN {
            return Err(ValidationError::new(
                "title",
                format!("must be at most {MAX_TITLE_LEN} characters"),
            ));
        }
    }
    if let Some(price) = price_cents {
        non_negative("price_cents", price)
            .map_err(|_| ValidationError::new("price_cents", "price cannot be negative"))?;
    }
    if let Some(duration) = duration_hours {
        non_negative("duration_hours", duration.into())?;
    }
    Ok(())
}

/// A course with a zero price is free
pub fn is_free(price_cents: i64) -> bool {
    price_cents == 0
}

/// Column a course listing can be sorted by
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, EnumString, AsRefStr)]
#[strum(serialize_all = "snake_case")]
pub enum CourseSortField {
    #[default]
    CreatedAt,
    Price,
    Title,
}

/// Sort order of a course listing, parsed from `title`, `-price` and the like
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CourseOrdering {
    pub field: CourseSortField,
    pub descending: bool,
}

impl Default for CourseOrdering {
    /// Newest first
    fn default() -> Self {
        Self {
            field: CourseSortField::CreatedAt,
            descending: true,
        }
    }
}

impl FromStr for CourseOrdering {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (descending, name) = match s.strip_prefix('-') {
            Some(name) => (true, name),
            None => (false, s),
        };

        let field = CourseSortField::from_str(name).map_err(|_| {
            ValidationError::new(
                "ordering",
                format!("unknown field '{name}', expected created_at, price or title"),
            )
        })?;

        Ok(Self { field, descending })
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_difficulty_from_str() {
        assert_eq!(Difficulty::from_str("beginner").unwrap(), Difficulty::Beginner);
        assert_eq!(Difficulty::from_str("advanced").unwrap(), Difficulty::Advanced);
        assert!(Difficulty::from_str("expert").is_err());
        assert_eq!(Difficulty::default(), Difficulty::Beginner);
        assert_eq!(Difficulty::Intermediate.as_str(), "intermediate");
    }

    #[test]
    fn test_validate_course_fields() {
        assert!(validate_course_fields(Some("Rust"), Some(0), Some(10)).is_ok());
        assert!(validate_course_fields(None, None, None).is_ok());

        let err = validate_course_fields(Some("Rust"), Some(-1), None).unwrap_err();
        assert_eq!(err.field, "price_cents");

        let err = validate_course_fields(None, None, Some(-3)).unwrap_err();
        assert_eq!(err.field, "duration_hours");

        let err = validate_course_fields(Some(" "), None, None).unwrap_err();
        assert_eq!(err.field, "title");

        let long = "x".repeat(MAX_TITLE_LEN + 1);
        assert!(validate_course_fields(Some(&long), None, None).is_err());
    }

    #[test]
    fn test_is_free() {
        assert!(is_free(0));
        assert!(!is_free(499));
    }

    #[test]
    fn test_course_ordering_from_str() {
        assert_eq!(
            CourseOrdering::from_str("price").unwrap(),
            CourseOrdering {
                field: CourseSortField::Price,
                descending: false
            }
        );
        assert_eq!(
            CourseOrdering::from_str("-title").unwrap(),
            CourseOrdering {
                field: CourseSortField::Title,
                descending: true
            }
        );
        assert_eq!(
            CourseOrdering::from_str("-created_at").unwrap(),
            CourseOrdering::default()
        );

        let err = CourseOrdering::from_str("popularity").unwrap_err();
        assert_eq!(err.field, "ordering");
        assert!(CourseOrdering::from_str("--price").is_err());
    }
}
