use crate::validation::{ValidationError, non_negative, not_blank};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, EnumString};

#[cfg(feature = "database")]
use sea_orm::{DeriveActiveEnum, EnumIter};

/// Kind of material a lesson delivers
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, EnumString, AsRefStr,
)]
#[cfg_attr(feature = "database", derive(EnumIter, DeriveActiveEnum))]
#[cfg_attr(feature = "database", sea_orm(rs_type = "String", db_type = "Text"))]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ContentType {
    /// Hosted video, or an embed snippet stored inline
    #[cfg_attr(feature = "database", sea_orm(string_value = "video"))]
    Video,
    /// Plain text or markdown body
    #[default]
    #[cfg_attr(feature = "database", sea_orm(string_value = "text"))]
    Text,
    /// Downloadable attachment (PDF, slides, ...)
    #[cfg_attr(feature = "database", sea_orm(string_value = "file"))]
    File,
}

impl ContentType {
    pub fn as_str(&self) -> &str {
        self.as_ref()
    }
}

/// The content-bearing fields of a lesson, as they will be stored
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LessonContent<'a> {
    pub content_type: ContentType,
    pub content: &'a str,
    pub video_url: &'a str,
    pub file_ref: Option<&'a str>,
}

impl LessonContent<'_> {
    /// Each content type requires its own field to be filled in
    pub fn validate(&self) -> Result<(), ValidationError> {
        let filled = |s: &str| !s.trim().is_empty();

        match self.content_type {
            ContentType::Video if !filled(self.video_url) && !filled(self.content) => Err(
                ValidationError::new(
                    "video_url",
                    "video URL or embedded code is required for video lessons",
                ),
            ),
            ContentType::Text if !filled(self.content) => Err(ValidationError::new(
                "content",
                "content is required for text lessons",
            )),
            ContentType::File if !self.file_ref.is_some_and(filled) => Err(
                ValidationError::new("file_ref", "file is required for file lessons"),
            ),
            _ => Ok(()),
        }
    }
}

/// Checks the non-content lesson fields
pub fn validate_lesson_fields(
    title: Option<&str>,
    order: Option<i32>,
    duration_minutes: Option<i32>,
) -> Result<(), ValidationError> {
    if let Some(title) = title {
        not_blank("title", title)?;
    }
    if let Some(order) = order {
        non_negative("order", order.into())?;
    }
    if let Some(duration) = duration_minutes {
        non_negative("duration_minutes", duration.into())?;
    }
    Ok(())
}
