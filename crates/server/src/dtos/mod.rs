use serde::{Deserialize, Deserializer};

pub mod category;
pub mod course;
pub mod enrollment;
pub mod lesson;
pub mod teacher;

/// Keeps an explicit `null` apart from an absent field in partial updates
fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}
