pub mod categories;
pub mod courses;
pub mod enrollments;
pub mod lessons;
pub mod progress_records;
