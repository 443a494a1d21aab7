pub mod category;
pub mod course;
pub mod enrollment;
pub mod lesson;
pub mod progress;
pub mod teacher;
