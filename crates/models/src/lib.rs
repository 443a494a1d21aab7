pub mod course;
pub mod lesson;
pub mod progress;
pub mod role;
pub mod slug;
pub mod validation;

pub use validation::ValidationError;
