use crate::state::AppState;
use axum::{
    Router,
    routing::{get, post},
};

pub mod category;
pub mod course;
pub mod enrollment;
pub mod health;
pub mod lesson;
pub mod root;
pub mod teacher;

/// Routes reachable without a token
pub fn public_router() -> Router<AppState> {
    Router::new()
        .route("/", get(root::root))
        .route("/health", get(health::health))
}

/// Routes that expect validated claims in the request extensions
pub fn api_router() -> Router<AppState> {
    Router::new()
        .route(
            "/categories",
            get(category::list_categories).post(category::create_category),
        )
        .route(
            "/categories/{slug}",
            get(category::get_category)
                .patch(category::update_category)
                .delete(category::delete_category),
        )
        .route(
            "/categories/{slug}/courses",
            get(category::get_category_courses),
        )
        .route("/courses", get(course::get_courses).post(course::create_course))
        .route(
            "/courses/{id}",
            get(course::get_course_by_id)
                .patch(course::update_course)
                .delete(course::delete_course),
        )
        .route("/courses/{id}/lessons", get(course::get_course_lessons))
        .route("/courses/{id}/enroll", post(course::enroll))
        .route(
            "/courses/{id}/enrollment-status",
            get(course::enrollment_status),
        )
        .route("/lessons", post(lesson::create_lesson))
        .route(
            "/lessons/{id}",
            get(lesson::get_lesson)
                .patch(lesson::update_lesson)
                .delete(lesson::delete_lesson),
        )
        .route("/enrollments", get(enrollment::list_enrollments))
        .route(
            "/enrollments/{id}",
            get(enrollment::get_enrollment).delete(enrollment::unenroll),
        )
        .route("/enrollments/{id}/progress", get(enrollment::get_progress))
        .route(
            "/enrollments/{id}/complete-lesson",
            post(enrollment::complete_lesson),
        )
        .route("/my-courses", get(enrollment::my_courses))
        .route("/teacher/courses", get(teacher::teacher_courses))
        .route("/teacher/stats", get(teacher::teacher_stats))
}
