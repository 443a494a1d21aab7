use crate::routes::{category, course, enrollment, health, lesson, root, teacher};
use utoipa::{
    Modify, OpenApi,
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
};

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "jwt",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

/// API Documentation
#[derive(OpenApi)]
#[openapi(
    paths(
        root::root,
        health::health,
        category::list_categories,
        category::create_category,
        category::get_category,
        category::update_category,
        category::delete_category,
        category::get_category_courses,
        course::get_courses,
        course::create_course,
        course::get_course_by_id,
        course::update_course,
        course::delete_course,
        course::get_course_lessons,
        course::enroll,
        course::enrollment_status,
        lesson::create_lesson,
        lesson::get_lesson,
        lesson::update_lesson,
        lesson::delete_lesson,
        enrollment::list_enrollments,
        enrollment::get_enrollment,
        enrollment::unenroll,
        enrollment::get_progress,
        enrollment::complete_lesson,
        enrollment::my_courses,
        teacher::teacher_courses,
        teacher::teacher_stats,
    ),
    components(schemas(crate::error::ErrorResponse)),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Liveness endpoints"),
        (name = "Categories", description = "Course categories"),
        (name = "Courses", description = "Course catalog"),
        (name = "Lessons", description = "Lessons within a course"),
        (name = "Enrollments", description = "Enrollment and progress tracking"),
        (name = "Teacher", description = "Teacher dashboard"),
    ),
    info(
        title = "Course Marketplace API",
        version = "1.0.0",
        description = "Online course marketplace: catalog, enrollments and progress",
        license(
            name = "MIT OR Apache-2.0",
        )
    )
)]
pub struct ApiDoc;
