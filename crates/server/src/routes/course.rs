use crate::{
    auth::CurrentUser,
    dtos::{
        course::{
            CourseDetailResponse, CourseQueryParams, CourseResponse, CreateCourseRequest,
            PaginatedCoursesResponse, PaginationMeta, UpdateCourseRequest,
        },
        enrollment::{EnrollmentResponse, EnrollmentStatusResponse},
        lesson::LessonResponse,
    },
    error::ApiResult,
    extract::ApiJson,
    state::AppState,
};
use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use database::services::{
    course::{CourseQuery, CourseService},
    enrollment::{EnrollOutcome, EnrollmentService},
    lesson::LessonService,
};
use uuid::Uuid;

/// Get paginated list of courses
#[utoipa::path(
    get,
    path = "/courses",
    params(CourseQueryParams),
    responses(
        (status = 200, description = "List of courses retrieved successfully", body = PaginatedCoursesResponse),
        (status = 400, description = "Invalid query parameters"),
        (status = 401, description = "Unauthorized - invalid or missing JWT")
    ),
    security(("jwt" = [])),
    tag = "Courses"
)]
pub async fn get_courses(
    State(state): State<AppState>,
    CurrentUser(principal): CurrentUser,
    Query(params): Query<CourseQueryParams>,
) -> ApiResult<Json<PaginatedCoursesResponse>> {
    let query = CourseQuery::try_from(params)?;
    let (page, per_page) = (query.page, query.per_page);

    let (courses, total_items) = CourseService::list(&state.db, &principal, query).await?;

    Ok(Json(PaginatedCoursesResponse {
        courses: courses.into_iter().map(Into::into).collect(),
        pagination: PaginationMeta::new(page, per_page, total_items),
    }))
}

/// Create a course owned by the caller
#[utoipa::path(
    post,
    path = "/courses",
    request_body = CreateCourseRequest,
    responses(
        (status = 201, description = "Course created", body = CourseResponse),
        (status = 400, description = "Invalid course"),
        (status = 403, description = "Only teachers may create courses"),
        (status = 409, description = "Slug already taken")
    ),
    security(("jwt" = [])),
    tag = "Courses"
)]
pub async fn create_course(
    State(state): State<AppState>,
    CurrentUser(principal): CurrentUser,
    ApiJson(req): ApiJson<CreateCourseRequest>,
) -> ApiResult<(StatusCode, Json<CourseResponse>)> {
    let course = CourseService::create(&state.db, &principal, req.into()).await?;
    Ok((StatusCode::CREATED, Json(course.into())))
}

/// Get a specific course by ID, with its lessons
#[utoipa::path(
    get,
    path = "/courses/{id}",
    params(
        ("id" = Uuid, Path, description = "Course ID")
    ),
    responses(
        (status = 200, description = "Course found", body = CourseDetailResponse),
        (status = 404, description = "Course not found")
    ),
    security(("jwt" = [])),
    tag = "Courses"
)]
pub async fn get_course_by_id(
    State(state): State<AppState>,
    CurrentUser(principal): CurrentUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<CourseDetailResponse>> {
    let detail = CourseService::get(&state.db, &principal, id).await?;
    Ok(Json(detail.into()))
}

/// Update a course
#[utoipa::path(
    patch,
    path = "/courses/{id}",
    params(
        ("id" = Uuid, Path, description = "Course ID")
    ),
    request_body = UpdateCourseRequest,
    responses(
        (status = 200, description = "Course updated", body = CourseResponse),
        (status = 400, description = "Invalid course"),
        (status = 403, description = "Not the owner of this course"),
        (status = 404, description = "Course not found")
    ),
    security(("jwt" = [])),
    tag = "Courses"
)]
pub async fn update_course(
    State(state): State<AppState>,
    CurrentUser(principal): CurrentUser,
    Path(id): Path<Uuid>,
    ApiJson(req): ApiJson<UpdateCourseRequest>,
) -> ApiResult<Json<CourseResponse>> {
    let course = CourseService::update(&state.db, &principal, id, req.into()).await?;
    Ok(Json(course.into()))
}

/// Delete a course with its lessons and enrollments
#[utoipa::path(
    delete,
    path = "/courses/{id}",
    params(
        ("id" = Uuid, Path, description = "Course ID")
    ),
    responses(
        (status = 204, description = "Course deleted"),
        (status = 403, description = "Not the owner of this course"),
        (status = 404, description = "Course not found")
    ),
    security(("jwt" = [])),
    tag = "Courses"
)]
pub async fn delete_course(
    State(state): State<AppState>,
    CurrentUser(principal): CurrentUser,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    CourseService::delete(&state.db, &principal, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Lessons of a course, in order
#[utoipa::path(
    get,
    path = "/courses/{id}/lessons",
    params(
        ("id" = Uuid, Path, description = "Course ID")
    ),
    responses(
        (status = 200, description = "Lessons retrieved successfully", body = [LessonResponse]),
        (status = 404, description = "Course not found")
    ),
    security(("jwt" = [])),
    tag = "Courses"
)]
pub async fn get_course_lessons(
    State(state): State<AppState>,
    CurrentUser(principal): CurrentUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Vec<LessonResponse>>> {
    let lessons = LessonService::list_for_course(&state.db, &principal, id).await?;
    Ok(Json(lessons.into_iter().map(Into::into).collect()))
}

/// Enroll the caller in a course. Enrolling twice returns the existing enrollment.
#[utoipa::path(
    post,
    path = "/courses/{id}/enroll",
    params(
        ("id" = Uuid, Path, description = "Course ID")
    ),
    responses(
        (status = 201, description = "Enrolled", body = EnrollmentResponse),
        (status = 200, description = "Already enrolled", body = EnrollmentResponse),
        (status = 400, description = "Course is not published"),
        (status = 403, description = "Only students may enroll"),
        (status = 404, description = "Course not found")
    ),
    security(("jwt" = [])),
    tag = "Enrollments"
)]
pub async fn enroll(
    State(state): State<AppState>,
    CurrentUser(principal): CurrentUser,
    Path(id): Path<Uuid>,
) -> ApiResult<(StatusCode, Json<EnrollmentResponse>)> {
    let outcome = EnrollmentService::enroll(&state.db, &principal, id).await?;
    let status = match outcome {
        EnrollOutcome::Created(_) => StatusCode::CREATED,
        EnrollOutcome::AlreadyEnrolled(_) => StatusCode::OK,
    };

    let enrollment = outcome.into_enrollment();
    let course = CourseService::find_visible(&state.db, &principal, enrollment.course_id).await?;
    Ok((status, Json(EnrollmentResponse::new(enrollment, course.into()))))
}

/// Whether the caller is enrolled in a course, with progress if so
#[utoipa::path(
    get,
    path = "/courses/{id}/enrollment-status",
    params(
        ("id" = Uuid, Path, description = "Course ID")
    ),
    responses(
        (status = 200, description = "Enrollment status", body = EnrollmentStatusResponse),
        (status = 404, description = "Course not found")
    ),
    security(("jwt" = [])),
    tag = "Enrollments"
)]
pub async fn enrollment_status(
    State(state): State<AppState>,
    CurrentUser(principal): CurrentUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<EnrollmentStatusResponse>> {
    let detail = EnrollmentService::enrollment_status(&state.db, &principal, id).await?;
    Ok(Json(detail.into()))
}
