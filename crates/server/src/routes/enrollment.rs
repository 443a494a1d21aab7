use crate::{
    auth::CurrentUser,
    dtos::enrollment::{
        CompleteLessonRequest, CompleteLessonResponse, EnrollmentDetailResponse,
        EnrollmentResponse, ProgressResponse,
    },
    error::ApiResult,
    extract::ApiJson,
    state::AppState,
};
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use database::services::enrollment::EnrollmentService;
use uuid::Uuid;

/// Students get their enrollments, teachers the enrollments in their courses
#[utoipa::path(
    get,
    path = "/enrollments",
    responses(
        (status = 200, description = "Enrollments retrieved successfully", body = [EnrollmentResponse]),
        (status = 401, description = "Unauthorized - invalid or missing JWT")
    ),
    security(("jwt" = [])),
    tag = "Enrollments"
)]
pub async fn list_enrollments(
    State(state): State<AppState>,
    CurrentUser(principal): CurrentUser,
) -> ApiResult<Json<Vec<EnrollmentResponse>>> {
    let enrollments = EnrollmentService::list_enrollments(&state.db, &principal).await?;
    Ok(Json(enrollments.into_iter().map(Into::into).collect()))
}

/// Get an enrollment with its progress
#[utoipa::path(
    get,
    path = "/enrollments/{id}",
    params(
        ("id" = Uuid, Path, description = "Enrollment ID")
    ),
    responses(
        (status = 200, description = "Enrollment found", body = EnrollmentDetailResponse),
        (status = 404, description = "Enrollment not found")
    ),
    security(("jwt" = [])),
    tag = "Enrollments"
)]
pub async fn get_enrollment(
    State(state): State<AppState>,
    CurrentUser(principal): CurrentUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<EnrollmentDetailResponse>> {
    let detail = EnrollmentService::get_enrollment_detail(&state.db, &principal, id).await?;
    Ok(Json(detail.into()))
}

/// Leave a course, discarding progress
#[utoipa::path(
    delete,
    path = "/enrollments/{id}",
    params(
        ("id" = Uuid, Path, description = "Enrollment ID")
    ),
    responses(
        (status = 204, description = "Unenrolled"),
        (status = 403, description = "Only students may unenroll"),
        (status = 404, description = "Enrollment not found")
    ),
    security(("jwt" = [])),
    tag = "Enrollments"
)]
pub async fn unenroll(
    State(state): State<AppState>,
    CurrentUser(principal): CurrentUser,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    EnrollmentService::unenroll(&state.db, &principal, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Progress records of an enrollment, in lesson order
#[utoipa::path(
    get,
    path = "/enrollments/{id}/progress",
    params(
        ("id" = Uuid, Path, description = "Enrollment ID")
    ),
    responses(
        (status = 200, description = "Progress retrieved successfully", body = [ProgressResponse]),
        (status = 404, description = "Enrollment not found")
    ),
    security(("jwt" = [])),
    tag = "Enrollments"
)]
pub async fn get_progress(
    State(state): State<AppState>,
    CurrentUser(principal): CurrentUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Vec<ProgressResponse>>> {
    let entries = EnrollmentService::list_progress(&state.db, &principal, id).await?;
    Ok(Json(entries.into_iter().map(Into::into).collect()))
}

/// Mark a lesson as completed. Completing it again changes nothing.
#[utoipa::path(
    post,
    path = "/enrollments/{id}/complete-lesson",
    params(
        ("id" = Uuid, Path, description = "Enrollment ID")
    ),
    request_body = CompleteLessonRequest,
    responses(
        (status = 200, description = "Lesson completed", body = CompleteLessonResponse),
        (status = 403, description = "Only students track progress"),
        (status = 404, description = "Enrollment not found, or lesson not in this course")
    ),
    security(("jwt" = [])),
    tag = "Enrollments"
)]
pub async fn complete_lesson(
    State(state): State<AppState>,
    CurrentUser(principal): CurrentUser,
    Path(id): Path<Uuid>,
    ApiJson(req): ApiJson<CompleteLessonRequest>,
) -> ApiResult<Json<CompleteLessonResponse>> {
    let completion =
        EnrollmentService::complete_lesson(&state.db, &principal, id, req.lesson_id).await?;
    Ok(Json(completion.into()))
}

/// The calling student's courses with progress
#[utoipa::path(
    get,
    path = "/my-courses",
    responses(
        (status = 200, description = "Enrolled courses", body = [EnrollmentDetailResponse]),
        (status = 403, description = "Only students have enrolled courses")
    ),
    security(("jwt" = [])),
    tag = "Enrollments"
)]
pub async fn my_courses(
    State(state): State<AppState>,
    CurrentUser(principal): CurrentUser,
) -> ApiResult<Json<Vec<EnrollmentDetailResponse>>> {
    let details = EnrollmentService::my_courses(&state.db, &principal).await?;
    Ok(Json(details.into_iter().map(Into::into).collect()))
}
