use crate::{
    auth::CurrentUser,
    dtos::{course::CourseResponse, teacher::TeacherStatsResponse},
    error::ApiResult,
    state::AppState,
};
use axum::{Json, extract::State};
use database::services::teacher::TeacherService;

/// Every course the caller teaches, drafts included
#[utoipa::path(
    get,
    path = "/teacher/courses",
    responses(
        (status = 200, description = "Courses retrieved successfully", body = [CourseResponse]),
        (status = 403, description = "Only teachers have courses")
    ),
    security(("jwt" = [])),
    tag = "Teacher"
)]
pub async fn teacher_courses(
    State(state): State<AppState>,
    CurrentUser(principal): CurrentUser,
) -> ApiResult<Json<Vec<CourseResponse>>> {
    let courses = TeacherService::teacher_courses(&state.db, &principal).await?;
    Ok(Json(courses.into_iter().map(Into::into).collect()))
}

/// Totals across the caller's courses
#[utoipa::path(
    get,
    path = "/teacher/stats",
    responses(
        (status = 200, description = "Statistics", body = TeacherStatsResponse),
        (status = 403, description = "Only teachers have statistics")
    ),
    security(("jwt" = [])),
    tag = "Teacher"
)]
pub async fn teacher_stats(
    State(state): State<AppState>,
    CurrentUser(principal): CurrentUser,
) -> ApiResult<Json<TeacherStatsResponse>> {
    let stats = TeacherService::teacher_stats(&state.db, &principal).await?;
    Ok(Json(stats.into()))
}
