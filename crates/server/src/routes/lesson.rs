use crate::{
    auth::CurrentUser,
    dtos::lesson::{CreateLessonRequest, LessonResponse, UpdateLessonRequest},
    error::ApiResult,
    extract::ApiJson,
    state::AppState,
};
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use database::services::lesson::LessonService;
use uuid::Uuid;

/// Add a lesson to one of the caller's courses
#[utoipa::path(
    post,
    path = "/lessons",
    request_body = CreateLessonRequest,
    responses(
        (status = 201, description = "Lesson created", body = LessonResponse),
        (status = 400, description = "Invalid lesson"),
        (status = 403, description = "Not the owner of this course"),
        (status = 404, description = "Course not found"),
        (status = 409, description = "Lesson order already taken")
    ),
    security(("jwt" = [])),
    tag = "Lessons"
)]
pub async fn create_lesson(
    State(state): State<AppState>,
    CurrentUser(principal): CurrentUser,
    ApiJson(req): ApiJson<CreateLessonRequest>,
) -> ApiResult<(StatusCode, Json<LessonResponse>)> {
    let lesson = LessonService::create(&state.db, &principal, req.into()).await?;
    Ok((StatusCode::CREATED, Json(lesson.into())))
}

/// Get a lesson by ID
#[utoipa::path(
    get,
    path = "/lessons/{id}",
    params(
        ("id" = Uuid, Path, description = "Lesson ID")
    ),
    responses(
        (status = 200, description = "Lesson found", body = LessonResponse),
        (status = 404, description = "Lesson not found")
    ),
    security(("jwt" = [])),
    tag = "Lessons"
)]
pub async fn get_lesson(
    State(state): State<AppState>,
    CurrentUser(principal): CurrentUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<LessonResponse>> {
    let lesson = LessonService::get(&state.db, &principal, id).await?;
    Ok(Json(lesson.into()))
}

/// Update a lesson
#[utoipa::path(
    patch,
    path = "/lessons/{id}",
    params(
        ("id" = Uuid, Path, description = "Lesson ID")
    ),
    request_body = UpdateLessonRequest,
    responses(
        (status = 200, description = "Lesson updated", body = LessonResponse),
        (status = 400, description = "Invalid lesson"),
        (status = 403, description = "Not the owner of this course"),
        (status = 404, description = "Lesson not found"),
        (status = 409, description = "Lesson order already taken")
    ),
    security(("jwt" = [])),
    tag = "Lessons"
)]
pub async fn update_lesson(
    State(state): State<AppState>,
    CurrentUser(principal): CurrentUser,
    Path(id): Path<Uuid>,
    ApiJson(req): ApiJson<UpdateLessonRequest>,
) -> ApiResult<Json<LessonResponse>> {
    let lesson = LessonService::update(&state.db, &principal, id, req.into()).await?;
    Ok(Json(lesson.into()))
}

/// Delete a lesson along with its progress records
#[utoipa::path(
    delete,
    path = "/lessons/{id}",
    params(
        ("id" = Uuid, Path, description = "Lesson ID")
    ),
    responses(
        (status = 204, description = "Lesson deleted"),
        (status = 403, description = "Not the owner of this course"),
        (status = 404, description = "Lesson not found")
    ),
    security(("jwt" = [])),
    tag = "Lessons"
)]
pub async fn delete_lesson(
    State(state): State<AppState>,
    CurrentUser(principal): CurrentUser,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    LessonService::delete(&state.db, &principal, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
