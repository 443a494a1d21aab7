use crate::{
    auth::CurrentUser,
    dtos::{
        category::{CategoryResponse, CreateCategoryRequest, UpdateCategoryRequest},
        course::CourseResponse,
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
use database::services::{category::CategoryService, course::CourseService};

/// List all categories with their published course counts
#[utoipa::path(
    get,
    path = "/categories",
    responses(
        (status = 200, description = "Categories retrieved successfully", body = [CategoryResponse]),
        (status = 401, description = "Unauthorized - invalid or missing JWT")
    ),
    security(("jwt" = [])),
    tag = "Categories"
)]
pub async fn list_categories(
    State(state): State<AppState>,
    _user: CurrentUser,
) -> ApiResult<Json<Vec<CategoryResponse>>> {
    let categories = CategoryService::list(&state.db).await?;
    Ok(Json(categories.into_iter().map(Into::into).collect()))
}

/// Create a category
#[utoipa::path(
    post,
    path = "/categories",
    request_body = CreateCategoryRequest,
    responses(
        (status = 201, description = "Category created", body = CategoryResponse),
        (status = 400, description = "Invalid category"),
        (status = 403, description = "Only teachers may manage categories"),
        (status = 409, description = "Name or slug already taken")
    ),
    security(("jwt" = [])),
    tag = "Categories"
)]
pub async fn create_category(
    State(state): State<AppState>,
    CurrentUser(principal): CurrentUser,
    ApiJson(req): ApiJson<CreateCategoryRequest>,
) -> ApiResult<(StatusCode, Json<CategoryResponse>)> {
    let category = CategoryService::create(&state.db, &principal, req.into()).await?;
    Ok((StatusCode::CREATED, Json(category.into())))
}

/// Get a category by slug
#[utoipa::path(
    get,
    path = "/categories/{slug}",
    params(("slug" = String, Path, description = "Category slug")),
    responses(
        (status = 200, description = "Category found", body = CategoryResponse),
        (status = 404, description = "Category not found")
    ),
    security(("jwt" = [])),
    tag = "Categories"
)]
pub async fn get_category(
    State(state): State<AppState>,
    _user: CurrentUser,
    Path(slug): Path<String>,
) -> ApiResult<Json<CategoryResponse>> {
    let category = CategoryService::get_by_slug(&state.db, &slug).await?;
    Ok(Json(category.into()))
}

/// Update a category
#[utoipa::path(
    patch,
    path = "/categories/{slug}",
    params(("slug" = String, Path, description = "Category slug")),
    request_body = UpdateCategoryRequest,
    responses(
        (status = 200, description = "Category updated", body = CategoryResponse),
        (status = 403, description = "Only teachers may manage categories"),
        (status = 404, description = "Category not found")
    ),
    security(("jwt" = [])),
    tag = "Categories"
)]
pub async fn update_category(
    State(state): State<AppState>,
    CurrentUser(principal): CurrentUser,
    Path(slug): Path<String>,
    ApiJson(req): ApiJson<UpdateCategoryRequest>,
) -> ApiResult<Json<CategoryResponse>> {
    let category = CategoryService::update(&state.db, &principal, &slug, req.into()).await?;
    Ok(Json(category.into()))
}

/// Delete a category; its courses become uncategorized
#[utoipa::path(
    delete,
    path = "/categories/{slug}",
    params(("slug" = String, Path, description = "Category slug")),
    responses(
        (status = 204, description = "Category deleted"),
        (status = 403, description = "Only teachers may manage categories"),
        (status = 404, description = "Category not found")
    ),
    security(("jwt" = [])),
    tag = "Categories"
)]
pub async fn delete_category(
    State(state): State<AppState>,
    CurrentUser(principal): CurrentUser,
    Path(slug): Path<String>,
) -> ApiResult<StatusCode> {
    CategoryService::delete(&state.db, &principal, &slug).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Published courses in a category
#[utoipa::path(
    get,
    path = "/categories/{slug}/courses",
    params(("slug" = String, Path, description = "Category slug")),
    responses(
        (status = 200, description = "Courses retrieved successfully", body = [CourseResponse]),
        (status = 404, description = "Category not found")
    ),
    security(("jwt" = [])),
    tag = "Categories"
)]
pub async fn get_category_courses(
    State(state): State<AppState>,
    _user: CurrentUser,
    Path(slug): Path<String>,
) -> ApiResult<Json<Vec<CourseResponse>>> {
    let courses = CategoryService::published_courses(&state.db, &slug).await?;
    let summaries = CourseService::summarize(&state.db, courses).await?;
    Ok(Json(summaries.into_iter().map(Into::into).collect()))
}
