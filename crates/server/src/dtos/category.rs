use chrono::{DateTime, Utc};
use database::{
    entities::categories,
    services::category::{CategoryChanges, CategoryWithCount, NewCategory},
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Serialize, ToSchema)]
pub struct CategoryResponse {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub slug: String,
    pub created_at: DateTime<Utc>,
    /// Published courses in the category; only present in listings
    #[serde(skip_serializing_if = "Option::is_none")]
    pub courses_count: Option<u64>,
}

impl From<categories::Model> for CategoryResponse {
    fn from(category: categories::Model) -> Self {
        Self {
            id: category.id,
            name: category.name,
            description: category.description,
            slug: category.slug,
            created_at: category.created_at,
            courses_count: None,
        }
    }
}

impl From<CategoryWithCount> for CategoryResponse {
    fn from(listed: CategoryWithCount) -> Self {
        Self {
            courses_count: Some(listed.courses_count),
            ..listed.category.into()
        }
    }
}

/// Compact form embedded in course responses
#[derive(Debug, Serialize, ToSchema)]
pub struct CategoryRef {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
}

impl From<categories::Model> for CategoryRef {
    fn from(category: categories::Model) -> Self {
        Self {
            id: category.id,
            name: category.name,
            slug: category.slug,
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateCategoryRequest {
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Derived from the name when omitted
    pub slug: Option<String>,
}

impl From<CreateCategoryRequest> for NewCategory {
    fn from(req: CreateCategoryRequest) -> Self {
        Self {
            name: req.name,
            description: req.description,
            slug: req.slug,
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateCategoryRequest {
    pub name: Option<String>,
    pub description: Option<String>,
}

impl From<UpdateCategoryRequest> for CategoryChanges {
    fn from(req: UpdateCategoryRequest) -> Self {
        Self {
            name: req.name,
            description: req.description,
        }
    }
}
