use crate::{
    entities::{categories, courses},
    error::{Result, ServiceError},
};
use chrono::Utc;
use log::info;
use models::{
    role::{Capability, Principal},
    slug::resolve_slug,
    validation::not_blank,
};
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, ConnectionTrait, DatabaseConnection,
    EntityTrait, QueryFilter, QueryOrder, QuerySelect, sea_query::Expr,
};
use std::collections::HashMap;
use uuid::Uuid;

pub struct NewCategory {
    pub name: String,
    pub description: String,
    pub slug: Option<String>,
}

#[derive(Debug, Default)]
pub struct CategoryChanges {
    pub name: Option<String>,
    pub description: Option<String>,
}

/// A category along with the number of published courses filed under it
#[derive(Debug, Clone)]
pub struct CategoryWithCount {
    pub category: categories::Model,
    pub courses_count: u64,
}

pub struct CategoryService;

impl CategoryService {
    /// All categories, ordered by name
    pub async fn list(db: &DatabaseConnection) -> Result<Vec<CategoryWithCount>> {
        let categories = categories::Entity::find()
            .order_by_asc(categories::Column::Name)
            .all(db)
            .await?;

        let counts: HashMap<Uuid, i64> = courses::Entity::find()
            .select_only()
            .column(courses::Column::CategoryId)
            .column_as(Expr::col(courses::Column::Id).count(), "count")
            .filter(courses::Column::IsPublished.eq(true))
            .filter(courses::Column::CategoryId.is_not_null())
            .group_by(courses::Column::CategoryId)
            .into_tuple::<(Option<Uuid>, i64)>()
            .all(db)
            .await?
            .into_iter()
            .filter_map(|(id, count)| id.map(|id| (id, count)))
            .collect();

        Ok(categories
            .into_iter()
            .map(|category| {
                let courses_count = counts.get(&category.id).copied().unwrap_or(0) as u64;
                CategoryWithCount {
                    category,
                    courses_count,
                }
            })
            .collect())
    }

    pub async fn find_by_slug<C: ConnectionTrait>(
        db: &C,
        slug: &str,
    ) -> Result<Option<categories::Model>> {
        Ok(categories::Entity::find()
            .filter(categories::Column::Slug.eq(slug))
            .one(db)
            .await?)
    }

    pub async fn get_by_slug<C: ConnectionTrait>(db: &C, slug: &str) -> Result<categories::Model> {
        Self::find_by_slug(db, slug)
            .await?
            .ok_or_else(|| ServiceError::not_found("category", slug))
    }

    /// Fails with `NotFound` unless the category exists
    pub async fn ensure_exists<C: ConnectionTrait>(db: &C, id: Uuid) -> Result<()> {
        categories::Entity::find_by_id(id)
            .one(db)
            .await?
            .map(|_| ())
            .ok_or_else(|| ServiceError::not_found("category", id))
    }

    pub async fn create(
        db: &DatabaseConnection,
        principal: &Principal,
        new: NewCategory,
    ) -> Result<categories::Model> {
        principal.require(Capability::ManageCatalog)?;
        not_blank("name", &new.name)?;
        let slug = resolve_slug(new.slug.as_deref(), &new.name)?;

        let category = categories::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(new.name.trim().to_owned()),
            description: Set(new.description),
            slug: Set(slug.clone()),
            created_at: Set(Utc::now()),
        }
        .insert(db)
        .await
        .map_err(|e| {
            ServiceError::from_unique_violation(e, || {
                format!("a category named '{}' or with slug '{slug}' already exists", new.name)
            })
        })?;

        info!("Category '{}' created by {}", category.slug, principal.user_id);
        Ok(category)
    }

    pub async fn update(
        db: &DatabaseConnection,
        principal: &Principal,
        slug: &str,
        changes: CategoryChanges,
    ) -> Result<categories::Model> {
        principal.require(Capability::ManageCatalog)?;
        let category = Self::get_by_slug(db, slug).await?;

        let mut active: categories::ActiveModel = category.into();
        if let Some(name) = changes.name {
            not_blank("name", &name)?;
            active.name = Set(name.trim().to_owned());
        }
        if let Some(description) = changes.description {
            active.description = Set(description);
        }

        active.update(db).await.map_err(|e| {
            ServiceError::from_unique_violation(e, || "a category with this name already exists".into())
        })
    }

    /// Deletes a category; its courses stay, uncategorized
    pub async fn delete(db: &DatabaseConnection, principal: &Principal, slug: &str) -> Result<()> {
        principal.require(Capability::ManageCatalog)?;
        let category = Self::get_by_slug(db, slug).await?;

        categories::Entity::delete_by_id(category.id).exec(db).await?;
        info!("Category '{slug}' deleted by {}", principal.user_id);
        Ok(())
    }

    /// Published courses filed under a category, newest first
    pub async fn published_courses(
        db: &DatabaseConnection,
        slug: &str,
    ) -> Result<Vec<courses::Model>> {
        let category = Self::get_by_slug(db, slug).await?;

        Ok(courses::Entity::find()
            .filter(courses::Column::CategoryId.eq(category.id))
            .filter(courses::Column::IsPublished.eq(true))
            .order_by_desc(courses::Column::CreatedAt)
            .all(db)
            .await?)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::test_utils::{setup, student, teacher};

    fn new_category(name: &str) -> NewCategory {
        NewCategory {
            name: name.to_owned(),
            description: String::new(),
            slug: None,
        }
    }

    #[tokio::test]
    async fn test_create_derives_slug() {
        let db = setup().await;
        let category = CategoryService::create(&db, &teacher(), new_category("Web Design"))
            .await
            .unwrap();

        assert_eq!(category.slug, "web-design");
        let found = CategoryService::get_by_slug(&db, "web-design").await.unwrap();
        assert_eq!(found.id, category.id);
    }

    #[tokio::test]
    async fn test_duplicate_name_conflicts() {
        let db = setup().await;
        CategoryService::create(&db, &teacher(), new_category("Business"))
            .await
            .unwrap();

        let err = CategoryService::create(&db, &teacher(), new_category("Business"))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_students_cannot_manage_categories() {
        let db = setup().await;
        let err = CategoryService::create(&db, &student("s1"), new_category("Music"))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Permission(_)));
    }

    #[tokio::test]
    async fn test_update_and_delete() {
        let db = setup().await;
        CategoryService::create(&db, &teacher(), new_category("Design"))
            .await
            .unwrap();

        let updated = CategoryService::update(
            &db,
            &teacher(),
            "design",
            CategoryChanges {
                description: Some("Visual things".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(updated.description, "Visual things");
        assert_eq!(updated.name, "Design");

        CategoryService::delete(&db, &teacher(), "design").await.unwrap();
        let err = CategoryService::get_by_slug(&db, "design").await.unwrap_err();
        assert!(matches!(err, ServiceError::NotFound { .. }));
    }
}
