use domain_users::Actor;
use std::sync::Arc;
use tracing::instrument;
use uuid::Uuid;

use crate::error::{CategoryError, CategoryResult};
use crate::models::{Category, CreateCategory, UpdateCategory};
use crate::repository::CategoryRepository;

/// Category reference data. Anyone can read; only admins write.
pub struct CategoryService<R: CategoryRepository> {
    repository: Arc<R>,
}

impl<R: CategoryRepository> Clone for CategoryService<R> {
    fn clone(&self) -> Self {
        Self {
            repository: Arc::clone(&self.repository),
        }
    }
}

impl<R: CategoryRepository> CategoryService<R> {
    pub fn new(repository: R) -> Self {
        Self::from_shared(Arc::new(repository))
    }

    pub fn from_shared(repository: Arc<R>) -> Self {
        Self { repository }
    }

    #[instrument(skip(self, input), fields(actor = %actor.id))]
    pub async fn create_category(
        &self,
        actor: &Actor,
        input: CreateCategory,
    ) -> CategoryResult<Category> {
        require_admin(actor)?;
        let name = clean_name(&input.name)?;

        if self.repository.get_by_name(&name).await?.is_some() {
            return Err(CategoryError::DuplicateName(name));
        }
        self.repository.create(Category::new(&name)).await
    }

    #[instrument(skip(self))]
    pub async fn list_categories(&self) -> CategoryResult<Vec<Category>> {
        self.repository.list().await
    }

    #[instrument(skip(self))]
    pub async fn get_category(&self, id: Uuid) -> CategoryResult<Category> {
        self.repository
            .get_by_id(id)
            .await?
            .ok_or(CategoryError::NotFound(id))
    }

    #[instrument(skip(self, input), fields(actor = %actor.id))]
    pub async fn update_category(
        &self,
        actor: &Actor,
        id: Uuid,
        input: UpdateCategory,
    ) -> CategoryResult<Category> {
        require_admin(actor)?;
        let name = clean_name(&input.name)?;
        let mut category = self.get_category(id).await?;

        if let Some(existing) = self.repository.get_by_name(&name).await?
            && existing.id != id
        {
            return Err(CategoryError::DuplicateName(name));
        }

        category.name = name;
        let updated = self.repository.update(category).await?;
        tracing::info!(category_id = %updated.id, name = %updated.name, "Renamed category");
        Ok(updated)
    }

    /// Refused with `InUse` while any task references the category.
    #[instrument(skip(self), fields(actor = %actor.id))]
    pub async fn delete_category(&self, actor: &Actor, id: Uuid) -> CategoryResult<()> {
        require_admin(actor)?;

        if !self.repository.delete(id).await? {
            return Err(CategoryError::NotFound(id));
        }
        tracing::info!(category_id = %id, "Deleted category");
        Ok(())
    }
}

fn require_admin(actor: &Actor) -> CategoryResult<()> {
    if actor.is_admin() {
        Ok(())
    } else {
        Err(CategoryError::Forbidden(
            "Only administrators can manage categories".to_string(),
        ))
    }
}

fn clean_name(name: &str) -> CategoryResult<String> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(CategoryError::Validation(
            "Category name cannot be blank".to_string(),
        ));
    }
    Ok(trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::{InMemoryCategoryRepository, MockCategoryRepository};
    use domain_users::Role;

    fn admin() -> Actor {
        Actor::new(Uuid::now_v7(), Role::Admin)
    }

    fn create(name: &str) -> CreateCategory {
        CreateCategory {
            name: name.to_string(),
        }
    }

    #[tokio::test]
    async fn test_only_admins_write() {
        let service = CategoryService::new(InMemoryCategoryRepository::new());
        let client = Actor::new(Uuid::now_v7(), Role::Client);

        let err = service.create_category(&client, create("Design")).await.unwrap_err();
        assert!(matches!(err, CategoryError::Forbidden(_)));
        assert!(service.list_categories().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_create_trims_and_rejects_duplicates() {
        let service = CategoryService::new(InMemoryCategoryRepository::new());
        let admin = admin();

        let category = service.create_category(&admin, create("  Design ")).await.unwrap();
        assert_eq!(category.name, "Design");

        let err = service.create_category(&admin, create("design")).await.unwrap_err();
        assert!(matches!(err, CategoryError::DuplicateName(_)));

        let err = service.create_category(&admin, create("   ")).await.unwrap_err();
        assert!(matches!(err, CategoryError::Validation(_)));
    }

    #[tokio::test]
    async fn test_rename_to_own_name_with_new_case() {
        let service = CategoryService::new(InMemoryCategoryRepository::new());
        let admin = admin();
        let category = service.create_category(&admin, create("design")).await.unwrap();
        service.create_category(&admin, create("Writing")).await.unwrap();

        let renamed = service
            .update_category(&admin, category.id, UpdateCategory { name: "Design".into() })
            .await
            .unwrap();
        assert_eq!(renamed.name, "Design");

        let err = service
            .update_category(&admin, category.id, UpdateCategory { name: "WRITING".into() })
            .await
            .unwrap_err();
        assert!(matches!(err, CategoryError::DuplicateName(_)));
    }

    #[tokio::test]
    async fn test_delete_referenced_category_is_refused() {
        let repository = Arc::new(InMemoryCategoryRepository::new());
        let service = CategoryService::from_shared(repository.clone());
        let admin = admin();
        let category = service.create_category(&admin, create("Mobile")).await.unwrap();
        repository.mark_in_use(category.id).await;

        let err = service.delete_category(&admin, category.id).await.unwrap_err();
        assert!(matches!(err, CategoryError::InUse(_)));
        assert!(service.get_category(category.id).await.is_ok());
    }

    #[tokio::test]
    async fn test_delete_missing_category() {
        let mut mock = MockCategoryRepository::new();
        mock.expect_delete().times(1).returning(|_| Ok(false));
        let service = CategoryService::new(mock);

        let err = service.delete_category(&admin(), Uuid::now_v7()).await.unwrap_err();
        assert!(matches!(err, CategoryError::NotFound(_)));
    }
}
