use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::{CategoryError, CategoryResult};
use crate::models::Category;

/// Repository trait for Category persistence
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CategoryRepository: Send + Sync {
    async fn create(&self, category: Category) -> CategoryResult<Category>;

    async fn get_by_id(&self, id: Uuid) -> CategoryResult<Option<Category>>;

    /// Case-insensitive lookup
    async fn get_by_name(&self, name: &str) -> CategoryResult<Option<Category>>;

    /// All categories ordered by name
    async fn list(&self) -> CategoryResult<Vec<Category>>;

    async fn update(&self, category: Category) -> CategoryResult<Category>;

    /// Delete unless a task references the category (`CategoryError::InUse`).
    /// Returns false when the row did not exist.
    async fn delete(&self, id: Uuid) -> CategoryResult<bool>;
}

#[derive(Debug, Default)]
struct Store {
    categories: HashMap<Uuid, Category>,
    in_use: HashSet<Uuid>,
}

/// In-memory implementation of CategoryRepository (for development/testing)
#[derive(Debug, Default, Clone)]
pub struct InMemoryCategoryRepository {
    store: Arc<RwLock<Store>>,
}

impl InMemoryCategoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that a task references `id`, as a foreign key would.
    pub async fn mark_in_use(&self, id: Uuid) {
        self.store.write().await.in_use.insert(id);
    }
}

fn same_name(a: &str, b: &str) -> bool {
    a.to_lowercase() == b.to_lowercase()
}

#[async_trait]
impl CategoryRepository for InMemoryCategoryRepository {
    async fn create(&self, category: Category) -> CategoryResult<Category> {
        let mut store = self.store.write().await;

        if store.categories.values().any(|c| same_name(&c.name, &category.name)) {
            return Err(CategoryError::DuplicateName(category.name));
        }

        store.categories.insert(category.id, category.clone());
        tracing::info!(category_id = %category.id, name = %category.name, "Created category");
        Ok(category)
    }

    async fn get_by_id(&self, id: Uuid) -> CategoryResult<Option<Category>> {
        Ok(self.store.read().await.categories.get(&id).cloned())
    }

    async fn get_by_name(&self, name: &str) -> CategoryResult<Option<Category>> {
        let store = self.store.read().await;
        Ok(store
            .categories
            .values()
            .find(|c| same_name(&c.name, name))
            .cloned())
    }

    async fn list(&self) -> CategoryResult<Vec<Category>> {
        let store = self.store.read().await;
        let mut all: Vec<Category> = store.categories.values().cloned().collect();
        all.sort_by_key(|c| c.name.to_lowercase());
        Ok(all)
    }

    async fn update(&self, category: Category) -> CategoryResult<Category> {
        let mut store = self.store.write().await;

        if !store.categories.contains_key(&category.id) {
            return Err(CategoryError::NotFound(category.id));
        }
        if store
            .categories
            .values()
            .any(|c| c.id != category.id && same_name(&c.name, &category.name))
        {
            return Err(CategoryError::DuplicateName(category.name));
        }

        store.categories.insert(category.id, category.clone());
        Ok(category)
    }

    async fn delete(&self, id: Uuid) -> CategoryResult<bool> {
        let mut store = self.store.write().await;

        if store.in_use.contains(&id) {
            return Err(CategoryError::InUse(id));
        }
        Ok(store.categories.remove(&id).is_some())
    }
}
