use async_trait::async_trait;
use axum_helpers::PageParams;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::{UserError, UserResult};
use crate::models::{Profile, User, UserQuery};

/// Repository trait for User and Profile persistence
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Insert a user together with its profile
    async fn create(&self, user: User, profile: Profile) -> UserResult<User>;

    async fn get_by_id(&self, id: Uuid) -> UserResult<Option<User>>;

    /// Lookup by normalized email
    async fn get_by_email(&self, email: &str) -> UserResult<Option<User>>;

    /// Overwrite every mutable column of an existing user
    async fn update(&self, user: User) -> UserResult<User>;

    /// Delete a user; the profile and owned rows go with it
    async fn delete(&self, id: Uuid) -> UserResult<bool>;

    /// Newest first, with the total number of matching rows
    async fn list(&self, query: UserQuery, page: PageParams) -> UserResult<(Vec<User>, u64)>;

    async fn get_profile(&self, user_id: Uuid) -> UserResult<Option<Profile>>;

    async fn update_profile(&self, profile: Profile) -> UserResult<Profile>;
}

#[derive(Debug, Default)]
struct Store {
    users: HashMap<Uuid, User>,
    profiles: HashMap<Uuid, Profile>,
}

/// In-memory implementation of UserRepository (for development/testing)
#[derive(Debug, Default, Clone)]
pub struct InMemoryUserRepository {
    store: Arc<RwLock<Store>>,
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn create(&self, user: User, profile: Profile) -> UserResult<User> {
        let mut store = self.store.write().await;

        if store.users.values().any(|u| u.email == user.email) {
            return Err(UserError::DuplicateEmail(user.email));
        }

        store.profiles.insert(user.id, profile);
        store.users.insert(user.id, user.clone());

        tracing::info!(user_id = %user.id, role = %user.role, "Created user");
        Ok(user)
    }

    async fn get_by_id(&self, id: Uuid) -> UserResult<Option<User>> {
        Ok(self.store.read().await.users.get(&id).cloned())
    }

    async fn get_by_email(&self, email: &str) -> UserResult<Option<User>> {
        let store = self.store.read().await;
        Ok(store.users.values().find(|u| u.email == email).cloned())
    }

    async fn update(&self, user: User) -> UserResult<User> {
        let mut store = self.store.write().await;

        if !store.users.contains_key(&user.id) {
            return Err(UserError::NotFound(user.id));
        }
        if store
            .users
            .values()
            .any(|u| u.id != user.id && u.email == user.email)
        {
            return Err(UserError::DuplicateEmail(user.email));
        }

        store.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn delete(&self, id: Uuid) -> UserResult<bool> {
        let mut store = self.store.write().await;
        store.profiles.remove(&id);

        if store.users.remove(&id).is_some() {
            tracing::info!(user_id = %id, "Deleted user");
            Ok(true)
        } else {
            Ok(false)
        }
    }

    async fn list(&self, query: UserQuery, page: PageParams) -> UserResult<(Vec<User>, u64)> {
        let store = self.store.read().await;

        let mut matching: Vec<User> = store
            .users
            .values()
            .filter(|u| query.matches(u))
            .cloned()
            .collect();
        matching.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));

        let total = matching.len() as u64;
        let items = matching
            .into_iter()
            .skip(page.offset() as usize)
            .take(page.limit as usize)
            .collect();

        Ok((items, total))
    }

    async fn get_profile(&self, user_id: Uuid) -> UserResult<Option<Profile>> {
        Ok(self.store.read().await.profiles.get(&user_id).cloned())
    }

    async fn update_profile(&self, profile: Profile) -> UserResult<Profile> {
        let mut store = self.store.write().await;

        if !store.users.contains_key(&profile.user_id) {
            return Err(UserError::NotFound(profile.user_id));
        }

        store.profiles.insert(profile.user_id, profile.clone());
        Ok(profile)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Role, UserFilter};

    fn user(email: &str, role: Role) -> (User, Profile) {
        let user = User::new(email, "hash".to_string(), role);
        let profile = Profile::for_user(user.id, "Test User");
        (user, profile)
    }

    #[tokio::test]
    async fn test_create_and_get_user() {
        let repo = InMemoryUserRepository::new();
        let (u, p) = user("test@example.com", Role::Client);

        let created = repo.create(u, p).await.unwrap();
        let fetched = repo.get_by_id(created.id).await.unwrap().unwrap();
        assert_eq!(fetched.email, "test@example.com");

        let profile = repo.get_profile(created.id).await.unwrap().unwrap();
        assert_eq!(profile.first_name, "Test");
    }

    #[tokio::test]
    async fn test_duplicate_email_error() {
        let repo = InMemoryUserRepository::new();
        let (u1, p1) = user("test@example.com", Role::Client);
        let (u2, p2) = user("TEST@example.com", Role::Freelancer);

        repo.create(u1, p1).await.unwrap();
        let result = repo.create(u2, p2).await;
        assert!(matches!(result, Err(UserError::DuplicateEmail(_))));
    }

    #[tokio::test]
    async fn test_delete_removes_profile() {
        let repo = InMemoryUserRepository::new();
        let (u, p) = user("gone@example.com", Role::Client);
        let id = repo.create(u, p).await.unwrap().id;

        assert!(repo.delete(id).await.unwrap());
        assert!(repo.get_profile(id).await.unwrap().is_none());
        assert!(!repo.delete(id).await.unwrap());
    }

    #[tokio::test]
    async fn test_list_applies_filters_and_paging() {
        let repo = InMemoryUserRepository::new();
        for i in 0..5 {
            let (u, p) = user(&format!("dev{}@acme.io", i), Role::Freelancer);
            repo.create(u, p).await.unwrap();
        }
        let (u, p) = user("boss@acme.io", Role::Client);
        repo.create(u, p).await.unwrap();

        let query = UserQuery::new().with(UserFilter::Role(Role::Freelancer));
        let (items, total) = repo.list(query, PageParams::new(2, 2)).await.unwrap();
        assert_eq!(total, 5);
        assert_eq!(items.len(), 2);
        assert!(items.iter().all(|u| u.role == Role::Freelancer));

        let query = UserQuery::new().with(UserFilter::EmailContains("BOSS".into()));
        let (items, total) = repo.list(query, PageParams::default()).await.unwrap();
        assert_eq!(total, 1);
        assert_eq!(items[0].email, "boss@acme.io");
    }
}
