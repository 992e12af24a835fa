//! Account administration. Every operation requires an ADMIN actor.

use axum_helpers::{PageParams, Paginated};
use domain_notifications::{NotificationType, Outbox, Outcome};
use std::sync::Arc;
use tracing::instrument;
use uuid::Uuid;

use crate::actor::Actor;
use crate::error::{UserError, UserResult};
use crate::models::{UpdateUserStatus, User, UserQuery, UserResponse};
use crate::repository::UserRepository;

pub struct AdminService<R: UserRepository> {
    repository: Arc<R>,
}

impl<R: UserRepository> Clone for AdminService<R> {
    fn clone(&self) -> Self {
        Self {
            repository: Arc::clone(&self.repository),
        }
    }
}

impl<R: UserRepository> AdminService<R> {
    pub fn new(repository: R) -> Self {
        Self::from_shared(Arc::new(repository))
    }

    pub fn from_shared(repository: Arc<R>) -> Self {
        Self { repository }
    }

    #[instrument(skip(self, query), fields(actor = %actor.id))]
    pub async fn list_users(
        &self,
        actor: &Actor,
        query: UserQuery,
        page: PageParams,
    ) -> UserResult<Paginated<UserResponse>> {
        require_admin(actor)?;
        let (users, total) = self.repository.list(query, page).await?;
        Ok(Paginated::new(users, page, total).map(UserResponse::from))
    }

    /// Suspend or reinstate an account, optionally changing its role.
    #[instrument(skip(self, change), fields(actor = %actor.id, target = %user_id))]
    pub async fn update_user_status(
        &self,
        actor: &Actor,
        user_id: Uuid,
        change: UpdateUserStatus,
    ) -> UserResult<Outcome<UserResponse>> {
        require_admin(actor)?;
        let mut user = self.find(user_id).await?;
        guard_self(actor, &user)?;

        user.is_suspended = change.is_suspended;
        if let Some(role) = change.role {
            user.role = role;
        }
        user.updated_at = chrono::Utc::now();
        let updated = self.repository.update(user).await?;

        tracing::info!(
            user_id = %updated.id,
            is_suspended = updated.is_suspended,
            role = %updated.role,
            "Account status changed"
        );

        let message = if updated.is_suspended {
            "Your account has been suspended by an administrator".to_string()
        } else {
            format!("Your account is active with role {}", updated.role)
        };
        let mut outbox = Outbox::new();
        outbox.notify(
            updated.id,
            NotificationType::AccountStatusChanged,
            message,
            "/profile",
            None,
        );

        Ok(Outcome::with_outbox(updated.into(), outbox))
    }

    #[instrument(skip(self), fields(actor = %actor.id, target = %user_id))]
    pub async fn delete_user(&self, actor: &Actor, user_id: Uuid) -> UserResult<()> {
        require_admin(actor)?;
        let user = self.find(user_id).await?;
        guard_self(actor, &user)?;

        if !self.repository.delete(user_id).await? {
            return Err(UserError::NotFound(user_id));
        }
        Ok(())
    }

    async fn find(&self, id: Uuid) -> UserResult<User> {
        self.repository
            .get_by_id(id)
            .await?
            .ok_or(UserError::NotFound(id))
    }
}

fn require_admin(actor: &Actor) -> UserResult<()> {
    if actor.is_admin() {
        Ok(())
    } else {
        Err(UserError::Forbidden("Admin access required".to_string()))
    }
}

// Refuses only when the target is an admin AND the requester themselves.
// Other admins can still be suspended, demoted or deleted.
fn guard_self(actor: &Actor, target: &User) -> UserResult<()> {
    if target.role == crate::models::Role::Admin && target.id == actor.id {
        return Err(UserError::Forbidden(
            "Administrators cannot modify their own account".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Profile, Role, UserFilter};
    use crate::repository::InMemoryUserRepository;

    async fn seed(repo: &InMemoryUserRepository, email: &str, role: Role) -> User {
        let user = User::new(email, "hash".into(), role);
        let profile = Profile::for_user(user.id, "Seed");
        repo.create(user, profile).await.unwrap()
    }

    #[tokio::test]
    async fn test_non_admin_is_forbidden() {
        let repo = InMemoryUserRepository::new();
        let client = seed(&repo, "c@example.com", Role::Client).await;
        let service = AdminService::new(repo);
        let actor = Actor::new(client.id, Role::Client);

        assert!(matches!(
            service.list_users(&actor, UserQuery::new(), PageParams::default()).await,
            Err(UserError::Forbidden(_))
        ));
        assert!(matches!(
            service.delete_user(&actor, client.id).await,
            Err(UserError::Forbidden(_))
        ));
    }

    #[tokio::test]
    async fn test_suspend_user_notifies_target() {
        let repo = InMemoryUserRepository::new();
        let admin = seed(&repo, "admin@example.com", Role::Admin).await;
        let freelancer = seed(&repo, "f@example.com", Role::Freelancer).await;
        let service = AdminService::new(repo);
        let actor = Actor::new(admin.id, Role::Admin);

        let outcome = service
            .update_user_status(
                &actor,
                freelancer.id,
                UpdateUserStatus {
                    is_suspended: true,
                    role: None,
                },
            )
            .await
            .unwrap();

        assert!(outcome.value.is_suspended);
        assert_eq!(outcome.value.role, Role::Freelancer);
        let notes: Vec<_> = outcome.outbox.notifications().collect();
        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0].user_id, freelancer.id);
        assert_eq!(notes[0].notification_type, NotificationType::AccountStatusChanged);
    }

    #[tokio::test]
    async fn test_admin_cannot_modify_self() {
        let repo = InMemoryUserRepository::new();
        let admin = seed(&repo, "admin@example.com", Role::Admin).await;
        let service = AdminService::new(repo);
        let actor = Actor::new(admin.id, Role::Admin);

        let err = service
            .update_user_status(
                &actor,
                admin.id,
                UpdateUserStatus {
                    is_suspended: true,
                    role: None,
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, UserError::Forbidden(_)));
        assert!(matches!(
            service.delete_user(&actor, admin.id).await,
            Err(UserError::Forbidden(_))
        ));
    }

    #[tokio::test]
    async fn test_admin_can_modify_other_admin() {
        let repo = InMemoryUserRepository::new();
        let admin = seed(&repo, "admin@example.com", Role::Admin).await;
        let other = seed(&repo, "other@example.com", Role::Admin).await;
        let service = AdminService::new(repo);
        let actor = Actor::new(admin.id, Role::Admin);

        let outcome = service
            .update_user_status(
                &actor,
                other.id,
                UpdateUserStatus {
                    is_suspended: false,
                    role: Some(Role::Client),
                },
            )
            .await
            .unwrap();
        assert_eq!(outcome.value.role, Role::Client);

        service.delete_user(&actor, other.id).await.unwrap();
        assert!(matches!(
            service.delete_user(&actor, other.id).await,
            Err(UserError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_list_users_with_filters() {
        let repo = InMemoryUserRepository::new();
        let admin = seed(&repo, "admin@example.com", Role::Admin).await;
        seed(&repo, "a@example.com", Role::Client).await;
        seed(&repo, "b@example.com", Role::Client).await;
        seed(&repo, "c@example.com", Role::Freelancer).await;
        let service = AdminService::new(repo);
        let actor = Actor::new(admin.id, Role::Admin);

        let page = service
            .list_users(
                &actor,
                UserQuery::new().with(UserFilter::Role(Role::Client)),
                PageParams::new(1, 1),
            )
            .await
            .unwrap();
        assert_eq!(page.total, 2);
        assert_eq!(page.total_pages, 2);
        assert_eq!(page.items.len(), 1);
    }
}
