//! Self-service profile editing. A viewer only ever updates their own
//! record; there is no path that takes a target user id from input.

use std::sync::Arc;

use tracing::instrument;
use uuid::Uuid;

use crate::data::user_repository::UserRepository;
use crate::domain::error::{DomainError, FieldError};
use crate::domain::user::User;

#[derive(Debug, Clone)]
pub struct ProfileDraft {
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
}

impl ProfileDraft {
    pub fn new(
        username: String,
        email: String,
        first_name: String,
        last_name: String,
    ) -> Result<Self, DomainError> {
        let mut fields = Vec::new();
        if username.trim().is_empty() {
            fields.push(FieldError::new("username", "must not be empty"));
        }
        if !email.contains('@') {
            fields.push(FieldError::new("email", "must be a valid email address"));
        }
        if !fields.is_empty() {
            return Err(DomainError::Validation(fields));
        }
        Ok(Self {
            username,
            email,
            first_name,
            last_name,
        })
    }
}

#[derive(Clone)]
pub struct ProfileService {
    users: Arc<dyn UserRepository>,
}

impl ProfileService {
    pub fn new(users: Arc<dyn UserRepository>) -> Self {
        Self { users }
    }

    #[instrument(skip(self, draft))]
    pub async fn edit_own_profile(
        &self,
        viewer_id: Uuid,
        draft: ProfileDraft,
    ) -> Result<User, DomainError> {
        let mut user = self
            .users
            .find_by_id(viewer_id)
            .await?
            .ok_or(DomainError::NotFound)?;

        if let Some(taken) = self.users.find_by_username(&draft.username).await? {
            if taken.id != viewer_id {
                return Err(DomainError::validation("username", "already taken"));
            }
        }

        user.username = draft.username;
        user.email = draft.email.to_lowercase();
        user.first_name = draft.first_name;
        user.last_name = draft.last_name;
        self.users.update(user).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::memory::MemoryStore;

    fn service(store: &Arc<MemoryStore>) -> ProfileService {
        ProfileService::new(store.clone())
    }

    async fn seed_user(store: &MemoryStore, name: &str) -> User {
        UserRepository::create(
            store,
            User::new(name.into(), format!("{name}@example.com"), "hash".into()),
        )
        .await
        .unwrap()
    }

    fn draft(username: &str) -> ProfileDraft {
        ProfileDraft::new(
            username.into(),
            format!("{username}@example.com"),
            "First".into(),
            "Last".into(),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn updates_only_the_viewers_own_record() {
        let store = Arc::new(MemoryStore::new());
        let profiles = service(&store);
        let alice = seed_user(&store, "alice").await;
        let bob = seed_user(&store, "bob").await;

        let updated = profiles
            .edit_own_profile(alice.id, draft("alice2"))
            .await
            .unwrap();
        assert_eq!(updated.id, alice.id);
        assert_eq!(updated.username, "alice2");
        assert_eq!(updated.first_name, "First");

        let untouched = UserRepository::find_by_id(&*store, bob.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(untouched.username, "bob");
    }

    #[tokio::test]
    async fn taken_username_is_a_validation_error() {
        let store = Arc::new(MemoryStore::new());
        let profiles = service(&store);
        let alice = seed_user(&store, "alice").await;
        seed_user(&store, "bob").await;

        let err = profiles
            .edit_own_profile(alice.id, draft("bob"))
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[tokio::test]
    async fn keeping_your_own_username_is_fine() {
        let store = Arc::new(MemoryStore::new());
        let profiles = service(&store);
        let alice = seed_user(&store, "alice").await;

        let updated = profiles
            .edit_own_profile(alice.id, draft("alice"))
            .await
            .unwrap();
        assert_eq!(updated.username, "alice");
    }

    #[tokio::test]
    async fn malformed_email_is_rejected_at_draft_time() {
        let err = ProfileDraft::new("alice".into(), "not-an-email".into(), "".into(), "".into())
            .unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }
}
