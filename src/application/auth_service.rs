use std::sync::Arc;

use tracing::instrument;
use uuid::Uuid;

use crate::data::user_repository::UserRepository;
use crate::domain::error::DomainError;
use crate::domain::user::User;
use crate::infrastructure::security::{JwtKeys, hash_password, verify_password};

/// Identity provider for the platform: registration and login. Everything
/// downstream only ever sees the viewer id carried in the token.
#[derive(Clone)]
pub struct AuthService {
    users: Arc<dyn UserRepository>,
    keys: JwtKeys,
}

impl AuthService {
    pub fn new(users: Arc<dyn UserRepository>, keys: JwtKeys) -> Self {
        Self { users, keys }
    }

    pub fn keys(&self) -> &JwtKeys {
        &self.keys
    }

    pub async fn get_user(&self, id: Uuid) -> Result<User, DomainError> {
        self.users
            .find_by_id(id)
            .await?
            .ok_or(DomainError::NotFound)
    }

    #[instrument(skip(self, password))]
    pub async fn register(
        &self,
        username: String,
        email: String,
        password: String,
    ) -> Result<User, DomainError> {
        if username.trim().is_empty() {
            return Err(DomainError::validation("username", "must not be empty"));
        }
        let hash =
            hash_password(&password).map_err(|err| DomainError::Internal(err.to_string()))?;
        let user = User::new(username, email.to_lowercase(), hash);
        self.users.create(user).await
    }

    #[instrument(skip(self, password))]
    pub async fn login(&self, email: &str, password: &str) -> Result<String, DomainError> {
        let user = self
            .users
            .find_by_email(&email.to_lowercase())
            .await?
            .ok_or(DomainError::Unauthenticated)?;

        let valid = verify_password(password, &user.password_hash)
            .map_err(|_| DomainError::Unauthenticated)?;
        if !valid {
            return Err(DomainError::Unauthenticated);
        }

        self.keys
            .generate_token(user.id)
            .map_err(|err| DomainError::Internal(err.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::memory::MemoryStore;

    fn service(store: &Arc<MemoryStore>) -> AuthService {
        AuthService::new(store.clone(), JwtKeys::new("test-secret".into()))
    }

    #[tokio::test]
    async fn register_then_login_round_trips_through_the_token() {
        let store = Arc::new(MemoryStore::new());
        let auth = service(&store);

        let user = auth
            .register("alice".into(), "Alice@Example.com".into(), "s3cret".into())
            .await
            .unwrap();
        assert_eq!(user.email, "alice@example.com");

        let token = auth.login("alice@example.com", "s3cret").await.unwrap();
        let claims = auth.keys().verify_token(&token).unwrap();
        assert_eq!(claims.sub, user.id.to_string());
    }

    #[tokio::test]
    async fn wrong_password_is_unauthenticated() {
        let store = Arc::new(MemoryStore::new());
        let auth = service(&store);
        auth.register("alice".into(), "alice@example.com".into(), "s3cret".into())
            .await
            .unwrap();

        let err = auth.login("alice@example.com", "wrong").await.unwrap_err();
        assert!(matches!(err, DomainError::Unauthenticated));
    }

    #[tokio::test]
    async fn duplicate_username_is_a_conflict() {
        let store = Arc::new(MemoryStore::new());
        let auth = service(&store);
        auth.register("alice".into(), "alice@example.com".into(), "pw".into())
            .await
            .unwrap();
        let err = auth
            .register("alice".into(), "other@example.com".into(), "pw".into())
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Conflict(_)));
    }
}
