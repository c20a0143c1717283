use actix_web::dev::Payload;
use actix_web::{Error, FromRequest, HttpMessage, HttpRequest, web};
use futures_util::future::{Ready, ready};
use uuid::Uuid;

use crate::application::auth_service::AuthService;
use crate::domain::error::DomainError;
use crate::domain::visibility::Viewer;
use crate::infrastructure::security::JwtKeys;

/// Identity placed into request extensions by the JWT middleware. Only
/// available inside authenticated scopes.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub id: Uuid,
    pub username: String,
}

impl AuthenticatedUser {
    pub fn viewer(&self) -> Viewer {
        Viewer::User(self.id)
    }
}

impl FromRequest for AuthenticatedUser {
    type Error = Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        match req.extensions().get::<AuthenticatedUser>() {
            Some(user) => ready(Ok(user.clone())),
            None => ready(Err(DomainError::Unauthenticated.into())),
        }
    }
}

/// Viewer identity on read paths, where anonymous access is legitimate. A
/// bearer token is honored when present and valid; anything else is an
/// anonymous viewer, never an error.
#[derive(Debug, Clone, Copy)]
pub struct MaybeViewer(pub Viewer);

impl FromRequest for MaybeViewer {
    type Error = Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        if let Some(user) = req.extensions().get::<AuthenticatedUser>() {
            return ready(Ok(MaybeViewer(Viewer::User(user.id))));
        }
        let viewer = req
            .app_data::<web::Data<JwtKeys>>()
            .and_then(|keys| {
                let header = req
                    .headers()
                    .get(actix_web::http::header::AUTHORIZATION)?
                    .to_str()
                    .ok()?;
                let token = header.strip_prefix("Bearer ")?;
                let claims = keys.verify_token(token).ok()?;
                let user_id = Uuid::parse_str(&claims.sub).ok()?;
                Some(Viewer::User(user_id))
            })
            .unwrap_or(Viewer::Anonymous);
        ready(Ok(MaybeViewer(viewer)))
    }
}

pub async fn extract_user_from_token(
    token: &str,
    keys: &JwtKeys,
    auth_service: &AuthService,
) -> Result<AuthenticatedUser, Error> {
    let claims = keys
        .verify_token(token)
        .map_err(|_| Error::from(DomainError::Unauthenticated))?;
    let user_id =
        Uuid::parse_str(&claims.sub).map_err(|_| Error::from(DomainError::Unauthenticated))?;

    let user = auth_service
        .get_user(user_id)
        .await
        .map_err(|_| Error::from(DomainError::Unauthenticated))?;

    Ok(AuthenticatedUser {
        id: user.id,
        username: user.username,
    })
}
