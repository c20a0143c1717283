use actix_web::http::header;
use actix_web::{HttpRequest, HttpResponse, put, web};
use tracing::info;

use crate::application::profile_service::{ProfileDraft, ProfileService};
use crate::domain::error::{DomainError, profile_path};
use crate::presentation::dto::ProfilePayload;
use crate::presentation::handlers::request_id;
use crate::presentation::utils::AuthenticatedUser;

#[put("/profile")]
async fn edit_profile(
    req: HttpRequest,
    user: AuthenticatedUser,
    profiles: web::Data<ProfileService>,
    payload: web::Json<ProfilePayload>,
) -> Result<HttpResponse, DomainError> {
    let draft = ProfileDraft::try_from(payload.into_inner())?;
    let updated = profiles.edit_own_profile(user.id, draft).await?;

    info!(
        request_id = %request_id(&req),
        user_id = %updated.id,
        username = %updated.username,
        "profile updated"
    );

    Ok(HttpResponse::SeeOther()
        .insert_header((header::LOCATION, profile_path(&updated.username)))
        .finish())
}
