use actix_web::http::header;
use actix_web::{HttpRequest, HttpResponse, get, post, put, web};
use chrono::Utc;
use tracing::info;
use uuid::Uuid;

use crate::application::post_service::{PostDraft, PostService};
use crate::domain::error::{DomainError, post_detail_path, profile_path};
use crate::presentation::dto::{DeleteConfirmation, PostPayload, PostResponse};
use crate::presentation::handlers::request_id;
use crate::presentation::utils::AuthenticatedUser;

#[post("/posts")]
async fn create_post(
    req: HttpRequest,
    user: AuthenticatedUser,
    posts: web::Data<PostService>,
    payload: web::Json<PostPayload>,
) -> Result<HttpResponse, DomainError> {
    let draft = PostDraft::try_from(payload.into_inner())?;
    let post = posts.create_post(user.id, draft, Utc::now()).await?;

    info!(
        request_id = %request_id(&req),
        username = %user.username,
        post_id = %post.id,
        "post created"
    );

    Ok(HttpResponse::SeeOther()
        .insert_header((header::LOCATION, profile_path(&user.username)))
        .finish())
}

#[put("/posts/{id}")]
async fn edit_post(
    req: HttpRequest,
    user: AuthenticatedUser,
    posts: web::Data<PostService>,
    payload: web::Json<PostPayload>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, DomainError> {
    let post_id = path.into_inner();
    let draft = PostDraft::try_from(payload.into_inner())?;
    let post = posts.edit_post(&user.viewer(), post_id, draft).await?;

    info!(
        request_id = %request_id(&req),
        username = %user.username,
        post_id = %post.id,
        "post updated"
    );

    Ok(HttpResponse::SeeOther()
        .insert_header((header::LOCATION, post_detail_path(post_id)))
        .finish())
}

/// Phase one of the two-phase delete: render what would be removed.
#[get("/posts/{id}/delete")]
async fn confirm_delete_post(
    user: AuthenticatedUser,
    posts: web::Data<PostService>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, DomainError> {
    let post_id = path.into_inner();
    let view = posts.confirm_delete_post(&user.viewer(), post_id).await?;

    Ok(HttpResponse::Ok().json(DeleteConfirmation {
        target: PostResponse::from(view),
        confirm_action: format!("{}/delete", post_detail_path(post_id)),
    }))
}

#[post("/posts/{id}/delete")]
async fn delete_post(
    req: HttpRequest,
    user: AuthenticatedUser,
    posts: web::Data<PostService>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, DomainError> {
    let post_id = path.into_inner();
    posts.delete_post(&user.viewer(), post_id).await?;

    info!(
        request_id = %request_id(&req),
        username = %user.username,
        post_id = %post_id,
        "post deleted"
    );

    Ok(HttpResponse::SeeOther()
        .insert_header((header::LOCATION, profile_path(&user.username)))
        .finish())
}
