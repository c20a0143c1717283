use actix_web::http::header;
use actix_web::{HttpRequest, HttpResponse, get, post, put, web};
use chrono::Utc;
use tracing::info;
use uuid::Uuid;

use crate::application::comment_service::{CommentDraft, CommentService};
use crate::domain::error::{DomainError, post_detail_path};
use crate::presentation::dto::{CommentPayload, DeleteConfirmation};
use crate::presentation::handlers::request_id;
use crate::presentation::utils::AuthenticatedUser;
use serde_json::json;

fn back_to_detail(post_id: Uuid) -> HttpResponse {
    HttpResponse::SeeOther()
        .insert_header((header::LOCATION, post_detail_path(post_id)))
        .finish()
}

#[post("/posts/{id}/comments")]
async fn add_comment(
    req: HttpRequest,
    user: AuthenticatedUser,
    comments: web::Data<CommentService>,
    payload: web::Json<CommentPayload>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, DomainError> {
    let post_id = path.into_inner();
    let draft = CommentDraft::new(payload.into_inner().text)?;
    let comment = comments
        .add_comment(user.id, post_id, draft, Utc::now())
        .await?;

    info!(
        request_id = %request_id(&req),
        username = %user.username,
        comment_id = %comment.id,
        "comment added"
    );

    Ok(back_to_detail(post_id))
}

#[put("/posts/{id}/comments/{comment_id}")]
async fn edit_comment(
    req: HttpRequest,
    user: AuthenticatedUser,
    comments: web::Data<CommentService>,
    payload: web::Json<CommentPayload>,
    path: web::Path<(Uuid, Uuid)>,
) -> Result<HttpResponse, DomainError> {
    let (post_id, comment_id) = path.into_inner();
    let draft = CommentDraft::new(payload.into_inner().text)?;
    comments
        .edit_comment(&user.viewer(), post_id, comment_id, draft)
        .await?;

    info!(
        request_id = %request_id(&req),
        username = %user.username,
        comment_id = %comment_id,
        "comment updated"
    );

    Ok(back_to_detail(post_id))
}

#[get("/posts/{id}/comments/{comment_id}/delete")]
async fn confirm_delete_comment(
    user: AuthenticatedUser,
    comments: web::Data<CommentService>,
    path: web::Path<(Uuid, Uuid)>,
) -> Result<HttpResponse, DomainError> {
    let (post_id, comment_id) = path.into_inner();
    let comment = comments
        .confirm_delete_comment(&user.viewer(), post_id, comment_id)
        .await?;

    Ok(HttpResponse::Ok().json(DeleteConfirmation {
        target: json!({ "id": comment.id, "text": comment.text }),
        confirm_action: format!("{}/comments/{}/delete", post_detail_path(post_id), comment_id),
    }))
}

#[post("/posts/{id}/comments/{comment_id}/delete")]
async fn delete_comment(
    req: HttpRequest,
    user: AuthenticatedUser,
    comments: web::Data<CommentService>,
    path: web::Path<(Uuid, Uuid)>,
) -> Result<HttpResponse, DomainError> {
    let (post_id, comment_id) = path.into_inner();
    comments
        .delete_comment(&user.viewer(), post_id, comment_id)
        .await?;

    info!(
        request_id = %request_id(&req),
        username = %user.username,
        comment_id = %comment_id,
        "comment deleted"
    );

    Ok(back_to_detail(post_id))
}
