use actix_web::{HttpRequest, HttpResponse, get, web};
use chrono::Utc;
use tracing::info;
use uuid::Uuid;

use crate::application::feed_service::{FeedScope, FeedService};
use crate::application::pagination::{DEFAULT_PAGE_SIZE, paginate};
use crate::domain::error::{DomainError, post_detail_path};
use crate::presentation::dto::{
    CategoryResponse, CommentResponse, FeedResponse, PageQuery, PostDetailResponse, PostResponse,
    ProfileResponse,
};
use crate::presentation::handlers::request_id;
use crate::presentation::utils::MaybeViewer;
use serde_json::json;

#[get("/posts")]
async fn global_feed(
    req: HttpRequest,
    feeds: web::Data<FeedService>,
    viewer: MaybeViewer,
    query: web::Query<PageQuery>,
) -> Result<HttpResponse, DomainError> {
    let now = Utc::now();
    let posts = feeds.list_posts(&FeedScope::Global, &viewer.0, now).await?;
    let page = paginate(posts, DEFAULT_PAGE_SIZE, query.page.unwrap_or(1));

    info!(request_id = %request_id(&req), "global feed listed");
    Ok(HttpResponse::Ok().json(FeedResponse::from(page)))
}

#[get("/category/{slug}")]
async fn category_feed(
    req: HttpRequest,
    feeds: web::Data<FeedService>,
    viewer: MaybeViewer,
    path: web::Path<String>,
    query: web::Query<PageQuery>,
) -> Result<HttpResponse, DomainError> {
    let slug = path.into_inner();
    let now = Utc::now();
    let category = feeds.published_category(&slug).await?;
    let posts = feeds
        .list_posts(&FeedScope::Category(slug), &viewer.0, now)
        .await?;
    let page = paginate(posts, DEFAULT_PAGE_SIZE, query.page.unwrap_or(1));

    info!(request_id = %request_id(&req), slug = %category.slug, "category feed listed");
    Ok(HttpResponse::Ok().json(json!({
        "category": CategoryResponse {
            title: category.title,
            description: category.description,
            slug: category.slug,
        },
        "feed": FeedResponse::from(page),
    })))
}

#[get("/profile/{username}")]
async fn profile_feed(
    req: HttpRequest,
    feeds: web::Data<FeedService>,
    viewer: MaybeViewer,
    path: web::Path<String>,
    query: web::Query<PageQuery>,
) -> Result<HttpResponse, DomainError> {
    let username = path.into_inner();
    let now = Utc::now();
    let profile = feeds.profile_user(&username).await?;
    let posts = feeds
        .list_posts(&FeedScope::Profile(username), &viewer.0, now)
        .await?;
    let page = paginate(posts, DEFAULT_PAGE_SIZE, query.page.unwrap_or(1));

    info!(request_id = %request_id(&req), username = %profile.username, "profile feed listed");
    Ok(HttpResponse::Ok().json(json!({
        "profile": ProfileResponse::from(profile),
        "feed": FeedResponse::from(page),
    })))
}

#[get("/posts/{id}")]
async fn post_detail(
    req: HttpRequest,
    feeds: web::Data<FeedService>,
    viewer: MaybeViewer,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, DomainError> {
    let post_id = path.into_inner();
    let now = Utc::now();
    let view = feeds.get_post(&viewer.0, post_id, now).await?;
    let comments = feeds.comments_for(post_id).await?;

    info!(request_id = %request_id(&req), post_id = %post_id, "post detail viewed");
    Ok(HttpResponse::Ok().json(PostDetailResponse {
        post: PostResponse::from(view),
        comments: comments.into_iter().map(CommentResponse::from).collect(),
        comment_form_action: format!("{}/comments", post_detail_path(post_id)),
    }))
}
