use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::application::pagination::Page;
use crate::application::post_service::PostDraft;
use crate::application::profile_service::ProfileDraft;
use crate::domain::comment::CommentView;
use crate::domain::error::DomainError;
use crate::domain::post::PostView;
use crate::domain::user::User;

// ======================= AUTH =======================

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub access_token: String,
    pub expires_in: i64,
    #[serde(rename = "token_type")]
    pub token_type: String, // "Bearer"
}

// ======================= POSTS =======================

/// Submitted post fields, shared between create and edit. Note the absence
/// of an author field; it is never accepted from the client.
#[derive(Debug, Deserialize)]
pub struct PostPayload {
    pub title: String,
    pub text: String,
    #[serde(default)]
    pub pub_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub location: Option<Uuid>,
    #[serde(default)]
    pub category: Option<Uuid>,
    #[serde(default)]
    pub image: Option<String>,
}

impl TryFrom<PostPayload> for PostDraft {
    type Error = DomainError;

    fn try_from(payload: PostPayload) -> Result<Self, Self::Error> {
        PostDraft::new(
            payload.title,
            payload.text,
            payload.pub_date,
            payload.location,
            payload.category,
            payload.image,
        )
    }
}

#[derive(Debug, Deserialize)]
pub struct CommentPayload {
    pub text: String,
}

#[derive(Debug, Deserialize)]
pub struct ProfilePayload {
    pub username: String,
    pub email: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
}

impl TryFrom<ProfilePayload> for ProfileDraft {
    type Error = DomainError;

    fn try_from(payload: ProfilePayload) -> Result<Self, Self::Error> {
        ProfileDraft::new(
            payload.username,
            payload.email,
            payload.first_name,
            payload.last_name,
        )
    }
}

#[derive(Debug, Deserialize)]
pub struct PageQuery {
    #[serde(default)]
    pub page: Option<usize>,
}

// ======================= RESPONSES =======================

#[derive(Debug, Serialize)]
pub struct CategoryResponse {
    pub title: String,
    pub description: String,
    pub slug: String,
}

#[derive(Debug, Serialize)]
pub struct PostResponse {
    pub id: Uuid,
    pub title: String,
    pub text: String,
    pub image: Option<String>,
    pub pub_date: DateTime<Utc>,
    pub is_published: bool,
    pub author: String,
    pub category: Option<CategoryResponse>,
    pub location: Option<String>,
    pub comment_count: i64,
    pub created_at: DateTime<Utc>,
}

impl From<PostView> for PostResponse {
    fn from(view: PostView) -> Self {
        Self {
            id: view.post.id,
            title: view.post.title,
            text: view.post.text,
            image: view.post.image,
            pub_date: view.post.pub_date,
            is_published: view.post.is_published,
            author: view.author_username,
            category: view.category.map(|c| CategoryResponse {
                title: c.title,
                description: c.description,
                slug: c.slug,
            }),
            location: view.location.map(|l| l.name),
            comment_count: view.comment_count,
            created_at: view.post.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct CommentResponse {
    pub id: Uuid,
    pub text: String,
    pub author: String,
    pub created_at: DateTime<Utc>,
}

impl From<CommentView> for CommentResponse {
    fn from(view: CommentView) -> Self {
        Self {
            id: view.comment.id,
            text: view.comment.text,
            author: view.author_username,
            created_at: view.comment.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct FeedResponse {
    pub posts: Vec<PostResponse>,
    pub page_number: usize,
    pub total_pages: usize,
    pub has_next: bool,
    pub has_prev: bool,
}

impl From<Page<PostView>> for FeedResponse {
    fn from(page: Page<PostView>) -> Self {
        Self {
            posts: page.items.into_iter().map(PostResponse::from).collect(),
            page_number: page.page_number,
            total_pages: page.total_pages,
            has_next: page.has_next,
            has_prev: page.has_prev,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ProfileResponse {
    pub id: Uuid,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
}

impl From<User> for ProfileResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            first_name: user.first_name,
            last_name: user.last_name,
        }
    }
}

/// Detail view: the post, its comments in ascending order, and where a new
/// comment should be submitted.
#[derive(Debug, Serialize)]
pub struct PostDetailResponse {
    pub post: PostResponse,
    pub comments: Vec<CommentResponse>,
    pub comment_form_action: String,
}

/// Phase one of a two-phase delete: what would be deleted and where to
/// confirm. Rendering a confirmation is side-effect free.
#[derive(Debug, Serialize)]
pub struct DeleteConfirmation<T: Serialize> {
    pub target: T,
    pub confirm_action: String,
}
