//! Post mutations behind the authorization guard. Submitted fields are
//! validated into a [`PostDraft`] first; server-controlled fields (author,
//! defaulted timestamps) are injected in a separate finalize step so the
//! trust boundary is explicit.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::data::category_repository::CategoryRepository;
use crate::data::location_repository::LocationRepository;
use crate::data::post_repository::PostRepository;
use crate::domain::error::{DomainError, post_detail_path};
use crate::domain::post::{Post, PostView};
use crate::domain::visibility::{Viewer, can_mutate};

pub const TITLE_MAX_LEN: usize = 256;

/// Validated submitted fields of a post, before server-side finalization.
/// Never carries an author.
#[derive(Debug, Clone)]
pub struct PostDraft {
    pub title: String,
    pub text: String,
    pub pub_date: Option<DateTime<Utc>>,
    pub location_id: Option<Uuid>,
    pub category_id: Option<Uuid>,
    pub image: Option<String>,
}

impl PostDraft {
    pub fn new(
        title: String,
        text: String,
        pub_date: Option<DateTime<Utc>>,
        location_id: Option<Uuid>,
        category_id: Option<Uuid>,
        image: Option<String>,
    ) -> Result<Self, DomainError> {
        let mut fields = Vec::new();
        if title.trim().is_empty() {
            fields.push(crate::domain::error::FieldError::new("title", "must not be empty"));
        } else if title.chars().count() > TITLE_MAX_LEN {
            fields.push(crate::domain::error::FieldError::new(
                "title",
                format!("must be at most {TITLE_MAX_LEN} characters"),
            ));
        }
        if text.trim().is_empty() {
            fields.push(crate::domain::error::FieldError::new("text", "must not be empty"));
        }
        if !fields.is_empty() {
            return Err(DomainError::Validation(fields));
        }
        Ok(Self {
            title,
            text,
            pub_date,
            location_id,
            category_id,
            image,
        })
    }
}

#[derive(Clone)]
pub struct PostService {
    posts: Arc<dyn PostRepository>,
    categories: Arc<dyn CategoryRepository>,
    locations: Arc<dyn LocationRepository>,
}

impl PostService {
    pub fn new(
        posts: Arc<dyn PostRepository>,
        categories: Arc<dyn CategoryRepository>,
        locations: Arc<dyn LocationRepository>,
    ) -> Self {
        Self {
            posts,
            categories,
            locations,
        }
    }

    /// Referenced category/location must exist and be published, matching
    /// the restricted choices the original submission form offered.
    async fn check_references(&self, draft: &PostDraft) -> Result<(), DomainError> {
        if let Some(category_id) = draft.category_id {
            let published = self
                .categories
                .find_by_id(category_id)
                .await?
                .map(|c| c.is_published)
                .unwrap_or(false);
            if !published {
                return Err(DomainError::validation(
                    "category",
                    "unknown or unpublished category",
                ));
            }
        }
        if let Some(location_id) = draft.location_id {
            let published = self
                .locations
                .find_by_id(location_id)
                .await?
                .map(|l| l.is_published)
                .unwrap_or(false);
            if !published {
                return Err(DomainError::validation(
                    "location",
                    "unknown or unpublished location",
                ));
            }
        }
        Ok(())
    }

    /// Finalize and persist a new post. The author is always the acting
    /// viewer; an omitted `pub_date` defaults to now (creation time).
    #[instrument(skip(self, draft))]
    pub async fn create_post(
        &self,
        author_id: Uuid,
        draft: PostDraft,
        now: DateTime<Utc>,
    ) -> Result<Post, DomainError> {
        self.check_references(&draft).await?;
        let post = Post {
            id: Uuid::new_v4(),
            title: draft.title,
            text: draft.text,
            image: draft.image,
            pub_date: draft.pub_date.unwrap_or(now),
            is_published: true,
            author_id,
            location_id: draft.location_id,
            category_id: draft.category_id,
            created_at: now,
        };
        self.posts.create(post).await
    }

    /// Edit an existing post. Non-owners are bounced to the detail view.
    /// The author never changes; an omitted `pub_date` keeps the stored
    /// original (unlike creation), as does an omitted image.
    #[instrument(skip(self, draft))]
    pub async fn edit_post(
        &self,
        viewer: &Viewer,
        post_id: Uuid,
        draft: PostDraft,
    ) -> Result<Post, DomainError> {
        let original = self
            .posts
            .find_by_id(post_id)
            .await?
            .ok_or(DomainError::NotFound)?
            .post;
        if !can_mutate(viewer, original.author_id) {
            return Err(DomainError::OwnershipDenied {
                redirect: post_detail_path(post_id),
            });
        }
        self.check_references(&draft).await?;

        let updated = Post {
            id: original.id,
            title: draft.title,
            text: draft.text,
            image: draft.image.or(original.image),
            pub_date: draft.pub_date.unwrap_or(original.pub_date),
            is_published: original.is_published,
            author_id: original.author_id,
            location_id: draft.location_id,
            category_id: draft.category_id,
            created_at: original.created_at,
        };
        self.posts.update(updated).await
    }

    /// Phase one of deletion: show the owner what would be deleted. Has no
    /// side effect and can be abandoned indefinitely.
    pub async fn confirm_delete_post(
        &self,
        viewer: &Viewer,
        post_id: Uuid,
    ) -> Result<PostView, DomainError> {
        let view = self
            .posts
            .find_by_id(post_id)
            .await?
            .ok_or(DomainError::NotFound)?;
        if !can_mutate(viewer, view.post.author_id) {
            return Err(DomainError::OwnershipDenied {
                redirect: post_detail_path(post_id),
            });
        }
        Ok(view)
    }

    /// Phase two: the actual deletion, re-checking ownership.
    #[instrument(skip(self))]
    pub async fn delete_post(&self, viewer: &Viewer, post_id: Uuid) -> Result<(), DomainError> {
        let view = self.confirm_delete_post(viewer, post_id).await?;
        self.posts.delete(view.post.id).await?;
        info!(post_id = %post_id, "post deleted by its author");
        Ok(())
    }
}
