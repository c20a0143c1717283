//! Comment mutations. Same guard as posts: authorship is always forced to
//! the acting viewer, non-owners are soft-redirected to the post detail.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::data::comment_repository::CommentRepository;
use crate::data::post_repository::PostRepository;
use crate::domain::comment::Comment;
use crate::domain::error::{DomainError, post_detail_path};
use crate::domain::visibility::{Viewer, can_mutate, can_read};

/// Validated comment body.
#[derive(Debug, Clone)]
pub struct CommentDraft {
    pub text: String,
}

impl CommentDraft {
    pub fn new(text: String) -> Result<Self, DomainError> {
        if text.trim().is_empty() {
            return Err(DomainError::validation("text", "must not be empty"));
        }
        Ok(Self { text })
    }
}

#[derive(Clone)]
pub struct CommentService {
    comments: Arc<dyn CommentRepository>,
    posts: Arc<dyn PostRepository>,
}

impl CommentService {
    pub fn new(comments: Arc<dyn CommentRepository>, posts: Arc<dyn PostRepository>) -> Self {
        Self { comments, posts }
    }

    /// A comment only attaches to a post the viewer can actually read; a
    /// hidden post stays hidden even to would-be commenters.
    #[instrument(skip(self, draft))]
    pub async fn add_comment(
        &self,
        viewer_id: Uuid,
        post_id: Uuid,
        draft: CommentDraft,
        now: DateTime<Utc>,
    ) -> Result<Comment, DomainError> {
        let viewer = Viewer::User(viewer_id);
        let post = self
            .posts
            .find_by_id(post_id)
            .await?
            .ok_or(DomainError::NotFound)?;
        if !can_read(&viewer, &post, now) {
            return Err(DomainError::NotFound);
        }
        let comment = Comment {
            id: Uuid::new_v4(),
            text: draft.text,
            post_id,
            author_id: viewer_id,
            created_at: now,
        };
        self.comments.create(comment).await
    }

    /// Fetch a comment for editing or delete confirmation, applying the
    /// ownership rule. The comment must belong to the post in the path.
    async fn owned_comment(
        &self,
        viewer: &Viewer,
        post_id: Uuid,
        comment_id: Uuid,
    ) -> Result<Comment, DomainError> {
        let comment = self
            .comments
            .find_by_id(comment_id)
            .await?
            .filter(|c| c.post_id == post_id)
            .ok_or(DomainError::NotFound)?;
        if !can_mutate(viewer, comment.author_id) {
            return Err(DomainError::OwnershipDenied {
                redirect: post_detail_path(post_id),
            });
        }
        Ok(comment)
    }

    /// Edit never reassigns authorship: the stored author is the acting
    /// viewer both before and after.
    #[instrument(skip(self, draft))]
    pub async fn edit_comment(
        &self,
        viewer: &Viewer,
        post_id: Uuid,
        comment_id: Uuid,
        draft: CommentDraft,
    ) -> Result<Comment, DomainError> {
        let mut comment = self.owned_comment(viewer, post_id, comment_id).await?;
        comment.text = draft.text;
        if let Some(id) = viewer.id() {
            comment.author_id = id;
        }
        self.comments.update(comment).await
    }

    /// Phase one of deletion; side-effect free.
    pub async fn confirm_delete_comment(
        &self,
        viewer: &Viewer,
        post_id: Uuid,
        comment_id: Uuid,
    ) -> Result<Comment, DomainError> {
        self.owned_comment(viewer, post_id, comment_id).await
    }

    #[instrument(skip(self))]
    pub async fn delete_comment(
        &self,
        viewer: &Viewer,
        post_id: Uuid,
        comment_id: Uuid,
    ) -> Result<(), DomainError> {
        let comment = self.owned_comment(viewer, post_id, comment_id).await?;
        self.comments.delete(comment.id).await?;
        info!(comment_id = %comment_id, post_id = %post_id, "comment deleted by its author");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::memory::MemoryStore;
    use crate::data::user_repository::UserRepository;
    use crate::domain::post::Post;
    use crate::domain::user::User;
    use chrono::Duration;

    fn service(store: &Arc<MemoryStore>) -> CommentService {
        CommentService::new(store.clone(), store.clone())
    }

    async fn seed_user(store: &MemoryStore, name: &str) -> User {
        UserRepository::create(
            store,
            User::new(name.into(), format!("{name}@example.com"), "hash".into()),
        )
        .await
        .unwrap()
    }

    async fn seed_post(store: &MemoryStore, author: &User, pub_date: DateTime<Utc>) -> Post {
        PostRepository::create(
            store,
            Post {
                id: Uuid::new_v4(),
                title: "post".into(),
                text: "text".into(),
                image: None,
                pub_date,
                is_published: true,
                author_id: author.id,
                location_id: None,
                category_id: None,
                created_at: Utc::now(),
            },
        )
        .await
        .unwrap()
    }

    fn body(text: &str) -> CommentDraft {
        CommentDraft::new(text.into()).unwrap()
    }

    #[tokio::test]
    async fn anyone_can_comment_on_a_visible_post() {
        let store = Arc::new(MemoryStore::new());
        let comments = service(&store);
        let now = Utc::now();
        let alice = seed_user(&store, "alice").await;
        let bob = seed_user(&store, "bob").await;
        let post = seed_post(&store, &alice, now - Duration::days(1)).await;

        let comment = comments
            .add_comment(bob.id, post.id, body("nice"), now)
            .await
            .unwrap();
        assert_eq!(comment.author_id, bob.id);
        assert_eq!(comment.post_id, post.id);
    }

    #[tokio::test]
    async fn commenting_on_a_hidden_post_is_not_found() {
        let store = Arc::new(MemoryStore::new());
        let comments = service(&store);
        let now = Utc::now();
        let alice = seed_user(&store, "alice").await;
        let bob = seed_user(&store, "bob").await;
        let scheduled = seed_post(&store, &alice, now + Duration::days(1)).await;

        let err = comments
            .add_comment(bob.id, scheduled.id, body("early"), now)
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::NotFound));

        // The author can comment on their own scheduled post.
        comments
            .add_comment(alice.id, scheduled.id, body("note to self"), now)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn non_owner_edit_soft_redirects_and_leaves_the_comment_alone() {
        let store = Arc::new(MemoryStore::new());
        let comments = service(&store);
        let now = Utc::now();
        let alice = seed_user(&store, "alice").await;
        let bob = seed_user(&store, "bob").await;
        let post = seed_post(&store, &alice, now - Duration::days(1)).await;
        let comment = comments
            .add_comment(bob.id, post.id, body("original"), now)
            .await
            .unwrap();

        let err = comments
            .edit_comment(&Viewer::User(alice.id), post.id, comment.id, body("edited"))
            .await
            .unwrap_err();
        match err {
            DomainError::OwnershipDenied { redirect } => {
                assert_eq!(redirect, post_detail_path(post.id));
            }
            other => panic!("expected OwnershipDenied, got {other:?}"),
        }

        let unchanged = CommentRepository::find_by_id(&*store, comment.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(unchanged.text, "original");
        assert_eq!(unchanged.author_id, bob.id);
    }

    #[tokio::test]
    async fn owner_edit_updates_text_and_keeps_authorship() {
        let store = Arc::new(MemoryStore::new());
        let comments = service(&store);
        let now = Utc::now();
        let alice = seed_user(&store, "alice").await;
        let post = seed_post(&store, &alice, now - Duration::days(1)).await;
        let comment = comments
            .add_comment(alice.id, post.id, body("v1"), now)
            .await
            .unwrap();

        let updated = comments
            .edit_comment(&Viewer::User(alice.id), post.id, comment.id, body("v2"))
            .await
            .unwrap();
        assert_eq!(updated.text, "v2");
        assert_eq!(updated.author_id, alice.id);
    }

    #[tokio::test]
    async fn comment_under_the_wrong_post_is_not_found() {
        let store = Arc::new(MemoryStore::new());
        let comments = service(&store);
        let now = Utc::now();
        let alice = seed_user(&store, "alice").await;
        let post_a = seed_post(&store, &alice, now - Duration::days(1)).await;
        let post_b = seed_post(&store, &alice, now - Duration::days(1)).await;
        let comment = comments
            .add_comment(alice.id, post_a.id, body("on a"), now)
            .await
            .unwrap();

        let err = comments
            .delete_comment(&Viewer::User(alice.id), post_b.id, comment.id)
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::NotFound));
    }

    #[tokio::test]
    async fn two_phase_delete_confirms_then_deletes() {
        let store = Arc::new(MemoryStore::new());
        let comments = service(&store);
        let now = Utc::now();
        let alice = seed_user(&store, "alice").await;
        let post = seed_post(&store, &alice, now - Duration::days(1)).await;
        let comment = comments
            .add_comment(alice.id, post.id, body("doomed"), now)
            .await
            .unwrap();

        let viewer = Viewer::User(alice.id);
        let confirmed = comments
            .confirm_delete_comment(&viewer, post.id, comment.id)
            .await
            .unwrap();
        assert_eq!(confirmed.id, comment.id);
        assert!(CommentRepository::find_by_id(&*store, comment.id)
            .await
            .unwrap()
            .is_some());

        comments
            .delete_comment(&viewer, post.id, comment.id)
            .await
            .unwrap();
        assert!(CommentRepository::find_by_id(&*store, comment.id)
            .await
            .unwrap()
            .is_none());
    }
}
