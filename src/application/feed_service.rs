//! The query builder: turns a (viewer, scope) pair into the exact filtered,
//! ordered, comment-count-annotated result set, and gates single-post reads.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::instrument;
use uuid::Uuid;

use crate::data::category_repository::CategoryRepository;
use crate::data::comment_repository::CommentRepository;
use crate::data::post_repository::PostRepository;
use crate::data::user_repository::UserRepository;
use crate::domain::category::Category;
use crate::domain::comment::CommentView;
use crate::domain::error::DomainError;
use crate::domain::post::PostView;
use crate::domain::user::User;
use crate::domain::visibility::{PostFilter, Viewer, can_read};

/// Which collection a listing draws from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedScope {
    Global,
    /// Target user's feed, by username.
    Profile(String),
    /// Published category, by slug.
    Category(String),
}

#[derive(Clone)]
pub struct FeedService {
    posts: Arc<dyn PostRepository>,
    users: Arc<dyn UserRepository>,
    categories: Arc<dyn CategoryRepository>,
    comments: Arc<dyn CommentRepository>,
}

impl FeedService {
    pub fn new(
        posts: Arc<dyn PostRepository>,
        users: Arc<dyn UserRepository>,
        categories: Arc<dyn CategoryRepository>,
        comments: Arc<dyn CommentRepository>,
    ) -> Self {
        Self {
            posts,
            users,
            categories,
            comments,
        }
    }

    /// The ordered candidate set for a scope, before pagination. Ordering is
    /// fixed: `pub_date DESC, title ASC`.
    #[instrument(skip(self))]
    pub async fn list_posts(
        &self,
        scope: &FeedScope,
        viewer: &Viewer,
        now: DateTime<Utc>,
    ) -> Result<Vec<PostView>, DomainError> {
        let filter = match scope {
            FeedScope::Global => PostFilter::publicly_visible(now),
            FeedScope::Profile(username) => {
                let target = self.profile_user(username).await?;
                if viewer.is(target.id) {
                    // Owners see everything of theirs: unpublished, future,
                    // hidden-category posts included.
                    PostFilter::all().by_author(target.id)
                } else {
                    PostFilter::publicly_visible(now).by_author(target.id)
                }
            }
            FeedScope::Category(slug) => {
                // Author self-visibility never applies to category browsing.
                let category = self.published_category(slug).await?;
                PostFilter::publicly_visible(now).in_category(category.id)
            }
        };
        self.posts.list(&filter).await
    }

    /// The category behind a category feed. An unpublished or missing
    /// category makes the whole listing `NotFound`.
    pub async fn published_category(&self, slug: &str) -> Result<Category, DomainError> {
        self.categories
            .find_by_slug(slug)
            .await?
            .filter(|c| c.is_published)
            .ok_or(DomainError::NotFound)
    }

    /// The user behind a profile feed.
    pub async fn profile_user(&self, username: &str) -> Result<User, DomainError> {
        self.users
            .find_by_username(username)
            .await?
            .ok_or(DomainError::NotFound)
    }

    /// Single-post read. Missing and unreadable are the same `NotFound`;
    /// the author still resolves their own not-yet-public post.
    #[instrument(skip(self))]
    pub async fn get_post(
        &self,
        viewer: &Viewer,
        post_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<PostView, DomainError> {
        let view = self
            .posts
            .find_by_id(post_id)
            .await?
            .ok_or(DomainError::NotFound)?;
        if !can_read(viewer, &view, now) {
            return Err(DomainError::NotFound);
        }
        Ok(view)
    }

    pub async fn comments_for(&self, post_id: Uuid) -> Result<Vec<CommentView>, DomainError> {
        self.comments.list_for_post(post_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::memory::MemoryStore;
    use crate::domain::comment::Comment;
    use crate::domain::post::Post;
    use chrono::Duration;

    fn service(store: &Arc<MemoryStore>) -> FeedService {
        FeedService::new(
            store.clone(),
            store.clone(),
            store.clone(),
            store.clone(),
        )
    }

    async fn seed_user(store: &MemoryStore, name: &str) -> User {
        UserRepository::create(
            store,
            User::new(name.into(), format!("{name}@example.com"), "hash".into()),
        )
        .await
        .unwrap()
    }

    async fn seed_post(
        store: &MemoryStore,
        author: &User,
        title: &str,
        pub_date: DateTime<Utc>,
        is_published: bool,
        category_id: Option<Uuid>,
    ) -> Post {
        PostRepository::create(
            store,
            Post {
                id: Uuid::new_v4(),
                title: title.into(),
                text: "text".into(),
                image: None,
                pub_date,
                is_published,
                author_id: author.id,
                location_id: None,
                category_id,
                created_at: Utc::now(),
            },
        )
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn global_feed_never_contains_future_posts() {
        let store = Arc::new(MemoryStore::new());
        let feeds = service(&store);
        let now = Utc::now();
        let alice = seed_user(&store, "alice").await;
        seed_post(&store, &alice, "past", now - Duration::days(1), true, None).await;
        seed_post(&store, &alice, "future", now + Duration::days(1), true, None).await;

        // Not even for the author herself.
        for viewer in [Viewer::Anonymous, Viewer::User(alice.id)] {
            let posts = feeds
                .list_posts(&FeedScope::Global, &viewer, now)
                .await
                .unwrap();
            assert_eq!(posts.len(), 1);
            assert_eq!(posts[0].post.title, "past");
        }
    }

    #[tokio::test]
    async fn feed_orders_by_pub_date_desc_then_title_asc() {
        let store = Arc::new(MemoryStore::new());
        let feeds = service(&store);
        let now = Utc::now();
        let alice = seed_user(&store, "alice").await;
        let earlier = now - Duration::days(30);
        let later = now - Duration::days(1);
        // [Q(later,"B"), P(earlier,"A")] renders as [Q, P]; with equal dates
        // [R("B"), P("A")] renders as [P, R].
        seed_post(&store, &alice, "A", earlier, true, None).await;
        seed_post(&store, &alice, "B", later, true, None).await;
        seed_post(&store, &alice, "B", earlier, true, None).await;

        let posts = feeds
            .list_posts(&FeedScope::Global, &Viewer::Anonymous, now)
            .await
            .unwrap();
        let titles: Vec<(&str, DateTime<Utc>)> = posts
            .iter()
            .map(|v| (v.post.title.as_str(), v.post.pub_date))
            .collect();
        assert_eq!(
            titles,
            vec![("B", later), ("A", earlier), ("B", earlier)]
        );
    }

    #[tokio::test]
    async fn own_profile_feed_is_a_superset_of_the_public_one() {
        let store = Arc::new(MemoryStore::new());
        let feeds = service(&store);
        let now = Utc::now();
        let alice = seed_user(&store, "alice").await;
        seed_post(&store, &alice, "visible", now - Duration::days(1), true, None).await;
        seed_post(&store, &alice, "draft", now - Duration::days(1), false, None).await;
        seed_post(&store, &alice, "scheduled", now + Duration::days(1), true, None).await;

        let scope = FeedScope::Profile("alice".into());
        let own = feeds
            .list_posts(&scope, &Viewer::User(alice.id), now)
            .await
            .unwrap();
        let public = feeds
            .list_posts(&scope, &Viewer::Anonymous, now)
            .await
            .unwrap();

        assert_eq!(own.len(), 3);
        assert_eq!(public.len(), 1);
        assert_eq!(public[0].post.title, "visible");
        for p in &public {
            assert!(own.iter().any(|o| o.post.id == p.post.id));
        }
    }

    #[tokio::test]
    async fn unknown_profile_is_not_found() {
        let store = Arc::new(MemoryStore::new());
        let feeds = service(&store);
        let err = feeds
            .list_posts(
                &FeedScope::Profile("nobody".into()),
                &Viewer::Anonymous,
                Utc::now(),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::NotFound));
    }

    #[tokio::test]
    async fn unpublished_category_feed_is_not_found_for_everyone() {
        let store = Arc::new(MemoryStore::new());
        let feeds = service(&store);
        let now = Utc::now();
        let alice = seed_user(&store, "alice").await;
        let hidden = CategoryRepository::create(&*store, {
            let mut c = Category::new("Hidden".into(), "d".into(), "hidden".into());
            c.is_published = false;
            c
        })
        .await
        .unwrap();
        seed_post(&store, &alice, "post", now - Duration::days(1), true, Some(hidden.id)).await;

        let scope = FeedScope::Category("hidden".into());
        for viewer in [Viewer::Anonymous, Viewer::User(alice.id)] {
            let err = feeds.list_posts(&scope, &viewer, now).await.unwrap_err();
            assert!(matches!(err, DomainError::NotFound));
        }
    }

    #[tokio::test]
    async fn category_feed_excludes_authors_own_hidden_posts() {
        let store = Arc::new(MemoryStore::new());
        let feeds = service(&store);
        let now = Utc::now();
        let alice = seed_user(&store, "alice").await;
        let cat = CategoryRepository::create(
            &*store,
            Category::new("News".into(), "d".into(), "news".into()),
        )
        .await
        .unwrap();
        seed_post(&store, &alice, "public", now - Duration::days(1), true, Some(cat.id)).await;
        seed_post(&store, &alice, "draft", now - Duration::days(1), false, Some(cat.id)).await;

        let posts = feeds
            .list_posts(
                &FeedScope::Category("news".into()),
                &Viewer::User(alice.id),
                now,
            )
            .await
            .unwrap();
        assert_eq!(posts.len(), 1);
        assert_eq!(posts[0].post.title, "public");
    }

    #[tokio::test]
    async fn future_post_detail_resolves_for_author_and_404s_for_others() {
        let store = Arc::new(MemoryStore::new());
        let feeds = service(&store);
        let now = Utc::now();
        let alice = seed_user(&store, "alice").await;
        let bob = seed_user(&store, "bob").await;
        let scheduled =
            seed_post(&store, &alice, "tomorrow", now + Duration::days(1), true, None).await;

        let got = feeds
            .get_post(&Viewer::User(alice.id), scheduled.id, now)
            .await
            .unwrap();
        assert_eq!(got.post.id, scheduled.id);

        for viewer in [Viewer::Anonymous, Viewer::User(bob.id)] {
            let err = feeds.get_post(&viewer, scheduled.id, now).await.unwrap_err();
            assert!(matches!(err, DomainError::NotFound));
        }
    }

    #[tokio::test]
    async fn listings_carry_live_comment_counts() {
        let store = Arc::new(MemoryStore::new());
        let feeds = service(&store);
        let now = Utc::now();
        let alice = seed_user(&store, "alice").await;
        let p = seed_post(&store, &alice, "post", now - Duration::days(1), true, None).await;
        for i in 0..3 {
            CommentRepository::create(
                &*store,
                Comment {
                    id: Uuid::new_v4(),
                    text: format!("comment {i}"),
                    post_id: p.id,
                    author_id: alice.id,
                    created_at: now + Duration::seconds(i),
                },
            )
            .await
            .unwrap();
        }

        let posts = feeds
            .list_posts(&FeedScope::Global, &Viewer::Anonymous, now)
            .await
            .unwrap();
        assert_eq!(posts[0].comment_count, 3);

        let comments = feeds.comments_for(p.id).await.unwrap();
        let texts: Vec<_> = comments.iter().map(|c| c.comment.text.as_str()).collect();
        assert_eq!(texts, vec!["comment 0", "comment 1", "comment 2"]);
    }
}
