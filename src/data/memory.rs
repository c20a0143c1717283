//! In-memory entity store used by the test suite. One shared state backs
//! all five repository traits so referential actions (cascade on author,
//! null-out on category/location) behave like the relational schema.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use uuid::Uuid;

use crate::data::category_repository::CategoryRepository;
use crate::data::comment_repository::CommentRepository;
use crate::data::location_repository::LocationRepository;
use crate::data::post_repository::PostRepository;
use crate::data::user_repository::UserRepository;
use crate::domain::category::Category;
use crate::domain::comment::{Comment, CommentView};
use crate::domain::error::DomainError;
use crate::domain::location::Location;
use crate::domain::post::{Post, PostView};
use crate::domain::user::User;
use crate::domain::visibility::PostFilter;

#[derive(Default)]
struct State {
    users: HashMap<Uuid, User>,
    categories: HashMap<Uuid, Category>,
    locations: HashMap<Uuid, Location>,
    posts: HashMap<Uuid, Post>,
    /// Vec keeps insertion order as the `created_at` tie-break.
    comments: Vec<Comment>,
}

impl State {
    fn view(&self, post: &Post) -> Option<PostView> {
        let author = self.users.get(&post.author_id)?;
        let category = post.category_id.and_then(|id| self.categories.get(&id)).cloned();
        let location = post.location_id.and_then(|id| self.locations.get(&id)).cloned();
        let comment_count = self
            .comments
            .iter()
            .filter(|c| c.post_id == post.id)
            .count() as i64;
        Some(PostView {
            post: post.clone(),
            author_username: author.username.clone(),
            category,
            location,
            comment_count,
        })
    }
}

#[derive(Clone, Default)]
pub struct MemoryStore {
    state: Arc<RwLock<State>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, State> {
        self.state.read().expect("store lock poisoned")
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, State> {
        self.state.write().expect("store lock poisoned")
    }
}

#[async_trait]
impl UserRepository for MemoryStore {
    async fn create(&self, user: User) -> Result<User, DomainError> {
        let mut state = self.write();
        if state.users.values().any(|u| u.username == user.username) {
            return Err(DomainError::Conflict("username already taken".into()));
        }
        if state.users.values().any(|u| u.email == user.email) {
            return Err(DomainError::Conflict("email already registered".into()));
        }
        state.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn update(&self, user: User) -> Result<User, DomainError> {
        let mut state = self.write();
        if state
            .users
            .values()
            .any(|u| u.id != user.id && u.username == user.username)
        {
            return Err(DomainError::Conflict("username already taken".into()));
        }
        state.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn delete(&self, id: Uuid) -> Result<(), DomainError> {
        let mut state = self.write();
        state.users.remove(&id);
        // Cascade: the user's posts, their comments, and comments on those
        // posts all go.
        let doomed_posts: Vec<Uuid> = state
            .posts
            .values()
            .filter(|p| p.author_id == id)
            .map(|p| p.id)
            .collect();
        state.posts.retain(|_, p| p.author_id != id);
        state
            .comments
            .retain(|c| c.author_id != id && !doomed_posts.contains(&c.post_id));
        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, DomainError> {
        Ok(self.read().users.get(&id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, DomainError> {
        Ok(self.read().users.values().find(|u| u.email == email).cloned())
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, DomainError> {
        Ok(self
            .read()
            .users
            .values()
            .find(|u| u.username == username)
            .cloned())
    }
}

#[async_trait]
impl CategoryRepository for MemoryStore {
    async fn create(&self, category: Category) -> Result<Category, DomainError> {
        let mut state = self.write();
        if state.categories.values().any(|c| c.slug == category.slug) {
            return Err(DomainError::Conflict(format!(
                "slug already in use: {}",
                category.slug
            )));
        }
        state.categories.insert(category.id, category.clone());
        Ok(category)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Category>, DomainError> {
        Ok(self.read().categories.get(&id).cloned())
    }

    async fn find_by_slug(&self, slug: &str) -> Result<Option<Category>, DomainError> {
        Ok(self
            .read()
            .categories
            .values()
            .find(|c| c.slug == slug)
            .cloned())
    }

    async fn delete(&self, id: Uuid) -> Result<(), DomainError> {
        let mut state = self.write();
        state.categories.remove(&id);
        for post in state.posts.values_mut() {
            if post.category_id == Some(id) {
                post.category_id = None;
            }
        }
        Ok(())
    }
}

#[async_trait]
impl LocationRepository for MemoryStore {
    async fn create(&self, location: Location) -> Result<Location, DomainError> {
        self.write().locations.insert(location.id, location.clone());
        Ok(location)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Location>, DomainError> {
        Ok(self.read().locations.get(&id).cloned())
    }

    async fn delete(&self, id: Uuid) -> Result<(), DomainError> {
        let mut state = self.write();
        state.locations.remove(&id);
        for post in state.posts.values_mut() {
            if post.location_id == Some(id) {
                post.location_id = None;
            }
        }
        Ok(())
    }
}

#[async_trait]
impl PostRepository for MemoryStore {
    async fn create(&self, post: Post) -> Result<Post, DomainError> {
        self.write().posts.insert(post.id, post.clone());
        Ok(post)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<PostView>, DomainError> {
        let state = self.read();
        Ok(state.posts.get(&id).and_then(|p| state.view(p)))
    }

    async fn update(&self, post: Post) -> Result<Post, DomainError> {
        self.write().posts.insert(post.id, post.clone());
        Ok(post)
    }

    async fn delete(&self, id: Uuid) -> Result<(), DomainError> {
        let mut state = self.write();
        state.posts.remove(&id);
        state.comments.retain(|c| c.post_id != id);
        Ok(())
    }

    async fn list(&self, filter: &PostFilter) -> Result<Vec<PostView>, DomainError> {
        let state = self.read();
        let mut views: Vec<PostView> = state
            .posts
            .values()
            .filter_map(|p| state.view(p))
            .filter(|v| filter.matches(v))
            .collect();
        views.sort_by(|a, b| {
            b.post
                .pub_date
                .cmp(&a.post.pub_date)
                .then_with(|| a.post.title.cmp(&b.post.title))
        });
        Ok(views)
    }
}

#[async_trait]
impl CommentRepository for MemoryStore {
    async fn create(&self, comment: Comment) -> Result<Comment, DomainError> {
        self.write().comments.push(comment.clone());
        Ok(comment)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Comment>, DomainError> {
        Ok(self.read().comments.iter().find(|c| c.id == id).cloned())
    }

    async fn update(&self, comment: Comment) -> Result<Comment, DomainError> {
        let mut state = self.write();
        if let Some(slot) = state.comments.iter_mut().find(|c| c.id == comment.id) {
            *slot = comment.clone();
        }
        Ok(comment)
    }

    async fn delete(&self, id: Uuid) -> Result<(), DomainError> {
        self.write().comments.retain(|c| c.id != id);
        Ok(())
    }

    async fn list_for_post(&self, post_id: Uuid) -> Result<Vec<CommentView>, DomainError> {
        let state = self.read();
        let mut views: Vec<CommentView> = state
            .comments
            .iter()
            .filter(|c| c.post_id == post_id)
            .filter_map(|c| {
                let author = state.users.get(&c.author_id)?;
                Some(CommentView {
                    comment: c.clone(),
                    author_username: author.username.clone(),
                })
            })
            .collect();
        // Stable sort keeps insertion order for equal timestamps.
        views.sort_by_key(|v| v.comment.created_at);
        Ok(views)
    }
}
