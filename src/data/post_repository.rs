use crate::domain::category::Category;
use crate::domain::error::DomainError;
use crate::domain::location::Location;
use crate::domain::post::{Post, PostView};
use crate::domain::visibility::PostFilter;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, QueryBuilder};
use tracing::{error, info};
use uuid::Uuid;

#[async_trait]
pub trait PostRepository: Send + Sync {
    async fn create(&self, post: Post) -> Result<Post, DomainError>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<PostView>, DomainError>;
    /// Full-row update. `author_id` is never written; the author is fixed at
    /// creation.
    async fn update(&self, post: Post) -> Result<Post, DomainError>;
    /// Comments on the post go with it.
    async fn delete(&self, id: Uuid) -> Result<(), DomainError>;
    /// Filtered listing in the fixed feed order: `pub_date DESC, title ASC`,
    /// each row carrying a live comment count.
    async fn list(&self, filter: &PostFilter) -> Result<Vec<PostView>, DomainError>;
}

const SELECT_VIEW: &str = r#"
SELECT p.id, p.title, p.text, p.image, p.pub_date, p.is_published,
       p.author_id, p.location_id, p.category_id, p.created_at,
       u.username AS author_username,
       c.title AS category_title, c.description AS category_description,
       c.slug AS category_slug, c.is_published AS category_is_published,
       c.created_at AS category_created_at,
       l.name AS location_name, l.is_published AS location_is_published,
       l.created_at AS location_created_at,
       (SELECT COUNT(*) FROM comments cm WHERE cm.post_id = p.id) AS comment_count
FROM posts p
JOIN users u ON u.id = p.author_id
LEFT JOIN categories c ON c.id = p.category_id
LEFT JOIN locations l ON l.id = p.location_id
"#;

/// Flat row for the joined view; folded into `PostView` in [`From`].
#[derive(sqlx::FromRow)]
struct PostViewRow {
    id: Uuid,
    title: String,
    text: String,
    image: Option<String>,
    pub_date: DateTime<Utc>,
    is_published: bool,
    author_id: Uuid,
    location_id: Option<Uuid>,
    category_id: Option<Uuid>,
    created_at: DateTime<Utc>,
    author_username: String,
    category_title: Option<String>,
    category_description: Option<String>,
    category_slug: Option<String>,
    category_is_published: Option<bool>,
    category_created_at: Option<DateTime<Utc>>,
    location_name: Option<String>,
    location_is_published: Option<bool>,
    location_created_at: Option<DateTime<Utc>>,
    comment_count: i64,
}

impl From<PostViewRow> for PostView {
    fn from(row: PostViewRow) -> Self {
        let category = match (row.category_id, row.category_title) {
            (Some(id), Some(title)) => Some(Category {
                id,
                title,
                description: row.category_description.unwrap_or_default(),
                slug: row.category_slug.unwrap_or_default(),
                is_published: row.category_is_published.unwrap_or(false),
                created_at: row.category_created_at.unwrap_or(row.created_at),
            }),
            _ => None,
        };
        let location = match (row.location_id, row.location_name) {
            (Some(id), Some(name)) => Some(Location {
                id,
                name,
                is_published: row.location_is_published.unwrap_or(false),
                created_at: row.location_created_at.unwrap_or(row.created_at),
            }),
            _ => None,
        };
        PostView {
            post: Post {
                id: row.id,
                title: row.title,
                text: row.text,
                image: row.image,
                pub_date: row.pub_date,
                is_published: row.is_published,
                author_id: row.author_id,
                location_id: row.location_id,
                category_id: row.category_id,
                created_at: row.created_at,
            },
            author_username: row.author_username,
            category,
            location,
            comment_count: row.comment_count,
        }
    }
}

fn push_filter(qb: &mut QueryBuilder<'_, Postgres>, filter: &PostFilter) {
    qb.push(" WHERE 1 = 1");
    if let Some(author_id) = filter.author_id {
        qb.push(" AND p.author_id = ").push_bind(author_id);
    }
    if let Some(category_id) = filter.category_id {
        qb.push(" AND p.category_id = ").push_bind(category_id);
    }
    if let Some(t) = filter.published_before {
        qb.push(" AND p.pub_date <= ").push_bind(t);
    }
    if filter.published_only {
        qb.push(" AND p.is_published");
    }
    if filter.require_published_category {
        qb.push(" AND (p.category_id IS NULL OR c.is_published)");
    }
}

#[derive(Clone)]
pub struct PostgresPostRepository {
    pool: PgPool,
}

impl PostgresPostRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PostRepository for PostgresPostRepository {
    async fn create(&self, post: Post) -> Result<Post, DomainError> {
        sqlx::query(
            r#"
            INSERT INTO posts (id, title, text, image, pub_date, is_published,
                               author_id, location_id, category_id, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(post.id)
        .bind(&post.title)
        .bind(&post.text)
        .bind(&post.image)
        .bind(post.pub_date)
        .bind(post.is_published)
        .bind(post.author_id)
        .bind(post.location_id)
        .bind(post.category_id)
        .bind(post.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            error!("failed to create post: {}", e);
            DomainError::Internal(format!("database error: {}", e))
        })?;

        info!(post_id = %post.id, author_id = %post.author_id, "post created");
        Ok(post)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<PostView>, DomainError> {
        let mut qb = QueryBuilder::<Postgres>::new(SELECT_VIEW);
        qb.push(" WHERE p.id = ").push_bind(id);
        let row: Option<PostViewRow> = qb
            .build_query_as()
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                error!("db error find_by_id {}: {}", id, e);
                DomainError::Internal(format!("database error: {}", e))
            })?;
        Ok(row.map(PostView::from))
    }

    async fn update(&self, post: Post) -> Result<Post, DomainError> {
        sqlx::query(
            r#"
            UPDATE posts
            SET title = $1, text = $2, image = $3, pub_date = $4,
                is_published = $5, location_id = $6, category_id = $7
            WHERE id = $8
            "#,
        )
        .bind(&post.title)
        .bind(&post.text)
        .bind(&post.image)
        .bind(post.pub_date)
        .bind(post.is_published)
        .bind(post.location_id)
        .bind(post.category_id)
        .bind(post.id)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            error!("failed to update post {}: {}", post.id, e);
            DomainError::Internal(format!("database error: {}", e))
        })?;

        info!(post_id = %post.id, "post updated");
        Ok(post)
    }

    async fn delete(&self, id: Uuid) -> Result<(), DomainError> {
        sqlx::query("DELETE FROM posts WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                error!("failed to delete post {}: {}", id, e);
                DomainError::Internal(format!("database error: {}", e))
            })?;

        info!(post_id = %id, "post deleted");
        Ok(())
    }

    async fn list(&self, filter: &PostFilter) -> Result<Vec<PostView>, DomainError> {
        let mut qb = QueryBuilder::<Postgres>::new(SELECT_VIEW);
        push_filter(&mut qb, filter);
        qb.push(" ORDER BY p.pub_date DESC, p.title ASC");

        let rows: Vec<PostViewRow> = qb
            .build_query_as()
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                error!("db error while listing posts: {}", e);
                DomainError::Internal(format!("database error: {}", e))
            })?;
        Ok(rows.into_iter().map(PostView::from).collect())
    }
}
