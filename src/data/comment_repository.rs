use crate::domain::comment::{Comment, CommentView};
use crate::domain::error::DomainError;
use async_trait::async_trait;
use sqlx::PgPool;
use tracing::{error, info};
use uuid::Uuid;

#[async_trait]
pub trait CommentRepository: Send + Sync {
    async fn create(&self, comment: Comment) -> Result<Comment, DomainError>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Comment>, DomainError>;
    async fn update(&self, comment: Comment) -> Result<Comment, DomainError>;
    async fn delete(&self, id: Uuid) -> Result<(), DomainError>;
    /// Ascending `created_at`; concurrent same-instant comments fall back to
    /// storage insertion order.
    async fn list_for_post(&self, post_id: Uuid) -> Result<Vec<CommentView>, DomainError>;
}

#[derive(sqlx::FromRow)]
struct CommentViewRow {
    id: Uuid,
    text: String,
    post_id: Uuid,
    author_id: Uuid,
    created_at: chrono::DateTime<chrono::Utc>,
    author_username: String,
}

impl From<CommentViewRow> for CommentView {
    fn from(row: CommentViewRow) -> Self {
        CommentView {
            comment: Comment {
                id: row.id,
                text: row.text,
                post_id: row.post_id,
                author_id: row.author_id,
                created_at: row.created_at,
            },
            author_username: row.author_username,
        }
    }
}

#[derive(Clone)]
pub struct PostgresCommentRepository {
    pool: PgPool,
}

impl PostgresCommentRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CommentRepository for PostgresCommentRepository {
    async fn create(&self, comment: Comment) -> Result<Comment, DomainError> {
        sqlx::query(
            r#"
            INSERT INTO comments (id, text, post_id, author_id, created_at)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(comment.id)
        .bind(&comment.text)
        .bind(comment.post_id)
        .bind(comment.author_id)
        .bind(comment.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            error!("failed to create comment: {}", e);
            DomainError::Internal(format!("database error: {}", e))
        })?;

        info!(comment_id = %comment.id, post_id = %comment.post_id, "comment created");
        Ok(comment)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Comment>, DomainError> {
        sqlx::query_as::<_, Comment>(
            r#"
            SELECT id, text, post_id, author_id, created_at
            FROM comments
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            error!("db error find comment {}: {}", id, e);
            DomainError::Internal(format!("database error: {}", e))
        })
    }

    async fn update(&self, comment: Comment) -> Result<Comment, DomainError> {
        sqlx::query("UPDATE comments SET text = $1 WHERE id = $2")
            .bind(&comment.text)
            .bind(comment.id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                error!("failed to update comment {}: {}", comment.id, e);
                DomainError::Internal(format!("database error: {}", e))
            })?;

        info!(comment_id = %comment.id, "comment updated");
        Ok(comment)
    }

    async fn delete(&self, id: Uuid) -> Result<(), DomainError> {
        sqlx::query("DELETE FROM comments WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                error!("failed to delete comment {}: {}", id, e);
                DomainError::Internal(format!("database error: {}", e))
            })?;

        info!(comment_id = %id, "comment deleted");
        Ok(())
    }

    async fn list_for_post(&self, post_id: Uuid) -> Result<Vec<CommentView>, DomainError> {
        let rows = sqlx::query_as::<_, CommentViewRow>(
            r#"
            SELECT cm.id, cm.text, cm.post_id, cm.author_id, cm.created_at,
                   u.username AS author_username
            FROM comments cm
            JOIN users u ON u.id = cm.author_id
            WHERE cm.post_id = $1
            ORDER BY cm.created_at ASC
            "#,
        )
        .bind(post_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            error!("db error listing comments for {}: {}", post_id, e);
            DomainError::Internal(format!("database error: {}", e))
        })?;
        Ok(rows.into_iter().map(CommentView::from).collect())
    }
}
