//! Posts, their comments and the personalised feed query.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::FromRow;
use tracing::{info, instrument};

use crate::domain::{
    Comment, CommentAuthor, CommentId, FeedItem, FeedQuery, NewPost, Post, PostId, PostPatch,
    UserId,
};
use crate::errors::{Error, Result};
use crate::storage::{bounded, DbPool, DEFAULT_QUERY_TIMEOUT};

const POST_COLUMNS: &str = "id, user_id, title, content, tags, created_at, updated_at";

#[derive(Debug, Clone, FromRow)]
struct PostRow {
    id: PostId,
    user_id: UserId,
    title: String,
    content: String,
    tags: Vec<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<PostRow> for Post {
    fn from(row: PostRow) -> Self {
        Post {
            id: row.id,
            user_id: row.user_id,
            title: row.title,
            content: row.content,
            tags: row.tags,
            created_at: row.created_at,
            updated_at: row.updated_at,
            comments: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, FromRow)]
struct FeedRow {
    #[sqlx(flatten)]
    post: PostRow,
    author_email: String,
    comments_count: i64,
}

#[derive(Debug, Clone, FromRow)]
struct CommentRow {
    id: CommentId,
    post_id: PostId,
    user_id: UserId,
    content: String,
    created_at: DateTime<Utc>,
    author_email: String,
}

#[async_trait]
pub trait PostRepository: Send + Sync {
    async fn create(&self, post: NewPost) -> Result<Post>;

    async fn get_by_id(&self, id: PostId) -> Result<Post>;

    async fn update(&self, id: PostId, patch: &PostPatch) -> Result<Post>;

    async fn delete(&self, id: PostId) -> Result<()>;

    /// Posts by `user_id` and by everyone `user_id` follows.
    async fn feed(&self, user_id: UserId, query: &FeedQuery) -> Result<Vec<FeedItem>>;
}

#[async_trait]
pub trait CommentRepository: Send + Sync {
    async fn get_by_post_id(&self, post_id: PostId) -> Result<Vec<Comment>>;
}

#[derive(Debug, Clone)]
pub struct SqlxPostRepository {
    pool: DbPool,
    query_timeout: Duration,
}

impl SqlxPostRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool, query_timeout: DEFAULT_QUERY_TIMEOUT }
    }

    pub fn with_query_timeout(mut self, query_timeout: Duration) -> Self {
        self.query_timeout = query_timeout;
        self
    }
}

#[async_trait]
impl PostRepository for SqlxPostRepository {
    #[instrument(skip(self, post), fields(user_id = %post.user_id))]
    async fn create(&self, post: NewPost) -> Result<Post> {
        let query = format!(
            "INSERT INTO posts (user_id, title, content, tags) VALUES ($1, $2, $3, $4) \
             RETURNING {POST_COLUMNS}"
        );

        let row = bounded(
            self.query_timeout,
            "posts.create",
            sqlx::query_as::<_, PostRow>(&query)
                .bind(post.user_id)
                .bind(&post.title)
                .bind(&post.content)
                .bind(&post.tags)
                .fetch_one(&self.pool),
        )
        .await?;

        info!(post_id = %row.id, "Post created");
        Ok(row.into())
    }

    #[instrument(skip(self), fields(post_id = %id))]
    async fn get_by_id(&self, id: PostId) -> Result<Post> {
        let query = format!("SELECT {POST_COLUMNS} FROM posts WHERE id = $1");

        bounded(
            self.query_timeout,
            "posts.get_by_id",
            sqlx::query_as::<_, PostRow>(&query).bind(id).fetch_optional(&self.pool),
        )
        .await?
        .map(Post::from)
        .ok_or_else(|| Error::not_found("post", id.to_string()))
    }

    #[instrument(skip(self, patch), fields(post_id = %id))]
    async fn update(&self, id: PostId, patch: &PostPatch) -> Result<Post> {
        let query = format!(
            "UPDATE posts SET title = COALESCE($1, title), content = COALESCE($2, content), \
             updated_at = NOW() WHERE id = $3 RETURNING {POST_COLUMNS}"
        );

        bounded(
            self.query_timeout,
            "posts.update",
            sqlx::query_as::<_, PostRow>(&query)
                .bind(patch.title.as_deref())
                .bind(patch.content.as_deref())
                .bind(id)
                .fetch_optional(&self.pool),
        )
        .await?
        .map(Post::from)
        .ok_or_else(|| Error::not_found("post", id.to_string()))
    }

    #[instrument(skip(self), fields(post_id = %id))]
    async fn delete(&self, id: PostId) -> Result<()> {
        let result = bounded(
            self.query_timeout,
            "posts.delete",
            sqlx::query("DELETE FROM posts WHERE id = $1").bind(id).execute(&self.pool),
        )
        .await?;

        if result.rows_affected() == 0 {
            return Err(Error::not_found("post", id.to_string()));
        }

        info!("Post deleted");
        Ok(())
    }

    #[instrument(skip(self, query), fields(user_id = %user_id, limit = query.limit, offset = query.offset))]
    async fn feed(&self, user_id: UserId, query: &FeedQuery) -> Result<Vec<FeedItem>> {
        let order = query.sort.as_sql();
        let sql = format!(
            r#"
            SELECT p.id, p.user_id, p.title, p.content, p.tags, p.created_at, p.updated_at,
                   u.email AS author_email, COUNT(c.id) AS comments_count
            FROM posts p
            JOIN users u ON u.id = p.user_id
            LEFT JOIN comments c ON c.post_id = p.id
            WHERE (p.user_id = $1
                   OR p.user_id IN (SELECT followed_id FROM followers WHERE follower_id = $1))
              AND (cardinality($2::text[]) = 0 OR p.tags && $2::text[])
              AND ($3::text IS NULL
                   OR p.title ILIKE $3 ESCAPE '\'
                   OR p.content ILIKE $3 ESCAPE '\')
            GROUP BY p.id, u.email
            ORDER BY p.created_at {order}, p.id {order}
            LIMIT $4 OFFSET $5
            "#
        );

        let rows = bounded(
            self.query_timeout,
            "posts.feed",
            sqlx::query_as::<_, FeedRow>(&sql)
                .bind(user_id)
                .bind(&query.tags)
                .bind(query.search_pattern())
                .bind(i64::from(query.limit))
                .bind(i64::from(query.offset))
                .fetch_all(&self.pool),
        )
        .await?;

        Ok(rows
            .into_iter()
            .map(|row| FeedItem {
                post: row.post.into(),
                author_email: row.author_email,
                comments_count: row.comments_count,
            })
            .collect())
    }
}

#[derive(Debug, Clone)]
pub struct SqlxCommentRepository {
    pool: DbPool,
    query_timeout: Duration,
}

impl SqlxCommentRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool, query_timeout: DEFAULT_QUERY_TIMEOUT }
    }

    pub fn with_query_timeout(mut self, query_timeout: Duration) -> Self {
        self.query_timeout = query_timeout;
        self
    }
}

#[async_trait]
impl CommentRepository for SqlxCommentRepository {
    #[instrument(skip(self), fields(post_id = %post_id))]
    async fn get_by_post_id(&self, post_id: PostId) -> Result<Vec<Comment>> {
        let rows = bounded(
            self.query_timeout,
            "comments.get_by_post_id",
            sqlx::query_as::<_, CommentRow>(
                r#"
                SELECT c.id, c.post_id, c.user_id, c.content, c.created_at, u.email AS author_email
                FROM comments c
                JOIN users u ON u.id = c.user_id
                WHERE c.post_id = $1
                ORDER BY c.created_at DESC, c.id DESC
                "#,
            )
            .bind(post_id)
            .fetch_all(&self.pool),
        )
        .await?;

        Ok(rows
            .into_iter()
            .map(|row| Comment {
                id: row.id,
                post_id: row.post_id,
                user_id: row.user_id,
                content: row.content,
                created_at: row.created_at,
                author: CommentAuthor { id: row.user_id, email: row.author_email },
            })
            .collect())
    }
}
