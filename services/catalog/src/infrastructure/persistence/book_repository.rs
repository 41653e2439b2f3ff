//! PostgreSQL 图书仓储实现

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use shelf_errors::AppResult;
use sqlx::PgPool;
use uuid::Uuid;

use super::map_sqlx_error;
use crate::domain::book::{Book, BookDraft, BookId, BookRepository};

#[derive(sqlx::FromRow)]
struct BookRow {
    id: Uuid,
    title: String,
    author: String,
    published_at: Option<NaiveDate>,
    created_at: DateTime<Utc>,
}

impl From<BookRow> for Book {
    fn from(row: BookRow) -> Self {
        Book {
            id: BookId::from_uuid(row.id),
            title: row.title,
            author: row.author,
            published_at: row.published_at,
            created_at: row.created_at,
        }
    }
}

pub struct PostgresBookRepository {
    pool: PgPool,
}

impl PostgresBookRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl BookRepository for PostgresBookRepository {
    async fn list(&self) -> AppResult<Vec<Book>> {
        let rows = sqlx::query_as::<_, BookRow>(
            "SELECT id, title, author, published_at, created_at FROM books ORDER BY created_at DESC",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        Ok(rows.into_iter().map(Book::from).collect())
    }

    async fn find_by_id(&self, id: BookId) -> AppResult<Option<Book>> {
        let row = sqlx::query_as::<_, BookRow>(
            "SELECT id, title, author, published_at, created_at FROM books WHERE id = $1",
        )
        .bind(id.0)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        Ok(row.map(Book::from))
    }

    async fn create(&self, draft: &BookDraft) -> AppResult<Book> {
        let row = sqlx::query_as::<_, BookRow>(
            r#"
            INSERT INTO books (id, title, author, published_at, created_at)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, title, author, published_at, created_at
            "#,
        )
        .bind(BookId::new().0)
        .bind(&draft.title)
        .bind(&draft.author)
        .bind(draft.published_at)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        Ok(row.into())
    }

    async fn update(&self, id: BookId, draft: &BookDraft) -> AppResult<Option<Book>> {
        let row = sqlx::query_as::<_, BookRow>(
            r#"
            UPDATE books SET title = $2, author = $3, published_at = $4
            WHERE id = $1
            RETURNING id, title, author, published_at, created_at
            "#,
        )
        .bind(id.0)
        .bind(&draft.title)
        .bind(&draft.author)
        .bind(draft.published_at)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        Ok(row.map(Book::from))
    }

    async fn delete(&self, id: BookId) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM books WHERE id = $1")
            .bind(id.0)
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        Ok(result.rows_affected() > 0)
    }
}
