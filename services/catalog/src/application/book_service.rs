//! 图书用例
//!
//! 每个操作都要求与之对应的授权凭据, 凭据不匹配时不触及存储

use std::sync::Arc;

use shelf_auth_core::{Action, Grant};
use shelf_errors::{AppError, AppResult};
use tracing::info;

use crate::domain::book::{Book, BookId, BookInput, BookRepository};

pub struct BookService {
    repo: Arc<dyn BookRepository>,
}

impl BookService {
    pub fn new(repo: Arc<dyn BookRepository>) -> Self {
        Self { repo }
    }

    pub async fn list(&self, grant: &Grant) -> AppResult<Vec<Book>> {
        grant.require(Action::View)?;
        self.repo.list().await
    }

    pub async fn get(&self, grant: &Grant, id: BookId) -> AppResult<Book> {
        grant.require(Action::View)?;
        self.repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Book {} not found", id)))
    }

    pub async fn create(&self, grant: &Grant, input: BookInput) -> AppResult<Book> {
        let principal = grant.require(Action::Create)?;
        let draft = input.validate()?;
        let book = self.repo.create(&draft).await?;

        info!(book_id = %book.id, identity = %principal.identity(), "Book created");
        Ok(book)
    }

    pub async fn update(&self, grant: &Grant, id: BookId, input: BookInput) -> AppResult<Book> {
        let principal = grant.require(Action::Update)?;
        let draft = input.validate()?;
        let book = self
            .repo
            .update(id, &draft)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Book {} not found", id)))?;

        info!(book_id = %id, identity = %principal.identity(), "Book updated");
        Ok(book)
    }

    pub async fn delete(&self, grant: &Grant, id: BookId) -> AppResult<()> {
        let principal = grant.require(Action::Delete)?;
        if !self.repo.delete(id).await? {
            return Err(AppError::not_found(format!("Book {} not found", id)));
        }

        info!(book_id = %id, identity = %principal.identity(), "Book deleted");
        Ok(())
    }
}
