//! 图书

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use derive_more::Display;
use serde::{Deserialize, Serialize};
use shelf_errors::{AppError, AppResult};
use uuid::Uuid;

/// 标题和作者的最大长度 (字符)
pub const MAX_FIELD_LEN: usize = 255;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BookId(pub Uuid);

impl BookId {
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    pub fn from_uuid(id: Uuid) -> Self {
        Self(id)
    }
}

impl Default for BookId {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Book {
    pub id: BookId,
    pub title: String,
    pub author: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub published_at: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
}

/// 请求中的原始字段
#[derive(Debug, Clone, Deserialize)]
pub struct BookInput {
    pub title: String,
    pub author: String,
    /// `YYYY-MM-DD`, 空字符串视为未填写
    #[serde(default)]
    pub published_at: Option<String>,
}

/// 校验通过的字段
#[derive(Debug, Clone, PartialEq)]
pub struct BookDraft {
    pub title: String,
    pub author: String,
    pub published_at: Option<NaiveDate>,
}

impl BookInput {
    pub fn validate(self) -> AppResult<BookDraft> {
        let title = required("title", &self.title)?;
        let author = required("author", &self.author)?;

        let published_at = match self.published_at.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(raw) => Some(NaiveDate::parse_from_str(raw, "%Y-%m-%d").map_err(|_| {
                AppError::validation("published_at must be a date in YYYY-MM-DD format")
            })?),
        };

        Ok(BookDraft {
            title,
            author,
            published_at,
        })
    }
}

fn required(field: &str, value: &str) -> AppResult<String> {
    let value = value.trim();
    if value.is_empty() {
        return Err(AppError::validation(format!("{} must not be empty", field)));
    }
    if value.chars().count() > MAX_FIELD_LEN {
        return Err(AppError::validation(format!(
            "{} must be at most {} characters",
            field, MAX_FIELD_LEN
        )));
    }
    Ok(value.to_string())
}

/// 图书仓储
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BookRepository: Send + Sync {
    /// 按创建时间倒序列出
    async fn list(&self) -> AppResult<Vec<Book>>;

    async fn find_by_id(&self, id: BookId) -> AppResult<Option<Book>>;

    async fn create(&self, draft: &BookDraft) -> AppResult<Book>;

    /// 不存在时返回 None
    async fn update(&self, id: BookId, draft: &BookDraft) -> AppResult<Option<Book>>;

    /// 返回是否删除了记录
    async fn delete(&self, id: BookId) -> AppResult<bool>;
}
