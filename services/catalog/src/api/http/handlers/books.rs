//! 图书处理器

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use shelf_errors::AppResult;
use uuid::Uuid;

use crate::api::http::AppState;
use crate::api::http::extractors::{Authorized, CreateBooks, DeleteBooks, UpdateBooks, ViewBooks};
use crate::domain::book::{Book, BookId, BookInput};

pub async fn list_books(
    auth: Authorized<ViewBooks>,
    State(state): State<AppState>,
) -> AppResult<Json<Vec<Book>>> {
    Ok(Json(state.books.list(auth.grant()).await?))
}

pub async fn get_book(
    auth: Authorized<ViewBooks>,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Book>> {
    Ok(Json(state.books.get(auth.grant(), BookId::from_uuid(id)).await?))
}

pub async fn create_book(
    auth: Authorized<CreateBooks>,
    State(state): State<AppState>,
    Json(input): Json<BookInput>,
) -> AppResult<(StatusCode, Json<Book>)> {
    let book = state.books.create(auth.grant(), input).await?;
    Ok((StatusCode::CREATED, Json(book)))
}

pub async fn update_book(
    auth: Authorized<UpdateBooks>,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(input): Json<BookInput>,
) -> AppResult<Json<Book>> {
    let book = state
        .books
        .update(auth.grant(), BookId::from_uuid(id), input)
        .await?;
    Ok(Json(book))
}

pub async fn delete_book(
    auth: Authorized<DeleteBooks>,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<StatusCode> {
    state.books.delete(auth.grant(), BookId::from_uuid(id)).await?;
    Ok(StatusCode::NO_CONTENT)
}
