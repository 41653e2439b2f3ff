//! HTTP 接口

mod extractors;
mod handlers;

use std::sync::Arc;

use axum::{
    Router,
    extract::FromRef,
    routing::{get, post},
};
use shelf_auth_core::AccessGuard;

use crate::application::{BookService, SessionService};

pub use extractors::{Authorized, CreateBooks, DeleteBooks, RequiredAction, UpdateBooks, ViewBooks};

/// 处理器共享状态
#[derive(Clone)]
pub struct AppState {
    pub guard: Arc<AccessGuard>,
    pub books: Arc<BookService>,
    pub sessions: Arc<SessionService>,
}

impl FromRef<AppState> for Arc<AccessGuard> {
    fn from_ref(state: &AppState) -> Self {
        state.guard.clone()
    }
}

/// 业务路由
///
/// 每个图书路由对应唯一的操作, 在处理器运行前完成授权
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/login", post(handlers::session::login))
        .route("/logout", post(handlers::session::logout))
        .route(
            "/books",
            get(handlers::books::list_books).post(handlers::books::create_book),
        )
        .route(
            "/books/{id}",
            get(handlers::books::get_book)
                .put(handlers::books::update_book)
                .delete(handlers::books::delete_book),
        )
        .with_state(state)
}
