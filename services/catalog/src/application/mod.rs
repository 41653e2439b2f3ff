//! 应用层

mod book_service;
mod session_service;

pub use book_service::BookService;
pub use session_service::SessionService;
