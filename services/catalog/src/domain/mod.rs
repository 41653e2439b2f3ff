//! 领域层

pub mod book;
pub mod user;
