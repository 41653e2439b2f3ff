//! API 层

pub mod http;
