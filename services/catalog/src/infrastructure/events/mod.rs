//! 数据库事件订阅

mod role_change_listener;

pub use role_change_listener::RoleChangeListener;
