//! 缓存

mod role_cache;

pub use role_cache::{CachedRoleStore, RoleCacheConfig};
