//! 角色缓存
//!
//! 包装任意 RoleStore。只缓存成功的查询结果;
//! 过期时间是角色变更可见延迟的上限, 变更通知到达时立即失效。
//!
//! 每次失效都会推进代数。查询开始后代数变化过, 结果只返回给本次调用, 不留在缓存里,
//! 避免失效之前读到的旧角色在失效之后被写回。

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use metrics::counter;
use moka::future::Cache as MokaCache;
use shelf_auth_core::{Identity, Role, RoleStore, RoleStoreError};
use tracing::debug;

/// 角色缓存配置
#[derive(Debug, Clone)]
pub struct RoleCacheConfig {
    pub max_capacity: u64,
    pub ttl: Duration,
}

impl Default for RoleCacheConfig {
    fn default() -> Self {
        Self {
            max_capacity: 10_000,
            ttl: Duration::from_secs(30),
        }
    }
}

#[derive(Clone)]
pub struct CachedRoleStore {
    inner: Arc<dyn RoleStore>,
    cache: MokaCache<String, Role>,
    generation: Arc<AtomicU64>,
}

impl CachedRoleStore {
    pub fn new(inner: Arc<dyn RoleStore>, config: RoleCacheConfig) -> Self {
        let cache = MokaCache::builder()
            .max_capacity(config.max_capacity)
            .time_to_live(config.ttl)
            .build();

        Self {
            inner,
            cache,
            generation: Arc::new(AtomicU64::new(0)),
        }
    }

    /// 失效单个身份
    pub async fn invalidate(&self, identity: &str) {
        // 先推进代数再删除条目
        self.generation.fetch_add(1, Ordering::SeqCst);
        self.cache.invalidate(identity).await;
        counter!("role_cache_invalidations_total", "reason" => "notification").increment(1);
        debug!(identity, "Role cache entry invalidated");
    }

    /// 失效全部条目
    pub fn invalidate_all(&self, reason: &'static str) {
        self.generation.fetch_add(1, Ordering::SeqCst);
        self.cache.invalidate_all();
        counter!("role_cache_invalidations_total", "reason" => reason).increment(1);
        debug!(reason, "Role cache cleared");
    }
}

#[async_trait]
impl RoleStore for CachedRoleStore {
    async fn role_of(&self, identity: &Identity) -> Result<Role, RoleStoreError> {
        if let Some(role) = self.cache.get(identity.as_str()).await {
            counter!("role_cache_operations_total", "hit" => "true").increment(1);
            return Ok(role);
        }
        counter!("role_cache_operations_total", "hit" => "false").increment(1);

        let started = self.generation.load(Ordering::SeqCst);
        let role = self.inner.role_of(identity).await?;
        if self.generation.load(Ordering::SeqCst) != started {
            debug!(identity = %identity, "Role changed during lookup, not caching");
            return Ok(role);
        }

        self.cache
            .insert(identity.as_str().to_string(), role.clone())
            .await;
        // 插入期间发生的失效可能早于插入完成, 再检查一次
        if self.generation.load(Ordering::SeqCst) != started {
            self.cache.invalidate(identity.as_str()).await;
        }
        Ok(role)
    }
}
