//! 角色变更监听器 - 后台任务
//!
//! `LISTEN role_changed`, payload 为 username。
//! 连接断开期间的通知会丢失, 因此每次断开或重新订阅都清空整个缓存。

use std::time::Duration;

use sqlx::PgPool;
use sqlx::postgres::PgListener;
use tracing::{info, warn};

use crate::infrastructure::cache::CachedRoleStore;

pub struct RoleChangeListener {
    pool: PgPool,
    channel: String,
    cache: CachedRoleStore,
    retry_delay: Duration,
}

impl RoleChangeListener {
    pub fn new(pool: PgPool, channel: impl Into<String>, cache: CachedRoleStore) -> Self {
        Self {
            pool,
            channel: channel.into(),
            cache,
            retry_delay: Duration::from_secs(1),
        }
    }

    pub fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }

    /// 启动后台监听循环, 不会返回
    pub async fn start(self) {
        info!(channel = %self.channel, "Starting role change listener");

        loop {
            if let Err(e) = self.listen().await {
                warn!(channel = %self.channel, error = %e, "Role change listener failed");
            }
            self.cache.invalidate_all("listener_error");
            tokio::time::sleep(self.retry_delay).await;
        }
    }

    async fn listen(&self) -> Result<(), sqlx::Error> {
        let mut listener = PgListener::connect_with(&self.pool).await?;
        listener.listen(&self.channel).await?;
        // 订阅建立之前的变更无法得知
        self.cache.invalidate_all("listener_subscribed");
        info!(channel = %self.channel, "Subscribed to role changes");

        loop {
            let notification = listener.try_recv().await?;
            self.on_message(notification.as_ref().map(|n| n.payload()))
                .await;
        }
    }

    /// 处理一次接收结果
    ///
    /// `Some(username)` 失效该用户; `None` 表示连接已断开, 期间的通知可能丢失,
    /// 清空全部条目后由下次 `try_recv` 重连并重新 LISTEN
    pub async fn on_message(&self, payload: Option<&str>) {
        match payload {
            Some(username) => self.cache.invalidate(username).await,
            None => {
                warn!(channel = %self.channel, "Role change listener connection lost");
                self.cache.invalidate_all("listener_reconnect");
            }
        }
    }
}
