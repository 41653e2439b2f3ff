//! 服务组装

use std::sync::Arc;
use std::time::Duration;

use shelf_auth_core::{
    AccessGuard, GuardConfig, IdentityResolver, PolicyClient, Resource, RoleStore,
};
use shelf_bootstrap::Infrastructure;
use shelf_config::AppConfig;
use tracing::info;

use crate::api::http::AppState;
use crate::application::{BookService, SessionService};
use crate::infrastructure::cache::{CachedRoleStore, RoleCacheConfig};
use crate::infrastructure::events::RoleChangeListener;
use crate::infrastructure::persistence::{
    PostgresBookRepository, PostgresRoleStore, PostgresUserRepository,
};

/// 组装结果
pub struct Assembly {
    pub state: AppState,
    /// 开启角色缓存时需要在后台运行
    pub listener: Option<RoleChangeListener>,
}

/// 由配置构建访问守卫
pub fn access_guard(
    config: &AppConfig,
    roles: Arc<dyn RoleStore>,
    policy: Arc<dyn PolicyClient>,
) -> AccessGuard {
    let resolver = IdentityResolver::new(&config.session.cookie_name)
        .with_max_age(Duration::from_secs(config.session.max_age_secs))
        .with_secure(config.session.secure);

    AccessGuard::new(
        resolver,
        roles,
        policy,
        Resource::new(&config.authz.resource, &config.authz.tenant),
        GuardConfig {
            role_lookup_timeout: config.authz.role_lookup_timeout(),
            decision_timeout: config.authz.decision_timeout(),
            sync_timeout: config.authz.sync_timeout(),
        },
    )
}

pub fn assemble(infra: &Infrastructure) -> Assembly {
    let config = infra.config();
    let pool = infra.postgres_pool();

    let store: Arc<dyn RoleStore> = Arc::new(PostgresRoleStore::new(pool.clone()));
    let (roles, listener) = if config.role_cache.enabled {
        let cached = CachedRoleStore::new(
            store,
            RoleCacheConfig {
                max_capacity: config.role_cache.max_capacity,
                ttl: Duration::from_secs(config.role_cache.ttl_secs),
            },
        );
        let listener =
            RoleChangeListener::new(pool.clone(), &config.role_cache.notify_channel, cached.clone());
        info!(ttl_secs = config.role_cache.ttl_secs, "Role cache enabled");
        let roles: Arc<dyn RoleStore> = Arc::new(cached);
        (roles, Some(listener))
    } else {
        (store, None)
    };

    let guard = Arc::new(access_guard(config, roles, infra.policy_client()));
    let books = Arc::new(BookService::new(Arc::new(PostgresBookRepository::new(
        pool.clone(),
    ))));
    let sessions = Arc::new(SessionService::new(
        Arc::new(PostgresUserRepository::new(pool)),
        guard.clone(),
    ));

    Assembly {
        state: AppState {
            guard,
            books,
            sessions,
        },
        listener,
    }
}
