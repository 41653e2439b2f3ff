//! 登录用例

use std::sync::Arc;

use shelf_auth_core::{AccessGuard, Identity, Principal, Role};
use shelf_errors::{AppError, AppResult};
use tracing::{info, warn};

use crate::domain::user::UserRepository;

/// 用户名不存在和密码错误返回同一条消息
const INVALID_CREDENTIALS: &str = "Invalid username or password";

pub struct SessionService {
    users: Arc<dyn UserRepository>,
    guard: Arc<AccessGuard>,
}

impl SessionService {
    pub fn new(users: Arc<dyn UserRepository>, guard: Arc<AccessGuard>) -> Self {
        Self { users, guard }
    }

    /// 校验凭据并把主体同步到决策点
    ///
    /// 同步失败不影响登录结果
    pub async fn login(&self, username: &str, password: &str) -> AppResult<Principal> {
        let identity = Identity::new(username.trim())
            .map_err(|_| AppError::unauthenticated(INVALID_CREDENTIALS))?;

        let Some(credentials) = self.users.find_credentials(identity.as_str()).await? else {
            warn!(identity = %identity, "Login failed: unknown user");
            return Err(AppError::unauthenticated(INVALID_CREDENTIALS));
        };

        if !credentials.password_hash.verify(password)? {
            warn!(identity = %identity, "Login failed: wrong password");
            return Err(AppError::unauthenticated(INVALID_CREDENTIALS));
        }

        let principal = Principal::new(identity, Role::new(credentials.role));
        self.guard.sync_principal(&principal).await;

        info!(identity = %principal.identity(), role = %principal.role(), "User logged in");
        Ok(principal)
    }
}
