//! 授权提取器

use std::marker::PhantomData;
use std::sync::Arc;

use axum::{
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};
use shelf_auth_core::{AccessGuard, Action, Grant};
use shelf_errors::AppError;

/// 路由所需的操作
pub trait RequiredAction: Send + Sync + 'static {
    const ACTION: Action;
}

pub struct ViewBooks;
pub struct CreateBooks;
pub struct UpdateBooks;
pub struct DeleteBooks;

impl RequiredAction for ViewBooks {
    const ACTION: Action = Action::View;
}

impl RequiredAction for CreateBooks {
    const ACTION: Action = Action::Create;
}

impl RequiredAction for UpdateBooks {
    const ACTION: Action = Action::Update;
}

impl RequiredAction for DeleteBooks {
    const ACTION: Action = Action::Delete;
}

/// 已通过授权的请求
///
/// 必须放在处理器参数的最前面, 保证授权先于请求体解析
pub struct Authorized<A: RequiredAction> {
    grant: Grant,
    _action: PhantomData<A>,
}

impl<A: RequiredAction> Authorized<A> {
    pub fn grant(&self) -> &Grant {
        &self.grant
    }
}

impl<S, A> FromRequestParts<S> for Authorized<A>
where
    S: Send + Sync,
    A: RequiredAction,
    Arc<AccessGuard>: FromRef<S>,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let guard = Arc::<AccessGuard>::from_ref(state);
        let grant = guard.authorize(&parts.headers, A::ACTION).await?;
        Ok(Self {
            grant,
            _action: PhantomData,
        })
    }
}
