//! PDP request/response bodies

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use shelf_auth_core::{Action, Principal, Resource};

#[derive(Debug, Serialize)]
pub(crate) struct RoleAttributes<'a> {
    pub role: &'a str,
}

#[derive(Debug, Serialize)]
pub(crate) struct UserBody<'a> {
    pub key: &'a str,
    pub attributes: RoleAttributes<'a>,
}

impl<'a> UserBody<'a> {
    pub fn from_principal(principal: &'a Principal) -> Self {
        Self {
            key: principal.identity().as_str(),
            attributes: RoleAttributes {
                role: principal.role().as_str(),
            },
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct ResourceBody<'a> {
    #[serde(rename = "type")]
    pub kind: &'a str,
    pub tenant: &'a str,
    pub attributes: Map<String, Value>,
}

#[derive(Debug, Serialize)]
pub(crate) struct CheckRequest<'a> {
    pub user: UserBody<'a>,
    pub action: &'a str,
    pub resource: ResourceBody<'a>,
    pub context: Map<String, Value>,
}

impl<'a> CheckRequest<'a> {
    pub fn new(principal: &'a Principal, action: Action, resource: &'a Resource) -> Self {
        Self {
            user: UserBody::from_principal(principal),
            action: action.as_str(),
            resource: ResourceBody {
                kind: resource.kind(),
                tenant: resource.tenant(),
                attributes: Map::new(),
            },
            context: Map::new(),
        }
    }
}

/// Only `allow` is read; other fields (debug, result) are ignored
#[derive(Debug, Deserialize)]
pub(crate) struct CheckResponse {
    pub allow: bool,
}
