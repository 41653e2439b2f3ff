//! shelf-adapter-pdp - Policy decision point adapter
//!
//! HTTP implementation of `PolicyClient` for a Permit-compatible PDP:
//! - `check` via `POST {pdp_url}/allowed`
//! - `sync` via `PUT {api_url}/v2/facts/{project}/{environment}/users/{key}`
//! - Hard deadlines on every call
//! - Readiness probe via `GET {pdp_url}/healthy`

pub mod client;
pub mod config;
pub mod error;
mod wire;

pub use client::HttpPolicyClient;
pub use config::{PdpConfig, PdpConfigBuilder};
