//! HTTP inbound adapter exposing the `/api/v1` REST endpoints.

pub mod auth;
pub mod error;
pub mod families;
pub mod health;
pub mod inventory;
pub mod merchants;
pub mod notifications;
pub mod orders;
pub mod schemas;
pub mod state;
#[cfg(test)]
pub mod test_utils;
pub mod validation;

pub use error::ApiResult;
