//! Infrastructure layer - External service implementations

pub mod alert;
pub mod api_key;
pub mod audit;
pub mod auth;
pub mod billing;
pub mod crypto;
pub mod email;
pub mod gateway;
pub mod observability;
pub mod project;
pub mod storage;
pub mod usage;
pub mod user;
