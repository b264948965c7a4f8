//! Authentication and authorization

pub mod user_auth;

pub use user_auth::{Role, UserIdentity};
