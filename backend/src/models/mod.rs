//! Data models shared across the session services and API handlers.

pub mod session;
pub mod user;
