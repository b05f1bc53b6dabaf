pub mod auth;
pub mod request_id;

pub use auth::{auth, auth_admin, optional_auth, CurrentUser};
pub use request_id::request_id;
