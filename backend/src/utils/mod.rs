pub mod cookies;
pub mod jwt;
pub mod refresh_token;
pub mod time;

pub use jwt::{AccessClaims, TokenError};
pub use time::{Clock, SystemClock};
