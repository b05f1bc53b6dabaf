//! Request and response payloads for the login flow and the current user.

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use utoipa::ToSchema;
use validator::{Validate, ValidationError};

use crate::utils::jwt::AccessClaims;

pub const ADMIN_ROLE: &str = "admin";
pub const USER_ROLE: &str = "user";

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct LoginRequest {
    #[validate(length(min = 1, max = 64), custom(function = "validate_username"))]
    pub username: String,
}

/// Usernames are taken verbatim, so surrounding whitespace is refused rather
/// than trimmed away into a different identity.
pub fn validate_username(username: &str) -> Result<(), ValidationError> {
    if username.trim().is_empty() {
        return Err(ValidationError::new("username_blank"));
    }
    if username.trim() != username {
        return Err(ValidationError::new("username_surrounding_whitespace"));
    }
    Ok(())
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CurrentUserResponse {
    pub username: String,
    pub roles: Vec<String>,
    pub is_admin: bool,
    /// Expiry of the access token backing this response.
    pub expires_at: Option<DateTime<Utc>>,
}

impl From<&AccessClaims> for CurrentUserResponse {
    fn from(claims: &AccessClaims) -> Self {
        Self {
            username: claims.sub.clone(),
            roles: claims.roles.iter().cloned().collect(),
            is_admin: claims.has_role(ADMIN_ROLE),
            expires_at: Utc.timestamp_opt(claims.exp, 0).single(),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct HeartbeatResponse {
    pub authenticated: bool,
}

/// Demo role assignment: the literal username `admin` is an administrator,
/// everyone else is a plain user. There is no credential check.
pub fn roles_for_username(username: &str) -> BTreeSet<String> {
    let role = if username == ADMIN_ROLE {
        ADMIN_ROLE
    } else {
        USER_ROLE
    };
    std::iter::once(role.to_string()).collect()
}
