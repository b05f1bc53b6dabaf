//! Models for sessions tracked by the in-process session registry.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use utoipa::ToSchema;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
/// Server-side shadow of one outstanding refresh token.
pub struct RefreshRecord {
    /// Identity the refresh token was issued to.
    pub subject: String,
    /// Roles carried by the refresh token.
    pub roles: BTreeSet<String>,
    /// Timestamp when the refresh token was issued.
    pub issued_at: DateTime<Utc>,
    /// Timestamp after which the refresh token is rejected.
    pub expires_at: DateTime<Utc>,
    /// Timestamp of the last successful verification.
    pub last_seen_at: DateTime<Utc>,
}

impl RefreshRecord {
    pub fn new(
        subject: String,
        roles: BTreeSet<String>,
        issued_at: DateTime<Utc>,
        expires_at: DateTime<Utc>,
    ) -> Self {
        Self {
            subject,
            roles,
            issued_at,
            expires_at,
            last_seen_at: issued_at,
        }
    }

    /// Whole-second comparison, matching the `exp` check on the token itself.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now.timestamp() > self.expires_at.timestamp()
    }
}

#[derive(Debug, Serialize, ToSchema)]
/// Admin view of a registry entry.
pub struct SessionResponse {
    pub id: String,
    pub subject: String,
    pub roles: Vec<String>,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub last_seen_at: DateTime<Utc>,
}

impl SessionResponse {
    pub fn from_record(id: String, record: RefreshRecord) -> Self {
        Self {
            id,
            subject: record.subject,
            roles: record.roles.into_iter().collect(),
            issued_at: record.issued_at,
            expires_at: record.expires_at,
            last_seen_at: record.last_seen_at,
        }
    }
}
