//! Access-token validation and the silent-refresh protocol.
//!
//! A request is authenticated by its access token when that token verifies.
//! Otherwise, and only then, the refresh token is tried once: it must carry a
//! valid tag, be unexpired, and name a live registry entry whose contents
//! match the token. A successful refresh consumes that entry and mints a new
//! access/refresh pair under a new session id, so every refresh token is
//! usable exactly once.

use std::{collections::BTreeSet, sync::Arc};

use crate::{
    models::{session::RefreshRecord, user::roles_for_username},
    services::{session_store::SessionStore, token_codec::TokenCodec},
    utils::{
        jwt::{AccessClaims, TokenError},
        refresh_token::RefreshPayload,
    },
};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    /// Missing, invalid, expired, revoked or tampered credentials. The cause
    /// is never reported to the client.
    #[error("authentication required")]
    Unauthenticated,
    #[error("missing required role")]
    Forbidden,
    #[error("failed to issue credentials: {0}")]
    CredentialIssue(String),
}

impl From<TokenError> for AuthError {
    fn from(_: TokenError) -> Self {
        AuthError::Unauthenticated
    }
}

/// Freshly minted access/refresh pair, ready to be set as cookies.
#[derive(Debug, Clone)]
pub struct CredentialPair {
    pub access_token: String,
    pub claims: AccessClaims,
    pub refresh_token: String,
    pub session_id: String,
}

/// Outcome of resolving a request's credentials.
#[derive(Debug, Clone)]
pub enum Resolution {
    /// The access token was valid.
    Authenticated(AccessClaims),
    /// The access token was unusable but the refresh token rotated. The new
    /// pair must be delivered with the response.
    Refreshed(CredentialPair),
    Anonymous,
}

impl Resolution {
    pub fn claims(&self) -> Option<&AccessClaims> {
        match self {
            Resolution::Authenticated(claims) => Some(claims),
            Resolution::Refreshed(pair) => Some(&pair.claims),
            Resolution::Anonymous => None,
        }
    }

    pub fn into_parts(self) -> (Option<AccessClaims>, Option<CredentialPair>) {
        match self {
            Resolution::Authenticated(claims) => (Some(claims), None),
            Resolution::Refreshed(pair) => (Some(pair.claims.clone()), Some(pair)),
            Resolution::Anonymous => (None, None),
        }
    }
}

#[derive(Clone)]
pub struct Authenticator {
    codec: TokenCodec,
    sessions: Arc<dyn SessionStore>,
}

impl Authenticator {
    pub fn new(codec: TokenCodec, sessions: Arc<dyn SessionStore>) -> Self {
        Self { codec, sessions }
    }

    pub fn codec(&self) -> &TokenCodec {
        &self.codec
    }

    /// Starts a session for `username` with the demo role policy.
    pub fn login(&self, username: &str) -> Result<CredentialPair, AuthError> {
        let roles = roles_for_username(username);
        let pair = self
            .issue_pair(username, &roles)
            .map_err(|e| AuthError::CredentialIssue(e.to_string()))?;
        tracing::info!(
            subject = %username,
            session_id = %pair.session_id,
            "login_succeeded"
        );
        Ok(pair)
    }

    /// Verifies the access token and that the session it was minted with is
    /// still registered, so logout and admin revocation take effect at once.
    pub fn authenticate(&self, access_token: Option<&str>) -> Result<AccessClaims, AuthError> {
        let token = access_token.ok_or(AuthError::Unauthenticated)?;
        let claims = self.codec.parse_and_verify_access_token(token).map_err(|e| {
            tracing::debug!(error = %e, "access_token_rejected");
            AuthError::from(e)
        })?;

        match self.sessions.lookup(&claims.sid) {
            Some(record) if record.subject == claims.sub => Ok(claims),
            _ => {
                tracing::debug!(
                    session_id = %claims.sid,
                    subject = %claims.sub,
                    "access_token_session_gone"
                );
                Err(AuthError::Unauthenticated)
            }
        }
    }

    /// Verifies a refresh token against both its tag and the registry, and
    /// marks the session as seen. Nothing is mutated on failure.
    pub fn verify_refresh_token(&self, refresh_token: &str) -> Result<RefreshPayload, AuthError> {
        let payload = self
            .codec
            .parse_and_verify_refresh_token(refresh_token)
            .map_err(|e| {
                tracing::debug!(error = %e, "session_refresh_rejected");
                AuthError::from(e)
            })?;

        let record = self.sessions.lookup(&payload.sid).ok_or_else(|| {
            tracing::warn!(
                session_id = %payload.sid,
                subject = %payload.sub,
                "session_refresh_rejected_unknown"
            );
            AuthError::Unauthenticated
        })?;
        if !record_matches(&record, &payload) {
            tracing::warn!(
                session_id = %payload.sid,
                subject = %payload.sub,
                "session_refresh_rejected_mismatch"
            );
            return Err(AuthError::Unauthenticated);
        }

        self.sessions.touch(&payload.sid);
        Ok(payload)
    }

    /// Rotates a refresh token: verify, revoke the old session, issue a new
    /// pair. Of concurrent callers presenting the same token at most one wins.
    pub fn attempt_silent_refresh(
        &self,
        refresh_token: Option<&str>,
    ) -> Result<CredentialPair, AuthError> {
        let token = refresh_token.ok_or(AuthError::Unauthenticated)?;
        let payload = self.verify_refresh_token(token)?;

        // Revoke before issuing so the old id can never be accepted again.
        if self.sessions.take(&payload.sid).is_none() {
            tracing::warn!(
                session_id = %payload.sid,
                subject = %payload.sub,
                "session_refresh_lost_race"
            );
            return Err(AuthError::Unauthenticated);
        }

        let pair = self.issue_pair(&payload.sub, &payload.roles).map_err(|e| {
            tracing::error!(error = %e, subject = %payload.sub, "session_rotation_failed");
            AuthError::Unauthenticated
        })?;
        tracing::info!(
            subject = %payload.sub,
            old_session_id = %payload.sid,
            new_session_id = %pair.session_id,
            "session_rotated"
        );
        Ok(pair)
    }

    /// Current user for a request: the access token if it verifies, otherwise
    /// one silent-refresh attempt.
    pub fn resolve(&self, access_token: Option<&str>, refresh_token: Option<&str>) -> Resolution {
        if let Ok(claims) = self.authenticate(access_token) {
            return Resolution::Authenticated(claims);
        }
        if refresh_token.is_none() {
            return Resolution::Anonymous;
        }
        match self.attempt_silent_refresh(refresh_token) {
            Ok(pair) => Resolution::Refreshed(pair),
            Err(_) => Resolution::Anonymous,
        }
    }

    /// Revokes the session named by the refresh token, if its tag checks out.
    pub fn logout(&self, refresh_token: Option<&str>) {
        let Some(token) = refresh_token else {
            return;
        };
        match self.codec.parse_and_verify_refresh_token(token) {
            Ok(payload) => self.sessions.revoke(&payload.sid),
            Err(e) => tracing::debug!(error = %e, "logout_without_valid_refresh_token"),
        }
    }

    pub fn list_sessions(&self) -> Vec<(String, RefreshRecord)> {
        self.sessions.list_all()
    }

    pub fn revoke_session(&self, session_id: &str) {
        self.sessions.revoke(session_id);
    }

    fn issue_pair(&self, subject: &str, roles: &BTreeSet<String>) -> Result<CredentialPair, TokenError> {
        let refresh = self.codec.issue_refresh_token(subject, roles)?;
        let (access_token, claims) = self
            .codec
            .issue_access_token(subject, roles, &refresh.session_id)
            .inspect_err(|_| self.sessions.revoke(&refresh.session_id))?;
        Ok(CredentialPair {
            access_token,
            claims,
            refresh_token: refresh.token,
            session_id: refresh.session_id,
        })
    }
}

/// The only authorization primitive: a flat role membership check.
pub fn require_role(claims: &AccessClaims, role: &str) -> Result<(), AuthError> {
    if claims.has_role(role) {
        Ok(())
    } else {
        Err(AuthError::Forbidden)
    }
}

fn record_matches(record: &RefreshRecord, payload: &RefreshPayload) -> bool {
    record.subject == payload.sub
        && record.roles == payload.roles
        && record.expires_at.timestamp() == payload.exp
}
