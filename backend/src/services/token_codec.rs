use chrono::Duration;
use std::{collections::BTreeSet, sync::Arc};
use uuid::Uuid;

use crate::{
    config::Config,
    models::session::RefreshRecord,
    services::session_store::SessionStore,
    utils::{
        jwt::{create_access_token, verify_access_token, AccessClaims, TokenError},
        refresh_token::{decode_refresh_token, encode_refresh_token, RefreshPayload},
        time::Clock,
    },
};

/// Keys and lifetimes used to mint and check both token types.
#[derive(Debug, Clone)]
pub struct TokenSettings {
    pub access_secret: String,
    pub refresh_secret: String,
    pub issuer: String,
    pub access_ttl: Duration,
    pub refresh_ttl: Duration,
}

impl From<&Config> for TokenSettings {
    fn from(config: &Config) -> Self {
        Self {
            access_secret: config.access_token_secret.clone(),
            refresh_secret: config.refresh_token_secret.clone(),
            issuer: config.token_issuer.clone(),
            access_ttl: config.access_token_ttl(),
            refresh_ttl: config.refresh_token_ttl(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct IssuedRefreshToken {
    pub token: String,
    pub session_id: String,
}

#[derive(Clone)]
pub struct TokenCodec {
    settings: TokenSettings,
    sessions: Arc<dyn SessionStore>,
    clock: Arc<dyn Clock>,
}

impl TokenCodec {
    pub fn new(settings: TokenSettings, sessions: Arc<dyn SessionStore>, clock: Arc<dyn Clock>) -> Self {
        Self {
            settings,
            sessions,
            clock,
        }
    }

    pub fn access_ttl(&self) -> Duration {
        self.settings.access_ttl
    }

    pub fn refresh_ttl(&self) -> Duration {
        self.settings.refresh_ttl
    }

    /// Mints an access token bound to `session_id`, the refresh session it
    /// travels with.
    pub fn issue_access_token(
        &self,
        subject: &str,
        roles: &BTreeSet<String>,
        session_id: &str,
    ) -> Result<(String, AccessClaims), TokenError> {
        let claims = AccessClaims::new(
            subject.to_string(),
            roles.clone(),
            session_id.to_string(),
            self.settings.issuer.clone(),
            self.clock.now(),
            self.settings.access_ttl,
        );
        let token = create_access_token(&claims, &self.settings.access_secret)?;
        Ok((token, claims))
    }

    /// Mints a refresh token under a fresh session id and registers its
    /// shadow record.
    pub fn issue_refresh_token(
        &self,
        subject: &str,
        roles: &BTreeSet<String>,
    ) -> Result<IssuedRefreshToken, TokenError> {
        let issued_at = self.clock.now();
        let expires_at = issued_at + self.settings.refresh_ttl;
        let session_id = Uuid::new_v4().to_string();

        let payload = RefreshPayload {
            sid: session_id.clone(),
            sub: subject.to_string(),
            roles: roles.clone(),
            iat: issued_at.timestamp(),
            exp: expires_at.timestamp(),
        };
        let token = encode_refresh_token(&payload, &self.settings.refresh_secret)?;

        self.sessions.insert(
            &session_id,
            RefreshRecord::new(subject.to_string(), roles.clone(), issued_at, expires_at),
        );
        tracing::info!(
            session_id = %session_id,
            subject = %subject,
            expires_at = %expires_at,
            "session_issued"
        );

        Ok(IssuedRefreshToken { token, session_id })
    }

    pub fn parse_and_verify_access_token(&self, token: &str) -> Result<AccessClaims, TokenError> {
        verify_access_token(
            token,
            &self.settings.access_secret,
            &self.settings.issuer,
            self.clock.now(),
        )
    }

    /// Checks the integrity tag and expiry only. Whether the session is still
    /// registered is the authenticator's concern.
    pub fn parse_and_verify_refresh_token(&self, token: &str) -> Result<RefreshPayload, TokenError> {
        decode_refresh_token(token, &self.settings.refresh_secret, self.clock.now())
    }
}
