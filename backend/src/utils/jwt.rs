use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

const ACCESS_TOKEN_ALGORITHM: Algorithm = Algorithm::HS256;

/// Reasons a token failed to build or verify.
///
/// The variants exist for logging only; callers outside the auth services see
/// every one of them as "unauthenticated".
#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    #[error("token is malformed")]
    Malformed,
    #[error("token signature does not match")]
    InvalidSignature,
    #[error("token issuer does not match")]
    WrongIssuer,
    #[error("token has expired")]
    Expired,
    #[error("failed to encode token: {0}")]
    Encoding(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessClaims {
    pub sub: String,
    pub roles: BTreeSet<String>,
    pub sid: String, // refresh session the token was minted alongside
    pub iat: i64, // issued at
    pub exp: i64, // expiration time
    pub iss: String,
}

impl AccessClaims {
    pub fn new(
        subject: String,
        roles: BTreeSet<String>,
        session_id: String,
        issuer: String,
        issued_at: DateTime<Utc>,
        ttl: Duration,
    ) -> Self {
        Self {
            sub: subject,
            roles,
            sid: session_id,
            iat: issued_at.timestamp(),
            exp: (issued_at + ttl).timestamp(),
            iss: issuer,
        }
    }

    pub fn has_role(&self, role: &str) -> bool {
        self.roles.contains(role)
    }
}

pub fn create_access_token(claims: &AccessClaims, secret: &str) -> Result<String, TokenError> {
    encode(
        &Header::new(ACCESS_TOKEN_ALGORITHM),
        claims,
        &EncodingKey::from_secret(secret.as_ref()),
    )
    .map_err(|e| TokenError::Encoding(e.to_string()))
}

/// Verifies signature, algorithm and issuer, then checks `now <= exp`.
///
/// Expiry is checked against the supplied `now` instead of the library's own
/// wall clock so it follows the service clock.
pub fn verify_access_token(
    token: &str,
    secret: &str,
    issuer: &str,
    now: DateTime<Utc>,
) -> Result<AccessClaims, TokenError> {
    let mut validation = Validation::new(ACCESS_TOKEN_ALGORITHM);
    validation.set_issuer(&[issuer]);
    validation.set_required_spec_claims(&["exp", "iss", "sub"]);
    validation.validate_exp = false;
    validation.leeway = 0;

    let token_data = decode::<AccessClaims>(
        token,
        &DecodingKey::from_secret(secret.as_ref()),
        &validation,
    )
    .map_err(|e| match e.kind() {
        ErrorKind::InvalidSignature => TokenError::InvalidSignature,
        ErrorKind::InvalidIssuer => TokenError::WrongIssuer,
        ErrorKind::ExpiredSignature => TokenError::Expired,
        _ => TokenError::Malformed,
    })?;

    let claims = token_data.claims;
    if now.timestamp() > claims.exp {
        return Err(TokenError::Expired);
    }
    Ok(claims)
}
