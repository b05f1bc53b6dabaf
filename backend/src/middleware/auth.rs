use axum::{
    extract::{Request, State},
    http::{header, HeaderMap, HeaderValue},
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::{
    error::AppError,
    models::user::ADMIN_ROLE,
    services::authenticator::{require_role, AuthError, CredentialPair, Resolution},
    state::AppState,
    utils::{
        cookies::{
            build_auth_cookie, build_clear_cookie, extract_cookie_value, ACCESS_COOKIE_NAME,
            REFRESH_COOKIE_NAME,
        },
        jwt::AccessClaims,
    },
};

/// Request extension carrying the resolved user, if any. Always present
/// behind [`optional_auth`], [`auth`] and [`auth_admin`].
#[derive(Debug, Clone)]
pub struct CurrentUser(pub Option<AccessClaims>);

pub async fn auth(State(state): State<AppState>, request: Request, next: Next) -> Response {
    guarded(state, request, next, None).await
}

// Auth + require admin role for admin-only routes
pub async fn auth_admin(State(state): State<AppState>, request: Request, next: Next) -> Response {
    guarded(state, request, next, Some(ADMIN_ROLE)).await
}

/// Resolves the user when possible but never rejects. Used for page renders
/// and the heartbeat.
pub async fn optional_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let (claims, refreshed) = resolve_request(&state, request.headers()).into_parts();
    if let Some(claims) = claims.clone() {
        request.extensions_mut().insert(claims);
    }
    request.extensions_mut().insert(CurrentUser(claims));

    let mut response = next.run(request).await;
    if let Some(pair) = refreshed {
        append_session_cookies(&state, response.headers_mut(), &pair);
    }
    response
}

async fn guarded(
    state: AppState,
    mut request: Request,
    next: Next,
    required_role: Option<&'static str>,
) -> Response {
    let (claims, refreshed) = resolve_request(&state, request.headers()).into_parts();
    let outcome = claims
        .ok_or(AuthError::Unauthenticated)
        .and_then(|claims| match required_role {
            Some(role) => require_role(&claims, role).map(|_| claims),
            None => Ok(claims),
        });

    let mut response = match outcome {
        Ok(claims) => {
            request.extensions_mut().insert(CurrentUser(Some(claims.clone())));
            request.extensions_mut().insert(claims);
            next.run(request).await
        }
        Err(err) => {
            tracing::debug!(error = %err, uri = %request.uri(), "request_rejected");
            AppError::from(err).into_response()
        }
    };

    // A rotated pair must reach the client even when the request itself is
    // rejected, otherwise the consumed refresh token strands the session.
    if let Some(pair) = refreshed {
        append_session_cookies(&state, response.headers_mut(), &pair);
    }
    response
}

pub fn resolve_request(state: &AppState, headers: &HeaderMap) -> Resolution {
    let (access_token, refresh_token) = extract_credentials(headers);
    state
        .authenticator
        .resolve(access_token.as_deref(), refresh_token.as_deref())
}

/// Access token from a bearer header or the access cookie, and the refresh
/// token from its cookie.
pub fn extract_credentials(headers: &HeaderMap) -> (Option<String>, Option<String>) {
    let cookie_header = headers
        .get(header::COOKIE)
        .and_then(|value| value.to_str().ok());
    let access_token = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(parse_bearer_token)
        .map(str::to_string)
        .or_else(|| cookie_header.and_then(|raw| extract_cookie_value(raw, ACCESS_COOKIE_NAME)));
    let refresh_token =
        cookie_header.and_then(|raw| extract_cookie_value(raw, REFRESH_COOKIE_NAME));
    (access_token, refresh_token)
}

pub fn append_session_cookies(state: &AppState, headers: &mut HeaderMap, pair: &CredentialPair) {
    let options = state.cookie_options();
    let codec = state.authenticator.codec();
    let cookies = [
        build_auth_cookie(
            ACCESS_COOKIE_NAME,
            &pair.access_token,
            codec.access_ttl().to_std().unwrap_or_default(),
            options,
        ),
        build_auth_cookie(
            REFRESH_COOKIE_NAME,
            &pair.refresh_token,
            codec.refresh_ttl().to_std().unwrap_or_default(),
            options,
        ),
    ];
    append_set_cookies(headers, cookies);
}

pub fn append_clear_cookies(state: &AppState, headers: &mut HeaderMap) {
    let options = state.cookie_options();
    append_set_cookies(
        headers,
        [
            build_clear_cookie(ACCESS_COOKIE_NAME, options),
            build_clear_cookie(REFRESH_COOKIE_NAME, options),
        ],
    );
}

fn append_set_cookies(headers: &mut HeaderMap, cookies: [String; 2]) {
    for cookie in cookies {
        match HeaderValue::from_str(&cookie) {
            Ok(value) => {
                headers.append(header::SET_COOKIE, value);
            }
            Err(err) => tracing::error!(error = %err, "invalid_set_cookie_header"),
        }
    }
}

fn parse_bearer_token(header: &str) -> Option<&str> {
    let (scheme, rest) = header.split_once(' ')?;
    if scheme.eq_ignore_ascii_case("bearer") {
        let token = rest.trim();
        (!token.is_empty()).then_some(token)
    } else {
        None
    }
}
