use axum::Json;
use utoipa::OpenApi;

use crate::{
    handlers,
    models::{
        session::SessionResponse,
        user::{CurrentUserResponse, HeartbeatResponse, LoginRequest},
    },
};

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::auth::login,
        handlers::auth::logout,
        handlers::auth::me,
        handlers::auth::heartbeat,
        handlers::admin::sessions::list_sessions,
        handlers::admin::sessions::revoke_session,
    ),
    components(schemas(
        LoginRequest,
        CurrentUserResponse,
        HeartbeatResponse,
        SessionResponse,
    )),
    tags(
        (name = "auth", description = "Login, logout and session status"),
        (name = "admin", description = "Session registry administration")
    )
)]
pub struct ApiDoc;

pub async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}
