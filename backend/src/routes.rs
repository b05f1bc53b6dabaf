use axum::{
    middleware as axum_middleware,
    routing::{delete, get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use crate::{docs, handlers, middleware, state::AppState};

pub fn build_router(state: AppState) -> Router {
    // Build public routes (no auth)
    let public_routes = Router::new()
        .route("/api/auth/login", post(handlers::auth::login))
        .route("/api/auth/logout", post(handlers::auth::logout))
        .route("/api/docs/openapi.json", get(docs::openapi_json));

    // Pages and heartbeat resolve the user (with silent refresh) but never reject
    let page_routes = Router::new()
        .route("/", get(handlers::pages::home))
        .route("/api/auth/heartbeat", get(handlers::auth::heartbeat))
        .route_layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::optional_auth,
        ));

    // Build user-protected routes (auth required)
    let user_routes = Router::new()
        .route("/api/auth/me", get(handlers::auth::me))
        .route_layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::auth,
        ));

    // Build admin-protected routes (auth + admin role)
    let admin_routes = Router::new()
        .route(
            "/api/admin/sessions",
            get(handlers::admin::sessions::list_sessions),
        )
        .route(
            "/api/admin/sessions/{id}",
            delete(handlers::admin::sessions::revoke_session),
        )
        .route_layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::auth_admin,
        ));

    Router::new()
        .merge(public_routes)
        .merge(page_routes)
        .merge(user_routes)
        .merge(admin_routes)
        .layer(
            ServiceBuilder::new()
                .layer(axum_middleware::from_fn(middleware::request_id))
                .layer(TraceLayer::new_for_http()),
        )
        .with_state(state)
}
