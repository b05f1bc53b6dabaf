use axum::{extract::Extension, response::Html};

use crate::{middleware::auth::CurrentUser, models::user::ADMIN_ROLE};

/// Landing page reflecting who the request resolved to, after any silent
/// refresh.
pub async fn home(Extension(current): Extension<CurrentUser>) -> Html<String> {
    let body = match current.0 {
        Some(claims) => {
            let admin_link = if claims.has_role(ADMIN_ROLE) {
                r#"<p><a href="/api/admin/sessions">Active sessions</a></p>"#
            } else {
                ""
            };
            format!(
                "<p>Signed in as <strong>{}</strong>.</p>{}<form method=\"post\" action=\"/api/auth/logout\"><button>Sign out</button></form>",
                escape_html(&claims.sub),
                admin_link
            )
        }
        None => "<p>You are not signed in.</p>".to_string(),
    };
    Html(format!(
        "<!doctype html><html><head><title>Portal</title></head><body>{}</body></html>",
        body
    ))
}

fn escape_html(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for ch in raw.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            other => escaped.push(other),
        }
    }
    escaped
}
