use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Json, Response},
};
use serde_json::json;

use crate::services::auth_service::ADMIN_ROLE;
use crate::AppState;

fn reject(status: StatusCode, code: &str) -> Response {
    (status, Json(json!({ "error": code }))).into_response()
}

fn bearer_token(req: &Request) -> std::result::Result<&str, &'static str> {
    let header = req
        .headers()
        .get(axum::http::header::AUTHORIZATION)
        .ok_or("missing_authorization")?;
    let value = header.to_str().map_err(|_| "bad_authorization")?;
    value.strip_prefix("Bearer ").ok_or("unsupported_scheme")
}

/// Admits requests carrying a valid admin token and stores its claims as a request extension.
pub async fn require_admin(State(state): State<AppState>, mut req: Request, next: Next) -> Response {
    let token = match bearer_token(&req) {
        Ok(token) => token,
        Err(code) => return reject(StatusCode::UNAUTHORIZED, code),
    };

    match state.auth.verify(token) {
        Ok(claims) => {
            let role = claims.role.clone().unwrap_or_default();
            if !role.eq_ignore_ascii_case(ADMIN_ROLE) {
                return reject(StatusCode::FORBIDDEN, "forbidden");
            }
            req.extensions_mut().insert(claims);
            next.run(req).await
        }
        Err(_) => reject(StatusCode::UNAUTHORIZED, "invalid_token"),
    }
}
