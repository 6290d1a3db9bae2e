use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};
use std::collections::HashMap;

use crate::{error::AppError, extract::ApiPath, models::user::Identity, state::AppState};

/// Routes reachable without a session token. Matched exactly; a single
/// trailing slash is tolerated.
pub const EXEMPT_ROUTES: &[&str] = &[
    "/users/signin",
    "/users/signup",
    "/users/forgot-password",
    "/users/verify-otp",
    "/users/reset-password",
];

pub const MISSING_HEADER: &str = "Unauthorized Access - No authorization header";
pub const INVALID_TOKEN: &str = "Unauthorized Access - Invalid or expired token";
pub const ADMIN_REQUIRED: &str = "Access denied. Admin privileges required.";
pub const SELF_OR_ADMIN_REQUIRED: &str = "Access denied. You can only access your own data.";

pub fn is_exempt(path: &str) -> bool {
    let path = match path.strip_suffix('/') {
        Some(trimmed) if !trimmed.is_empty() => trimmed,
        _ => path,
    };
    EXEMPT_ROUTES.contains(&path)
}

/// The `Bearer` scheme is optional; a bare value is taken as the token.
pub fn parse_bearer_token(header: &str) -> &str {
    let header = header.trim();
    if let Some(space_idx) = header.find(' ') {
        let (scheme, rest) = header.split_at(space_idx);
        if scheme.eq_ignore_ascii_case("bearer") {
            return rest.trim_start();
        }
    }
    header
}

/// Global gate. Exempt routes pass untouched; everything else needs a valid
/// token and gets its [`Identity`] attached.
pub async fn auth_gate(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    if is_exempt(request.uri().path()) {
        return Ok(next.run(request).await);
    }

    let header_value = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .ok_or_else(|| AppError::Unauthorized(MISSING_HEADER.to_string()))?;

    let token = parse_bearer_token(header_value);
    let identity = state
        .tokens
        .verify(token)
        .ok_or_else(|| AppError::Unauthorized(INVALID_TOKEN.to_string()))?;

    tracing::debug!(user_id = %identity.id, role = identity.role.as_str(), "request authenticated");
    request.extensions_mut().insert(identity);
    Ok(next.run(request).await)
}

pub async fn require_admin(request: Request, next: Next) -> Result<Response, AppError> {
    match request.extensions().get::<Identity>() {
        Some(identity) if identity.is_admin() => Ok(next.run(request).await),
        _ => Err(AppError::Forbidden(ADMIN_REQUIRED.to_string())),
    }
}

/// Lets admins through, and anyone else only when the `user_id` (or `id`)
/// path parameter names them.
pub async fn require_self_or_admin(
    ApiPath(params): ApiPath<HashMap<String, String>>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let identity = request
        .extensions()
        .get::<Identity>()
        .ok_or_else(|| AppError::Unauthorized("Authentication required".to_string()))?;

    let target = params.get("user_id").or_else(|| params.get("id"));
    let is_self = target
        .and_then(|raw| raw.parse::<i64>().ok())
        .is_some_and(|id| id == identity.id.value());

    if identity.is_admin() || is_self {
        Ok(next.run(request).await)
    } else {
        Err(AppError::Forbidden(SELF_OR_ADMIN_REQUIRED.to_string()))
    }
}
