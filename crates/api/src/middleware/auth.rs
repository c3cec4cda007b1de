//! Authentication extractors.
//!
//! Session tokens arrive in the `Authorization` header, either bare or with a
//! `Bearer ` prefix.

use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};

use bazaar_core::UserId;

use crate::db::UserRepository;
use crate::error::{AppError, set_sentry_user};
use crate::state::AppState;

/// Extractor that requires a valid session token.
///
/// # Example
///
/// ```rust,ignore
/// async fn protected_handler(
///     RequireAuth(user_id): RequireAuth,
/// ) -> impl IntoResponse {
///     format!("Hello, {user_id}!")
/// }
/// ```
#[derive(Debug, Clone, Copy)]
pub struct RequireAuth(pub UserId);

/// Extractor that requires a valid session token belonging to an admin.
#[derive(Debug, Clone, Copy)]
pub struct RequireAdmin(pub UserId);

impl FromRequestParts<AppState> for RequireAuth {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts)
            .ok_or_else(|| AppError::Unauthorized("Authorization token is required".into()))?;

        let user_id = state.tokens().verify(token)?;
        set_sentry_user(&user_id);

        Ok(Self(user_id))
    }
}

impl FromRequestParts<AppState> for RequireAdmin {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let RequireAuth(user_id) = RequireAuth::from_request_parts(parts, state).await?;

        let role = UserRepository::new(state.pool())
            .get_role(user_id)
            .await?
            .ok_or_else(|| AppError::Unauthorized("Account no longer exists".into()))?;

        if !role.is_admin() {
            tracing::warn!(user_id = %user_id, "Non-admin attempted admin route");
            return Err(AppError::Forbidden("Admin access required".into()));
        }

        Ok(Self(user_id))
    }
}

/// Read the token from the `Authorization` header.
fn bearer_token(parts: &Parts) -> Option<&str> {
    let value = parts.headers.get(AUTHORIZATION)?.to_str().ok()?.trim();
    let token = match value.strip_prefix("Bearer") {
        Some(rest) if rest.is_empty() || rest.starts_with(char::is_whitespace) => rest.trim(),
        _ => value,
    };
    (!token.is_empty()).then_some(token)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::http::Request;

    use super::*;

    fn parts(header: Option<&str>) -> Parts {
        let mut builder = Request::builder().uri("/api/v1/auth/user-auth");
        if let Some(value) = header {
            builder = builder.header(AUTHORIZATION, value);
        }
        builder.body(()).unwrap().into_parts().0
    }

    #[test]
    fn test_bearer_prefix_is_optional() {
        assert_eq!(bearer_token(&parts(Some("Bearer abc.def.ghi"))), Some("abc.def.ghi"));
        assert_eq!(bearer_token(&parts(Some("abc.def.ghi"))), Some("abc.def.ghi"));
        assert_eq!(bearer_token(&parts(Some("Bearer   abc.def.ghi "))), Some("abc.def.ghi"));
    }

    #[test]
    fn test_missing_or_blank_header() {
        assert_eq!(bearer_token(&parts(None)), None);
        assert_eq!(bearer_token(&parts(Some("Bearer "))), None);
        assert_eq!(bearer_token(&parts(Some("Bearer"))), None);
        assert_eq!(bearer_token(&parts(Some("Bearer    "))), None);
        assert_eq!(bearer_token(&parts(Some("   "))), None);
    }
}
