//! Account and order route handlers.

use axum::extract::{Path, State};
use serde::Serialize;
use tracing::instrument;

use crate::error::Result;
use crate::middleware::{RequireAdmin, RequireAuth};
use crate::models::{Order, User};
use crate::response::{ApiResponse, Empty};
use crate::routes::AppJson;
use crate::services::auth::{
    AuthService, ForgotPasswordForm, LoginForm, ProfileForm, RegisterForm,
};
use crate::services::orders::{OrderService, StatusForm};
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct UserPayload {
    pub user: User,
}

#[derive(Debug, Serialize)]
pub struct LoginPayload {
    pub user: User,
    pub token: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfilePayload {
    pub updated_user: User,
}

/// Guard check result.
#[derive(Debug, Serialize)]
pub struct GuardPayload {
    pub ok: bool,
}

#[derive(Debug, Serialize)]
pub struct OrdersPayload {
    pub orders: Vec<Order>,
}

#[derive(Debug, Serialize)]
pub struct OrderPayload {
    pub order: Order,
}

/// Register a consumer account.
#[instrument(skip_all)]
pub async fn register(
    State(state): State<AppState>,
    AppJson(form): AppJson<RegisterForm>,
) -> Result<ApiResponse<UserPayload>> {
    let user = AuthService::new(state.pool(), state.tokens())
        .register(&form)
        .await?;

    Ok(ApiResponse::created(
        "User registered successfully",
        UserPayload { user },
    ))
}

/// Exchange email and password for a session token.
#[instrument(skip_all)]
pub async fn login(
    State(state): State<AppState>,
    AppJson(form): AppJson<LoginForm>,
) -> Result<ApiResponse<LoginPayload>> {
    let (user, token) = AuthService::new(state.pool(), state.tokens())
        .login(&form)
        .await?;

    Ok(ApiResponse::ok(
        "Login successful",
        LoginPayload { user, token },
    ))
}

/// Reset a password using the security answer.
#[instrument(skip_all)]
pub async fn forgot_password(
    State(state): State<AppState>,
    AppJson(form): AppJson<ForgotPasswordForm>,
) -> Result<ApiResponse<Empty>> {
    AuthService::new(state.pool(), state.tokens())
        .forgot_password(&form)
        .await?;

    Ok(ApiResponse::message("Password reset successfully"))
}

/// Succeeds for any signed-in caller.
pub async fn user_auth(RequireAuth(_): RequireAuth) -> ApiResponse<GuardPayload> {
    ApiResponse::ok("Authorized", GuardPayload { ok: true })
}

/// Succeeds for administrators only.
pub async fn admin_auth(RequireAdmin(_): RequireAdmin) -> ApiResponse<GuardPayload> {
    ApiResponse::ok("Authorized", GuardPayload { ok: true })
}

/// Update the caller's own profile.
#[instrument(skip_all, fields(user_id = %user_id))]
pub async fn update_profile(
    RequireAuth(user_id): RequireAuth,
    State(state): State<AppState>,
    AppJson(form): AppJson<ProfileForm>,
) -> Result<ApiResponse<ProfilePayload>> {
    let updated_user = AuthService::new(state.pool(), state.tokens())
        .update_profile(user_id, &form)
        .await?;

    Ok(ApiResponse::ok(
        "Profile updated successfully",
        ProfilePayload { updated_user },
    ))
}

/// The caller's orders, newest first.
#[instrument(skip_all, fields(user_id = %user_id))]
pub async fn orders(
    RequireAuth(user_id): RequireAuth,
    State(state): State<AppState>,
) -> Result<ApiResponse<OrdersPayload>> {
    let orders = OrderService::new(state.pool()).list_for_buyer(user_id).await?;
    Ok(ApiResponse::ok("Orders", OrdersPayload { orders }))
}

/// Every order, newest first.
#[instrument(skip_all)]
pub async fn all_orders(
    RequireAdmin(_): RequireAdmin,
    State(state): State<AppState>,
) -> Result<ApiResponse<OrdersPayload>> {
    let orders = OrderService::new(state.pool()).list_all().await?;
    Ok(ApiResponse::ok("All orders", OrdersPayload { orders }))
}

/// Move an order to a new status.
#[instrument(skip(state, form))]
pub async fn order_status(
    RequireAdmin(_): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<String>,
    AppJson(form): AppJson<StatusForm>,
) -> Result<ApiResponse<OrderPayload>> {
    let order = OrderService::new(state.pool())
        .set_status(&id, &form)
        .await?;

    Ok(ApiResponse::ok("Order status updated", OrderPayload { order }))
}
