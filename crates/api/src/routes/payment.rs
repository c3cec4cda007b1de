//! Payment route handlers.

use axum::extract::State;
use serde::Serialize;
use tracing::instrument;

use bazaar_core::OrderId;

use crate::error::Result;
use crate::middleware::RequireAuth;
use crate::payments::ClientToken;
use crate::response::ApiResponse;
use crate::routes::AppJson;
use crate::services::orders::{CheckoutService, PaymentForm};
use crate::state::AppState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentPayload {
    pub ok: bool,
    pub order_id: OrderId,
}

/// Issue a client token for the browser drop-in.
#[instrument(skip_all)]
pub async fn token(State(state): State<AppState>) -> Result<ApiResponse<ClientToken>> {
    let token = CheckoutService::new(state.pool(), state.gateway())
        .client_token()
        .await?;
    Ok(ApiResponse::ok("Client token issued", token))
}

/// Charge the cart and record the order.
#[instrument(skip_all, fields(user_id = %user_id))]
pub async fn checkout(
    RequireAuth(user_id): RequireAuth,
    State(state): State<AppState>,
    AppJson(form): AppJson<PaymentForm>,
) -> Result<ApiResponse<PaymentPayload>> {
    let receipt = CheckoutService::new(state.pool(), state.gateway())
        .checkout(user_id, &form)
        .await?;

    Ok(ApiResponse::ok(
        "Payment completed",
        PaymentPayload {
            ok: true,
            order_id: receipt.order_id,
        },
    ))
}
