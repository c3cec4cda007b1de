//! The JSON envelope every response is wrapped in.
//!
//! ```json
//! { "success": true, "message": "All Products", "countTotal": 2, "products": [...] }
//! ```

use std::borrow::Cow;

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;

/// Placeholder payload for envelopes that carry only a message.
#[derive(Debug, Default, Serialize)]
pub struct Empty {}

/// `{success, message, ...payload}`. Payload fields are flattened in.
#[derive(Debug, Serialize)]
pub struct Envelope<T> {
    pub success: bool,
    pub message: Cow<'static, str>,
    #[serde(flatten)]
    pub payload: T,
}

impl Envelope<Empty> {
    /// An error envelope.
    pub fn failure(message: impl Into<Cow<'static, str>>) -> Self {
        Self {
            success: false,
            message: message.into(),
            payload: Empty {},
        }
    }
}

/// A successful response with a status code and envelope.
#[derive(Debug)]
pub struct ApiResponse<T> {
    status: StatusCode,
    body: Envelope<T>,
}

impl<T: Serialize> ApiResponse<T> {
    /// `200 OK` with a payload.
    pub fn ok(message: impl Into<Cow<'static, str>>, payload: T) -> Self {
        Self::with_status(StatusCode::OK, message, payload)
    }

    /// `201 Created` with a payload.
    pub fn created(message: impl Into<Cow<'static, str>>, payload: T) -> Self {
        Self::with_status(StatusCode::CREATED, message, payload)
    }

    fn with_status(status: StatusCode, message: impl Into<Cow<'static, str>>, payload: T) -> Self {
        Self {
            status,
            body: Envelope {
                success: true,
                message: message.into(),
                payload,
            },
        }
    }
}

impl ApiResponse<Empty> {
    /// `200 OK` carrying only a message.
    pub fn message(message: impl Into<Cow<'static, str>>) -> Self {
        Self::ok(message, Empty {})
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}
