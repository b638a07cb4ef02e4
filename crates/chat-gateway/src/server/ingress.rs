//! Internal HTTP ingress
//!
//! Endpoints the message store calls after a durable write, plus read-only
//! introspection. These routes are meant for the private network only.

use crate::gateway::{GatewayStats, UserPresence};
use crate::protocol::MessageNotification;
use crate::server::GatewayState;
use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chat_common::{AppError, ErrorResponse};
use chat_core::UserId;
use serde::Serialize;

/// Error returned by ingress endpoints
#[derive(Debug)]
pub struct IngressError(AppError);

impl From<AppError> for IngressError {
    fn from(err: AppError) -> Self {
        Self(err)
    }
}

impl From<JsonRejection> for IngressError {
    fn from(rejection: JsonRejection) -> Self {
        Self(AppError::invalid_input(rejection.body_text()))
    }
}

impl IntoResponse for IngressError {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.0.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        if status.is_server_error() {
            tracing::error!(error = ?self.0, "Ingress error");
        } else {
            tracing::debug!(error = %self.0, "Ingress request rejected");
        }

        (status, Json(ErrorResponse::from(&self.0))).into_response()
    }
}

/// Result of a fan-out request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FanoutResponse {
    /// Connections the event was queued on
    pub delivered: usize,
}

fn validate(notification: &MessageNotification) -> Result<(), IngressError> {
    if notification.room_id.is_empty() {
        return Err(AppError::invalid_input("roomId must not be empty").into());
    }
    Ok(())
}

/// POST /internal/messages/created
pub async fn message_created(
    State(state): State<GatewayState>,
    payload: Result<Json<MessageNotification>, JsonRejection>,
) -> Result<(StatusCode, Json<FanoutResponse>), IngressError> {
    let Json(notification) = payload?;
    validate(&notification)?;

    let delivered = state
        .gateway()
        .message_created(&notification.room_id, notification.message);

    Ok((StatusCode::ACCEPTED, Json(FanoutResponse { delivered })))
}

/// POST /internal/messages/updated
pub async fn message_updated(
    State(state): State<GatewayState>,
    payload: Result<Json<MessageNotification>, JsonRejection>,
) -> Result<(StatusCode, Json<FanoutResponse>), IngressError> {
    let Json(notification) = payload?;
    validate(&notification)?;

    let delivered = state
        .gateway()
        .message_updated(&notification.room_id, notification.message);

    Ok((StatusCode::ACCEPTED, Json(FanoutResponse { delivered })))
}

/// GET /internal/presence/:user_id
pub async fn user_presence(
    State(state): State<GatewayState>,
    Path(user_id): Path<String>,
) -> Result<Json<UserPresence>, IngressError> {
    let user_id = UserId::new(user_id);
    if user_id.is_empty() {
        return Err(AppError::invalid_input("userId must not be empty").into());
    }

    Ok(Json(state.gateway().presence_of(&user_id)))
}

/// GET /internal/stats
pub async fn stats(State(state): State<GatewayState>) -> Json<GatewayStats> {
    Json(state.gateway().stats())
}
