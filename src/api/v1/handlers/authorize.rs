/*
 * Responsibility
 * - POST /authorize: run the gate on a gateway authorizer event
 * - Success: 200 + policy response. Anything else: the opaque 401 body.
 */
use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
};
use chrono::Utc;

use crate::api::v1::dto::authorizer::{AuthorizerEvent, AuthorizerResponse};
use crate::error::AppError;
use crate::services::authz::audit::AuthzEvent;
use crate::state::AppState;

pub async fn authorize(
    State(state): State<AppState>,
    payload: Result<Json<AuthorizerEvent>, JsonRejection>,
) -> Result<Json<AuthorizerResponse>, AppError> {
    // A broken event is a fault, not a decision; it still looks like any other 401.
    let Json(event) = payload.map_err(|rejection| {
        state.gate.audit().record(AuthzEvent::Fault {
            detail: format!("unreadable authorizer event: {}", rejection.body_text()),
        });
        AppError::Unauthorized
    })?;

    tracing::debug!(
        event_type = event.event_type.as_deref().unwrap_or("-"),
        "authorizer event received"
    );

    let headers = event.headers.unwrap_or_default();
    let Some(resource) = event.method_arn.as_deref() else {
        state.gate.audit().record(AuthzEvent::Fault {
            detail: "authorizer event has no methodArn".to_string(),
        });
        return Err(AppError::Unauthorized);
    };

    let decision = state.gate.authorize(
        &headers,
        event.authorization_token.as_deref(),
        resource,
        Utc::now().timestamp(),
    )?;

    Ok(Json(decision.into()))
}
