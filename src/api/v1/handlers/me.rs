/*
 * Responsibility
 * - GET /me: echo the caller's authorization context
 * - Reference consumer of the decision context (userId / role) behind the access middleware
 */
use axum::Json;

use crate::api::v1::extractors::{AuthCtx, AuthCtxExtractor};

pub async fn me(AuthCtxExtractor(ctx): AuthCtxExtractor) -> Json<AuthCtx> {
    tracing::debug!(user_id = %ctx.user_id, role = %ctx.role, "context requested");
    Json(ctx)
}
