/*
 * Responsibility
 * - The "authorized context" type handlers see
 * - The access middleware runs the gate and stores it in request extensions
 *
 * Notes
 * - Built from the decision context; handlers never see claims or tokens
 */
use serde::Serialize;

use crate::services::authz::decision::DecisionContext;

/// Context attached to a granted request.
///
/// - `user_id` is the token subject
/// - `role` is the effective role the gate checked
/// - `email` is `None` when the token had none
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthCtx {
    pub user_id: String,
    pub role: String,
    pub email: Option<String>,
    pub token_use: String,
}

impl From<DecisionContext> for AuthCtx {
    fn from(ctx: DecisionContext) -> Self {
        Self {
            user_id: ctx.user_id,
            role: ctx.role,
            email: Some(ctx.email).filter(|e| !e.is_empty()),
            token_use: ctx.token_use,
        }
    }
}
