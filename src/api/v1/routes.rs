/*
 * Responsibility
 * - URL layout of v1
 * - /health and /authorize are public (the gateway calls /authorize with the token in the body)
 * - /me sits behind the access middleware
 */
use axum::{
    Router,
    routing::{get, post},
};

use crate::api::v1::handlers::{authorize::authorize, health::health, me::me};
use crate::middleware;
use crate::state::AppState;

pub fn routes(state: AppState) -> Router<AppState> {
    let protected = Router::new().route("/me", get(me));
    let protected = middleware::auth::access::apply(protected, state);

    Router::new()
        .route("/health", get(health))
        .route("/authorize", post(authorize))
        .merge(protected)
}
