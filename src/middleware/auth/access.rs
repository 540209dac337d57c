//! Gate-protected routes: run the authorizer on the incoming request and put
//! the resulting `AuthCtx` into request extensions.
//!
//! - The token comes from the real `Authorization` header (no legacy field here).
//! - The resource is `"<METHOD> <path>"`.
//! - Every failure is the same 401; the reason is recorded by the gate.

use axum::{
    Router,
    body::Body,
    extract::{OriginalUri, State},
    http::Request,
    middleware::{self, Next},
    response::Response,
};
use chrono::Utc;

use crate::api::v1::extractors::AuthCtx;
use crate::error::AppError;
use crate::state::AppState;

/// Apply the access middleware to `router`.
///
/// Example:
/// ```ignore
/// let protected = Router::new().route("/me", get(me));
/// let protected = middleware::auth::access::apply(protected, state.clone());
/// ```
pub fn apply(router: Router<AppState>, state: AppState) -> Router<AppState> {
    // axum 0.8 `from_fn` cannot take a State extractor, so pass the state explicitly
    router.layer(middleware::from_fn_with_state(state, access_middleware))
}

async fn access_middleware(
    State(state): State<AppState>,
    OriginalUri(original_uri): OriginalUri,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    // Nested routers see a stripped path; the resource names the full one.
    let resource = format!("{} {}", req.method(), original_uri.path());

    let decision = state
        .gate
        .authorize(req.headers(), None, &resource, Utc::now().timestamp())?;

    // middleware → extractor hand-off
    req.extensions_mut().insert(AuthCtx::from(decision.context));

    Ok(next.run(req).await)
}
