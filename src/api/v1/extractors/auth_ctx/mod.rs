/*!
 * Authorization context extractor
 *
 * Responsibility:
 * - Hand the context of a granted request (AuthCtx) to handlers
 * - axum-specific code lives in core, the type in types
 *
 * Public API:
 * - AuthCtx
 * - AuthCtxExtractor
 */

mod core;
mod types;

pub use self::core::AuthCtxExtractor;
pub use types::AuthCtx;
