/*
 * Responsibility
 * - Public interface of the middleware layer (re-exports)
 */
pub mod auth;
pub mod http;
