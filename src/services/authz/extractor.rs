//! Bearer token extraction.
//!
//! Gateways forward the `Authorization` header with whatever casing the client
//! used, and token-type authorizers put the raw value into a separate
//! `authorizationToken` field. This module picks exactly one of those carriers
//! and strips the scheme marker.

use std::collections::HashMap;
use std::fmt;

use axum::http::HeaderMap;

use super::rejection::RejectionKind;

/// Header keys tried in order (exact match).
pub const HEADER_CANDIDATES: [&str; 3] = ["Authorization", "authorization", "AUTHORIZATION"];

/// Where the selected token came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CarrierSource {
    Header(&'static str),
    Legacy,
}

impl fmt::Display for CarrierSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Header(name) => write!(f, "header:{}", name),
            Self::Legacy => write!(f, "authorizationToken"),
        }
    }
}

/// Anything headers can be looked up in by name.
pub trait HeaderSource {
    fn header(&self, name: &str) -> Option<&str>;
}

// Gateway events carry headers as a plain JSON object, so lookups are exact.
impl HeaderSource for HashMap<String, String> {
    fn header(&self, name: &str) -> Option<&str> {
        self.get(name).map(String::as_str)
    }
}

// `HeaderMap` is case-insensitive already; the first candidate finds it.
impl HeaderSource for HeaderMap {
    fn header(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(|v| v.to_str().ok())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BearerToken<'a> {
    pub value: &'a str,
    pub source: CarrierSource,
}

/// Select one carrier value and return the bare token.
///
/// The first non-empty carrier wins, even if nothing is left once the scheme
/// marker is removed. A carrier of just `"Bearer "` is therefore a
/// `MissingToken`, not a fall-through to the legacy field.
pub fn extract<'a, H>(
    headers: &'a H,
    legacy: Option<&'a str>,
) -> Result<BearerToken<'a>, RejectionKind>
where
    H: HeaderSource + ?Sized,
{
    let carrier = HEADER_CANDIDATES
        .iter()
        .find_map(|&name| {
            headers
                .header(name)
                .filter(|v| !v.is_empty())
                .map(|v| (v, CarrierSource::Header(name)))
        })
        .or_else(|| {
            legacy
                .filter(|v| !v.is_empty())
                .map(|v| (v, CarrierSource::Legacy))
        });

    let Some((raw, source)) = carrier else {
        return Err(RejectionKind::MissingToken);
    };

    let value = strip_scheme(raw);
    if value.is_empty() {
        return Err(RejectionKind::MissingToken);
    }

    Ok(BearerToken { value, source })
}

// Only the two common spellings are recognised; "BEARER x" stays as-is.
// The marker includes its space, so trailing whitespace is trimmed last.
fn strip_scheme(raw: &str) -> &str {
    let start = raw.trim_start();
    start
        .strip_prefix("Bearer ")
        .or_else(|| start.strip_prefix("bearer "))
        .unwrap_or(start)
        .trim()
}
