use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

use super::audit::{AuditSink, AuthzEvent};
use super::rejection::RejectionKind;

/// Role assumed when a token carries no `custom:role` claim.
pub const DEFAULT_ROLE: &str = "reader";

/// Claims of a user-pool token, as far as the gate cares about them.
///
/// NOTE:
/// - `aud` is kept as `Value` because issuers may send a string or an array;
///   only a string can ever match the configured audience.
/// - `sub` is required: a token without a subject cannot name a principal.
/// - Everything else lands in `extra`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    #[serde(default)]
    pub exp: Option<i64>,
    #[serde(default)]
    pub iss: Option<String>,
    #[serde(default)]
    pub aud: Option<Value>,
    #[serde(default)]
    pub token_use: Option<String>,

    pub sub: String,

    #[serde(default, rename = "custom:role")]
    pub role: Option<String>,
    #[serde(default)]
    pub email: Option<String>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Claims {
    /// `custom:role`, or `reader` when absent.
    pub fn effective_role(&self) -> &str {
        self.role.as_deref().unwrap_or(DEFAULT_ROLE)
    }

    /// Parsed `token_use`, if it is one of the two accepted values.
    pub fn token_use(&self) -> Option<TokenUse> {
        self.token_use.as_deref().and_then(TokenUse::parse)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenUse {
    Access,
    Id,
}

impl TokenUse {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "access" => Some(Self::Access),
            "id" => Some(Self::Id),
            _ => None,
        }
    }
}

#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("expected 3 segments, found {0}")]
    SegmentCount(usize),
    #[error("{0} segment is not base64url")]
    Encoding(&'static str),
    #[error("{0} segment is not JSON: {1}")]
    Json(&'static str, #[source] serde_json::Error),
    #[error("{0} segment is not a JSON object")]
    NotAnObject(&'static str),
    #[error("claims have unexpected shape: {0}")]
    Shape(#[source] serde_json::Error),
}

/// Parse the claims of a compact JWT.
///
/// Neither the signature nor `exp` is checked here. Signature verification is
/// the job of the `SignatureVerifier` that runs before this; expiry belongs to
/// the validator.
pub fn decode_unverified(token: &str) -> Result<Claims, DecodeError> {
    let segments: Vec<&str> = token.split('.').collect();
    let [header, payload, _signature] = segments.as_slice() else {
        return Err(DecodeError::SegmentCount(segments.len()));
    };

    // The header only has to be a JSON object; its `alg` is the verifier's concern.
    decode_object(header, "header")?;
    let payload = decode_object(payload, "payload")?;

    serde_json::from_value(payload).map_err(DecodeError::Shape)
}

/// `decode_unverified`, reporting failures to `sink` as `MalformedToken`.
pub fn decode(token: &str, sink: &dyn AuditSink) -> Result<Claims, RejectionKind> {
    match decode_unverified(token) {
        Ok(claims) => {
            sink.record(AuthzEvent::ClaimsDecoded {
                subject: claims.sub.clone(),
                token_use: claims.token_use.clone(),
            });
            Ok(claims)
        }
        Err(err) => {
            sink.record(AuthzEvent::RuleFailed {
                kind: RejectionKind::MalformedToken,
                detail: err.to_string(),
            });
            Err(RejectionKind::MalformedToken)
        }
    }
}

fn decode_object(segment: &str, name: &'static str) -> Result<Value, DecodeError> {
    // Some encoders keep the padding; accept it.
    let bytes = URL_SAFE_NO_PAD
        .decode(segment.trim_end_matches('='))
        .map_err(|_| DecodeError::Encoding(name))?;
    let value: Value = serde_json::from_slice(&bytes).map_err(|e| DecodeError::Json(name, e))?;
    if !value.is_object() {
        return Err(DecodeError::NotAnObject(name));
    }
    Ok(value)
}
