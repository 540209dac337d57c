use thiserror::Error;

/// Why a request was not granted.
///
/// Every variant is terminal for the current request. The kind is recorded
/// through the audit sink; callers outside the gate only ever see a single
/// "unauthorized" signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum RejectionKind {
    #[error("no bearer token present")]
    MissingToken,
    #[error("token could not be parsed")]
    MalformedToken,
    #[error("token expired")]
    TokenExpired,
    #[error("issuer mismatch")]
    InvalidIssuer,
    #[error("audience mismatch")]
    InvalidAudience,
    #[error("unsupported token_use")]
    InvalidTokenUse,
    #[error("insufficient privileges")]
    InsufficientPrivileges,
}

impl RejectionKind {
    /// Stable identifier used as a structured log field.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MissingToken => "missing_token",
            Self::MalformedToken => "malformed_token",
            Self::TokenExpired => "token_expired",
            Self::InvalidIssuer => "invalid_issuer",
            Self::InvalidAudience => "invalid_audience",
            Self::InvalidTokenUse => "invalid_token_use",
            Self::InsufficientPrivileges => "insufficient_privileges",
        }
    }
}
