/// Factory: build the `AuthorizerGate` from application `Config`.
use std::sync::Arc;

use crate::config::{Config, ConfigError, SignatureMode};
use crate::services::authz::AuthorizerGate;
use crate::services::authz::audit::AuditSink;
use crate::services::authz::signature::{JwksVerifier, SignatureVerifier, SkipVerification};
use crate::services::authz::validator::ValidationPolicy;

pub fn build_gate(
    config: &Config,
    audit: Arc<dyn AuditSink>,
) -> Result<Arc<AuthorizerGate>, ConfigError> {
    let policy = ValidationPolicy {
        issuer: config.expected_issuer(),
        audience: config.client_id.clone(),
        required_role: config.required_role.clone(),
    };

    let verifier: Arc<dyn SignatureVerifier> = match &config.signature_mode {
        SignatureMode::Skip => {
            tracing::warn!(
                "token signatures are NOT verified (SIGNATURE_VERIFICATION=skip); \
                 claims are trusted as presented. Do not run this in production."
            );
            Arc::new(SkipVerification)
        }
        SignatureMode::Jwks { path } => {
            let json = std::fs::read_to_string(path).map_err(|e| {
                tracing::error!(error = %e, path = %path.display(), "failed to read JWKS");
                ConfigError::Invalid("JWKS_PATH")
            })?;
            let verifier = JwksVerifier::from_json(&json).map_err(|e| {
                tracing::error!(error = %e, path = %path.display(), "failed to load JWKS");
                ConfigError::Invalid("JWKS_PATH")
            })?;
            tracing::info!(keys = verifier.key_count(), "JWKS signature verification enabled");
            Arc::new(verifier)
        }
    };

    Ok(Arc::new(AuthorizerGate::new(policy, verifier, audit)))
}
