//! Signature verification collaborator.
//!
//! The gate decodes claims without looking at the signature. Whoever builds
//! the gate decides what runs before that: `JwksVerifier` checks the token
//! against a key set fetched out of band, `SkipVerification` accepts anything
//! and must not be used in production.

use std::fmt;

use jsonwebtoken::{Algorithm, DecodingKey, Validation, jwk::JwkSet};
use thiserror::Error;

pub trait SignatureVerifier: Send + Sync {
    fn verify(&self, token: &str) -> Result<(), SignatureError>;

    /// Whether this verifier actually checks anything.
    fn is_enforcing(&self) -> bool {
        true
    }
}

#[derive(Debug, Error)]
pub enum SignatureError {
    #[error("invalid token header: {0}")]
    Header(#[source] jsonwebtoken::errors::Error),
    #[error("no signing key for kid {0:?}")]
    UnknownKey(Option<String>),
    #[error("token alg {found:?} does not match key alg {expected:?}")]
    AlgorithmMismatch { expected: Algorithm, found: Algorithm },
    #[error("signature verification failed: {0}")]
    Invalid(#[source] jsonwebtoken::errors::Error),
}

#[derive(Debug, Error)]
pub enum JwksError {
    #[error("invalid JWKS document: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("unusable key {kid:?}: {source}")]
    Key {
        kid: Option<String>,
        #[source]
        source: jsonwebtoken::errors::Error,
    },
    #[error("JWKS contains no keys")]
    Empty,
}

/// Accepts every token.
#[derive(Debug, Clone, Copy, Default)]
pub struct SkipVerification;

impl SignatureVerifier for SkipVerification {
    fn verify(&self, _token: &str) -> Result<(), SignatureError> {
        Ok(())
    }

    fn is_enforcing(&self) -> bool {
        false
    }
}

/// Verifies signatures against a static JWKS document.
///
/// Keys are converted once at construction so a bad key set fails at startup,
/// not per request. A key that declares `alg` only verifies tokens signed
/// with that algorithm. Claims are not validated here.
#[derive(Clone)]
pub struct JwksVerifier {
    keys: Vec<VerifyingKey>,
}

#[derive(Clone)]
struct VerifyingKey {
    kid: Option<String>,
    alg: Option<Algorithm>,
    key: DecodingKey,
}

impl fmt::Debug for JwksVerifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Key material stays out of logs
        let kids: Vec<_> = self.keys.iter().map(|k| &k.kid).collect();
        f.debug_struct("JwksVerifier").field("kids", &kids).finish()
    }
}

impl JwksVerifier {
    pub fn from_json(json: &str) -> Result<Self, JwksError> {
        let set: JwkSet = serde_json::from_str(json)?;

        let keys = set
            .keys
            .iter()
            .map(|jwk| {
                let kid = jwk.common.key_id.clone();
                // Encryption algorithms (RSA-OAEP, ...) have no signing counterpart.
                let alg = jwk
                    .common
                    .key_algorithm
                    .map(|alg| alg.to_string().parse::<Algorithm>())
                    .transpose();
                alg.and_then(|alg| DecodingKey::from_jwk(jwk).map(|key| (alg, key)))
                    .map(|(alg, key)| VerifyingKey {
                        kid: kid.clone(),
                        alg,
                        key,
                    })
                    .map_err(|source| JwksError::Key { kid, source })
            })
            .collect::<Result<Vec<_>, _>>()?;

        if keys.is_empty() {
            return Err(JwksError::Empty);
        }

        Ok(Self { keys })
    }

    pub fn key_count(&self) -> usize {
        self.keys.len()
    }

    // Without a `kid`, only an unambiguous single-key set is usable.
    fn key_for(&self, kid: Option<&str>) -> Option<&VerifyingKey> {
        match kid {
            Some(kid) => self.keys.iter().find(|k| k.kid.as_deref() == Some(kid)),
            None if self.keys.len() == 1 => self.keys.first(),
            None => None,
        }
    }
}

impl SignatureVerifier for JwksVerifier {
    fn verify(&self, token: &str) -> Result<(), SignatureError> {
        let header = jsonwebtoken::decode_header(token).map_err(SignatureError::Header)?;

        let entry = self
            .key_for(header.kid.as_deref())
            .ok_or_else(|| SignatureError::UnknownKey(header.kid.clone()))?;

        if let Some(expected) = entry.alg.filter(|&alg| alg != header.alg) {
            return Err(SignatureError::AlgorithmMismatch {
                expected,
                found: header.alg,
            });
        }

        // Signature only. exp/iss/aud are the validator's job and must not
        // short-circuit here with a different rejection kind.
        let mut validation = Validation::new(header.alg);
        validation.validate_exp = false;
        validation.validate_aud = false;
        validation.required_spec_claims.clear();

        jsonwebtoken::decode::<serde_json::Value>(token, &entry.key, &validation)
            .map_err(SignatureError::Invalid)?;

        Ok(())
    }
}
