use serde_json::Value;

use super::audit::{AuditSink, AuthzEvent};
use super::claims::{Claims, TokenUse};
use super::rejection::RejectionKind;

/// Result of running the rule set against a claims set.
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationOutcome {
    Valid { claims: Claims },
    Rejected { reason: RejectionKind },
}

impl ValidationOutcome {
    pub fn into_result(self) -> Result<Claims, RejectionKind> {
        match self {
            Self::Valid { claims } => Ok(claims),
            Self::Rejected { reason } => Err(reason),
        }
    }
}

/// What a token has to satisfy to be granted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationPolicy {
    pub issuer: String,
    /// Checked for `id` tokens only.
    pub audience: Option<String>,
    pub required_role: String,
}

impl ValidationPolicy {
    /// Apply the rules in order and stop at the first failure:
    /// expiration, issuer, audience (id tokens), token_use, role.
    ///
    /// `now` is unix seconds supplied by the caller; the validator never reads
    /// the clock.
    pub fn validate(&self, claims: Claims, now: i64, sink: &dyn AuditSink) -> ValidationOutcome {
        match self.check(&claims, now) {
            Ok(()) => ValidationOutcome::Valid { claims },
            Err((reason, detail)) => {
                sink.record(AuthzEvent::RuleFailed {
                    kind: reason,
                    detail,
                });
                ValidationOutcome::Rejected { reason }
            }
        }
    }

    fn check(&self, claims: &Claims, now: i64) -> Result<(), (RejectionKind, String)> {
        // 1. Expiration. A missing `exp` counts as 0; a token is dead at `exp`.
        let exp = claims.exp.unwrap_or(0);
        if exp <= now {
            return Err((
                RejectionKind::TokenExpired,
                format!("exp {} is not after now {}", exp, now),
            ));
        }

        // 2. Issuer, exact match.
        if claims.iss.as_deref() != Some(self.issuer.as_str()) {
            return Err((
                RejectionKind::InvalidIssuer,
                format!(
                    "expected {}, got {}",
                    self.issuer,
                    claims.iss.as_deref().unwrap_or("<none>")
                ),
            ));
        }

        // 3. Audience. Access tokens carry client_id/scope instead of `aud`.
        if let (Some(TokenUse::Id), Some(expected)) = (claims.token_use(), &self.audience) {
            if !audience_matches(claims.aud.as_ref(), expected) {
                return Err((
                    RejectionKind::InvalidAudience,
                    format!("expected {}, got {}", expected, describe(claims.aud.as_ref())),
                ));
            }
        }

        // 4. Token use.
        if claims.token_use().is_none() {
            return Err((
                RejectionKind::InvalidTokenUse,
                format!(
                    "token_use {}",
                    claims.token_use.as_deref().unwrap_or("<none>")
                ),
            ));
        }

        // 5. Role.
        let role = claims.effective_role();
        if role != self.required_role {
            return Err((
                RejectionKind::InsufficientPrivileges,
                format!(
                    "subject {} has role {}, {} required",
                    claims.sub, role, self.required_role
                ),
            ));
        }

        Ok(())
    }
}

fn audience_matches(aud: Option<&Value>, expected: &str) -> bool {
    matches!(aud, Some(Value::String(s)) if s == expected)
}

fn describe(aud: Option<&Value>) -> String {
    match aud {
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
        None => "<none>".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::authz::audit::MemoryAuditSink;
    use serde_json::{Map, json};

    const NOW: i64 = 1_700_000_000;
    const ISSUER: &str = "https://cognito-idp.eu-west-1.amazonaws.com/eu-west-1_pool";

    fn policy() -> ValidationPolicy {
        ValidationPolicy {
            issuer: ISSUER.to_string(),
            audience: Some("client-1".to_string()),
            required_role: "admin".to_string(),
        }
    }

    fn admin_access() -> Claims {
        Claims {
            exp: Some(NOW + 3600),
            iss: Some(ISSUER.to_string()),
            aud: None,
            token_use: Some("access".to_string()),
            sub: "u1".to_string(),
            role: Some("admin".to_string()),
            email: None,
            extra: Map::new(),
        }
    }

    fn reason(claims: Claims) -> Option<RejectionKind> {
        match policy().validate(claims, NOW, &MemoryAuditSink::default()) {
            ValidationOutcome::Valid { .. } => None,
            ValidationOutcome::Rejected { reason } => Some(reason),
        }
    }

    #[test]
    fn valid_claims_pass_and_are_carried_through() {
        let claims = admin_access();
        let outcome = policy().validate(claims.clone(), NOW, &MemoryAuditSink::default());
        assert_eq!(outcome, ValidationOutcome::Valid { claims });
    }

    #[test]
    fn expiry_boundary_is_exclusive() {
        for (exp, expected) in [
            (NOW + 1, None),
            (NOW, Some(RejectionKind::TokenExpired)),
            (NOW - 1, Some(RejectionKind::TokenExpired)),
        ] {
            let claims = Claims {
                exp: Some(exp),
                ..admin_access()
            };
            assert_eq!(reason(claims), expected, "exp = {exp}");
        }
    }

    #[test]
    fn missing_exp_counts_as_expired() {
        let claims = Claims {
            exp: None,
            ..admin_access()
        };
        assert_eq!(reason(claims), Some(RejectionKind::TokenExpired));
    }

    #[test]
    fn issuer_off_by_one_character_is_rejected() {
        let mut iss = ISSUER.to_string();
        iss.push('x');
        let claims = Claims {
            iss: Some(iss),
            ..admin_access()
        };
        assert_eq!(reason(claims), Some(RejectionKind::InvalidIssuer));

        let claims = Claims {
            iss: None,
            ..admin_access()
        };
        assert_eq!(reason(claims), Some(RejectionKind::InvalidIssuer));
    }

    #[test]
    fn expiry_is_checked_before_issuer() {
        let claims = Claims {
            exp: Some(NOW - 10),
            iss: Some("https://elsewhere".into()),
            ..admin_access()
        };
        assert_eq!(reason(claims), Some(RejectionKind::TokenExpired));
    }

    #[test]
    fn access_tokens_skip_the_audience_check() {
        let claims = Claims {
            aud: Some(json!("some-other-client")),
            ..admin_access()
        };
        assert_eq!(reason(claims), None);
    }

    #[test]
    fn id_tokens_must_match_the_audience() {
        let id = |aud: Option<Value>| Claims {
            token_use: Some("id".into()),
            aud,
            ..admin_access()
        };

        assert_eq!(reason(id(Some(json!("client-1")))), None);
        assert_eq!(
            reason(id(Some(json!("client-2")))),
            Some(RejectionKind::InvalidAudience)
        );
        assert_eq!(reason(id(None)), Some(RejectionKind::InvalidAudience));
        assert_eq!(
            reason(id(Some(json!(["client-1"])))),
            Some(RejectionKind::InvalidAudience)
        );
    }

    #[test]
    fn id_tokens_pass_when_no_audience_is_configured() {
        let policy = ValidationPolicy {
            audience: None,
            ..policy()
        };
        let claims = Claims {
            token_use: Some("id".into()),
            aud: Some(json!("whatever")),
            ..admin_access()
        };
        let outcome = policy.validate(claims, NOW, &MemoryAuditSink::default());
        assert!(matches!(outcome, ValidationOutcome::Valid { .. }));
    }

    #[test]
    fn unknown_or_missing_token_use_is_rejected() {
        for token_use in [Some("refresh"), Some("Access"), None] {
            let claims = Claims {
                token_use: token_use.map(str::to_string),
                ..admin_access()
            };
            assert_eq!(reason(claims), Some(RejectionKind::InvalidTokenUse));
        }
    }

    #[test]
    fn missing_role_defaults_to_reader_and_is_refused() {
        let claims = Claims {
            role: None,
            ..admin_access()
        };
        assert_eq!(reason(claims), Some(RejectionKind::InsufficientPrivileges));
    }

    #[test]
    fn required_role_is_configurable() {
        let policy = ValidationPolicy {
            required_role: "reader".into(),
            ..policy()
        };
        let claims = Claims {
            role: None,
            ..admin_access()
        };
        let outcome = policy.validate(claims, NOW, &MemoryAuditSink::default());
        assert!(matches!(outcome, ValidationOutcome::Valid { .. }));
    }

    #[test]
    fn failures_are_recorded_with_their_kind() {
        let sink = MemoryAuditSink::default();
        let claims = Claims {
            role: Some("reader".into()),
            ..admin_access()
        };
        policy().validate(claims, NOW, &sink);

        assert!(matches!(
            sink.events().as_slice(),
            [AuthzEvent::RuleFailed {
                kind: RejectionKind::InsufficientPrivileges,
                ..
            }]
        ));
    }
}
