use std::fmt;
use std::sync::Arc;

use super::audit::{AuditSink, AuthzEvent};
use super::claims;
use super::decision::{self, Decision};
use super::extractor::{self, HeaderSource};
use super::rejection::RejectionKind;
use super::signature::SignatureVerifier;
use super::validator::ValidationPolicy;

/// Token-claims authorization gate.
///
/// extract → verify signature → decode → validate → decide. The gate holds
/// configuration only; every call is independent and may run concurrently.
#[derive(Clone)]
pub struct AuthorizerGate {
    policy: ValidationPolicy,
    verifier: Arc<dyn SignatureVerifier>,
    audit: Arc<dyn AuditSink>,
}

impl fmt::Debug for AuthorizerGate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthorizerGate")
            .field("policy", &self.policy)
            .field("verifies_signatures", &self.verifier.is_enforcing())
            .finish()
    }
}

impl AuthorizerGate {
    pub fn new(
        policy: ValidationPolicy,
        verifier: Arc<dyn SignatureVerifier>,
        audit: Arc<dyn AuditSink>,
    ) -> Self {
        Self {
            policy,
            verifier,
            audit,
        }
    }

    pub fn policy(&self) -> &ValidationPolicy {
        &self.policy
    }

    /// The sink this gate reports to. Boundary code records its own faults here.
    pub fn audit(&self) -> &dyn AuditSink {
        self.audit.as_ref()
    }

    /// Decide whether the bearer token in `headers` (or `legacy`) may invoke
    /// `resource` at unix time `now`.
    ///
    /// The returned kind is for internal use; callers must collapse every
    /// `Err` into the same unauthorized response.
    pub fn authorize<H>(
        &self,
        headers: &H,
        legacy: Option<&str>,
        resource: &str,
        now: i64,
    ) -> Result<Decision, RejectionKind>
    where
        H: HeaderSource + ?Sized,
    {
        let result = self.evaluate(headers, legacy, resource, now);

        match &result {
            Ok(decision) => self.audit.record(AuthzEvent::Granted {
                principal: decision.principal_id.clone(),
                role: decision.context.role.clone(),
                resource: decision.resource.clone(),
            }),
            Err(kind) => self.audit.record(AuthzEvent::Rejected {
                kind: *kind,
                resource: resource.to_string(),
            }),
        }

        result
    }

    fn evaluate<H>(
        &self,
        headers: &H,
        legacy: Option<&str>,
        resource: &str,
        now: i64,
    ) -> Result<Decision, RejectionKind>
    where
        H: HeaderSource + ?Sized,
    {
        let token = extractor::extract(headers, legacy)?;
        self.audit.record(AuthzEvent::TokenExtracted {
            source: token.source,
        });

        if let Err(err) = self.verifier.verify(token.value) {
            self.audit.record(AuthzEvent::RuleFailed {
                kind: RejectionKind::MalformedToken,
                detail: err.to_string(),
            });
            return Err(RejectionKind::MalformedToken);
        }

        let claims = claims::decode(token.value, self.audit.as_ref())?;
        let claims = self
            .policy
            .validate(claims, now, self.audit.as_ref())
            .into_result()?;

        Ok(decision::build(claims, resource))
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use crate::services::authz::audit::MemoryAuditSink;
    use crate::services::authz::decision::Effect;
    use crate::services::authz::extractor::CarrierSource;
    use crate::services::authz::signature::{SignatureError, SkipVerification};
    use crate::services::authz::testing::{ISSUER, admin_claims, unsigned_token};
    use serde_json::json;

    const NOW: i64 = 1_700_000_000;
    const ARN: &str = "arn:aws:execute-api:eu-west-1:123456789012:abc/prod/GET/patients";

    struct RejectAll;

    impl SignatureVerifier for RejectAll {
        fn verify(&self, _token: &str) -> Result<(), SignatureError> {
            Err(SignatureError::UnknownKey(None))
        }
    }

    fn gate_with(verifier: Arc<dyn SignatureVerifier>) -> (AuthorizerGate, Arc<MemoryAuditSink>) {
        let sink = Arc::new(MemoryAuditSink::default());
        let policy = ValidationPolicy {
            issuer: ISSUER.to_string(),
            audience: None,
            required_role: "admin".to_string(),
        };
        (AuthorizerGate::new(policy, verifier, sink.clone()), sink)
    }

    fn gate() -> (AuthorizerGate, Arc<MemoryAuditSink>) {
        gate_with(Arc::new(SkipVerification))
    }

    fn bearer(token: &str) -> HashMap<String, String> {
        HashMap::from([("Authorization".to_string(), format!("Bearer {token}"))])
    }

    #[test]
    fn admin_access_token_is_allowed() {
        let (gate, sink) = gate();
        let token = unsigned_token(&admin_claims(NOW + 3600));

        let decision = gate.authorize(&bearer(&token), None, ARN, NOW).unwrap();

        assert_eq!(decision.effect, Effect::Allow);
        assert_eq!(decision.principal_id, "u1");
        assert_eq!(decision.resource, ARN);
        assert_eq!(decision.context.user_id, "u1");
        assert_eq!(decision.context.role, "admin");
        assert_eq!(decision.context.token_use, "access");

        let events = sink.events();
        assert_eq!(
            events.first(),
            Some(&AuthzEvent::TokenExtracted {
                source: CarrierSource::Header("Authorization")
            })
        );
        assert!(matches!(events.last(), Some(AuthzEvent::Granted { .. })));
        assert!(sink.rejections().is_empty());
    }

    #[test]
    fn reader_is_refused_and_the_reason_is_recorded() {
        let (gate, sink) = gate();
        let mut claims = admin_claims(NOW + 3600);
        claims["custom:role"] = json!("reader");
        let token = unsigned_token(&claims);

        let result = gate.authorize(&bearer(&token), None, ARN, NOW);

        assert_eq!(result, Err(RejectionKind::InsufficientPrivileges));
        assert_eq!(sink.rejections(), vec![RejectionKind::InsufficientPrivileges]);
    }

    #[test]
    fn no_carrier_is_missing_token() {
        let (gate, sink) = gate();
        let result = gate.authorize(&HashMap::<String, String>::new(), None, ARN, NOW);

        assert_eq!(result, Err(RejectionKind::MissingToken));
        assert_eq!(sink.rejections(), vec![RejectionKind::MissingToken]);
    }

    #[test]
    fn scheme_without_token_is_missing_token() {
        let (gate, sink) = gate();
        let headers = HashMap::from([("Authorization".to_string(), "Bearer ".to_string())]);

        let result = gate.authorize(&headers, None, ARN, NOW);

        assert_eq!(result, Err(RejectionKind::MissingToken));
        assert_eq!(sink.rejections(), vec![RejectionKind::MissingToken]);
    }

    #[test]
    fn legacy_field_carries_the_token() {
        let (gate, _) = gate();
        let token = unsigned_token(&admin_claims(NOW + 60));
        let legacy = format!("Bearer {token}");

        let decision = gate
            .authorize(&HashMap::<String, String>::new(), Some(&legacy), ARN, NOW)
            .unwrap();
        assert_eq!(decision.principal_id, "u1");
    }

    #[test]
    fn garbage_token_is_malformed() {
        let (gate, sink) = gate();
        let result = gate.authorize(&bearer("not-a-jwt"), None, ARN, NOW);

        assert_eq!(result, Err(RejectionKind::MalformedToken));
        assert_eq!(sink.rejections(), vec![RejectionKind::MalformedToken]);
    }

    #[test]
    fn failed_signature_check_stops_before_decoding() {
        let (gate, sink) = gate_with(Arc::new(RejectAll));
        let token = unsigned_token(&admin_claims(NOW + 3600));

        let result = gate.authorize(&bearer(&token), None, ARN, NOW);

        assert_eq!(result, Err(RejectionKind::MalformedToken));
        assert!(
            !sink
                .events()
                .iter()
                .any(|e| matches!(e, AuthzEvent::ClaimsDecoded { .. }))
        );
    }

    #[test]
    fn token_expiring_now_is_rejected() {
        let (gate, sink) = gate();
        let token = unsigned_token(&admin_claims(NOW));

        assert_eq!(
            gate.authorize(&bearer(&token), None, ARN, NOW),
            Err(RejectionKind::TokenExpired)
        );
        assert_eq!(sink.rejections(), vec![RejectionKind::TokenExpired]);
    }

    #[test]
    fn calls_are_independent() {
        let (gate, sink) = gate();
        let good = unsigned_token(&admin_claims(NOW + 3600));

        assert!(gate.authorize(&bearer("bad"), None, ARN, NOW).is_err());
        assert!(gate.authorize(&bearer(&good), None, ARN, NOW).is_ok());
        assert_eq!(sink.rejections(), vec![RejectionKind::MalformedToken]);
    }
}
