//! Observability sink for the authorization gate.
//!
//! The gate never logs directly. Each stage reports an `AuthzEvent` to the
//! `AuditSink` it was handed, so tests can assert on what was recorded and the
//! service decides where events end up (`TracingAuditSink` in production).
//!
//! Token material is never part of an event.

use super::extractor::CarrierSource;
use super::rejection::RejectionKind;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthzEvent {
    /// A bearer token was found and normalized.
    TokenExtracted { source: CarrierSource },
    /// The token body was parsed into claims (signature not checked here).
    ClaimsDecoded {
        subject: String,
        token_use: Option<String>,
    },
    /// A single stage refused the token; `detail` is for operators only.
    RuleFailed { kind: RejectionKind, detail: String },
    /// Final outcome: access granted.
    Granted {
        principal: String,
        role: String,
        resource: String,
    },
    /// Final outcome: access refused.
    Rejected {
        kind: RejectionKind,
        resource: String,
    },
    /// Something went wrong outside the rule set (bad request shape, etc.).
    Fault { detail: String },
}

pub trait AuditSink: Send + Sync {
    fn record(&self, event: AuthzEvent);
}

/// Forwards events to `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingAuditSink;

impl AuditSink for TracingAuditSink {
    fn record(&self, event: AuthzEvent) {
        match event {
            AuthzEvent::TokenExtracted { source } => {
                tracing::debug!(source = %source, "bearer token extracted");
            }
            AuthzEvent::ClaimsDecoded { subject, token_use } => {
                tracing::debug!(
                    subject = %subject,
                    token_use = token_use.as_deref().unwrap_or("-"),
                    "token claims decoded"
                );
            }
            AuthzEvent::RuleFailed { kind, detail } => {
                tracing::warn!(kind = kind.as_str(), detail = %detail, "authorization rule failed");
            }
            AuthzEvent::Granted {
                principal,
                role,
                resource,
            } => {
                tracing::info!(
                    principal = %principal,
                    role = %role,
                    resource = %resource,
                    "access granted"
                );
            }
            AuthzEvent::Rejected { kind, resource } => {
                tracing::warn!(kind = kind.as_str(), resource = %resource, "authorization failed");
            }
            AuthzEvent::Fault { detail } => {
                tracing::error!(detail = %detail, "authorization fault");
            }
        }
    }
}

/// Keeps every event in memory.
#[cfg(test)]
#[derive(Debug, Default)]
pub struct MemoryAuditSink {
    events: std::sync::Mutex<Vec<AuthzEvent>>,
}

#[cfg(test)]
impl MemoryAuditSink {
    pub fn events(&self) -> Vec<AuthzEvent> {
        self.events.lock().unwrap().clone()
    }

    /// Kinds of the final `Rejected` events, in order.
    pub fn rejections(&self) -> Vec<RejectionKind> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                AuthzEvent::Rejected { kind, .. } => Some(kind),
                _ => None,
            })
            .collect()
    }

    pub fn faults(&self) -> usize {
        self.events()
            .iter()
            .filter(|e| matches!(e, AuthzEvent::Fault { .. }))
            .count()
    }
}

#[cfg(test)]
impl AuditSink for MemoryAuditSink {
    fn record(&self, event: AuthzEvent) {
        self.events.lock().unwrap().push(event);
    }
}
