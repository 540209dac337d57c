use serde::Serialize;

use super::claims::Claims;

pub const POLICY_VERSION: &str = "2012-10-17";
pub const INVOKE_ACTION: &str = "execute-api:Invoke";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Effect {
    Allow,
    // Never produced by the gate: failures surface as an opaque rejection.
    #[allow(dead_code)]
    Deny,
}

/// Flat, string-valued context handed to the downstream integration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DecisionContext {
    pub user_id: String,
    pub role: String,
    pub email: String,
    pub token_use: String,
}

/// The auditable outcome of a granted request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decision {
    pub effect: Effect,
    pub principal_id: String,
    pub resource: String,
    pub context: DecisionContext,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct PolicyDocument {
    pub version: &'static str,
    pub statement: Vec<Statement>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Statement {
    pub action: &'static str,
    pub effect: Effect,
    pub resource: String,
}

impl Decision {
    /// Single-statement invoke policy for this decision's resource.
    pub fn policy_document(&self) -> PolicyDocument {
        PolicyDocument {
            version: POLICY_VERSION,
            statement: vec![Statement {
                action: INVOKE_ACTION,
                effect: self.effect,
                resource: self.resource.clone(),
            }],
        }
    }
}

/// Turn validated claims into an `Allow` decision for `resource`.
///
/// The principal is the token subject; the role is the effective role the
/// validator checked.
pub fn build(claims: Claims, resource: &str) -> Decision {
    let role = claims.effective_role().to_string();

    Decision {
        effect: Effect::Allow,
        principal_id: claims.sub.clone(),
        resource: resource.to_string(),
        context: DecisionContext {
            user_id: claims.sub,
            role,
            email: claims.email.unwrap_or_default(),
            token_use: claims.token_use.unwrap_or_default(),
        },
    }
}
