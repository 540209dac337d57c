/*
 * Responsibility
 * - Wire shapes of the authorizer endpoint
 *   - request: gateway authorizer event (REQUEST or TOKEN type)
 *   - response: principalId + policyDocument + context
 */
use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::services::authz::decision::{Decision, DecisionContext, PolicyDocument};

/// Authorizer event as the gateway sends it.
///
/// REQUEST authorizers fill `headers`; TOKEN authorizers put the raw header
/// value into `authorizationToken`. Unknown fields are ignored.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthorizerEvent {
    #[serde(default, rename = "type")]
    pub event_type: Option<String>,
    #[serde(default)]
    pub headers: Option<HashMap<String, String>>,
    #[serde(default)]
    pub authorization_token: Option<String>,
    #[serde(default)]
    pub method_arn: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthorizerResponse {
    pub principal_id: String,
    pub policy_document: PolicyDocument,
    pub context: DecisionContext,
}

impl From<Decision> for AuthorizerResponse {
    fn from(decision: Decision) -> Self {
        Self {
            policy_document: decision.policy_document(),
            principal_id: decision.principal_id,
            context: decision.context,
        }
    }
}
