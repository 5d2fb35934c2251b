//! Policy decision contract

use async_trait::async_trait;
use cirrus_core::ExecutionContext;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Policy verdict gating task execution
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    /// Execute the task
    Allow,
    /// Reject the task
    Deny,
    /// Requires out-of-band approval; treated as not-allowed by the core
    Approve,
}

impl std::fmt::Display for Verdict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Verdict::Allow => write!(f, "allow"),
            Verdict::Deny => write!(f, "deny"),
            Verdict::Approve => write!(f, "approve"),
        }
    }
}

/// Outcome of a policy evaluation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PolicyDecision {
    pub decision: Verdict,
    pub reason: Option<String>,
    pub risk_score: Option<u32>,
}

impl PolicyDecision {
    pub fn allow(reason: impl Into<String>) -> Self {
        Self {
            decision: Verdict::Allow,
            reason: Some(reason.into()),
            risk_score: None,
        }
    }

    pub fn deny(reason: impl Into<String>) -> Self {
        Self {
            decision: Verdict::Deny,
            reason: Some(reason.into()),
            risk_score: None,
        }
    }

    pub fn approve(reason: impl Into<String>) -> Self {
        Self {
            decision: Verdict::Approve,
            reason: Some(reason.into()),
            risk_score: None,
        }
    }

    pub fn with_risk_score(mut self, score: u32) -> Self {
        self.risk_score = Some(score);
        self
    }

    pub fn is_allowed(&self) -> bool {
        self.decision == Verdict::Allow
    }
}

/// Security/compliance gate evaluated before every task
///
/// The decision logic lives outside the core; only this contract matters
/// here. Anything other than [`Verdict::Allow`] stops the task before the
/// executor or control plane is touched.
#[async_trait]
pub trait PolicyEngine: Send + Sync {
    async fn evaluate(
        &self,
        subject: &str,
        action: &str,
        resource: &HashMap<String, serde_json::Value>,
        ctx: &ExecutionContext,
    ) -> PolicyDecision;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decision_constructors() {
        let allow = PolicyDecision::allow("safe operation").with_risk_score(10);
        assert!(allow.is_allowed());
        assert_eq!(allow.risk_score, Some(10));

        let deny = PolicyDecision::deny("prod delete");
        assert!(!deny.is_allowed());
        assert_eq!(deny.reason.as_deref(), Some("prod delete"));
    }

    #[test]
    fn test_verdict_serializes_snake_case() {
        assert_eq!(serde_json::to_string(&Verdict::Approve).unwrap(), "\"approve\"");
        assert_eq!(Verdict::Deny.to_string(), "deny");
    }
}
