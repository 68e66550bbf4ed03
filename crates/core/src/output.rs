//! Execution outputs: trace records, validation failures, and the combined
//! result envelope.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Trace record of a rule executing and what it did.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reason {
    #[serde(default)]
    pub rule_id: String,
    #[serde(default)]
    pub phase: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub message: String,
}

impl Reason {
    /// A reason carrying only a message; the pipeline stamps rule and phase.
    pub fn message(message: impl Into<String>) -> Self {
        Reason {
            rule_id: String::new(),
            phase: String::new(),
            message: message.into(),
        }
    }
}

/// Record of a failed validate check.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Violation {
    pub field: String,
    pub code: String,
    pub message: String,
}

/// Everything a single engine invocation produces.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunOutput {
    pub state_fragment: Map<String, Value>,
    pub server_delta: Map<String, Value>,
    pub reasons: Vec<Reason>,
    pub violations: Vec<Violation>,
    pub rules_version: String,
}
