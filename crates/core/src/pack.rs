//! Rule-pack model: phases, rules, actions, context metadata.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::EngineError;

/// A versioned collection of rule phases; the program the engine interprets.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RulePack {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub phases: Vec<RulePhase>,
}

impl RulePack {
    /// Checks the pack carries the required identity fields.
    pub fn validate(&self) -> Result<(), EngineError> {
        if self.id.is_empty() {
            return Err(EngineError::MissingPackId);
        }
        if self.version.is_empty() {
            return Err(EngineError::MissingPackVersion);
        }
        Ok(())
    }
}

/// A named group of rules sharing a position in the pipeline order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RulePhase {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub rules: Vec<Rule>,
}

/// A condition plus a sequence of actions; the atomic unit of execution.
///
/// Rules are disabled unless `enabled` is set, and sort by ascending
/// `priority` within their phase (equal priorities keep declaration order).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Rule {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub phase: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<Value>,
    #[serde(default)]
    pub actions: Vec<Action>,
    #[serde(default)]
    pub priority: i64,
    #[serde(default)]
    pub enabled: bool,
}

/// One data-manipulation step of a rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Action {
    /// Write a literal value at `target`.
    Set {
        #[serde(default)]
        target: String,
        #[serde(default)]
        value: Value,
    },
    /// Evaluate `logic` and write the result at `target`; wildcard targets
    /// re-evaluate per matched element.
    Compute {
        #[serde(default)]
        target: String,
        #[serde(default)]
        logic: Value,
    },
    /// Increment the numeric value at `target` by `value` or by `logic`.
    Add {
        #[serde(default)]
        target: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        value: Option<Value>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        logic: Option<Value>,
    },
    /// Multiply the numeric value at `target` by `value` or by `logic`.
    Multiply {
        #[serde(default)]
        target: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        value: Option<Value>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        logic: Option<Value>,
    },
    /// Evaluate `logic`; a boolean `true` result records a violation built
    /// from `params` (`field` and `code` required, `message` optional).
    Validate {
        #[serde(default)]
        target: String,
        #[serde(default)]
        logic: Value,
        #[serde(default)]
        params: Map<String, Value>,
    },
}

impl Action {
    pub fn kind(&self) -> &'static str {
        match self {
            Action::Set { .. } => "set",
            Action::Compute { .. } => "compute",
            Action::Add { .. } => "add",
            Action::Multiply { .. } => "multiply",
            Action::Validate { .. } => "validate",
        }
    }
}

/// Returns whether a logic slot actually carries an expression. Null and
/// empty objects count as absent.
pub fn has_logic(logic: &Value) -> bool {
    match logic {
        Value::Null => false,
        Value::Object(m) => !m.is_empty(),
        _ => true,
    }
}

/// Read-only invocation metadata, exposed to expressions under `context`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ContextMeta {
    pub tenant_id: String,
    pub user_id: String,
    pub locale: String,
}
