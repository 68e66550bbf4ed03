//! Engine error taxonomy.
//!
//! Every failure the engine can surface is a variant here. The pipeline
//! wraps action and evaluator errors with the rule id and phase name on the
//! way out, so a caller always sees the full chain in the message.

use thiserror::Error;

/// All errors returned by the rules engine.
#[derive(Debug, Error)]
pub enum EngineError {
    /// A rule pack was supplied without an id.
    #[error("rulePack.id is required")]
    MissingPackId,

    /// A rule pack was supplied without a version.
    #[error("rulePack.version is required")]
    MissingPackVersion,

    /// A path segment failed to parse.
    #[error("invalid path segment '{segment}': {reason}")]
    InvalidPath { segment: String, reason: String },

    /// An action target was empty or parsed to zero segments.
    #[error("invalid target: '{target}'")]
    InvalidTarget { target: String },

    /// Out-of-range index on the typed items array.
    #[error("index out of range: {index}")]
    IndexOutOfRange { index: usize },

    /// A typed slot rejected the value being written.
    #[error("{slot} must be {expected}")]
    TypeMismatch {
        slot: String,
        expected: &'static str,
    },

    /// A numeric leaf rejected a non-numeric value.
    #[error("numeric field must be numeric, got {got}")]
    NonNumeric { got: String },

    /// An action is missing a required part (target, logic, params).
    #[error("{kind} action requires {what}")]
    ActionShape {
        kind: &'static str,
        what: &'static str,
    },

    /// Serialized logic exceeds the size guard.
    #[error("logic exceeds maximum size of {max} bytes")]
    LogicTooLarge { max: usize },

    /// Logic tree exceeds the depth guard.
    #[error("logic exceeds maximum depth of {max}")]
    LogicTooDeep { max: usize },

    /// An operator name not present in the registry.
    #[error("failed to apply jsonlogic: unknown operator '{op}'")]
    UnknownOperator { op: String },

    /// A runtime evaluation failure (bad operands, division by zero, ...).
    #[error("failed to apply jsonlogic: {message}")]
    Logic { message: String },

    /// A wildcard write was driven with fewer indices than wildcard steps.
    #[error("missing wildcard index at position {position}")]
    MissingWildcardIndex { position: usize },

    /// Condition evaluation failed for a rule.
    #[error("failed to evaluate condition for rule {rule_id}: {source}")]
    Condition {
        rule_id: String,
        #[source]
        source: Box<EngineError>,
    },

    /// An action failed while executing.
    #[error("error executing action {kind}: {source}")]
    Action {
        kind: &'static str,
        #[source]
        source: Box<EngineError>,
    },

    /// A rule failed while executing.
    #[error("error executing rule {rule_id}: {source}")]
    Rule {
        rule_id: String,
        #[source]
        source: Box<EngineError>,
    },

    /// A phase failed while executing.
    #[error("error in phase {phase}: {source}")]
    Phase {
        phase: String,
        #[source]
        source: Box<EngineError>,
    },
}

impl EngineError {
    pub fn logic(message: impl Into<String>) -> Self {
        EngineError::Logic {
            message: message.into(),
        }
    }
}
