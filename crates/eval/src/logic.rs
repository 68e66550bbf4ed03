//! JsonLogic-compatible expression evaluation.
//!
//! An expression is a literal, a `{"var": ...}` reference, or a single-key
//! object whose key names an operator and whose value is the argument list.
//! Operators are looked up in the process-wide registry; each operator
//! receives its arguments unevaluated and drives its own evaluation, which
//! is what makes `if` lazy and `foreach` able to rebind `item`/`index`.
//!
//! Two guards run before evaluation: the serialized tree must stay under
//! 50 KiB and its nesting depth under 20.

use reckon_core::EngineError;
use serde_json::{Map, Value};

use crate::operators::registry;

pub const MAX_LOGIC_SIZE: usize = 50 * 1024;
pub const MAX_DEPTH: usize = 20;

/// Evaluates a logic tree against a flat data map. This is the entry point
/// used for rule conditions and action logic; both guards run first.
pub fn evaluate(logic: &Value, data: &Map<String, Value>) -> Result<Value, EngineError> {
    let serialized = serde_json::to_vec(logic)
        .map_err(|e| EngineError::logic(format!("failed to serialize logic: {e}")))?;
    if serialized.len() > MAX_LOGIC_SIZE {
        return Err(EngineError::LogicTooLarge {
            max: MAX_LOGIC_SIZE,
        });
    }
    check_depth(logic, 0)?;
    eval_node(logic, data)
}

/// Evaluates one node. Operators re-enter here for sub-expressions; the
/// guards do not re-run because sub-expressions are part of the checked
/// tree.
pub(crate) fn eval_node(node: &Value, data: &Map<String, Value>) -> Result<Value, EngineError> {
    match node {
        Value::Object(m) if m.len() == 1 => {
            // Sole key names the operator, its value is the argument list.
            let (op, args) = m.iter().next().ok_or_else(|| {
                EngineError::logic("empty operator object")
            })?;
            let f = registry()
                .get(op)
                .ok_or_else(|| EngineError::UnknownOperator { op: op.clone() })?;
            f(args, data)
        }
        Value::Array(items) => items
            .iter()
            .map(|item| eval_node(item, data))
            .collect::<Result<Vec<_>, _>>()
            .map(Value::Array),
        literal => Ok(literal.clone()),
    }
}

fn check_depth(node: &Value, depth: usize) -> Result<(), EngineError> {
    if depth > MAX_DEPTH {
        return Err(EngineError::LogicTooDeep { max: MAX_DEPTH });
    }
    match node {
        Value::Object(m) => {
            for v in m.values() {
                check_depth(v, depth + 1)?;
            }
        }
        Value::Array(a) => {
            for v in a {
                check_depth(v, depth + 1)?;
            }
        }
        _ => {}
    }
    Ok(())
}

// ──────────────────────────────────────────────
// Tests
// ──────────────────────────────────────────────
