//! `validate`: evaluate a check and record a violation when it trips.
//!
//! A boolean `true` result means the check detected a problem; any other
//! result (including truthy non-booleans) records nothing. Execution
//! continues after a violation.

use reckon_core::{has_logic, EngineError, Violation};
use serde_json::{Map, Value};

use super::ActionOutcome;
use crate::logic::evaluate;

pub(super) fn execute(
    logic: &Value,
    params: &Map<String, Value>,
    data: &Map<String, Value>,
) -> ActionOutcome {
    if !has_logic(logic) {
        return Err(EngineError::ActionShape {
            kind: "validate",
            what: "logic",
        });
    }

    let outcome = evaluate(logic, data)?;
    if outcome != Value::Bool(true) {
        return Ok((None, None));
    }

    let field = str_param(params, "field");
    let code = str_param(params, "code");
    let message = str_param(params, "message");
    if field.is_empty() || code.is_empty() {
        return Err(EngineError::ActionShape {
            kind: "validate",
            what: "field and code in params",
        });
    }

    Ok((
        None,
        Some(Violation {
            field,
            code,
            message,
        }),
    ))
}

fn str_param(params: &Map<String, Value>, key: &str) -> String {
    params
        .get(key)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}
