//! `multiply`: scale the numeric value at the target path.

use reckon_core::num::{current_f64, number};
use reckon_core::{EngineContext, EngineError, Reason};
use serde_json::{Map, Value};

use super::{operand, ActionOutcome};
use crate::nav::{get_value, set_value};

pub(super) fn execute(
    ctx: &mut EngineContext,
    target: &str,
    value: Option<&Value>,
    logic: Option<&Value>,
    data: &Map<String, Value>,
) -> ActionOutcome {
    if target.is_empty() {
        return Err(EngineError::ActionShape {
            kind: "multiply",
            what: "target",
        });
    }

    let current = get_value(&ctx.state, target)?;
    let multiplier = operand("multiply", value, logic, data)?;
    let result = current_f64(current.as_ref())? * multiplier;
    set_value(&mut ctx.state, target, &number(result)?)?;

    Ok((
        Some(Reason::message(format!(
            "multiplied {target} by {multiplier} (result: {result})"
        ))),
        None,
    ))
}
