//! `set`: write a literal value at the target path.

use reckon_core::{EngineContext, EngineError, Reason};
use serde_json::Value;

use super::ActionOutcome;
use crate::nav::set_value;

pub(super) fn execute(ctx: &mut EngineContext, target: &str, value: &Value) -> ActionOutcome {
    if target.is_empty() {
        return Err(EngineError::ActionShape {
            kind: "set",
            what: "target",
        });
    }

    set_value(&mut ctx.state, target, value)?;

    Ok((Some(Reason::message(format!("set {target} = {value}"))), None))
}
