//! The five action kinds: `set`, `compute`, `add`, `multiply`, `validate`.
//!
//! Each action produces at most one Reason and at most one Violation.
//! Unrecoverable failures propagate as errors and abort the enclosing rule.

mod add;
mod compute;
mod multiply;
mod set;
mod validate;

use reckon_core::num::lenient_f64;
use reckon_core::{has_logic, Action, EngineContext, EngineError, Reason, Violation};
use serde_json::{Map, Value};
use tracing::debug;

use crate::data::build_evaluation_data;
use crate::logic::evaluate;
use crate::pipeline::ActionRunner;

/// The action implementation handed to the pipeline.
#[derive(Debug, Clone, Copy, Default)]
pub struct Executor;

impl Executor {
    pub fn new() -> Self {
        Executor
    }
}

impl ActionRunner for Executor {
    fn execute(
        &self,
        ctx: &mut EngineContext,
        actions: &[Action],
    ) -> Result<(Vec<Reason>, Vec<Violation>), EngineError> {
        let mut reasons = Vec::new();
        let mut violations = Vec::new();
        for action in actions {
            let (reason, violation) = execute_action(ctx, action).map_err(|e| {
                EngineError::Action {
                    kind: action.kind(),
                    source: Box::new(e),
                }
            })?;
            reasons.extend(reason);
            violations.extend(violation);
        }
        Ok((reasons, violations))
    }
}

type ActionOutcome = Result<(Option<Reason>, Option<Violation>), EngineError>;

fn execute_action(ctx: &mut EngineContext, action: &Action) -> ActionOutcome {
    let data = build_evaluation_data(ctx);
    debug!(kind = action.kind(), "executing action");
    match action {
        Action::Set { target, value } => set::execute(ctx, target, value),
        Action::Compute { target, logic } => compute::execute(ctx, target, logic, &data),
        Action::Add {
            target,
            value,
            logic,
        } => add::execute(ctx, target, value.as_ref(), logic.as_ref(), &data),
        Action::Multiply {
            target,
            value,
            logic,
        } => multiply::execute(ctx, target, value.as_ref(), logic.as_ref(), &data),
        Action::Validate { logic, params, .. } => validate::execute(logic, params, &data),
    }
}

/// The numeric operand of `add`/`multiply`: logic takes precedence over the
/// literal value; at least one must be present.
fn operand(
    kind: &'static str,
    value: Option<&Value>,
    logic: Option<&Value>,
    data: &Map<String, Value>,
) -> Result<f64, EngineError> {
    if let Some(logic) = logic.filter(|l| has_logic(l)) {
        return Ok(lenient_f64(&evaluate(logic, data)?));
    }
    if let Some(value) = value {
        return Ok(lenient_f64(value));
    }
    Err(EngineError::ActionShape {
        kind,
        what: "either logic or value",
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use reckon_core::{ContextMeta, State};
    use serde_json::json;

    fn ctx(state_json: Value) -> EngineContext {
        let state: State = serde_json::from_value(state_json).unwrap();
        EngineContext::new(state, ContextMeta::default())
    }

    #[test]
    fn action_errors_carry_the_action_kind() {
        let mut c = ctx(json!({}));
        let action: Action = serde_json::from_value(json!({ "type": "set", "target": "" })).unwrap();
        let err = Executor::new()
            .execute(&mut c, std::slice::from_ref(&action))
            .unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("error executing action set"));
        assert!(msg.contains("set action requires target"));
    }

    #[test]
    fn each_action_reports_one_reason() {
        let mut c = ctx(json!({ "items": [{ "id": "i1", "amount": 2 }] }));
        let actions: Vec<Action> = serde_json::from_value(json!([
            { "type": "set", "target": "fields.a", "value": 1 },
            { "type": "compute", "target": "fields.b", "logic": { "+": [1, 2] } }
        ]))
        .unwrap();
        let (reasons, violations) = Executor::new().execute(&mut c, &actions).unwrap();
        assert_eq!(reasons.len(), 2);
        assert!(violations.is_empty());
        assert_eq!(c.state.fields["a"], json!(1));
        assert_eq!(c.state.fields["b"], json!(3.0));
    }
}
