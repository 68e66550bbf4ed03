//! `compute`: evaluate logic and write the result at the target path.
//!
//! A wildcard target is re-evaluated per matched position: the base data
//! map loses `items`/`itemValues` and gains the observable fields of every
//! container selected on the way to that position, so per-item logic like
//! `{"*": [{"var": "basePrice"}, {"var": "amount"}]}` reads the current
//! element without naming it.

use reckon_core::{has_logic, EngineContext, EngineError, Reason};
use serde_json::{Map, Value};

use super::ActionOutcome;
use crate::logic::evaluate;
use crate::nav::{collect_visits, set_at_indices, set_value};
use crate::path::{has_wildcard, parse_path};

pub(super) fn execute(
    ctx: &mut EngineContext,
    target: &str,
    logic: &Value,
    data: &Map<String, Value>,
) -> ActionOutcome {
    if target.is_empty() {
        return Err(EngineError::ActionShape {
            kind: "compute",
            what: "target",
        });
    }
    if !has_logic(logic) {
        return Err(EngineError::ActionShape {
            kind: "compute",
            what: "logic",
        });
    }

    let steps = parse_path(target)?;
    if steps.is_empty() {
        return Err(EngineError::InvalidTarget {
            target: target.to_string(),
        });
    }

    if !has_wildcard(&steps) {
        let result = evaluate(logic, data)?;
        set_value(&mut ctx.state, target, &result)?;
        return Ok((
            Some(Reason::message(format!("computed {target} = {result}"))),
            None,
        ));
    }

    // Wildcard target: one evaluation per matched position. Zero matches is
    // not an error.
    let visits = collect_visits(&ctx.state, &steps)?;
    let count = visits.len();
    for visit in &visits {
        let mut scoped = data.clone();
        scoped.remove("items");
        scoped.remove("itemValues");
        for overlay in &visit.overlays {
            for (k, v) in overlay {
                scoped.insert(k.clone(), v.clone());
            }
        }
        let result = evaluate(logic, &scoped)?;
        set_at_indices(&mut ctx.state, &steps, &visit.indices, &result)?;
    }

    Ok((
        Some(Reason::message(format!(
            "computed {target} for {count} items"
        ))),
        None,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::build_evaluation_data;
    use reckon_core::{ContextMeta, State};
    use serde_json::json;

    fn ctx(state_json: Value) -> EngineContext {
        let state: State = serde_json::from_value(state_json).unwrap();
        EngineContext::new(state, ContextMeta::default())
    }

    #[test]
    fn computes_scalar_targets_once() {
        let mut c = ctx(json!({ "items": [{ "amount": 2, "value": 10 }] }));
        let data = build_evaluation_data(&c);
        let (reason, _) = execute(
            &mut c,
            "totals.subtotal",
            &json!({ "sum": [{ "var": "itemValues" }] }),
            &data,
        )
        .unwrap();

        assert_eq!(c.state.totals.subtotal, 10.0);
        assert_eq!(reason.unwrap().message, "computed totals.subtotal = 10.0");
    }

    #[test]
    fn wildcard_targets_evaluate_per_item_with_hoisted_fields() {
        let mut c = ctx(json!({
            "items": [
                { "id": "i1", "amount": 2, "basePrice": 100 },
                { "id": "i2", "amount": 3, "basePrice": 50 }
            ]
        }));
        let data = build_evaluation_data(&c);
        let logic = json!({ "*": [{ "var": "basePrice" }, { "var": "amount" }] });
        let (reason, _) = execute(&mut c, "items[*].fields.value", &logic, &data).unwrap();

        assert_eq!(c.state.items[0].fields["value"], json!(200.0));
        assert_eq!(c.state.items[1].fields["value"], json!(150.0));
        assert_eq!(
            reason.unwrap().message,
            "computed items[*].fields.value for 2 items"
        );
    }

    #[test]
    fn wildcard_over_empty_items_is_a_successful_noop() {
        let mut c = ctx(json!({}));
        let data = build_evaluation_data(&c);
        let (reason, _) = execute(
            &mut c,
            "items[*].fields.value",
            &json!({ "var": "amount" }),
            &data,
        )
        .unwrap();
        assert_eq!(
            reason.unwrap().message,
            "computed items[*].fields.value for 0 items"
        );
    }

    #[test]
    fn nested_wildcards_overlay_inner_selections_over_outer() {
        let mut c = ctx(json!({
            "items": [
                { "id": "i1", "amount": 2,
                  "negotiations": [{ "percent": 5 }, { "percent": 10 }] }
            ]
        }));
        let data = build_evaluation_data(&c);
        // amount comes from the item selection, percent from the negotiation.
        let logic = json!({ "*": [{ "var": "amount" }, { "var": "percent" }] });
        execute(&mut c, "items[*].negotiations[*].result", &logic, &data).unwrap();

        assert_eq!(
            c.state.items[0].fields["negotiations"],
            json!([
                { "percent": 5, "result": 10.0 },
                { "percent": 10, "result": 20.0 }
            ])
        );
    }

    #[test]
    fn requires_logic() {
        let mut c = ctx(json!({}));
        let data = build_evaluation_data(&c);
        let err = execute(&mut c, "fields.x", &json!({}), &data).unwrap_err();
        assert!(err.to_string().contains("compute action requires logic"));
    }
}
