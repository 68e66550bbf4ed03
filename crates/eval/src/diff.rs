//! Output projections computed after the pipeline completes.

use reckon_core::{EngineContext, State};
use serde_json::{Map, Value};

use crate::nav::totals_value;

/// UI-oriented view: totals (when non-zero), fields (when non-empty) and
/// items as `{id, fields}` pairs. Item amounts are intentionally omitted.
pub fn build_state_fragment(ctx: &EngineContext) -> Map<String, Value> {
    let state = &ctx.state;
    let mut fragment = Map::new();

    if !state.totals.is_zero() {
        fragment.insert("totals".to_string(), totals_value(&state.totals));
    }
    if !state.fields.is_empty() {
        fragment.insert("fields".to_string(), Value::Object(state.fields.clone()));
    }
    if !state.items.is_empty() {
        let items: Vec<Value> = state
            .items
            .iter()
            .map(|item| {
                let mut m = Map::new();
                m.insert("id".to_string(), Value::String(item.id.clone()));
                m.insert("fields".to_string(), Value::Object(item.fields.clone()));
                Value::Object(m)
            })
            .collect();
        fragment.insert("items".to_string(), Value::Array(items));
    }

    fragment
}

/// Synchronization-oriented view: totals only when they differ from the
/// pre-execution snapshot, fields when non-empty, and the full current
/// items when non-empty.
pub fn build_server_delta(ctx: &EngineContext) -> Map<String, Value> {
    let mut delta = Map::new();

    if ctx.original.totals != ctx.state.totals {
        delta.insert("totals".to_string(), totals_value(&ctx.state.totals));
    }
    if !ctx.state.fields.is_empty() {
        delta.insert(
            "fields".to_string(),
            Value::Object(ctx.state.fields.clone()),
        );
    }
    if !ctx.state.items.is_empty() {
        let items =
            serde_json::to_value(&ctx.state.items).unwrap_or_else(|_| Value::Array(Vec::new()));
        delta.insert("items".to_string(), items);
    }

    delta
}

/// Which of the three mutable regions differ between two states.
pub fn changed_fields(original: &State, current: &State) -> Vec<&'static str> {
    let mut changed = Vec::new();
    if original.totals != current.totals {
        changed.push("totals");
    }
    if original.fields != current.fields {
        changed.push("fields");
    }
    if original.items != current.items {
        changed.push("items");
    }
    changed
}
