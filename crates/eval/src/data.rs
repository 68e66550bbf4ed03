//! Evaluation-data assembly.
//!
//! Before a condition or action logic runs, the working state is projected
//! into a flat map: `context` metadata, every state field hoisted to the
//! top level, `totals` (when non-zero), `items` as per-item maps with their
//! fields hoisted, and the `itemValues` numeric convenience array.

use reckon_core::num::lenient_f64;
use reckon_core::EngineContext;
use serde_json::{Map, Value};

use crate::nav::{item_overlay, num_value, totals_value};

pub fn build_evaluation_data(ctx: &EngineContext) -> Map<String, Value> {
    let state = &ctx.state;
    let mut data = Map::new();

    let mut context = Map::new();
    context.insert(
        "tenantId".to_string(),
        Value::String(ctx.meta.tenant_id.clone()),
    );
    context.insert("userId".to_string(), Value::String(ctx.meta.user_id.clone()));
    context.insert("locale".to_string(), Value::String(ctx.meta.locale.clone()));
    data.insert("context".to_string(), Value::Object(context));

    for (k, v) in &state.fields {
        data.insert(k.clone(), v.clone());
    }

    if !state.totals.is_zero() {
        data.insert("totals".to_string(), totals_value(&state.totals));
    }

    let items: Vec<Value> = state
        .items
        .iter()
        .map(|item| Value::Object(item_overlay(item)))
        .collect();
    data.insert("items".to_string(), Value::Array(items));

    // Per item: fields.value, else fields.total, else amount.
    let item_values: Vec<Value> = state
        .items
        .iter()
        .map(|item| {
            let v = item
                .fields
                .get("value")
                .map(lenient_f64)
                .or_else(|| item.fields.get("total").map(lenient_f64))
                .unwrap_or(item.amount);
            num_value(v)
        })
        .collect();
    data.insert("itemValues".to_string(), Value::Array(item_values));

    data
}
