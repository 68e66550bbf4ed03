//! WebAssembly binding: JSON string in, JSON string out.
//!
//! The host passes one envelope `{"state": ..., "rulePack": ...,
//! "context": ...}` and receives either the serialized run output or an
//! `{"error": "<message>"}` object. No state survives between calls.

use reckon_core::{ContextMeta, RulePack, State};
use serde::Deserialize;
use wasm_bindgen::prelude::*;

#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
struct EngineInput {
    state: State,
    rule_pack: RulePack,
    context: ContextMeta,
}

fn error_json(msg: &str) -> String {
    serde_json::json!({ "error": msg }).to_string()
}

#[wasm_bindgen]
pub fn run_engine(input_json: &str) -> String {
    let input: EngineInput = match serde_json::from_str(input_json) {
        Ok(v) => v,
        Err(e) => return error_json(&format!("failed to parse input: {e}")),
    };

    match reckon_eval::run(input.state, input.rule_pack, input.context) {
        Ok(output) => match serde_json::to_string(&output) {
            Ok(json) => json,
            Err(e) => error_json(&format!("failed to serialize result: {e}")),
        },
        Err(e) => error_json(&e.to_string()),
    }
}
