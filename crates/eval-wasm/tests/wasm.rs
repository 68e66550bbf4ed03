//! Binding tests; run with `wasm-pack test --node` or natively via cargo.

use reckon_eval_wasm::run_engine;
use serde_json::{json, Value};
use wasm_bindgen_test::wasm_bindgen_test;

fn parse(output: String) -> Value {
    serde_json::from_str(&output).unwrap()
}

#[wasm_bindgen_test(unsupported = test)]
fn runs_an_envelope_end_to_end() {
    let input = json!({
        "state": {
            "items": [{ "id": "i1", "amount": 2, "basePrice": 100 }]
        },
        "rulePack": {
            "id": "wasm-pack",
            "version": "v1",
            "phases": [{
                "name": "baseline",
                "rules": [{
                    "id": "calc",
                    "phase": "baseline",
                    "enabled": true,
                    "actions": [{
                        "type": "compute",
                        "target": "items[*].fields.value",
                        "logic": { "*": [{ "var": "basePrice" }, { "var": "amount" }] }
                    }]
                }]
            }]
        },
        "context": { "tenantId": "t-1" }
    });

    let output = parse(run_engine(&input.to_string()));
    assert_eq!(output["rulesVersion"], json!("v1"));
    assert_eq!(
        output["stateFragment"]["items"][0]["fields"]["value"],
        json!(200.0)
    );
    assert!(output.get("error").is_none());
}

#[wasm_bindgen_test(unsupported = test)]
fn malformed_input_uses_the_error_channel() {
    let output = parse(run_engine("{ not json"));
    let message = output["error"].as_str().unwrap();
    assert!(message.contains("failed to parse input"));
}

#[wasm_bindgen_test(unsupported = test)]
fn engine_errors_use_the_error_channel() {
    let input = json!({
        "state": {},
        "rulePack": { "id": "", "version": "v1", "phases": [] },
        "context": {}
    });
    let output = parse(run_engine(&input.to_string()));
    let message = output["error"].as_str().unwrap();
    assert!(message.contains("rulePack.id is required"));
}
