//! CLI smoke tests.

use assert_cmd::Command;
use predicates::prelude::*;

const STATE: &str = r#"{
    "id": "ord-1",
    "items": [
        { "id": "i1", "amount": 2, "basePrice": 100 },
        { "id": "i2", "amount": 3, "basePrice": 50 }
    ]
}"#;

const PACK: &str = r#"{
    "id": "pricing",
    "version": "v1.0.0",
    "phases": [{
        "name": "baseline",
        "rules": [
            {
                "id": "calc-item-value",
                "phase": "baseline",
                "priority": 1,
                "enabled": true,
                "actions": [{
                    "type": "compute",
                    "target": "items[*].fields.value",
                    "logic": { "*": [{ "var": "basePrice" }, { "var": "amount" }] }
                }]
            },
            {
                "id": "calc-subtotal",
                "phase": "baseline",
                "priority": 2,
                "enabled": true,
                "actions": [{
                    "type": "compute",
                    "target": "totals.subtotal",
                    "logic": { "sum": [{ "var": "itemValues" }] }
                }]
            }
        ]
    }]
}"#;

fn reckon() -> Command {
    Command::cargo_bin("reckon").unwrap()
}

#[test]
fn eval_prints_json_output() {
    let dir = tempfile::tempdir().unwrap();
    let state = dir.path().join("state.json");
    let pack = dir.path().join("pack.json");
    std::fs::write(&state, STATE).unwrap();
    std::fs::write(&pack, PACK).unwrap();

    reckon()
        .args(["--output", "json", "eval"])
        .arg(&state)
        .arg("--rules")
        .arg(&pack)
        .assert()
        .success()
        .stdout(predicate::str::contains("\"rulesVersion\": \"v1.0.0\""))
        .stdout(predicate::str::contains("\"subtotal\": 350.0"));
}

#[test]
fn validate_reports_pack_shape() {
    let dir = tempfile::tempdir().unwrap();
    let pack = dir.path().join("pack.json");
    std::fs::write(&pack, PACK).unwrap();

    reckon()
        .arg("validate")
        .arg(&pack)
        .assert()
        .success()
        .stdout(predicate::str::contains("ok: pricing v1.0.0"));
}

#[test]
fn validate_rejects_a_pack_without_id() {
    let dir = tempfile::tempdir().unwrap();
    let pack = dir.path().join("pack.json");
    std::fs::write(&pack, r#"{ "version": "v1", "phases": [] }"#).unwrap();

    reckon()
        .arg("validate")
        .arg(&pack)
        .assert()
        .failure()
        .stderr(predicate::str::contains("rulePack.id is required"));
}

#[test]
fn eval_exits_2_on_violations() {
    let dir = tempfile::tempdir().unwrap();
    let state = dir.path().join("state.json");
    let pack = dir.path().join("pack.json");
    std::fs::write(&state, r#"{ "totals": { "subtotal": 100.0, "discount": 40.0 } }"#).unwrap();
    std::fs::write(
        &pack,
        r#"{
            "id": "guard",
            "version": "v1",
            "phases": [{
                "name": "guards",
                "rules": [{
                    "id": "max-discount",
                    "phase": "guards",
                    "enabled": true,
                    "actions": [{
                        "type": "validate",
                        "logic": { ">": [{ "var": "totals.discount" }, 30] },
                        "params": { "field": "totals.discount", "code": "MAX_DISCOUNT" }
                    }]
                }]
            }]
        }"#,
    )
    .unwrap();

    reckon()
        .arg("eval")
        .arg(&state)
        .arg("--rules")
        .arg(&pack)
        .assert()
        .code(2)
        .stdout(predicate::str::contains("MAX_DISCOUNT"));
}
