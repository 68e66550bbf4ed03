//! reckon-eval: deterministic rule evaluation over structured documents.
//!
//! The engine is a pure function: given a state document, a rule pack and
//! invocation metadata, it runs the phased pipeline over a working copy of
//! the state and returns the UI fragment, the server delta, the execution
//! trace and any validation violations.
//!
//! Layering is strictly downward: the pipeline drives the action executor,
//! which uses the path engine (`nav`) and the expression evaluator
//! (`logic`/`operators`); nothing calls back up.

pub mod actions;
pub mod data;
pub mod diff;
pub mod logic;
pub mod nav;
pub mod operators;
pub mod path;
pub mod pipeline;

pub use reckon_core::{
    Action, ContextMeta, EngineContext, EngineError, Item, Reason, Rule, RulePack, RulePhase,
    RunOutput, State, Totals, Violation,
};

use actions::Executor;

/// Runs a rule pack against a state document.
///
/// The pre-execution state is cloned once for delta computation; on error
/// no partial result is returned.
pub fn run(state: State, pack: RulePack, meta: ContextMeta) -> Result<RunOutput, EngineError> {
    if pack.id.is_empty() {
        return Err(EngineError::MissingPackId);
    }

    let mut ctx = EngineContext::new(state, meta);
    pipeline::run_pipeline(&mut ctx, &pack, &Executor::new())?;

    Ok(RunOutput {
        state_fragment: diff::build_state_fragment(&ctx),
        server_delta: diff::build_server_delta(&ctx),
        reasons: ctx.reasons,
        violations: ctx.violations,
        rules_version: pack.version,
    })
}

// ──────────────────────────────────────────────
// Integration tests
// ──────────────────────────────────────────────

#[cfg(test)]
mod integration_tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn run_executes_a_minimal_pack() {
        let state: State = serde_json::from_value(json!({ "tenantId": "t-1" })).unwrap();
        let pack: RulePack = serde_json::from_value(json!({
            "id": "test-pack",
            "version": "v1.0.0",
            "phases": [{
                "name": "baseline",
                "rules": [{
                    "id": "init-total",
                    "phase": "baseline",
                    "priority": 1,
                    "enabled": true,
                    "actions": [{ "type": "set", "target": "totals.total", "value": 100.0 }]
                }]
            }]
        }))
        .unwrap();

        let output = run(state, pack, ContextMeta::default()).unwrap();
        assert_eq!(output.rules_version, "v1.0.0");
        assert_eq!(output.reasons.len(), 1);
        assert_eq!(output.state_fragment["totals"]["total"], json!(100.0));
        assert_eq!(output.server_delta["totals"]["total"], json!(100.0));
        assert!(output.violations.is_empty());
    }

    #[test]
    fn run_rejects_an_empty_pack_id() {
        let err = run(
            State::default(),
            RulePack {
                id: String::new(),
                version: "v1".to_string(),
                phases: vec![],
            },
            ContextMeta::default(),
        )
        .unwrap_err();
        assert!(err.to_string().contains("rulePack.id is required"));
    }

    #[test]
    fn context_metadata_is_visible_to_conditions() {
        let pack: RulePack = serde_json::from_value(json!({
            "id": "ctx-pack",
            "version": "v1",
            "phases": [{
                "name": "baseline",
                "rules": [{
                    "id": "tenant-gate",
                    "phase": "baseline",
                    "enabled": true,
                    "condition": { "==": [{ "var": "context.tenantId" }, "acme"] },
                    "actions": [{ "type": "set", "target": "fields.gated", "value": true }]
                }]
            }]
        }))
        .unwrap();

        let meta = ContextMeta {
            tenant_id: "acme".to_string(),
            ..Default::default()
        };
        let output = run(State::default(), pack, meta).unwrap();
        assert_eq!(output.state_fragment["fields"]["gated"], json!(true));
    }
}
