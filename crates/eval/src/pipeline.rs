//! The phased rule pipeline.
//!
//! Canonical phases run first, in a fixed order, regardless of their
//! position in the pack; any other phase runs afterwards in declaration
//! order. Inside a phase, rules run in ascending priority with a stable
//! sort, so equal priorities keep declaration order.

use std::collections::BTreeMap;

use reckon_core::{
    has_logic, Action, EngineContext, EngineError, Reason, Rule, RulePack, RulePhase, Violation,
};
use serde_json::Value;
use tracing::debug;

use crate::data::build_evaluation_data;
use crate::logic::evaluate;

/// Canonical phase order. A canonical phase absent from the pack is
/// skipped.
pub const PHASE_ORDER: [&str; 5] = ["baseline", "allocation", "taxes", "totals", "guards"];

/// The seam between the pipeline and the action implementations. The
/// pipeline only knows this trait; `actions::Executor` supplies it at
/// engine entry.
pub trait ActionRunner {
    fn execute(
        &self,
        ctx: &mut EngineContext,
        actions: &[Action],
    ) -> Result<(Vec<Reason>, Vec<Violation>), EngineError>;
}

pub fn run_pipeline(
    ctx: &mut EngineContext,
    pack: &RulePack,
    runner: &dyn ActionRunner,
) -> Result<(), EngineError> {
    // For canonical names the last declaration wins.
    let mut canonical: BTreeMap<&str, &RulePhase> = BTreeMap::new();
    for phase in &pack.phases {
        if PHASE_ORDER.contains(&phase.name.as_str()) {
            canonical.insert(phase.name.as_str(), phase);
        }
    }

    for name in PHASE_ORDER {
        if let Some(phase) = canonical.get(name) {
            debug!(phase = name, "running phase");
            run_phase(ctx, phase, runner).map_err(|e| phase_error(name, e))?;
        }
    }

    for phase in &pack.phases {
        if !PHASE_ORDER.contains(&phase.name.as_str()) {
            debug!(phase = %phase.name, "running custom phase");
            run_phase(ctx, phase, runner).map_err(|e| phase_error(&phase.name, e))?;
        }
    }

    Ok(())
}

pub fn run_phase(
    ctx: &mut EngineContext,
    phase: &RulePhase,
    runner: &dyn ActionRunner,
) -> Result<(), EngineError> {
    let mut rules: Vec<&Rule> = phase.rules.iter().collect();
    rules.sort_by_key(|r| r.priority);

    for rule in rules {
        if !rule.enabled {
            continue;
        }
        let (reasons, violations) =
            run_rule(ctx, rule, runner).map_err(|e| EngineError::Rule {
                rule_id: rule.id.clone(),
                source: Box::new(e),
            })?;
        ctx.reasons.extend(reasons);
        ctx.violations.extend(violations);
    }

    Ok(())
}

fn run_rule(
    ctx: &mut EngineContext,
    rule: &Rule,
    runner: &dyn ActionRunner,
) -> Result<(Vec<Reason>, Vec<Violation>), EngineError> {
    // No condition means the rule runs unconditionally. A condition that
    // evaluates to anything but boolean true skips the rule silently.
    if let Some(condition) = rule.condition.as_ref().filter(|c| has_logic(c)) {
        let data = build_evaluation_data(ctx);
        let outcome = evaluate(condition, &data).map_err(|e| EngineError::Condition {
            rule_id: rule.id.clone(),
            source: Box::new(e),
        })?;
        if outcome != Value::Bool(true) {
            debug!(rule_id = %rule.id, "condition not met, skipping rule");
            return Ok((Vec::new(), Vec::new()));
        }
    }

    debug!(rule_id = %rule.id, phase = %rule.phase, "rule matched");
    let (mut reasons, violations) = runner.execute(ctx, &rule.actions)?;
    for reason in &mut reasons {
        reason.rule_id = rule.id.clone();
        reason.phase = rule.phase.clone();
    }
    Ok((reasons, violations))
}

fn phase_error(phase: &str, source: EngineError) -> EngineError {
    EngineError::Phase {
        phase: phase.to_string(),
        source: Box::new(source),
    }
}

// ──────────────────────────────────────────────
// Tests
// ──────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use reckon_core::{ContextMeta, State};
    use serde_json::json;

    use crate::actions::Executor;

    fn run_pack(pack_json: Value, state_json: Value) -> EngineContext {
        let pack: RulePack = serde_json::from_value(pack_json).unwrap();
        let state: State = serde_json::from_value(state_json).unwrap();
        let mut ctx = EngineContext::new(state, ContextMeta::default());
        run_pipeline(&mut ctx, &pack, &Executor::new()).unwrap();
        ctx
    }

    fn marker_rule(id: &str, phase: &str, priority: i64) -> Value {
        json!({
            "id": id,
            "phase": phase,
            "priority": priority,
            "enabled": true,
            "actions": [{ "type": "set", "target": format!("fields.{id}"), "value": 1 }]
        })
    }

    #[test]
    fn canonical_phases_run_in_fixed_order() {
        let ctx = run_pack(
            json!({
                "id": "p",
                "version": "v1",
                "phases": [
                    { "name": "guards", "rules": [marker_rule("g", "guards", 0)] },
                    { "name": "custom-late", "rules": [marker_rule("c", "custom-late", 0)] },
                    { "name": "baseline", "rules": [marker_rule("b", "baseline", 0)] },
                    { "name": "totals", "rules": [marker_rule("t", "totals", 0)] }
                ]
            }),
            json!({}),
        );

        let order: Vec<&str> = ctx.reasons.iter().map(|r| r.rule_id.as_str()).collect();
        assert_eq!(order, vec!["b", "t", "g", "c"]);
    }

    #[test]
    fn rules_sort_by_priority_with_stable_ties() {
        let ctx = run_pack(
            json!({
                "id": "p",
                "version": "v1",
                "phases": [{
                    "name": "baseline",
                    "rules": [
                        marker_rule("late", "baseline", 5),
                        marker_rule("first-tie", "baseline", 1),
                        marker_rule("second-tie", "baseline", 1),
                        marker_rule("early", "baseline", 0)
                    ]
                }]
            }),
            json!({}),
        );

        let order: Vec<&str> = ctx.reasons.iter().map(|r| r.rule_id.as_str()).collect();
        assert_eq!(order, vec!["early", "first-tie", "second-tie", "late"]);
    }

    #[test]
    fn disabled_rules_are_skipped() {
        let ctx = run_pack(
            json!({
                "id": "p",
                "version": "v1",
                "phases": [{
                    "name": "baseline",
                    "rules": [{
                        "id": "off",
                        "phase": "baseline",
                        "actions": [{ "type": "set", "target": "fields.x", "value": 1 }]
                    }]
                }]
            }),
            json!({}),
        );
        assert!(ctx.reasons.is_empty());
        assert!(!ctx.state.fields.contains_key("x"));
    }

    #[test]
    fn non_boolean_conditions_skip_the_rule_silently() {
        let ctx = run_pack(
            json!({
                "id": "p",
                "version": "v1",
                "phases": [{
                    "name": "baseline",
                    "rules": [{
                        "id": "non-bool",
                        "phase": "baseline",
                        "enabled": true,
                        "condition": { "+": [1, 1] },
                        "actions": [{ "type": "set", "target": "fields.x", "value": 1 }]
                    }]
                }]
            }),
            json!({}),
        );
        assert!(ctx.reasons.is_empty());
    }

    #[test]
    fn reasons_are_stamped_with_rule_id_and_phase() {
        let ctx = run_pack(
            json!({
                "id": "p",
                "version": "v1",
                "phases": [{ "name": "taxes", "rules": [marker_rule("r1", "taxes", 0)] }]
            }),
            json!({}),
        );
        assert_eq!(ctx.reasons[0].rule_id, "r1");
        assert_eq!(ctx.reasons[0].phase, "taxes");
    }

    #[test]
    fn action_errors_name_the_rule_and_phase() {
        let pack: RulePack = serde_json::from_value(json!({
            "id": "p",
            "version": "v1",
            "phases": [{
                "name": "baseline",
                "rules": [{
                    "id": "broken",
                    "phase": "baseline",
                    "enabled": true,
                    "actions": [{
                        "type": "compute",
                        "target": "fields.x",
                        "logic": { "xyz_nope": [1] }
                    }]
                }]
            }]
        }))
        .unwrap();
        let mut ctx = EngineContext::new(State::default(), ContextMeta::default());
        let err = run_pipeline(&mut ctx, &pack, &Executor::new()).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("error in phase baseline"));
        assert!(msg.contains("error executing rule broken"));
        assert!(msg.contains("failed to apply jsonlogic"));
    }

    #[test]
    fn condition_errors_name_the_rule() {
        let pack: RulePack = serde_json::from_value(json!({
            "id": "p",
            "version": "v1",
            "phases": [{
                "name": "baseline",
                "rules": [{
                    "id": "bad-cond",
                    "phase": "baseline",
                    "enabled": true,
                    "condition": { "unknown_operator_xyz": [1, 2] },
                    "actions": [{ "type": "set", "target": "fields.x", "value": 1 }]
                }]
            }]
        }))
        .unwrap();
        let mut ctx = EngineContext::new(State::default(), ContextMeta::default());
        let err = run_pipeline(&mut ctx, &pack, &Executor::new()).unwrap_err();
        assert!(err
            .to_string()
            .contains("failed to evaluate condition for rule bad-cond"));
    }
}
