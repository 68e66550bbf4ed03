//! Per-invocation engine context.

use crate::output::{Reason, Violation};
use crate::pack::ContextMeta;
use crate::state::State;

/// Mutable state of one engine invocation. Created at entry, discarded at
/// exit; nothing is shared across invocations.
///
/// `original` is the single structural copy taken before any rule runs. The
/// pipeline mutates `state` in place; the server delta is computed against
/// `original` afterwards.
#[derive(Debug, Clone)]
pub struct EngineContext {
    pub state: State,
    pub original: State,
    pub meta: ContextMeta,
    pub reasons: Vec<Reason>,
    pub violations: Vec<Violation>,
}

impl EngineContext {
    pub fn new(state: State, meta: ContextMeta) -> Self {
        let original = state.clone();
        EngineContext {
            state,
            original,
            meta,
            reasons: Vec::new(),
            violations: Vec::new(),
        }
    }
}
