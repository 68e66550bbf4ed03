//! reckon-core: document and rule-pack model for the reckon rules engine.
//!
//! The working document is a [`State`]: a handful of strongly-typed members
//! (`items`, `totals`) plus open `fields`/`meta` bags holding arbitrary JSON.
//! A [`RulePack`] is the program the engine interprets: ordered phases of
//! rules, each rule a JsonLogic condition plus a list of [`Action`]s.
//!
//! This crate defines the data model, the error taxonomy, and the engine
//! context; all evaluation lives in `reckon-eval`.

pub mod context;
pub mod error;
pub mod num;
pub mod output;
pub mod pack;
pub mod state;

pub use context::EngineContext;
pub use error::EngineError;
pub use output::{Reason, RunOutput, Violation};
pub use pack::{has_logic, Action, ContextMeta, Rule, RulePack, RulePhase};
pub use state::{Item, State, Totals};
