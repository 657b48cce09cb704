//! Triage classification: the rule engine, the model-backed adapter and
//! the strategy that picks between them.

#[cfg(feature = "ml")]
pub mod ai;
pub mod data;
pub mod engine;
#[cfg(feature = "ml")]
pub mod model;
pub mod strategy;

#[cfg(feature = "ml")]
pub use ai::{ModelBackedStrategy, ModelState};
pub use engine::analyze;
#[cfg(feature = "ml")]
pub use model::{load_artifact, DenseNetwork, InferenceBackend, ModelLocation};
pub use strategy::{select_strategy, DiagnosticStrategy, RuleBasedStrategy, StrategySelection};
