use std::sync::Arc;

use async_trait::async_trait;
use tokio::task::JoinHandle;
use tracing::info;

#[cfg(feature = "ml")]
use super::ai::ModelBackedStrategy;
use super::engine;
use crate::config::ModelConfig;
use crate::models::{DiagnosticResult, PatientFormInput};

/// A triage classifier. Implementations never fail; every call produces a
/// complete result.
#[async_trait]
pub trait DiagnosticStrategy: Send + Sync {
    fn name(&self) -> &'static str;

    async fn analyze(&self, form: &PatientFormInput) -> DiagnosticResult;
}

/// The deterministic rule engine.
#[derive(Debug, Clone, Copy, Default)]
pub struct RuleBasedStrategy;

#[async_trait]
impl DiagnosticStrategy for RuleBasedStrategy {
    fn name(&self) -> &'static str {
        "rule-based"
    }

    async fn analyze(&self, form: &PatientFormInput) -> DiagnosticResult {
        engine::analyze(form)
    }
}

/// Outcome of [`select_strategy`].
pub struct StrategySelection {
    pub strategy: Arc<dyn DiagnosticStrategy>,
    /// Background model load, when one was started. Long-running callers
    /// can drop it; one-shot callers await it before analysing.
    pub pending_load: Option<JoinHandle<bool>>,
}

/// Picks the classifier for this configuration.
///
/// With a model enabled (and the `ml` feature compiled in) the model-backed
/// strategy is returned immediately and its artifact loads in the
/// background. Must be called inside a tokio runtime in that case.
pub fn select_strategy(config: &ModelConfig) -> StrategySelection {
    model_backed(config).unwrap_or_else(|| {
        info!("rule-based strategy selected");
        StrategySelection {
            strategy: Arc::new(RuleBasedStrategy),
            pending_load: None,
        }
    })
}

#[cfg(feature = "ml")]
fn model_backed(config: &ModelConfig) -> Option<StrategySelection> {
    let uri = config.uri.as_deref().filter(|_| config.enabled)?;
    let strategy = Arc::new(ModelBackedStrategy::new(config));
    let pending_load = strategy.spawn_load(uri);
    info!(uri, "model-backed strategy selected");
    Some(StrategySelection {
        strategy,
        pending_load: Some(pending_load),
    })
}

#[cfg(not(feature = "ml"))]
fn model_backed(config: &ModelConfig) -> Option<StrategySelection> {
    if config.enabled {
        tracing::warn!("model support not compiled in, using the rule engine");
    }
    None
}
