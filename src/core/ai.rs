use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, instrument, warn};

use super::data::{core_vitals_analysis, feature_vector, ParsedVitals};
use super::engine;
use super::model::{load_artifact, InferenceBackend};
use super::strategy::DiagnosticStrategy;
use crate::config::ModelConfig;
use crate::error::ModelResult;
use crate::models::{
    diagnosis::rank_differentials, DiagnosisLabel, DiagnosticResult, DifferentialDiagnosis,
    NextSteps, PatientFormInput, RiskLevel, Triage,
};

/// Whether an inference backend is available.
#[derive(Clone, Default)]
pub enum ModelState {
    #[default]
    Unloaded,
    Loaded(Arc<dyn InferenceBackend>),
}

impl ModelState {
    pub fn is_loaded(&self) -> bool {
        matches!(self, ModelState::Loaded(_))
    }
}

impl std::fmt::Debug for ModelState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ModelState::Unloaded => f.write_str("Unloaded"),
            ModelState::Loaded(backend) => write!(f, "Loaded({})", backend.name()),
        }
    }
}

/// Classifier that prefers a trained model and falls back to the rule
/// engine whenever no model is loaded or a prediction fails.
pub struct ModelBackedStrategy {
    state: RwLock<ModelState>,
    timeout: Duration,
}

impl ModelBackedStrategy {
    /// Starts unloaded; every analysis uses the rule engine until
    /// [`load_model`](Self::load_model) succeeds.
    pub fn new(config: &ModelConfig) -> Self {
        Self {
            state: RwLock::new(ModelState::Unloaded),
            timeout: Duration::from_secs(config.timeout_secs),
        }
    }

    /// Starts loaded with an already constructed backend.
    pub fn with_backend(backend: Arc<dyn InferenceBackend>) -> Self {
        Self {
            state: RwLock::new(ModelState::Loaded(backend)),
            timeout: Duration::from_secs(ModelConfig::default().timeout_secs),
        }
    }

    pub async fn is_loaded(&self) -> bool {
        self.state.read().await.is_loaded()
    }

    /// Fetches the artifact at `uri` and makes it the active backend.
    ///
    /// Never fails: on any error the warning is logged, the strategy drops
    /// back to unloaded (even if a model was loaded before) and `false` is
    /// returned.
    #[instrument(skip(self))]
    pub async fn load_model(&self, uri: &str) -> bool {
        match load_artifact(uri, self.timeout).await {
            Ok(network) => {
                info!(backend = %network.name(), "model loaded, using model-backed inference");
                *self.state.write().await = ModelState::Loaded(Arc::new(network));
                true
            }
            Err(e) => {
                warn!(error = %e, "model load failed; using rule-based engine as fallback");
                *self.state.write().await = ModelState::Unloaded;
                false
            }
        }
    }

    /// Runs [`load_model`](Self::load_model) on a detached task so startup
    /// does not wait for it. Analyses issued before it finishes use the rule
    /// engine.
    pub fn spawn_load(self: &Arc<Self>, uri: impl Into<String>) -> JoinHandle<bool> {
        let strategy = Arc::clone(self);
        let uri = uri.into();
        tokio::spawn(async move {
            let loaded = strategy.load_model(&uri).await;
            if loaded {
                info!("AI model available for inference");
            } else {
                info!("AI model unavailable; using rule-based engine");
            }
            loaded
        })
    }

    /// Always produces a result. A failed prediction falls back to the rule
    /// engine for this call only; the model stays loaded for later calls.
    #[instrument(skip(self, form), fields(patient_id = %form.patient_id))]
    pub async fn analyze_with_model(&self, form: &PatientFormInput) -> DiagnosticResult {
        let backend = match &*self.state.read().await {
            ModelState::Loaded(backend) => Arc::clone(backend),
            ModelState::Unloaded => {
                debug!("no model loaded, delegating to rule engine");
                return engine::analyze(form);
            }
        };

        match infer(backend.as_ref(), form) {
            Ok(result) => result,
            Err(e) => {
                error!(error = %e, "model inference error; falling back to rule-based engine");
                engine::analyze(form)
            }
        }
    }
}

#[async_trait]
impl DiagnosticStrategy for ModelBackedStrategy {
    fn name(&self) -> &'static str {
        "model-backed"
    }

    async fn analyze(&self, form: &PatientFormInput) -> DiagnosticResult {
        self.analyze_with_model(form).await
    }
}

/// Recommendations used when the model produced the diagnosis.
pub fn model_recommendations_for(risk_level: RiskLevel) -> Vec<String> {
    let items: &[&str] = match risk_level {
        RiskLevel::High => &[
            "Immediate medical attention required",
            "Continuous monitoring",
            "Establish IV access",
        ],
        RiskLevel::Medium => &[
            "Monitor vital signs closely",
            "Consider pain management",
            "Reassess in 30 minutes",
        ],
        RiskLevel::Low => &[
            "Standard monitoring protocol",
            "Symptomatic treatment",
            "Patient comfort measures",
        ],
    };
    items.iter().map(|s| s.to_string()).collect()
}

/// Percent with halves rounded up.
fn to_percent(probability: f32) -> i32 {
    (f64::from(probability) * 100.0 + 0.5).floor() as i32
}

fn infer(backend: &dyn InferenceBackend, form: &PatientFormInput) -> ModelResult<DiagnosticResult> {
    let features = feature_vector(form);
    let probs = backend.predict(&features)?;

    // No usable maximum (empty output or a NaN anywhere) reads as General
    // Malaise at 0% rather than as an inference failure.
    let top = if probs.iter().any(|p| p.is_nan()) {
        None
    } else {
        // First maximum wins ties.
        probs
            .iter()
            .copied()
            .enumerate()
            .fold(None, |best: Option<(usize, f32)>, (i, p)| match best {
                Some((_, max)) if p <= max => best,
                _ => Some((i, p)),
            })
    };
    if top.is_none() {
        warn!(outputs = probs.len(), "model output has no usable maximum");
    }

    let (diagnosis, confidence) = match top {
        Some((idx, prob)) => (
            DiagnosisLabel::from_index(idx).unwrap_or(DiagnosisLabel::GeneralMalaise),
            to_percent(prob).clamp(0, 100) as u8,
        ),
        None => (DiagnosisLabel::GeneralMalaise, 0),
    };
    let risk_level = RiskLevel::from_model_confidence(confidence);
    debug!(%diagnosis, confidence, %risk_level, "model prediction");

    let mut differential_diagnoses: Vec<_> = DiagnosisLabel::ALL
        .iter()
        .enumerate()
        .map(|(idx, label)| {
            let probability = probs
                .get(idx)
                .copied()
                .filter(|p| !p.is_nan())
                .map(to_percent)
                .unwrap_or(0);
            DifferentialDiagnosis::new(label.as_str(), probability)
        })
        .collect();
    rank_differentials(&mut differential_diagnoses);

    let recommendations = model_recommendations_for(risk_level);
    let next_steps = NextSteps::for_recommendations(&recommendations, risk_level);

    Ok(DiagnosticResult {
        primary_diagnosis: diagnosis,
        confidence,
        triage: Triage::from_risk_level(risk_level),
        recommendations,
        vitals_analysis: core_vitals_analysis(&ParsedVitals::from_form(form)),
        differential_diagnoses,
        next_steps,
    })
}
