//! MedSat triage library
//!
//! Rule-based triage classification of a field patient assessment, with an
//! optional trained-model path that falls back to the rules, plus the
//! report formatter and demo history used by the command-line front end.

pub mod core;
pub mod error;
pub mod history;
pub mod models;
pub mod report;
pub mod telemetry;

pub use crate::core::{analyze, select_strategy, DiagnosticStrategy, RuleBasedStrategy};
#[cfg(feature = "ml")]
pub use crate::core::ModelBackedStrategy;
#[cfg(feature = "ml")]
pub use crate::error::ModelError;
pub use crate::error::ReportError;
pub use crate::models::{DiagnosticResult, PatientFormInput, RiskLevel};
pub use crate::report::MedicalReport;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application configuration
pub mod config {
    use std::path::{Path, PathBuf};

    use serde::Deserialize;

    #[derive(Debug, Clone, Default, Deserialize)]
    #[serde(default)]
    pub struct Config {
        pub model: ModelConfig,
        pub report: ReportConfig,
        pub logging: LoggingConfig,
    }

    #[derive(Debug, Clone, Deserialize)]
    #[serde(default)]
    pub struct ModelConfig {
        /// Try the trained model before the rule engine
        pub enabled: bool,
        /// http(s) URL, file:// URL or local path of the model artifact
        pub uri: Option<String>,
        /// Fetch timeout for remote artifacts
        pub timeout_secs: u64,
    }

    impl Default for ModelConfig {
        fn default() -> Self {
            Self {
                enabled: false,
                uri: None,
                timeout_secs: 10,
            }
        }
    }

    #[derive(Debug, Clone, Deserialize)]
    #[serde(default)]
    pub struct ReportConfig {
        pub output_dir: PathBuf,
        pub lines_per_page: usize,
        pub line_width: usize,
    }

    impl Default for ReportConfig {
        fn default() -> Self {
            Self {
                output_dir: PathBuf::from("reports"),
                lines_per_page: 60,
                line_width: 80,
            }
        }
    }

    #[derive(Debug, Clone, Deserialize)]
    #[serde(default)]
    pub struct LoggingConfig {
        /// Filter directive used when RUST_LOG is unset
        pub level: String,
        pub json: bool,
    }

    impl Default for LoggingConfig {
        fn default() -> Self {
            Self {
                level: "info".to_string(),
                json: false,
            }
        }
    }

    /// Load configuration from `config/`
    pub fn load_config() -> Result<Config, config::ConfigError> {
        load_config_from(Path::new("config"))
    }

    /// Layers `<dir>/default`, then `<dir>/<MEDSAT_ENV>`, then `MEDSAT_*`
    /// environment variables (`MEDSAT_MODEL__URI` sets `model.uri`). Every
    /// source is optional; unset keys keep their built-in defaults.
    pub fn load_config_from(dir: &Path) -> Result<Config, config::ConfigError> {
        let env = std::env::var("MEDSAT_ENV").unwrap_or_else(|_| "development".into());

        config::Config::builder()
            .add_source(config::File::from(dir.join("default")).required(false))
            .add_source(config::File::from(dir.join(env)).required(false))
            .add_source(
                config::Environment::with_prefix("MEDSAT")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()
    }

}
