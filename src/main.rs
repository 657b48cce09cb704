//! MedSat triage CLI
//!
//! Runs a triage analysis on a patient assessment and optionally writes the
//! medical report, or lists the sample assessment history.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand};
use tokio::io::AsyncReadExt;
use tracing::{error, info, warn};

use medsat::config::{self, Config};
use medsat::history;
use medsat::{select_strategy, telemetry, MedicalReport, PatientFormInput};

#[derive(Parser)]
#[command(name = "medsat", version, about = "Field triage and preliminary diagnosis")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze a patient assessment (JSON) and print the result
    Analyze {
        /// Assessment JSON file, or "-" for stdin
        #[arg(long)]
        input: PathBuf,
        /// Model artifact location; enables the model-backed classifier
        #[arg(long, conflicts_with = "rules_only")]
        model: Option<String>,
        /// Ignore any configured model
        #[arg(long)]
        rules_only: bool,
        /// Also write the medical report
        #[arg(long)]
        report: bool,
        /// Report directory, overrides the configured one
        #[arg(long)]
        output_dir: Option<PathBuf>,
    },
    /// Show the sample assessment history
    History {
        /// Show a single assessment
        #[arg(long)]
        id: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();

    let config = config::load_config().context("Failed to load configuration")?;
    telemetry::init_tracing(&config.logging).context("Failed to initialise logging")?;

    let cli = Cli::parse();

    match cli.command {
        Commands::Analyze {
            input,
            model,
            rules_only,
            report,
            output_dir,
        } => run_analyze(config, input, model, rules_only, report, output_dir).await,
        Commands::History { id } => run_history(id),
    }
}

async fn read_form(input: &Path) -> Result<PatientFormInput> {
    let raw = if input.as_os_str() == "-" {
        let mut buf = String::new();
        tokio::io::stdin()
            .read_to_string(&mut buf)
            .await
            .context("Failed to read assessment from stdin")?;
        buf
    } else {
        tokio::fs::read_to_string(input)
            .await
            .with_context(|| format!("Failed to read {}", input.display()))?
    };
    serde_json::from_str(&raw).context("Invalid assessment JSON")
}

async fn run_analyze(
    mut config: Config,
    input: PathBuf,
    model: Option<String>,
    rules_only: bool,
    report: bool,
    output_dir: Option<PathBuf>,
) -> Result<()> {
    if let Some(uri) = model {
        config.model.enabled = true;
        config.model.uri = Some(uri);
    }
    if rules_only {
        config.model.enabled = false;
    }

    let form = read_form(&input).await?;
    let selection = select_strategy(&config.model);
    // One-shot run: wait for the model so this analysis can use it.
    if let Some(load) = selection.pending_load {
        if !load.await? {
            warn!("continuing with rule-based engine");
        }
    }

    let result = selection.strategy.analyze(&form).await;
    info!(
        strategy = selection.strategy.name(),
        diagnosis = %result.primary_diagnosis,
        risk_level = %result.risk_level(),
        "analysis complete"
    );
    println!("{}", serde_json::to_string_pretty(&result)?);

    if report {
        let dir = output_dir.unwrap_or_else(|| config.report.output_dir.clone());
        let medical_report = MedicalReport::build(&form, &result, Utc::now());
        match medical_report.write_to(&dir, &config.report).await {
            Ok(path) => eprintln!("Report written to {}", path.display()),
            Err(e) => {
                error!(error = %e, "report generation failed");
                bail!("Failed to generate report. Please try again.");
            }
        }
    }

    Ok(())
}

fn run_history(id: Option<String>) -> Result<()> {
    match id {
        Some(id) => match history::find_assessment(&id) {
            Some(record) => println!("{}", serde_json::to_string_pretty(&record)?),
            None => bail!("No assessment found with id {}", id),
        },
        None => {
            let out = serde_json::json!({
                "summary": history::summarize(),
                "assessments": history::sample_history(),
            });
            println!("{}", serde_json::to_string_pretty(&out)?);
        }
    }
    Ok(())
}
