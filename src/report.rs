//! Plain-text medical report for a completed triage analysis.
//!
//! A report is built once from the form and its result, then laid out into
//! fixed-size pages for a given line width and page length. Every page
//! carries the disclaimer footer and a page counter.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::config::ReportConfig;
use crate::error::ReportError;
use crate::models::{DiagnosticResult, PatientFormInput, VitalValue};

pub const REPORT_TITLE: &str = "MEDICAL DIAGNOSTIC REPORT";
pub const REPORT_SUBTITLE: &str = "MedSat AI Triage System - Preliminary Diagnosis";
pub const DISCLAIMER: &str =
    "This is a preliminary AI-generated diagnosis. Professional medical consultation is required.";

/// Used in place of a missing patient id.
pub const UNIDENTIFIED_PATIENT: &str = "UNIDENTIFIED";

#[derive(Debug, Clone, PartialEq, Eq)]
enum Block {
    Centered(String),
    Text(String),
    /// Continuation lines are indented to line up after `lead`.
    Hanging { lead: String, text: String },
}

impl Block {
    fn layout(&self, width: usize) -> Vec<String> {
        match self {
            Block::Centered(text) => wrap(text, width)
                .into_iter()
                .map(|line| {
                    let pad = width.saturating_sub(line.chars().count()) / 2;
                    format!("{}{}", " ".repeat(pad), line)
                })
                .collect(),
            Block::Text(text) => wrap(text, width),
            Block::Hanging { lead, text } => {
                let indent = lead.chars().count();
                let body_width = width.saturating_sub(indent).max(1);
                wrap(text, body_width)
                    .into_iter()
                    .enumerate()
                    .map(|(idx, line)| {
                        if idx == 0 {
                            format!("{}{}", lead, line)
                        } else {
                            format!("{}{}", " ".repeat(indent), line)
                        }
                    })
                    .collect()
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Section {
    title: Option<&'static str>,
    blocks: Vec<Block>,
}

impl Section {
    fn titled(title: &'static str, blocks: Vec<Block>) -> Self {
        Self {
            title: Some(title),
            blocks,
        }
    }

    /// Title, underline, content, then one blank separator line.
    fn layout(&self, width: usize) -> Vec<String> {
        let mut lines = Vec::new();
        if let Some(title) = self.title {
            lines.push(title.to_string());
            lines.push("=".repeat(title.len().min(width)));
        }
        for block in &self.blocks {
            lines.extend(block.layout(width));
        }
        lines.push(String::new());
        lines
    }
}

/// A triage report ready to be paginated and written out.
#[derive(Debug, Clone)]
pub struct MedicalReport {
    report_id: Uuid,
    patient_id: String,
    generated_at: DateTime<Utc>,
    sections: Vec<Section>,
}

impl MedicalReport {
    pub fn build(
        form: &PatientFormInput,
        result: &DiagnosticResult,
        generated_at: DateTime<Utc>,
    ) -> Self {
        let report_id = Uuid::new_v4();
        let patient_id = match form.patient_id.trim() {
            "" => UNIDENTIFIED_PATIENT.to_string(),
            id => id.to_string(),
        };

        let header = Section {
            title: None,
            blocks: vec![
                Block::Centered(REPORT_TITLE.to_string()),
                Block::Centered(REPORT_SUBTITLE.to_string()),
            ],
        };

        let age = match form.age.trim() {
            "" => VitalValue::NOT_AVAILABLE.to_string(),
            age => format!("{} years", age),
        };
        let patient = Section::titled(
            "PATIENT INFORMATION",
            vec![
                Block::Text(format!("Patient ID: {}", patient_id)),
                Block::Text(format!("Age: {}", age)),
                Block::Text(format!("Gender: {}", or_not_available(&form.gender))),
                Block::Text(format!(
                    "Assessment Date: {}",
                    generated_at.format("%Y-%m-%d")
                )),
                Block::Text(format!(
                    "Assessment Time: {} UTC",
                    generated_at.format("%H:%M:%S")
                )),
                Block::Text(format!("Report ID: {}", report_id)),
            ],
        );

        let complaint = Section::titled(
            "PRIMARY COMPLAINT",
            vec![Block::Text(or_not_available(&form.primary_symptoms).to_string())],
        );

        let vitals = Section::titled(
            "VITAL SIGNS",
            result
                .vitals_analysis
                .iter()
                .map(|(sign, reading)| {
                    Block::Text(format!(
                        "{}: {} (Status: {})",
                        sign.display_name(),
                        reading.value,
                        reading.status
                    ))
                })
                .collect(),
        );

        let analysis = Section::titled(
            "AI DIAGNOSTIC ANALYSIS",
            vec![
                Block::Text(format!("Primary Diagnosis: {}", result.primary_diagnosis)),
                Block::Text(format!("AI Confidence Level: {}%", result.confidence)),
                Block::Text(format!("Risk Level: {}", result.risk_level())),
                Block::Text(format!("Triage Category: {}", result.triage_category())),
            ],
        );

        let recommendations = Section::titled(
            "RECOMMENDATIONS",
            result
                .recommendations
                .iter()
                .enumerate()
                .map(|(idx, rec)| Block::Hanging {
                    lead: format!("{}. ", idx + 1),
                    text: rec.clone(),
                })
                .collect(),
        );

        let differentials = Section::titled(
            "DIFFERENTIAL DIAGNOSES",
            result
                .differential_diagnoses
                .iter()
                .enumerate()
                .map(|(idx, diff)| Block::Hanging {
                    lead: format!("{}. ", idx + 1),
                    text: format!("{} ({}% probability)", diff.condition, diff.probability),
                })
                .collect(),
        );

        let mut next_steps = vec![
            Block::Text(format!("Timeline: {}", result.next_steps.timeframe)),
            Block::Text("Immediate Actions:".to_string()),
        ];
        next_steps.extend(
            result
                .next_steps
                .immediate_actions
                .iter()
                .map(|action| Block::Hanging {
                    lead: "  • ".to_string(),
                    text: action.clone(),
                }),
        );
        let next_steps = Section::titled("NEXT STEPS", next_steps);

        Self {
            report_id,
            patient_id,
            generated_at,
            sections: vec![
                header,
                patient,
                complaint,
                vitals,
                analysis,
                recommendations,
                differentials,
                next_steps,
            ],
        }
    }

    pub fn report_id(&self) -> Uuid {
        self.report_id
    }

    pub fn patient_id(&self) -> &str {
        &self.patient_id
    }

    /// `Medical_Report_<patientId>_<YYYYMMDDTHHMMSS>.txt`, with path
    /// separators and other unsafe characters in the id replaced by `_`.
    pub fn filename(&self) -> String {
        let id: String = self
            .patient_id
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                    c
                } else {
                    '_'
                }
            })
            .collect();
        format!(
            "Medical_Report_{}_{}.txt",
            id,
            self.generated_at.format("%Y%m%dT%H%M%S")
        )
    }

    /// Lays the report out into pages of exactly `lines_per_page` lines
    /// (or the footer size, if that is larger). A section that does not fit
    /// in the space left on a page starts the next one; a section longer
    /// than a whole page is split.
    pub fn paginate(&self, config: &ReportConfig) -> Vec<Vec<String>> {
        let width = config.line_width.max(1);
        let footer_len = footer(1, 1, width).len();
        let budget = config.lines_per_page.saturating_sub(footer_len).max(1);

        let mut bodies: Vec<Vec<String>> = Vec::new();
        let mut current: Vec<String> = Vec::new();
        for section in &self.sections {
            let lines = section.layout(width);
            if !current.is_empty() && current.len() + lines.len() > budget {
                bodies.push(std::mem::take(&mut current));
            }
            for line in lines {
                if current.len() == budget {
                    bodies.push(std::mem::take(&mut current));
                }
                current.push(line);
            }
        }
        if !current.is_empty() {
            bodies.push(current);
        }

        let total = bodies.len();
        bodies
            .into_iter()
            .enumerate()
            .map(|(idx, mut page)| {
                page.resize(budget, String::new());
                page.extend(footer(idx + 1, total, width));
                page
            })
            .collect()
    }

    /// Pages joined with form feeds.
    pub fn render(&self, config: &ReportConfig) -> String {
        self.paginate(config)
            .into_iter()
            .map(|page| page.join("\n"))
            .collect::<Vec<_>>()
            .join("\n\u{000C}\n")
    }

    /// Writes the rendered report into `dir` (created if missing) and
    /// returns the file path.
    #[instrument(skip(self, config), fields(patient_id = %self.patient_id))]
    pub async fn write_to(&self, dir: &Path, config: &ReportConfig) -> Result<PathBuf, ReportError> {
        let path = dir.join(self.filename());
        let write_err = |source| ReportError::Write {
            path: path.clone(),
            source,
        };

        tokio::fs::create_dir_all(dir).await.map_err(write_err)?;
        tokio::fs::write(&path, self.render(config))
            .await
            .map_err(write_err)?;

        info!(path = %path.display(), report_id = %self.report_id, "report written");
        Ok(path)
    }
}

fn or_not_available(value: &str) -> &str {
    match value.trim() {
        "" => VitalValue::NOT_AVAILABLE,
        trimmed => trimmed,
    }
}

fn footer(page: usize, total: usize, width: usize) -> Vec<String> {
    let mut lines = vec!["-".repeat(width.min(DISCLAIMER.len()))];
    lines.extend(wrap(DISCLAIMER, width));
    lines.push(format!("Page {} of {}", page, total));
    lines
}

/// Greedy word wrap. Words longer than `width` are split.
fn wrap(text: &str, width: usize) -> Vec<String> {
    let width = width.max(1);
    let mut lines = Vec::new();
    let mut line = String::new();
    let mut line_len = 0;

    for word in text.split_whitespace() {
        let mut chars: Vec<char> = word.chars().collect();
        while chars.len() > width {
            if line_len > 0 {
                lines.push(std::mem::take(&mut line));
                line_len = 0;
            }
            let rest = chars.split_off(width);
            lines.push(chars.into_iter().collect());
            chars = rest;
        }

        let word_len = chars.len();
        if line_len > 0 && line_len + 1 + word_len > width {
            lines.push(std::mem::take(&mut line));
            line_len = 0;
        }
        if line_len > 0 {
            line.push(' ');
            line_len += 1;
        }
        line.extend(chars);
        line_len += word_len;
    }

    if line_len > 0 || lines.is_empty() {
        lines.push(line);
    }
    lines
}
