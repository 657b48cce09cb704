//! Demo assessment history shown alongside new assessments.
//!
//! The records are fixed sample data; nothing is persisted.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::models::RiskLevel;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum AssessmentStatus {
    /// Sent over the uplink to the receiving facility
    Transmitted,
    Completed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordedVitals {
    pub blood_pressure: &'static str,
    pub heart_rate: &'static str,
    pub temperature: &'static str,
    pub oxygen_saturation: &'static str,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AssessmentRecord {
    pub id: &'static str,
    pub date: &'static str,
    pub time: &'static str,
    pub patient_name: &'static str,
    pub age: u8,
    pub primary_complaint: &'static str,
    pub diagnosis: &'static str,
    pub risk_level: RiskLevel,
    pub status: AssessmentStatus,
    pub vitals: RecordedVitals,
}

/// Assessment counts per risk level.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HistorySummary {
    pub total: usize,
    pub by_risk: BTreeMap<RiskLevel, usize>,
}

pub fn sample_history() -> Vec<AssessmentRecord> {
    vec![
        AssessmentRecord {
            id: "P-2024-001",
            date: "2024-07-25",
            time: "14:30",
            patient_name: "John Smith",
            age: 45,
            primary_complaint: "Chest pain with shortness of breath",
            diagnosis: "Acute Coronary Syndrome",
            risk_level: RiskLevel::High,
            status: AssessmentStatus::Transmitted,
            vitals: RecordedVitals {
                blood_pressure: "160/95",
                heart_rate: "105",
                temperature: "98.6°F",
                oxygen_saturation: "94%",
            },
        },
        AssessmentRecord {
            id: "P-2024-002",
            date: "2024-07-25",
            time: "13:15",
            patient_name: "Sarah Johnson",
            age: 32,
            primary_complaint: "High fever and severe headache",
            diagnosis: "Viral Meningitis (suspected)",
            risk_level: RiskLevel::Medium,
            status: AssessmentStatus::Completed,
            vitals: RecordedVitals {
                blood_pressure: "110/70",
                heart_rate: "95",
                temperature: "103.2°F",
                oxygen_saturation: "98%",
            },
        },
        AssessmentRecord {
            id: "P-2024-003",
            date: "2024-07-25",
            time: "11:45",
            patient_name: "Michael Brown",
            age: 28,
            primary_complaint: "Mild headache and fatigue",
            diagnosis: "Tension Headache",
            risk_level: RiskLevel::Low,
            status: AssessmentStatus::Completed,
            vitals: RecordedVitals {
                blood_pressure: "120/80",
                heart_rate: "72",
                temperature: "98.4°F",
                oxygen_saturation: "99%",
            },
        },
    ]
}

/// Case-insensitive lookup by assessment id.
pub fn find_assessment(id: &str) -> Option<AssessmentRecord> {
    let id = id.trim();
    sample_history()
        .into_iter()
        .find(|record| record.id.eq_ignore_ascii_case(id))
}

pub fn summarize() -> HistorySummary {
    let records = sample_history();
    let mut by_risk = BTreeMap::new();
    for record in &records {
        *by_risk.entry(record.risk_level).or_insert(0) += 1;
    }
    HistorySummary {
        total: records.len(),
        by_risk,
    }
}
