//! Data carried through an assessment: the submitted form and the analysis
//! produced from it.

pub mod diagnosis;
pub mod patient;

pub use diagnosis::{
    DiagnosisLabel, DiagnosticResult, DifferentialDiagnosis, NextSteps, RiskLevel, Triage,
    TriageCategory, VitalReading, VitalSign, VitalStatus, VitalValue,
};
pub use patient::{PatientFormInput, SecondarySymptom, SymptomDuration};
