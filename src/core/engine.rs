//! Rule-based triage classifier.
//!
//! A priority chain over the parsed vitals and symptom flags: the cardiac
//! pathway is checked first, then respiratory, then febrile, and anything
//! else is general malaise. Exactly one pathway contributes to the risk
//! score.

use tracing::debug;

use super::data::{full_vitals_analysis, ParsedVitals, SymptomFlags};
use crate::models::{
    diagnosis::rank_differentials, DiagnosisLabel, DiagnosticResult, DifferentialDiagnosis,
    NextSteps, PatientFormInput, RiskLevel, SecondarySymptom, Triage,
};

/// Pathway taken through the priority chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClinicalPathway {
    Cardiac,
    Respiratory,
    Febrile,
    General,
}

/// Pathway plus the score and labelling it produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PathwayAssessment {
    pub pathway: ClinicalPathway,
    pub risk_score: i32,
    pub diagnosis: DiagnosisLabel,
    pub confidence: u8,
}

pub fn assess_pathway(
    form: &PatientFormInput,
    vitals: &ParsedVitals,
    flags: &SymptomFlags,
) -> PathwayAssessment {
    if flags.chest_pain && (flags.breathing_issues || flags.nausea || flags.dizziness) {
        let mut risk_score = 40;
        if vitals.heart_rate > 100.0 || vitals.heart_rate < 50.0 {
            risk_score += 20;
        }
        if vitals.age > 45.0 {
            risk_score += 15;
        }
        if vitals.pain_level >= 7.0 {
            risk_score += 15;
        }

        let (diagnosis, confidence) = if risk_score >= 70 {
            (DiagnosisLabel::AcuteCoronarySyndromeSuspected, 85)
        } else if risk_score >= 50 {
            (DiagnosisLabel::CardiacEventPossible, 75)
        } else {
            (DiagnosisLabel::ChestPainNonCardiac, 70)
        };

        PathwayAssessment {
            pathway: ClinicalPathway::Cardiac,
            risk_score,
            diagnosis,
            confidence,
        }
    } else if flags.breathing_issues && (flags.fever || vitals.respiratory_rate > 20.0) {
        let mut risk_score = 30;
        if vitals.oxygen_saturation < 95.0 {
            risk_score += 25;
        }
        if vitals.temperature > 38.0 {
            risk_score += 20;
        }

        PathwayAssessment {
            pathway: ClinicalPathway::Respiratory,
            risk_score,
            diagnosis: DiagnosisLabel::RespiratoryDistress,
            confidence: 80,
        }
    } else if flags.fever {
        let mut risk_score = 20;
        if vitals.temperature > 39.0 {
            risk_score += 15;
        }
        if form.has_symptom(SecondarySymptom::Headache) {
            risk_score += 10;
        }

        PathwayAssessment {
            pathway: ClinicalPathway::Febrile,
            risk_score,
            diagnosis: DiagnosisLabel::FebrileIllness,
            confidence: 75,
        }
    } else {
        PathwayAssessment {
            pathway: ClinicalPathway::General,
            risk_score: 0,
            diagnosis: DiagnosisLabel::GeneralMalaise,
            confidence: 65,
        }
    }
}

/// Recommendations depend only on the risk level, never on the diagnosis.
pub fn recommendations_for(risk_level: RiskLevel) -> Vec<String> {
    let items: &[&str] = match risk_level {
        RiskLevel::High => &[
            "Immediate medical attention required",
            "Continuous cardiac monitoring",
            "Establish IV access",
            "12-lead ECG within 10 minutes",
            "Contact emergency medical team",
        ],
        RiskLevel::Medium => &[
            "Monitor vital signs closely",
            "Consider pain management",
            "Reassess in 30 minutes",
            "Prepare for potential escalation",
        ],
        RiskLevel::Low => &[
            "Standard monitoring protocol",
            "Symptomatic treatment",
            "Patient comfort measures",
            "Regular reassessment",
        ],
    };
    items.iter().map(|s| s.to_string()).collect()
}

/// Alternatives keyed by the chest-pain and breathing flags, not by the
/// pathway, so a febrile patient mentioning pain still gets cardiac
/// differentials. Returned ranked.
pub fn differentials_for(flags: &SymptomFlags, risk_score: i32) -> Vec<DifferentialDiagnosis> {
    let mut differentials = if flags.chest_pain {
        vec![
            DifferentialDiagnosis::new("Myocardial Infarction", risk_score.min(65)),
            DifferentialDiagnosis::new("Unstable Angina", (risk_score - 20).max(0)),
            DifferentialDiagnosis::new("Musculoskeletal Pain", 100 - risk_score),
            DifferentialDiagnosis::new("Gastroesophageal Reflux", (40 - risk_score).max(0)),
        ]
    } else if flags.breathing_issues {
        vec![
            DifferentialDiagnosis::new("Pneumonia", (risk_score + 10).min(70)),
            DifferentialDiagnosis::new("Asthma Exacerbation", (60 - risk_score).max(0)),
            DifferentialDiagnosis::new("Pulmonary Embolism", risk_score.min(30)),
        ]
    } else {
        vec![
            DifferentialDiagnosis::new("Viral Syndrome", 60),
            DifferentialDiagnosis::new("Anxiety Disorder", 25),
            DifferentialDiagnosis::new("Medication Side Effect", 15),
        ]
    };
    rank_differentials(&mut differentials);
    differentials
}

/// Runs the rule engine. Total and pure: the same form always yields the
/// same result and nothing here can fail.
pub fn analyze(form: &PatientFormInput) -> DiagnosticResult {
    let vitals = ParsedVitals::from_form(form);
    let flags = SymptomFlags::derive(form, &vitals);
    let assessment = assess_pathway(form, &vitals, &flags);

    // Bucketed from the score alone; the pathway's confidence can disagree.
    let risk_level = RiskLevel::from_risk_score(assessment.risk_score);
    debug!(
        pathway = ?assessment.pathway,
        risk_score = assessment.risk_score,
        %risk_level,
        "rule engine assessment"
    );

    let recommendations = recommendations_for(risk_level);
    let next_steps = NextSteps::for_recommendations(&recommendations, risk_level);

    DiagnosticResult {
        primary_diagnosis: assessment.diagnosis,
        confidence: assessment.confidence,
        triage: Triage::from_risk_level(risk_level),
        recommendations,
        vitals_analysis: full_vitals_analysis(form, &vitals),
        differential_diagnoses: differentials_for(&flags, assessment.risk_score),
        next_steps,
    }
}
