use std::collections::BTreeMap;
use std::fmt;

use serde::{Serialize, Serializer};

/// Outcome of one triage analysis, consumed by the display layer and the
/// report formatter.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DiagnosticResult {
    pub primary_diagnosis: DiagnosisLabel,
    /// 0-100
    pub confidence: u8,
    #[serde(flatten)]
    pub triage: Triage,
    pub recommendations: Vec<String>,
    pub vitals_analysis: BTreeMap<VitalSign, VitalReading>,
    pub differential_diagnoses: Vec<DifferentialDiagnosis>,
    pub next_steps: NextSteps,
}

impl DiagnosticResult {
    pub fn risk_level(&self) -> RiskLevel {
        self.triage.risk_level()
    }

    pub fn triage_category(&self) -> TriageCategory {
        self.triage.category()
    }
}

/// The fixed diagnosis label set. Declaration order is the class order of
/// the trained model output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DiagnosisLabel {
    GeneralMalaise,
    ChestPainNonCardiac,
    CardiacEventPossible,
    AcuteCoronarySyndromeSuspected,
    RespiratoryDistress,
    FebrileIllness,
}

impl DiagnosisLabel {
    pub const ALL: [DiagnosisLabel; 6] = [
        DiagnosisLabel::GeneralMalaise,
        DiagnosisLabel::ChestPainNonCardiac,
        DiagnosisLabel::CardiacEventPossible,
        DiagnosisLabel::AcuteCoronarySyndromeSuspected,
        DiagnosisLabel::RespiratoryDistress,
        DiagnosisLabel::FebrileIllness,
    ];

    /// Number of model output classes
    pub const NUM_CLASSES: usize = 6;

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DiagnosisLabel::GeneralMalaise => "General Malaise",
            DiagnosisLabel::ChestPainNonCardiac => "Chest Pain - Non-Cardiac",
            DiagnosisLabel::CardiacEventPossible => "Cardiac Event (Possible)",
            DiagnosisLabel::AcuteCoronarySyndromeSuspected => "Acute Coronary Syndrome (Suspected)",
            DiagnosisLabel::RespiratoryDistress => "Respiratory Distress",
            DiagnosisLabel::FebrileIllness => "Febrile Illness",
        }
    }
}

impl fmt::Display for DiagnosisLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for DiagnosisLabel {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl RiskLevel {
    /// Rule-engine policy: buckets the accumulated risk score.
    pub fn from_risk_score(score: i32) -> Self {
        if score >= 70 {
            RiskLevel::High
        } else if score >= 40 {
            RiskLevel::Medium
        } else {
            RiskLevel::Low
        }
    }

    /// Model policy: buckets the top-class confidence. Deliberately separate
    /// from the score policy; the two disagree on the same patient.
    pub fn from_model_confidence(confidence: u8) -> Self {
        if confidence >= 80 {
            RiskLevel::High
        } else if confidence >= 50 {
            RiskLevel::Medium
        } else {
            RiskLevel::Low
        }
    }

    pub fn triage_category(&self) -> TriageCategory {
        match self {
            RiskLevel::High => TriageCategory::Priority1,
            RiskLevel::Medium => TriageCategory::Priority2,
            RiskLevel::Low => TriageCategory::Priority3,
        }
    }

    /// How soon the immediate actions must start
    pub fn timeframe(&self) -> &'static str {
        match self {
            RiskLevel::High => "< 15 minutes",
            RiskLevel::Medium => "< 30 minutes",
            RiskLevel::Low => "< 1 hour",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Low => "LOW",
            RiskLevel::Medium => "MEDIUM",
            RiskLevel::High => "HIGH",
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum TriageCategory {
    #[serde(rename = "PRIORITY 1")]
    Priority1,
    #[serde(rename = "PRIORITY 2")]
    Priority2,
    #[serde(rename = "PRIORITY 3")]
    Priority3,
}

impl TriageCategory {
    /// 1 = most urgent
    pub fn priority(&self) -> u8 {
        match self {
            TriageCategory::Priority1 => 1,
            TriageCategory::Priority2 => 2,
            TriageCategory::Priority3 => 3,
        }
    }
}

impl fmt::Display for TriageCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PRIORITY {}", self.priority())
    }
}

/// Risk level and triage category, always derived together.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Triage {
    risk_level: RiskLevel,
    triage_category: TriageCategory,
}

impl Triage {
    pub fn from_risk_level(risk_level: RiskLevel) -> Self {
        Self {
            risk_level,
            triage_category: risk_level.triage_category(),
        }
    }

    pub fn risk_level(&self) -> RiskLevel {
        self.risk_level
    }

    pub fn category(&self) -> TriageCategory {
        self.triage_category
    }
}

/// Vitals reported in the analysis, in display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum VitalSign {
    HeartRate,
    BloodPressure,
    Temperature,
    OxygenSaturation,
}

impl VitalSign {
    /// Upper-case display name, e.g. "OXYGEN SATURATION"
    pub fn display_name(&self) -> &'static str {
        match self {
            VitalSign::HeartRate => "HEART RATE",
            VitalSign::BloodPressure => "BLOOD PRESSURE",
            VitalSign::Temperature => "TEMPERATURE",
            VitalSign::OxygenSaturation => "OXYGEN SATURATION",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VitalReading {
    pub value: VitalValue,
    pub status: VitalStatus,
    /// Normal range shown next to the value
    pub normal: &'static str,
}

/// A parsed vital, or "N/A" when nothing usable was entered.
#[derive(Debug, Clone, PartialEq)]
pub enum VitalValue {
    Number(f64),
    Text(String),
}

impl VitalValue {
    pub const NOT_AVAILABLE: &'static str = "N/A";

    /// 0 doubles as "not entered", matching the form's coercion.
    pub fn from_number(value: f64) -> Self {
        if value == 0.0 {
            VitalValue::Text(Self::NOT_AVAILABLE.to_string())
        } else {
            VitalValue::Number(value)
        }
    }

    pub fn from_text(value: &str) -> Self {
        if value.is_empty() {
            VitalValue::Text(Self::NOT_AVAILABLE.to_string())
        } else {
            VitalValue::Text(value.to_string())
        }
    }
}

// Whole readings serialize as JSON integers (`110`, not `110.0`).
impl Serialize for VitalValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            VitalValue::Number(n) if n.fract() == 0.0 && n.abs() < i64::MAX as f64 => {
                serializer.serialize_i64(*n as i64)
            }
            VitalValue::Number(n) => serializer.serialize_f64(*n),
            VitalValue::Text(s) => serializer.serialize_str(s),
        }
    }
}

impl fmt::Display for VitalValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VitalValue::Number(n) => write!(f, "{}", n),
            VitalValue::Text(s) => f.write_str(s),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum VitalStatus {
    Elevated,
    Low,
    LowNormal,
    Normal,
}

impl fmt::Display for VitalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            VitalStatus::Elevated => "elevated",
            VitalStatus::Low => "low",
            VitalStatus::LowNormal => "low-normal",
            VitalStatus::Normal => "normal",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DifferentialDiagnosis {
    pub condition: String,
    pub probability: i32,
}

impl DifferentialDiagnosis {
    pub fn new(condition: impl Into<String>, probability: i32) -> Self {
        Self {
            condition: condition.into(),
            probability,
        }
    }
}

/// Sorts highest probability first; equal probabilities keep their order.
pub fn rank_differentials(differentials: &mut [DifferentialDiagnosis]) {
    differentials.sort_by(|a, b| b.probability.cmp(&a.probability));
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NextSteps {
    pub immediate_actions: Vec<String>,
    pub timeframe: String,
}

impl NextSteps {
    /// First three recommendations plus the timeframe for the risk level.
    pub fn for_recommendations(recommendations: &[String], risk_level: RiskLevel) -> Self {
        Self {
            immediate_actions: recommendations.iter().take(3).cloned().collect(),
            timeframe: risk_level.timeframe().to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case(90, RiskLevel::High ; "well above high")]
    #[test_case(70, RiskLevel::High ; "high boundary")]
    #[test_case(69, RiskLevel::Medium ; "just below high")]
    #[test_case(40, RiskLevel::Medium ; "medium boundary")]
    #[test_case(39, RiskLevel::Low ; "just below medium")]
    #[test_case(0, RiskLevel::Low ; "zero")]
    fn score_policy(score: i32, expected: RiskLevel) {
        assert_eq!(RiskLevel::from_risk_score(score), expected);
    }

    #[test_case(80, RiskLevel::High ; "high boundary")]
    #[test_case(79, RiskLevel::Medium ; "just below high")]
    #[test_case(50, RiskLevel::Medium ; "medium boundary")]
    #[test_case(49, RiskLevel::Low ; "just below medium")]
    fn confidence_policy(confidence: u8, expected: RiskLevel) {
        assert_eq!(RiskLevel::from_model_confidence(confidence), expected);
    }

    #[test]
    fn policies_disagree_on_same_number() {
        // 75 is HIGH as a risk score but only MEDIUM as a model confidence
        assert_eq!(RiskLevel::from_risk_score(75), RiskLevel::High);
        assert_eq!(RiskLevel::from_model_confidence(75), RiskLevel::Medium);
    }

    #[test]
    fn triage_follows_risk_level() {
        let triage = Triage::from_risk_level(RiskLevel::Medium);
        assert_eq!(triage.category(), TriageCategory::Priority2);
        assert_eq!(triage.category().to_string(), "PRIORITY 2");
    }

    #[test]
    fn labels_round_trip_through_index() {
        for (idx, label) in DiagnosisLabel::ALL.iter().enumerate() {
            assert_eq!(DiagnosisLabel::from_index(idx), Some(*label));
        }
        assert_eq!(DiagnosisLabel::from_index(6), None);
    }

    #[test]
    fn ranking_is_stable_for_ties() {
        let mut diffs = vec![
            DifferentialDiagnosis::new("A", 10),
            DifferentialDiagnosis::new("B", 30),
            DifferentialDiagnosis::new("C", 10),
            DifferentialDiagnosis::new("D", 30),
        ];
        rank_differentials(&mut diffs);
        let order: Vec<_> = diffs.iter().map(|d| d.condition.as_str()).collect();
        assert_eq!(order, vec!["B", "D", "A", "C"]);
    }

    #[test]
    fn vital_value_uses_na_for_zero() {
        assert_eq!(VitalValue::from_number(0.0).to_string(), "N/A");
        assert_eq!(VitalValue::from_number(110.0).to_string(), "110");
        assert_eq!(VitalValue::from_number(38.5).to_string(), "38.5");
        assert_eq!(VitalValue::from_text("").to_string(), "N/A");
    }

    #[test]
    fn whole_vital_values_serialize_as_integers() {
        let json = |v: VitalValue| serde_json::to_string(&v).unwrap();
        assert_eq!(json(VitalValue::from_number(110.0)), "110");
        assert_eq!(json(VitalValue::from_number(-3.0)), "-3");
        assert_eq!(json(VitalValue::from_number(38.5)), "38.5");
        assert_eq!(json(VitalValue::from_number(0.0)), "\"N/A\"");
        assert_eq!(json(VitalValue::from_text("160/95")), "\"160/95\"");
    }

    #[test]
    fn next_steps_take_at_most_three() {
        let recs: Vec<String> = vec!["a".into(), "b".into()];
        let steps = NextSteps::for_recommendations(&recs, RiskLevel::Low);
        assert_eq!(steps.immediate_actions, recs);
        assert_eq!(steps.timeframe, "< 1 hour");
    }

    #[test]
    fn result_serializes_with_flat_triage_fields() {
        let result = DiagnosticResult {
            primary_diagnosis: DiagnosisLabel::FebrileIllness,
            confidence: 75,
            triage: Triage::from_risk_level(RiskLevel::Low),
            recommendations: vec![],
            vitals_analysis: BTreeMap::new(),
            differential_diagnoses: vec![],
            next_steps: NextSteps::for_recommendations(&[], RiskLevel::Low),
        };
        let json = serde_json::to_value(&result).unwrap();

        assert_eq!(json["primaryDiagnosis"], "Febrile Illness");
        assert_eq!(json["riskLevel"], "LOW");
        assert_eq!(json["triageCategory"], "PRIORITY 3");
        assert_eq!(json["nextSteps"]["timeframe"], "< 1 hour");
    }
}
