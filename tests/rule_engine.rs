//! End-to-end behaviour of the rule engine on whole assessments.

use fake::faker::lorem::en::Words;
use fake::{Fake, Faker};
use test_case::test_case;

use medsat::core::engine;
use medsat::models::{
    DiagnosisLabel, PatientFormInput, RiskLevel, SecondarySymptom, TriageCategory, VitalSign,
    VitalStatus,
};

struct Scenario {
    primary: &'static str,
    secondary: &'static [SecondarySymptom],
    heart_rate: &'static str,
    age: &'static str,
    pain: &'static str,
    temperature: &'static str,
    respiratory_rate: &'static str,
    oxygen: &'static str,
}

const EMPTY: Scenario = Scenario {
    primary: "",
    secondary: &[],
    heart_rate: "",
    age: "",
    pain: "",
    temperature: "",
    respiratory_rate: "",
    oxygen: "",
};

impl Scenario {
    fn form(&self) -> PatientFormInput {
        PatientFormInput {
            patient_id: "P-TEST".into(),
            primary_symptoms: self.primary.into(),
            secondary_symptoms: self.secondary.to_vec(),
            heart_rate: self.heart_rate.into(),
            age: self.age.into(),
            pain_level: self.pain.into(),
            temperature: self.temperature.into(),
            respiratory_rate: self.respiratory_rate.into(),
            oxygen_saturation: self.oxygen.into(),
            ..Default::default()
        }
    }
}

#[test_case(
    Scenario { primary: "severe chest pain", secondary: &[SecondarySymptom::ShortnessOfBreath], heart_rate: "110", age: "50", pain: "8", ..EMPTY },
    DiagnosisLabel::AcuteCoronarySyndromeSuspected, 85, RiskLevel::High, TriageCategory::Priority1
    ; "cardiac acs"
)]
#[test_case(
    Scenario { primary: "shortness of breath", secondary: &[SecondarySymptom::Fever], temperature: "38.5", respiratory_rate: "22", oxygen: "93", ..EMPTY },
    DiagnosisLabel::RespiratoryDistress, 80, RiskLevel::High, TriageCategory::Priority1
    ; "respiratory distress"
)]
#[test_case(
    Scenario { secondary: &[SecondarySymptom::Fever], temperature: "39.5", ..EMPTY },
    DiagnosisLabel::FebrileIllness, 75, RiskLevel::Low, TriageCategory::Priority3
    ; "febrile confidence and risk diverge"
)]
#[test_case(
    EMPTY,
    DiagnosisLabel::GeneralMalaise, 65, RiskLevel::Low, TriageCategory::Priority3
    ; "empty form"
)]
#[test_case(
    Scenario { primary: "???", heart_rate: "fast", age: "old", pain: "lots", temperature: "hot", respiratory_rate: "n/a", oxygen: "low", ..EMPTY },
    DiagnosisLabel::GeneralMalaise, 65, RiskLevel::Low, TriageCategory::Priority3
    ; "unparseable fields"
)]
fn scenarios(
    scenario: Scenario,
    diagnosis: DiagnosisLabel,
    confidence: u8,
    risk_level: RiskLevel,
    category: TriageCategory,
) {
    let result = engine::analyze(&scenario.form());

    assert_eq!(result.primary_diagnosis, diagnosis);
    assert_eq!(result.confidence, confidence);
    assert_eq!(result.risk_level(), risk_level);
    assert_eq!(result.triage_category(), category);
}

#[test]
fn acs_scenario_details() {
    let form = Scenario {
        primary: "severe chest pain",
        secondary: &[SecondarySymptom::ShortnessOfBreath],
        heart_rate: "110",
        age: "50",
        pain: "8",
        ..EMPTY
    }
    .form();
    let result = engine::analyze(&form);

    // score 90: MI 65, UA 70, MSK 10, GERD 0
    let differentials: Vec<_> = result
        .differential_diagnoses
        .iter()
        .map(|d| (d.condition.as_str(), d.probability))
        .collect();
    assert_eq!(
        differentials,
        vec![
            ("Unstable Angina", 70),
            ("Myocardial Infarction", 65),
            ("Musculoskeletal Pain", 10),
            ("Gastroesophageal Reflux", 0),
        ]
    );
    assert_eq!(result.next_steps.timeframe, "< 15 minutes");
    assert_eq!(
        result.next_steps.immediate_actions,
        vec![
            "Immediate medical attention required",
            "Continuous cardiac monitoring",
            "Establish IV access"
        ]
    );
    assert_eq!(
        result.vitals_analysis[&VitalSign::HeartRate].status,
        VitalStatus::Elevated
    );
}

#[test]
fn result_json_shape() {
    let form = Scenario {
        secondary: &[SecondarySymptom::Fever],
        temperature: "39.5",
        oxygen: "96",
        ..EMPTY
    }
    .form();
    let json = serde_json::to_value(engine::analyze(&form)).unwrap();

    assert_eq!(json["primaryDiagnosis"], "Febrile Illness");
    assert_eq!(json["confidence"], 75);
    assert_eq!(json["riskLevel"], "LOW");
    assert_eq!(json["triageCategory"], "PRIORITY 3");
    assert_eq!(json["vitalsAnalysis"]["temperature"]["value"], 39.5);
    assert_eq!(json["vitalsAnalysis"]["temperature"]["normal"], "36.1-37.2°C");
    assert_eq!(json["vitalsAnalysis"]["oxygenSaturation"]["status"], "low-normal");
    assert_eq!(json["vitalsAnalysis"]["oxygenSaturation"]["value"].as_i64(), Some(96));
    assert_eq!(json["vitalsAnalysis"]["heartRate"]["value"], "N/A");
    assert_eq!(json["vitalsAnalysis"]["bloodPressure"]["value"], "N/A");
    assert_eq!(json["nextSteps"]["immediateActions"].as_array().unwrap().len(), 3);
}

#[test]
fn form_json_with_missing_fields_deserializes() {
    let form: PatientFormInput = serde_json::from_str(
        r#"{"patientId":"P-1","temperature":"39.5","secondarySymptoms":["Fever","Headache"]}"#,
    )
    .unwrap();
    let result = engine::analyze(&form);

    // 20 + 15 + 10
    assert_eq!(result.risk_level(), RiskLevel::Medium);
    assert_eq!(result.primary_diagnosis, DiagnosisLabel::FebrileIllness);
}

fn numeric_ish() -> String {
    match (0..4).fake::<u8>() {
        0 => String::new(),
        1 => (0..250).fake::<i32>().to_string(),
        2 => format!("{:.1}", (30.0..42.0).fake::<f64>()),
        _ => Faker.fake::<String>(),
    }
}

fn random_form() -> PatientFormInput {
    let words: Vec<String> = Words(0..6).fake();
    let mut primary = words.join(" ");
    if Faker.fake::<bool>() {
        primary.push_str(" chest pain");
    }
    if Faker.fake::<bool>() {
        primary.push_str(" short of breath");
    }

    PatientFormInput {
        patient_id: Faker.fake(),
        age: numeric_ish(),
        heart_rate: numeric_ish(),
        blood_pressure: format!("{}/{}", (80..220).fake::<u16>(), (40..130).fake::<u16>()),
        temperature: numeric_ish(),
        oxygen_saturation: numeric_ish(),
        respiratory_rate: numeric_ish(),
        pain_level: numeric_ish(),
        primary_symptoms: primary,
        secondary_symptoms: SecondarySymptom::ALL
            .iter()
            .copied()
            .filter(|_| Faker.fake::<bool>())
            .collect(),
        ..Default::default()
    }
}

#[test]
fn random_forms_hold_result_invariants() {
    for _ in 0..500 {
        let form = random_form();
        let result = engine::analyze(&form);

        assert!(result.confidence <= 100, "{:?}", form);
        assert_eq!(result.triage_category(), result.risk_level().triage_category());
        assert!(
            result
                .differential_diagnoses
                .windows(2)
                .all(|w| w[0].probability >= w[1].probability),
            "unsorted differentials for {:?}",
            form
        );
        let expected_actions: Vec<_> = result.recommendations.iter().take(3).cloned().collect();
        assert_eq!(result.next_steps.immediate_actions, expected_actions);
        assert_eq!(result.next_steps.timeframe, result.risk_level().timeframe());
        assert_eq!(result.vitals_analysis.len(), 4);
    }
}

#[test]
fn analysis_is_idempotent() {
    for _ in 0..200 {
        let form = random_form();
        assert_eq!(engine::analyze(&form), engine::analyze(&form));
    }
}
