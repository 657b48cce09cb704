use std::collections::BTreeMap;

use crate::models::patient::{parse_float_lenient, parse_int_lenient, parse_number_strict};
use crate::models::{
    PatientFormInput, SecondarySymptom, VitalReading, VitalSign, VitalStatus, VitalValue,
};

/// Length of the model feature vector
pub const FEATURE_COUNT: usize = 11;

/// Numeric vitals coerced from the form. Unparseable entries are 0.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ParsedVitals {
    pub heart_rate: f64,
    pub temperature: f64,
    pub oxygen_saturation: f64,
    pub respiratory_rate: f64,
    pub pain_level: f64,
    pub age: f64,
}

impl ParsedVitals {
    pub fn from_form(form: &PatientFormInput) -> Self {
        Self {
            heart_rate: parse_int_lenient(&form.heart_rate),
            temperature: parse_float_lenient(&form.temperature),
            oxygen_saturation: parse_int_lenient(&form.oxygen_saturation),
            respiratory_rate: parse_int_lenient(&form.respiratory_rate),
            pain_level: parse_int_lenient(&form.pain_level),
            age: parse_int_lenient(&form.age),
        }
    }
}

/// Symptom flags the rule engine branches on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SymptomFlags {
    pub chest_pain: bool,
    pub breathing_issues: bool,
    pub nausea: bool,
    pub dizziness: bool,
    pub fever: bool,
}

impl SymptomFlags {
    pub fn derive(form: &PatientFormInput, vitals: &ParsedVitals) -> Self {
        let complaint = form.primary_symptoms.to_lowercase();
        Self {
            chest_pain: mentions_chest_pain(&complaint),
            breathing_issues: complaint.contains("breath")
                || complaint.contains("shortness")
                || form.has_symptom(SecondarySymptom::ShortnessOfBreath),
            nausea: form.has_symptom(SecondarySymptom::Nausea),
            dizziness: form.has_symptom(SecondarySymptom::Dizziness),
            fever: form.has_symptom(SecondarySymptom::Fever) || vitals.temperature > 37.5,
        }
    }
}

fn mentions_chest_pain(lowercase_complaint: &str) -> bool {
    lowercase_complaint.contains("chest") || lowercase_complaint.contains("pain")
}

/// Builds the fixed-order model input: age, heart rate, respiratory rate,
/// temperature, oxygen saturation, pain level, then 0/1 flags for chest
/// pain, shortness of breath, nausea, dizziness and fever.
///
/// The flags only look at the checkbox tags (apart from chest pain, which
/// reads the complaint text), which is what the model was trained on.
pub fn feature_vector(form: &PatientFormInput) -> [f32; FEATURE_COUNT] {
    let flag = |set: bool| if set { 1.0 } else { 0.0 };
    let complaint = form.primary_symptoms.to_lowercase();

    [
        parse_number_strict(&form.age) as f32,
        parse_number_strict(&form.heart_rate) as f32,
        parse_number_strict(&form.respiratory_rate) as f32,
        parse_number_strict(&form.temperature) as f32,
        parse_number_strict(&form.oxygen_saturation) as f32,
        parse_number_strict(&form.pain_level) as f32,
        flag(mentions_chest_pain(&complaint)),
        flag(form.has_symptom(SecondarySymptom::ShortnessOfBreath)),
        flag(form.has_symptom(SecondarySymptom::Nausea)),
        flag(form.has_symptom(SecondarySymptom::Dizziness)),
        flag(form.has_symptom(SecondarySymptom::Fever)),
    ]
}

pub fn heart_rate_reading(heart_rate: f64) -> VitalReading {
    let status = if heart_rate > 100.0 {
        VitalStatus::Elevated
    } else if heart_rate < 60.0 {
        VitalStatus::Low
    } else {
        VitalStatus::Normal
    };
    VitalReading {
        value: VitalValue::from_number(heart_rate),
        status,
        normal: "60-100 bpm",
    }
}

pub fn temperature_reading(temperature: f64) -> VitalReading {
    let status = if temperature > 37.5 {
        VitalStatus::Elevated
    } else if temperature < 36.0 {
        VitalStatus::Low
    } else {
        VitalStatus::Normal
    };
    VitalReading {
        value: VitalValue::from_number(temperature),
        status,
        normal: "36.1-37.2°C",
    }
}

pub fn oxygen_saturation_reading(oxygen_saturation: f64) -> VitalReading {
    let status = if oxygen_saturation < 95.0 {
        VitalStatus::Low
    } else if oxygen_saturation < 97.0 {
        VitalStatus::LowNormal
    } else {
        VitalStatus::Normal
    };
    VitalReading {
        value: VitalValue::from_number(oxygen_saturation),
        status,
        normal: "95-100%",
    }
}

/// Elevated when the systolic part of "systolic/diastolic" exceeds 140.
pub fn blood_pressure_reading(blood_pressure: &str) -> VitalReading {
    let systolic = blood_pressure
        .split('/')
        .next()
        .map(parse_int_lenient)
        .unwrap_or(0.0);
    let status = if systolic > 140.0 {
        VitalStatus::Elevated
    } else {
        VitalStatus::Normal
    };
    VitalReading {
        value: VitalValue::from_text(blood_pressure),
        status,
        normal: "120/80 mmHg",
    }
}

/// Heart rate, temperature and oxygen saturation readings.
pub fn core_vitals_analysis(vitals: &ParsedVitals) -> BTreeMap<VitalSign, VitalReading> {
    let mut analysis = BTreeMap::new();
    analysis.insert(VitalSign::HeartRate, heart_rate_reading(vitals.heart_rate));
    analysis.insert(VitalSign::Temperature, temperature_reading(vitals.temperature));
    analysis.insert(
        VitalSign::OxygenSaturation,
        oxygen_saturation_reading(vitals.oxygen_saturation),
    );
    analysis
}

/// Core vitals plus blood pressure.
pub fn full_vitals_analysis(
    form: &PatientFormInput,
    vitals: &ParsedVitals,
) -> BTreeMap<VitalSign, VitalReading> {
    let mut analysis = core_vitals_analysis(vitals);
    analysis.insert(
        VitalSign::BloodPressure,
        blood_pressure_reading(&form.blood_pressure),
    );
    analysis
}
