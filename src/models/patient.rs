use serde::{Deserialize, Serialize};

/// Patient data as captured by the assessment form.
///
/// Numeric fields stay as the raw text the clinician typed. They are coerced
/// to numbers only when an analysis runs, and anything unparseable becomes 0.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PatientFormInput {
    pub patient_id: String,
    pub age: String,
    pub gender: String,
    pub weight: String,
    pub heart_rate: String,
    /// "systolic/diastolic", e.g. "120/80"
    pub blood_pressure: String,
    pub temperature: String,
    pub oxygen_saturation: String,
    pub respiratory_rate: String,
    pub primary_symptoms: String,
    pub secondary_symptoms: Vec<SecondarySymptom>,
    pub pain_level: String,
    pub symptom_duration: SymptomDuration,
    pub allergies: String,
    pub medications: String,
    pub previous_conditions: String,
}

impl PatientFormInput {
    pub fn has_symptom(&self, symptom: SecondarySymptom) -> bool {
        self.secondary_symptoms.contains(&symptom)
    }
}

/// Predefined symptom checkboxes offered next to the free-text complaint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SecondarySymptom {
    #[serde(rename = "Chest Pain")]
    ChestPain,
    #[serde(rename = "Shortness of Breath")]
    ShortnessOfBreath,
    #[serde(rename = "Nausea")]
    Nausea,
    #[serde(rename = "Dizziness")]
    Dizziness,
    #[serde(rename = "Headache")]
    Headache,
    #[serde(rename = "Fatigue")]
    Fatigue,
    #[serde(rename = "Fever")]
    Fever,
    #[serde(rename = "Abdominal Pain")]
    AbdominalPain,
}

impl SecondarySymptom {
    pub const ALL: [SecondarySymptom; 8] = [
        SecondarySymptom::ChestPain,
        SecondarySymptom::ShortnessOfBreath,
        SecondarySymptom::Nausea,
        SecondarySymptom::Dizziness,
        SecondarySymptom::Headache,
        SecondarySymptom::Fatigue,
        SecondarySymptom::Fever,
        SecondarySymptom::AbdominalPain,
    ];
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SymptomDuration {
    #[default]
    #[serde(rename = "")]
    Unspecified,
    Minutes,
    Hours,
    Days,
    Weeks,
    Months,
}

/// Integer coercion used for most vitals: leading whitespace is skipped, an
/// optional sign and the longest run of digits is read, and the rest of the
/// text is ignored ("98%" reads as 98, "110.7" as 110). No digits means 0.
pub fn parse_int_lenient(raw: &str) -> f64 {
    let s = raw.trim_start();
    let (negative, digits) = match s.as_bytes().first() {
        Some(b'-') => (true, &s[1..]),
        Some(b'+') => (false, &s[1..]),
        _ => (false, s),
    };
    let end = digits
        .bytes()
        .position(|b| !b.is_ascii_digit())
        .unwrap_or(digits.len());
    if end == 0 {
        return 0.0;
    }
    let value: f64 = digits[..end].parse().unwrap_or(0.0);
    if negative {
        -value
    } else {
        value
    }
}

/// Float coercion used for temperature: reads the longest leading decimal
/// literal (sign, digits, fraction, exponent) and ignores the rest.
pub fn parse_float_lenient(raw: &str) -> f64 {
    let s = raw.trim_start();
    let bytes = s.as_bytes();
    let mut end = 0;

    if matches!(bytes.first(), Some(b'-') | Some(b'+')) {
        end = 1;
    }
    let int_start = end;
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
    }
    let mut mantissa_digits = end - int_start;

    if end < bytes.len() && bytes[end] == b'.' {
        let frac_start = end + 1;
        let mut frac_end = frac_start;
        while frac_end < bytes.len() && bytes[frac_end].is_ascii_digit() {
            frac_end += 1;
        }
        mantissa_digits += frac_end - frac_start;
        if mantissa_digits > 0 {
            end = frac_end;
        }
    }
    if mantissa_digits == 0 {
        return 0.0;
    }

    // Exponent only counts when at least one digit follows it.
    if end < bytes.len() && (bytes[end] == b'e' || bytes[end] == b'E') {
        let mut exp_end = end + 1;
        if exp_end < bytes.len() && (bytes[exp_end] == b'-' || bytes[exp_end] == b'+') {
            exp_end += 1;
        }
        let exp_digits_start = exp_end;
        while exp_end < bytes.len() && bytes[exp_end].is_ascii_digit() {
            exp_end += 1;
        }
        if exp_end > exp_digits_start {
            end = exp_end;
        }
    }

    match s[..end].parse::<f64>() {
        Ok(v) if v.is_finite() => v,
        _ => 0.0,
    }
}

/// Whole-string coercion used when building model features. Surrounding
/// whitespace is allowed, anything else that is not a finite number is 0.
pub fn parse_number_strict(raw: &str) -> f64 {
    let s = raw.trim();
    if s.is_empty() {
        return 0.0;
    }
    // Rust accepts "inf"/"nan" spellings that a form value never means.
    if s.bytes().any(|b| b.is_ascii_alphabetic() && b != b'e' && b != b'E') {
        return 0.0;
    }
    match s.parse::<f64>() {
        Ok(v) if v.is_finite() => v,
        _ => 0.0,
    }
}
