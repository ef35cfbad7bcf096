//! The Patient entity and its derived health metric.
//!
//! A [`Patient`] can only be obtained through [`crate::validation::validate_patient`], so every
//! instance satisfies the field constraints. Body mass index and the verdict are derived from
//! height and weight on every read and are never persisted.

use crate::constants::{
    AGE_FIELD, BMI_FIELD, CITY_FIELD, DISEASE_FIELD, EMAIL_FIELD, GENDER_FIELD, HEIGHT_FIELD,
    NAME_FIELD, VERDICT_FIELD, WEIGHT_FIELD,
};
use crate::store::Record;
use pms_types::{Age, EmailAddress, Height, PatientId, Weight};
use serde_json::Value;

/// One validated patient health record.
#[derive(Debug, Clone, PartialEq, utoipa::ToSchema)]
pub struct Patient {
    /// Unique identifier for the patient
    #[schema(value_type = String, example = "P001")]
    pub id: PatientId,
    /// Full name of the patient
    #[schema(example = "Rakibul Islam")]
    pub name: String,
    /// Age of the patient in years
    #[schema(value_type = u8, example = 30)]
    pub age: Age,
    /// Email address of the patient
    #[schema(value_type = Option<String>, example = "rakibul@gmail.com")]
    pub email: Option<EmailAddress>,
    /// Gender of the patient
    #[schema(example = "Male")]
    pub gender: String,
    /// City where the patient lives
    #[schema(example = "Dhaka")]
    pub city: String,
    /// Disease diagnosed for the patient
    #[schema(example = "Diabetes")]
    pub disease: String,
    /// Height of the patient in feet
    #[schema(value_type = f64, example = 5.8)]
    pub height: Height,
    /// Weight of the patient in kilograms
    #[schema(value_type = f64, example = 70.5)]
    pub weight: Weight,
}

impl Patient {
    pub fn bmi(&self) -> f64 {
        bmi(self.height.value(), self.weight.value())
    }

    pub fn verdict(&self) -> Verdict {
        Verdict::from_bmi(self.bmi())
    }

    /// Splits the patient into its storage key and stored record.
    ///
    /// The record holds every field except the identifier. Derived fields are not included.
    pub fn into_record(self) -> (PatientId, Record) {
        let mut record = Record::new();
        record.insert(NAME_FIELD.into(), Value::from(self.name));
        record.insert(AGE_FIELD.into(), Value::from(self.age.years()));
        record.insert(
            EMAIL_FIELD.into(),
            self.email
                .map(|email| Value::from(email.as_str()))
                .unwrap_or(Value::Null),
        );
        record.insert(GENDER_FIELD.into(), Value::from(self.gender));
        record.insert(CITY_FIELD.into(), Value::from(self.city));
        record.insert(DISEASE_FIELD.into(), Value::from(self.disease));
        record.insert(HEIGHT_FIELD.into(), Value::from(self.height.value()));
        record.insert(WEIGHT_FIELD.into(), Value::from(self.weight.value()));
        (self.id, record)
    }
}

/// Body mass index, `weight / height²` rounded to two decimal places.
///
/// Height is in feet and weight in kilograms, so the figure is far below the conventional
/// metric BMI. The formula is kept as-is.
pub fn bmi(height: f64, weight: f64) -> f64 {
    round_to_hundredths(weight / (height * height))
}

// Formatting rounds the exact binary value half-to-even, same as a decimal round(x, 2).
fn round_to_hundredths(value: f64) -> f64 {
    format!("{value:.2}").parse().unwrap_or(value)
}

/// Weight category derived from the body mass index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, utoipa::ToSchema)]
pub enum Verdict {
    #[serde(rename = "Underweight")]
    Underweight,
    #[serde(rename = "Normal weight")]
    NormalWeight,
    #[serde(rename = "overweight")]
    Overweight,
    #[serde(rename = "obesity")]
    Obesity,
}

impl Verdict {
    /// Classifies a BMI value.
    ///
    /// Values in `[24.9, 25)` match neither the normal nor the overweight band and are
    /// classified as obesity.
    pub fn from_bmi(bmi: f64) -> Self {
        if bmi < 18.5 {
            Verdict::Underweight
        } else if (18.5..24.9).contains(&bmi) {
            Verdict::NormalWeight
        } else if (25.0..29.9).contains(&bmi) {
            Verdict::Overweight
        } else {
            Verdict::Obesity
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Verdict::Underweight => "Underweight",
            Verdict::NormalWeight => "Normal weight",
            Verdict::Overweight => "overweight",
            Verdict::Obesity => "obesity",
        }
    }
}

impl std::fmt::Display for Verdict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A stored record as returned to callers, with the derived fields recomputed.
///
/// Built from the raw stored record rather than from a [`Patient`] so that reads never fail on
/// a record that no longer validates. The derived fields are omitted when height or weight is
/// not a usable number.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct PatientView {
    #[serde(flatten)]
    pub fields: Record,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bmi: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub verdict: Option<Verdict>,
}

impl PatientView {
    pub fn from_record(record: &Record) -> Self {
        let mut fields = record.clone();
        fields.shift_remove(BMI_FIELD);
        fields.shift_remove(VERDICT_FIELD);

        let height = fields.get(HEIGHT_FIELD).and_then(Value::as_f64);
        let weight = fields.get(WEIGHT_FIELD).and_then(Value::as_f64);
        let bmi = match (height, weight) {
            (Some(h), Some(w)) if h != 0.0 => Some(bmi(h, w)).filter(|b| b.is_finite()),
            _ => None,
        };

        Self {
            fields,
            bmi,
            verdict: bmi.map(Verdict::from_bmi),
        }
    }

    /// Returns a stored field by name.
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_bmi_rounds_to_two_decimals() {
        assert_eq!(bmi(5.8, 70.5), 2.1);
        assert_eq!(bmi(5.0, 60.0), 2.4);
        assert_eq!(bmi(4.0, 100.0), 6.25);
        assert_eq!(bmi(3.5, 129.0), 10.53);
    }

    #[test]
    fn test_verdict_band_boundaries() {
        assert_eq!(Verdict::from_bmi(18.49), Verdict::Underweight);
        assert_eq!(Verdict::from_bmi(18.5), Verdict::NormalWeight);
        assert_eq!(Verdict::from_bmi(24.89), Verdict::NormalWeight);
        assert_eq!(Verdict::from_bmi(25.0), Verdict::Overweight);
        assert_eq!(Verdict::from_bmi(29.89), Verdict::Overweight);
        assert_eq!(Verdict::from_bmi(29.9), Verdict::Obesity);
        assert_eq!(Verdict::from_bmi(35.0), Verdict::Obesity);
    }

    #[test]
    fn test_verdict_gap_between_normal_and_overweight_is_obesity() {
        assert_eq!(Verdict::from_bmi(24.9), Verdict::Obesity);
        assert_eq!(Verdict::from_bmi(24.95), Verdict::Obesity);
        assert_eq!(Verdict::from_bmi(24.99), Verdict::Obesity);
    }

    #[test]
    fn test_verdict_serialises_to_display_labels() {
        let labels = serde_json::to_value([
            Verdict::Underweight,
            Verdict::NormalWeight,
            Verdict::Overweight,
            Verdict::Obesity,
        ])
        .expect("should serialise");
        assert_eq!(
            labels,
            json!(["Underweight", "Normal weight", "overweight", "obesity"])
        );
    }

    #[test]
    fn test_view_recomputes_and_strips_stored_derived_fields() {
        let record = json!({
            "name": "A",
            "height": 5.8,
            "weight": 70.5,
            "bmi": 99.0,
            "verdict": "obesity"
        });
        let view = PatientView::from_record(record.as_object().expect("object"));

        assert_eq!(view.bmi, Some(2.1));
        assert_eq!(view.verdict, Some(Verdict::Underweight));
        assert!(view.field(BMI_FIELD).is_none());

        let rendered = serde_json::to_value(&view).expect("should serialise");
        assert_eq!(
            rendered,
            json!({
                "name": "A",
                "height": 5.8,
                "weight": 70.5,
                "bmi": 2.1,
                "verdict": "Underweight"
            })
        );
    }

    #[test]
    fn test_view_omits_derived_fields_without_measurements() {
        let record = json!({"name": "A", "height": "tall", "weight": 70.5});
        let view = PatientView::from_record(record.as_object().expect("object"));

        assert_eq!(view.bmi, None);
        assert_eq!(view.verdict, None);
    }
}
