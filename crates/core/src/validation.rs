//! Patient record validation.
//!
//! Validation runs over a JSON object rather than a typed request so that the same check covers
//! a client-supplied record on create and a merged candidate on update, including stored values
//! that were written before a constraint existed. Every field is checked and every violation is
//! reported.

use crate::constants::{
    AGE_FIELD, CITY_FIELD, DISEASE_FIELD, EMAIL_FIELD, GENDER_FIELD, HEIGHT_FIELD, ID_FIELD,
    NAME_FIELD, WEIGHT_FIELD,
};
use crate::patient::Patient;
use crate::store::Record;
use pms_types::{Age, EmailAddress, Height, PatientId, TypeError, Weight};
use serde_json::Value;

/// One failed field constraint.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, utoipa::ToSchema)]
pub struct FieldViolation {
    /// Name of the offending field
    #[schema(example = "age")]
    pub field: String,
    /// Which constraint failed
    #[schema(example = "value must be greater than 0 and less than 100")]
    pub message: String,
}

/// All field violations found in one record. Never empty when returned as an error.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize)]
#[serde(transparent)]
pub struct ValidationErrors(Vec<FieldViolation>);

impl ValidationErrors {
    pub fn violations(&self) -> &[FieldViolation] {
        &self.0
    }

    /// Returns `true` if `field` has at least one violation.
    pub fn has_field(&self, field: &str) -> bool {
        self.0.iter().any(|v| v.field == field)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl std::fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (i, violation) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{}: {}", violation.field, violation.message)?;
        }
        Ok(())
    }
}

/// Validates a candidate record, including its `id`, against every Patient constraint.
///
/// Keys that are not Patient fields are ignored.
///
/// # Errors
///
/// Returns `ValidationErrors` naming every field that is missing, has the wrong JSON type or
/// violates its bounds.
pub fn validate_patient(candidate: &Record) -> Result<Patient, ValidationErrors> {
    let mut checker = Checker::new(candidate);

    let id = checker
        .text(ID_FIELD)
        .and_then(|s| checker.check(ID_FIELD, PatientId::new(s)));
    let name = checker.text(NAME_FIELD);
    let age = checker
        .integer(AGE_FIELD)
        .and_then(|n| checker.check(AGE_FIELD, Age::new(n)));
    let email = checker.optional_text(EMAIL_FIELD).and_then(|email| match email {
        Some(s) => checker.check(EMAIL_FIELD, EmailAddress::parse(s)).map(Some),
        None => Some(None),
    });
    let gender = checker.text(GENDER_FIELD);
    let city = checker.text(CITY_FIELD);
    let disease = checker.text(DISEASE_FIELD);
    let height = checker
        .number(HEIGHT_FIELD)
        .and_then(|n| checker.check(HEIGHT_FIELD, Height::new(n)));
    let weight = checker
        .number(WEIGHT_FIELD)
        .and_then(|n| checker.check(WEIGHT_FIELD, Weight::new(n)));

    // A field is only `None` if a violation was recorded for it.
    match (id, name, age, email, gender, city, disease, height, weight) {
        (
            Some(id),
            Some(name),
            Some(age),
            Some(email),
            Some(gender),
            Some(city),
            Some(disease),
            Some(height),
            Some(weight),
        ) => Ok(Patient {
            id,
            name,
            age,
            email,
            gender,
            city,
            disease,
            height,
            weight,
        }),
        _ => Err(ValidationErrors(checker.violations)),
    }
}

struct Checker<'a> {
    record: &'a Record,
    violations: Vec<FieldViolation>,
}

impl<'a> Checker<'a> {
    fn new(record: &'a Record) -> Self {
        Self {
            record,
            violations: Vec::new(),
        }
    }

    fn fail<T>(&mut self, field: &str, message: impl Into<String>) -> Option<T> {
        self.violations.push(FieldViolation {
            field: field.to_string(),
            message: message.into(),
        });
        None
    }

    fn check<T>(&mut self, field: &str, result: Result<T, TypeError>) -> Option<T> {
        match result {
            Ok(value) => Some(value),
            Err(e) => self.fail(field, e.to_string()),
        }
    }

    fn required(&mut self, field: &str) -> Option<&'a Value> {
        match self.record.get(field) {
            None | Some(Value::Null) => self.fail(field, "field required"),
            Some(value) => Some(value),
        }
    }

    fn text(&mut self, field: &str) -> Option<String> {
        match self.required(field)? {
            Value::String(s) => Some(s.clone()),
            _ => self.fail(field, "input should be a valid string"),
        }
    }

    fn optional_text(&mut self, field: &str) -> Option<Option<String>> {
        match self.record.get(field) {
            None | Some(Value::Null) => Some(None),
            Some(Value::String(s)) => Some(Some(s.clone())),
            Some(_) => self.fail(field, "input should be a valid string"),
        }
    }

    fn integer(&mut self, field: &str) -> Option<i64> {
        let value = self.required(field)?;
        let integral = value.as_i64().or_else(|| {
            value
                .as_f64()
                .filter(|f| f.is_finite() && f.fract() == 0.0)
                .map(|f| f as i64)
        });
        match integral {
            Some(n) => Some(n),
            None => self.fail(field, "input should be a valid integer"),
        }
    }

    fn number(&mut self, field: &str) -> Option<f64> {
        match self.required(field)?.as_f64() {
            Some(n) => Some(n),
            None => self.fail(field, "input should be a valid number"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn candidate(value: Value) -> Record {
        value.as_object().cloned().expect("test record should be an object")
    }

    fn valid() -> Value {
        json!({
            "id": "P001",
            "name": "A",
            "age": 30,
            "gender": "Male",
            "city": "Dhaka",
            "disease": "Diabetes",
            "height": 5.8,
            "weight": 70.5
        })
    }

    #[test]
    fn test_valid_record_produces_patient() {
        let patient = validate_patient(&candidate(valid())).expect("record should validate");

        assert_eq!(patient.id.as_str(), "P001");
        assert_eq!(patient.age.years(), 30);
        assert_eq!(patient.email, None);
        assert_eq!(patient.height.value(), 5.8);
        assert_eq!(patient.bmi(), 2.1);
    }

    #[test]
    fn test_optional_email_is_validated_when_present() {
        let mut record = candidate(valid());
        record.insert("email".into(), json!("rakibul@gmail.com"));
        let patient = validate_patient(&record).expect("record should validate");
        assert_eq!(
            patient.email.as_ref().map(EmailAddress::as_str),
            Some("rakibul@gmail.com")
        );

        record.insert("email".into(), json!("not-an-email"));
        let errors = validate_patient(&record).expect_err("bad email should fail");
        assert!(errors.has_field("email"));
    }

    #[test]
    fn test_reports_every_violation() {
        let record = candidate(json!({
            "id": "P001",
            "age": 150,
            "gender": "Male",
            "city": 7,
            "disease": "Diabetes",
            "height": 9.0,
            "weight": "heavy"
        }));

        let errors = validate_patient(&record).expect_err("record should fail");
        let fields: Vec<&str> = errors
            .violations()
            .iter()
            .map(|v| v.field.as_str())
            .collect();
        assert_eq!(fields, vec!["name", "age", "city", "height", "weight"]);
    }

    #[test]
    fn test_bounds_are_exclusive() {
        for (field, value) in [
            ("age", json!(0)),
            ("age", json!(100)),
            ("height", json!(3)),
            ("height", json!(8)),
            ("weight", json!(10)),
            ("weight", json!(130)),
        ] {
            let mut record = candidate(valid());
            record.insert(field.into(), value.clone());
            let errors = validate_patient(&record)
                .expect_err("boundary value should be rejected");
            assert!(errors.has_field(field), "{field}={value} should be rejected");
        }
    }

    #[test]
    fn test_age_accepts_integral_float_only() {
        let mut record = candidate(valid());
        record.insert("age".into(), json!(30.0));
        assert!(validate_patient(&record).is_ok());

        record.insert("age".into(), json!(30.5));
        let errors = validate_patient(&record).expect_err("fractional age should fail");
        assert_eq!(
            errors.violations()[0].message,
            "input should be a valid integer"
        );
    }

    #[test]
    fn test_null_required_field_is_missing() {
        let mut record = candidate(valid());
        record.insert("city".into(), Value::Null);
        let errors = validate_patient(&record).expect_err("null city should fail");
        assert_eq!(errors.to_string(), "city: field required");
    }

    #[test]
    fn test_empty_id_is_rejected() {
        let mut record = candidate(valid());
        record.insert("id".into(), json!(""));
        let errors = validate_patient(&record).expect_err("empty id should fail");
        assert!(errors.has_field("id"));
    }
}
