//! Partial updates to a stored patient record.
//!
//! Each patch field distinguishes three states: not supplied, explicitly `null`, and a value.
//! Only supplied fields are written onto the stored record; the merged result is then validated
//! as a whole by the service. Patch values stay raw JSON so that type and range checks are the
//! same ones a new record goes through.

use crate::constants::{
    AGE_FIELD, CITY_FIELD, DISEASE_FIELD, EMAIL_FIELD, GENDER_FIELD, HEIGHT_FIELD, NAME_FIELD,
    WEIGHT_FIELD,
};
use crate::store::Record;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One field of a patch.
#[derive(Debug, Clone, PartialEq)]
pub enum PatchField<T> {
    /// Not supplied; the stored value is kept.
    Absent,
    /// Supplied as `null`; the stored value is cleared.
    Clear,
    /// Supplied with a value; the stored value is replaced.
    Set(T),
}

impl<T> Default for PatchField<T> {
    fn default() -> Self {
        PatchField::Absent
    }
}

impl<T> PatchField<T> {
    pub fn is_absent(&self) -> bool {
        matches!(self, PatchField::Absent)
    }
}

impl<T> Serialize for PatchField<T>
where
    T: Serialize,
{
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        match self {
            PatchField::Set(value) => value.serialize(serializer),
            PatchField::Absent | PatchField::Clear => serializer.serialize_none(),
        }
    }
}

// Only reached for keys present in the input; missing keys take `Default` via `#[serde(default)]`.
impl<'de, T> Deserialize<'de> for PatchField<T>
where
    T: Deserialize<'de>,
{
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        Ok(match Option::<T>::deserialize(deserializer)? {
            Some(value) => PatchField::Set(value),
            None => PatchField::Clear,
        })
    }
}

/// A partial patient record. The identifier is never part of a patch.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, utoipa::ToSchema)]
#[serde(default)]
pub struct PatientUpdate {
    #[schema(value_type = Option<String>, example = "Rakibul Islam")]
    pub name: PatchField<Value>,
    #[schema(value_type = Option<u8>, example = 31)]
    pub age: PatchField<Value>,
    #[schema(value_type = Option<String>, example = "rakibul@gmail.com")]
    pub email: PatchField<Value>,
    #[schema(value_type = Option<String>)]
    pub gender: PatchField<Value>,
    #[schema(value_type = Option<String>, example = "Chittagong")]
    pub city: PatchField<Value>,
    #[schema(value_type = Option<String>)]
    pub disease: PatchField<Value>,
    #[schema(value_type = Option<f64>, example = 5.9)]
    pub height: PatchField<Value>,
    #[schema(value_type = Option<f64>, example = 72.0)]
    pub weight: PatchField<Value>,
}

impl PatientUpdate {
    /// Returns `true` if no field was supplied.
    pub fn is_empty(&self) -> bool {
        self.name.is_absent()
            && self.age.is_absent()
            && self.email.is_absent()
            && self.gender.is_absent()
            && self.city.is_absent()
            && self.disease.is_absent()
            && self.height.is_absent()
            && self.weight.is_absent()
    }

    /// Writes every supplied field onto `record`, leaving the others untouched.
    pub fn apply_to(&self, record: &mut Record) {
        overlay(record, NAME_FIELD, &self.name);
        overlay(record, AGE_FIELD, &self.age);
        overlay(record, EMAIL_FIELD, &self.email);
        overlay(record, GENDER_FIELD, &self.gender);
        overlay(record, CITY_FIELD, &self.city);
        overlay(record, DISEASE_FIELD, &self.disease);
        overlay(record, HEIGHT_FIELD, &self.height);
        overlay(record, WEIGHT_FIELD, &self.weight);
    }
}

fn overlay(record: &mut Record, field: &str, patch: &PatchField<Value>) {
    match patch {
        PatchField::Absent => {}
        PatchField::Clear => {
            record.insert(field.to_string(), Value::Null);
        }
        PatchField::Set(value) => {
            record.insert(field.to_string(), value.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_deserialise_distinguishes_absent_null_and_value() {
        let patch: PatientUpdate =
            serde_json::from_value(json!({"city": "X", "email": null})).expect("should parse");

        assert_eq!(patch.city, PatchField::Set(json!("X")));
        assert_eq!(patch.email, PatchField::Clear);
        assert_eq!(patch.name, PatchField::Absent);
        assert!(!patch.is_empty());
    }

    #[test]
    fn test_empty_body_is_empty_patch() {
        let patch: PatientUpdate = serde_json::from_value(json!({})).expect("should parse");
        assert!(patch.is_empty());
        assert_eq!(patch, PatientUpdate::default());
    }

    #[test]
    fn test_id_in_body_is_ignored() {
        let patch: PatientUpdate =
            serde_json::from_value(json!({"id": "P999"})).expect("should parse");
        assert!(patch.is_empty());
    }

    #[test]
    fn test_values_are_kept_raw_for_validation() {
        let patch: PatientUpdate =
            serde_json::from_value(json!({"age": 31.0, "height": "tall"})).expect("should parse");

        assert_eq!(patch.age, PatchField::Set(json!(31.0)));
        assert_eq!(patch.height, PatchField::Set(json!("tall")));
    }

    #[test]
    fn test_serialise_writes_value_or_null() {
        let patch = PatientUpdate {
            city: PatchField::Set(json!("X")),
            email: PatchField::Clear,
            ..Default::default()
        };
        let value = serde_json::to_value(&patch.city).expect("should serialise");
        assert_eq!(value, json!("X"));
        assert_eq!(serde_json::to_value(&patch.email).expect("should serialise"), Value::Null);
        assert_eq!(serde_json::to_value(&patch.name).expect("should serialise"), Value::Null);
    }

    #[test]
    fn test_apply_keeps_unsupplied_fields_and_order() {
        let mut record = json!({"name": "A", "city": "Dhaka", "email": "a@b.io", "age": 30})
            .as_object()
            .cloned()
            .expect("object");

        let patch = PatientUpdate {
            city: PatchField::Set(json!("X")),
            email: PatchField::Clear,
            ..Default::default()
        };
        patch.apply_to(&mut record);

        assert_eq!(
            Value::Object(record.clone()),
            json!({"name": "A", "city": "X", "email": null, "age": 30})
        );
        let keys: Vec<&str> = record.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["name", "city", "email", "age"]);
    }
}
