//! Patient service.
//!
//! Validates inbound records, merges partial updates, answers sort queries and enforces
//! identifier uniqueness on top of a [`RecordStore`]. Each operation loads the whole snapshot,
//! works in memory and, for mutations, saves the whole snapshot back.
//!
//! ## Pure Data Operations
//!
//! This module contains **only** data operations. HTTP status mapping and response bodies
//! belong in `pms-api-rest`.

use crate::constants::{ID_FIELD, SORTABLE_FIELDS, SORT_ORDERS};
use crate::patch::PatientUpdate;
use crate::patient::PatientView;
use crate::store::{Record, RecordStore};
use crate::validation::validate_patient;
use crate::{PatientError, PatientResult};
use pms_types::PatientId;
use serde::ser::SerializeMap;
use serde_json::Value;
use std::sync::Arc;

/// Numeric field a sort query may order by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortField {
    Height,
    Weight,
    Age,
}

impl SortField {
    /// Parses a field name case-insensitively.
    ///
    /// # Errors
    ///
    /// Returns `PatientError::InvalidArgument` naming the valid fields.
    pub fn parse(value: &str) -> PatientResult<Self> {
        match value.to_lowercase().as_str() {
            "height" => Ok(SortField::Height),
            "weight" => Ok(SortField::Weight),
            "age" => Ok(SortField::Age),
            _ => Err(PatientError::InvalidArgument(format!(
                "Invalid sort field. valid fields are {SORTABLE_FIELDS:?}"
            ))),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SortField::Height => "height",
            SortField::Weight => "weight",
            SortField::Age => "age",
        }
    }
}

/// Direction of a sort query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Ascending,
    Descending,
}

impl SortOrder {
    /// Parses an order token case-insensitively.
    ///
    /// The advertised tokens are `asc` and `dsc`, but only the literal `desc` selects descending
    /// order: `dsc` is accepted and sorts ascending.
    ///
    /// # Errors
    ///
    /// Returns `PatientError::InvalidArgument` naming the advertised tokens.
    pub fn parse(value: &str) -> PatientResult<Self> {
        match value.to_lowercase().as_str() {
            "asc" | "dsc" => Ok(SortOrder::Ascending),
            "desc" => Ok(SortOrder::Descending),
            _ => Err(PatientError::InvalidArgument(format!(
                "Invalid order. valid orders are {SORT_ORDERS:?}"
            ))),
        }
    }
}

/// All records keyed by identifier, in storage order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PatientListing(Vec<(String, PatientView)>);

impl PatientListing {
    pub fn get(&self, id: &str) -> Option<&PatientView> {
        self.0
            .iter()
            .find(|(key, _)| key == id)
            .map(|(_, view)| view)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &PatientView)> {
        self.0.iter().map(|(id, view)| (id.as_str(), view))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl serde::Serialize for PatientListing {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (id, view) in &self.0 {
            map.serialize_entry(id, view)?;
        }
        map.end()
    }
}

/// Patient record operations over an injectable record store.
#[derive(Clone)]
pub struct PatientService {
    store: Arc<dyn RecordStore>,
}

impl PatientService {
    /// Creates a new `PatientService` backed by `store`.
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self { store }
    }

    /// Lists every stored record with derived fields computed.
    ///
    /// # Errors
    ///
    /// Returns `PatientError::StorageUnavailable` if the store cannot be read.
    pub fn list(&self) -> PatientResult<PatientListing> {
        let snapshot = self.store.load()?;
        Ok(PatientListing(
            snapshot
                .iter()
                .map(|(id, record)| (id.to_string(), PatientView::from_record(record)))
                .collect(),
        ))
    }

    /// Returns a single record with derived fields computed.
    ///
    /// # Errors
    ///
    /// Returns `PatientError::NotFound` if `id` is not stored.
    pub fn get(&self, id: &str) -> PatientResult<PatientView> {
        let snapshot = self.store.load()?;
        snapshot
            .get(id)
            .map(PatientView::from_record)
            .ok_or_else(|| PatientError::NotFound(id.to_string()))
    }

    /// Returns every record ordered by a numeric field.
    ///
    /// The sort is stable. A record missing the field, or holding a non-numeric value, sorts as
    /// if the value were `0`.
    ///
    /// # Errors
    ///
    /// Returns `PatientError::InvalidArgument` if `sort_by` or `order` is not recognised. The
    /// field is checked first.
    pub fn sort(&self, sort_by: &str, order: &str) -> PatientResult<Vec<PatientView>> {
        let field = SortField::parse(sort_by)?;
        let order = SortOrder::parse(order)?;

        let snapshot = self.store.load()?;
        let mut keyed: Vec<(f64, &Record)> = snapshot
            .iter()
            .map(|(_, record)| (sort_key(record, field), record))
            .collect();

        match order {
            SortOrder::Ascending => keyed.sort_by(|a, b| a.0.total_cmp(&b.0)),
            SortOrder::Descending => keyed.sort_by(|a, b| b.0.total_cmp(&a.0)),
        }

        Ok(keyed
            .into_iter()
            .map(|(_, record)| PatientView::from_record(record))
            .collect())
    }

    /// Validates and stores a new record.
    ///
    /// `candidate` must carry the `id`; the stored record does not.
    ///
    /// # Errors
    ///
    /// Returns `PatientError::Validation` if any field constraint fails, or
    /// `PatientError::Conflict` if the identifier is already stored. The store is unchanged in
    /// both cases.
    pub fn create(&self, candidate: &Record) -> PatientResult<PatientId> {
        let patient = validate_patient(candidate)?;

        let mut snapshot = self.store.load()?;
        if snapshot.contains(patient.id.as_str()) {
            tracing::warn!("create rejected, patient already exists: {}", patient.id);
            return Err(PatientError::Conflict(patient.id.into_inner()));
        }

        let (id, record) = patient.into_record();
        snapshot.insert(id.as_str(), record);
        self.store.save(&snapshot)?;

        tracing::info!("created patient {}", id);
        Ok(id)
    }

    /// Merges `patch` onto a stored record and re-validates the whole result.
    ///
    /// Fields already stored are checked again even if the patch does not touch them, so a
    /// record that no longer satisfies the constraints cannot be updated until the offending
    /// fields are corrected in the same patch.
    ///
    /// # Errors
    ///
    /// Returns `PatientError::NotFound` if `id` is not stored, or `PatientError::Validation` if
    /// the merged record fails validation. Nothing is written on failure.
    pub fn update(&self, id: &str, patch: &PatientUpdate) -> PatientResult<()> {
        let mut snapshot = self.store.load()?;
        let existing = snapshot
            .get(id)
            .ok_or_else(|| PatientError::NotFound(id.to_string()))?;

        let mut candidate = existing.clone();
        patch.apply_to(&mut candidate);
        candidate.insert(ID_FIELD.to_string(), Value::from(id));

        let patient = validate_patient(&candidate).inspect_err(|errors| {
            tracing::warn!("update rejected for patient {}: {}", id, errors);
        })?;

        let (id, record) = patient.into_record();
        snapshot.insert(id.as_str(), record);
        self.store.save(&snapshot)?;

        tracing::info!("updated patient {}", id);
        Ok(())
    }

    /// Removes a stored record.
    ///
    /// # Errors
    ///
    /// Returns `PatientError::NotFound` if `id` is not stored.
    pub fn delete(&self, id: &str) -> PatientResult<()> {
        let mut snapshot = self.store.load()?;
        if snapshot.remove(id).is_none() {
            return Err(PatientError::NotFound(id.to_string()));
        }
        self.store.save(&snapshot)?;

        tracing::info!("deleted patient {}", id);
        Ok(())
    }
}

fn sort_key(record: &Record, field: SortField) -> f64 {
    record
        .get(field.as_str())
        .and_then(Value::as_f64)
        .unwrap_or(0.0)
}
