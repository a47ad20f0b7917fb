//! Patient records and the read-only data source they come from.

use crate::error::TriageError;
use chrono::NaiveDate;
use indexmap::IndexMap;
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use triage_rs_protocol::{MAX_PATIENT_AGE, PatientId, ValidationError};

/// Bundled demo dataset.
const EMBEDDED_PATIENTS: &str = include_str!("../data/mock_patients.json");

/// Time series for one measurement, oldest sample first.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct RawSeries {
    #[serde(default)]
    pub values: Vec<f64>,
    /// Calendar dates (`YYYY-MM-DD`) parallel to `values`.
    #[serde(default)]
    pub dates: Vec<String>,
}

impl RawSeries {
    pub fn new(values: Vec<f64>, dates: Vec<String>) -> Self {
        Self { values, dates }
    }

    /// Most recent sample, if any.
    pub fn last(&self) -> Option<f64> {
        self.values.last().copied()
    }

    /// Check that dates are parallel to values, well formed and ascending.
    pub fn validate(&self, name: &str) -> Result<(), ValidationError> {
        if self.values.len() != self.dates.len() {
            return Err(ValidationError::Malformed(format!(
                "{name}: {} values but {} dates",
                self.values.len(),
                self.dates.len()
            )));
        }
        let mut previous: Option<NaiveDate> = None;
        for raw in &self.dates {
            let date = NaiveDate::parse_from_str(raw, "%Y-%m-%d").map_err(|err| {
                ValidationError::Malformed(format!("{name}: bad date {raw:?}: {err}"))
            })?;
            if previous.is_some_and(|previous| date < previous) {
                return Err(ValidationError::Malformed(format!(
                    "{name}: dates not in chronological order at {raw}"
                )));
            }
            previous = Some(date);
        }
        Ok(())
    }
}

/// Raw patient record as held by the data source.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PatientRecord {
    pub patient_id: PatientId,
    #[serde(default)]
    pub name: Option<String>,
    pub age: u32,
    #[serde(default)]
    pub conditions: Vec<String>,
    #[serde(default)]
    pub medications: Vec<String>,
    /// Lab series keyed by name, in source order.
    #[serde(default)]
    pub labs: IndexMap<String, RawSeries>,
    /// Vital series keyed by name, in source order.
    #[serde(default)]
    pub vitals: IndexMap<String, RawSeries>,
}

impl PatientRecord {
    /// Validate age bounds and every series.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.age > MAX_PATIENT_AGE {
            return Err(ValidationError::OutOfRange {
                field: format!("{}.age", self.patient_id),
                value: f64::from(self.age),
                min: 0.0,
                max: f64::from(MAX_PATIENT_AGE),
            });
        }
        for (name, series) in self.labs.iter().chain(self.vitals.iter()) {
            series.validate(&format!("{}.{name}", self.patient_id))?;
        }
        Ok(())
    }
}

/// Read-only lookup of patient records by id.
pub trait PatientSource: Send + Sync {
    /// Return the record for `patient_id`, if known.
    fn find(&self, patient_id: &str) -> Option<PatientRecord>;

    /// All known patient ids, ascending.
    fn ids(&self) -> Vec<PatientId>;
}

/// Patient source backed by a fixed set of records.
#[derive(Debug, Clone, Default)]
pub struct StaticPatientSource {
    records: BTreeMap<PatientId, PatientRecord>,
}

impl StaticPatientSource {
    /// Build from records; later duplicates replace earlier ones.
    pub fn from_records(records: impl IntoIterator<Item = PatientRecord>) -> Self {
        let records = records
            .into_iter()
            .map(|record| (record.patient_id.clone(), record))
            .collect();
        Self { records }
    }

    /// Parse a JSON array of records and validate each one.
    pub fn from_json_str(contents: &str) -> Result<Self, TriageError> {
        let records: Vec<PatientRecord> = serde_json::from_str(contents)?;
        for record in &records {
            record.validate()?;
        }
        debug!("parsed patient records (count={})", records.len());
        Ok(Self::from_records(records))
    }

    /// Load records from a JSON file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, TriageError> {
        let path = path.as_ref();
        info!("loading patient records (path={})", path.display());
        let contents = std::fs::read_to_string(path)?;
        Self::from_json_str(&contents)
    }

    /// The bundled demo dataset (P001 high risk, P002 stable, P003 ambiguous).
    pub fn embedded() -> Result<Self, TriageError> {
        Self::from_json_str(EMBEDDED_PATIENTS)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl PatientSource for StaticPatientSource {
    fn find(&self, patient_id: &str) -> Option<PatientRecord> {
        self.records.get(patient_id).cloned()
    }

    fn ids(&self) -> Vec<PatientId> {
        self.records.keys().cloned().collect()
    }
}
