//! Builders for patient records and model answers.

use indexmap::IndexMap;
use serde_json::{Value, json};
use triage_rs_core::{PatientRecord, RawSeries, StaticPatientSource};
use triage_rs_protocol::{Decision, RiskLevel};

/// Builds a [`PatientRecord`] with daily dates starting 2024-01-01.
#[derive(Debug, Clone)]
pub struct PatientRecordBuilder {
    record: PatientRecord,
}

impl PatientRecordBuilder {
    pub fn new(patient_id: impl Into<String>, age: u32) -> Self {
        Self {
            record: PatientRecord {
                patient_id: patient_id.into(),
                name: None,
                age,
                conditions: Vec::new(),
                medications: Vec::new(),
                labs: IndexMap::new(),
                vitals: IndexMap::new(),
            },
        }
    }

    pub fn condition(mut self, condition: impl Into<String>) -> Self {
        self.record.conditions.push(condition.into());
        self
    }

    pub fn medication(mut self, medication: impl Into<String>) -> Self {
        self.record.medications.push(medication.into());
        self
    }

    pub fn lab(mut self, name: impl Into<String>, values: &[f64]) -> Self {
        self.record.labs.insert(name.into(), series(values));
        self
    }

    pub fn vital(mut self, name: impl Into<String>, values: &[f64]) -> Self {
        self.record.vitals.insert(name.into(), series(values));
        self
    }

    pub fn build(self) -> PatientRecord {
        self.record
    }
}

/// Series with one date per value.
pub fn series(values: &[f64]) -> RawSeries {
    let dates = (1..=values.len())
        .map(|day| format!("2024-01-{day:02}"))
        .collect();
    RawSeries::new(values.to_vec(), dates)
}

/// Source holding only the given records.
pub fn source_of(records: impl IntoIterator<Item = PatientRecord>) -> StaticPatientSource {
    StaticPatientSource::from_records(records)
}

/// A well-formed model answer.
pub fn decision_json(decision: Decision, risk_level: RiskLevel, confidence: f64) -> String {
    decision_value(decision, risk_level, confidence).to_string()
}

pub fn decision_value(decision: Decision, risk_level: RiskLevel, confidence: f64) -> Value {
    json!({
        "escalation_decision": decision,
        "risk_level": risk_level,
        "confidence": confidence,
        "rationale": format!("{decision} at {risk_level} risk"),
        "contributing_factors": ["CRP", "heart rate"]
    })
}
