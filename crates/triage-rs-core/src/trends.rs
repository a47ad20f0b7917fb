//! Deterministic trend normalization of raw patient time series.
//!
//! Everything here is pure: the same record always yields the same
//! [`PatientContext`], and none of the helpers can fail.

use crate::error::TriageError;
use crate::patients::{PatientRecord, PatientSource, RawSeries};
use indexmap::IndexMap;
use log::debug;
use triage_rs_protocol::{PatientContext, TrendDirection};

/// Relative change between the last two samples that counts as movement.
pub const TREND_THRESHOLD: f64 = 0.10;
/// CRP above this (mg/L) is reported as elevated.
pub const CRP_ELEVATED: f64 = 10.0;
/// WBC above this (cells/uL) is reported as elevated.
pub const WBC_ELEVATED: f64 = 11_000.0;
/// Summary returned when nothing is worth reporting.
pub const ALL_STABLE: &str = "all metrics stable";

const CRP: &str = "CRP";
const WBC: &str = "WBC";

/// Direction of the last two samples, `None` for an empty series.
///
/// Only the final pair is compared; earlier history is ignored.
pub fn trend_direction(values: &[f64]) -> Option<TrendDirection> {
    match values {
        [] => None,
        [_] => Some(TrendDirection::Stable),
        [.., prev, curr] => {
            let direction = if *curr > prev * (1.0 + TREND_THRESHOLD) {
                TrendDirection::Increasing
            } else if *curr < prev * (1.0 - TREND_THRESHOLD) {
                TrendDirection::Decreasing
            } else {
                TrendDirection::Stable
            };
            Some(direction)
        }
    }
}

/// Trend per vital, in source order. Vitals without samples are left out.
pub fn vital_trends(vitals: &IndexMap<String, RawSeries>) -> IndexMap<String, TrendDirection> {
    vitals
        .iter()
        .filter_map(|(name, series)| {
            trend_direction(&series.values).map(|direction| (name.clone(), direction))
        })
        .collect()
}

/// Last value of each lab. Labs without samples are left out.
pub fn most_recent_values(labs: &IndexMap<String, RawSeries>) -> IndexMap<String, f64> {
    labs.iter()
        .filter_map(|(name, series)| series.last().map(|value| (name.clone(), value)))
        .collect()
}

/// One sentence describing concerning vitals and labs.
///
/// Fragments are collected in a fixed order (moving vitals, elevated CRP,
/// elevated WBC, other labs rising over three samples) and joined by `"; "`.
/// Vitals and labs keep the order they have in the source record.
pub fn trend_summary(
    trends: &IndexMap<String, TrendDirection>,
    labs: &IndexMap<String, RawSeries>,
) -> String {
    let mut parts: Vec<String> = trends
        .iter()
        .filter(|(_, direction)| **direction != TrendDirection::Stable)
        .map(|(name, direction)| format!("{} {direction}", name.replace('_', " ")))
        .collect();

    if let Some(crp) = labs.get(CRP).and_then(RawSeries::last)
        && crp > CRP_ELEVATED
    {
        parts.push(format!("elevated CRP ({} mg/L)", format_value(crp)));
    }
    if let Some(wbc) = labs.get(WBC).and_then(RawSeries::last)
        && wbc > WBC_ELEVATED
    {
        parts.push(format!("elevated WBC ({})", format_value(wbc)));
    }

    for (name, series) in labs {
        if name == CRP || name == WBC {
            continue;
        }
        if let [.., a, b, c] = series.values.as_slice()
            && c > b
            && b > a
        {
            parts.push(format!("{name} trending up"));
        }
    }

    if parts.is_empty() {
        ALL_STABLE.to_string()
    } else {
        parts.join("; ")
    }
}

/// Render a measurement as the shortest decimal that round-trips: `12000`, `12.5`.
///
/// Samples are held as `f64`, so a source value written `15.0` renders as
/// `15`, the same as an integral `15`.
pub fn format_value(value: f64) -> String {
    format!("{value}")
}

/// Build a normalized context from a record without touching any store.
pub fn normalize_record(record: &PatientRecord) -> PatientContext {
    let vital_trends = vital_trends(&record.vitals);
    let trend_summary = trend_summary(&vital_trends, &record.labs);
    PatientContext {
        patient_id: record.patient_id.clone(),
        age: record.age,
        conditions: record.conditions.clone(),
        medications: record.medications.clone(),
        recent_labs: most_recent_values(&record.labs),
        vital_trends,
        trend_summary,
    }
}

/// Look up a patient and normalize their record.
pub fn normalize_patient(
    source: &dyn PatientSource,
    patient_id: &str,
) -> Result<PatientContext, TriageError> {
    let record = source
        .find(patient_id)
        .ok_or_else(|| TriageError::not_found(patient_id))?;
    let context = normalize_record(&record);
    debug!(
        "normalized patient (patient_id={}, labs={}, vitals={}, summary={})",
        patient_id,
        context.recent_labs.len(),
        context.vital_trends.len(),
        context.trend_summary
    );
    Ok(context)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::patients::StaticPatientSource;
    use pretty_assertions::assert_eq;

    fn series(values: &[f64]) -> RawSeries {
        let dates = (0..values.len())
            .map(|day| format!("2024-01-{:02}", day + 1))
            .collect();
        RawSeries::new(values.to_vec(), dates)
    }

    fn labs(entries: &[(&str, &[f64])]) -> IndexMap<String, RawSeries> {
        entries
            .iter()
            .map(|(name, values)| (name.to_string(), series(values)))
            .collect()
    }

    fn trends(entries: &[(&str, TrendDirection)]) -> IndexMap<String, TrendDirection> {
        entries
            .iter()
            .map(|(name, direction)| (name.to_string(), *direction))
            .collect()
    }

    #[test]
    fn empty_series_has_no_direction() {
        assert_eq!(trend_direction(&[]), None);
    }

    #[test]
    fn single_value_is_stable() {
        assert_eq!(trend_direction(&[72.0]), Some(TrendDirection::Stable));
    }

    #[test]
    fn rise_over_ten_percent_is_increasing() {
        assert_eq!(
            trend_direction(&[72.0, 80.0]),
            Some(TrendDirection::Increasing)
        );
    }

    #[test]
    fn drop_over_ten_percent_is_decreasing() {
        assert_eq!(
            trend_direction(&[100.0, 80.0]),
            Some(TrendDirection::Decreasing)
        );
    }

    #[test]
    fn exact_ten_percent_boundaries_are_stable() {
        for a in [72.0_f64, 100.0, 13.7] {
            assert_eq!(
                trend_direction(&[a, a * 1.1]),
                Some(TrendDirection::Stable),
                "upper bound for {a}"
            );
            assert_eq!(
                trend_direction(&[a, a * 0.9]),
                Some(TrendDirection::Stable),
                "lower bound for {a}"
            );
        }
    }

    #[test]
    fn only_last_two_samples_count() {
        assert_eq!(
            trend_direction(&[50.0, 100.0, 101.0]),
            Some(TrendDirection::Stable)
        );
        assert_eq!(
            trend_direction(&[200.0, 100.0, 120.0]),
            Some(TrendDirection::Increasing)
        );
    }

    #[test]
    fn most_recent_values_take_last_sample() {
        let labs = labs(&[("CRP", &[5.0, 8.0, 12.5]), ("empty", &[])]);
        let recent = most_recent_values(&labs);
        assert_eq!(recent.get("CRP"), Some(&12.5));
        assert!(!recent.contains_key("empty"));
    }

    #[test]
    fn vitals_without_samples_are_omitted() {
        let vitals = labs(&[("heart_rate", &[72.0, 80.0]), ("spo2", &[])]);
        let trends = vital_trends(&vitals);
        assert_eq!(trends.len(), 1);
        assert_eq!(trends["heart_rate"], TrendDirection::Increasing);
    }

    #[test]
    fn nothing_notable_is_all_stable() {
        let summary = trend_summary(
            &trends(&[("heart_rate", TrendDirection::Stable)]),
            &labs(&[("CRP", &[2.0, 3.0])]),
        );
        assert_eq!(summary, "all metrics stable");
        assert_eq!(trend_summary(&IndexMap::new(), &IndexMap::new()), ALL_STABLE);
    }

    #[test]
    fn moving_vital_uses_readable_name() {
        let summary = trend_summary(
            &trends(&[("heart_rate", TrendDirection::Increasing)]),
            &IndexMap::new(),
        );
        assert_eq!(summary, "heart rate increasing");
    }

    #[test]
    fn crp_above_ten_is_elevated() {
        let summary = trend_summary(&IndexMap::new(), &labs(&[("CRP", &[5.0, 8.0, 12.5])]));
        assert!(summary.contains("elevated CRP (12.5 mg/L)"));
    }

    #[test]
    fn crp_at_ten_is_not_elevated() {
        let summary = trend_summary(&IndexMap::new(), &labs(&[("CRP", &[4.0, 10.0])]));
        assert!(!summary.contains("elevated CRP"));
    }

    #[test]
    fn crp_is_never_reported_as_trending() {
        let summary = trend_summary(&IndexMap::new(), &labs(&[("CRP", &[1.0, 2.0, 3.0])]));
        assert_eq!(summary, ALL_STABLE);
    }

    #[test]
    fn wbc_above_limit_is_elevated() {
        let summary = trend_summary(&IndexMap::new(), &labs(&[("WBC", &[9000.0, 12000.0])]));
        assert_eq!(summary, "elevated WBC (12000)");
    }

    #[test]
    fn other_lab_rising_three_times_is_trending() {
        let summary = trend_summary(&IndexMap::new(), &labs(&[("ALT", &[30.0, 45.0, 60.0])]));
        assert_eq!(summary, "ALT trending up");
    }

    #[test]
    fn non_monotonic_lab_is_not_trending() {
        let summary = trend_summary(&IndexMap::new(), &labs(&[("ALT", &[30.0, 60.0, 45.0])]));
        assert!(!summary.contains("ALT trending up"));
        let summary = trend_summary(&IndexMap::new(), &labs(&[("ALT", &[30.0, 45.0])]));
        assert_eq!(summary, ALL_STABLE);
    }

    #[test]
    fn fragments_join_in_rule_order() {
        let summary = trend_summary(
            &trends(&[
                ("heart_rate", TrendDirection::Increasing),
                ("systolic_bp", TrendDirection::Decreasing),
                ("temperature", TrendDirection::Stable),
            ]),
            &labs(&[
                ("ALT", &[30.0, 45.0, 60.0]),
                ("CRP", &[5.0, 8.0, 12.5]),
                ("WBC", &[9000.0, 12000.0]),
            ]),
        );
        assert_eq!(
            summary,
            "heart rate increasing; systolic bp decreasing; elevated CRP (12.5 mg/L); \
             elevated WBC (12000); ALT trending up"
        );
    }

    #[test]
    fn values_render_without_trailing_zeroes() {
        assert_eq!(format_value(12000.0), "12000");
        assert_eq!(format_value(12.5), "12.5");
        assert_eq!(format_value(0.1), "0.1");
    }

    /// Integral floats and integers render identically.
    #[test]
    fn integral_float_renders_as_integer() {
        assert_eq!(format_value(15.0), "15");
        let summary = trend_summary(&IndexMap::new(), &labs(&[("CRP", &[4.0, 15.0])]));
        assert_eq!(summary, "elevated CRP (15 mg/L)");
    }

    /// Vital fragments follow record order, not name order.
    #[test]
    fn vitals_keep_record_order() {
        let record: PatientRecord = serde_json::from_value(serde_json::json!({
            "patient_id": "P010",
            "age": 60,
            "labs": {
                "WBC": {"values": [9000, 12000], "dates": ["2024-01-01", "2024-01-02"]}
            },
            "vitals": {
                "systolic_bp": {"values": [140, 100], "dates": ["2024-01-01", "2024-01-02"]},
                "heart_rate": {"values": [70, 90], "dates": ["2024-01-01", "2024-01-02"]}
            }
        }))
        .expect("record");
        let context = normalize_record(&record);
        assert_eq!(
            context.trend_summary,
            "systolic bp decreasing; heart rate increasing; elevated WBC (12000)"
        );
        let vitals: Vec<&str> = context.vital_trends.keys().map(String::as_str).collect();
        assert_eq!(vitals, vec!["systolic_bp", "heart_rate"]);
    }

    #[test]
    fn unknown_patient_is_not_found() {
        let source = StaticPatientSource::embedded().expect("embedded");
        let err = normalize_patient(&source, "P999").unwrap_err();
        assert!(matches!(err, TriageError::NotFound { .. }));
        let msg = err.to_string();
        assert!(msg.contains("not found"));
        assert!(msg.contains("P999"));
    }

    #[test]
    fn high_risk_patient_normalizes() {
        let source = StaticPatientSource::embedded().expect("embedded");
        let context = normalize_patient(&source, "P001").expect("context");
        assert_eq!(context.patient_id, "P001");
        assert_eq!(context.age, 68);
        assert_eq!(context.recent_labs["CRP"], 12.5);
        assert_eq!(context.vital_trends["heart_rate"], TrendDirection::Increasing);
        assert_ne!(context.trend_summary, ALL_STABLE);
        assert!(context.trend_summary.contains("elevated CRP (12.5 mg/L)"));
    }

    #[test]
    fn stable_patient_normalizes_to_all_stable() {
        let source = StaticPatientSource::embedded().expect("embedded");
        let context = normalize_patient(&source, "P002").expect("context");
        assert_eq!(context.trend_summary, ALL_STABLE);
        assert!(
            context
                .vital_trends
                .values()
                .all(|direction| *direction == TrendDirection::Stable)
        );
    }

    #[test]
    fn normalization_is_deterministic() {
        let source = StaticPatientSource::embedded().expect("embedded");
        let first = normalize_patient(&source, "P003").expect("first");
        let second = normalize_patient(&source, "P003").expect("second");
        assert_eq!(first, second);
    }
}
