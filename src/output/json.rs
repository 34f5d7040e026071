//! JSON serialization for cohort reports.

use crate::result::CohortReport;

/// Serialize a CohortReport to a compact JSON string.
///
/// NaN entries (e.g. undefined matrix cells) become `null`.
///
/// # Errors
///
/// Returns an error if serialization fails (should not happen for CohortReport).
pub fn to_json(report: &CohortReport) -> Result<String, serde_json::Error> {
    serde_json::to_string(report)
}

/// Serialize a CohortReport to a pretty-printed JSON string.
///
/// # Errors
///
/// Returns an error if serialization fails (should not happen for CohortReport).
pub fn to_json_pretty(report: &CohortReport) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(report)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::collections::BTreeMap;

    use crate::calibration::Calibration;
    use crate::classify::{Classifier, ResponseCall};
    use crate::result::{ExperimentResult, Metadata, NullOrigin, NullSummary};
    use crate::types::ExperimentKey;

    pub(crate) fn make_test_report() -> CohortReport {
        let mut calls = BTreeMap::new();
        calls.insert(Classifier::Kulgap, ResponseCall::Responder);
        calls.insert(Classifier::Tgi, ResponseCall::NonResponder);
        let mut undetermined = BTreeMap::new();
        undetermined.insert(Classifier::Kulgap, ResponseCall::Undetermined);
        undetermined.insert(Classifier::Tgi, ResponseCall::Undetermined);

        CohortReport {
            experiments: vec![
                ExperimentResult {
                    key: ExperimentKey::new("PHLC111", "erlotinib"),
                    tumour_type: Some("NSCLC".to_string()),
                    replicates: 4,
                    control_replicates: 5,
                    divergence: Some(12.5),
                    calibration: Some(Calibration {
                        divergence: 12.5,
                        p_value: 0.01,
                        survival: 0.004,
                    }),
                    error: None,
                    calls,
                },
                ExperimentResult {
                    key: ExperimentKey::new("PHLC112", "gefitinib"),
                    tumour_type: None,
                    replicates: 3,
                    control_replicates: 3,
                    divergence: None,
                    calibration: None,
                    error: Some("empty integration window [20, 18]".to_string()),
                    calls: undetermined,
                },
            ],
            null: NullSummary {
                origin: NullOrigin::Computed {
                    candidates: 45,
                    discarded: 2,
                },
                values: 43,
                bandwidth: 0.8,
                log_likelihood: -60.0,
                alpha: 0.05,
                critical_value: Some(7.97),
                empirical_critical_value: Some(7.5),
                critical_value_interval: None,
            },
            agreement: None,
            metadata: Metadata {
                version: "0.1.0".to_string(),
                parallel: true,
                null_path: None,
                runtime_secs: 1.5,
            },
        }
    }

    #[test]
    fn test_to_json() {
        let json = to_json(&make_test_report()).unwrap();
        assert!(json.contains("\"divergence\":12.5"));
        assert!(json.contains("\"model\":\"PHLC111\""));
        assert!(json.contains("\"Kulgap\":\"Responder\""));
    }

    #[test]
    fn test_to_json_pretty() {
        let json = to_json_pretty(&make_test_report()).unwrap();
        assert!(json.contains('\n')); // Pretty print has newlines
        assert!(json.contains("critical_value"));
    }

    #[test]
    fn test_report_round_trips() {
        let report = make_test_report();
        let parsed: CohortReport = serde_json::from_str(&to_json(&report).unwrap()).unwrap();
        assert_eq!(parsed.experiments.len(), 2);
        assert_eq!(parsed.null.origin, report.null.origin);
    }
}
