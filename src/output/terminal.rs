//! Terminal output formatting with colors and box drawing.

use colored::Colorize;

use crate::classify::{Classifier, ResponseCall};
use crate::result::{CohortReport, ExperimentResult, NullOrigin};

/// Format a CohortReport for human-readable terminal output.
pub fn format_report(report: &CohortReport) -> String {
    let mut output = String::new();
    let sep = "\u{2500}".repeat(62);

    output.push_str("kulgap\n");
    output.push_str(&sep);
    output.push('\n');
    output.push('\n');

    let null = &report.null;
    match null.origin {
        NullOrigin::Computed {
            candidates,
            discarded,
        } => output.push_str(&format!(
            "  Null: {} values from {} control pairs ({} discarded)\n",
            null.values, candidates, discarded
        )),
        NullOrigin::Stored => output.push_str(&format!("  Null: {} stored values\n", null.values)),
    }
    output.push_str(&format!("  Bandwidth: {:.4}\n", null.bandwidth));
    if let Some(critical) = null.critical_value {
        output.push_str(&format!(
            "  Critical divergence (alpha = {}): {:.2}",
            null.alpha, critical
        ));
        if let Some(empirical) = null.empirical_critical_value {
            output.push_str(&format!(" (empirical {:.2})", empirical));
        }
        output.push('\n');
    }
    output.push('\n');

    let responders = report.responders(Classifier::Kulgap).count();
    let summary = format!(
        "{} of {} experiments respond",
        responders,
        report.experiments.len()
    );
    if responders > 0 {
        output.push_str(&format!("  {}\n\n", summary.green().bold()));
    } else {
        output.push_str(&format!("  {}\n\n", summary.bold()));
    }

    for experiment in &report.experiments {
        output.push_str(&format_experiment(experiment));
    }

    output.push('\n');
    output.push_str(&sep);
    output.push('\n');
    output.push_str(&format!(
        "Runtime: {:.2}s{}\n",
        report.metadata.runtime_secs,
        if report.metadata.parallel {
            " (parallel)"
        } else {
            ""
        }
    ));

    output
}

fn format_experiment(experiment: &ExperimentResult) -> String {
    let call = experiment
        .calls
        .get(&Classifier::Kulgap)
        .copied()
        .unwrap_or(ResponseCall::Undetermined);
    let mut line = format!("    {:<32} {}", experiment.key.to_string(), format_call(call));
    match (&experiment.calibration, &experiment.error) {
        (Some(c), _) => line.push_str(&format!(
            "  KL {:.2}, p {:.3}, survival {:.3}",
            c.divergence, c.p_value, c.survival
        )),
        (None, Some(reason)) => line.push_str(&format!("  {}", reason.yellow())),
        (None, None) => {}
    }
    line.push('\n');
    line
}

/// Format ResponseCall for display.
fn format_call(call: ResponseCall) -> String {
    match call {
        ResponseCall::Responder => "responder    ".green().to_string(),
        ResponseCall::NonResponder => "non-responder".normal().to_string(),
        ResponseCall::Undetermined => "undetermined ".yellow().to_string(),
    }
}
