//! Responder calls from the KuLGaP statistic and classical criteria.
//!
//! Every classifier reduces a continuous statistic to a three-way call by a
//! strict `<` comparison. Missing or NaN inputs give
//! [`ResponseCall::Undetermined`].

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::config::Config;

/// Outcome of one classifier on one experiment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ResponseCall {
    /// Treatment had an effect.
    Responder,
    /// No treatment effect detected.
    NonResponder,
    /// The statistic was unavailable.
    Undetermined,
}

impl ResponseCall {
    /// Numeric code: 1, -1 or 0.
    pub fn code(self) -> i8 {
        match self {
            Self::Responder => 1,
            Self::NonResponder => -1,
            Self::Undetermined => 0,
        }
    }

    /// Responder if `lhs < rhs`, undetermined if either side is missing.
    pub fn when_less(lhs: Option<f64>, rhs: Option<f64>) -> Self {
        match (lhs, rhs) {
            (Some(l), Some(r)) if !l.is_nan() && !r.is_nan() => {
                if l < r {
                    Self::Responder
                } else {
                    Self::NonResponder
                }
            }
            _ => Self::Undetermined,
        }
    }
}

/// The response criteria compared in a cohort analysis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Classifier {
    /// Density survival of the divergence below `alpha`.
    Kulgap,
    /// Tumour growth inhibition above the TGI threshold.
    Tgi,
    /// Fraction of replicates in progressive disease below the mRECIST threshold.
    Mrecist,
    /// As `Mrecist`, counting stable disease as non-response too.
    MrecistLenient,
    /// Rank test on normalised AUCs significant at `alpha`.
    Auc,
    /// Rank test on response angles significant at `alpha`.
    Angle,
}

impl Classifier {
    /// All classifiers in report order.
    pub const ALL: [Classifier; 6] = [
        Self::Kulgap,
        Self::Tgi,
        Self::Mrecist,
        Self::MrecistLenient,
        Self::Auc,
        Self::Angle,
    ];

    /// Short display name.
    pub fn name(self) -> &'static str {
        match self {
            Self::Kulgap => "KuLGaP",
            Self::Tgi => "TGI",
            Self::Mrecist => "mRECIST",
            Self::MrecistLenient => "mRECIST-lenient",
            Self::Auc => "AUC",
            Self::Angle => "Angle",
        }
    }
}

impl fmt::Display for Classifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Per-experiment statistics computed outside this crate.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExternalStats {
    /// Tumour growth inhibition ratio.
    pub tgi: Option<f64>,
    /// Fraction of replicates classified mPD.
    pub perc_mpd: Option<f64>,
    /// Fraction of replicates classified mSD.
    pub perc_msd: Option<f64>,
    /// p-value of the case-vs-control rank test on normalised AUCs.
    pub auc_p_value: Option<f64>,
    /// p-value of the case-vs-control rank test on response angles.
    pub angle_p_value: Option<f64>,
}

/// Call of `classifier` given the KuLGaP survival and external statistics.
pub fn classify(
    classifier: Classifier,
    survival: Option<f64>,
    stats: &ExternalStats,
    config: &Config,
) -> ResponseCall {
    match classifier {
        Classifier::Kulgap => ResponseCall::when_less(survival, Some(config.alpha)),
        Classifier::Tgi => ResponseCall::when_less(Some(config.tgi_threshold), stats.tgi),
        Classifier::Mrecist => ResponseCall::when_less(stats.perc_mpd, Some(config.mrecist_threshold)),
        Classifier::MrecistLenient => {
            let lenient = stats.perc_mpd.zip(stats.perc_msd).map(|(pd, sd)| pd + sd);
            ResponseCall::when_less(lenient, Some(config.mrecist_threshold))
        }
        Classifier::Auc => ResponseCall::when_less(stats.auc_p_value, Some(config.alpha)),
        Classifier::Angle => ResponseCall::when_less(stats.angle_p_value, Some(config.alpha)),
    }
}

/// Calls of every classifier in [`Classifier::ALL`].
pub fn classify_all(
    survival: Option<f64>,
    stats: &ExternalStats,
    config: &Config,
) -> BTreeMap<Classifier, ResponseCall> {
    Classifier::ALL
        .iter()
        .map(|&c| (c, classify(c, survival, stats, config)))
        .collect()
}
