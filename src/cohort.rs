//! Cohort of cancer models and their case/control pairings.

use std::collections::BTreeMap;

use tracing::warn;

use crate::types::{ConditionId, ExperimentKey, TreatmentCondition};

/// One patient-derived xenograft model with its treatment arms.
#[derive(Debug, Clone)]
pub struct CancerModel {
    name: String,
    tumour_type: Option<String>,
    conditions: BTreeMap<ConditionId, TreatmentCondition>,
}

impl CancerModel {
    /// Empty model.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            tumour_type: None,
            conditions: BTreeMap::new(),
        }
    }

    /// Set the tumour type label.
    pub fn with_tumour_type(mut self, tumour_type: impl Into<String>) -> Self {
        self.tumour_type = Some(tumour_type.into());
        self
    }

    /// Add an arm, replacing any arm with the same id.
    pub fn with_condition(mut self, id: impl Into<ConditionId>, condition: TreatmentCondition) -> Self {
        self.insert(id, condition);
        self
    }

    /// Add an arm, returning the one it replaced.
    pub fn insert(
        &mut self,
        id: impl Into<ConditionId>,
        condition: TreatmentCondition,
    ) -> Option<TreatmentCondition> {
        self.conditions.insert(id.into(), condition)
    }

    /// Model identifier.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Tumour type, if known.
    pub fn tumour_type(&self) -> Option<&str> {
        self.tumour_type.as_deref()
    }

    /// The control arm, if present.
    pub fn control(&self) -> Option<&TreatmentCondition> {
        self.conditions.get(&ConditionId::Control)
    }

    /// Treatment arms by name, in name order.
    pub fn treatments(&self) -> impl Iterator<Item = (&str, &TreatmentCondition)> {
        self.conditions.iter().filter_map(|(id, condition)| match id {
            ConditionId::Treatment(name) => Some((name.as_str(), condition)),
            ConditionId::Control => None,
        })
    }

    /// All arms including the control.
    pub fn conditions(&self) -> &BTreeMap<ConditionId, TreatmentCondition> {
        &self.conditions
    }
}

/// A treatment arm and the control of the same model.
#[derive(Debug, Clone, Copy)]
pub struct CaseControl<'a> {
    /// Tumour type of the model.
    pub tumour_type: Option<&'a str>,
    /// Treated arm.
    pub case: &'a TreatmentCondition,
    /// Untreated arm of the same model.
    pub control: &'a TreatmentCondition,
}

/// Collection of cancer models analysed together.
#[derive(Debug, Clone, Default)]
pub struct Cohort {
    models: Vec<CancerModel>,
}

impl Cohort {
    /// Empty cohort.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a model.
    pub fn push(&mut self, model: CancerModel) {
        self.models.push(model);
    }

    /// Models in insertion order.
    pub fn models(&self) -> &[CancerModel] {
        &self.models
    }

    /// Every (model, treatment) experiment paired with its model's control.
    ///
    /// Models without a control arm contribute no pairs.
    pub fn case_control_pairs(&self) -> BTreeMap<ExperimentKey, CaseControl<'_>> {
        let mut pairs = BTreeMap::new();
        for model in &self.models {
            let Some(control) = model.control() else {
                if model.treatments().next().is_some() {
                    warn!(model = model.name(), "model has no control arm, skipping its treatments");
                }
                continue;
            };
            for (treatment, case) in model.treatments() {
                pairs.insert(
                    ExperimentKey::new(model.name(), treatment),
                    CaseControl {
                        tumour_type: model.tumour_type(),
                        case,
                        control,
                    },
                );
            }
        }
        pairs
    }

    /// Control arms of all models, in insertion order.
    pub fn controls(&self) -> Vec<&TreatmentCondition> {
        self.models.iter().filter_map(CancerModel::control).collect()
    }
}

impl FromIterator<CancerModel> for Cohort {
    fn from_iter<I: IntoIterator<Item = CancerModel>>(iter: I) -> Self {
        Self {
            models: iter.into_iter().collect(),
        }
    }
}
