use focuscam_storage::Status;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// One class score produced by the external pose classifier
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    #[serde(rename = "className", alias = "label")]
    pub label: String,
    pub probability: f32,
}

impl Prediction {
    #[must_use]
    pub fn new(label: impl Into<String>, probability: f32) -> Self {
        Self {
            label: label.into(),
            probability,
        }
    }
}

/// Top class of a single frame
#[derive(Debug, Clone, PartialEq)]
pub struct ClassificationSample {
    pub label: String,
    pub probability: f32,
}

/// Pick the highest-probability prediction; the earliest wins ties
///
/// NaN scores are skipped. Returns `None` for an empty list.
#[must_use]
pub fn top_prediction(predictions: &[Prediction]) -> Option<(usize, &Prediction)> {
    let mut best: Option<(usize, &Prediction)> = None;
    for (index, prediction) in predictions.iter().enumerate() {
        if prediction.probability.is_nan() {
            continue;
        }
        match best {
            Some((_, top)) if top.probability >= prediction.probability => {}
            _ => best = Some((index, prediction)),
        }
    }
    best
}

/// Explicit mapping from model class label to status tag
#[derive(Debug, Clone, Default)]
pub struct LabelMap {
    exact: HashMap<String, Status>,
    folded: HashMap<String, Status>,
}

impl LabelMap {
    pub fn new(entries: impl IntoIterator<Item = (String, Status)>) -> Self {
        let mut map = Self::default();
        for (label, status) in entries {
            map.insert(label, status);
        }
        map
    }

    pub fn insert(&mut self, label: String, status: Status) {
        self.folded.insert(label.to_lowercase(), status);
        self.exact.insert(label, status);
    }

    /// Resolve a model label: exact match first, then case-insensitive
    #[must_use]
    pub fn resolve(&self, label: &str) -> Option<Status> {
        self.exact
            .get(label)
            .or_else(|| self.folded.get(&label.to_lowercase()))
            .copied()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.exact.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.exact.is_empty()
    }
}

/// Turns a frame's predictions into a pending status
#[derive(Debug, Clone)]
pub struct ClassificationGate {
    threshold: f32,
    labels: LabelMap,
}

impl ClassificationGate {
    #[must_use]
    pub fn new(threshold: f32, labels: LabelMap) -> Self {
        Self { threshold, labels }
    }

    #[must_use]
    pub const fn threshold(&self) -> f32 {
        self.threshold
    }

    /// Top class of the frame, if any
    #[must_use]
    pub fn sample(&self, predictions: &[Prediction]) -> Option<ClassificationSample> {
        top_prediction(predictions).map(|(_, p)| ClassificationSample {
            label: p.label.clone(),
            probability: p.probability,
        })
    }

    /// Status for this frame, or `None` when the frame should not update anything
    ///
    /// The top probability must strictly exceed the threshold and its label must be mapped.
    #[must_use]
    pub fn evaluate(&self, predictions: &[Prediction]) -> Option<Status> {
        let sample = self.sample(predictions)?;
        if sample.probability <= self.threshold {
            return None;
        }
        let status = self.labels.resolve(&sample.label);
        if status.is_none() {
            log::debug!("Ignoring unmapped class label '{}'", sample.label);
        }
        status
    }
}
