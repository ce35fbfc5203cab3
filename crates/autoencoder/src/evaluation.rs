//! Classification metrics over predicted vs. ground-truth labels.
//!
//! Convention: `true` / `SampleLabel::Normal` is the positive class, so
//! precision answers "of the samples we called normal, how many were", and
//! recall answers "of the truly normal samples, how many did we find".

use dataset::SampleLabel;
use serde::{Deserialize, Serialize};

use crate::detection::DetectError;

/// What to report when a precision/recall denominator is zero.
///
/// The choice is the caller's; it is carried on the report so downstream
/// consumers know which policy produced the numbers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RatioPolicy {
    /// Report 0.0 for an undefined ratio.
    Zero,
    /// Report NaN for an undefined ratio.
    Nan,
}

impl RatioPolicy {
    fn ratio(&self, numerator: usize, denominator: usize) -> f64 {
        if denominator == 0 {
            return match self {
                Self::Zero => 0.0,
                Self::Nan => f64::NAN,
            };
        }
        numerator as f64 / denominator as f64
    }
}

/// Accuracy, precision, and recall plus the underlying confusion counts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluationReport {
    pub accuracy: f64,
    pub precision: f64,
    pub recall: f64,
    pub true_positives: usize,
    pub false_positives: usize,
    pub true_negatives: usize,
    pub false_negatives: usize,
    /// Policy that produced precision/recall when a denominator was zero.
    pub ratio_policy: RatioPolicy,
}

/// Compute accuracy, precision, and recall over parallel label sequences.
///
/// `predicted[i]` and `truth[i]` describe the same sample; `true` means
/// normal (the positive class). Pure reporting; inputs are not mutated.
/// Fails with [`DetectError::LengthMismatch`] when the sequences differ in
/// length, and reports 0.0 across the board for empty inputs.
pub fn evaluate(
    predicted: &[bool],
    truth: &[bool],
    policy: RatioPolicy,
) -> Result<EvaluationReport, DetectError> {
    if predicted.len() != truth.len() {
        return Err(DetectError::LengthMismatch {
            left: predicted.len(),
            right: truth.len(),
        });
    }

    let mut true_positives = 0;
    let mut false_positives = 0;
    let mut true_negatives = 0;
    let mut false_negatives = 0;

    for (&p, &t) in predicted.iter().zip(truth) {
        match (p, t) {
            (true, true) => true_positives += 1,
            (true, false) => false_positives += 1,
            (false, false) => true_negatives += 1,
            (false, true) => false_negatives += 1,
        }
    }

    Ok(EvaluationReport {
        accuracy: policy.ratio(true_positives + true_negatives, predicted.len()),
        precision: policy.ratio(true_positives, true_positives + false_positives),
        recall: policy.ratio(true_positives, true_positives + false_negatives),
        true_positives,
        false_positives,
        true_negatives,
        false_negatives,
        ratio_policy: policy,
    })
}

/// Convenience wrapper over [`evaluate`] for label slices.
pub fn evaluate_labels(
    predicted: &[SampleLabel],
    truth: &[SampleLabel],
    policy: RatioPolicy,
) -> Result<EvaluationReport, DetectError> {
    let predicted: Vec<bool> = predicted.iter().map(SampleLabel::is_normal).collect();
    let truth: Vec<bool> = truth.iter().map(SampleLabel::is_normal).collect();
    evaluate(&predicted, &truth, policy)
}
