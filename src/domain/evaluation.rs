// ============================================================
// Layer 3 — Classification Report
// ============================================================
// Pure metric math over predicted probabilities and true labels.
// No tensors here: the ml layer hands over plain Vec<f64>/Vec<bool>
// and this module reduces them to the standard binary metrics.
//
// Confusion counts at the decision threshold:
//   tp: predicted churn, did churn     fp: predicted churn, stayed
//   fn: predicted stay,  did churn     tn: predicted stay,  stayed
//
// Zero-denominator conventions follow the usual scoring rules:
// precision, recall, and F1 fall back to 0.0 rather than NaN, so
// a degenerate fold still aggregates cleanly.
//
// Reference: Rust Book §5 (Structs)

use serde::{Deserialize, Serialize};

/// Probabilities are clamped into [EPS, 1 - EPS] before the log,
/// so a saturated sigmoid cannot produce an infinite log-loss.
const LOG_LOSS_EPS: f64 = 1e-7;

/// Metrics of one evaluation pass over a labelled partition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationReport {
    /// Mean binary cross-entropy of the predicted probabilities
    pub log_loss: f64,

    /// Fraction of correct decisions at the threshold
    pub accuracy: f64,

    /// tp / (tp + fp) — how often a predicted churn was real
    pub precision: f64,

    /// tp / (tp + fn) — how many real churns were caught
    pub recall: f64,

    /// Harmonic mean of precision and recall; the model
    /// selection score throughout the pipeline
    pub f1: f64,
}

impl ClassificationReport {
    /// Score predicted churn probabilities against true labels.
    ///
    /// A probability strictly above `threshold` counts as a
    /// predicted churn, matching the serving decision rule.
    pub fn from_probabilities(probabilities: &[f64], labels: &[bool], threshold: f64) -> Self {
        let mut tp = 0usize;
        let mut fp = 0usize;
        let mut tn = 0usize;
        let mut fn_ = 0usize;
        let mut loss_sum = 0.0f64;

        for (&p, &churned) in probabilities.iter().zip(labels.iter()) {
            let predicted_churn = p > threshold;
            match (predicted_churn, churned) {
                (true, true)   => tp += 1,
                (true, false)  => fp += 1,
                (false, true)  => fn_ += 1,
                (false, false) => tn += 1,
            }

            let p = p.clamp(LOG_LOSS_EPS, 1.0 - LOG_LOSS_EPS);
            loss_sum -= if churned { p.ln() } else { (1.0 - p).ln() };
        }

        let total = tp + fp + tn + fn_;
        let ratio = |num: usize, den: usize| {
            if den == 0 { 0.0 } else { num as f64 / den as f64 }
        };

        let accuracy  = ratio(tp + tn, total);
        let precision = ratio(tp, tp + fp);
        let recall    = ratio(tp, tp + fn_);
        let f1 = if precision + recall == 0.0 {
            0.0
        } else {
            2.0 * precision * recall / (precision + recall)
        };
        let log_loss = if total == 0 { 0.0 } else { loss_sum / total as f64 };

        Self { log_loss, accuracy, precision, recall, f1 }
    }

    /// Field-wise mean of several reports (e.g. one per outer fold).
    /// Returns None for an empty slice so callers must handle the
    /// "no fold produced a score" case explicitly.
    pub fn mean_of(reports: &[ClassificationReport]) -> Option<ClassificationReport> {
        if reports.is_empty() {
            return None;
        }
        let n = reports.len() as f64;
        Some(ClassificationReport {
            log_loss:  reports.iter().map(|r| r.log_loss).sum::<f64>() / n,
            accuracy:  reports.iter().map(|r| r.accuracy).sum::<f64>() / n,
            precision: reports.iter().map(|r| r.precision).sum::<f64>() / n,
            recall:    reports.iter().map(|r| r.recall).sum::<f64>() / n,
            f1:        reports.iter().map(|r| r.f1).sum::<f64>() / n,
        })
    }
}
