// ============================================================
// Layer 4 — Feature Encoder
// ============================================================
// Turns a CustomerRecord into the fixed-width numeric vector
// the model consumes. Two fitted pieces of state make that
// reproducible:
//
//   1. One vocabulary per categorical feature.
//      Values are indexed in lexicographic order, so the
//      mapping depends only on WHICH values were seen,
//      never on row order.
//   2. Per-column mean and standard deviation.
//      Applied to all columns, including the category indices,
//      after index substitution.
//
// Feature vector layout (FEATURE_WIDTH columns, fixed order):
//   [tenure, monthly_charges, total_charges,
//    phone_service, contract, paperless_billing, payment_method]
//
// The leakage rule: fit() observes exactly the slice it is
// given. Cross-validation fits one encoder per fold on that
// fold's training partition, so held-out rows can never move
// the fitted means or extend a vocabulary.
//
// A category value never seen at fit time is handled by policy:
//   Reject        → typed UnknownCategory error (default)
//   FirstCategory → substitute index 0, the lexicographically
//                   first fitted value
//
// The whole struct serialises to JSON and is stored next to the
// model weights, so serving uses exactly the fitted state.
//
// Reference: Rust Book §8 (Collections)
//            Rust Book §10 (Derive Macros)

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::domain::customer::CustomerRecord;
use crate::domain::errors::ChurnError;

/// Numeric columns, in vector order
pub const NUMERIC_FEATURES: [&str; 3] = ["tenure", "monthly_charges", "total_charges"];

/// Categorical columns, in vector order (after the numeric ones)
pub const CATEGORICAL_FEATURES: [&str; 4] = [
    "phone_service",
    "contract",
    "paperless_billing",
    "payment_method",
];

/// Width of every encoded vector
pub const FEATURE_WIDTH: usize = NUMERIC_FEATURES.len() + CATEGORICAL_FEATURES.len();

/// Columns with zero variance are passed through unscaled
const MIN_STD: f64 = 1e-12;

/// What transform() does with a category value that was not
/// present in the fitting data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UnknownCategoryPolicy {
    /// Surface a typed UnknownCategory error
    Reject,

    /// Substitute index 0 (the lexicographically first fitted value)
    FirstCategory,
}

/// Fitted encoding state. Create with fit(), apply with transform().
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureEncoder {
    /// value → index map, one per entry of CATEGORICAL_FEATURES
    vocabularies: Vec<BTreeMap<String, usize>>,

    /// Per-column mean of the raw (index-substituted) matrix
    means: Vec<f64>,

    /// Per-column standard deviation, floored at 1.0 for
    /// zero-variance columns
    stds: Vec<f64>,

    /// Unknown-category behaviour at transform time
    unknown_policy: UnknownCategoryPolicy,
}

impl FeatureEncoder {
    /// Fit with the default Reject policy.
    pub fn fit(records: &[CustomerRecord]) -> Result<Self, ChurnError> {
        Self::fit_with_policy(records, UnknownCategoryPolicy::Reject)
    }

    /// Fit vocabularies and scaling parameters on `records` ONLY.
    pub fn fit_with_policy(
        records: &[CustomerRecord],
        unknown_policy: UnknownCategoryPolicy,
    ) -> Result<Self, ChurnError> {
        if records.is_empty() {
            return Err(ChurnError::InvalidRecord(
                "cannot fit a feature encoder on zero records".to_string(),
            ));
        }
        for record in records {
            record.validate()?;
        }

        // ── Step 1: vocabularies, sorted so indices are row-order-free ────────
        let vocabularies: Vec<BTreeMap<String, usize>> = (0..CATEGORICAL_FEATURES.len())
            .map(|feature| {
                let values: BTreeSet<String> = records
                    .iter()
                    .map(|r| categorical_value(r, feature).to_string())
                    .collect();
                values
                    .into_iter()
                    .enumerate()
                    .map(|(index, value)| (value, index))
                    .collect()
            })
            .collect();

        // ── Step 2: raw matrix with category indices substituted ──────────────
        let mut rows: Vec<[f64; FEATURE_WIDTH]> = Vec::with_capacity(records.len());
        for record in records {
            let mut indices = [0usize; CATEGORICAL_FEATURES.len()];
            for (feature, vocabulary) in vocabularies.iter().enumerate() {
                // Fit data built the vocabulary, so the lookup cannot miss
                indices[feature] = vocabulary[categorical_value(record, feature)];
            }
            rows.push(raw_features(record, &indices));
        }

        // ── Step 3: per-column mean and std ───────────────────────────────────
        let n = rows.len() as f64;
        let mut means = vec![0.0f64; FEATURE_WIDTH];
        let mut stds  = vec![0.0f64; FEATURE_WIDTH];

        for column in 0..FEATURE_WIDTH {
            let mean = rows.iter().map(|r| r[column]).sum::<f64>() / n;
            let var  = rows.iter().map(|r| (r[column] - mean).powi(2)).sum::<f64>() / n;
            means[column] = mean;
            stds[column]  = var.sqrt();
        }

        Ok(Self { vocabularies, means, stds, unknown_policy })
    }

    /// Encode one record with the fitted state. Never mutates.
    pub fn transform(&self, record: &CustomerRecord) -> Result<Vec<f32>, ChurnError> {
        record.validate()?;

        let mut indices = [0usize; CATEGORICAL_FEATURES.len()];
        for (feature, vocabulary) in self.vocabularies.iter().enumerate() {
            let value = categorical_value(record, feature);
            indices[feature] = match vocabulary.get(value) {
                Some(&index) => index,
                None => match self.unknown_policy {
                    UnknownCategoryPolicy::Reject => {
                        return Err(ChurnError::UnknownCategory {
                            feature: CATEGORICAL_FEATURES[feature].to_string(),
                            value:   value.to_string(),
                        });
                    }
                    UnknownCategoryPolicy::FirstCategory => 0,
                },
            };
        }

        let raw = raw_features(record, &indices);
        let encoded = raw
            .iter()
            .enumerate()
            .map(|(column, &x)| {
                let std = if self.stds[column] < MIN_STD { 1.0 } else { self.stds[column] };
                ((x - self.means[column]) / std) as f32
            })
            .collect();
        Ok(encoded)
    }

    /// Encode a whole slice; the first bad record aborts.
    pub fn transform_all(&self, records: &[CustomerRecord]) -> Result<Vec<Vec<f32>>, ChurnError> {
        records.iter().map(|r| self.transform(r)).collect()
    }

    /// Width of the vectors transform() produces
    pub fn feature_width(&self) -> usize {
        FEATURE_WIDTH
    }

    /// Distinct values seen per categorical feature, for run logs
    pub fn vocabulary_sizes(&self) -> Vec<usize> {
        self.vocabularies.iter().map(|v| v.len()).collect()
    }
}

/// The categorical field for a given CATEGORICAL_FEATURES position
fn categorical_value(record: &CustomerRecord, feature: usize) -> &str {
    match feature {
        0 => &record.phone_service,
        1 => &record.contract,
        2 => &record.paperless_billing,
        _ => &record.payment_method,
    }
}

/// Unscaled feature row: numeric columns then category indices
fn raw_features(record: &CustomerRecord, indices: &[usize]) -> [f64; FEATURE_WIDTH] {
    [
        record.tenure as f64,
        record.monthly_charges,
        record.total_charges,
        indices[0] as f64,
        indices[1] as f64,
        indices[2] as f64,
        indices[3] as f64,
    ]
}
