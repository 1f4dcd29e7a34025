// ============================================================
// Layer 3 — Typed Error Kinds
// ============================================================
// Every failure the pipeline can surface to a caller has a
// distinct variant here, so callers can branch on the kind
// instead of parsing message strings.
//
// The four kinds map to the four failure situations:
//   - InvalidRecord         → input rejected before encoding
//   - UnknownCategory       → category value never seen at fit time
//   - ModelUnavailable      → no promoted model artifact to serve from
//   - TrainingTrialFailure  → one cross-validation trial went wrong
//
// thiserror generates the Display and std::error::Error impls,
// which also makes the enum compose with anyhow at the
// application boundaries via `?`.
//
// Reference: Rust Book §9 (Error Handling)
//            thiserror crate documentation

use thiserror::Error;

/// Typed failure kinds for the churn pipeline.
#[derive(Debug, Error)]
pub enum ChurnError {
    /// A record failed validation before encoding
    /// (missing field, negative charge, empty category, ...)
    #[error("invalid record: {0}")]
    InvalidRecord(String),

    /// A categorical value was not present in the fitted vocabulary
    #[error("unknown category '{value}' for feature '{feature}'")]
    UnknownCategory { feature: String, value: String },

    /// No servable model: nothing registered, nothing promoted,
    /// or a promoted artifact file is missing on disk
    #[error("model unavailable: {0}")]
    ModelUnavailable(String),

    /// A single training trial failed (non-finite loss, degenerate
    /// partition, ...). The cross-validation driver excludes the
    /// trial instead of aborting the run.
    #[error("training trial failed: {0}")]
    TrainingTrialFailure(String),
}
