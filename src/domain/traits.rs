// ============================================================
// Layer 3 — Core Traits (Abstractions)
// ============================================================
// Traits are Rust's way of defining shared behaviour —
// similar to interfaces in Java or abstract classes in Python.
//
// By programming against traits instead of concrete types,
// we can swap implementations without changing the code
// that uses them. For example:
//   - CsvRecordSource implements RecordSource
//   - A future database reader could also implement RecordSource
//   - The application layer only sees RecordSource
//     and works with both without any changes
//
// ModelTrainer is the important seam: the cross-validation
// driver schedules trials purely through this trait, so the
// model stays a black box to it and the driver's fold/grid
// accounting is testable with a stub trainer and no tensors.
//
// Reference: Rust Book §10 (Traits: Defining Shared Behaviour)
//            Rust Book §17 (Object Oriented Patterns)

use anyhow::Result;

use crate::domain::customer::CustomerRecord;
use crate::domain::trial::{HyperparameterConfig, TrialOutcome};

// ─── RecordSource ─────────────────────────────────────────────────────────────
/// Any component that can load labelled customer records.
///
/// Implementations:
///   - CsvRecordSource → reads a headered telco CSV from disk
///   - test stubs      → hand back synthetic record vectors
pub trait RecordSource {
    /// Load all available records from this source.
    fn load_all(&self) -> Result<Vec<CustomerRecord>>;
}

// ─── ModelTrainer ─────────────────────────────────────────────────────────────
/// Any component that can train one model on a training partition
/// and score it on an evaluation partition.
///
/// Contract the cross-validation driver relies on:
///   - fitted state (feature encoder, weights) is derived from
///     `train` only; `eval` is never observed during fitting
///   - `seed` fully determines the trial: same inputs + same seed
///     means the same outcome, regardless of when the trial runs
///   - a failed trial is an Err, never a panic
///
/// Implementations:
///   - ChurnTrainer → Burn-backed MLP training (ml layer)
///   - StubTrainer  → deterministic fake used by driver tests
pub trait ModelTrainer {
    /// Train one trial with `config` on `train`, score it on `eval`.
    fn train_and_score(
        &self,
        config: &HyperparameterConfig,
        train:  &[CustomerRecord],
        eval:   &[CustomerRecord],
        seed:   u64,
    ) -> Result<TrialOutcome>;
}
