// ============================================================
// Layer 3 — Hyperparameters and Trial Results
// ============================================================
// The value types flowing through model selection:
//
//   HyperparameterConfig  one point in the search grid
//   TrialOutcome          what training one trial produces
//   TrialResult           one config's inner-fold scores
//   OuterFoldResult       everything that happened in one outer fold
//   NestedCvReport        the whole procedure, aggregated
//
// All of them serialise to JSON so a finished run can be logged
// verbatim as a tracking artifact and re-read later.
//
// Reference: Rust Book §5 (Structs), §10 (Derive Macros)

use serde::{Deserialize, Serialize};

use crate::domain::evaluation::ClassificationReport;

// ─── HyperparameterConfig ─────────────────────────────────────────────────────
/// One immutable point in the hyperparameter grid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HyperparameterConfig {
    /// Width of each hidden layer, in order
    pub hidden_units: Vec<usize>,

    /// Dropout probability applied after every hidden layer
    pub dropout: f64,

    /// Adam learning rate
    pub learning_rate: f64,

    /// Mini-batch size
    pub batch_size: usize,

    /// Full passes over the training partition
    pub epochs: usize,
}

impl Default for HyperparameterConfig {
    fn default() -> Self {
        Self {
            hidden_units:  vec![64, 32],
            dropout:       0.3,
            learning_rate: 1e-3,
            batch_size:    32,
            epochs:        50,
        }
    }
}

impl HyperparameterConfig {
    /// The default search grid, smallest architecture first.
    /// Grid order matters: ties in the inner mean are broken by
    /// the lowest index, so cheaper configs win ties.
    pub fn default_grid() -> Vec<HyperparameterConfig> {
        vec![
            HyperparameterConfig {
                hidden_units:  vec![64, 32],
                dropout:       0.2,
                learning_rate: 1e-3,
                batch_size:    32,
                epochs:        50,
            },
            HyperparameterConfig {
                hidden_units:  vec![128, 64],
                dropout:       0.3,
                learning_rate: 1e-3,
                batch_size:    32,
                epochs:        50,
            },
            HyperparameterConfig {
                hidden_units:  vec![128, 64, 32],
                dropout:       0.3,
                learning_rate: 5e-4,
                batch_size:    64,
                epochs:        50,
            },
        ]
    }
}

// ─── TrialOutcome ─────────────────────────────────────────────────────────────
/// What one successful training trial hands back to the driver.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrialOutcome {
    /// Metrics on the partition the trial was scored against
    pub report: ClassificationReport,

    /// Mean training loss per epoch, in epoch order
    pub loss_curve: Vec<f64>,
}

// ─── TrialResult ──────────────────────────────────────────────────────────────
/// One grid config's showing across the inner folds of one outer fold.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrialResult {
    /// Index into the search grid
    pub config_index: usize,

    /// Selection scores of the trials that completed
    pub inner_scores: Vec<f64>,

    /// Trials that failed and were excluded from the mean
    pub failures: usize,

    /// Arithmetic mean of inner_scores; None when every trial failed
    pub mean_score: Option<f64>,
}

impl TrialResult {
    /// Build a result from the completed scores, computing the mean.
    pub fn new(config_index: usize, inner_scores: Vec<f64>, failures: usize) -> Self {
        let mean_score = if inner_scores.is_empty() {
            None
        } else {
            Some(inner_scores.iter().sum::<f64>() / inner_scores.len() as f64)
        };
        Self { config_index, inner_scores, failures, mean_score }
    }
}

// ─── OuterFoldResult ──────────────────────────────────────────────────────────
/// One outer fold: the grid search it ran and how the winner did
/// on the held-out test partition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OuterFoldResult {
    /// Outer fold index, 0-based
    pub fold: usize,

    /// One entry per grid config, in grid order
    pub trials: Vec<TrialResult>,

    /// Winning grid index; None when no config had a usable mean
    /// or the winner's retrain failed
    pub selected_config: Option<usize>,

    /// Evaluation of the retrained winner on the outer test fold;
    /// None when the fold's score is unavailable
    pub outer_report: Option<ClassificationReport>,
}

// ─── NestedCvReport ───────────────────────────────────────────────────────────
/// The aggregated result of the whole nested cross-validation run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NestedCvReport {
    pub outer_folds: Vec<OuterFoldResult>,

    /// Mean outer selection score over folds with an available report
    pub mean_outer_score: Option<f64>,

    /// Population standard deviation of the same scores
    pub std_outer_score: Option<f64>,

    /// Field-wise mean of the available outer reports
    pub mean_outer_report: Option<ClassificationReport>,
}

impl NestedCvReport {
    /// Aggregate per-fold results. Folds whose outer score is
    /// unavailable are skipped; summing over a set keeps the
    /// aggregation independent of fold processing order.
    pub fn from_folds(outer_folds: Vec<OuterFoldResult>) -> Self {
        let available: Vec<ClassificationReport> = outer_folds
            .iter()
            .filter_map(|f| f.outer_report.clone())
            .collect();

        let scores: Vec<f64> = available.iter().map(|r| r.f1).collect();
        let (mean_outer_score, std_outer_score) = if scores.is_empty() {
            (None, None)
        } else {
            let n    = scores.len() as f64;
            let mean = scores.iter().sum::<f64>() / n;
            let var  = scores.iter().map(|s| (s - mean).powi(2)).sum::<f64>() / n;
            (Some(mean), Some(var.sqrt()))
        };

        let mean_outer_report = ClassificationReport::mean_of(&available);

        Self { outer_folds, mean_outer_score, std_outer_score, mean_outer_report }
    }

    /// Number of outer folds that produced a usable score
    pub fn available_folds(&self) -> usize {
        self.outer_folds
            .iter()
            .filter(|f| f.outer_report.is_some())
            .count()
    }
}
