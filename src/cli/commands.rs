// ============================================================
// Layer 1 — CLI Commands and Arguments
// ============================================================
// Defines the three subcommands: `train`, `predict` and `info`
// and all their configurable flags.
//
// clap's derive macros automatically generate:
//   - help text (--help)
//   - error messages for missing args
//   - type conversion (string → usize, f64, etc.)
//
// Reference: Rust Book §12 (Building a CLI Program)

use clap::{Args, Subcommand};

use crate::application::train_use_case::TrainConfig;
use crate::domain::trial::HyperparameterConfig;

/// The three top-level subcommands available to the user
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Train a churn model with nested cross-validation
    Train(TrainArgs),

    /// Score one customer against the production model
    Predict(PredictArgs),

    /// Show what the registry currently serves for a model name
    Info(InfoArgs),
}

/// All arguments for the `train` command.
/// Each field becomes a --flag on the command line.
#[derive(Args, Debug, Clone)]
pub struct TrainArgs {
    /// CSV file of customer records to train on
    #[arg(long, default_value = "data/churn_sample.csv")]
    pub data_path: String,

    /// Root directory of the run store and model registry
    #[arg(long, default_value = "mlruns")]
    pub store_dir: String,

    /// Name the trained model is registered under
    #[arg(long, default_value = "churn_model")]
    pub model_name: String,

    /// Outer folds of the nested procedure — each one holds out
    /// a test partition the grid search never sees
    #[arg(long, default_value_t = 5)]
    pub outer_folds: usize,

    /// Inner folds the grid search runs inside each outer fold
    #[arg(long, default_value_t = 3)]
    pub inner_folds: usize,

    /// Base seed every split and trial seed is derived from —
    /// same seed, same data, same result
    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    /// Probability above which a customer is predicted to churn
    #[arg(long, default_value_t = 0.5)]
    pub threshold: f64,
}

/// Convert CLI TrainArgs into the application-layer TrainConfig.
/// This is the boundary between Layer 1 and Layer 2 —
/// the application layer never sees clap types.
impl From<TrainArgs> for TrainConfig {
    fn from(a: TrainArgs) -> Self {
        TrainConfig {
            data_path:   a.data_path,
            store_dir:   a.store_dir,
            model_name:  a.model_name,
            outer_folds: a.outer_folds,
            inner_folds: a.inner_folds,
            seed:        a.seed,
            threshold:   a.threshold,
            grid:        HyperparameterConfig::default_grid(),
        }
    }
}

/// All arguments for the `predict` command
#[derive(Args, Debug, Clone)]
pub struct PredictArgs {
    /// JSON file holding one customer in the request format
    #[arg(long)]
    pub input: String,

    /// Root directory of the run store and model registry
    #[arg(long, default_value = "mlruns")]
    pub store_dir: String,

    /// Registered model name to serve
    #[arg(long, default_value = "churn_model")]
    pub model_name: String,
}

/// All arguments for the `info` command
#[derive(Args, Debug, Clone)]
pub struct InfoArgs {
    /// Root directory of the run store and model registry
    #[arg(long, default_value = "mlruns")]
    pub store_dir: String,

    /// Registered model name to look up
    #[arg(long, default_value = "churn_model")]
    pub model_name: String,
}
