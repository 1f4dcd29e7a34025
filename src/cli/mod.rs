// ============================================================
// Layer 1 — CLI / Presentation Layer
// ============================================================
// This is the entry point for all user interaction.
// It uses the `clap` crate to parse command line arguments.
// All business logic is delegated to Layer 2 (application).
//
// Three commands are supported:
//   1. `train`   — runs nested cross-validation, fits the final
//                  model and promotes it to production
//   2. `predict` — scores one customer JSON file against the
//                  production model
//   3. `info`    — prints what the registry currently serves
//
// Reference: Rust Book §7 (Modules), §12 (CLI programs)

// Declare the commands submodule
pub mod commands;

use anyhow::{Context, Result};
use clap::Parser;
use commands::{Commands, InfoArgs, PredictArgs, TrainArgs};

/// The main CLI struct — clap reads the fields and generates
/// argument parsing code automatically via the Parser derive macro.
#[derive(Parser, Debug)]
#[command(
    name = "churn-predictor",
    version = "0.1.0",
    about = "Train a customer churn model with nested cross-validation, then serve predictions."
)]
pub struct Cli {
    /// The subcommand to run (train, predict or info)
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Match on the subcommand and dispatch to the correct use case.
    /// This keeps the CLI layer thin — it only routes, never computes.
    pub fn run(self) -> Result<()> {
        match self.command.clone() {
            Commands::Train(args)   => self.run_train(args),
            Commands::Predict(args) => self.run_predict(args),
            Commands::Info(args)    => self.run_info(args),
        }
    }

    /// Handles the `train` subcommand.
    /// Converts CLI args into a TrainConfig and hands off to Layer 2.
    fn run_train(&self, args: TrainArgs) -> Result<()> {
        use crate::application::train_use_case::TrainUseCase;

        tracing::info!("Starting training on records in: {}", args.data_path);

        // Convert CLI args → application config (separates presentation from domain)
        let use_case = TrainUseCase::new(args.into());
        use_case.execute()?;

        println!("Training complete. Model registered and promoted to production.");
        Ok(())
    }

    /// Handles the `predict` subcommand.
    /// Reads one request from a JSON file and prints the response JSON.
    fn run_predict(&self, args: PredictArgs) -> Result<()> {
        use crate::application::dto::PredictionRequest;
        use crate::application::predict_use_case::PredictUseCase;

        let json = std::fs::read_to_string(&args.input)
            .with_context(|| format!("Cannot read request file '{}'", args.input))?;
        let request: PredictionRequest = serde_json::from_str(&json)
            .with_context(|| format!("'{}' is not a valid prediction request", args.input))?;

        let use_case = PredictUseCase::new(&args.store_dir, &args.model_name)?;
        let response = use_case.predict(request)?;

        println!("{}", serde_json::to_string_pretty(&response)?);
        Ok(())
    }

    /// Handles the `info` subcommand.
    /// Asks the registry what the production alias points at.
    fn run_info(&self, args: InfoArgs) -> Result<()> {
        use crate::infra::registry::ModelRegistry;

        let info = ModelRegistry::new(&args.store_dir).model_info(&args.model_name)?;
        println!("{}", serde_json::to_string_pretty(&info)?);
        Ok(())
    }
}
