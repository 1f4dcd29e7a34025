// ============================================================
// Layer 2 — TrainUseCase
// ============================================================
// Orchestrates the full training pipeline in order:
//
//   Step 1: Load customer records       (Layer 4 - data)
//   Step 2: Keep the labelled records   (Layer 2)
//   Step 3: Start run, log params       (Layer 6 - infra)
//   Step 4: Nested cross-validation     (Layer 5 - ml)
//   Step 5: Log the outer estimate      (Layer 6 - infra)
//   Step 6: Final selection + full fit  (Layer 5 - ml)
//   Step 7: Save artifacts into the run (Layer 6 - infra)
//   Step 8: Register and promote        (Layer 6 - infra)
//
// The nested procedure estimates how well this WAY of building
// a model performs; the model that ships is a fresh fit of the
// final selection on every labelled record.
//
// Reference: Rust Book §13 (Iterators and Closures)
//            Burn Book §5 (Training)

use anyhow::Result;
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::data::loader::CsvRecordSource;
use crate::domain::customer::CustomerRecord;
use crate::domain::traits::RecordSource;
use crate::domain::trial::HyperparameterConfig;
use crate::infra::checkpoint::{FinalModelConfig, ModelCheckpoint};
use crate::infra::encoder_store::EncoderStore;
use crate::infra::registry::{ModelRegistry, PRODUCTION_ALIAS};
use crate::infra::tracking::{ExperimentTracker, RunHandle, RunStatus};
use crate::ml::cross_validation::NestedCrossValidation;
use crate::ml::trainer::ChurnTrainer;

// ─── Training Configuration ──────────────────────────────────────────────────
// All parameters for a training run.
// Serialisable so the whole configuration lands in the run's
// params.json and any run can be re-read later.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainConfig {
    pub data_path:   String,
    pub store_dir:   String,
    pub model_name:  String,
    pub outer_folds: usize,
    pub inner_folds: usize,
    pub seed:        u64,
    pub threshold:   f64,
    pub grid:        Vec<HyperparameterConfig>,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            data_path:   "data/churn_sample.csv".to_string(),
            store_dir:   "mlruns".to_string(),
            model_name:  "churn_model".to_string(),
            outer_folds: 5,
            inner_folds: 3,
            seed:        42,
            threshold:   0.5,
            grid:        HyperparameterConfig::default_grid(),
        }
    }
}

// ─── TrainUseCase ─────────────────────────────────────────────────────────────
// Owns the config and runs the full training pipeline.
pub struct TrainUseCase {
    config: TrainConfig,
}

impl TrainUseCase {
    /// Create a new TrainUseCase with the given configuration
    pub fn new(config: TrainConfig) -> Self {
        Self { config }
    }

    /// Execute the full training pipeline end to end.
    /// The run is marked FINISHED or FAILED either way.
    pub fn execute(&self) -> Result<()> {
        let tracker = ExperimentTracker::new(&self.config.store_dir);
        let run = tracker.start_run(&self.config.model_name)?;

        match self.run_pipeline(&run) {
            Ok(()) => run.finish(RunStatus::Finished),
            Err(error) => {
                run.finish(RunStatus::Failed).ok();
                Err(error)
            }
        }
    }

    fn run_pipeline(&self, run: &RunHandle) -> Result<()> {
        let cfg = &self.config;

        // ── Step 1: Load customer records ─────────────────────────────────────
        // CsvRecordSource parses the headered CSV, skipping rows
        // it cannot repair
        tracing::info!("Loading customer records from '{}'", cfg.data_path);
        let source = CsvRecordSource::new(&cfg.data_path);
        let all_records = source.load_all()?;

        // ── Step 2: Keep the labelled records ─────────────────────────────────
        // Unlabelled rows cannot train or score anything
        let records: Vec<CustomerRecord> = all_records
            .into_iter()
            .filter(|r| r.churn.is_some())
            .collect();
        let churned = records.iter().filter(|r| r.churn == Some(true)).count();
        tracing::info!(
            "{} labelled records ({} churned, {} stayed)",
            records.len(),
            churned,
            records.len() - churned,
        );

        // ── Step 3: Log the run's parameters ──────────────────────────────────
        run.log_params(cfg)?;

        // ── Step 4: Nested cross-validation (Layer 5) ─────────────────────────
        let trainer = ChurnTrainer::new(cfg.threshold);
        let cv = NestedCrossValidation::new(cfg.outer_folds, cfg.inner_folds, cfg.seed);
        let report = cv.run(&trainer, &records, &cfg.grid)?;

        // ── Step 5: Log the outer estimate ────────────────────────────────────
        if let (Some(mean), Some(std)) = (report.mean_outer_score, report.std_outer_score) {
            run.log_metric("outer_f1_mean", mean, 0)?;
            run.log_metric("outer_f1_std", std, 0)?;
        }
        if let Some(mean_report) = &report.mean_outer_report {
            run.log_metric("outer_accuracy_mean", mean_report.accuracy, 0)?;
            run.log_metric("outer_log_loss_mean", mean_report.log_loss, 0)?;
        }
        for fold in &report.outer_folds {
            if let Some(outer) = &fold.outer_report {
                run.log_metric("outer_f1", outer.f1, fold.fold)?;
            }
        }
        run.log_json("cv_report.json", &report)?;

        // ── Step 6: Final selection + full fit ────────────────────────────────
        // One more grid search, this time over every record, picks
        // the configuration the shipped model is fitted with
        let (final_trials, selected) = cv.select_final_config(&trainer, &records, &cfg.grid)?;
        run.log_json("final_selection.json", &final_trials)?;
        let selected = selected.ok_or_else(|| {
            anyhow::anyhow!("every configuration failed the final grid search")
        })?;
        tracing::info!("Final configuration: grid index {}", selected);

        let fit_seed = cv.final_fit_seed(selected);
        let trained = trainer.fit_full(&cfg.grid[selected], &records, fit_seed)?;
        for (epoch, loss) in trained.loss_curve.iter().enumerate() {
            run.log_metric("final_train_loss", *loss, epoch + 1)?;
        }

        // ── Step 7: Save artifacts into the run ───────────────────────────────
        // Weights, architecture config and encoder side by side —
        // the directory is served as one unit
        let artifacts = run.artifacts_dir();
        let checkpoint = ModelCheckpoint::new(&artifacts);
        checkpoint.save_model(&trained.model)?;
        checkpoint.save_config(&FinalModelConfig {
            input_dim:       trained.encoder.feature_width(),
            hyperparameters: cfg.grid[selected].clone(),
            threshold:       cfg.threshold,
            seed:            fit_seed,
            trained_at:      Utc::now(),
        })?;
        EncoderStore::new(&artifacts).save(&trained.encoder)?;

        // ── Step 8: Register and promote ──────────────────────────────────────
        let registry = ModelRegistry::new(&cfg.store_dir);
        let version = registry.register_version(&cfg.model_name, run.run_id(), &artifacts)?;
        registry.promote(&cfg.model_name, version, PRODUCTION_ALIAS)?;
        tracing::info!(
            "Model '{}' version {} promoted to production",
            cfg.model_name,
            version,
        );

        Ok(())
    }
}
