// ============================================================
// Layer 6 — Model Checkpoint
// ============================================================
// Saves and restores the final model using Burn's CompactRecorder.
//
// What gets saved per artifact directory:
//   1. Model weights (.mpk.gz file) — all learned parameters
//   2. model_config.json            — architecture + threshold
//
// Why save the config separately?
//   When loading for inference, we need the exact architecture
//   (input width, hidden layer sizes) to rebuild the model before
//   the weights can be loaded into it. The config also carries
//   the decision threshold and the seed the fit ran under, so a
//   served model is fully described by its own directory.
//
// Burn's CompactRecorder:
//   - Serialises model parameters to MessagePack format
//   - Compresses with gzip for smaller file size
//   - Type-safe: loading fails if architecture doesn't match
//
// File naming convention:
//   <artifact dir>/
//     model.mpk.gz        ← weights of the full-dataset fit
//     model_config.json   ← architecture, threshold, provenance
//     encoder.json        ← written next door by EncoderStore
//
// Reference: Burn Book §5 (Records and Checkpointing)
//            Rust Book §9 (Error Handling)

use anyhow::{Context, Result};
use burn::{
    prelude::*,
    record::{CompactRecorder, Recorder},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::{fs, path::PathBuf};

use crate::domain::trial::HyperparameterConfig;
use crate::ml::model::{ChurnNet, ChurnNetConfig};

/// Everything needed to rebuild and serve the saved model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FinalModelConfig {
    /// Width of the encoder's output vectors
    pub input_dim: usize,

    /// The grid config the final fit ran under
    pub hyperparameters: HyperparameterConfig,

    /// Decision threshold: predict churn iff probability > threshold
    pub threshold: f64,

    /// Seed of the full-dataset fit
    pub seed: u64,

    /// When the fit finished (UTC)
    pub trained_at: DateTime<Utc>,
}

/// Manages saving and loading of the final model artifact pair.
/// All files are stored in the configured directory.
pub struct ModelCheckpoint {
    /// Path to the artifact directory
    dir: PathBuf,
}

impl ModelCheckpoint {
    /// Create a new ModelCheckpoint.
    /// Creates the directory if it doesn't already exist.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        let dir = dir.into();
        // create_dir_all creates parent directories too, like `mkdir -p`
        // .ok() ignores the error if the directory already exists
        fs::create_dir_all(&dir).ok();
        Self { dir }
    }

    /// Save model weights.
    ///
    /// Uses Burn's CompactRecorder which:
    ///   1. Calls model.into_record() to extract all parameters
    ///   2. Serialises to MessagePack binary format
    ///   3. Compresses with gzip
    ///   4. Writes to {dir}/model.mpk.gz
    pub fn save_model<B: Backend>(&self, model: &ChurnNet<B>) -> Result<()> {
        // Build the file path (without extension — recorder adds it)
        let path = self.dir.join("model");

        CompactRecorder::new()
            .record(model.clone().into_record(), path.clone())
            .with_context(|| format!("Failed to save model to '{}'", path.display()))?;

        tracing::debug!("Saved model weights to '{}'", path.display());
        Ok(())
    }

    /// Load model weights into a freshly built model.
    ///
    /// The model parameter must have the correct architecture
    /// (matching the saved record) or loading will fail.
    pub fn load_model<B: Backend>(
        &self,
        model:  ChurnNet<B>,
        device: &B::Device,
    ) -> Result<ChurnNet<B>> {
        let path = self.dir.join("model");

        let record = CompactRecorder::new()
            .load(path.clone(), device)
            .with_context(|| {
                format!(
                    "Cannot load model from '{}'. Have you trained the model first?",
                    path.display()
                )
            })?;

        // load_record() returns a new model with the loaded weights
        Ok(model.load_record(record))
    }

    /// Rebuild the saved model for inference: read the config, build
    /// the architecture with dropout forced to 0.0, load the weights.
    pub fn load_for_inference<B: Backend>(
        &self,
        device: &B::Device,
    ) -> Result<(ChurnNet<B>, FinalModelConfig)> {
        let cfg = self.load_config()?;
        let model_cfg = ChurnNetConfig::new(
            cfg.input_dim,
            cfg.hyperparameters.hidden_units.clone(),
            0.0,
        );
        let model = self.load_model(model_cfg.init(device), device)?;
        Ok((model, cfg))
    }

    /// Save the final model configuration to JSON.
    ///
    /// This must be written alongside the weights so a later process
    /// can reconstruct the exact architecture before loading them.
    pub fn save_config(&self, cfg: &FinalModelConfig) -> Result<()> {
        let path = self.dir.join("model_config.json");

        // serde_json::to_string_pretty adds indentation for readability
        let json = serde_json::to_string_pretty(cfg)?;

        fs::write(&path, json)
            .with_context(|| format!("Cannot write model config to '{}'", path.display()))?;

        tracing::debug!("Saved model config to '{}'", path.display());
        Ok(())
    }

    /// Load the final model configuration from JSON.
    pub fn load_config(&self) -> Result<FinalModelConfig> {
        let path = self.dir.join("model_config.json");

        let json = fs::read_to_string(&path)
            .with_context(|| {
                format!(
                    "Cannot read model config from '{}'. \
                     Make sure you have run 'train' before 'predict'.",
                    path.display()
                )
            })?;

        Ok(serde_json::from_str(&json)?)
    }
}
