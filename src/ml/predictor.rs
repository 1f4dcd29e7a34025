// ============================================================
// Layer 5 — Predictor
// ============================================================
use anyhow::Result;
use burn::prelude::*;
use std::path::Path;

use crate::data::encoder::FeatureEncoder;
use crate::domain::customer::CustomerRecord;
use crate::domain::errors::ChurnError;
use crate::infra::checkpoint::ModelCheckpoint;
use crate::infra::encoder_store::EncoderStore;
use crate::ml::model::ChurnNet;

type InferBackend = burn::backend::NdArray;

/// One scored customer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChurnPrediction {
    /// Sigmoid output, in [0, 1]
    pub probability: f64,

    /// probability > threshold
    pub churned: bool,
}

#[derive(Debug)]
pub struct ChurnPredictor {
    model:     ChurnNet<InferBackend>,
    encoder:   FeatureEncoder,
    threshold: f64,
    device:    burn::backend::ndarray::NdArrayDevice,
}

impl ChurnPredictor {
    /// Rebuild the served model from one artifact directory
    /// (weights, model config and encoder side by side).
    ///
    /// Any missing or unreadable piece surfaces as
    /// ChurnError::ModelUnavailable — to a caller it makes no
    /// difference WHICH file of an artifact set is broken.
    pub fn from_artifacts(dir: &Path) -> Result<Self> {
        let device     = burn::backend::ndarray::NdArrayDevice::default();
        let checkpoint = ModelCheckpoint::new(dir);

        let (model, cfg) = checkpoint
            .load_for_inference::<InferBackend>(&device)
            .map_err(|e| ChurnError::ModelUnavailable(format!("{e:#}")))?;
        let encoder = EncoderStore::new(dir)
            .load()
            .map_err(|e| ChurnError::ModelUnavailable(format!("{e:#}")))?;

        tracing::info!("Model loaded from '{}'", dir.display());
        Ok(Self { model, encoder, threshold: cfg.threshold, device })
    }

    /// Assemble a predictor from already-loaded parts.
    pub fn from_parts(
        model:     ChurnNet<InferBackend>,
        encoder:   FeatureEncoder,
        threshold: f64,
    ) -> Self {
        let device = burn::backend::ndarray::NdArrayDevice::default();
        Self { model, encoder, threshold, device }
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Score one customer.
    ///
    /// Stateless: the same record always produces the same
    /// probability. Validation and encoding errors come back as
    /// typed ChurnErrors; the forward pass itself cannot fail.
    pub fn predict(&self, record: &CustomerRecord) -> Result<ChurnPrediction, ChurnError> {
        let features = self.encoder.transform(record)?;

        let input = Tensor::<InferBackend, 1>::from_floats(features.as_slice(), &self.device)
            .reshape([1, features.len()]);
        let probability = burn::tensor::activation::sigmoid(self.model.forward(input))
            .into_scalar()
            .elem::<f64>();

        // strict >, so a probability exactly at the threshold reads "No"
        let churned = probability > self.threshold;

        tracing::debug!(
            "p(churn)={:.4} threshold={} churned={}",
            probability, self.threshold, churned,
        );
        Ok(ChurnPrediction { probability, churned })
    }
}
