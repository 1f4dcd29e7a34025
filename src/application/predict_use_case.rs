// ============================================================
// Layer 2 — PredictUseCase
// ============================================================
// Serves churn predictions from whatever the registry's
// "production" alias points at:
//   1. Resolve the alias to a registered model version
//   2. Load weights, config and encoder from its artifact dir
//   3. Score requests one at a time, echoing customer_id back
//
// Loading happens once in new(); predict() itself touches no
// files, so a caller can hold one use case and score many
// requests against the same model version.

use anyhow::Result;

use crate::application::dto::{PredictionRequest, PredictionResponse};
use crate::domain::customer::CustomerRecord;
use crate::domain::errors::ChurnError;
use crate::infra::registry::{ModelRegistry, PRODUCTION_ALIAS};
use crate::ml::predictor::ChurnPredictor;

#[derive(Debug)]
pub struct PredictUseCase {
    predictor: ChurnPredictor,
}

impl PredictUseCase {
    /// Resolve the production model and load it for inference.
    pub fn new(store_dir: &str, model_name: &str) -> Result<Self> {
        let registry  = ModelRegistry::new(store_dir);
        let version   = registry.resolve(model_name, PRODUCTION_ALIAS)?;
        let predictor = ChurnPredictor::from_artifacts(&version.artifact_dir)?;

        tracing::info!(
            "Serving '{}' version {} (from {})",
            model_name,
            version.version,
            version.run_id,
        );
        Ok(Self { predictor })
    }

    /// Score one customer and translate the verdict into the
    /// Yes/No wire form.
    pub fn predict(&self, request: PredictionRequest) -> Result<PredictionResponse, ChurnError> {
        let customer_id = request.customer_id.clone();
        let record      = CustomerRecord::from(request);
        let prediction  = self.predictor.predict(&record)?;

        Ok(PredictionResponse {
            churn_probability: prediction.probability,
            churn_prediction:  if prediction.churned { "Yes" } else { "No" }.to_string(),
            customer_id,
        })
    }
}
