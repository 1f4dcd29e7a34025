// ============================================================
// Layer 5 — Trial Trainer
// ============================================================
// Trains one MLP per trial using Burn's DataLoader and Adam,
// then scores it on a held-out partition. This is the concrete
// ModelTrainer the cross-validation driver schedules through.
//
// Key Burn insight:
//   - Training uses MyBackend (Autodiff<NdArray>) for gradients
//   - model.valid() returns model on MyInnerBackend (NdArray)
//   - Scoring runs on MyInnerBackend, where dropout is inactive
//   - MyBackend::seed + a seeded DataLoader shuffle make a trial
//     a pure function of (records, config, seed)
//
// Reference: Burn Book §5, Kingma & Ba (2015) Adam

use anyhow::Result;
use burn::{
    data::dataloader::DataLoaderBuilder,
    module::AutodiffModule,
    optim::{AdamConfig, GradientsParams, Optimizer},
    prelude::*,
};

use crate::data::{batcher::ChurnBatcher, dataset::ChurnDataset, encoder::FeatureEncoder};
use crate::domain::customer::CustomerRecord;
use crate::domain::errors::ChurnError;
use crate::domain::evaluation::ClassificationReport;
use crate::domain::traits::ModelTrainer;
use crate::domain::trial::{HyperparameterConfig, TrialOutcome};
use crate::ml::model::{ChurnNet, ChurnNetConfig};

pub type MyBackend      = burn::backend::Autodiff<burn::backend::NdArray>;
pub type MyInnerBackend = burn::backend::NdArray;

// The NdArray backend keeps ONE process-global RNG stream, so tests
// that build or train models take this lock; otherwise the parallel
// test runner can interleave draws into a seeded run.
#[cfg(test)]
pub(crate) static BACKEND_RNG_LOCK: std::sync::Mutex<()> = std::sync::Mutex::new(());

/// Everything the final full-dataset fit hands to the caller:
/// an inference-ready model plus the encoder it was fitted with.
pub struct TrainedChurnModel {
    pub model:      ChurnNet<MyInnerBackend>,
    pub encoder:    FeatureEncoder,
    pub loss_curve: Vec<f64>,
}

/// Burn-backed trial trainer.
pub struct ChurnTrainer {
    /// Decision threshold used when a partition is scored
    threshold: f64,
}

impl ChurnTrainer {
    pub fn new(threshold: f64) -> Self {
        Self { threshold }
    }

    /// Fit the winning configuration once on the full dataset.
    /// The encoder is fitted on the same records at the same time,
    /// so the shipped artifact pair is always consistent.
    pub fn fit_full(
        &self,
        config:  &HyperparameterConfig,
        records: &[CustomerRecord],
        seed:    u64,
    ) -> Result<TrainedChurnModel> {
        let encoder = FeatureEncoder::fit(records)?;
        let (model, loss_curve) = self.train_model(config, &encoder, records, seed)?;
        Ok(TrainedChurnModel { model: model.valid(), encoder, loss_curve })
    }

    /// The shared training loop behind both trial and final fits.
    fn train_model(
        &self,
        config:  &HyperparameterConfig,
        encoder: &FeatureEncoder,
        records: &[CustomerRecord],
        seed:    u64,
    ) -> Result<(ChurnNet<MyBackend>, Vec<f64>)> {
        let device = burn::backend::ndarray::NdArrayDevice::default();

        // Weight initialisation draws from the backend RNG, so the
        // seed must be set before the model is built
        MyBackend::seed(seed);

        // ── Build model ───────────────────────────────────────────────────────
        let model_cfg = ChurnNetConfig::new(
            encoder.feature_width(),
            config.hidden_units.clone(),
            config.dropout,
        );
        let mut model: ChurnNet<MyBackend> = model_cfg.init(&device);

        // ── Adam optimiser ────────────────────────────────────────────────────
        // m = β1*m + (1-β1)*g        (mean)
        // v = β2*v + (1-β2)*g²       (variance)
        // θ = θ - lr * m / (√v + ε)  (update)
        let optim_cfg = AdamConfig::new().with_epsilon(1e-8);
        let mut optim = optim_cfg.init();

        // ── Training data loader (AutodiffBackend) ────────────────────────────
        let dataset = ChurnDataset::from_records(encoder, records)?;
        let batcher = ChurnBatcher::<MyBackend>::new(device);
        let loader  = DataLoaderBuilder::new(batcher)
            .batch_size(config.batch_size)
            .shuffle(seed)
            .num_workers(1)
            .build(dataset);

        // ── Epoch loop ────────────────────────────────────────────────────────
        let mut loss_curve = Vec::with_capacity(config.epochs);

        for epoch in 1..=config.epochs {
            let mut loss_sum = 0.0f64;
            let mut batches  = 0usize;

            for batch in loader.iter() {
                let (loss, _) = model.forward_loss(batch.features, batch.targets);

                let loss_val: f64 = loss.clone().into_scalar().elem::<f64>();
                if !loss_val.is_finite() {
                    // A NaN here would silently poison every mean
                    // downstream, so the trial aborts instead
                    return Err(ChurnError::TrainingTrialFailure(format!(
                        "non-finite training loss at epoch {epoch}"
                    ))
                    .into());
                }
                loss_sum += loss_val;
                batches  += 1;

                // Backward pass + Adam update
                let grads = loss.backward();
                let grads = GradientsParams::from_grads(grads, &model);
                model = optim.step(config.learning_rate, model, grads);
            }

            let avg_loss = loss_sum / batches as f64;
            loss_curve.push(avg_loss);
            tracing::debug!("Epoch {:>3}/{} | train_loss={:.4}", epoch, config.epochs, avg_loss);
        }

        Ok((model, loss_curve))
    }

    /// Run the model over `records` and build a classification report
    /// against their churn labels.
    fn score_partition(
        &self,
        model:   &ChurnNet<MyInnerBackend>,
        encoder: &FeatureEncoder,
        records: &[CustomerRecord],
    ) -> Result<ClassificationReport> {
        let device = burn::backend::ndarray::NdArrayDevice::default();

        let mut labels = Vec::with_capacity(records.len());
        for record in records {
            labels.push(record.churn.ok_or_else(|| {
                ChurnError::InvalidRecord("cannot score an unlabelled record".to_string())
            })?);
        }

        let rows = encoder.transform_all(records)?;
        let flat: Vec<f32> = rows.iter().flat_map(|r| r.iter().copied()).collect();
        let features = Tensor::<MyInnerBackend, 1>::from_floats(flat.as_slice(), &device)
            .reshape([records.len(), encoder.feature_width()]);

        let logits = model.forward(features);
        let probabilities: Vec<f64> = burn::tensor::activation::sigmoid(logits)
            .into_data()
            .to_vec::<f32>()
            .map_err(|e| anyhow::anyhow!("reading probabilities off the backend: {e:?}"))?
            .into_iter()
            .map(f64::from)
            .collect();

        Ok(ClassificationReport::from_probabilities(
            &probabilities,
            &labels,
            self.threshold,
        ))
    }
}

impl ModelTrainer for ChurnTrainer {
    /// One complete trial: fit the encoder on `train` only, train a
    /// model under `config`, score it on `eval`.
    fn train_and_score(
        &self,
        config: &HyperparameterConfig,
        train:  &[CustomerRecord],
        eval:   &[CustomerRecord],
        seed:   u64,
    ) -> Result<TrialOutcome> {
        // The encoder sees the training partition and nothing else —
        // eval stays unobserved until scoring
        let encoder = FeatureEncoder::fit(train)?;

        let (model, loss_curve) = self.train_model(config, &encoder, train, seed)?;

        // model.valid() → ChurnNet<MyInnerBackend>, dropout inactive
        let report = self.score_partition(&model.valid(), &encoder, eval)?;

        Ok(TrialOutcome { report, loss_curve })
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    fn labelled(tenure: i64, contract: &str, monthly: f64, churned: bool) -> CustomerRecord {
        CustomerRecord::new(
            tenure,
            "Yes",
            contract,
            "Yes",
            "Electronic check",
            monthly,
            monthly * tenure as f64,
        )
        .with_churn(churned)
    }

    /// A small separable set: churners have short tenure and high
    /// monthly charges, stayers the opposite.
    fn toy_records() -> Vec<CustomerRecord> {
        let mut records = Vec::new();
        for i in 0..12i64 {
            records.push(labelled(2 + i % 3, "Month-to-month", 95.0 + i as f64, true));
            records.push(labelled(60 + i % 5, "Two year", 25.0 + i as f64, false));
        }
        records
    }

    fn tiny_config() -> HyperparameterConfig {
        HyperparameterConfig {
            hidden_units:  vec![8],
            dropout:       0.0,
            learning_rate: 1e-2,
            batch_size:    8,
            epochs:        3,
        }
    }

    #[test]
    fn test_trial_produces_report_and_loss_curve() {
        let _lock = BACKEND_RNG_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        let records = toy_records();
        let trainer = ChurnTrainer::new(0.5);

        let outcome = trainer
            .train_and_score(&tiny_config(), &records, &records, 7)
            .unwrap();

        // one loss entry per epoch, all finite
        assert_eq!(outcome.loss_curve.len(), 3);
        assert!(outcome.loss_curve.iter().all(|l| l.is_finite()));
        assert!(outcome.report.accuracy >= 0.0 && outcome.report.accuracy <= 1.0);
        assert!(outcome.report.f1 >= 0.0 && outcome.report.f1 <= 1.0);
    }

    #[test]
    fn test_same_seed_reproduces_trial() {
        let _lock = BACKEND_RNG_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        let records = toy_records();
        let trainer = ChurnTrainer::new(0.5);
        let config  = tiny_config();

        let a = trainer.train_and_score(&config, &records, &records, 11).unwrap();
        let b = trainer.train_and_score(&config, &records, &records, 11).unwrap();

        assert_eq!(a.loss_curve, b.loss_curve);
        assert_eq!(a.report, b.report);
    }

    #[test]
    fn test_eval_partition_never_reaches_the_fit() {
        let _lock = BACKEND_RNG_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        let records = toy_records();
        let (train, eval) = records.split_at(16);
        let trainer = ChurnTrainer::new(0.5);
        let config  = tiny_config();

        // Same training partition, same seed, wildly different
        // held-out rows. The loss curve is a function of what the
        // encoder and the epoch loop saw, so it must not move.
        let mut wild = eval.to_vec();
        for record in &mut wild {
            record.tenure          = 500;
            record.monthly_charges = 5000.0;
            record.total_charges   = 2_500_000.0;
        }

        let a = trainer.train_and_score(&config, train, eval, 11).unwrap();
        let b = trainer.train_and_score(&config, train, &wild, 11).unwrap();

        assert_eq!(a.loss_curve, b.loss_curve);
    }

    #[test]
    fn test_fit_full_returns_consistent_artifacts() {
        let _lock = BACKEND_RNG_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        let records = toy_records();
        let trainer = ChurnTrainer::new(0.5);

        let trained = trainer.fit_full(&tiny_config(), &records, 5).unwrap();

        assert_eq!(trained.loss_curve.len(), 3);
        assert_eq!(trained.encoder.feature_width(), 7);
        // the encoder was fitted on the same records the model saw,
        // so every record must transform cleanly
        assert!(trained.encoder.transform_all(&records).is_ok());
    }

    #[test]
    fn test_unlabelled_eval_record_is_rejected() {
        let _lock = BACKEND_RNG_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        let records = toy_records();
        let mut eval = records.clone();
        eval[0].churn = None;

        let trainer = ChurnTrainer::new(0.5);
        let result  = trainer.train_and_score(&tiny_config(), &records, &eval, 3);
        assert!(result.is_err());
    }
}
