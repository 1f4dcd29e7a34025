// ============================================================
// Layer 4 — Churn Batcher
// ============================================================
// Implements Burn's Batcher trait to convert a Vec<ChurnSample>
// into tensors for the model forward pass.
//
// How batching works here:
//   Input:  Vec of N ChurnSamples, each with FEATURE_WIDTH floats
//   Output: ChurnBatch with a [N, FEATURE_WIDTH] feature tensor
//           and a [N] integer target tensor
//
//   We flatten all feature vectors into one long Vec, then reshape:
//   [s1_f1, ..., s1_fW, s2_f1, ..., sN_fW] → [N, W]
//
// Every sample has the same width because the feature encoder
// always emits FEATURE_WIDTH columns, so no padding is needed.
//
// Reference: Burn Book §4 (Batcher)
//            Rust Book §8 (Vectors)

use burn::{data::dataloader::batcher::Batcher, prelude::*};

use crate::data::{dataset::ChurnSample, encoder::FEATURE_WIDTH};

// ─── ChurnBatch ───────────────────────────────────────────────────────────────
/// A batch of encoded samples ready for the model.
///
/// B is the Burn Backend (e.g. NdArray, Autodiff<NdArray>) —
/// generic so the same batcher works for training and validation.
#[derive(Debug, Clone)]
pub struct ChurnBatch<B: Backend> {
    /// Encoded features — shape: [batch_size, FEATURE_WIDTH]
    pub features: Tensor<B, 2>,

    /// Churn labels — shape: [batch_size], 1 = churned
    pub targets: Tensor<B, 1, Int>,
}

// ─── ChurnBatcher ─────────────────────────────────────────────────────────────
/// Holds the target device so tensors are created in the right place.
#[derive(Clone, Debug)]
pub struct ChurnBatcher<B: Backend> {
    pub device: B::Device,
}

impl<B: Backend> ChurnBatcher<B> {
    pub fn new(device: B::Device) -> Self {
        Self { device }
    }
}

impl<B: Backend> Batcher<ChurnSample, ChurnBatch<B>> for ChurnBatcher<B> {
    fn batch(&self, items: Vec<ChurnSample>) -> ChurnBatch<B> {
        let batch_size = items.len();
        // Every sample has the same width (encoder output is fixed)
        let width = items.first().map_or(FEATURE_WIDTH, |s| s.features.len());

        let features_flat: Vec<f32> = items
            .iter()
            .flat_map(|s| s.features.iter().copied())
            .collect();

        let labels: Vec<i32> = items.iter().map(|s| s.label).collect();

        let features = Tensor::<B, 1>::from_floats(features_flat.as_slice(), &self.device)
            .reshape([batch_size, width]);

        let targets = Tensor::<B, 1, Int>::from_ints(labels.as_slice(), &self.device);

        ChurnBatch { features, targets }
    }
}
