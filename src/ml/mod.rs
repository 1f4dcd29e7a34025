// ============================================================
// Layer 5 — ML / Model Layer (Burn)
// ============================================================
// This layer contains ALL Burn framework specific code.
// No other layer imports from burn directly — only this one
// (the data layer's dataset/batcher bridge excepted).
//
// Why isolate Burn code here?
//   - If Burn's API changes, we only update this layer
//   - The selection procedure is testable without tensors
//   - The model architecture is clearly separated from
//     data loading and application logic
//
// What's in this layer:
//
//   model.rs            — The MLP architecture
//                         Configurable hidden stack with:
//                         • Linear layers (ReLU activation)
//                         • Dropout after every hidden layer
//                         • Single-logit churn head
//
//   trainer.rs          — Trial training
//                         Fits the encoder on the training
//                         partition, runs the epoch loop, and
//                         scores the held-out partition
//
//   cross_validation.rs — Nested model selection
//                         Outer folds estimate, inner folds
//                         select; drives trainers through the
//                         ModelTrainer trait only
//
//   predictor.rs        — The serving engine
//                         Loads saved artifacts, encodes one
//                         customer, outputs probability + label
//
// Reference: Burn Book §3 (Building Blocks)
//            Burn Book §5 (Training)
//            Rumelhart et al. (1986) Backpropagation
//            Cawley & Talbot (2010) On Over-fitting in
//            Model Selection

/// Feed-forward churn model architecture
pub mod model;

/// Per-trial training loop with partition scoring
pub mod trainer;

/// Nested cross-validation driver and final selection
pub mod cross_validation;

/// Serving engine — loads artifacts and scores customers
pub mod predictor;
