// ============================================================
// Layer 4 — Data Pipeline
// ============================================================
// This layer handles everything from the raw churn CSV
// all the way to backend-ready tensor batches.
//
// The pipeline flows in this order:
//
//   churn .csv file
//       │
//       ▼
//   CsvRecordSource   → reads rows, parses customer records
//       │
//       ▼
//   stratified_k_fold → assigns records to cross-validation folds
//       │
//       ▼
//   FeatureEncoder    → fits vocabularies + scaling, emits f32 vectors
//       │
//       ▼
//   ChurnDataset      → implements Burn's Dataset trait
//       │
//       ▼
//   ChurnBatcher      → stacks samples into tensor batches
//       │
//       ▼
//   DataLoader        → feeds batches to the training loop
//
// Each module is responsible for exactly one step.
// This makes each step independently testable and replaceable.
//
// Reference: Burn Book §4 (Datasets and Dataloaders)
//            Rust Book §13 (Iterators and Closures)

/// Loads customer records from a CSV file using the csv crate
pub mod loader;

/// Fits categorical vocabularies and numeric scaling, encodes records
pub mod encoder;

/// Stratified fold assignment and train/test partitioning
pub mod splitter;

/// Implements Burn's Dataset trait for encoded churn samples
pub mod dataset;

/// Implements Burn's Batcher trait to create tensor batches
pub mod batcher;
