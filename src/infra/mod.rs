// ============================================================
// Layer 6 — Infrastructure Layer
// ============================================================
// Handles all cross-cutting concerns that don't belong in
// any specific business layer:
//
//   checkpoint.rs    — Saving and loading model weights
//                      Uses Burn's CompactRecorder to serialise
//                      model parameters to disk. Also saves and
//                      loads the final model config JSON so
//                      inference can rebuild the architecture.
//
//   encoder_store.rs — Feature encoder persistence
//                      Writes the fitted vocabularies and
//                      scaling parameters as JSON so serving
//                      encodes exactly like training did.
//
//   tracking.rs      — Experiment run store
//                      One directory per training run holding
//                      params, metrics and artifacts.
//
//   registry.rs      — Model registry
//                      Versioned models with aliases; the
//                      "production" alias is the serving pointer.
//
// Why is this a separate layer?
//   These concerns are used by multiple other layers but
//   don't belong to any one of them. Keeping them here:
//   - Prevents duplication across layers
//   - Makes it easy to swap implementations
//     (e.g. swap the file store for a tracking server)
//   - Keeps other layers focused on their core logic
//
// Reference: Rust Book §7 (Modules)
//            Rust Book §9 (Error Handling with anyhow)
//            Burn Book §5 (Checkpointing)

/// Model checkpoint saving and loading
pub mod checkpoint;

/// Fitted feature encoder persistence
pub mod encoder_store;

/// Filesystem experiment run store
pub mod tracking;

/// Versioned model registry with aliases
pub mod registry;
