// ============================================================
// Layer 6 — Encoder Store
// ============================================================
// Persists the fitted FeatureEncoder as JSON in the artifact
// directory. The encoder IS part of the model artifact: serving
// weights with a differently fitted encoder silently scrambles
// every categorical index, so the pair always travels together.
//
// Reference: Rust Book §12 (Working with Files)

use anyhow::{Context, Result};
use std::{fs, path::PathBuf};

use crate::data::encoder::FeatureEncoder;

pub struct EncoderStore {
    dir: PathBuf,
}

impl EncoderStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Write the fitted encoder to {dir}/encoder.json
    pub fn save(&self, encoder: &FeatureEncoder) -> Result<()> {
        fs::create_dir_all(&self.dir).ok();

        let path = self.dir.join("encoder.json");
        let json = serde_json::to_string_pretty(encoder)?;
        fs::write(&path, json)
            .with_context(|| format!("Cannot write encoder to '{}'", path.display()))?;

        tracing::debug!("Saved feature encoder to '{}'", path.display());
        Ok(())
    }

    /// Load a previously fitted encoder from {dir}/encoder.json
    pub fn load(&self) -> Result<FeatureEncoder> {
        let path = self.dir.join("encoder.json");
        let json = fs::read_to_string(&path).with_context(|| {
            format!(
                "Cannot read encoder from '{}'. Have you trained the model first?",
                path.display()
            )
        })?;
        Ok(serde_json::from_str(&json)?)
    }
}
