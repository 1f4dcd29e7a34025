// ============================================================
// Layer 6 — Model Registry
// ============================================================
// A single registry.json at the store root records every
// registered model version and which version each alias points
// at. The "production" alias is the serving pointer: promotion
// is a registry edit, not a file move, so rolling back a bad
// model is just pointing the alias at an older version.
//
// What registry.json looks like:
//   {
//     "models": {
//       "churn_model": {
//         "versions": [
//           { "version": 1, "run_id": "run-0001",
//             "artifact_dir": ".../run-0001/artifacts",
//             "created_at": "..." }
//         ],
//         "aliases": { "production": 1 }
//       }
//     }
//   }
//
// Every lookup failure (no registry, unknown model, unknown
// alias, dangling version, missing artifact directory) resolves
// to ChurnError::ModelUnavailable so callers get one typed
// "nothing to serve" condition.
//
// Reference: Rust Book §12 (Working with Files)
//            Rust Book §9 (Error Handling)

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::{
    collections::BTreeMap,
    fs,
    path::{Path, PathBuf},
};

use crate::domain::errors::ChurnError;

/// The alias served by the prediction service
pub const PRODUCTION_ALIAS: &str = "production";

/// One registered, immutable model version.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelVersion {
    pub version:      u32,
    pub run_id:       String,
    pub artifact_dir: PathBuf,
    pub created_at:   DateTime<Utc>,
}

/// What `model_info` reports about one model name.
#[derive(Debug, Clone, Serialize)]
pub struct ModelInfo {
    pub name:               String,
    pub production_version: Option<u32>,
    pub run_id:             Option<String>,
    pub created_at:         Option<DateTime<Utc>>,
    pub total_versions:     usize,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct ModelEntry {
    versions: Vec<ModelVersion>,
    aliases:  BTreeMap<String, u32>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct RegistryFile {
    models: BTreeMap<String, ModelEntry>,
}

pub struct ModelRegistry {
    path: PathBuf,
}

impl ModelRegistry {
    pub fn new(store_root: impl Into<PathBuf>) -> Self {
        Self { path: store_root.into().join("registry.json") }
    }

    /// Record a new version of `name` and return its number.
    /// Versions count up from 1 per model name.
    pub fn register_version(
        &self,
        name:         &str,
        run_id:       &str,
        artifact_dir: &Path,
    ) -> Result<u32> {
        let mut registry = self.load_or_default()?;
        let entry = registry.models.entry(name.to_string()).or_default();

        let version = entry.versions.iter().map(|v| v.version).max().unwrap_or(0) + 1;
        entry.versions.push(ModelVersion {
            version,
            run_id:       run_id.to_string(),
            artifact_dir: artifact_dir.to_path_buf(),
            created_at:   Utc::now(),
        });

        self.save(&registry)?;
        tracing::info!("Registered '{}' version {} from {}", name, version, run_id);
        Ok(version)
    }

    /// Point `alias` of `name` at an existing version.
    pub fn promote(&self, name: &str, version: u32, alias: &str) -> Result<()> {
        let mut registry = self.load_or_default()?;
        let entry = registry.models.get_mut(name).ok_or_else(|| {
            ChurnError::ModelUnavailable(format!("no model '{name}' in the registry"))
        })?;

        if !entry.versions.iter().any(|v| v.version == version) {
            return Err(ChurnError::ModelUnavailable(format!(
                "model '{name}' has no version {version}"
            ))
            .into());
        }
        entry.aliases.insert(alias.to_string(), version);

        self.save(&registry)?;
        tracing::info!("Promoted '{}' version {} to '{}'", name, version, alias);
        Ok(())
    }

    /// Follow `name`/`alias` to a servable version. The returned
    /// artifact_dir is canonicalised, which also proves it exists.
    pub fn resolve(&self, name: &str, alias: &str) -> Result<ModelVersion> {
        let registry = self.load_or_default()?;
        let entry = registry.models.get(name).ok_or_else(|| {
            ChurnError::ModelUnavailable(format!("no model '{name}' in the registry"))
        })?;

        let version = *entry.aliases.get(alias).ok_or_else(|| {
            ChurnError::ModelUnavailable(format!("model '{name}' has no '{alias}' alias"))
        })?;

        let mut resolved = entry
            .versions
            .iter()
            .find(|v| v.version == version)
            .ok_or_else(|| {
                ChurnError::ModelUnavailable(format!(
                    "alias '{alias}' of '{name}' points at missing version {version}"
                ))
            })?
            .clone();

        resolved.artifact_dir = fs::canonicalize(&resolved.artifact_dir).map_err(|_| {
            ChurnError::ModelUnavailable(format!(
                "artifact directory '{}' is gone",
                resolved.artifact_dir.display()
            ))
        })?;

        Ok(resolved)
    }

    /// Summary of one model name for the info command.
    pub fn model_info(&self, name: &str) -> Result<ModelInfo> {
        let registry = self.load_or_default()?;
        let entry = registry.models.get(name).ok_or_else(|| {
            ChurnError::ModelUnavailable(format!("no model '{name}' in the registry"))
        })?;

        let production = entry
            .aliases
            .get(PRODUCTION_ALIAS)
            .and_then(|v| entry.versions.iter().find(|version| version.version == *v));

        Ok(ModelInfo {
            name:               name.to_string(),
            production_version: production.map(|v| v.version),
            run_id:             production.map(|v| v.run_id.clone()),
            created_at:         production.map(|v| v.created_at),
            total_versions:     entry.versions.len(),
        })
    }

    /// Missing file reads as an empty registry, so the first
    /// register_version call bootstraps the store.
    fn load_or_default(&self) -> Result<RegistryFile> {
        if !self.path.exists() {
            return Ok(RegistryFile::default());
        }
        let json = fs::read_to_string(&self.path)
            .with_context(|| format!("Cannot read '{}'", self.path.display()))?;
        Ok(serde_json::from_str(&json)?)
    }

    fn save(&self, registry: &RegistryFile) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).ok();
        }
        fs::write(&self.path, serde_json::to_string_pretty(registry)?)
            .with_context(|| format!("Cannot write '{}'", self.path.display()))?;
        Ok(())
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    fn is_unavailable(error: &anyhow::Error) -> bool {
        matches!(
            error.downcast_ref::<ChurnError>(),
            Some(ChurnError::ModelUnavailable(_))
        )
    }

    #[test]
    fn test_versions_count_up_from_one() {
        let tmp = tempfile::tempdir().unwrap();
        let registry = ModelRegistry::new(tmp.path());

        let v1 = registry.register_version("churn", "run-0001", tmp.path()).unwrap();
        let v2 = registry.register_version("churn", "run-0002", tmp.path()).unwrap();
        assert_eq!((v1, v2), (1, 2));
    }

    #[test]
    fn test_promote_and_resolve_roundtrip() {
        let tmp = tempfile::tempdir().unwrap();
        let artifacts = tmp.path().join("artifacts");
        fs::create_dir_all(&artifacts).unwrap();

        let registry = ModelRegistry::new(tmp.path());
        let version = registry.register_version("churn", "run-0001", &artifacts).unwrap();
        registry.promote("churn", version, PRODUCTION_ALIAS).unwrap();

        let resolved = registry.resolve("churn", PRODUCTION_ALIAS).unwrap();
        assert_eq!(resolved.version, 1);
        assert_eq!(resolved.run_id, "run-0001");
        assert!(resolved.artifact_dir.is_absolute());
    }

    #[test]
    fn test_resolving_empty_store_is_model_unavailable() {
        let tmp = tempfile::tempdir().unwrap();
        let registry = ModelRegistry::new(tmp.path());

        let error = registry.resolve("churn", PRODUCTION_ALIAS).unwrap_err();
        assert!(is_unavailable(&error));
    }

    #[test]
    fn test_resolving_unknown_alias_fails() {
        let tmp = tempfile::tempdir().unwrap();
        let registry = ModelRegistry::new(tmp.path());
        registry.register_version("churn", "run-0001", tmp.path()).unwrap();

        let error = registry.resolve("churn", PRODUCTION_ALIAS).unwrap_err();
        assert!(is_unavailable(&error));
    }

    #[test]
    fn test_promoting_missing_version_fails() {
        let tmp = tempfile::tempdir().unwrap();
        let registry = ModelRegistry::new(tmp.path());
        registry.register_version("churn", "run-0001", tmp.path()).unwrap();

        let error = registry.promote("churn", 9, PRODUCTION_ALIAS).unwrap_err();
        assert!(is_unavailable(&error));
    }

    #[test]
    fn test_resolve_with_deleted_artifacts_fails() {
        let tmp = tempfile::tempdir().unwrap();
        let artifacts = tmp.path().join("gone");
        fs::create_dir_all(&artifacts).unwrap();

        let registry = ModelRegistry::new(tmp.path());
        let version = registry.register_version("churn", "run-0001", &artifacts).unwrap();
        registry.promote("churn", version, PRODUCTION_ALIAS).unwrap();

        fs::remove_dir_all(&artifacts).unwrap();
        let error = registry.resolve("churn", PRODUCTION_ALIAS).unwrap_err();
        assert!(is_unavailable(&error));
    }

    #[test]
    fn test_model_info_reports_production_version() {
        let tmp = tempfile::tempdir().unwrap();
        let registry = ModelRegistry::new(tmp.path());

        registry.register_version("churn", "run-0001", tmp.path()).unwrap();
        registry.register_version("churn", "run-0002", tmp.path()).unwrap();

        // nothing promoted yet
        let info = registry.model_info("churn").unwrap();
        assert_eq!(info.total_versions, 2);
        assert!(info.production_version.is_none());

        registry.promote("churn", 2, PRODUCTION_ALIAS).unwrap();
        let info = registry.model_info("churn").unwrap();
        assert_eq!(info.production_version, Some(2));
        assert_eq!(info.run_id.as_deref(), Some("run-0002"));
    }
}
