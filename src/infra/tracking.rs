// ============================================================
// Layer 6 — Experiment Tracker
// ============================================================
// Records every training run as a plain directory on disk.
//
// Why log runs to the filesystem?
//   - Every run stays inspectable with ls / cat / a spreadsheet
//   - Params, metrics and artifacts live next to each other
//   - A later process (or the registry) can point at a run's
//     artifacts without any running server
//
// What a run directory looks like:
//   <store root>/runs/
//     run-0001/
//       meta.json       ← name, status, started/finished (UTC)
//       params.json     ← the full training configuration
//       metrics.csv     ← metric,value,step (header written once)
//       artifacts/      ← reports, encoder, model weights, ...
//     run-0002/
//       ...
//
// Run ids are monotonically numbered: starting a run scans the
// existing run-NNNN directories and takes the next number, so
// ids stay stable across process restarts.
//
// Reference: Rust Book §9 (Error Handling)
//            Rust Book §12 (I/O and File Handling)

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::{
    fs::{self, OpenOptions},
    io::Write,
    path::{Path, PathBuf},
};

/// Lifecycle state recorded in meta.json
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RunStatus {
    Running,
    Finished,
    Failed,
}

/// Contents of a run's meta.json
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunMeta {
    pub run_id:      String,
    pub name:        String,
    pub status:      RunStatus,
    pub started_at:  DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
}

/// Hands out run directories under `<root>/runs/`.
pub struct ExperimentTracker {
    runs_dir: PathBuf,
}

impl ExperimentTracker {
    pub fn new(store_root: impl Into<PathBuf>) -> Self {
        Self { runs_dir: store_root.into().join("runs") }
    }

    /// Create the next `run-NNNN` directory and its meta.json.
    pub fn start_run(&self, name: &str) -> Result<RunHandle> {
        fs::create_dir_all(&self.runs_dir)
            .with_context(|| format!("Cannot create '{}'", self.runs_dir.display()))?;

        let run_id = format!("run-{:04}", self.next_run_number()?);
        let dir    = self.runs_dir.join(&run_id);
        fs::create_dir_all(dir.join("artifacts"))
            .with_context(|| format!("Cannot create run directory '{}'", dir.display()))?;

        let meta = RunMeta {
            run_id:      run_id.clone(),
            name:        name.to_string(),
            status:      RunStatus::Running,
            started_at:  Utc::now(),
            finished_at: None,
        };
        let run = RunHandle { dir, meta };
        run.write_meta()?;

        tracing::info!("Started run '{}' ({})", run.meta.run_id, name);
        Ok(run)
    }

    /// Highest existing run number plus one; 1 for a fresh store.
    fn next_run_number(&self) -> Result<u32> {
        let mut highest = 0u32;
        for entry in fs::read_dir(&self.runs_dir)? {
            let entry = entry?;
            let name  = entry.file_name();
            if let Some(number) = name
                .to_str()
                .and_then(|n| n.strip_prefix("run-"))
                .and_then(|n| n.parse::<u32>().ok())
            {
                highest = highest.max(number);
            }
        }
        Ok(highest + 1)
    }
}

/// One in-progress run. Dropping the handle leaves the run marked
/// RUNNING on disk; call finish() to record the terminal state.
pub struct RunHandle {
    dir:  PathBuf,
    meta: RunMeta,
}

impl RunHandle {
    pub fn run_id(&self) -> &str {
        &self.meta.run_id
    }

    /// Directory holding this run's artifacts
    pub fn artifacts_dir(&self) -> PathBuf {
        self.dir.join("artifacts")
    }

    /// Write the run's parameters to params.json.
    pub fn log_params<T: Serialize>(&self, params: &T) -> Result<()> {
        let path = self.dir.join("params.json");
        fs::write(&path, serde_json::to_string_pretty(params)?)
            .with_context(|| format!("Cannot write params to '{}'", path.display()))?;
        Ok(())
    }

    /// Append one metric observation as a new row in metrics.csv.
    ///
    /// Uses OpenOptions with append=true so we add to the file
    /// without overwriting previous observations.
    pub fn log_metric(&self, metric: &str, value: f64, step: usize) -> Result<()> {
        let path = self.dir.join("metrics.csv");

        // Write CSV header only if file is new
        if !path.exists() {
            let mut f = fs::File::create(&path)?;
            writeln!(f, "metric,value,step")?;
        }

        let mut f = OpenOptions::new().append(true).open(&path)?;
        writeln!(f, "{},{:.6},{}", metric, value, step)?;

        tracing::debug!("Logged metric {}={:.4} (step {})", metric, value, step);
        Ok(())
    }

    /// Serialise `value` to artifacts/<name> as pretty JSON.
    pub fn log_json<T: Serialize>(&self, name: &str, value: &T) -> Result<()> {
        let path = self.artifacts_dir().join(name);
        fs::write(&path, serde_json::to_string_pretty(value)?)
            .with_context(|| format!("Cannot write artifact '{}'", path.display()))?;
        Ok(())
    }

    /// Copy an existing file into artifacts/, keeping its name.
    pub fn copy_artifact(&self, source: &Path) -> Result<()> {
        let name = source
            .file_name()
            .with_context(|| format!("'{}' has no file name", source.display()))?;
        let target = self.artifacts_dir().join(name);
        fs::copy(source, &target)
            .with_context(|| format!("Cannot copy '{}' into the run", source.display()))?;
        Ok(())
    }

    /// Record the terminal state. Consumes the handle — a finished
    /// run cannot be logged to any more.
    pub fn finish(mut self, status: RunStatus) -> Result<()> {
        self.meta.status      = status;
        self.meta.finished_at = Some(Utc::now());
        self.write_meta()?;
        tracing::info!("Run '{}' finished with {:?}", self.meta.run_id, status);
        Ok(())
    }

    fn write_meta(&self) -> Result<()> {
        let path = self.dir.join("meta.json");
        fs::write(&path, serde_json::to_string_pretty(&self.meta)?)
            .with_context(|| format!("Cannot write '{}'", path.display()))?;
        Ok(())
    }
}
