// ============================================================
// Layer 5 — Nested Cross-Validation Driver
// ============================================================
// Runs the full model-selection procedure:
//
//   outer loop (K_out folds)    → unbiased performance estimate
//     inner loop (K_in folds)   → hyperparameter selection
//       one trial per (config, inner fold)
//     retrain the winner on outer-train, score on the test fold
//   aggregate outer scores      → mean ± std over folds
//
// The driver never touches a tensor. It schedules trials purely
// through the ModelTrainer trait, so all of the fold, grid and
// seed accounting below is testable with a stub trainer.
//
// Selection metric is F1 on the churn class. Comparison is a
// strict >, so on a tie the earliest grid config keeps the win.
//
// Reference: Cawley & Talbot (2010) On Over-fitting in Model
//            Selection, Rust Book §10 (Generics and Traits)

use anyhow::Result;

use crate::data::splitter::{partition_by_fold, stratified_k_fold};
use crate::domain::customer::CustomerRecord;
use crate::domain::errors::ChurnError;
use crate::domain::traits::ModelTrainer;
use crate::domain::trial::{HyperparameterConfig, NestedCvReport, OuterFoldResult, TrialResult};

// ─── Seed derivation ──────────────────────────────────────────────────────────
/// What a derived seed is FOR. Mixed into the derivation so that,
/// say, the retrain of fold 2 and an inner trial in fold 2 can
/// never end up with the same seed.
#[derive(Debug, Clone, Copy)]
enum SeedRole {
    OuterSplit = 0,
    InnerSplit = 1,
    InnerTrial = 2,
    Retrain    = 3,
    FinalSplit = 4,
    FinalTrial = 5,
    FinalFit   = 6,
}

/// Derive a seed from what a step IS, never from when it runs.
/// Reordering folds or configs cannot change any step's seed,
/// which is what keeps the whole procedure order-invariant.
fn derive_seed(base: u64, role: SeedRole, fold: usize, config: usize) -> u64 {
    // splitmix64-style finisher over the packed step identity
    let mut z = base
        .wrapping_add((role as u64).wrapping_mul(0x9E37_79B9_7F4A_7C15))
        .wrapping_add((fold as u64).wrapping_mul(0xBF58_476D_1CE4_E5B9))
        .wrapping_add((config as u64).wrapping_mul(0x94D0_49BB_1331_11EB));
    z ^= z >> 30;
    z = z.wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z ^= z >> 27;
    z = z.wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^= z >> 31;
    z
}

// ─── NestedCrossValidation ────────────────────────────────────────────────────
/// The procedure's parameters. `run` produces the unbiased
/// estimate; `select_final_config` repeats the inner-style grid
/// search once over all records for the model that ships.
pub struct NestedCrossValidation {
    outer_folds: usize,
    inner_folds: usize,
    base_seed:   u64,
}

impl NestedCrossValidation {
    pub fn new(outer_folds: usize, inner_folds: usize, base_seed: u64) -> Self {
        Self { outer_folds, inner_folds, base_seed }
    }

    /// Run the full nested procedure over labelled records.
    ///
    /// Failed trials are logged and excluded from their config's
    /// mean; a fold where every config failed (or the retrain
    /// failed) ends up with no outer score but the run continues.
    pub fn run<T: ModelTrainer>(
        &self,
        trainer: &T,
        records: &[CustomerRecord],
        grid:    &[HyperparameterConfig],
    ) -> Result<NestedCvReport> {
        if grid.is_empty() {
            anyhow::bail!("hyperparameter grid is empty");
        }
        tracing::info!(
            "Nested cross-validation: {} records, {} outer x {} inner folds, {} configs",
            records.len(), self.outer_folds, self.inner_folds, grid.len(),
        );

        let labels     = labels_of(records)?;
        let outer_seed = derive_seed(self.base_seed, SeedRole::OuterSplit, 0, 0);
        let outer      = stratified_k_fold(&labels, self.outer_folds, outer_seed)?;

        let mut folds = Vec::with_capacity(outer.len());
        for (fold_index, test_fold) in outer.iter().enumerate() {
            folds.push(self.run_outer_fold(trainer, records, grid, fold_index, test_fold)?);
        }

        let report = NestedCvReport::from_folds(folds);
        match (report.mean_outer_score, report.std_outer_score) {
            (Some(mean), Some(std)) => {
                tracing::info!("Outer estimate: f1 = {:.4} ± {:.4}", mean, std);
            }
            _ => tracing::warn!("No outer fold produced a usable score"),
        }
        Ok(report)
    }

    /// One outer fold: inner grid search, then retrain + score of
    /// the winner on the held-out test partition.
    fn run_outer_fold<T: ModelTrainer>(
        &self,
        trainer:    &T,
        records:    &[CustomerRecord],
        grid:       &[HyperparameterConfig],
        fold_index: usize,
        test_fold:  &[usize],
    ) -> Result<OuterFoldResult> {
        let (outer_train, outer_test) = partition_by_fold(records, test_fold);
        tracing::info!(
            "Outer fold {}: {} train / {} test records",
            fold_index, outer_train.len(), outer_test.len(),
        );

        // ── Inner grid search over the outer-train records ────────────────────
        let split_seed = derive_seed(self.base_seed, SeedRole::InnerSplit, fold_index, 0);
        let trials = self.grid_search(trainer, &outer_train, grid, split_seed, |inner, config| {
            derive_seed(
                self.base_seed,
                SeedRole::InnerTrial,
                fold_index * self.inner_folds + inner,
                config,
            )
        })?;

        // ── Retrain the winner on the full outer-train set ────────────────────
        let (selected_config, outer_report) = match select_best(&trials) {
            Some(winner) => {
                let seed = derive_seed(self.base_seed, SeedRole::Retrain, fold_index, winner);
                match trainer.train_and_score(&grid[winner], &outer_train, &outer_test, seed) {
                    Ok(outcome) => {
                        tracing::info!(
                            "Outer fold {}: config {} held-out f1 = {:.4}",
                            fold_index, winner, outcome.report.f1,
                        );
                        (Some(winner), Some(outcome.report))
                    }
                    Err(error) => {
                        tracing::warn!(
                            "Outer fold {}: retrain of config {} failed: {error:#}",
                            fold_index, winner,
                        );
                        (None, None)
                    }
                }
            }
            None => {
                tracing::warn!("Outer fold {}: every config failed, no outer score", fold_index);
                (None, None)
            }
        };

        Ok(OuterFoldResult { fold: fold_index, trials, selected_config, outer_report })
    }

    /// K-fold grid search over one record set. Shared by the inner
    /// loop and by the final full-dataset selection; the caller
    /// supplies the seed derivation for its trials.
    fn grid_search<T: ModelTrainer>(
        &self,
        trainer:    &T,
        records:    &[CustomerRecord],
        grid:       &[HyperparameterConfig],
        split_seed: u64,
        trial_seed: impl Fn(usize, usize) -> u64,
    ) -> Result<Vec<TrialResult>> {
        let labels = labels_of(records)?;
        let folds  = stratified_k_fold(&labels, self.inner_folds, split_seed)?;

        let mut results = Vec::with_capacity(grid.len());
        for (config_index, config) in grid.iter().enumerate() {
            let mut scores   = Vec::with_capacity(folds.len());
            let mut failures = 0usize;

            for (fold_index, validation_fold) in folds.iter().enumerate() {
                let (train, validation) = partition_by_fold(records, validation_fold);
                let seed = trial_seed(fold_index, config_index);

                match trainer.train_and_score(config, &train, &validation, seed) {
                    Ok(outcome) => scores.push(outcome.report.f1),
                    Err(error) => {
                        failures += 1;
                        tracing::warn!(
                            "Trial failed (config {}, validation fold {}): {error:#}",
                            config_index, fold_index,
                        );
                    }
                }
            }

            results.push(TrialResult::new(config_index, scores, failures));
        }
        Ok(results)
    }

    /// Grid search over the FULL dataset, run once after the nested
    /// procedure. The winner is the config the shipped model is
    /// fitted with; the nested estimate stays the reported one.
    pub fn select_final_config<T: ModelTrainer>(
        &self,
        trainer: &T,
        records: &[CustomerRecord],
        grid:    &[HyperparameterConfig],
    ) -> Result<(Vec<TrialResult>, Option<usize>)> {
        if grid.is_empty() {
            anyhow::bail!("hyperparameter grid is empty");
        }
        let split_seed = derive_seed(self.base_seed, SeedRole::FinalSplit, 0, 0);
        let trials = self.grid_search(trainer, records, grid, split_seed, |fold, config| {
            derive_seed(self.base_seed, SeedRole::FinalTrial, fold, config)
        })?;
        let selected = select_best(&trials);
        Ok((trials, selected))
    }

    /// Seed for the single full-dataset fit of the selected config.
    pub fn final_fit_seed(&self, selected_config: usize) -> u64 {
        derive_seed(self.base_seed, SeedRole::FinalFit, 0, selected_config)
    }
}

/// Highest inner mean wins; the strict > keeps the earliest grid
/// config on ties. Configs with no successful trial are skipped.
fn select_best(trials: &[TrialResult]) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for trial in trials {
        let Some(mean) = trial.mean_score else { continue };
        match best {
            Some((_, best_mean)) if mean > best_mean => best = Some((trial.config_index, mean)),
            None => best = Some((trial.config_index, mean)),
            _ => {}
        }
    }
    best.map(|(index, _)| index)
}

/// Every record entering cross-validation must carry a label.
fn labels_of(records: &[CustomerRecord]) -> Result<Vec<bool>> {
    records
        .iter()
        .map(|r| {
            r.churn.ok_or_else(|| {
                ChurnError::InvalidRecord("cross-validation needs labelled records".to_string())
                    .into()
            })
        })
        .collect()
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::evaluation::ClassificationReport;
    use crate::domain::trial::TrialOutcome;
    use std::cell::RefCell;
    use std::collections::HashSet;

    /// Deterministic fake trainer. Returns a fixed f1 per grid
    /// index and records every call for accounting assertions.
    /// Grid configs are tagged by hidden_units so the stub can
    /// recover the index it was called with.
    struct StubTrainer {
        scores:         Vec<f64>,
        failing:        Vec<usize>,
        fail_train_len: Option<usize>,
        calls:          RefCell<Vec<(usize, usize, usize, u64)>>,
    }

    impl StubTrainer {
        fn new(scores: Vec<f64>) -> Self {
            Self {
                scores,
                failing:        vec![],
                fail_train_len: None,
                calls:          RefCell::new(vec![]),
            }
        }

        fn with_failing(mut self, configs: Vec<usize>) -> Self {
            self.failing = configs;
            self
        }

        fn with_fail_train_len(mut self, len: usize) -> Self {
            self.fail_train_len = Some(len);
            self
        }

        /// Grid of n configs where hidden_units encodes the index.
        fn grid(n: usize) -> Vec<HyperparameterConfig> {
            (0..n)
                .map(|i| HyperparameterConfig {
                    hidden_units: vec![i + 1],
                    ..HyperparameterConfig::default()
                })
                .collect()
        }

        fn config_index(config: &HyperparameterConfig) -> usize {
            config.hidden_units[0] - 1
        }
    }

    impl ModelTrainer for StubTrainer {
        fn train_and_score(
            &self,
            config: &HyperparameterConfig,
            train:  &[CustomerRecord],
            eval:   &[CustomerRecord],
            seed:   u64,
        ) -> Result<TrialOutcome> {
            let index = Self::config_index(config);
            self.calls
                .borrow_mut()
                .push((index, train.len(), eval.len(), seed));

            if self.failing.contains(&index) {
                return Err(ChurnError::TrainingTrialFailure(format!(
                    "stubbed failure for config {index}"
                ))
                .into());
            }
            if self.fail_train_len == Some(train.len()) {
                return Err(ChurnError::TrainingTrialFailure(format!(
                    "stubbed failure for train size {}",
                    train.len()
                ))
                .into());
            }

            let f1 = self.scores[index];
            Ok(TrialOutcome {
                report: ClassificationReport {
                    log_loss:  0.1,
                    accuracy:  f1,
                    precision: f1,
                    recall:    f1,
                    f1,
                },
                loss_curve: vec![1.0, 0.5],
            })
        }
    }

    /// n records with alternating labels, enough structure for the
    /// stratified splitter to produce exactly balanced folds.
    fn records(n: usize) -> Vec<CustomerRecord> {
        (0..n)
            .map(|i| {
                CustomerRecord::new(
                    i as i64,
                    "Yes",
                    "Month-to-month",
                    "No",
                    "Mailed check",
                    50.0,
                    100.0,
                )
                .with_churn(i % 2 == 0)
            })
            .collect()
    }

    #[test]
    fn test_trial_accounting() {
        // 100 records, 5 outer folds, 3 inner folds, 2 configs:
        //   inner trainings = 5 * 2 * 3 = 30
        //   retrains        = 5
        let stub = StubTrainer::new(vec![0.6, 0.7]);
        let cv   = NestedCrossValidation::new(5, 3, 42);
        cv.run(&stub, &records(100), &StubTrainer::grid(2)).unwrap();

        let calls = stub.calls.borrow();
        assert_eq!(calls.len(), 35);

        // retrains are the calls on the full 80-record outer-train,
        // and each scores exactly one 20-record outer test fold
        let retrains: Vec<_> = calls.iter().filter(|c| c.1 == 80).collect();
        assert_eq!(retrains.len(), 5);
        assert!(retrains.iter().all(|c| c.2 == 20));

        // the remaining 30 inner trials partition the 80 outer-train
        // records into train + validation
        let inner: Vec<_> = calls.iter().filter(|c| c.1 != 80).collect();
        assert_eq!(inner.len(), 30);
        assert!(inner.iter().all(|c| c.1 + c.2 == 80));
    }

    #[test]
    fn test_selection_prefers_highest_mean() {
        let stub = StubTrainer::new(vec![0.5, 0.9, 0.7]);
        let cv   = NestedCrossValidation::new(4, 3, 42);
        let report = cv.run(&stub, &records(80), &StubTrainer::grid(3)).unwrap();

        for fold in &report.outer_folds {
            assert_eq!(fold.selected_config, Some(1));
        }
        assert!((report.mean_outer_score.unwrap() - 0.9).abs() < 1e-9);
    }

    #[test]
    fn test_tie_keeps_earliest_config() {
        let stub = StubTrainer::new(vec![0.8, 0.8]);
        let cv   = NestedCrossValidation::new(3, 3, 7);
        let report = cv.run(&stub, &records(60), &StubTrainer::grid(2)).unwrap();

        for fold in &report.outer_folds {
            assert_eq!(fold.selected_config, Some(0));
        }
    }

    #[test]
    fn test_failing_config_is_excluded_from_selection() {
        // config 0 fails every trial; config 1 must win despite a
        // lower score than config 0 pretends to have
        let stub = StubTrainer::new(vec![0.99, 0.6]).with_failing(vec![0]);
        let cv   = NestedCrossValidation::new(3, 3, 42);
        let report = cv.run(&stub, &records(60), &StubTrainer::grid(2)).unwrap();

        for fold in &report.outer_folds {
            assert_eq!(fold.selected_config, Some(1));
            assert!(fold.trials[0].mean_score.is_none());
            assert_eq!(fold.trials[0].failures, 3);
        }
    }

    #[test]
    fn test_every_config_failing_leaves_fold_unavailable() {
        let stub = StubTrainer::new(vec![0.5, 0.6]).with_failing(vec![0, 1]);
        let cv   = NestedCrossValidation::new(3, 3, 42);
        let report = cv.run(&stub, &records(60), &StubTrainer::grid(2)).unwrap();

        // the run itself still completes
        assert_eq!(report.outer_folds.len(), 3);
        assert_eq!(report.available_folds(), 0);
        assert!(report.mean_outer_score.is_none());
    }

    #[test]
    fn test_retrain_failure_leaves_fold_unavailable() {
        // inner trials here train on 26-28 records, so failing on
        // the 40-record outer-train hits only the retrains
        let stub = StubTrainer::new(vec![0.7]).with_fail_train_len(40);
        let cv   = NestedCrossValidation::new(3, 3, 42);
        let report = cv.run(&stub, &records(60), &StubTrainer::grid(1)).unwrap();

        for fold in &report.outer_folds {
            assert!(fold.trials[0].mean_score.is_some());
            assert_eq!(fold.selected_config, None);
            assert!(fold.outer_report.is_none());
        }
    }

    #[test]
    fn test_same_seed_reproduces_every_call() {
        let grid = StubTrainer::grid(2);
        let data = records(60);

        let a = StubTrainer::new(vec![0.6, 0.7]);
        NestedCrossValidation::new(3, 3, 42).run(&a, &data, &grid).unwrap();

        let b = StubTrainer::new(vec![0.6, 0.7]);
        NestedCrossValidation::new(3, 3, 42).run(&b, &data, &grid).unwrap();

        // identical fold assignments, trial order and derived seeds
        assert_eq!(*a.calls.borrow(), *b.calls.borrow());
    }

    #[test]
    fn test_trial_seeds_are_all_distinct() {
        let stub = StubTrainer::new(vec![0.6, 0.7]);
        let cv   = NestedCrossValidation::new(5, 3, 42);
        cv.run(&stub, &records(100), &StubTrainer::grid(2)).unwrap();

        let seeds: HashSet<u64> = stub.calls.borrow().iter().map(|c| c.3).collect();
        assert_eq!(seeds.len(), 35);
    }

    #[test]
    fn test_final_selection_runs_one_grid_search() {
        let stub = StubTrainer::new(vec![0.5, 0.9]);
        let cv   = NestedCrossValidation::new(5, 3, 42);
        let (trials, selected) = cv
            .select_final_config(&stub, &records(60), &StubTrainer::grid(2))
            .unwrap();

        assert_eq!(selected, Some(1));
        assert_eq!(trials.len(), 2);
        // one trial per (config, fold) and nothing else
        assert_eq!(stub.calls.borrow().len(), 6);
    }

    #[test]
    fn test_empty_grid_is_rejected() {
        let stub = StubTrainer::new(vec![]);
        let cv   = NestedCrossValidation::new(3, 3, 42);
        assert!(cv.run(&stub, &records(60), &[]).is_err());
    }

    #[test]
    fn test_unlabelled_record_is_rejected() {
        let mut data = records(60);
        data[5].churn = None;

        let stub = StubTrainer::new(vec![0.5]);
        let cv   = NestedCrossValidation::new(3, 3, 42);
        assert!(cv.run(&stub, &data, &StubTrainer::grid(1)).is_err());
    }
}
