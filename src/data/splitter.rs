// ============================================================
// Layer 4 — Stratified K-Fold Splitter
// ============================================================
// Partitions record indices into K disjoint folds for
// cross-validation.
//
// Why stratified?
//   Churn labels are imbalanced (roughly a quarter of customers
//   leave). A plain random split can hand a small fold almost no
//   churners, which makes recall and F1 meaningless there.
//   Stratification shuffles churners and non-churners separately
//   and deals each group round-robin, so every fold keeps the
//   overall class ratio within one record.
//
// Why a seeded RNG?
//   The same records and the same seed must always produce the
//   same folds, or no cross-validation result could ever be
//   reproduced. StdRng::seed_from_u64 gives a portable,
//   platform-independent sequence.
//
// Uses Fisher-Yates shuffle via rand::seq::SliceRandom
// which is the standard unbiased shuffle algorithm.
//
// Reference: Rust Book §8 (Vectors)
//            rand crate documentation

use anyhow::{bail, Result};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use crate::domain::customer::CustomerRecord;

/// Assign each record index to one of `k` folds, stratified by label.
///
/// # Arguments
/// * `labels` - churn label per record, in record order
/// * `k`      - number of folds, at least 2 and at most labels.len()
/// * `seed`   - RNG seed; same seed + same labels = same folds
///
/// # Returns
/// K index lists. Every index appears in exactly one fold.
pub fn stratified_k_fold(labels: &[bool], k: usize, seed: u64) -> Result<Vec<Vec<usize>>> {
    if k < 2 {
        bail!("need at least 2 folds, got {k}");
    }
    if labels.len() < k {
        bail!("cannot split {} records into {} folds", labels.len(), k);
    }

    let mut rng = StdRng::seed_from_u64(seed);

    // Shuffle each class on its own, then deal round-robin.
    // Dealing churners first and stayers second keeps each
    // fold's class counts within one of every other fold's.
    let mut churners: Vec<usize> = (0..labels.len()).filter(|&i| labels[i]).collect();
    let mut stayers:  Vec<usize> = (0..labels.len()).filter(|&i| !labels[i]).collect();
    churners.shuffle(&mut rng);
    stayers.shuffle(&mut rng);

    let mut folds = vec![Vec::new(); k];
    for (position, index) in churners.into_iter().chain(stayers).enumerate() {
        folds[position % k].push(index);
    }

    tracing::debug!(
        "Stratified {} records into {} folds of sizes {:?}",
        labels.len(),
        k,
        folds.iter().map(Vec::len).collect::<Vec<_>>(),
    );

    Ok(folds)
}

/// Split records into (rest, fold) for one held-out fold.
/// `rest` keeps the original record order; `fold` follows the
/// index order inside `test_fold`.
pub fn partition_by_fold(
    records: &[CustomerRecord],
    test_fold: &[usize],
) -> (Vec<CustomerRecord>, Vec<CustomerRecord>) {
    let mut held_out = vec![false; records.len()];
    for &index in test_fold {
        held_out[index] = true;
    }

    let rest = records
        .iter()
        .enumerate()
        .filter(|(i, _)| !held_out[*i])
        .map(|(_, r)| r.clone())
        .collect();
    let fold = test_fold.iter().map(|&i| records[i].clone()).collect();

    (rest, fold)
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    fn labels(churners: usize, stayers: usize) -> Vec<bool> {
        let mut v = vec![true; churners];
        v.extend(vec![false; stayers]);
        v
    }

    #[test]
    fn test_folds_are_disjoint_and_exhaustive() {
        let folds = stratified_k_fold(&labels(10, 30), 5, 42).unwrap();

        let mut seen = vec![0usize; 40];
        for fold in &folds {
            for &i in fold {
                seen[i] += 1;
            }
        }
        // Every index in exactly one fold
        assert!(seen.iter().all(|&count| count == 1));
    }

    #[test]
    fn test_fold_sizes_are_balanced() {
        let folds = stratified_k_fold(&labels(10, 30), 5, 42).unwrap();
        for fold in &folds {
            assert_eq!(fold.len(), 8);
        }
    }

    #[test]
    fn test_class_ratio_is_preserved_per_fold() {
        let all = labels(10, 30);
        let folds = stratified_k_fold(&all, 5, 7).unwrap();
        for fold in &folds {
            let churners = fold.iter().filter(|&&i| all[i]).count();
            // 10 churners over 5 folds: exactly 2 each
            assert_eq!(churners, 2);
        }
    }

    #[test]
    fn test_same_seed_same_folds() {
        let all = labels(12, 28);
        let a = stratified_k_fold(&all, 4, 99).unwrap();
        let b = stratified_k_fold(&all, 4, 99).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_different_seed_different_folds() {
        let all = labels(40, 40);
        let a = stratified_k_fold(&all, 4, 1).unwrap();
        let b = stratified_k_fold(&all, 4, 2).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_rejects_degenerate_fold_counts() {
        assert!(stratified_k_fold(&labels(2, 2), 1, 0).is_err());
        assert!(stratified_k_fold(&labels(1, 1), 3, 0).is_err());
    }

    #[test]
    fn test_partition_by_fold_separates_exactly_the_fold() {
        let records: Vec<CustomerRecord> = (0..6)
            .map(|i| {
                CustomerRecord::new(i, "Yes", "One year", "No", "Mailed check", 10.0, 10.0)
                    .with_churn(i % 2 == 0)
            })
            .collect();

        let (rest, fold) = partition_by_fold(&records, &[1, 4]);

        assert_eq!(rest.len(), 4);
        assert_eq!(fold.len(), 2);
        let fold_tenures: Vec<i64> = fold.iter().map(|r| r.tenure).collect();
        assert_eq!(fold_tenures, vec![1, 4]);
        assert!(rest.iter().all(|r| r.tenure != 1 && r.tenure != 4));
    }
}
