//! Seeded stratified train/test split.

use super::dataset::ClassificationDataset;
use crate::error::{Result, SurveyError};
use ndarray::{Array1, Array2, Axis};
use rand::SeedableRng;
use rand::seq::SliceRandom;
use rand_chacha::ChaCha8Rng;

#[derive(Debug, Clone, PartialEq)]
pub struct TrainTestSplit {
    pub x_train: Array2<f64>,
    pub y_train: Array1<f64>,
    pub x_test: Array2<f64>,
    pub y_test: Array1<f64>,
}

/// Held-out rows per class: `ceil(n * fraction)` in total, shared out in
/// proportion to class size by largest remainder, then each kept within
/// `[1, n_class - 1]` so both partitions see the class.
fn held_out(class_sizes: &[usize], fraction: f64) -> Vec<usize> {
    let n: usize = class_sizes.iter().sum();
    let n_test = (n as f64 * fraction).ceil() as usize;

    let mut shares: Vec<usize> = class_sizes.iter().map(|&c| n_test * c / n).collect();
    let assigned: usize = shares.iter().sum();

    let mut order: Vec<usize> = (0..class_sizes.len()).collect();
    // stable sort keeps the first class ahead on equal remainders
    order.sort_by_key(|&k| std::cmp::Reverse(n_test * class_sizes[k] % n));
    for &k in order.iter().take(n_test.saturating_sub(assigned)) {
        shares[k] += 1;
    }

    shares
        .into_iter()
        .zip(class_sizes)
        .map(|(share, &size)| share.clamp(1, size - 1))
        .collect()
}

/// Splits `dataset` so that each class keeps its share in both partitions.
///
/// Rows of each class are shuffled with a ChaCha8 generator seeded from
/// `seed`, so the same inputs always produce the same split.
///
/// # Errors
///
/// - [`SurveyError::InvalidConfig`] when `test_fraction` is not in `(0, 1)`.
/// - [`SurveyError::InsufficientData`] when the dataset is empty or a class
///   has fewer than two rows.
pub fn stratified_split(
    dataset: &ClassificationDataset,
    test_fraction: f64,
    seed: u64,
) -> Result<TrainTestSplit> {
    if !(test_fraction > 0.0 && test_fraction < 1.0) {
        return Err(SurveyError::InvalidConfig(format!(
            "test fraction must be in (0, 1), got {test_fraction}"
        )));
    }
    dataset.ensure_trainable()?;

    let (mut positives, mut negatives): (Vec<usize>, Vec<usize>) =
        (0..dataset.n_rows()).partition(|&i| dataset.labels[i] > 0.5);

    for (name, class) in [("negative", &negatives), ("positive", &positives)] {
        if class.len() < 2 {
            return Err(SurveyError::InsufficientData(format!(
                "{name} class has {} row(s), need at least 2 to stratify",
                class.len()
            )));
        }
    }
    let shares = held_out(&[negatives.len(), positives.len()], test_fraction);

    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut train = Vec::with_capacity(dataset.n_rows());
    let mut test = Vec::new();

    for (class, n_test) in [&mut negatives, &mut positives].into_iter().zip(shares) {
        class.shuffle(&mut rng);
        test.extend_from_slice(&class[..n_test]);
        train.extend_from_slice(&class[n_test..]);
    }

    train.shuffle(&mut rng);
    test.shuffle(&mut rng);

    let take = |idx: &[usize]| -> (Array2<f64>, Array1<f64>) {
        (
            dataset.features.select(Axis(0), idx),
            dataset.labels.select(Axis(0), idx),
        )
    };
    let (x_train, y_train) = take(&train);
    let (x_test, y_test) = take(&test);

    Ok(TrainTestSplit {
        x_train,
        y_train,
        x_test,
        y_test,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dataset(pos: usize, neg: usize) -> ClassificationDataset {
        let n = pos + neg;
        let features = Array2::from_shape_fn((n, 2), |(i, j)| (i * 2 + j) as f64);
        let labels = Array1::from_shape_fn(n, |i| if i < pos { 1.0 } else { 0.0 });
        ClassificationDataset::new(features, labels).unwrap()
    }

    fn rate(y: &Array1<f64>) -> f64 {
        y.iter().filter(|&&v| v > 0.5).count() as f64 / y.len() as f64
    }

    #[test]
    fn test_held_out_shares_total_by_largest_remainder() {
        assert_eq!(held_out(&[5, 5], 0.3), vec![2, 1]);
        assert_eq!(held_out(&[18, 10], 0.3), vec![6, 3]);
        assert_eq!(held_out(&[40, 20], 0.3), vec![12, 6]);
    }

    #[test]
    fn test_held_out_clamps() {
        assert_eq!(held_out(&[2, 2], 0.9), vec![1, 1]);
        assert_eq!(held_out(&[3, 97], 0.01), vec![1, 1]);
    }

    #[test]
    fn test_split_total_matches_ceil_of_fraction() {
        for (pos, neg) in [(5, 5), (10, 18), (7, 13), (3, 4)] {
            let n = pos + neg;
            let split = stratified_split(&dataset(pos, neg), 0.3, 42).unwrap();
            let expected = (n as f64 * 0.3).ceil() as usize;
            assert_eq!(split.y_test.len(), expected, "pos={pos} neg={neg}");
            assert_eq!(split.y_train.len(), n - expected);
        }
    }

    #[test]
    fn test_split_preserves_class_balance() {
        let ds = dataset(20, 40);
        let split = stratified_split(&ds, 0.3, 42).unwrap();

        assert_eq!(split.y_test.len(), 18);
        assert_eq!(split.y_train.len(), 42);
        assert_eq!(split.x_train.nrows(), 42);
        assert!((rate(&split.y_test) - rate(&split.y_train)).abs() < 1e-9);
    }

    #[test]
    fn test_split_partitions_rows() {
        let ds = dataset(7, 13);
        let split = stratified_split(&ds, 0.3, 7).unwrap();

        let mut seen: Vec<f64> = split
            .x_train
            .column(0)
            .iter()
            .chain(split.x_test.column(0).iter())
            .copied()
            .collect();
        seen.sort_by(|a, b| a.total_cmp(b));
        let expected: Vec<f64> = (0..20).map(|i| (i * 2) as f64).collect();
        assert_eq!(seen, expected);
    }

    #[test]
    fn test_split_is_deterministic() {
        let ds = dataset(10, 10);
        let a = stratified_split(&ds, 0.3, 42).unwrap();
        let b = stratified_split(&ds, 0.3, 42).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_split_needs_two_rows_per_class() {
        let err = stratified_split(&dataset(1, 10), 0.3, 42).unwrap_err();
        assert!(matches!(err, SurveyError::InsufficientData(_)));
    }

    #[test]
    fn test_split_rejects_bad_fraction() {
        let err = stratified_split(&dataset(5, 5), 1.0, 42).unwrap_err();
        assert!(matches!(err, SurveyError::InvalidConfig(_)));
    }
}
