use std::collections::BTreeMap;

use rand::rngs::StdRng;
use rand::{SeedableRng, seq::SliceRandom};

use super::{Dataset, DatasetError};

/// Train/test partition of a dataset.
#[derive(Debug, Clone)]
pub struct Split {
    pub train: Dataset,
    pub test: Dataset,
}

/// Deterministic stratified train/test split.
///
/// Each class is shuffled with a `StdRng` seeded from `seed` and
/// `round(n_class * test_fraction)` of its rows go to the test side. Classes
/// with a single row stay in training. Row order inside each side follows the
/// original dataset order.
pub fn stratified_split(
    dataset: &Dataset,
    test_fraction: f64,
    seed: u64,
) -> Result<Split, DatasetError> {
    if dataset.is_empty() {
        return Err(DatasetError::Empty);
    }
    let test_fraction = test_fraction.clamp(0.0, 1.0);

    let mut by_class: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
    for (idx, &class_id) in dataset.y.iter().enumerate() {
        by_class.entry(class_id).or_default().push(idx);
    }

    let mut rng = StdRng::seed_from_u64(seed);
    let mut train_idx = Vec::new();
    let mut test_idx = Vec::new();
    for (_class_id, mut indices) in by_class {
        indices.shuffle(&mut rng);
        let n = indices.len();
        let mut test_n = ((n as f64) * test_fraction).round() as usize;
        if n == 1 {
            test_n = 0;
        } else if test_n >= n {
            test_n = n - 1;
        }
        test_idx.extend_from_slice(&indices[..test_n]);
        train_idx.extend_from_slice(&indices[test_n..]);
    }
    train_idx.sort_unstable();
    test_idx.sort_unstable();

    Ok(Split {
        train: dataset.subset(&train_idx),
        test: dataset.subset(&test_idx),
    })
}
