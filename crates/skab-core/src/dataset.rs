use std::path::PathBuf;

use log::info;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use crate::error::{CoreError, Result};
use crate::loader::{load_csv, load_folder};
use crate::record::SensorRecord;

pub const DEFAULT_TEST_FRACTION: f64 = 0.2;

/// Where the records come from: one anomaly-free file plus scanned folders.
#[derive(Debug, Clone)]
pub struct DataSources {
    pub baseline: PathBuf,
    pub folders: Vec<PathBuf>,
}

#[derive(Debug, Clone, Copy)]
pub struct SplitOptions {
    pub test_fraction: f64,
    /// Fixed seed for a reproducible split; `None` draws from OS entropy.
    pub seed: Option<u64>,
}

impl Default for SplitOptions {
    fn default() -> Self {
        Self {
            test_fraction: DEFAULT_TEST_FRACTION,
            seed: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    records: Vec<SensorRecord>,
}

impl Dataset {
    pub fn new(records: Vec<SensorRecord>) -> Self {
        Self { records }
    }

    pub fn records(&self) -> &[SensorRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Randomly assign records to train and test.
    ///
    /// The test side receives `round(len * test_fraction)` records, capped so
    /// train keeps at least one. Relative order is preserved on both sides.
    pub fn split(self, opts: SplitOptions) -> Result<Split> {
        check_fraction(opts.test_fraction)?;
        if self.records.is_empty() {
            return Err(CoreError::EmptyDataset);
        }

        let n = self.records.len();
        let test_len = ((n as f64 * opts.test_fraction).round() as usize).min(n - 1);

        let mut rng = match opts.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let mut order: Vec<usize> = (0..n).collect();
        order.shuffle(&mut rng);

        let mut in_test = vec![false; n];
        for &i in &order[..test_len] {
            in_test[i] = true;
        }

        let (test, train): (Vec<_>, Vec<_>) = self
            .records
            .into_iter()
            .zip(in_test)
            .partition(|(_, t)| *t);

        Ok(Split {
            train: Dataset::new(train.into_iter().map(|(r, _)| r).collect()),
            test: Dataset::new(test.into_iter().map(|(r, _)| r).collect()),
        })
    }
}

impl From<Vec<SensorRecord>> for Dataset {
    fn from(records: Vec<SensorRecord>) -> Self {
        Self::new(records)
    }
}

#[derive(Debug, Clone)]
pub struct Split {
    pub train: Dataset,
    pub test: Dataset,
}

fn check_fraction(f: f64) -> Result<()> {
    if f > 0.0 && f < 1.0 {
        Ok(())
    } else {
        Err(CoreError::InvalidConfig(format!(
            "test fraction must be in (0, 1), got {f}"
        )))
    }
}

/// Concatenate the baseline file and every folder, in that order.
pub fn load_dataset(sources: &DataSources) -> Result<Dataset> {
    let mut records = load_csv(&sources.baseline)?;
    for folder in &sources.folders {
        records.extend(load_folder(folder)?);
    }
    if records.is_empty() {
        return Err(CoreError::EmptyDataset);
    }
    Ok(Dataset::new(records))
}

/// Load all sources and split them once.
pub fn build(sources: &DataSources, opts: SplitOptions) -> Result<Split> {
    check_fraction(opts.test_fraction)?;
    let dataset = load_dataset(sources)?;
    let total = dataset.len();
    let split = dataset.split(opts)?;
    info!(
        "dataset: {} records, {} train / {} test",
        total,
        split.train.len(),
        split.test.len()
    );
    Ok(split)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::CHANNEL_COUNT;
    use std::collections::HashSet;

    fn records(n: usize) -> Vec<SensorRecord> {
        (0..n)
            .map(|i| SensorRecord::from_features(format!("t{i}"), [i as f32; CHANNEL_COUNT]))
            .collect()
    }

    fn seeded(seed: u64) -> SplitOptions {
        SplitOptions {
            seed: Some(seed),
            ..SplitOptions::default()
        }
    }

    #[test]
    fn split_is_disjoint_and_complete() {
        let split = Dataset::new(records(100)).split(seeded(7)).unwrap();
        assert_eq!(split.train.len() + split.test.len(), 100);
        assert_eq!(split.test.len(), 20);

        let train: HashSet<_> = split.train.records().iter().map(|r| &r.timestamp).collect();
        let test: HashSet<_> = split.test.records().iter().map(|r| &r.timestamp).collect();
        assert!(train.is_disjoint(&test));
    }

    #[test]
    fn split_is_not_a_contiguous_tail() {
        let split = Dataset::new(records(200)).split(seeded(11)).unwrap();
        let tail: Vec<_> = records(200)[160..].to_vec();
        assert_ne!(split.test.records(), tail.as_slice());
    }

    #[test]
    fn split_keeps_relative_order() {
        let split = Dataset::new(records(50)).split(seeded(3)).unwrap();
        let idx = |d: &Dataset| -> Vec<usize> {
            d.records()
                .iter()
                .map(|r| r.timestamp[1..].parse().unwrap())
                .collect()
        };
        let train = idx(&split.train);
        assert!(train.windows(2).all(|w| w[0] < w[1]));
        let test = idx(&split.test);
        assert!(test.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn same_seed_same_split() {
        let a = Dataset::new(records(64)).split(seeded(42)).unwrap();
        let b = Dataset::new(records(64)).split(seeded(42)).unwrap();
        assert_eq!(a.test, b.test);
        assert_eq!(a.train, b.train);
    }

    #[test]
    fn single_record_stays_in_train() {
        let split = Dataset::new(records(1)).split(seeded(1)).unwrap();
        assert_eq!(split.train.len(), 1);
        assert!(split.test.is_empty());
    }

    #[test]
    fn empty_dataset_refuses_to_split() {
        let err = Dataset::default().split(SplitOptions::default()).unwrap_err();
        assert!(matches!(err, CoreError::EmptyDataset));
    }

    #[test]
    fn fraction_out_of_range() {
        for f in [0.0, 1.0, -0.1, 1.5, f64::NAN] {
            let opts = SplitOptions {
                test_fraction: f,
                seed: Some(0),
            };
            assert!(matches!(
                Dataset::new(records(10)).split(opts),
                Err(CoreError::InvalidConfig(_))
            ));
        }
    }
}
