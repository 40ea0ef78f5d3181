//! Normalized PCA reconstruction-error model.
//!
//! Training scales every channel to unit variance, centres the result and
//! keeps the `rank` leading eigenvectors of its covariance matrix. A point
//! is scored by the fraction of its centred energy those components fail
//! to explain: `sqrt(residual² / |c|²)`, which lies in `[0, 1]`.

use log::{debug, info};
use nalgebra::{SMatrix, SVector, SymmetricEigen};
use serde::{Deserialize, Serialize};

use crate::dataset::Dataset;
use crate::error::{CoreError, Result};
use crate::features::{assemble, FeatureVector, MeanVarianceNormalizer};
use crate::pipeline::{AnomalyModel, Trainer};
use crate::record::{SensorRecord, CHANNEL_COUNT};

type Vector = SVector<f64, CHANNEL_COUNT>;
type Matrix = SMatrix<f64, CHANNEL_COUNT, CHANNEL_COUNT>;

pub const DEFAULT_RANK: usize = 1;

#[derive(Debug, Clone, Copy)]
pub struct PcaTrainer {
    rank: usize,
}

impl PcaTrainer {
    pub fn new(rank: usize) -> Result<Self> {
        check_rank(rank)?;
        Ok(Self { rank })
    }

    pub fn rank(&self) -> usize {
        self.rank
    }
}

impl Default for PcaTrainer {
    fn default() -> Self {
        Self { rank: DEFAULT_RANK }
    }
}

impl Trainer for PcaTrainer {
    type Model = PcaModel;

    fn fit(&self, train: &Dataset) -> Result<PcaModel> {
        if train.is_empty() {
            return Err(CoreError::EmptyDataset);
        }

        let raw: Vec<FeatureVector> = train.records().iter().map(assemble).collect();
        let normalizer = MeanVarianceNormalizer::fit(&raw);
        let rows: Vec<Vector> = raw
            .iter()
            .map(|x| Vector::from(normalizer.transform(x)))
            .collect();

        let n = rows.len() as f64;
        let mean = rows.iter().fold(Vector::zeros(), |acc, r| acc + r) / n;
        let cov = rows.iter().fold(Matrix::zeros(), |acc, r| {
            let c = r - mean;
            acc + c * c.transpose()
        }) / (n - 1.0).max(1.0);

        if cov.iter().any(|v| !v.is_finite()) {
            return Err(CoreError::Decomposition(
                "covariance matrix has non-finite entries".into(),
            ));
        }

        let eig = SymmetricEigen::new(cov);
        let mut order: Vec<usize> = (0..CHANNEL_COUNT).collect();
        order.sort_by(|&a, &b| eig.eigenvalues[b].total_cmp(&eig.eigenvalues[a]));

        let total: f64 = eig.eigenvalues.iter().map(|v| v.max(0.0)).sum();
        let mut components = Vec::with_capacity(self.rank);
        let mut explained_variance = Vec::with_capacity(self.rank);
        for &i in &order[..self.rank] {
            components.push(to_array(eig.eigenvectors.column(i).iter()));
            let lambda = eig.eigenvalues[i].max(0.0);
            explained_variance.push(if total > 0.0 { lambda / total } else { 0.0 });
        }

        debug!("pca eigenvalues: {:?}", eig.eigenvalues.as_slice());
        info!(
            "fitted rank-{} pca on {} records, explained variance {:?}",
            self.rank,
            train.len(),
            explained_variance
        );

        Ok(PcaModel {
            normalizer,
            mean: to_array(mean.iter()),
            components,
            explained_variance,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PcaModel {
    normalizer: MeanVarianceNormalizer,
    mean: FeatureVector,
    components: Vec<FeatureVector>,
    explained_variance: Vec<f64>,
}

impl PcaModel {
    pub fn rank(&self) -> usize {
        self.components.len()
    }

    /// Share of total variance captured by each kept component.
    pub fn explained_variance(&self) -> &[f64] {
        &self.explained_variance
    }

    /// Structural check for models restored from disk.
    pub fn check(&self) -> Result<()> {
        check_rank(self.components.len())?;
        let finite = |v: &FeatureVector| v.iter().all(|x| x.is_finite());
        if !finite(&self.mean)
            || !finite(self.normalizer.scale())
            || !self.components.iter().all(finite)
        {
            return Err(CoreError::InvalidConfig(
                "model contains non-finite parameters".into(),
            ));
        }
        Ok(())
    }

    pub fn score_features(&self, x: &FeatureVector) -> f64 {
        let c = Vector::from(self.normalizer.transform(x)) - Vector::from(self.mean);
        let energy = c.norm_squared();
        if energy <= f64::EPSILON {
            return 0.0;
        }
        let projected: f64 = self
            .components
            .iter()
            .map(|u| c.dot(&Vector::from(*u)).powi(2))
            .sum();
        ((energy - projected).max(0.0) / energy).sqrt()
    }
}

impl AnomalyModel for PcaModel {
    fn score(&self, record: &SensorRecord) -> f32 {
        self.score_features(&assemble(record)) as f32
    }
}

fn to_array<'a>(values: impl Iterator<Item = &'a f64>) -> FeatureVector {
    let mut out = [0.0; CHANNEL_COUNT];
    for (slot, v) in out.iter_mut().zip(values) {
        *slot = *v;
    }
    out
}

fn check_rank(rank: usize) -> Result<()> {
    if (1..=CHANNEL_COUNT).contains(&rank) {
        Ok(())
    } else {
        Err(CoreError::InvalidConfig(format!(
            "pca rank must be in 1..={CHANNEL_COUNT}, got {rank}"
        )))
    }
}
