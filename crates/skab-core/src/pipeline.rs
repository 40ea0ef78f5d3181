//! Trainer/model seam between the data layer and the scoring algorithm.

use crate::dataset::Dataset;
use crate::error::Result;
use crate::record::SensorRecord;

/// Fits an [`AnomalyModel`] on a training set.
pub trait Trainer {
    type Model: AnomalyModel;

    fn fit(&self, train: &Dataset) -> Result<Self::Model>;
}

/// A fitted model that maps one observation to a scalar anomaly score.
pub trait AnomalyModel {
    fn score(&self, record: &SensorRecord) -> f32;

    fn score_all(&self, records: &[SensorRecord]) -> Vec<f32> {
        records.iter().map(|r| self.score(r)).collect()
    }
}
