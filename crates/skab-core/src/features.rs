use serde::{Deserialize, Serialize};

use crate::record::{SensorRecord, CHANNEL_COUNT};

pub type FeatureVector = [f64; CHANNEL_COUNT];

/// Feature assembly: the eight channels in channel order, widened to `f64`.
pub fn assemble(record: &SensorRecord) -> FeatureVector {
    record.features().map(f64::from)
}

/// Mean-variance normalization that keeps zero at zero.
///
/// Each channel is multiplied by `1 / std` of the training data; no offset
/// is applied. Constant channels keep scale 1.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeanVarianceNormalizer {
    scale: FeatureVector,
}

impl MeanVarianceNormalizer {
    pub fn fit(rows: &[FeatureVector]) -> Self {
        let mut scale = [1.0; CHANNEL_COUNT];
        if rows.is_empty() {
            return Self { scale };
        }

        let n = rows.len() as f64;
        for (c, s) in scale.iter_mut().enumerate() {
            let mean = rows.iter().map(|r| r[c]).sum::<f64>() / n;
            let var = rows.iter().map(|r| (r[c] - mean).powi(2)).sum::<f64>() / n;
            let std = var.sqrt();
            if std.is_finite() && std > f64::EPSILON {
                *s = 1.0 / std;
            }
        }
        Self { scale }
    }

    pub fn scale(&self) -> &FeatureVector {
        &self.scale
    }

    pub fn transform(&self, x: &FeatureVector) -> FeatureVector {
        let mut out = *x;
        for (v, s) in out.iter_mut().zip(self.scale.iter()) {
            *v *= s;
        }
        out
    }
}
