use crate::record::{Channel, SensorRecord};

/// Reason a parsed row is kept out of the dataset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    BlankTimestamp,
    NonFinite(Channel),
}

/// Validate channel values before ingestion.
pub fn validate_channels(features: &[f32]) -> Result<(), Rejection> {
    match features.iter().position(|f| f.is_nan() || f.is_infinite()) {
        Some(i) => Err(Rejection::NonFinite(Channel::ALL[i])),
        None => Ok(()),
    }
}

/// A record is usable only with a non-blank timestamp and eight finite channels.
pub fn validate_record(record: &SensorRecord) -> Result<(), Rejection> {
    if record.timestamp.trim().is_empty() {
        return Err(Rejection::BlankTimestamp);
    }
    validate_channels(&record.features())
}

/// Tally of rows dropped by [`validate_record`], for logging.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RejectionCounts {
    pub blank_timestamp: usize,
    pub non_finite: usize,
}

impl RejectionCounts {
    pub fn record(&mut self, rejection: Rejection) {
        match rejection {
            Rejection::BlankTimestamp => self.blank_timestamp += 1,
            Rejection::NonFinite(_) => self.non_finite += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.blank_timestamp + self.non_finite
    }
}
