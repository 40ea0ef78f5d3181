use std::io::{self, Write};

use crate::record::SensorRecord;

/// Writes anomaly scores, one line each.
pub struct Reporter<W: Write> {
    out: W,
}

impl<W: Write> Reporter<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn report(&mut self, scores: &[f32]) -> io::Result<()> {
        for &score in scores {
            self.report_one(score)?;
        }
        self.out.flush()
    }

    pub fn report_one(&mut self, score: f32) -> io::Result<()> {
        writeln!(self.out, "Anomaly Score: {score}")
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl Reporter<io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

/// Aggregate view of a scored set, split by ground-truth label when present.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoreSummary {
    pub count: usize,
    pub min: f32,
    pub max: f32,
    pub mean: f32,
    pub mean_labelled_anomaly: Option<f32>,
    pub mean_labelled_normal: Option<f32>,
}

impl ScoreSummary {
    /// `scores[i]` must belong to `records[i]`. Returns `None` for no scores.
    pub fn from_scores(scores: &[f32], records: &[SensorRecord]) -> Option<Self> {
        if scores.is_empty() {
            return None;
        }

        let mut min = f32::INFINITY;
        let mut max = f32::NEG_INFINITY;
        let mut sum = 0f64;
        let mut anomalous = (0f64, 0usize);
        let mut normal = (0f64, 0usize);

        for (i, &s) in scores.iter().enumerate() {
            min = min.min(s);
            max = max.max(s);
            sum += f64::from(s);
            match records.get(i).and_then(SensorRecord::is_labelled_anomaly) {
                Some(true) => {
                    anomalous.0 += f64::from(s);
                    anomalous.1 += 1;
                }
                Some(false) => {
                    normal.0 += f64::from(s);
                    normal.1 += 1;
                }
                None => {}
            }
        }

        let mean_of = |(total, n): (f64, usize)| (n > 0).then(|| (total / n as f64) as f32);
        Some(Self {
            count: scores.len(),
            min,
            max,
            mean: (sum / scores.len() as f64) as f32,
            mean_labelled_anomaly: mean_of(anomalous),
            mean_labelled_normal: mean_of(normal),
        })
    }
}
