use serde::{Deserialize, Serialize};

/// Number of numeric sensor channels per observation.
pub const CHANNEL_COUNT: usize = 8;

/// Sensor channels in CSV column order (columns 1..=8).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Channel {
    Accelerometer1Rms,
    Accelerometer2Rms,
    Current,
    Pressure,
    Temperature,
    Thermocouple,
    Voltage,
    VolumeFlowRateRms,
}

impl Channel {
    pub const ALL: [Channel; CHANNEL_COUNT] = [
        Channel::Accelerometer1Rms,
        Channel::Accelerometer2Rms,
        Channel::Current,
        Channel::Pressure,
        Channel::Temperature,
        Channel::Thermocouple,
        Channel::Voltage,
        Channel::VolumeFlowRateRms,
    ];

    /// Header name used by the SKAB files.
    pub fn name(self) -> &'static str {
        match self {
            Channel::Accelerometer1Rms => "Accelerometer1RMS",
            Channel::Accelerometer2Rms => "Accelerometer2RMS",
            Channel::Current => "Current",
            Channel::Pressure => "Pressure",
            Channel::Temperature => "Temperature",
            Channel::Thermocouple => "Thermocouple",
            Channel::Voltage => "Voltage",
            Channel::VolumeFlowRateRms => "Volume Flow RateRMS",
        }
    }

    /// Position in the feature vector; the CSV column is `index() + 1`.
    pub fn index(self) -> usize {
        self as usize
    }
}

/// One timestamped observation of the test rig.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensorRecord {
    pub timestamp: String,
    pub accelerometer1_rms: f32,
    pub accelerometer2_rms: f32,
    pub current: f32,
    pub pressure: f32,
    pub temperature: f32,
    pub thermocouple: f32,
    pub voltage: f32,
    pub volume_flow_rate_rms: f32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub anomaly: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub changepoint: Option<f32>,
}

impl SensorRecord {
    /// Build an unlabelled record from a channel vector in [`Channel::ALL`] order.
    pub fn from_features(timestamp: impl Into<String>, f: [f32; CHANNEL_COUNT]) -> Self {
        Self {
            timestamp: timestamp.into(),
            accelerometer1_rms: f[0],
            accelerometer2_rms: f[1],
            current: f[2],
            pressure: f[3],
            temperature: f[4],
            thermocouple: f[5],
            voltage: f[6],
            volume_flow_rate_rms: f[7],
            anomaly: None,
            changepoint: None,
        }
    }

    pub fn features(&self) -> [f32; CHANNEL_COUNT] {
        [
            self.accelerometer1_rms,
            self.accelerometer2_rms,
            self.current,
            self.pressure,
            self.temperature,
            self.thermocouple,
            self.voltage,
            self.volume_flow_rate_rms,
        ]
    }

    pub fn channel(&self, channel: Channel) -> f32 {
        self.features()[channel.index()]
    }

    /// Ground-truth flag; `None` for files without label columns.
    pub fn is_labelled_anomaly(&self) -> Option<bool> {
        self.anomaly.map(|a| a >= 0.5)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn features_follow_channel_order() {
        let r = SensorRecord::from_features("t", [1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0]);
        for (i, ch) in Channel::ALL.iter().enumerate() {
            assert_eq!(ch.index(), i);
            assert_eq!(r.channel(*ch), (i + 1) as f32);
        }
    }

    #[test]
    fn label_threshold() {
        let mut r = SensorRecord::from_features("t", [0.0; CHANNEL_COUNT]);
        assert_eq!(r.is_labelled_anomaly(), None);
        r.anomaly = Some(1.0);
        assert_eq!(r.is_labelled_anomaly(), Some(true));
        r.anomaly = Some(0.0);
        assert_eq!(r.is_labelled_anomaly(), Some(false));
    }
}
