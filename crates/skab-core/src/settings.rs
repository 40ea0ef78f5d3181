use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::dataset::{DataSources, SplitOptions, DEFAULT_TEST_FRACTION};
use crate::error::{CoreError, Result};
use crate::pca::DEFAULT_RANK;
use crate::record::SensorRecord;
use crate::validation::validate_record;

/// Environment variables with this prefix override file settings.
pub const ENV_PREFIX: &str = "SKAB";

/// Settings for one train/save/load/score run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    /// The single anomaly-free file.
    pub baseline_path: PathBuf,
    /// Folders scanned for `*.csv` files, loaded in this order.
    pub folder_paths: Vec<PathBuf>,
    pub model_path: PathBuf,
    pub test_fraction: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
    pub rank: usize,
    /// Block on stdin after reporting.
    pub pause_on_exit: bool,
    /// Smoke-test point scored after the test split.
    pub sample: SensorRecord,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            baseline_path: PathBuf::from("SKAB/anomaly-free/anomaly-free.csv"),
            folder_paths: vec![
                PathBuf::from("SKAB/valve1"),
                PathBuf::from("SKAB/valve2"),
                PathBuf::from("SKAB/other"),
            ],
            model_path: PathBuf::from("model.json"),
            test_fraction: DEFAULT_TEST_FRACTION,
            seed: None,
            rank: DEFAULT_RANK,
            pause_on_exit: true,
            sample: default_sample(),
        }
    }
}

/// `SKAB_MODEL_PATH` sets `model_path`; `SKAB_SAMPLE__VOLTAGE` sets `sample.voltage`.
fn environment() -> config::Environment {
    config::Environment::with_prefix(ENV_PREFIX)
        .prefix_separator("_")
        .separator("__")
        .try_parsing(true)
}

fn default_sample() -> SensorRecord {
    SensorRecord::from_features(
        "10.03.2020 14:00",
        [0.28, 0.30, 1.75, 0.45, 72.3, 26.5, 230.0, 120.0],
    )
}

impl RunConfig {
    /// Defaults, then the optional TOML file, then `SKAB_*` environment variables.
    ///
    /// The result is not validated; callers apply their own overrides first
    /// and then call [`RunConfig::validate`].
    pub fn load(path: Option<&Path>) -> Result<Self> {
        Self::load_with_env(path, environment())
    }

    fn load_with_env(path: Option<&Path>, env: config::Environment) -> Result<Self> {
        let mut builder = config::Config::builder()
            .add_source(config::Config::try_from(&RunConfig::default())?);

        if let Some(path) = path {
            builder = builder.add_source(
                config::File::from(path)
                    .format(config::FileFormat::Toml)
                    .required(true),
            );
        }

        builder = builder.add_source(env);
        Ok(builder.build()?.try_deserialize()?)
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.test_fraction > 0.0 && self.test_fraction < 1.0) {
            return Err(CoreError::InvalidConfig(format!(
                "test_fraction must be in (0, 1), got {}",
                self.test_fraction
            )));
        }
        if !(1..=crate::record::CHANNEL_COUNT).contains(&self.rank) {
            return Err(CoreError::InvalidConfig(format!(
                "rank must be in 1..=8, got {}",
                self.rank
            )));
        }
        if self.baseline_path.as_os_str().is_empty() {
            return Err(CoreError::InvalidConfig("baseline_path is empty".into()));
        }
        if self.model_path.as_os_str().is_empty() {
            return Err(CoreError::InvalidConfig("model_path is empty".into()));
        }
        validate_record(&self.sample).map_err(|reason| {
            CoreError::InvalidConfig(format!("sample point rejected: {reason:?}"))
        })?;
        Ok(())
    }

    pub fn sources(&self) -> DataSources {
        DataSources {
            baseline: self.baseline_path.clone(),
            folders: self.folder_paths.clone(),
        }
    }

    pub fn split_options(&self) -> SplitOptions {
        SplitOptions {
            test_fraction: self.test_fraction,
            seed: self.seed,
        }
    }

    /// Effective configuration as TOML.
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| CoreError::InvalidConfig(e.to_string()))
    }
}
