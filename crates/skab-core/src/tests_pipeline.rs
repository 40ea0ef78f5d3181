use std::fs;
use std::path::Path;

use tempfile::tempdir;

use crate::dataset::{build, load_dataset, DataSources, SplitOptions};
use crate::error::CoreError;
use crate::pca::PcaTrainer;
use crate::pipeline::{AnomalyModel, Trainer};
use crate::record::SensorRecord;

const HEADER: &str = "datetime;Accelerometer1RMS;Accelerometer2RMS;Current;Pressure;\
Temperature;Thermocouple;Voltage;Volume Flow RateRMS;anomaly;changepoint";

fn write_rows(path: &Path, prefix: &str, n: usize) {
    let mut text = format!("{HEADER}\n");
    for i in 0..n {
        let t = 1.0 + i as f32 * 0.1 + 0.003 * (i * i % 11) as f32;
        text.push_str(&format!(
            "{prefix}{i};{};{};{};{};{};{};{};{};0;0\n",
            0.2 * t,
            0.25 * t,
            1.5 * t,
            0.4 * t,
            70.0 * t,
            25.0 * t,
            230.0 * t,
            120.0 * t
        ));
    }
    fs::write(path, text).unwrap();
}

#[test]
fn folders_add_to_baseline() {
    let dir = tempdir().unwrap();
    let baseline = dir.path().join("anomaly-free.csv");
    write_rows(&baseline, "free", 7);
    for name in ["valve1", "valve2"] {
        let folder = dir.path().join(name);
        fs::create_dir(&folder).unwrap();
        write_rows(&folder.join("0.csv"), name, 5);
    }

    let sources = DataSources {
        baseline,
        folders: vec![dir.path().join("valve1"), dir.path().join("valve2")],
    };
    let all = load_dataset(&sources).unwrap();
    assert_eq!(all.len(), 7 + 10);
    assert_eq!(all.records()[0].timestamp, "free0");
    assert_eq!(all.records()[7].timestamp, "valve10");
    assert_eq!(all.records()[12].timestamp, "valve20");

    let split = build(&sources, SplitOptions { test_fraction: 0.2, seed: Some(5) }).unwrap();
    assert_eq!(split.train.len() + split.test.len(), 17);
    assert_eq!(split.test.len(), 3);
}

#[test]
fn all_sources_empty_is_an_error() {
    let dir = tempdir().unwrap();
    let baseline = dir.path().join("anomaly-free.csv");
    fs::write(&baseline, format!("{HEADER}\n;1;1;1;1;1;1;1;1;0;0\n")).unwrap();
    let folder = dir.path().join("other");
    fs::create_dir(&folder).unwrap();

    let sources = DataSources { baseline, folders: vec![folder] };
    assert!(matches!(
        build(&sources, SplitOptions::default()),
        Err(CoreError::EmptyDataset)
    ));
}

#[test]
fn missing_folder_fails_the_build() {
    let dir = tempdir().unwrap();
    let baseline = dir.path().join("anomaly-free.csv");
    write_rows(&baseline, "free", 3);
    let sources = DataSources {
        baseline,
        folders: vec![dir.path().join("valve1")],
    };
    assert!(matches!(
        build(&sources, SplitOptions::default()),
        Err(CoreError::NotFound(_))
    ));
}

#[test]
fn train_then_score_test_split_and_sample() {
    let dir = tempdir().unwrap();
    let baseline = dir.path().join("anomaly-free.csv");
    write_rows(&baseline, "free", 50);

    let sources = DataSources { baseline, folders: Vec::new() };
    let split = build(&sources, SplitOptions { test_fraction: 0.2, seed: Some(9) }).unwrap();
    let model = PcaTrainer::default().fit(&split.train).unwrap();

    let scores = model.score_all(split.test.records());
    assert_eq!(scores.len(), 10);
    // every row lies on one line through feature space
    assert!(scores.iter().all(|s| *s < 0.05), "{scores:?}");

    let sample = SensorRecord::from_features(
        "10.03.2020 14:00",
        [0.28, 0.30, 1.75, 0.45, 72.3, 26.5, 230.0, 120.0],
    );
    let s = model.score(&sample);
    assert!(s.is_finite() && (0.0..=1.0).contains(&s));
}
