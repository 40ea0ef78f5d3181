//! Reading SKAB sensor files.
//!
//! Files are semicolon-delimited with one header row and fixed column
//! positions: `0` timestamp, `1..=8` channels, `9` anomaly, `10` changepoint.
//! The label columns are absent in the anomaly-free file.
//!
//! Malformed numbers are fatal. Values that parse but are not finite, and
//! rows with a blank timestamp, are dropped without error.

use std::fs::{self, File};
use std::path::{Path, PathBuf};

use csv::StringRecord;
use log::{debug, info};

use crate::error::{CoreError, Result};
use crate::record::{Channel, SensorRecord, CHANNEL_COUNT};
use crate::validation::{validate_record, RejectionCounts};

const DELIMITER: u8 = b';';
const ANOMALY_COLUMN: usize = 9;
const CHANGEPOINT_COLUMN: usize = 10;
/// Timestamp plus all channels; labels are optional.
const MIN_COLUMNS: usize = 1 + CHANNEL_COUNT;

/// Load one file, keeping only rows that satisfy the record invariant.
pub fn load_csv(path: &Path) -> Result<Vec<SensorRecord>> {
    let file = File::open(path).map_err(|source| CoreError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let mut reader = csv::ReaderBuilder::new()
        .delimiter(DELIMITER)
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(file);

    let headers = reader.headers().map_err(|source| CoreError::Csv {
        path: path.to_path_buf(),
        source,
    })?;
    let names_match = headers
        .iter()
        .skip(1)
        .take(CHANNEL_COUNT)
        .eq(Channel::ALL.iter().map(|c| c.name()));
    if !names_match {
        debug!("{}: unexpected header {:?}, reading by position", path.display(), headers);
    }

    let mut records = Vec::new();
    let mut rejected = RejectionCounts::default();

    for row in reader.records() {
        let row = row.map_err(|source| CoreError::Csv {
            path: path.to_path_buf(),
            source,
        })?;
        let record = parse_row(path, &row)?;
        match validate_record(&record) {
            Ok(()) => records.push(record),
            Err(reason) => rejected.record(reason),
        }
    }

    if rejected.total() > 0 {
        debug!(
            "{}: dropped {} rows ({} blank timestamp, {} non-finite)",
            path.display(),
            rejected.total(),
            rejected.blank_timestamp,
            rejected.non_finite
        );
    }
    debug!("{}: loaded {} records", path.display(), records.len());
    Ok(records)
}

/// Load every `*.csv` file directly inside `dir`, in file-name order.
pub fn load_folder(dir: &Path) -> Result<Vec<SensorRecord>> {
    if !dir.is_dir() {
        return Err(CoreError::NotFound(dir.to_path_buf()));
    }

    let files = csv_files(dir)?;
    let mut all = Vec::new();
    for file in &files {
        all.extend(load_csv(file)?);
    }

    info!(
        "{}: {} records from {} files",
        dir.display(),
        all.len(),
        files.len()
    );
    Ok(all)
}

fn csv_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let io_err = |source| CoreError::Io {
        path: dir.to_path_buf(),
        source,
    };

    let mut files = Vec::new();
    for entry in fs::read_dir(dir).map_err(io_err)? {
        let path = entry.map_err(io_err)?.path();
        let is_csv = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"));
        if is_csv && path.is_file() {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

fn parse_row(path: &Path, row: &StringRecord) -> Result<SensorRecord> {
    let line = row.position().map_or(0, |p| p.line());
    let parse_err = |column: usize, message: String| CoreError::Parse {
        path: path.to_path_buf(),
        line,
        column,
        message,
    };

    if row.len() < MIN_COLUMNS {
        return Err(parse_err(
            row.len(),
            format!(
                "missing column {}: expected at least {MIN_COLUMNS} columns, found {}",
                row.len(),
                row.len()
            ),
        ));
    }

    let mut features = [0f32; CHANNEL_COUNT];
    for (i, slot) in features.iter_mut().enumerate() {
        let column = i + 1;
        *slot = parse_channel(&row[column])
            .map_err(|e| parse_err(column, format!("{e}: {:?}", &row[column])))?;
    }

    let label = |column: usize| -> Result<Option<f32>> {
        match row.get(column) {
            None | Some("") => Ok(None),
            Some(cell) => cell
                .parse::<f32>()
                .map(Some)
                .map_err(|e| parse_err(column, format!("{e}: {cell:?}"))),
        }
    };

    let mut record = SensorRecord::from_features(&row[0], features);
    record.anomaly = label(ANOMALY_COLUMN)?;
    record.changepoint = label(CHANGEPOINT_COLUMN)?;
    Ok(record)
}

/// An empty cell is a missing reading and becomes NaN, which validation drops.
fn parse_channel(cell: &str) -> std::result::Result<f32, std::num::ParseFloatError> {
    if cell.is_empty() {
        Ok(f32::NAN)
    } else {
        cell.parse::<f32>()
    }
}
