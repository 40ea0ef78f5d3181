//! Model artifact persistence.
//!
//! A saved model is a JSON envelope around the serialized [`PcaModel`]:
//!
//! ```json
//! { "format": "skab-pca", "version": 1, "id": "...", "created_at": "...",
//!   "checksum": "<blake3 hex of payload>", "payload": { ... } }
//! ```
//!
//! The checksum covers the canonical JSON bytes of `payload`, so any edit to
//! the stored parameters is detected on load.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use log::info;
use serde::{Deserialize, Serialize};
use skab_core::PcaModel;
use thiserror::Error;
use uuid::Uuid;

pub const FORMAT: &str = "skab-pca";
pub const FORMAT_VERSION: u32 = 1;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("io error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("not a model artifact: {0}")]
    Format(String),
    #[error("unsupported artifact version {0}")]
    UnsupportedVersion(u32),
    #[error("checksum mismatch: stored {stored}, computed {computed}")]
    ChecksumMismatch { stored: String, computed: String },
}

pub type Result<T> = std::result::Result<T, StoreError>;

/// Identity of a stored artifact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactInfo {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub checksum: [u8; 32],
}

#[derive(Debug, Serialize, Deserialize)]
struct Envelope {
    format: String,
    version: u32,
    id: Uuid,
    created_at: DateTime<Utc>,
    checksum: String,
    payload: serde_json::Value,
}

fn digest(payload: &serde_json::Value) -> Result<[u8; 32]> {
    let bytes = serde_json::to_vec(payload)?;
    Ok(*blake3::hash(&bytes).as_bytes())
}

/// Write `model` to `path`, replacing any existing file.
pub fn save_model(model: &PcaModel, path: &Path) -> Result<ArtifactInfo> {
    let payload = serde_json::to_value(model)?;
    let checksum = digest(&payload)?;
    let envelope = Envelope {
        format: FORMAT.to_string(),
        version: FORMAT_VERSION,
        id: Uuid::new_v4(),
        created_at: Utc::now(),
        checksum: hex::encode(checksum),
        payload,
    };

    let io_err = |path: &Path| {
        let path = path.to_path_buf();
        move |source| StoreError::Io { path, source }
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(io_err(parent))?;
    }

    let tmp = path.with_extension("tmp");
    let bytes = serde_json::to_vec_pretty(&envelope)?;
    fs::write(&tmp, bytes).map_err(io_err(tmp.as_path()))?;
    if let Err(source) = fs::rename(&tmp, path) {
        let _ = fs::remove_file(&tmp);
        return Err(io_err(path)(source));
    }

    info!("saved model {} to {}", envelope.id, path.display());
    Ok(ArtifactInfo {
        id: envelope.id,
        created_at: envelope.created_at,
        checksum,
    })
}

/// Read and verify a model written by [`save_model`].
pub fn load_model(path: &Path) -> Result<(PcaModel, ArtifactInfo)> {
    let bytes = fs::read(path).map_err(|source| StoreError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let envelope: Envelope = serde_json::from_slice(&bytes)?;

    if envelope.format != FORMAT {
        return Err(StoreError::Format(format!(
            "format tag {:?}, expected {FORMAT:?}",
            envelope.format
        )));
    }
    if envelope.version != FORMAT_VERSION {
        return Err(StoreError::UnsupportedVersion(envelope.version));
    }

    let checksum = digest(&envelope.payload)?;
    let computed = hex::encode(checksum);
    if computed != envelope.checksum {
        return Err(StoreError::ChecksumMismatch {
            stored: envelope.checksum,
            computed,
        });
    }

    let model: PcaModel = serde_json::from_value(envelope.payload)?;
    model
        .check()
        .map_err(|e| StoreError::Format(e.to_string()))?;

    info!("loaded model {} from {}", envelope.id, path.display());
    Ok((
        model,
        ArtifactInfo {
            id: envelope.id,
            created_at: envelope.created_at,
            checksum,
        },
    ))
}
