//! reckon-loader: rule-pack loading from JSON and YAML documents.
//!
//! Packs load from strings or from files, where the extension picks the
//! format. Every load path validates the pack's identity fields before
//! handing it to the caller; unknown top-level keys are ignored.

use std::fs;
use std::path::Path;

use reckon_core::{EngineError, RulePack};
use thiserror::Error;

/// Errors surfaced while loading a rule pack.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read rule pack from {path}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse rule pack JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("failed to parse rule pack YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("unsupported rule pack format: '{extension}' (use .json or .yaml)")]
    UnsupportedFormat { extension: String },

    #[error("invalid rule pack: {0}")]
    Invalid(#[from] EngineError),
}

/// Loads a rule pack from a file, dispatching on its extension.
pub fn load_from_file(path: impl AsRef<Path>) -> Result<RulePack, LoadError> {
    let path = path.as_ref();
    let raw = fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: path.display().to_string(),
        source,
    })?;

    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or_default()
        .to_ascii_lowercase();
    match extension.as_str() {
        "json" => from_json_str(&raw),
        "yaml" | "yml" => from_yaml_str(&raw),
        other => Err(LoadError::UnsupportedFormat {
            extension: other.to_string(),
        }),
    }
}

/// Parses and validates a rule pack from JSON text.
pub fn from_json_str(raw: &str) -> Result<RulePack, LoadError> {
    let pack: RulePack = serde_json::from_str(raw)?;
    pack.validate()?;
    Ok(pack)
}

/// Parses and validates a rule pack from YAML text.
pub fn from_yaml_str(raw: &str) -> Result<RulePack, LoadError> {
    let pack: RulePack = serde_yaml::from_str(raw)?;
    pack.validate()?;
    Ok(pack)
}

// ──────────────────────────────────────────────
// Tests
// ──────────────────────────────────────────────
