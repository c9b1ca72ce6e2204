use crate::error::{ReadflowError, Result};
use chrono::Utc;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize)]
pub struct RunManifest {
    pub tool: String,
    pub version: String,
    pub generated_at: String,
    pub output_dir: String,
    pub entries: Vec<ManifestEntry>,
}

impl RunManifest {
    pub fn new(tool: &str, output_dir: &Path, entries: Vec<ManifestEntry>) -> Self {
        Self {
            tool: tool.to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            generated_at: Utc::now().to_rfc3339(),
            output_dir: output_dir.display().to_string(),
            entries,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ManifestEntry {
    pub source: PathBuf,
    pub destination: PathBuf,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sha256: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exit_code: Option<i32>,
    pub ok: bool,
}

pub fn write_manifest(path: &Path, manifest: &RunManifest) -> Result<()> {
    let json = serde_json::to_string_pretty(manifest)?;
    fs::write(path, json).map_err(|e| ReadflowError::file(path, e))?;
    Ok(())
}
