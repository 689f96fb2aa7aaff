//! # Stage Manifest
//!
//! Loads the stage list and sequencer settings from a TOML or JSON file.
//!
//! ```toml
//! [sequencer]
//! terminal_policy = "exclusive"
//! order_by_hint = true
//!
//! [[stage]]
//! name = "parse"
//! provides = "metadata"
//! relative_order = 100
//!
//! [[stage]]
//! name = "install"
//! terminal = true
//! ```

use crate::error::CliError;
use deploysort_core::{SequencerConfig, Stage, TerminalPolicy};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

// =============================================================================
// LIMITS
// =============================================================================

/// Maximum manifest file size (10 MB).
pub const MAX_MANIFEST_FILE_SIZE: u64 = 10 * 1024 * 1024;

/// Maximum number of stages in one manifest.
pub const MAX_STAGE_COUNT: usize = 10_000;

// =============================================================================
// MANIFEST TYPES
// =============================================================================

/// The `[sequencer]` table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ManifestSettings {
    /// What to do when several stages are flagged terminal.
    pub terminal_policy: TerminalPolicy,
    /// Pre-sort stages by `relative_order` before sequencing.
    pub order_by_hint: bool,
}

impl ManifestSettings {
    /// The part of the settings the ordering engine consumes.
    #[must_use]
    pub fn sequencer_config(&self) -> SequencerConfig {
        SequencerConfig {
            terminal_policy: self.terminal_policy,
        }
    }
}

/// A parsed stage manifest.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
    #[serde(default)]
    pub sequencer: ManifestSettings,
    #[serde(default, rename = "stage", alias = "stages")]
    pub stages: Vec<Stage>,
}

/// Manifest encodings, picked by file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ManifestFormat {
    Toml,
    Json,
}

impl ManifestFormat {
    /// `.json` files are JSON; everything else is TOML.
    #[must_use]
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => Self::Json,
            _ => Self::Toml,
        }
    }
}

impl Manifest {
    /// Read, parse and validate a manifest file.
    pub fn load(path: &Path) -> Result<Self, CliError> {
        let validated = validate_file_path(path)?;
        validate_file_size(&validated, MAX_MANIFEST_FILE_SIZE)?;

        let contents = std::fs::read_to_string(&validated)
            .map_err(|e| CliError::Io(format!("Read '{}': {}", path.display(), e)))?;

        tracing::debug!("Loading manifest {:?}", validated);
        Self::parse(&contents, ManifestFormat::from_path(&validated))
    }

    /// Parse and validate manifest text.
    pub fn parse(contents: &str, format: ManifestFormat) -> Result<Self, CliError> {
        let manifest: Self = match format {
            ManifestFormat::Toml => {
                toml::from_str(contents).map_err(|e| CliError::Manifest(e.to_string()))?
            }
            ManifestFormat::Json => {
                serde_json::from_str(contents).map_err(|e| CliError::Manifest(e.to_string()))?
            }
        };
        manifest.validate()?;
        Ok(manifest)
    }

    /// Reject oversized manifests and unnamed stages.
    pub fn validate(&self) -> Result<(), CliError> {
        if self.stages.len() > MAX_STAGE_COUNT {
            return Err(CliError::Manifest(format!(
                "Stage count {} exceeds maximum allowed {}",
                self.stages.len(),
                MAX_STAGE_COUNT
            )));
        }

        if let Some(position) = self.stages.iter().position(|s| s.name.trim().is_empty()) {
            return Err(CliError::Manifest(format!(
                "Stage #{} has an empty name",
                position + 1
            )));
        }

        Ok(())
    }
}

// =============================================================================
// FILE VALIDATION
// =============================================================================

/// Validate file size before reading.
fn validate_file_size(path: &Path, max_size: u64) -> Result<(), CliError> {
    let metadata = std::fs::metadata(path)
        .map_err(|e| CliError::Io(format!("Cannot read file metadata: {}", e)))?;

    if metadata.len() > max_size {
        return Err(CliError::Manifest(format!(
            "File size {} bytes exceeds maximum allowed {} bytes",
            metadata.len(),
            max_size
        )));
    }
    Ok(())
}

/// Canonicalize the path and make sure it names a regular file.
fn validate_file_path(path: &Path) -> Result<PathBuf, CliError> {
    let canonical = path
        .canonicalize()
        .map_err(|e| CliError::Io(format!("Invalid file path '{}': {}", path.display(), e)))?;

    if !canonical.is_file() {
        return Err(CliError::Io(format!(
            "Path '{}' is not a regular file",
            path.display()
        )));
    }

    Ok(canonical)
}
