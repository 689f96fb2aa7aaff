//! # Application Errors
//!
//! Errors raised by the binary: everything the core can report, plus
//! manifest I/O and parsing failures.

use deploysort_core::SequencerError;
use thiserror::Error;

/// Errors surfaced by the deploysort CLI.
#[derive(Debug, Error)]
pub enum CliError {
    /// The ordering engine rejected the stage set.
    #[error(transparent)]
    Sequencer(#[from] SequencerError),

    /// Reading the manifest failed.
    #[error("I/O error: {0}")]
    Io(String),

    /// The manifest could not be parsed or failed validation.
    #[error("Manifest error: {0}")]
    Manifest(String),
}
