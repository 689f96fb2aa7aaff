//! # deploysort
//!
//! The deploysort application library: manifest loading, the stage registry
//! that feeds the ordering engine, and the CLI built on top of them.
//!
//! ```text
//! manifest (TOML/JSON) ──► StageRegistry ──► deploysort-core ──► sort / graph / check
//!                          (hint pre-sort)    (THE LOGIC)
//! ```

pub mod cli;
pub mod error;
pub mod manifest;
pub mod registry;

pub use error::CliError;
pub use manifest::{Manifest, ManifestFormat, ManifestSettings};
pub use registry::StageRegistry;
