//! # deploysort-core
//!
//! The deterministic stage ordering engine for deploysort - THE LOGIC.
//!
//! Every stage declares the capability labels it provides and requires. The
//! engine derives a dependency graph from those labels and sorts it so that:
//! - producers of a label run before its consumers
//! - stages that require *and* provide a label (modifiers) run between them
//! - the one stage flagged terminal runs last, whatever its labels say
//!
//! ## Pipeline
//!
//! ```text
//! Sequencer ──► Graph::build ──► DependencyIndex ──► TopologicalSorter ──► order
//! (terminal)    (vertices,       (label → roles)     (Kahn, cycle
//!                partitions)                          report)
//! ```
//!
//! ## Architectural Constraints
//!
//! - Synchronous and pure: NO async, NO I/O
//! - Stateless: each call builds and discards its own graph
//! - Deterministic: ties between independent stages resolve by input order
//! - Never panics: failures are `SequencerError` values
//!
//! ## Example
//!
//! ```
//! use deploysort_core::{Sequencer, Stage};
//!
//! let stages = vec![
//!     Stage::new("install").terminal(),
//!     Stage::new("consume").requiring("metadata"),
//!     Stage::new("parse").providing("metadata"),
//! ];
//!
//! let order = Sequencer::new().sequence(&stages).expect("acyclic");
//! let names: Vec<_> = order.iter().map(|s| s.name.as_str()).collect();
//! assert_eq!(names, ["parse", "consume", "install"]);
//! ```

// =============================================================================
// MODULES
// =============================================================================

pub mod graph;
pub mod index;
pub mod plan;
pub mod primitives;
pub mod sequencer;
pub mod sorter;
pub mod types;

// =============================================================================
// RE-EXPORTS: Core Types (from types module)
// =============================================================================

pub use types::{
    CycleReport, Label, LabelSet, ResidualEdge, ResidualStage, SequencerError, Stage,
    StageDescriptor,
};

// =============================================================================
// RE-EXPORTS: Engine
// =============================================================================

pub use graph::{Edge, Graph, LabelPartition, Vertex, VertexId};
pub use index::{Dependency, DependencyIndex, Role};
pub use plan::{PlanEdge, PlanStep, SequencePlan};
pub use primitives::{LABEL_DELIMITERS, tokenize_labels};
pub use sequencer::{Sequencer, SequencerConfig, TerminalPolicy};
pub use sorter::TopologicalSorter;
