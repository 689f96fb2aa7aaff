//! # Core Type Definitions
//!
//! This module contains the core types of the deploysort ordering engine:
//! - Capability labels (`Label`, `LabelSet`)
//! - The caller contract (`StageDescriptor`) and its concrete form (`Stage`)
//! - Cycle diagnostics (`CycleReport`, `ResidualStage`, `ResidualEdge`)
//! - Error types (`SequencerError`)
//!
//! ## Determinism Guarantees
//!
//! All label collections in this module:
//! - Implement `Ord` for deterministic ordering in `BTreeMap`/`BTreeSet`
//! - Collapse duplicates, so the order labels were written in never matters

use crate::primitives::tokenize_labels;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use thiserror::Error;

// =============================================================================
// CAPABILITY LABELS
// =============================================================================

/// An opaque capability token that stages provide or require.
///
/// The engine never interprets a label; two labels are the same capability
/// exactly when their strings are equal.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Label(pub String);

impl Label {
    /// Create a new label from a string.
    #[must_use]
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// Get the label as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A set of capability labels. Ordered so iteration is deterministic.
pub type LabelSet = BTreeSet<Label>;

// =============================================================================
// STAGE DESCRIPTOR (Caller Contract)
// =============================================================================

/// The contract a caller supplies for every stage to be ordered.
///
/// Label lists are exposed in their external, delimited form (see
/// [`crate::primitives::LABEL_DELIMITERS`]); the graph builder tokenizes them.
///
/// # Extension Point
///
/// The sequencer is generic over this trait and returns references to the
/// caller's own values, so a deployment framework can order its native stage
/// objects without converting them into [`Stage`].
pub trait StageDescriptor {
    /// Name used in diagnostics only. Never consulted for ordering.
    fn name(&self) -> &str;

    /// Delimited list of labels this stage produces.
    fn provides(&self) -> Option<&str>;

    /// Delimited list of labels this stage consumes.
    fn requires(&self) -> Option<&str>;

    /// Whether this stage is pinned to run last.
    fn is_terminal(&self) -> bool;

    /// Advisory ordering hint for collaborators that pre-sort their stages.
    ///
    /// The graph builder and sorter never read it.
    fn relative_order(&self) -> i32 {
        0
    }
}

impl<S: StageDescriptor + ?Sized> StageDescriptor for &S {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn provides(&self) -> Option<&str> {
        (**self).provides()
    }

    fn requires(&self) -> Option<&str> {
        (**self).requires()
    }

    fn is_terminal(&self) -> bool {
        (**self).is_terminal()
    }

    fn relative_order(&self) -> i32 {
        (**self).relative_order()
    }
}

// =============================================================================
// STAGE
// =============================================================================

/// A plain stage descriptor, as read from a manifest.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Stage {
    /// Stage name (diagnostics only).
    pub name: String,
    /// Delimited list of provided labels.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provides: Option<String>,
    /// Delimited list of required labels.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub requires: Option<String>,
    /// Pins this stage to the end of the order.
    #[serde(default)]
    pub terminal: bool,
    /// Advisory hint; see [`StageDescriptor::relative_order`].
    #[serde(default)]
    pub relative_order: i32,
}

impl Stage {
    /// Create a stage with no labels.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Set the provided labels.
    #[must_use]
    pub fn providing(mut self, labels: impl Into<String>) -> Self {
        self.provides = Some(labels.into());
        self
    }

    /// Set the required labels.
    #[must_use]
    pub fn requiring(mut self, labels: impl Into<String>) -> Self {
        self.requires = Some(labels.into());
        self
    }

    /// Mark this stage as the terminal stage.
    #[must_use]
    pub fn terminal(mut self) -> Self {
        self.terminal = true;
        self
    }

    /// Set the advisory relative order hint.
    #[must_use]
    pub fn with_relative_order(mut self, order: i32) -> Self {
        self.relative_order = order;
        self
    }

    /// Tokenized provided labels.
    #[must_use]
    pub fn provided_labels(&self) -> LabelSet {
        tokenize_labels(self.provides.as_deref())
    }

    /// Tokenized required labels.
    #[must_use]
    pub fn required_labels(&self) -> LabelSet {
        tokenize_labels(self.requires.as_deref())
    }
}

impl StageDescriptor for Stage {
    fn name(&self) -> &str {
        &self.name
    }

    fn provides(&self) -> Option<&str> {
        self.provides.as_deref()
    }

    fn requires(&self) -> Option<&str> {
        self.requires.as_deref()
    }

    fn is_terminal(&self) -> bool {
        self.terminal
    }

    fn relative_order(&self) -> i32 {
        self.relative_order
    }
}

// =============================================================================
// CYCLE DIAGNOSTICS
// =============================================================================

/// A stage left unresolved when the sorter stalled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResidualStage {
    /// Position of the stage in the caller's input.
    pub index: usize,
    /// Stage name.
    pub name: String,
    /// Incoming edges that were never satisfied.
    pub pending: usize,
}

/// An edge between two unresolved stages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResidualEdge {
    /// Input index of the source stage.
    pub from: usize,
    /// Input index of the target stage.
    pub to: usize,
    /// The label that created the edge.
    pub label: Label,
}

/// Everything left in the graph after the reduction pass stalled.
///
/// The residual stages and edges contain at least one cycle. Stages that
/// merely sit downstream of a cycle are reported too.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CycleReport {
    /// Unresolved stages in input order.
    pub stages: Vec<ResidualStage>,
    /// Surviving edges among the unresolved stages.
    pub edges: Vec<ResidualEdge>,
}

impl CycleReport {
    /// Input indices of the unresolved stages.
    #[must_use]
    pub fn indices(&self) -> Vec<usize> {
        self.stages.iter().map(|s| s.index).collect()
    }

    /// Names of the unresolved stages.
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        self.stages.iter().map(|s| s.name.as_str()).collect()
    }

    /// Distinct labels carried by the surviving edges.
    #[must_use]
    pub fn labels(&self) -> LabelSet {
        self.edges.iter().map(|e| e.label.clone()).collect()
    }

    fn name_of(&self, index: usize) -> &str {
        self.stages
            .iter()
            .find(|s| s.index == index)
            .map_or("?", |s| s.name.as_str())
    }
}

impl fmt::Display for CycleReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unresolved stages [{}]", self.names().join(", "))?;
        if !self.edges.is_empty() {
            let edges: Vec<String> = self
                .edges
                .iter()
                .map(|e| format!("{} -({})-> {}", self.name_of(e.from), e.label, self.name_of(e.to)))
                .collect();
            write!(f, "; edges: {}", edges.join(", "))?;
        }
        Ok(())
    }
}

// =============================================================================
// ERROR TYPES
// =============================================================================

/// Errors that can occur while sequencing stages.
///
/// - No silent failures and no partial orders
/// - Every variant is fatal for the current call
/// - The engine never panics; invariant breaches surface as `InvariantViolation`
#[derive(Debug, Error)]
pub enum SequencerError {
    /// No stage in the input is flagged terminal.
    #[error("No terminal stage in input")]
    MissingTerminalStage,

    /// More than one stage is flagged terminal under the exclusive policy.
    #[error("Multiple terminal stages: '{first}' and '{second}'")]
    MultipleTerminalStages {
        /// Name of the first terminal stage found.
        first: String,
        /// Name of the second terminal stage found.
        second: String,
    },

    /// The dependency graph contains at least one cycle.
    #[error("Cycle detected: {0}")]
    CycleDetected(CycleReport),

    /// Internal bookkeeping went wrong. Indicates a graph builder bug.
    #[error("Invariant violation: {0}")]
    InvariantViolation(String),
}

// =============================================================================
// TESTS
// =============================================================================
