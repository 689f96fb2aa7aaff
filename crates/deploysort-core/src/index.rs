//! # Dependency Index
//!
//! Maps every capability label seen during one sort call to the vertices
//! that produce, modify or consume it.
//!
//! A stage plays exactly one role per label: a label it both provides and
//! requires makes it a modifier, never a producer and a consumer at once.

use crate::graph::VertexId;
use crate::types::Label;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// The role a stage plays with respect to one label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Provides the label without requiring it.
    Producer,
    /// Requires and re-provides the label.
    Modifier,
    /// Requires the label without providing it.
    Consumer,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Role::Producer => "producer",
            Role::Modifier => "modifier",
            Role::Consumer => "consumer",
        })
    }
}

/// The vertices referencing one label, grouped by role.
///
/// Each list is in registration order, which is the caller's input order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Dependency {
    /// Stages that provide the label without requiring it.
    pub producers: Vec<VertexId>,
    /// Stages that both require and provide the label.
    pub modifiers: Vec<VertexId>,
    /// Stages that require the label without providing it.
    pub consumers: Vec<VertexId>,
}

impl Dependency {
    /// Vertices holding the given role.
    #[must_use]
    pub fn with_role(&self, role: Role) -> &[VertexId] {
        match role {
            Role::Producer => &self.producers,
            Role::Modifier => &self.modifiers,
            Role::Consumer => &self.consumers,
        }
    }

    /// Edges this label contributes, as `(from, to)` pairs.
    ///
    /// With modifiers present, traffic is forced through them: every producer
    /// feeds every modifier and every modifier feeds every consumer. Without
    /// modifiers, every producer feeds every consumer directly.
    pub fn edges(&self) -> impl Iterator<Item = (VertexId, VertexId)> + '_ {
        let (first, second): (Vec<_>, Vec<_>) = if self.modifiers.is_empty() {
            (cartesian(&self.producers, &self.consumers), Vec::new())
        } else {
            (
                cartesian(&self.producers, &self.modifiers),
                cartesian(&self.modifiers, &self.consumers),
            )
        };
        first.into_iter().chain(second)
    }

    /// Whether this label constrains ordering at all.
    #[must_use]
    pub fn is_inert(&self) -> bool {
        self.edges().next().is_none()
    }
}

fn cartesian(from: &[VertexId], to: &[VertexId]) -> Vec<(VertexId, VertexId)> {
    from.iter()
        .flat_map(|&f| to.iter().map(move |&t| (f, t)))
        .collect()
}

/// Label → [`Dependency`] for one sort call.
///
/// Uses `BTreeMap` so labels are visited in lexicographic order.
#[derive(Debug, Clone, Default)]
pub struct DependencyIndex {
    entries: BTreeMap<Label, Dependency>,
}

impl DependencyIndex {
    /// Create an empty index.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that `vertex` plays `role` for `label`.
    pub fn register(&mut self, label: Label, role: Role, vertex: VertexId) {
        let entry = self.entries.entry(label).or_default();
        match role {
            Role::Producer => entry.producers.push(vertex),
            Role::Modifier => entry.modifiers.push(vertex),
            Role::Consumer => entry.consumers.push(vertex),
        }
    }

    /// Look up the dependency entry for a label.
    #[must_use]
    pub fn get(&self, label: &Label) -> Option<&Dependency> {
        self.entries.get(label)
    }

    /// All entries in label order.
    pub fn iter(&self) -> impl Iterator<Item = (&Label, &Dependency)> {
        self.entries.iter()
    }

    /// Number of distinct labels.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no label has been registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
