//! # Graph Builder
//!
//! Builds the transient dependency graph for one sort call.
//!
//! Vertices live in an arena indexed by [`VertexId`], created in the caller's
//! input order. Edges are adjacency lists of arena indices, each tagged with
//! the label that created it. Labels are visited through the
//! [`DependencyIndex`] in lexicographic order, so the same input always yields
//! the same graph.

use crate::index::{DependencyIndex, Role};
use crate::primitives::tokenize_labels;
use crate::types::{Label, LabelSet, StageDescriptor};
use serde::{Deserialize, Serialize};

// =============================================================================
// VERTEX
// =============================================================================

/// Index of a vertex in the graph's arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct VertexId(pub usize);

/// A directed edge to another vertex, created by one label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Edge {
    /// Target vertex.
    pub to: VertexId,
    /// Label whose producer/modifier/consumer roles created this edge.
    pub label: Label,
}

/// One non-terminal stage for the duration of a sort call.
#[derive(Debug, Clone)]
pub struct Vertex {
    /// Position of the wrapped stage in the caller's input.
    pub(crate) stage: usize,
    pub(crate) name: String,
    /// Unresolved incoming edges. Only the sorter decrements it.
    pub(crate) in_degree: usize,
    pub(crate) out_edges: Vec<Edge>,
}

impl Vertex {
    /// Input index of the wrapped stage.
    #[must_use]
    pub fn stage(&self) -> usize {
        self.stage
    }

    /// Name of the wrapped stage.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of incoming edges.
    #[must_use]
    pub fn in_degree(&self) -> usize {
        self.in_degree
    }

    /// Outgoing edges in creation order.
    #[must_use]
    pub fn out_edges(&self) -> &[Edge] {
        &self.out_edges
    }
}

// =============================================================================
// LABEL PARTITION
// =============================================================================

/// A stage's labels split by role. The three sets are pairwise disjoint.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelPartition {
    /// Provided but not required.
    pub produces: LabelSet,
    /// Required but not provided.
    pub consumes: LabelSet,
    /// Both required and provided.
    pub modifies: LabelSet,
}

impl LabelPartition {
    /// Tokenize a stage's label strings and split them by role.
    #[must_use]
    pub fn of<S: StageDescriptor + ?Sized>(stage: &S) -> Self {
        let mut consumes = tokenize_labels(stage.requires());
        let mut produces = tokenize_labels(stage.provides());

        let modifies: LabelSet = consumes.intersection(&produces).cloned().collect();
        consumes.retain(|label| !modifies.contains(label));
        produces.retain(|label| !modifies.contains(label));

        Self {
            produces,
            consumes,
            modifies,
        }
    }

    /// Labels paired with the role they play, consumers first.
    pub fn roles(&self) -> impl Iterator<Item = (&Label, Role)> {
        self.consumes
            .iter()
            .map(|l| (l, Role::Consumer))
            .chain(self.modifies.iter().map(|l| (l, Role::Modifier)))
            .chain(self.produces.iter().map(|l| (l, Role::Producer)))
    }

    /// Whether the stage references no labels at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.produces.is_empty() && self.consumes.is_empty() && self.modifies.is_empty()
    }
}

// =============================================================================
// GRAPH
// =============================================================================

/// The working graph of one sort call.
#[derive(Debug, Clone, Default)]
pub struct Graph {
    pub(crate) vertices: Vec<Vertex>,
    partitions: Vec<LabelPartition>,
    index: DependencyIndex,
    edge_count: usize,
}

impl Graph {
    /// Build the graph for the given non-terminal stages.
    ///
    /// Each item pairs a stage with its position in the caller's input; the
    /// position is what the sorter emits. Vertices are registered in
    /// iteration order, then edges are derived label by label.
    pub fn build<'a, S, I>(stages: I) -> Self
    where
        S: StageDescriptor + ?Sized + 'a,
        I: IntoIterator<Item = (usize, &'a S)>,
    {
        let mut vertices: Vec<Vertex> = Vec::new();
        let mut partitions = Vec::new();
        let mut index = DependencyIndex::new();

        for (position, stage) in stages {
            let id = VertexId(vertices.len());
            let partition = LabelPartition::of(stage);

            for (label, role) in partition.roles() {
                index.register(label.clone(), role, id);
            }

            vertices.push(Vertex {
                stage: position,
                name: stage.name().to_string(),
                in_degree: 0,
                out_edges: Vec::new(),
            });
            partitions.push(partition);
        }

        let mut edge_count = 0usize;
        for (label, dependency) in index.iter() {
            for (from, to) in dependency.edges() {
                vertices[to.0].in_degree = vertices[to.0].in_degree.saturating_add(1);
                vertices[from.0].out_edges.push(Edge {
                    to,
                    label: label.clone(),
                });
                edge_count = edge_count.saturating_add(1);
            }
        }

        tracing::debug!(
            vertices = vertices.len(),
            labels = index.len(),
            edges = edge_count,
            "dependency graph built"
        );

        Self {
            vertices,
            partitions,
            index,
            edge_count,
        }
    }

    /// All vertices in arena order.
    pub fn vertices(&self) -> impl Iterator<Item = &Vertex> {
        self.vertices.iter()
    }

    /// Look up a vertex.
    #[must_use]
    pub fn vertex(&self, id: VertexId) -> Option<&Vertex> {
        self.vertices.get(id.0)
    }

    /// Label partition of a vertex.
    #[must_use]
    pub fn partition(&self, id: VertexId) -> Option<&LabelPartition> {
        self.partitions.get(id.0)
    }

    /// The label index the edges were derived from.
    #[must_use]
    pub fn index(&self) -> &DependencyIndex {
        &self.index
    }

    /// All edges as `(from_stage, to_stage, label)`, using input indices.
    pub fn edges(&self) -> impl Iterator<Item = (usize, usize, &Label)> + '_ {
        self.vertices.iter().flat_map(move |v| {
            v.out_edges
                .iter()
                .filter_map(move |e| self.vertices.get(e.to.0).map(|t| (v.stage, t.stage, &e.label)))
        })
    }

    /// Number of vertices.
    #[must_use]
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    /// Number of edges, counting parallel edges separately.
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.edge_count
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Stage;

    fn build(stages: &[Stage]) -> Graph {
        Graph::build(stages.iter().enumerate())
    }

    fn edge_list(graph: &Graph) -> Vec<(usize, usize, String)> {
        graph
            .edges()
            .map(|(f, t, l)| (f, t, l.as_str().to_string()))
            .collect()
    }

    #[test]
    fn partition_splits_intersection() {
        let stage = Stage::new("m").requiring("x, a").providing("x b");
        let partition = LabelPartition::of(&stage);

        assert_eq!(partition.modifies, LabelSet::from([Label::new("x")]));
        assert_eq!(partition.consumes, LabelSet::from([Label::new("a")]));
        assert_eq!(partition.produces, LabelSet::from([Label::new("b")]));
    }

    #[test]
    fn empty_stage_partition_is_empty() {
        assert!(LabelPartition::of(&Stage::new("e")).is_empty());
    }

    #[test]
    fn no_labels_no_edges() {
        let graph = build(&[Stage::new("a"), Stage::new("b")]);
        assert_eq!(graph.vertex_count(), 2);
        assert_eq!(graph.edge_count(), 0);
        assert!(graph.vertices().all(|v| v.in_degree() == 0));
    }

    #[test]
    fn producer_to_consumer_edge() {
        let graph = build(&[Stage::new("a").providing("x"), Stage::new("b").requiring("x")]);
        assert_eq!(edge_list(&graph), vec![(0, 1, "x".to_string())]);
        assert_eq!(graph.vertex(VertexId(1)).map(Vertex::in_degree), Some(1));
    }

    #[test]
    fn modifier_replaces_direct_edge() {
        let graph = build(&[
            Stage::new("a").providing("x"),
            Stage::new("m").requiring("x").providing("x"),
            Stage::new("b").requiring("x"),
        ]);

        let edges = edge_list(&graph);
        assert_eq!(
            edges,
            vec![(0, 1, "x".to_string()), (1, 2, "x".to_string())]
        );
    }

    #[test]
    fn bipartite_edges_exceed_stage_count() {
        let graph = build(&[
            Stage::new("p1").providing("x"),
            Stage::new("p2").providing("x"),
            Stage::new("m1").requiring("x").providing("x"),
            Stage::new("m2").requiring("x").providing("x"),
            Stage::new("c1").requiring("x"),
            Stage::new("c2").requiring("x"),
        ]);

        assert_eq!(graph.edge_count(), 8);
        assert!(graph.edge_count() > graph.vertex_count());
        assert_eq!(graph.vertex(VertexId(2)).map(Vertex::in_degree), Some(2));
        assert_eq!(graph.vertex(VertexId(4)).map(Vertex::in_degree), Some(2));
    }

    #[test]
    fn lone_modifier_is_inert() {
        let graph = build(&[Stage::new("m").requiring("x").providing("x"), Stage::new("o")]);
        assert_eq!(graph.edge_count(), 0);
        let dep = graph.index().get(&Label::new("x")).expect("x indexed");
        assert_eq!(dep.modifiers, vec![VertexId(0)]);
        assert!(dep.producers.is_empty());
    }

    #[test]
    fn parallel_edges_count_separately() {
        let graph = build(&[
            Stage::new("a").providing("x y"),
            Stage::new("b").requiring("x,y"),
        ]);
        assert_eq!(graph.edge_count(), 2);
        assert_eq!(graph.vertex(VertexId(1)).map(Vertex::in_degree), Some(2));
    }

    #[test]
    fn input_positions_are_preserved() {
        let stages = [Stage::new("a").providing("x"), Stage::new("b").requiring("x")];
        let graph = Graph::build([(7usize, &stages[0]), (3usize, &stages[1])]);
        assert_eq!(edge_list(&graph), vec![(7, 3, "x".to_string())]);
    }
}
