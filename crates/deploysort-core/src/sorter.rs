//! # Topological Sorter
//!
//! Kahn's algorithm over a built [`Graph`], emitted level by level.
//!
//! Roots are discovered in arena order. Successors freed by one vertex are
//! appended to the back of the queue together, after that vertex's edges have
//! all been visited. With the arena in input order this makes ties resolve by
//! declaration order.

use crate::graph::{Graph, VertexId};
use crate::types::{CycleReport, ResidualEdge, ResidualStage, SequencerError};
use std::collections::VecDeque;

/// Stateless Kahn reducer.
#[derive(Debug, Clone, Copy, Default)]
pub struct TopologicalSorter;

impl TopologicalSorter {
    /// Create a new sorter.
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Consume the graph and return the input indices of its stages in
    /// dependency order.
    ///
    /// Fails with [`SequencerError::CycleDetected`] when the reduction stalls
    /// with vertices left over. The result always has one entry per vertex.
    pub fn sort(&self, mut graph: Graph) -> Result<Vec<usize>, SequencerError> {
        let total = graph.vertices.len();
        let mut live = vec![true; total];
        let mut remaining = total;
        let mut result = Vec::with_capacity(total);

        let mut roots: VecDeque<VertexId> = VecDeque::new();
        for (i, vertex) in graph.vertices.iter().enumerate() {
            if vertex.in_degree == 0 {
                live[i] = false;
                remaining -= 1;
                roots.push_back(VertexId(i));
            }
        }

        let mut freed = Vec::new();
        while let Some(current) = roots.pop_front() {
            let targets: Vec<VertexId> = graph.vertices[current.0]
                .out_edges
                .iter()
                .map(|e| e.to)
                .collect();
            result.push(graph.vertices[current.0].stage);

            for target in targets {
                let vertex = &mut graph.vertices[target.0];
                let Some(in_degree) = vertex.in_degree.checked_sub(1) else {
                    return Err(SequencerError::InvariantViolation(format!(
                        "in-degree of '{}' dropped below zero",
                        vertex.name
                    )));
                };
                vertex.in_degree = in_degree;
                if vertex.in_degree == 0 && live[target.0] {
                    live[target.0] = false;
                    remaining -= 1;
                    freed.push(target);
                }
            }
            roots.extend(freed.drain(..));
        }

        if remaining > 0 {
            let report = Self::residual(&graph, &live);
            tracing::debug!(unresolved = remaining, "reduction stalled");
            return Err(SequencerError::CycleDetected(report));
        }

        Ok(result)
    }

    /// Collect the vertices and edges still live after a stall.
    fn residual(graph: &Graph, live: &[bool]) -> CycleReport {
        let is_live = |id: VertexId| live.get(id.0).copied().unwrap_or(false);

        let mut report = CycleReport::default();
        for (i, vertex) in graph.vertices.iter().enumerate() {
            if !is_live(VertexId(i)) {
                continue;
            }
            report.stages.push(ResidualStage {
                index: vertex.stage,
                name: vertex.name.clone(),
                pending: vertex.in_degree,
            });
            for edge in vertex.out_edges.iter().filter(|e| is_live(e.to)) {
                if let Some(target) = graph.vertex(edge.to) {
                    report.edges.push(ResidualEdge {
                        from: vertex.stage,
                        to: target.stage(),
                        label: edge.label.clone(),
                    });
                }
            }
        }
        report
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Stage;

    fn sort(stages: &[Stage]) -> Result<Vec<usize>, SequencerError> {
        TopologicalSorter::new().sort(Graph::build(stages.iter().enumerate()))
    }

    fn position(order: &[usize], stage: usize) -> usize {
        order
            .iter()
            .position(|&s| s == stage)
            .expect("stage present in order")
    }

    #[test]
    fn in_degree_underflow_is_reported() {
        let stages = vec![Stage::new("A").providing("x"), Stage::new("B").requiring("x")];
        let mut graph = Graph::build(stages.iter().enumerate());
        graph.vertices[1].in_degree = 0;

        let result = TopologicalSorter::new().sort(graph);
        match result {
            Err(SequencerError::InvariantViolation(message)) => {
                assert!(message.contains("'B'"));
            }
            other => unreachable!("expected InvariantViolation, got {other:?}"),
        }
    }

    #[test]
    fn empty_graph_sorts_to_empty() {
        assert_eq!(sort(&[]).expect("sort"), Vec::<usize>::new());
    }

    #[test]
    fn independent_stages_keep_input_order() {
        let order = sort(&[Stage::new("a"), Stage::new("b"), Stage::new("c")]).expect("sort");
        assert_eq!(order, vec![0, 1, 2]);
    }

    #[test]
    fn consumer_declared_first_still_runs_second() {
        let order = sort(&[Stage::new("b").requiring("x"), Stage::new("a").providing("x")])
            .expect("sort");
        assert_eq!(order, vec![1, 0]);
    }

    #[test]
    fn freed_vertices_join_queue_after_full_pass() {
        // r frees c1 and c2 in one pass; they must follow the other root.
        let order = sort(&[
            Stage::new("r").providing("x"),
            Stage::new("other"),
            Stage::new("c1").requiring("x"),
            Stage::new("c2").requiring("x"),
        ])
        .expect("sort");
        assert_eq!(order, vec![0, 1, 2, 3]);
    }

    #[test]
    fn parallel_edges_release_once() {
        let order = sort(&[
            Stage::new("a").providing("x y"),
            Stage::new("b").requiring("x y"),
        ])
        .expect("sort");
        assert_eq!(order, vec![0, 1]);
    }

    #[test]
    fn chain_through_modifiers() {
        let order = sort(&[
            Stage::new("c").requiring("x"),
            Stage::new("m2").requiring("x").providing("x"),
            Stage::new("p").providing("x"),
            Stage::new("m1").requiring("x").providing("x"),
        ])
        .expect("sort");

        let p = position(&order, 2);
        let c = position(&order, 0);
        assert!(p < position(&order, 1) && position(&order, 1) < c);
        assert!(p < position(&order, 3) && position(&order, 3) < c);
    }

    #[test]
    fn cycle_reports_residual_stages_and_labels() {
        let err = sort(&[
            Stage::new("A").requiring("x").providing("y"),
            Stage::new("B").requiring("y").providing("x"),
            Stage::new("free"),
        ])
        .expect_err("cycle");

        let report = match err {
            SequencerError::CycleDetected(report) => report,
            other => unreachable!("expected a cycle, got {other:?}"),
        };
        assert_eq!(report.indices(), vec![0, 1]);
        assert_eq!(report.names(), vec!["A", "B"]);
        assert_eq!(report.edges.len(), 2);
        assert!(report.labels().contains(&crate::types::Label::new("x")));
        assert!(report.labels().contains(&crate::types::Label::new("y")));
    }

    #[test]
    fn downstream_of_cycle_is_reported() {
        let err = sort(&[
            Stage::new("A").requiring("x").providing("y"),
            Stage::new("B").requiring("y").providing("x"),
            Stage::new("C").requiring("y"),
        ])
        .expect_err("cycle");

        match err {
            SequencerError::CycleDetected(report) => {
                assert_eq!(report.indices(), vec![0, 1, 2]);
            }
            other => unreachable!("expected a cycle, got {other:?}"),
        }
    }
}
