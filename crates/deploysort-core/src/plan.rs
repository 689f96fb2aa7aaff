//! # Sequence Plan
//!
//! A serializable description of one successful sort: the execution order,
//! each stage's label roles, and every edge the graph builder derived.
//! Used for reporting; the engine itself only needs the order.

use crate::graph::LabelPartition;
use crate::types::{Label, StageDescriptor};
use serde::{Deserialize, Serialize};

/// One entry of the execution order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanStep {
    /// Zero-based execution position.
    pub position: usize,
    /// Position of the stage in the caller's input.
    pub index: usize,
    pub name: String,
    pub terminal: bool,
    pub relative_order: i32,
    /// The stage's labels split by role.
    pub labels: LabelPartition,
}

/// A derived ordering constraint: `from` runs before `to` because of `label`.
///
/// Names are for display. Stage names need not be unique, so lookups go
/// through the input indices.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanEdge {
    pub from: String,
    pub to: String,
    /// Input index of the stage that runs first.
    pub from_index: usize,
    /// Input index of the stage that waits.
    pub to_index: usize,
    pub label: Label,
}

impl PlanEdge {
    /// Build an edge from input indices, resolving stage names.
    #[must_use]
    pub fn new<S: StageDescriptor>(stages: &[S], from: usize, to: usize, label: Label) -> Self {
        let name = |i: usize| stages.get(i).map(|s| s.name().to_string()).unwrap_or_default();
        Self {
            from: name(from),
            to: name(to),
            from_index: from,
            to_index: to,
            label,
        }
    }
}

/// The full result of a sort call, ready to print or serialize.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SequencePlan {
    pub steps: Vec<PlanStep>,
    pub edges: Vec<PlanEdge>,
}

impl SequencePlan {
    /// Assemble a plan from the input, the sorted input indices and the edges.
    #[must_use]
    pub fn new<S: StageDescriptor>(stages: &[S], order: &[usize], edges: Vec<PlanEdge>) -> Self {
        let steps = order
            .iter()
            .enumerate()
            .filter_map(|(position, &index)| {
                stages.get(index).map(|stage| PlanStep {
                    position,
                    index,
                    name: stage.name().to_string(),
                    terminal: stage.is_terminal(),
                    relative_order: stage.relative_order(),
                    labels: LabelPartition::of(stage),
                })
            })
            .collect();

        Self { steps, edges }
    }

    /// Stage names in execution order.
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        self.steps.iter().map(|s| s.name.as_str()).collect()
    }

    /// Edges whose target is the stage at input index `index`.
    pub fn edges_into(&self, index: usize) -> impl Iterator<Item = &PlanEdge> + '_ {
        self.edges.iter().filter(move |e| e.to_index == index)
    }

    /// Rewrite every input index through `map`.
    ///
    /// For callers that reorder their stages before sequencing and want the
    /// plan to refer to their own positions.
    pub fn reindex(&mut self, map: impl Fn(usize) -> usize) {
        for step in &mut self.steps {
            step.index = map(step.index);
        }
        for edge in &mut self.edges {
            edge.from_index = map(edge.from_index);
            edge.to_index = map(edge.to_index);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Stage;

    #[test]
    fn steps_follow_order() {
        let stages = vec![
            Stage::new("b").requiring("x"),
            Stage::new("a").providing("x").with_relative_order(5),
            Stage::new("t").terminal(),
        ];
        let edges = vec![PlanEdge::new(&stages, 1, 0, Label::new("x"))];
        let plan = SequencePlan::new(&stages, &[1, 0, 2], edges);

        assert_eq!(plan.names(), vec!["a", "b", "t"]);
        assert_eq!(plan.steps[0].relative_order, 5);
        assert_eq!(plan.steps[0].position, 0);
        assert_eq!(plan.steps[0].index, 1);
        assert!(plan.steps[2].terminal);
        assert_eq!(plan.edges_into(0).count(), 1);
        assert_eq!(plan.edges_into(1).count(), 0);
    }

    #[test]
    fn edges_resolve_by_index_when_names_repeat() {
        let stages = vec![
            Stage::new("step").providing("x"),
            Stage::new("step").requiring("x"),
            Stage::new("t").terminal(),
        ];
        let edges = vec![PlanEdge::new(&stages, 0, 1, Label::new("x"))];
        let plan = SequencePlan::new(&stages, &[0, 1, 2], edges);

        assert_eq!(plan.edges_into(plan.steps[0].index).count(), 0);
        assert_eq!(plan.edges_into(plan.steps[1].index).count(), 1);
    }

    #[test]
    fn reindex_maps_steps_and_edges() {
        let stages = vec![
            Stage::new("a").providing("x"),
            Stage::new("b").requiring("x"),
            Stage::new("t").terminal(),
        ];
        let edges = vec![PlanEdge::new(&stages, 0, 1, Label::new("x"))];
        let mut plan = SequencePlan::new(&stages, &[0, 1, 2], edges);

        let declared = [2, 0, 1];
        plan.reindex(|i| declared[i]);

        let indices: Vec<usize> = plan.steps.iter().map(|s| s.index).collect();
        assert_eq!(indices, vec![2, 0, 1]);
        assert_eq!(plan.edges[0].from_index, 2);
        assert_eq!(plan.edges[0].to_index, 0);
        assert_eq!(plan.edges_into(0).count(), 1);
    }

    #[test]
    fn plan_serializes_to_json() {
        let stages = vec![Stage::new("a").providing("x"), Stage::new("t").terminal()];
        let plan = SequencePlan::new(&stages, &[0, 1], Vec::new());
        let json = serde_json::to_string(&plan).expect("serialize");

        assert!(json.contains("\"name\":\"a\""));
        assert!(json.contains("\"produces\":[\"x\"]"));

        let back: SequencePlan = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back, plan);
    }
}
