//! # Sequencer
//!
//! The façade callers use: pull out the terminal stage, order the rest with
//! the [`Graph`] builder and [`TopologicalSorter`], then pin the terminal
//! stage to the end.
//!
//! A `Sequencer` holds configuration only. Every call builds its own graph,
//! so one instance can serve any number of calls, from any thread.

use crate::graph::Graph;
use crate::plan::{PlanEdge, SequencePlan};
use crate::sorter::TopologicalSorter;
use crate::types::{SequencerError, StageDescriptor};
use serde::{Deserialize, Serialize};

// =============================================================================
// CONFIGURATION
// =============================================================================

/// How to treat inputs with more than one terminal-flagged stage.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TerminalPolicy {
    /// Exactly one terminal stage is allowed; a second one is an error.
    #[default]
    Exclusive,
    /// The first terminal stage in input order is pinned last. Later
    /// terminal-flagged stages are ordered like any other stage.
    FirstWins,
}

/// Sequencer settings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SequencerConfig {
    /// Policy for duplicate terminal stages.
    pub terminal_policy: TerminalPolicy,
}

// =============================================================================
// SEQUENCER
// =============================================================================

/// Orders stages so producers run before modifiers, modifiers before
/// consumers, and the terminal stage last.
#[derive(Debug, Clone, Copy, Default)]
pub struct Sequencer {
    config: SequencerConfig,
    sorter: TopologicalSorter,
}

impl Sequencer {
    /// Create a sequencer with the default (exclusive terminal) policy.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a sequencer with explicit settings.
    #[must_use]
    pub fn with_config(config: SequencerConfig) -> Self {
        Self {
            config,
            sorter: TopologicalSorter::new(),
        }
    }

    /// The active settings.
    #[must_use]
    pub fn config(&self) -> SequencerConfig {
        self.config
    }

    /// Order `stages` for execution.
    ///
    /// The result holds references into `stages`, has the same length, and
    /// ends with the terminal stage.
    ///
    /// # Errors
    ///
    /// - [`SequencerError::MissingTerminalStage`] before any graph work
    /// - [`SequencerError::MultipleTerminalStages`] under [`TerminalPolicy::Exclusive`]
    /// - [`SequencerError::CycleDetected`] when the dependencies loop
    pub fn sequence<'a, S: StageDescriptor>(
        &self,
        stages: &'a [S],
    ) -> Result<Vec<&'a S>, SequencerError> {
        let terminal = self.find_terminal(stages)?;
        let graph = Self::build(stages, terminal);
        let order = self.finish(stages, graph, terminal)?;
        Ok(order.into_iter().filter_map(|i| stages.get(i)).collect())
    }

    /// Order `stages` and describe the result, including every edge the
    /// builder derived and each stage's label roles.
    ///
    /// # Errors
    ///
    /// The same as [`Sequencer::sequence`].
    pub fn plan<S: StageDescriptor>(&self, stages: &[S]) -> Result<SequencePlan, SequencerError> {
        let terminal = self.find_terminal(stages)?;
        let graph = Self::build(stages, terminal);
        let edges: Vec<PlanEdge> = graph
            .edges()
            .map(|(from, to, label)| PlanEdge::new(stages, from, to, label.clone()))
            .collect();
        let order = self.finish(stages, graph, terminal)?;
        Ok(SequencePlan::new(stages, &order, edges))
    }

    /// Locate the terminal stage according to the configured policy.
    fn find_terminal<S: StageDescriptor>(&self, stages: &[S]) -> Result<usize, SequencerError> {
        let mut terminals = stages
            .iter()
            .enumerate()
            .filter(|(_, stage)| stage.is_terminal());

        let Some((first, first_stage)) = terminals.next() else {
            return Err(SequencerError::MissingTerminalStage);
        };

        if let Some((_, second_stage)) = terminals.next() {
            match self.config.terminal_policy {
                TerminalPolicy::Exclusive => {
                    return Err(SequencerError::MultipleTerminalStages {
                        first: first_stage.name().to_string(),
                        second: second_stage.name().to_string(),
                    });
                }
                TerminalPolicy::FirstWins => {
                    tracing::warn!(
                        terminal = first_stage.name(),
                        ignored = second_stage.name(),
                        "multiple terminal stages; ordering later ones as regular stages"
                    );
                }
            }
        }

        Ok(first)
    }

    fn build<S: StageDescriptor>(stages: &[S], terminal: usize) -> Graph {
        Graph::build(
            stages
                .iter()
                .enumerate()
                .filter(|&(i, _)| i != terminal),
        )
    }

    /// Sort the graph, append the terminal stage and check the length.
    fn finish<S: StageDescriptor>(
        &self,
        stages: &[S],
        graph: Graph,
        terminal: usize,
    ) -> Result<Vec<usize>, SequencerError> {
        let mut order = self.sorter.sort(graph)?;
        order.push(terminal);

        if order.len() != stages.len() {
            return Err(SequencerError::InvariantViolation(format!(
                "sorted {} of {} stages",
                order.len(),
                stages.len()
            )));
        }

        tracing::debug!(stages = order.len(), "stages sequenced");
        Ok(order)
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Stage;

    fn names<'a>(order: &[&'a Stage]) -> Vec<&'a str> {
        order.iter().map(|s| s.name.as_str()).collect()
    }

    #[test]
    fn terminal_is_pinned_last_despite_labels() {
        let stages = vec![
            Stage::new("T").providing("x").terminal(),
            Stage::new("B").requiring("x"),
            Stage::new("A"),
        ];
        let order = Sequencer::new().sequence(&stages).expect("sequence");
        assert_eq!(names(&order), vec!["B", "A", "T"]);
    }

    #[test]
    fn output_references_input() {
        let stages = vec![Stage::new("A"), Stage::new("T").terminal()];
        let order = Sequencer::new().sequence(&stages).expect("sequence");
        assert!(std::ptr::eq(order[0], &stages[0]));
        assert!(std::ptr::eq(order[1], &stages[1]));
    }

    #[test]
    fn only_terminal_stage() {
        let stages = vec![Stage::new("T").terminal()];
        let order = Sequencer::new().sequence(&stages).expect("sequence");
        assert_eq!(names(&order), vec!["T"]);
    }

    #[test]
    fn missing_terminal_fails() {
        let stages = vec![Stage::new("A"), Stage::new("B")];
        let result = Sequencer::new().sequence(&stages);
        assert!(matches!(result, Err(SequencerError::MissingTerminalStage)));
    }

    #[test]
    fn empty_input_has_no_terminal() {
        let stages: Vec<Stage> = Vec::new();
        let result = Sequencer::new().sequence(&stages);
        assert!(matches!(result, Err(SequencerError::MissingTerminalStage)));
    }

    #[test]
    fn exclusive_policy_rejects_second_terminal() {
        let stages = vec![
            Stage::new("T1").terminal(),
            Stage::new("A"),
            Stage::new("T2").terminal(),
        ];
        let result = Sequencer::new().sequence(&stages);
        match result {
            Err(SequencerError::MultipleTerminalStages { first, second }) => {
                assert_eq!(first, "T1");
                assert_eq!(second, "T2");
            }
            other => unreachable!("expected MultipleTerminalStages, got {other:?}"),
        }
    }

    #[test]
    fn first_wins_policy_orders_later_terminals_normally() {
        let stages = vec![
            Stage::new("T1").terminal(),
            Stage::new("T2").requiring("x").terminal(),
            Stage::new("A").providing("x"),
        ];
        let sequencer = Sequencer::with_config(SequencerConfig {
            terminal_policy: TerminalPolicy::FirstWins,
        });
        let order = sequencer.sequence(&stages).expect("sequence");
        assert_eq!(names(&order), vec!["A", "T2", "T1"]);
    }

    #[test]
    fn cycle_fails_whole_call() {
        let stages = vec![
            Stage::new("A").requiring("x").providing("y"),
            Stage::new("B").requiring("y").providing("x"),
            Stage::new("T").terminal(),
        ];
        let result = Sequencer::new().sequence(&stages);
        assert!(matches!(result, Err(SequencerError::CycleDetected(_))));
    }

    #[test]
    fn plan_lists_edges_and_steps() {
        let stages = vec![
            Stage::new("A").providing("x"),
            Stage::new("M").requiring("x").providing("x"),
            Stage::new("B").requiring("x"),
            Stage::new("T").terminal(),
        ];
        let plan = Sequencer::new().plan(&stages).expect("plan");

        let order: Vec<_> = plan.steps.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(order, vec!["A", "M", "B", "T"]);
        assert_eq!(plan.edges.len(), 2);
        assert!(plan.steps.last().is_some_and(|s| s.terminal));
    }

    #[test]
    fn short_order_is_reported() {
        let stages = vec![Stage::new("A"), Stage::new("B"), Stage::new("T").terminal()];
        let graph = Graph::build(stages.iter().enumerate().take(1));

        let result = Sequencer::new().finish(&stages, graph, 2);
        match result {
            Err(SequencerError::InvariantViolation(message)) => {
                assert_eq!(message, "sorted 2 of 3 stages");
            }
            other => unreachable!("expected InvariantViolation, got {other:?}"),
        }
    }

    #[test]
    fn config_deserializes_policy() {
        let config: SequencerConfig =
            serde_json::from_str(r#"{"terminal_policy":"first-wins"}"#).expect("parse");
        assert_eq!(config.terminal_policy, TerminalPolicy::FirstWins);

        let default: SequencerConfig = serde_json::from_str("{}").expect("parse");
        assert_eq!(default, SequencerConfig::default());
    }
}
