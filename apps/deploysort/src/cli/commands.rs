//! # CLI Command Implementations
//!
//! This module contains the actual implementations of CLI commands.
//! Rendering is split from printing so the output can be tested.

use crate::error::CliError;
use crate::manifest::Manifest;
use crate::registry::StageRegistry;
use deploysort_core::{
    Graph, LabelSet, Role, SequencePlan, SequencerError, Stage, TerminalPolicy, VertexId,
};
use std::path::Path;

/// Load a manifest and wrap it in a registry.
pub fn load_registry(path: &Path) -> Result<StageRegistry, CliError> {
    let manifest = Manifest::load(path)?;
    tracing::info!(
        "Loaded {} stages from {:?}",
        manifest.stages.len(),
        path
    );
    Ok(StageRegistry::from_manifest(manifest))
}

fn print_json(value: &impl serde::Serialize) {
    println!("{}", serde_json::to_string_pretty(value).unwrap_or_default());
}

fn join_labels(labels: &LabelSet) -> String {
    if labels.is_empty() {
        return "-".to_string();
    }
    labels
        .iter()
        .map(|l| l.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

// =============================================================================
// SORT COMMAND
// =============================================================================

/// Print the execution order.
pub fn cmd_sort(path: &Path, json_mode: bool, detailed: bool) -> Result<(), CliError> {
    let registry = load_registry(path)?;
    let plan = registry.plan()?;

    if json_mode {
        print_json(&plan);
        return Ok(());
    }

    print!("{}", render_plan(&plan, detailed));
    Ok(())
}

/// Render a plan as a numbered list.
pub fn render_plan(plan: &SequencePlan, detailed: bool) -> String {
    let mut out = String::new();
    out.push_str("Execution Order\n");
    out.push_str("===============\n");

    for step in &plan.steps {
        let marker = if step.terminal { "  (terminal)" } else { "" };
        out.push_str(&format!(
            "{:>4}. {}{}\n",
            step.position + 1,
            step.name,
            marker
        ));

        if detailed {
            out.push_str(&format!(
                "        produces: {}\n",
                join_labels(&step.labels.produces)
            ));
            out.push_str(&format!(
                "        modifies: {}\n",
                join_labels(&step.labels.modifies)
            ));
            out.push_str(&format!(
                "        consumes: {}\n",
                join_labels(&step.labels.consumes)
            ));
            let after: Vec<String> = plan
                .edges_into(step.index)
                .map(|e| format!("{} ({})", e.from, e.label))
                .collect();
            if !after.is_empty() {
                out.push_str(&format!("        after:    {}\n", after.join(", ")));
            }
        }
    }

    out
}

// =============================================================================
// GRAPH COMMAND
// =============================================================================

/// Print the label index and edges, without sorting.
///
/// Works on manifests that contain cycles, which makes it the tool for
/// tracking one down.
pub fn cmd_graph(path: &Path, json_mode: bool) -> Result<(), CliError> {
    let registry = load_registry(path)?;
    let stages = registry.stages();
    let graph = build_graph(&stages, registry.settings().terminal_policy)?;

    if json_mode {
        print_json(&graph_json(&graph, &stages));
        return Ok(());
    }

    print!("{}", render_graph(&graph, &stages));
    Ok(())
}

/// Build the graph over everything except the terminal stage.
///
/// A missing terminal stage is tolerated so the graph of an incomplete
/// manifest can still be inspected. A second terminal stage follows
/// `policy`: rejected under `Exclusive`, ordered as a regular vertex under
/// `FirstWins`.
pub fn build_graph(stages: &[&Stage], policy: TerminalPolicy) -> Result<Graph, SequencerError> {
    let mut terminals = stages.iter().enumerate().filter(|(_, s)| s.terminal);
    let terminal = terminals.next();

    if let (Some((_, first)), Some((_, second))) = (terminal, terminals.next()) {
        if policy == TerminalPolicy::Exclusive {
            return Err(SequencerError::MultipleTerminalStages {
                first: first.name.clone(),
                second: second.name.clone(),
            });
        }
        tracing::warn!(
            terminal = first.name.as_str(),
            ignored = second.name.as_str(),
            "multiple terminal stages; graphing later ones as regular stages"
        );
    }

    let terminal = terminal.map(|(i, _)| i);
    Ok(Graph::build(
        stages
            .iter()
            .copied()
            .enumerate()
            .filter(|&(i, _)| Some(i) != terminal),
    ))
}

fn vertex_names(graph: &Graph, ids: &[VertexId]) -> Vec<String> {
    ids.iter()
        .filter_map(|&id| graph.vertex(id).map(|v| v.name().to_string()))
        .collect()
}

fn stage_name<'a>(stages: &[&'a Stage], index: usize) -> &'a str {
    stages.get(index).map_or("?", |s| s.name.as_str())
}

/// Render the label index and edges as text.
pub fn render_graph(graph: &Graph, stages: &[&Stage]) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "Stages: {}  Labels: {}  Edges: {}\n\n",
        graph.vertex_count(),
        graph.index().len(),
        graph.edge_count()
    ));

    out.push_str("Labels\n");
    out.push_str("======\n");
    for (label, dependency) in graph.index().iter() {
        out.push_str(&format!("  {}\n", label));
        for role in [Role::Producer, Role::Modifier, Role::Consumer] {
            let names = vertex_names(graph, dependency.with_role(role));
            if !names.is_empty() {
                out.push_str(&format!("    {:<9} {}\n", format!("{}s:", role), names.join(", ")));
            }
        }
        if dependency.is_inert() {
            out.push_str("    (no ordering constraint)\n");
        }
    }

    out.push('\n');
    out.push_str("Edges\n");
    out.push_str("=====\n");
    for (from, to, label) in graph.edges() {
        out.push_str(&format!(
            "  {} -> {}  ({})\n",
            stage_name(stages, from),
            stage_name(stages, to),
            label
        ));
    }

    out
}

fn graph_json(graph: &Graph, stages: &[&Stage]) -> serde_json::Value {
    let labels: serde_json::Map<String, serde_json::Value> = graph
        .index()
        .iter()
        .map(|(label, dependency)| {
            (
                label.to_string(),
                serde_json::json!({
                    "producers": vertex_names(graph, &dependency.producers),
                    "modifiers": vertex_names(graph, &dependency.modifiers),
                    "consumers": vertex_names(graph, &dependency.consumers),
                }),
            )
        })
        .collect();

    let edges: Vec<serde_json::Value> = graph
        .edges()
        .map(|(from, to, label)| {
            serde_json::json!({
                "from": stage_name(stages, from),
                "to": stage_name(stages, to),
                "label": label,
            })
        })
        .collect();

    serde_json::json!({
        "stage_count": graph.vertex_count(),
        "edge_count": graph.edge_count(),
        "labels": labels,
        "edges": edges,
    })
}

// =============================================================================
// CHECK COMMAND
// =============================================================================

/// Verify the manifest sorts cleanly.
pub fn cmd_check(path: &Path, json_mode: bool) -> Result<(), CliError> {
    let registry = load_registry(path)?;

    match registry.sequence() {
        Ok(order) => {
            let terminal = order.last().map(|s| s.name.as_str()).unwrap_or_default();
            if json_mode {
                print_json(&serde_json::json!({
                    "ok": true,
                    "stage_count": order.len(),
                    "terminal": terminal,
                }));
            } else {
                println!("OK: {} stages, terminal stage '{}'", order.len(), terminal);
            }
            Ok(())
        }
        Err(e) => {
            if json_mode {
                print_json(&serde_json::json!({
                    "ok": false,
                    "error": e.to_string(),
                }));
            }
            Err(e.into())
        }
    }
}
