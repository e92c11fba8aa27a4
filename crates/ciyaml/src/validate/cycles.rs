//! Dependency cycles between the jobs of a workflow.

use std::collections::{HashMap, VecDeque};

use indexmap::IndexMap;
use petgraph::{
    Direction,
    graph::{DiGraph, NodeIndex},
    visit::EdgeRef,
};

use ciyaml_parser::error::{Diagnostic, ErrorCode};

use super::Validator;

/// Names of the jobs caught in a dependency cycle.
///
/// `dependencies` maps each job to the jobs that require it. Jobs are
/// removed in topological order, starting from those nothing points to;
/// every job that is never removed is reported. That covers the jobs on a
/// cycle as well as every job downstream of one. Names are returned in
/// order of first appearance in `dependencies`.
///
/// # Examples
///
/// ```
/// # use indexmap::IndexMap;
/// # use ciyaml::find_cycle_nodes;
/// let mut dependencies = IndexMap::new();
/// dependencies.insert("a".to_string(), vec!["b".to_string()]);
/// dependencies.insert("b".to_string(), vec!["a".to_string()]);
/// dependencies.insert("c".to_string(), vec!["d".to_string()]);
///
/// assert_eq!(find_cycle_nodes(&dependencies), vec!["a", "b"]);
/// ```
pub fn find_cycle_nodes(dependencies: &IndexMap<String, Vec<String>>) -> Vec<String> {
    let mut graph: DiGraph<&str, ()> = DiGraph::new();
    let mut indices: HashMap<&str, NodeIndex> = HashMap::new();

    for (job, dependents) in dependencies {
        let from = node_index(&mut graph, &mut indices, job);
        for dependent in dependents {
            let to = node_index(&mut graph, &mut indices, dependent);
            graph.add_edge(from, to, ());
        }
    }

    let mut in_degree: Vec<usize> = graph
        .node_indices()
        .map(|index| graph.edges_directed(index, Direction::Incoming).count())
        .collect();
    let mut queue: VecDeque<NodeIndex> = graph
        .node_indices()
        .filter(|index| in_degree[index.index()] == 0)
        .collect();
    let mut removed = vec![false; graph.node_count()];

    while let Some(index) = queue.pop_front() {
        if removed[index.index()] {
            continue;
        }
        removed[index.index()] = true;
        for edge in graph.edges_directed(index, Direction::Outgoing) {
            let target = edge.target();
            in_degree[target.index()] -= 1;
            if in_degree[target.index()] == 0 {
                queue.push_back(target);
            }
        }
    }

    graph
        .node_indices()
        .filter(|index| !removed[index.index()])
        .map(|index| graph[index].to_string())
        .collect()
}

fn node_index<'n>(
    graph: &mut DiGraph<&'n str, ()>,
    indices: &mut HashMap<&'n str, NodeIndex>,
    name: &'n str,
) -> NodeIndex {
    *indices.entry(name).or_insert_with(|| graph.add_node(name))
}

impl Validator<'_> {
    /// Report every job reference taking part in a `requires` cycle.
    pub(super) fn validate_cycles(&mut self) {
        let document = self.document;
        for workflow in document.workflows().values() {
            for name in find_cycle_nodes(&workflow.dependencies) {
                let job_refs = workflow
                    .job_refs
                    .iter()
                    .filter(|job_ref| job_ref.step_name == name);
                for job_ref in job_refs {
                    self.emit(
                        Diagnostic::error(format!("The job `{name}` is part of a cycle"))
                            .with_code(ErrorCode::E208)
                            .with_range(job_ref.job_name_range),
                    );
                }
            }
        }
    }
}
