//! Call graph over purity reports.
//!
//! Nodes are function identities; edges point from caller to callee.
//! Dependencies whose identity matches no report become leaf nodes, so
//! unknown callees still participate in component ordering and can be
//! recognized as unknown during scoring.

use crate::core::{FunctionIdentity, PurityReport};
use petgraph::algo::tarjan_scc;
use petgraph::graph::{DiGraph, NodeIndex};
use std::collections::HashMap;

/// One node of the call graph.
#[derive(Debug, Clone)]
pub struct GraphNode {
    pub identity: FunctionIdentity,
    /// Index into the report slice the graph was built from; `None` for an
    /// unknown callee.
    pub report: Option<usize>,
}

/// Directed call graph built from a batch of reports.
#[derive(Debug)]
pub struct CallGraph {
    graph: DiGraph<GraphNode, ()>,
    index_of: HashMap<FunctionIdentity, NodeIndex>,
}

impl CallGraph {
    pub fn from_reports(reports: &[PurityReport]) -> Self {
        let mut graph = DiGraph::new();
        let mut index_of = HashMap::new();

        for (i, report) in reports.iter().enumerate() {
            let ix = graph.add_node(GraphNode {
                identity: report.identity.clone(),
                report: Some(i),
            });
            index_of.insert(report.identity.clone(), ix);
        }

        for (i, report) in reports.iter().enumerate() {
            let caller = index_of[&report.identity];
            debug_assert_eq!(graph[caller].report, Some(i));
            for dep in &report.dependencies {
                let callee = *index_of
                    .entry(dep.identity.clone())
                    .or_insert_with(|| {
                        graph.add_node(GraphNode {
                            identity: dep.identity.clone(),
                            report: None,
                        })
                    });
                graph.add_edge(caller, callee, ());
            }
        }

        Self { graph, index_of }
    }

    /// Strongly connected components, callees before callers. A component's
    /// dependencies outside itself therefore always appear in an earlier
    /// component.
    pub fn components(&self) -> Vec<Vec<NodeIndex>> {
        tarjan_scc(&self.graph)
    }

    /// A component participates in recursion when it has more than one
    /// member or its single member calls itself.
    pub fn is_cyclic_component(&self, component: &[NodeIndex]) -> bool {
        component.len() > 1
            || component
                .first()
                .is_some_and(|&ix| self.graph.contains_edge(ix, ix))
    }

    pub fn node(&self, ix: NodeIndex) -> &GraphNode {
        &self.graph[ix]
    }

    pub fn node_index(&self, identity: &FunctionIdentity) -> Option<NodeIndex> {
        self.index_of.get(identity).copied()
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Dependency, FunctionKind, PurityReport};
    use std::path::PathBuf;

    fn identity(name: &str) -> FunctionIdentity {
        FunctionIdentity::new(name, "Tests", "void", vec![], FunctionKind::Ordinary)
    }

    fn report(name: &str, callees: &[&str]) -> PurityReport {
        PurityReport {
            identity: identity(name),
            file: PathBuf::from("<memory>"),
            line_start: 0,
            line_end: 0,
            source_lines: 1,
            return_value_is_fresh: true,
            is_manually_classified: false,
            violations: vec![],
            dependencies: callees
                .iter()
                .map(|c| Dependency::resolved(identity(c), false))
                .collect(),
        }
    }

    fn component_names(graph: &CallGraph, component: &[NodeIndex]) -> Vec<String> {
        let mut names: Vec<String> = component
            .iter()
            .map(|&ix| graph.node(ix).identity.name.clone())
            .collect();
        names.sort();
        names
    }

    #[test]
    fn callees_come_before_callers() {
        let reports = vec![report("A", &["B"]), report("B", &["C"]), report("C", &[])];
        let graph = CallGraph::from_reports(&reports);
        let order: Vec<Vec<String>> = graph
            .components()
            .iter()
            .map(|c| component_names(&graph, c))
            .collect();
        assert_eq!(order, vec![vec!["C"], vec!["B"], vec!["A"]]);
    }

    #[test]
    fn cycle_collapses_into_one_component() {
        let reports = vec![
            report("F1", &["F2"]),
            report("F2", &["F3"]),
            report("F3", &["F1"]),
            report("F4", &["F2"]),
        ];
        let graph = CallGraph::from_reports(&reports);
        let components = graph.components();
        assert_eq!(components.len(), 2);
        assert_eq!(
            component_names(&graph, &components[0]),
            vec!["F1", "F2", "F3"]
        );
        assert!(graph.is_cyclic_component(&components[0]));
        assert_eq!(component_names(&graph, &components[1]), vec!["F4"]);
        assert!(!graph.is_cyclic_component(&components[1]));
    }

    #[test]
    fn self_loop_counts_as_cyclic() {
        let reports = vec![report("R", &["R"])];
        let graph = CallGraph::from_reports(&reports);
        let components = graph.components();
        assert_eq!(components.len(), 1);
        assert!(graph.is_cyclic_component(&components[0]));
    }

    #[test]
    fn unknown_callees_become_leaf_nodes() {
        let reports = vec![report("A", &["Missing"])];
        let graph = CallGraph::from_reports(&reports);
        assert_eq!(graph.node_count(), 2);
        let missing = graph.node_index(&identity("Missing")).unwrap();
        assert!(graph.node(missing).report.is_none());
        // The leaf is still ordered before its caller.
        let components = graph.components();
        assert_eq!(component_names(&graph, &components[0]), vec!["Missing"]);
    }
}
