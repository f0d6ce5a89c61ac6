//! Coordinate system dependency graph
//!
//! Each coordinate system is defined relative to a reference coordinate
//! system (`Reference CS`). Uses petgraph to order systems so references come
//! first and to detect reference cycles.

use petgraph::algo::{tarjan_scc, toposort};
use petgraph::graph::{DiGraph, NodeIndex};
use serde_json::Value;
use std::collections::HashMap;

use crate::design::GLOBAL_COORDINATE_SYSTEM;
use crate::models::EntityMap;

/// Property naming the reference coordinate system
pub const REFERENCE_CS_KEY: &str = "Reference CS";

/// Reference coordinate system of a stored coordinate system
pub fn reference_of(props: &Value) -> Option<&str> {
    props.get(REFERENCE_CS_KEY)?.as_str()
}

/// Graph of the coordinate systems of one document, edges pointing from a
/// reference to the systems defined relative to it
pub struct FrameGraph {
    graph: DiGraph<String, ()>,
    nodes: HashMap<String, NodeIndex>,
}

impl FrameGraph {
    pub fn new(frames: &EntityMap) -> Self {
        let mut graph = DiGraph::new();
        let mut nodes = HashMap::new();
        for name in frames.keys() {
            nodes.insert(name.clone(), graph.add_node(name.clone()));
        }
        for (name, props) in frames {
            let Some(reference) = reference_of(props) else {
                continue;
            };
            if let (Some(&parent), Some(&child)) = (nodes.get(reference), nodes.get(name)) {
                graph.add_edge(parent, child, ());
            }
        }
        Self { graph, nodes }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.nodes.contains_key(name)
    }

    /// Names with every reference before the systems that use it, or `None`
    /// when the references form a cycle
    pub fn ordered(&self) -> Option<Vec<String>> {
        toposort(&self.graph, None)
            .ok()
            .map(|order| order.into_iter().map(|idx| self.graph[idx].clone()).collect())
    }

    /// Groups of coordinate systems referencing each other in a loop
    pub fn cycles(&self) -> Vec<Vec<String>> {
        tarjan_scc(&self.graph)
            .into_iter()
            .filter(|component| {
                component.len() > 1
                    || self.graph.contains_edge(component[0], component[0])
            })
            .map(|component| {
                let mut names: Vec<String> =
                    component.into_iter().map(|idx| self.graph[idx].clone()).collect();
                names.sort();
                names
            })
            .collect()
    }

    /// References that are neither in the document nor the global system
    pub fn external_references<'a>(&self, frames: &'a EntityMap) -> Vec<(&'a str, &'a str)> {
        frames
            .iter()
            .filter_map(|(name, props)| {
                let reference = reference_of(props)?;
                (reference != GLOBAL_COORDINATE_SYSTEM && !self.contains(reference))
                    .then_some((name.as_str(), reference))
            })
            .collect()
    }
}
