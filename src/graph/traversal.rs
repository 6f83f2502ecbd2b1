use std::collections::HashSet;

use petgraph::visit::Dfs;
use petgraph::Direction;

use crate::error::FlowResult;

use super::builder::Flow;

/// 拓扑排序
pub fn topological_sort(flow: &Flow) -> Option<Vec<String>> {
    let graph = flow.graph();
    let sorted = petgraph::algo::toposort(graph, None).ok()?;

    Some(
        sorted
            .into_iter()
            .filter_map(|idx| graph.node_weight(idx).map(|n| n.id.clone()))
            .collect(),
    )
}

/// Every node that (transitively) feeds `node_id`, excluding itself.
pub fn upstream_of(flow: &Flow, node_id: &str) -> FlowResult<HashSet<String>> {
    let start = flow.index_of(node_id)?;
    let reversed = petgraph::visit::Reversed(flow.graph());
    let mut dfs = Dfs::new(reversed, start);
    let mut seen = HashSet::new();
    while let Some(idx) = dfs.next(reversed) {
        if idx == start {
            continue;
        }
        if let Some(node) = flow.graph().node_weight(idx) {
            seen.insert(node.id.clone());
        }
    }
    Ok(seen)
}

/// Nodes without incoming connections.
pub fn roots(flow: &Flow) -> Vec<String> {
    let graph = flow.graph();
    let mut ids: Vec<String> = graph
        .node_indices()
        .filter(|idx| graph.neighbors_directed(*idx, Direction::Incoming).next().is_none())
        .filter_map(|idx| graph.node_weight(idx).map(|n| n.id.clone()))
        .collect();
    ids.sort();
    ids
}
