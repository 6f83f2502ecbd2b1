use std::collections::HashMap;

use petgraph::algo::has_path_connecting;
use petgraph::stable_graph::{NodeIndex, StableDiGraph};
use petgraph::Direction;
use tracing::debug;

use crate::error::{FlowError, FlowResult};

use super::types::*;

/// A named data-flow graph of tool invocations.
///
/// Nodes are addressed by id; after [`Flow::add_subflow`] the nodes of the
/// merged flow are addressed as `<subflow name>.<node id>`. Every
/// connection is checked when it is added, so a `Flow` never holds an edge
/// between unknown ports, between incompatible kinds, or one that closes a
/// cycle.
#[derive(Debug, Clone)]
pub struct Flow {
    name: String,
    graph: StableDiGraph<FlowNode, Connection>,
    node_index_map: NodeIndexMap,
}

impl Flow {
    pub fn new(name: &str) -> Self {
        Flow {
            name: name.to_string(),
            graph: StableDiGraph::new(),
            node_index_map: HashMap::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn graph(&self) -> &StableDiGraph<FlowNode, Connection> {
        &self.graph
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn connection_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn contains_node(&self, node_id: &str) -> bool {
        self.node_index_map.contains_key(node_id)
    }

    pub(crate) fn index_of(&self, node_id: &str) -> FlowResult<NodeIndex> {
        self.node_index_map
            .get(node_id)
            .copied()
            .ok_or_else(|| FlowError::NodeNotFound(node_id.to_string()))
    }

    /// 根据节点 ID 获取图节点
    pub fn node(&self, node_id: &str) -> FlowResult<&FlowNode> {
        let idx = self.index_of(node_id)?;
        self.graph
            .node_weight(idx)
            .ok_or_else(|| FlowError::NodeNotFound(node_id.to_string()))
    }

    pub fn nodes(&self) -> impl Iterator<Item = &FlowNode> {
        self.graph.node_weights()
    }

    pub fn connections(&self) -> impl Iterator<Item = &Connection> {
        self.graph.edge_weights()
    }

    pub fn add_node(&mut self, node: FlowNode) -> FlowResult<()> {
        if self.node_index_map.contains_key(&node.id) {
            return Err(FlowError::DuplicateNode(node.id));
        }
        debug!(flow = %self.name, node = %node.id, "add node");
        let id = node.id.clone();
        let idx = self.graph.add_node(node);
        self.node_index_map.insert(id, idx);
        Ok(())
    }

    /// Connect `source.source_port` to `target.target_port`.
    pub fn connect(
        &mut self,
        source: &str,
        source_port: &str,
        target: &str,
        target_port: &str,
    ) -> FlowResult<()> {
        self.insert_connection(Connection {
            source: source.to_string(),
            source_port: source_port.to_string(),
            target: target.to_string(),
            target_port: target_port.to_string(),
            transform: None,
        })
    }

    /// Connect two ports, rewriting the value with `transform` on the way.
    pub fn connect_via(
        &mut self,
        source: &str,
        source_port: &str,
        transform: PortTransform,
        target: &str,
        target_port: &str,
    ) -> FlowResult<()> {
        self.insert_connection(Connection {
            source: source.to_string(),
            source_port: source_port.to_string(),
            target: target.to_string(),
            target_port: target_port.to_string(),
            transform: Some(transform),
        })
    }

    /// Connect several `(source_port, target_port)` pairs between two nodes.
    pub fn connect_all(&mut self, source: &str, target: &str, ports: &[(&str, &str)]) -> FlowResult<()> {
        for (source_port, target_port) in ports {
            self.connect(source, source_port, target, target_port)?;
        }
        Ok(())
    }

    fn insert_connection(&mut self, connection: Connection) -> FlowResult<()> {
        let source_idx = self.index_of(&connection.source)?;
        let target_idx = self.index_of(&connection.target)?;

        let source_node = &self.graph[source_idx];
        let target_node = &self.graph[target_idx];

        let out_port = source_node
            .output(&connection.source_port)
            .ok_or_else(|| FlowError::PortNotFound {
                node: connection.source.clone(),
                port: connection.source_port.clone(),
                direction: PortDirection::Output,
            })?;
        let in_port = target_node
            .input(&connection.target_port)
            .ok_or_else(|| FlowError::PortNotFound {
                node: connection.target.clone(),
                port: connection.target_port.clone(),
                direction: PortDirection::Input,
            })?;

        let carried = connection
            .transform
            .as_ref()
            .map(PortTransform::output_kind)
            .unwrap_or(out_port.kind);
        if !carried.can_feed(in_port.kind) {
            return Err(FlowError::KindMismatch {
                from_node: connection.source.clone(),
                from_port: connection.source_port.clone(),
                to_node: connection.target.clone(),
                to_port: connection.target_port.clone(),
                found: carried,
                expected: in_port.kind,
            });
        }

        if self.is_input_connected(&connection.target, &connection.target_port) {
            return Err(FlowError::InputAlreadyConnected {
                node: connection.target.clone(),
                port: connection.target_port.clone(),
            });
        }

        if source_idx == target_idx || has_path_connecting(&self.graph, target_idx, source_idx, None) {
            return Err(FlowError::CycleDetected);
        }

        debug!(
            flow = %self.name,
            source = %connection.source,
            source_port = %connection.source_port,
            target = %connection.target,
            target_port = %connection.target_port,
            "connect"
        );
        self.graph.add_edge(source_idx, target_idx, connection);
        Ok(())
    }

    /// Whether any connection already delivers into `node.port`.
    pub fn is_input_connected(&self, node_id: &str, port: &str) -> bool {
        let Some(idx) = self.node_index_map.get(node_id) else {
            return false;
        };
        self.graph
            .edges_directed(*idx, Direction::Incoming)
            .any(|e| e.weight().target_port == port)
    }

    /// Merge `sub` into this flow under the namespace `<sub name>.`.
    ///
    /// Nothing is merged unless every node and connection of `sub` fits.
    pub fn add_subflow(&mut self, sub: Flow) -> FlowResult<()> {
        let namespace = sub.name.clone();
        debug!(flow = %self.name, subflow = %namespace, nodes = sub.node_count(), "merge subflow");

        if let Some(taken) = sub
            .graph
            .node_weights()
            .map(|node| qualified(&namespace, &node.id))
            .find(|id| self.contains_node(id))
        {
            return Err(FlowError::DuplicateNode(taken));
        }

        let mut next = self.clone();
        for node in sub.graph.node_weights() {
            let mut node = node.clone();
            node.id = qualified(&namespace, &node.id);
            next.add_node(node)?;
        }
        for connection in sub.graph.edge_weights() {
            let mut connection = connection.clone();
            connection.source = qualified(&namespace, &connection.source);
            connection.target = qualified(&namespace, &connection.target);
            next.insert_connection(connection)?;
        }
        *self = next;
        Ok(())
    }

    /// 获取节点的所有后继节点 ID
    pub fn successors(&self, node_id: &str) -> FlowResult<Vec<String>> {
        self.neighbors(node_id, Direction::Outgoing)
    }

    /// 获取节点的所有前驱节点 ID
    pub fn predecessors(&self, node_id: &str) -> FlowResult<Vec<String>> {
        self.neighbors(node_id, Direction::Incoming)
    }

    fn neighbors(&self, node_id: &str, direction: Direction) -> FlowResult<Vec<String>> {
        let idx = self.index_of(node_id)?;
        let mut ids: Vec<String> = self
            .graph
            .neighbors_directed(idx, direction)
            .filter_map(|n| self.graph.node_weight(n).map(|node| node.id.clone()))
            .collect();
        ids.sort();
        ids.dedup();
        Ok(ids)
    }

    /// Connections arriving at `node_id`.
    pub fn incoming(&self, node_id: &str) -> FlowResult<Vec<&Connection>> {
        let idx = self.index_of(node_id)?;
        Ok(self
            .graph
            .edges_directed(idx, Direction::Incoming)
            .map(|e| e.weight())
            .collect())
    }
}

/// Address of `node` inside the subflow `namespace`.
pub fn qualified(namespace: &str, node: &str) -> String {
    format!("{}.{}", namespace, node)
}
