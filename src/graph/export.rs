//! Serializable description of a [`Flow`] for the external execution engine.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{FlowError, FlowResult};

use super::builder::Flow;
use super::traversal::topological_sort;
use super::types::{NodeKind, Port, PortTransform};

/// Current export format version
pub const FLOW_SCHEMA_VERSION: &str = "0.1.0";

#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct FlowSchema {
    pub version: String,
    pub name: String,
    /// Nodes in execution (topological) order.
    pub nodes: Vec<NodeSchema>,
    pub edges: Vec<EdgeSchema>,
}

#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct NodeSchema {
    pub id: String,
    #[serde(flatten)]
    pub kind: NodeKind,
    pub inputs: Vec<Port>,
    pub outputs: Vec<Port>,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub params: Map<String, Value>,
}

#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct EdgeSchema {
    pub id: String,
    pub source: String,
    pub source_port: String,
    pub target: String,
    pub target_port: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transform: Option<PortTransform>,
}

impl Flow {
    /// Export the flow with nodes in topological order.
    pub fn to_schema(&self) -> FlowResult<FlowSchema> {
        let order = topological_sort(self).ok_or(FlowError::CycleDetected)?;

        let mut nodes = Vec::with_capacity(order.len());
        for id in &order {
            let node = self.node(id)?;
            nodes.push(NodeSchema {
                id: node.id.clone(),
                kind: node.kind.clone(),
                inputs: node.inputs.clone(),
                outputs: node.outputs.clone(),
                params: node.params.clone(),
            });
        }

        let mut edges: Vec<EdgeSchema> = self
            .connections()
            .map(|c| EdgeSchema {
                id: format!("{}.{}->{}.{}", c.source, c.source_port, c.target, c.target_port),
                source: c.source.clone(),
                source_port: c.source_port.clone(),
                target: c.target.clone(),
                target_port: c.target_port.clone(),
                transform: c.transform.clone(),
            })
            .collect();
        edges.sort_by(|a, b| a.id.cmp(&b.id));

        Ok(FlowSchema {
            version: FLOW_SCHEMA_VERSION.to_string(),
            name: self.name().to_string(),
            nodes,
            edges,
        })
    }
}
