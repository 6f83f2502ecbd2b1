use std::fmt;

use petgraph::stable_graph::NodeIndex;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::paths::strip_suffix;

/// Kind of artifact carried by a port
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactKind {
    /// 3D/4D image volume
    Volume,
    /// Binary mask image
    Mask,
    /// Scalar parameter map (FA, MD, gFA, ...)
    ScalarMap,
    /// Fitted tensor or model data
    Tensor,
    /// Eigenvector image
    Vectors,
    /// ODF or spherical-harmonic image
    Odf,
    /// Single-fibre response function
    Response,
    /// Reconstruction matrix
    Matrix,
    /// Gradient table / encoding file
    GradientTable,
    /// Direction field consumed by the DTB tracker
    Directions,
    /// Output-path prefix derived from another filename
    Prefix,
    /// Fibre tracks
    Tracks,
    /// Accepts anything
    Any,
}

impl ArtifactKind {
    pub fn name(self) -> &'static str {
        match self {
            ArtifactKind::Volume => "volume",
            ArtifactKind::Mask => "mask",
            ArtifactKind::ScalarMap => "scalar_map",
            ArtifactKind::Tensor => "tensor",
            ArtifactKind::Vectors => "vectors",
            ArtifactKind::Odf => "odf",
            ArtifactKind::Response => "response",
            ArtifactKind::Matrix => "matrix",
            ArtifactKind::GradientTable => "gradient_table",
            ArtifactKind::Directions => "directions",
            ArtifactKind::Prefix => "prefix",
            ArtifactKind::Tracks => "tracks",
            ArtifactKind::Any => "any",
        }
    }

    /// Whether an artifact of this kind may be delivered to a port of `target` kind.
    ///
    /// Masks and scalar maps are images, so they may feed a generic volume
    /// port; an `Any` port on either end matches everything.
    pub fn can_feed(self, target: ArtifactKind) -> bool {
        if self == target || target == ArtifactKind::Any || self == ArtifactKind::Any {
            return true;
        }
        target == ArtifactKind::Volume
            && matches!(self, ArtifactKind::Mask | ArtifactKind::ScalarMap)
    }
}

impl fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// 端口方向
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PortDirection {
    Input,
    Output,
}

impl fmt::Display for PortDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PortDirection::Input => f.write_str("input"),
            PortDirection::Output => f.write_str("output"),
        }
    }
}

/// Command-line placement of an input port
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Argument {
    pub position: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flag: Option<String>,
}

/// Named, typed port on a node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Port {
    pub name: String,
    pub kind: ArtifactKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub argument: Option<Argument>,
}

impl Port {
    pub fn new(name: &str, kind: ArtifactKind) -> Self {
        Port {
            name: name.to_string(),
            kind,
            argument: None,
        }
    }

    pub fn positional(name: &str, kind: ArtifactKind, position: u8, flag: Option<&str>) -> Self {
        Port {
            name: name.to_string(),
            kind,
            argument: Some(Argument {
                position,
                flag: flag.map(str::to_string),
            }),
        }
    }
}

/// 节点类型
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum NodeKind {
    /// Pass-through node whose fields are both inputs and outputs
    Identity,
    /// Invocation of an external program
    Command { command: String },
}

/// 图节点
#[derive(Debug, Clone, PartialEq)]
pub struct FlowNode {
    /// 节点 ID（子流程合并后带命名空间前缀）
    pub id: String,

    pub kind: NodeKind,

    pub inputs: Vec<Port>,

    pub outputs: Vec<Port>,

    /// Constant parameters fixed at graph-build time
    pub params: Map<String, Value>,
}

impl FlowNode {
    /// Pass-through node exposing `fields` as both inputs and outputs.
    pub fn identity(id: &str, fields: &[(&str, ArtifactKind)]) -> Self {
        let ports: Vec<Port> = fields
            .iter()
            .map(|(name, kind)| Port::new(name, *kind))
            .collect();
        FlowNode {
            id: id.to_string(),
            kind: NodeKind::Identity,
            inputs: ports.clone(),
            outputs: ports,
            params: Map::new(),
        }
    }

    pub fn command(id: &str, command: &str, inputs: Vec<Port>, outputs: Vec<Port>) -> Self {
        FlowNode {
            id: id.to_string(),
            kind: NodeKind::Command {
                command: command.to_string(),
            },
            inputs,
            outputs,
            params: Map::new(),
        }
    }

    pub fn with_param(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.params.insert(key.to_string(), value.into());
        self
    }

    pub fn set_param(&mut self, key: &str, value: impl Into<Value>) {
        self.params.insert(key.to_string(), value.into());
    }

    pub fn param(&self, key: &str) -> Option<&Value> {
        self.params.get(key)
    }

    pub fn input(&self, name: &str) -> Option<&Port> {
        self.inputs.iter().find(|p| p.name == name)
    }

    pub fn output(&self, name: &str) -> Option<&Port> {
        self.outputs.iter().find(|p| p.name == name)
    }

    pub fn command_name(&self) -> Option<&str> {
        match &self.kind {
            NodeKind::Command { command } => Some(command),
            NodeKind::Identity => None,
        }
    }

    pub fn is_identity(&self) -> bool {
        self.kind == NodeKind::Identity
    }
}

/// Rewrite applied to a value while it travels along a connection
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PortTransform {
    /// Replace a filename by `<dir>/<prefix>_`
    StripSuffix { prefix: String },
}

impl PortTransform {
    pub fn strip_suffix(prefix: &str) -> Self {
        PortTransform::StripSuffix {
            prefix: prefix.to_string(),
        }
    }

    /// Kind of the value after the transform.
    pub fn output_kind(&self) -> ArtifactKind {
        match self {
            PortTransform::StripSuffix { .. } => ArtifactKind::Prefix,
        }
    }

    pub fn apply(&self, value: &str) -> String {
        match self {
            PortTransform::StripSuffix { prefix } => strip_suffix(value, prefix),
        }
    }
}

/// 图边：上游输出端口 -> 下游输入端口
#[derive(Debug, Clone, PartialEq)]
pub struct Connection {
    pub source: String,
    pub source_port: String,
    pub target: String,
    pub target_port: String,
    pub transform: Option<PortTransform>,
}

/// 节点 ID 到 petgraph NodeIndex 的映射
pub type NodeIndexMap = std::collections::HashMap<String, NodeIndex>;
