use std::collections::HashMap;

use petgraph::visit::{EdgeRef, IntoEdgeReferences};
use petgraph::Direction;

use crate::error::{FlowError, FlowResult};

use super::builder::Flow;
use super::diagnostics::{Diagnostic, ValidationReport};

/// Check a flow's structure.
///
/// Errors (`E2xx`): cycles, connections to missing ports, incompatible
/// kinds, input ports fed more than once. Warnings (`W2xx`): isolated
/// command nodes, identity fields nothing drives, command inputs that are
/// neither connected nor fixed by a parameter.
pub fn validate_flow(flow: &Flow) -> ValidationReport {
    let graph = flow.graph();
    let mut diags = Vec::new();

    // 1. 检测环（DAG 验证）
    if petgraph::algo::is_cyclic_directed(graph) {
        diags.push(Diagnostic::error(
            "E201",
            format!("Cycle detected in flow {}", flow.name()),
            None,
            None,
        ));
    }

    // 2. 端口与类型
    let mut fed: HashMap<(&str, &str), usize> = HashMap::new();
    for edge in graph.edge_references() {
        let conn = edge.weight();
        let (Some(source), Some(target)) = (
            graph.node_weight(edge.source()),
            graph.node_weight(edge.target()),
        ) else {
            continue;
        };

        let out_port = source.output(&conn.source_port);
        let in_port = target.input(&conn.target_port);
        if out_port.is_none() {
            diags.push(Diagnostic::error(
                "E202",
                format!("Output port not found: {}.{}", source.id, conn.source_port),
                Some(source.id.as_str()),
                Some(conn.source_port.as_str()),
            ));
        }
        if in_port.is_none() {
            diags.push(Diagnostic::error(
                "E202",
                format!("Input port not found: {}.{}", target.id, conn.target_port),
                Some(target.id.as_str()),
                Some(conn.target_port.as_str()),
            ));
        }
        if let (Some(out_port), Some(in_port)) = (out_port, in_port) {
            let carried = conn
                .transform
                .as_ref()
                .map(|t| t.output_kind())
                .unwrap_or(out_port.kind);
            if !carried.can_feed(in_port.kind) {
                diags.push(Diagnostic::error(
                    "E203",
                    format!(
                        "{}.{} ({}) cannot feed {}.{} ({})",
                        source.id, conn.source_port, carried, target.id, conn.target_port, in_port.kind
                    ),
                    Some(target.id.as_str()),
                    Some(conn.target_port.as_str()),
                ));
            }
        }

        *fed.entry((target.id.as_str(), conn.target_port.as_str())).or_default() += 1;
    }

    for ((node, port), count) in &fed {
        if *count > 1 {
            diags.push(Diagnostic::error(
                "E204",
                format!("Input {}.{} is connected {} times", node, port, count),
                Some(*node),
                Some(*port),
            ));
        }
    }

    // 3. 孤立节点与未绑定端口
    for idx in graph.node_indices() {
        let Some(node) = graph.node_weight(idx) else {
            continue;
        };
        let in_degree = graph.edges_directed(idx, Direction::Incoming).count();
        let out_degree = graph.edges_directed(idx, Direction::Outgoing).count();

        if node.is_identity() {
            if out_degree > 0 || in_degree == 0 {
                continue;
            }
            for port in &node.inputs {
                if !fed.contains_key(&(node.id.as_str(), port.name.as_str())) {
                    diags.push(Diagnostic::warning(
                        "W202",
                        format!("Field {}.{} is never driven", node.id, port.name),
                        Some(node.id.as_str()),
                        Some(port.name.as_str()),
                    ));
                }
            }
            continue;
        }

        if in_degree == 0 && out_degree == 0 {
            diags.push(Diagnostic::warning(
                "W201",
                format!("Isolated node detected: {}", node.id),
                Some(node.id.as_str()),
                None,
            ));
        }
        for port in &node.inputs {
            let bound = fed.contains_key(&(node.id.as_str(), port.name.as_str()))
                || node.param(&port.name).is_some();
            if !bound {
                diags.push(Diagnostic::warning(
                    "W203",
                    format!("Input {}.{} is neither connected nor set", node.id, port.name),
                    Some(node.id.as_str()),
                    Some(port.name.as_str()),
                ));
            }
        }
    }

    ValidationReport::from_diagnostics(diags)
}

/// Like [`validate_flow`], but fails on any error-level diagnostic.
pub fn ensure_valid(flow: &Flow) -> FlowResult<ValidationReport> {
    let report = validate_flow(flow);
    if report.is_valid {
        Ok(report)
    } else {
        Err(FlowError::ValidationFailed(Box::new(report)))
    }
}
