use std::collections::{BTreeMap, HashMap};

use serde_json::Value;

use crate::error::{FlowError, FlowResult};
use crate::graph::{Argument, FlowNode, Port};

use super::dtb;
use super::mrtrix;

/// Port values known at render time (port name -> path or literal).
pub type Bindings = HashMap<String, String>;

/// Derives the output paths a command will write from its bound inputs.
pub type OutputNamer = fn(&FlowNode, &Bindings) -> FlowResult<BTreeMap<String, String>>;

/// 工具注册表 - 管理自带命令的输出命名规则
pub struct ToolRegistry {
    namers: HashMap<String, OutputNamer>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        ToolRegistry {
            namers: HashMap::new(),
        }
    }

    pub fn register(&mut self, command: &str, namer: OutputNamer) {
        self.namers.insert(command.to_string(), namer);
    }

    pub fn get(&self, command: &str) -> Option<OutputNamer> {
        self.namers.get(command).copied()
    }

    /// 获取所有已注册的命令
    pub fn registered_commands(&self) -> Vec<String> {
        let mut commands: Vec<String> = self.namers.keys().cloned().collect();
        commands.sort();
        commands
    }

    /// Output paths a node will produce, for commands with a naming rule.
    ///
    /// Commands without a registered rule yield an empty map.
    pub fn expected_outputs(
        &self,
        node: &FlowNode,
        bindings: &Bindings,
    ) -> FlowResult<BTreeMap<String, String>> {
        match node.command_name().and_then(|c| self.get(c)) {
            Some(namer) => namer(node, bindings),
            None => Ok(BTreeMap::new()),
        }
    }

    /// Render the argument vector of a command node.
    ///
    /// Only ports carrying an [`Argument`] appear, ordered by position.
    /// Input values come from `bindings`, then node parameters; output values
    /// from `bindings`, the command's naming rule, then node parameters.
    /// Identity nodes render to an empty command line.
    pub fn command_line(&self, node: &FlowNode, bindings: &Bindings) -> FlowResult<Vec<String>> {
        let Some(command) = node.command_name() else {
            return Ok(Vec::new());
        };

        let mut placed: Vec<(&Argument, &Port, bool)> = node
            .inputs
            .iter()
            .filter_map(|p| p.argument.as_ref().map(|a| (a, p, true)))
            .chain(
                node.outputs
                    .iter()
                    .filter_map(|p| p.argument.as_ref().map(|a| (a, p, false))),
            )
            .collect();
        placed.sort_by_key(|(arg, _, _)| arg.position);

        let needs_naming = placed
            .iter()
            .any(|(_, port, is_input)| !is_input && !bindings.contains_key(&port.name));
        let named = if needs_naming {
            self.expected_outputs(node, bindings)?
        } else {
            BTreeMap::new()
        };

        let mut argv = vec![command.to_string()];
        for (arg, port, is_input) in placed {
            let value = if is_input {
                input_value(node, bindings, &port.name)
            } else {
                bindings
                    .get(&port.name)
                    .cloned()
                    .or_else(|| named.get(&port.name).cloned())
                    .or_else(|| node.param(&port.name).map(value_to_arg))
                    .ok_or_else(|| missing(node, &port.name))
            };
            let value = value?;
            if let Some(flag) = &arg.flag {
                argv.push(flag.clone());
            }
            argv.push(value);
        }
        Ok(argv)
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Registry with the naming rules of the in-house commands.
pub fn create_default_registry() -> ToolRegistry {
    let mut registry = ToolRegistry::new();
    registry.register(dtb::GFA_COMMAND, dtb::name_gfa_outputs);
    registry.register(dtb::P0_COMMAND, dtb::name_p0_outputs);
    registry.register(dtb::DTK2DIR_COMMAND, dtb::name_dtk2dir_outputs);
    registry.register(mrtrix::MULTIPLY_COMMAND, mrtrix::name_mrmult_outputs);
    registry
}

fn value_to_arg(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Array(items) => items.iter().map(value_to_arg).collect::<Vec<_>>().join(" "),
        other => other.to_string(),
    }
}

fn missing(node: &FlowNode, port: &str) -> FlowError {
    FlowError::MissingArgument {
        node: node.id.clone(),
        port: port.to_string(),
    }
}

/// Value of an input port: the binding if present, else the fixed parameter.
pub(crate) fn input_value(node: &FlowNode, bindings: &Bindings, port: &str) -> FlowResult<String> {
    bindings
        .get(port)
        .cloned()
        .or_else(|| node.param(port).map(value_to_arg))
        .ok_or_else(|| missing(node, port))
}
