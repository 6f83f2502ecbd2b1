use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};

use dwiflow::config::{load_settings_file, DiffusionConfig, ResourceConfig, GRADIENT_TABLE_PRESETS};
use dwiflow::graph::{roots, upstream_of, validate_flow};
use dwiflow::tools::Bindings;
use dwiflow::{create_default_registry, DiagnosticLevel, DiffusionStage, ToolEnvironment};

#[derive(Parser)]
#[command(name = "dwiflow", version, about = "Diffusion-MRI stage graph builder")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the stage graph and print it as JSON
    Build {
        #[arg(long)]
        settings: Option<PathBuf>,
        #[arg(long, default_value = "diffusion_stage")]
        stage_dir: PathBuf,
        /// Root of the packaged data files
        #[arg(long)]
        resource_root: Option<PathBuf>,
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Build the stage graph and print its validation report
    Validate {
        #[arg(long)]
        settings: Option<PathBuf>,
        #[arg(long)]
        resource_root: Option<PathBuf>,
    },
    /// Report whether the stage has run and what can be inspected
    Status {
        #[arg(long)]
        settings: Option<PathBuf>,
        #[arg(long)]
        stage_dir: PathBuf,
    },
    /// List the packaged gradient table presets
    Presets,
    /// Render the command line of one node
    Render {
        #[arg(long)]
        settings: Option<PathBuf>,
        #[arg(long)]
        resource_root: Option<PathBuf>,
        /// Qualified node id, e.g. `reconstruction.dtb_gfa`
        #[arg(long)]
        node: String,
        /// Port values as `port=value`
        #[arg(long = "bind")]
        bindings: Vec<String>,
        /// Also list the nodes that must run before this one
        #[arg(long)]
        upstream: bool,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Build {
            settings,
            stage_dir,
            resource_root,
            out,
        } => {
            let config = load_config(settings.as_deref(), resource_root.as_deref())?;
            let stage = DiffusionStage::new(config, stage_dir);
            let flow = stage.create_workflow(&ToolEnvironment::from_env())?;
            let json = serde_json::to_string_pretty(&flow.to_schema()?)?;
            match out {
                Some(path) => {
                    std::fs::write(&path, json).with_context(|| format!("writing {}", path.display()))?
                }
                None => println!("{}", json),
            }
        }
        Commands::Validate {
            settings,
            resource_root,
        } => {
            let config = load_config(settings.as_deref(), resource_root.as_deref())?;
            let stage = DiffusionStage::new(config, "diffusion_stage");
            let flow = stage.create_workflow(&ToolEnvironment::from_env())?;
            let report = validate_flow(&flow);
            for d in &report.diagnostics {
                let level = match d.level {
                    DiagnosticLevel::Error => "error",
                    DiagnosticLevel::Warning => "warning",
                };
                println!("[{}] {} {}", level, d.code, d.message);
            }
            println!(
                "{}: {} nodes, {} connections, roots: {}",
                flow.name(),
                flow.node_count(),
                flow.connection_count(),
                roots(&flow).join(", ")
            );
            if !report.is_valid {
                bail!("stage graph has {} error(s)", report.errors().len());
            }
        }
        Commands::Status { settings, stage_dir } => {
            let config = load_config(settings.as_deref(), None)?;
            let stage = DiffusionStage::new(config, stage_dir);
            println!("has_run: {}", stage.has_run());
            for (label, output) in stage.inspect_outputs() {
                println!("{}: {:?} {}", label, output.viewer, output.path.display());
            }
        }
        Commands::Presets => {
            for preset in GRADIENT_TABLE_PRESETS {
                println!("{}", preset);
            }
        }
        Commands::Render {
            settings,
            resource_root,
            node,
            bindings,
            upstream,
        } => {
            let config = load_config(settings.as_deref(), resource_root.as_deref())?;
            let stage = DiffusionStage::new(config, "diffusion_stage");
            let flow = stage.create_workflow(&ToolEnvironment::from_env())?;
            let target = flow.node(&node)?;
            let bindings = parse_bindings(&bindings)?;
            let argv = create_default_registry().command_line(target, &bindings)?;
            println!("{}", argv.join(" "));
            if upstream {
                let mut before: Vec<String> = upstream_of(&flow, &node)?.into_iter().collect();
                before.sort();
                for id in before {
                    println!("# after {}", id);
                }
            }
        }
    }
    Ok(())
}

fn load_config(settings: Option<&Path>, resource_root: Option<&Path>) -> Result<DiffusionConfig> {
    let mut config = match settings {
        Some(path) => load_settings_file(path)
            .with_context(|| format!("loading settings {}", path.display()))?
            .into_config()?,
        None => DiffusionConfig::default(),
    };
    if let Some(root) = resource_root {
        config.set_resources(ResourceConfig::rooted_at(root))?;
    }
    Ok(config)
}

fn parse_bindings(raw: &[String]) -> Result<Bindings> {
    let mut bindings = Bindings::new();
    for entry in raw {
        let Some((port, value)) = entry.split_once('=') else {
            bail!("binding must be port=value: {}", entry);
        };
        bindings.insert(port.to_string(), value.to_string());
    }
    Ok(bindings)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_upstream_flag() {
        let cli = Cli::try_parse_from([
            "dwiflow",
            "render",
            "--node",
            "tracking.dtb_streamline",
            "--bind",
            "dir_file=/tmp/dwi_dir.nii",
            "--upstream",
        ])
        .unwrap();
        match cli.command {
            Commands::Render {
                node,
                bindings,
                upstream,
                ..
            } => {
                assert_eq!(node, "tracking.dtb_streamline");
                assert_eq!(bindings, vec!["dir_file=/tmp/dwi_dir.nii"]);
                assert!(upstream);
            }
            _ => panic!("expected render"),
        }
    }
}
