use std::path::{Path, PathBuf};

use serde::Deserialize;
use serde_json::{Map, Value};

use dwiflow::graph::ensure_valid;
use dwiflow::{load_settings_file, DiffusionStage, ToolEnvironment};

/// What a case directory expects from the assembled stage graph.
#[derive(Debug, Deserialize)]
struct Expected {
    reconstruction: String,
    tracking: String,
    nodes: Vec<String>,
    #[serde(default)]
    absent: Vec<String>,
    outputs: Vec<String>,
    #[serde(default)]
    params: Map<String, Value>,
}

fn find_settings(case_dir: &Path) -> PathBuf {
    ["settings.yaml", "settings.json", "settings.toml"]
        .iter()
        .map(|name| case_dir.join(name))
        .find(|path| path.exists())
        .unwrap_or_else(|| panic!("no settings file in {}", case_dir.display()))
}

fn run_case(case_dir: &Path) {
    let settings = load_settings_file(&find_settings(case_dir)).unwrap();
    let config = settings.into_config().unwrap();
    let expected: Expected = serde_json::from_str(
        &std::fs::read_to_string(case_dir.join("expected.json")).unwrap(),
    )
    .unwrap();

    assert_eq!(config.reconstruction_software().to_string(), expected.reconstruction);
    assert_eq!(config.tracking_software().to_string(), expected.tracking);

    let stage = DiffusionStage::new(config, "/work/diffusion_stage");
    let env = ToolEnvironment {
        dsi_path: Some("/opt/dtk/matrices".into()),
    };
    let flow = stage.create_workflow(&env).unwrap();
    ensure_valid(&flow).unwrap();

    for id in &expected.nodes {
        assert!(flow.contains_node(id), "missing node {}", id);
    }
    for id in &expected.absent {
        assert!(!flow.contains_node(id), "unexpected node {}", id);
    }

    let mut outputs: Vec<String> = flow
        .incoming("outputnode")
        .unwrap()
        .into_iter()
        .map(|c| c.target_port.clone())
        .collect();
    outputs.sort();
    assert_eq!(outputs, expected.outputs);

    for (id, params) in &expected.params {
        let node = flow.node(id).unwrap();
        let Value::Object(params) = params else {
            panic!("params of {} must be an object", id);
        };
        for (key, value) in params {
            assert_eq!(node.param(key), Some(value), "{}.{}", id, key);
        }
    }

    let schema = flow.to_schema().unwrap();
    assert_eq!(schema.name, "diffusion_stage");
    assert_eq!(schema.nodes.len(), flow.node_count());
    assert_eq!(schema.nodes[0].id, "inputnode");
}

macro_rules! stage_cases {
    ($dir:expr, $( $name:ident => $folder:expr ),* $(,)?) => {
        $(
            #[test]
            fn $name() {
                let case_dir = PathBuf::from(env!("CARGO_MANIFEST_DIR"))
                    .join($dir)
                    .join($folder);
                run_case(&case_dir);
            }
        )*
    };
}

stage_cases!("tests/cases",
    case_dsi_dtk => "dsi_dtk",
    case_hardi_mrtrix_csd => "hardi_mrtrix_csd",
    case_dti_camino_probabilistic => "dti_camino_probabilistic",
    case_dti_dtk_defaults => "dti_dtk_defaults",
);
