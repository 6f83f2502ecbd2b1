//! Diffusion Toolkit reconstruction flow.

use crate::config::{AdditionalMap, DtkReconConfig, ImagingModel, ToolEnvironment};
use crate::error::FlowResult;
use crate::graph::{ArtifactKind, Flow, FlowNode, PortTransform};
use crate::tools::{dtb, dtk};

use super::{path_param, INPUT_NODE, OUTPUT_NODE, RECON_FLOW_NAME};

pub const INPUTS: &[(&str, ArtifactKind)] = &[
    ("diffusion", ArtifactKind::Volume),
    ("diffusion_resampled", ArtifactKind::Volume),
];

pub const OUTPUTS: &[(&str, ArtifactKind)] = &[
    ("DWI", ArtifactKind::Volume),
    ("B0", ArtifactKind::Volume),
    ("ODF", ArtifactKind::Odf),
    ("gFA", ArtifactKind::ScalarMap),
    ("skewness", ArtifactKind::ScalarMap),
    ("kurtosis", ArtifactKind::ScalarMap),
    ("P0", ArtifactKind::ScalarMap),
    ("max", ArtifactKind::Volume),
    ("V1", ArtifactKind::Vectors),
];

const ODF_RECON: &str = "dtk_odfrecon";
const HARDI_MAT: &str = "dtk_hardimat";
const DTI_RECON: &str = "dtk_dtirecon";

/// Build the DTK reconstruction for the configured imaging model.
///
/// DTI runs `dti_recon` on the raw diffusion image. HARDI and DSI run
/// `odf_recon` on the resampled image and derive the requested scalar maps
/// from its ODF with the DTB tools.
pub fn build(config: &DtkReconConfig, env: &ToolEnvironment) -> FlowResult<Flow> {
    let mut flow = Flow::new(RECON_FLOW_NAME);
    flow.add_node(FlowNode::identity(INPUT_NODE, INPUTS))?;
    flow.add_node(FlowNode::identity(OUTPUT_NODE, OUTPUTS))?;

    let imaging = config.imaging_model();
    let prefix = imaging.prefix();

    match imaging {
        ImagingModel::Dti => {
            let gradient = path_param(config.gradient_table()?);
            flow.add_node(
                dtk::dti_recon(DTI_RECON, prefix, &gradient)
                    .with_param("b_value", config.maximum_b_value)
                    .with_param("multiple_b_values", config.multiple_high_b_values)
                    .with_param("n_averages", config.number_of_averages)
                    .with_param("number_of_b0", config.number_of_b0_volumes)
                    .with_param("oblique_correction", config.apply_gradient_orientation_correction),
            )?;
            flow.connect(INPUT_NODE, "diffusion", DTI_RECON, "DWI")?;
            flow.connect_all(DTI_RECON, OUTPUT_NODE, &[("DWI", "DWI"), ("B0", "B0"), ("V1", "V1")])?;
            return Ok(flow);
        }
        ImagingModel::Dsi => {
            let matrix = env.dsi_matrix(&config.recon_matrix_file())?;
            flow.add_node(
                odf_recon(config, prefix, config.dsi_number_of_directions())
                    .with_param("matrix", path_param(&matrix))
                    .with_param("dsi", true),
            )?;
        }
        ImagingModel::Hardi => {
            let gradient = path_param(config.gradient_table()?);
            flow.add_node(dtk::hardi_mat(
                HARDI_MAT,
                &gradient,
                config.apply_gradient_orientation_correction,
            ))?;
            flow.add_node(odf_recon(config, prefix, config.number_of_directions()))?;
            flow.connect(INPUT_NODE, "diffusion_resampled", HARDI_MAT, "reference_file")?;
            flow.connect(HARDI_MAT, "out_file", ODF_RECON, "matrix")?;
        }
    }

    flow.connect(INPUT_NODE, "diffusion_resampled", ODF_RECON, "DWI")?;
    flow.connect_all(
        ODF_RECON,
        OUTPUT_NODE,
        &[("DWI", "DWI"), ("B0", "B0"), ("ODF", "ODF"), ("max", "max")],
    )?;

    let moments = [
        (AdditionalMap::Gfa, "dtb_gfa", 2u8),
        (AdditionalMap::Skewness, "dtb_skewness", 3),
        (AdditionalMap::Kurtosis, "dtb_kurtosis", 4),
    ];
    for (map, id, moment) in moments {
        if !config.wants(map) {
            continue;
        }
        flow.add_node(dtb::gfa(id, moment))?;
        flow.connect_via(ODF_RECON, "ODF", PortTransform::strip_suffix(prefix), id, "dsi_basepath")?;
        flow.connect(id, "out_file", OUTPUT_NODE, map.name())?;
    }

    if config.wants(AdditionalMap::P0) {
        let id = "dtb_P0";
        flow.add_node(dtb::p0(id))?;
        flow.connect(INPUT_NODE, "diffusion", id, "dwi_file")?;
        flow.connect_via(ODF_RECON, "ODF", PortTransform::strip_suffix(prefix), id, "dsi_basepath")?;
        flow.connect(id, "out_file", OUTPUT_NODE, AdditionalMap::P0.name())?;
    }

    Ok(flow)
}

/// `odf_recon` sized for `directions` sampled directions plus the b0.
fn odf_recon(config: &DtkReconConfig, prefix: &str, directions: u32) -> FlowNode {
    dtk::odf_recon(ODF_RECON, prefix)
        .with_param("n_b0", config.number_of_b0_volumes)
        .with_param("n_directions", directions + 1)
        .with_param("n_output_directions", config.number_of_output_directions)
}
