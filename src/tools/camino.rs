//! Camino commands.

use crate::graph::{ArtifactKind, FlowNode, Port};

/// Track file written by `camino_to_trackvis`.
pub const TRACKVIS_TRACK_FILE: &str = "tracks.trk";

pub fn image_to_voxel(id: &str) -> FlowNode {
    FlowNode::command(
        id,
        "image2voxel",
        vec![Port::positional("in_file", ArtifactKind::Volume, 1, Some("-4dimage"))],
        vec![Port::positional("voxel_order", ArtifactKind::Volume, 2, Some("-outputfile"))],
    )
    .with_param("voxel_order", "dwi.Bfloat")
}

pub fn model_fit(id: &str, model: &str, scheme_file: &str) -> FlowNode {
    FlowNode::command(
        id,
        "modelfit",
        vec![
            Port::positional("in_file", ArtifactKind::Volume, 1, Some("-inputfile")),
            Port::positional("model", ArtifactKind::Any, 2, Some("-model")),
            Port::positional("scheme_file", ArtifactKind::GradientTable, 3, Some("-schemefile")),
            Port::positional("bgmask", ArtifactKind::Mask, 4, Some("-bgmask")),
        ],
        vec![Port::positional("fitted_data", ArtifactKind::Tensor, 5, Some("-outputfile"))],
    )
    .with_param("model", model)
    .with_param("scheme_file", scheme_file)
    .with_param("fitted_data", "fitted.Bdouble")
}

fn tensor_map(id: &str, command: &str, output: &str, inputmodel: &str, kind: ArtifactKind) -> FlowNode {
    FlowNode::command(
        id,
        command,
        vec![
            Port::positional("in_file", ArtifactKind::Tensor, 1, Some("-inputfile")),
            Port::positional("inputmodel", ArtifactKind::Any, 2, Some("-inputmodel")),
        ],
        vec![Port::new(output, kind)],
    )
    .with_param("inputmodel", inputmodel)
}

pub fn fractional_anisotropy(id: &str, inputmodel: &str) -> FlowNode {
    tensor_map(id, "fa", "fa", inputmodel, ArtifactKind::ScalarMap)
}

pub fn mean_diffusivity(id: &str, inputmodel: &str) -> FlowNode {
    tensor_map(id, "md", "md", inputmodel, ArtifactKind::ScalarMap)
}

pub fn eigensystem(id: &str, inputmodel: &str, maxcomponents: u32) -> FlowNode {
    tensor_map(id, "dteig", "eigen", inputmodel, ArtifactKind::Vectors)
        .with_param("maxcomponents", maxcomponents)
}

/// `picopdfs`: PICo probability density functions for probabilistic tracking.
pub fn pico_pdfs(id: &str, inputmodel: &str) -> FlowNode {
    FlowNode::command(
        id,
        "picopdfs",
        vec![
            Port::positional("in_file", ArtifactKind::Tensor, 1, Some("-inputfile")),
            Port::positional("inputmodel", ArtifactKind::Any, 2, Some("-inputmodel")),
        ],
        vec![Port::new("pdfs", ArtifactKind::Tensor)],
    )
    .with_param("inputmodel", inputmodel)
    .with_param("pdf", "bingham")
}

pub fn track(id: &str, inputmodel: &str) -> FlowNode {
    FlowNode::command(
        id,
        "track",
        vec![
            Port::positional("in_file", ArtifactKind::Tensor, 1, Some("-inputfile")),
            Port::positional("inputmodel", ArtifactKind::Any, 2, Some("-inputmodel")),
            Port::positional("seed_file", ArtifactKind::Mask, 3, Some("-seedfile")),
        ],
        vec![Port::new("tracked", ArtifactKind::Tracks)],
    )
    .with_param("inputmodel", inputmodel)
}

/// `camino_to_trackvis`, using `nifti_file` as geometry.
pub fn vtk_to_trk(id: &str) -> FlowNode {
    FlowNode::command(
        id,
        "camino_to_trackvis",
        vec![
            Port::positional("in_file", ArtifactKind::Tracks, 1, Some("-i")),
            Port::positional("nifti_file", ArtifactKind::Volume, 2, Some("--nifti")),
        ],
        vec![Port::positional("out_file", ArtifactKind::Tracks, 3, Some("-o"))],
    )
    .with_param("out_file", TRACKVIS_TRACK_FILE)
}
