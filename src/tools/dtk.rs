//! Diffusion Toolkit reconstruction commands.

use crate::graph::{ArtifactKind, FlowNode, Port};

/// `odf_recon`: ODF reconstruction for HARDI or DSI data.
///
/// The reconstruction matrix arrives on the `matrix` port (HARDI) or as a
/// fixed parameter (DSI).
pub fn odf_recon(id: &str, out_prefix: &str) -> FlowNode {
    FlowNode::command(
        id,
        "odf_recon",
        vec![
            Port::positional("DWI", ArtifactKind::Volume, 1, None),
            Port::positional("n_directions", ArtifactKind::Any, 2, None),
            Port::positional("n_output_directions", ArtifactKind::Any, 3, None),
            Port::positional("out_prefix", ArtifactKind::Any, 4, None),
            Port::positional("matrix", ArtifactKind::Matrix, 5, Some("-mat")),
        ],
        vec![
            Port::new("B0", ArtifactKind::Volume),
            Port::new("DWI", ArtifactKind::Volume),
            Port::new("max", ArtifactKind::Volume),
            Port::new("ODF", ArtifactKind::Odf),
            Port::new("entropy", ArtifactKind::ScalarMap),
        ],
    )
    .with_param("out_prefix", out_prefix)
}

/// `hardi_mat`: reconstruction matrix for a HARDI gradient scheme.
pub fn hardi_mat(id: &str, gradient_table: &str, oblique_correction: bool) -> FlowNode {
    FlowNode::command(
        id,
        "hardi_mat",
        vec![
            Port::positional("gradient_table", ArtifactKind::GradientTable, 1, None),
            Port::positional("reference_file", ArtifactKind::Volume, 3, Some("-ref")),
        ],
        vec![Port::positional("out_file", ArtifactKind::Matrix, 2, None)],
    )
    .with_param("gradient_table", gradient_table)
    .with_param("oblique_correction", oblique_correction)
    .with_param("out_file", "recon_mat.dat")
}

/// `dti_recon`: tensor reconstruction.
pub fn dti_recon(id: &str, out_prefix: &str, gradient_table: &str) -> FlowNode {
    FlowNode::command(
        id,
        "dti_recon",
        vec![
            Port::positional("DWI", ArtifactKind::Volume, 1, None),
            Port::positional("out_prefix", ArtifactKind::Any, 2, None),
            Port::positional("gradient_matrix", ArtifactKind::GradientTable, 3, Some("-gm")),
        ],
        vec![
            Port::new("ADC", ArtifactKind::ScalarMap),
            Port::new("B0", ArtifactKind::Volume),
            Port::new("DWI", ArtifactKind::Volume),
            Port::new("FA", ArtifactKind::ScalarMap),
            Port::new("FA_color", ArtifactKind::Volume),
            Port::new("tensor", ArtifactKind::Tensor),
            Port::new("V1", ArtifactKind::Vectors),
            Port::new("V2", ArtifactKind::Vectors),
            Port::new("V3", ArtifactKind::Vectors),
        ],
    )
    .with_param("out_prefix", out_prefix)
    .with_param("gradient_matrix", gradient_table)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::registry::{create_default_registry, Bindings};

    #[test]
    fn test_odf_recon_command_line() {
        let node = odf_recon("dtk_odfrecon", "dsi")
            .with_param("n_directions", 515)
            .with_param("n_output_directions", 181)
            .with_param("matrix", "/opt/dtk/matrices/DSI_matrix_515x181.dat");
        let bindings = Bindings::from([("DWI".to_string(), "/w/dwi.nii".to_string())]);
        let argv = create_default_registry().command_line(&node, &bindings).unwrap();
        assert_eq!(
            argv,
            vec![
                "odf_recon",
                "/w/dwi.nii",
                "515",
                "181",
                "dsi",
                "-mat",
                "/opt/dtk/matrices/DSI_matrix_515x181.dat",
            ]
        );
    }

    #[test]
    fn test_dti_recon_ports() {
        let node = dti_recon("dtk_dtirecon", "dti", "/res/siemens_06.txt");
        assert_eq!(node.output("V1").unwrap().kind, ArtifactKind::Vectors);
        assert_eq!(node.input("DWI").unwrap().kind, ArtifactKind::Volume);
        assert_eq!(node.command_name(), Some("dti_recon"));
    }
}
