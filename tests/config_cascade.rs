use dwiflow::config::{
    diffusion_model_choices_for, reconstruction_choices_for, tracking_choices_for, NumberOfTensors,
};
use dwiflow::{
    ConfigError, DiffusionConfig, DiffusionModel, ImagingModel, ReconstructionBackend,
    TrackingBackend,
};

/// Every legal edit sequence over the stage-wide choices.
fn all_configs() -> Vec<DiffusionConfig> {
    let mut out = Vec::new();
    for imaging in ImagingModel::ALL {
        for diffusion in diffusion_model_choices_for(*imaging) {
            for recon in reconstruction_choices_for(*imaging, *diffusion) {
                let mut cfg = DiffusionConfig::default();
                cfg.set_imaging_model(*imaging).unwrap();
                cfg.set_diffusion_model(*diffusion).unwrap();
                cfg.set_reconstruction_software(*recon).unwrap();
                out.push(cfg);
            }
        }
    }
    out
}

fn assert_consistent(cfg: &DiffusionConfig) {
    let imaging = cfg.imaging_model();
    assert!(cfg.diffusion_model_choices().contains(&cfg.diffusion_model()));
    assert!(cfg.reconstruction_choices().contains(&cfg.reconstruction_software()));
    assert!(cfg.tracking_choices().contains(&cfg.tracking_software()));
    assert_eq!(
        cfg.tracking_software(),
        TrackingBackend::paired_with(cfg.reconstruction_software())
    );

    assert_eq!(cfg.dtk_recon.imaging_model(), imaging);
    assert_eq!(cfg.mrtrix_recon.imaging_model(), imaging);
    assert_eq!(cfg.camino_recon.imaging_model(), imaging);
    assert_eq!(cfg.dtk_tracking.imaging_model(), imaging);
    assert_eq!(cfg.dtb_tracking.imaging_model(), imaging);
    assert_eq!(cfg.mrtrix_tracking.imaging_model(), imaging);
    assert_eq!(cfg.camino_tracking.imaging_model(), imaging);

    assert_eq!(cfg.mrtrix_recon.recon_mode(), cfg.diffusion_model());
    assert_eq!(cfg.mrtrix_tracking.tracking_mode(), cfg.diffusion_model());
    assert_eq!(cfg.camino_tracking.tracking_mode(), cfg.diffusion_model());

    if imaging == ImagingModel::Dsi {
        assert_eq!(cfg.diffusion_model(), DiffusionModel::Streamline);
        assert_eq!(cfg.reconstruction_software(), ReconstructionBackend::Dtk);
        assert_eq!(cfg.tracking_software(), TrackingBackend::Dtb);
    }
    if cfg.diffusion_model() == DiffusionModel::Probabilistic {
        assert_ne!(cfg.reconstruction_software(), ReconstructionBackend::Dtk);
        assert!(cfg.mrtrix_recon.compute_csd());
    }
}

#[test]
fn test_every_legal_sequence_is_consistent() {
    let configs = all_configs();
    // DTI and HARDI: 3 streamline + 2 probabilistic each; DSI: 1
    assert_eq!(configs.len(), 11);
    for cfg in &configs {
        assert_consistent(cfg);
    }
}

#[test]
fn test_resolve_is_idempotent() {
    for cfg in all_configs() {
        let once = cfg.resolved().unwrap();
        assert_eq!(once, cfg);
        assert_eq!(once.resolved().unwrap(), once);
    }
}

#[test]
fn test_every_imaging_change_stays_consistent() {
    for cfg in all_configs() {
        for imaging in ImagingModel::ALL {
            let mut next = cfg.clone();
            next.set_imaging_model(*imaging).unwrap();
            assert_consistent(&next);
        }
    }
}

#[test]
fn test_dsi_forces_dtk_and_streamline() {
    let mut cfg = DiffusionConfig::default();
    cfg.set_diffusion_model(DiffusionModel::Probabilistic).unwrap();
    cfg.set_reconstruction_software(ReconstructionBackend::Camino).unwrap();
    cfg.set_imaging_model(ImagingModel::Dsi).unwrap();

    assert_eq!(cfg.diffusion_model(), DiffusionModel::Streamline);
    assert_eq!(cfg.reconstruction_software(), ReconstructionBackend::Dtk);
    assert_eq!(cfg.tracking_software(), TrackingBackend::Dtb);
    assert_eq!(cfg.reconstruction_choices(), &[ReconstructionBackend::Dtk]);
    assert_eq!(cfg.tracking_choices(), &[TrackingBackend::Dtb]);
}

#[test]
fn test_probabilistic_snaps_dtk_to_mrtrix() {
    let mut cfg = DiffusionConfig::default();
    cfg.set_imaging_model(ImagingModel::Hardi).unwrap();
    cfg.set_diffusion_model(DiffusionModel::Probabilistic).unwrap();
    assert_eq!(cfg.reconstruction_software(), ReconstructionBackend::Mrtrix);
    assert_eq!(cfg.tracking_software(), TrackingBackend::Mrtrix);
}

#[test]
fn test_illegal_choices_leave_config_untouched() {
    let mut cfg = DiffusionConfig::default();
    cfg.set_imaging_model(ImagingModel::Dsi).unwrap();
    let before = cfg.clone();

    assert!(matches!(
        cfg.set_reconstruction_software(ReconstructionBackend::Mrtrix),
        Err(ConfigError::IllegalChoice { .. })
    ));
    assert!(matches!(
        cfg.set_tracking_software(TrackingBackend::Camino),
        Err(ConfigError::IllegalChoice { .. })
    ));
    assert!(matches!(
        cfg.set_diffusion_model(DiffusionModel::Probabilistic),
        Err(ConfigError::IllegalChoice { .. })
    ));
    assert!(matches!(
        cfg.set_resampling((2.0, 0.0, 2.0)),
        Err(ConfigError::OutOfRange { .. })
    ));
    assert_eq!(cfg, before);
}

#[test]
fn test_tracking_choice_pairs_reconstruction() {
    let mut cfg = DiffusionConfig::default();
    cfg.set_tracking_software(TrackingBackend::Camino).unwrap();
    assert_eq!(cfg.reconstruction_software(), ReconstructionBackend::Camino);
    cfg.set_tracking_software(TrackingBackend::Dtb).unwrap();
    assert_eq!(cfg.reconstruction_software(), ReconstructionBackend::Dtk);
}

#[test]
fn test_camino_tensor_count_snaps_model() {
    let mut cfg = DiffusionConfig::default();
    cfg.camino_recon.set_number_of_tensors(NumberOfTensors::Three);
    assert_eq!(cfg.camino_recon.diffusion_model(), "cylcylcyl");
    assert!(cfg.camino_recon.set_diffusion_model("dt").is_err());
    cfg.camino_recon.set_diffusion_model("pospospos").unwrap();

    cfg.camino_recon.set_number_of_tensors(NumberOfTensors::One);
    assert_eq!(cfg.camino_recon.diffusion_model(), "dt");
    assert_eq!(cfg.camino_recon.max_components(), 1);
}
