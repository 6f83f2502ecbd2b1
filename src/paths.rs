//! Filename helpers shared by flow builders and the tool catalogue.
//!
//! Downstream nodes locate their inputs by names derived here, so the rules
//! must stay byte-for-byte stable.

use std::path::Path;

/// Extensions that are treated as a single unit when splitting.
const COMPOUND_EXTENSIONS: &[&str] = &[".nii.gz", ".tar.gz", ".niml.dset"];

/// Split a path into `(directory, base name, extension)`.
///
/// Compound extensions such as `.nii.gz` are kept whole. The directory is
/// empty for a bare filename.
pub fn split_filename(path: &str) -> (String, String, String) {
    let p = Path::new(path);
    let dir = p
        .parent()
        .map(|d| d.to_string_lossy().into_owned())
        .unwrap_or_default();
    let file = p
        .file_name()
        .map(|f| f.to_string_lossy().into_owned())
        .unwrap_or_default();

    if let Some(ext) = COMPOUND_EXTENSIONS.iter().find(|ext| file.ends_with(*ext)) {
        let base = file[..file.len() - ext.len()].to_string();
        return (dir, base, ext.to_string());
    }

    match file.rfind('.') {
        Some(dot) if dot > 0 => (dir, file[..dot].to_string(), file[dot..].to_string()),
        _ => (dir, file, String::new()),
    }
}

/// Join `dir` and `name` the way a shell path would read.
pub fn join(dir: &str, name: &str) -> String {
    if dir.is_empty() {
        name.to_string()
    } else {
        Path::new(dir).join(name).to_string_lossy().into_owned()
    }
}

/// Derive the output prefix `<dir>/<prefix>_` from an upstream filename.
///
/// `strip_suffix("/data/recon/dsi_odf.nii", "dsi")` is `/data/recon/dsi_`.
pub fn strip_suffix(file_input: &str, prefix: &str) -> String {
    let (dir, _, _) = split_filename(file_input);
    join(&dir, &format!("{}_", prefix))
}
