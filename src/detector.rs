use std::path::{Path, PathBuf};

use crate::models::InputFormat;

/// Detect the row format of an input file from its extension.
pub fn detect_format(path: &Path) -> Option<InputFormat> {
    let ext = path.extension()?.to_str()?.to_lowercase();
    match ext.as_str() {
        "json" => Some(InputFormat::Json),
        "csv" => Some(InputFormat::Csv),
        _ => None,
    }
}

/// Expand the given paths into input files. Directories contribute their
/// supported files (non-recursive, sorted by name); unsupported files are skipped.
pub fn collect_inputs(paths: &[PathBuf]) -> Vec<(PathBuf, InputFormat)> {
    let mut inputs = Vec::new();

    for path in paths {
        if path.is_dir() {
            let mut found: Vec<PathBuf> = match std::fs::read_dir(path) {
                Ok(rd) => rd
                    .filter_map(|e| e.ok().map(|e| e.path()))
                    .filter(|p| p.is_file())
                    .collect(),
                Err(err) => {
                    tracing::warn!(path = %path.display(), error = %err, "cannot read input directory");
                    continue;
                }
            };
            found.sort();
            inputs.extend(found.into_iter().filter_map(|p| detect_format(&p).map(|f| (p, f))));
        } else if let Some(format) = detect_format(path) {
            inputs.push((path.clone(), format));
        } else {
            tracing::warn!(path = %path.display(), "unsupported input file, expected .json or .csv");
        }
    }

    inputs
}
