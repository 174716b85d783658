use std::path::PathBuf;

/// Everything that can sink a run. Structural data problems are fatal and
/// never retried; fetch failures propagate to the caller, which owns any
/// whole-run retry.
#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    #[error("failed to load the reference catalog from `{path}`: {reason}")]
    CatalogLoad { path: PathBuf, reason: String },

    #[error("broken reference chain: {0}")]
    ReferenceIntegrity(String),

    #[error("portal request failed")]
    Fetch(#[from] reqwest::Error),

    #[error("unexpected portal response: {0}")]
    PortalResponse(String),

    #[error("{message} (line {line})")]
    CsvParse { message: String, line: u64 },

    #[error("measurement for an unknown unit: `{plant_name}` / `{unit_name}`")]
    UnmatchedMeasurement { plant_name: String, unit_name: String },

    #[error("palette `{colors}` has no color left for `{unit}` in `{group}`")]
    PaletteExhausted { group: String, colors: String, unit: String },

    #[error("post {index} carries {count} images, above the cap of {cap}")]
    PostMediaCapExceeded { index: usize, count: usize, cap: usize },
}
