//! JSON question catalog loader.
//!
//! The catalog is read once at startup. Any failure here is fatal for the
//! caller; there is no partial catalog.

use std::path::{Path, PathBuf};

use quiz_core::model::{Catalog, CatalogError, Question};
use thiserror::Error;

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum CatalogLoadError {
    #[error("failed to read catalog {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed catalog: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid catalog: {0}")]
    Invalid(#[from] CatalogError),
}

/// Parse and validate a catalog from its JSON text.
///
/// # Errors
///
/// Returns `CatalogLoadError::Json` for malformed JSON or unknown difficulties,
/// and `CatalogLoadError::Invalid` for structural problems.
pub fn parse_catalog(json: &str) -> Result<Catalog, CatalogLoadError> {
    let questions: Vec<Question> = serde_json::from_str(json)?;
    Ok(Catalog::new(questions)?)
}

/// Read, parse and validate the catalog at `path`.
///
/// # Errors
///
/// Returns `CatalogLoadError::Io` if the file cannot be read, otherwise the
/// errors of [`parse_catalog`].
pub fn load_catalog(path: impl AsRef<Path>) -> Result<Catalog, CatalogLoadError> {
    let path = path.as_ref();
    let raw = std::fs::read_to_string(path).map_err(|source| CatalogLoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let catalog = parse_catalog(&raw)?;
    tracing::info!(path = %path.display(), questions = catalog.len(), "catalog loaded");
    Ok(catalog)
}
