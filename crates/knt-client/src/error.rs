//! Client error types

use std::path::PathBuf;
use thiserror::Error;

use knt_core::ResourceKind;

/// Errors raised while loading the agent manifest
#[derive(Error, Debug)]
pub enum ManifestError {
    /// Manifest file could not be read
    #[error("Failed to read manifest {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Manifest is not valid YAML
    #[error("Invalid manifest YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// A required document is absent
    #[error("Manifest has no {0} document")]
    MissingDocument(ResourceKind),

    /// The same kind appears twice
    #[error("Manifest has more than one {0} document")]
    DuplicateDocument(ResourceKind),

    /// A document of a kind the client does not manage
    #[error("Unsupported manifest document kind: {0}")]
    UnsupportedKind(String),

    /// A field the run depends on is missing or has the wrong type
    #[error("{kind} manifest is missing {field}")]
    MissingField {
        kind: ResourceKind,
        field: &'static str,
    },
}
