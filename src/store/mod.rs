//! Adapters implementing the ontology, workflow and annotation ports.

use std::path::PathBuf;

use thiserror::Error;

use crate::ontology::{IriError, OntologyError, OntologyId};

pub mod memory;
pub mod seed;
#[cfg(feature = "with-db")]
pub mod sqlite;

pub use memory::InMemoryStore;
pub use seed::Seed;
#[cfg(feature = "with-db")]
pub use sqlite::SqliteStore;

/// Errors raised by store adapters.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The database rejected a statement or could not be reached.
    #[cfg(feature = "with-db")]
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    /// Attempted to load an ontology whose identifier is taken.
    #[error("ontology `{0}` already exists")]
    DuplicateOntology(OntologyId),
    /// Domain validation failed while loading ontology data.
    #[error("domain error: {0}")]
    Domain(#[from] OntologyError),
    /// Ontology data carried a malformed IRI.
    #[error(transparent)]
    Iri(#[from] IriError),
    /// A stored value could not be mapped back to the domain.
    #[error("unexpected value in column `{column}`: {message}")]
    Corrupt {
        column: &'static str,
        message: String,
    },
    /// Reading a seed fixture failed.
    #[error("failed to access seed `{path}`: {source}")]
    SeedIo {
        path: PathBuf,
        source: std::io::Error,
    },
    /// A seed fixture could not be parsed.
    #[error("invalid seed `{path}`: {message}")]
    SeedFormat { path: PathBuf, message: String },
    /// The configured backend was not compiled into this build.
    #[error("store backend `{0}` is not available in this build")]
    Unsupported(&'static str),
}

impl StoreError {
    pub(crate) fn corrupt(column: &'static str, message: impl ToString) -> Self {
        Self::Corrupt {
            column,
            message: message.to_string(),
        }
    }
}
