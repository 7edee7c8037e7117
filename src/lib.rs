//! Ontology-driven semantic annotation of scientific workflow metadata.
//!
//! Terms of every loaded ontology are matched as whole words against
//! workflow titles, descriptions and tags; each match becomes a
//! [`annotation::SemanticAnnotation`]. A separate expansion step lifts
//! annotations one level up the concept hierarchy.
//!
//! ```no_run
//! use semantic_annotator::{annotation::SemanticAnnotator, config::Config};
//!
//! # async fn demo() -> semantic_annotator::Result<()> {
//! let config = Config::from_yaml("store:\n  kind: in_memory\n  seed: fixtures/edam.yaml\n")?;
//! let annotator = SemanticAnnotator::from_config(&config.store, config.annotator).await?;
//! let report = annotator.run().await?;
//! println!("{} annotations written", report.annotations_written());
//! # Ok(())
//! # }
//! ```

pub mod annotation;
#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod error;
pub mod logger;
pub mod ontology;
pub mod store;
pub mod workflow;

pub use error::{Error, Result};
