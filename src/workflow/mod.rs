//! Workflow metadata consumed by the annotator.

pub mod entities;
pub mod repositories;

pub use entities::{Tag, TagId, Workflow, WorkflowId};
pub use repositories::WorkflowRepository;
