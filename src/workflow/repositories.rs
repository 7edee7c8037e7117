use async_trait::async_trait;

use super::entities::{Tag, Workflow, WorkflowId};

/// Read-only contract over the workflows and their tags.
#[async_trait]
pub trait WorkflowRepository {
    /// Associated error type allowing infrastructure specific failures.
    type Error;

    /// Lists every workflow with its title and description.
    async fn list_workflows(&self) -> Result<Vec<Workflow>, Self::Error>;

    /// Lists the tags attached to a workflow.
    ///
    /// Implementors should return each tag once, ordered by identifier.
    async fn list_tags(&self, workflow: WorkflowId) -> Result<Vec<Tag>, Self::Error>;
}
