use serde::Serialize;

/// Coarse outcome of a batch entry point.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub enum RunStatus {
    #[default]
    #[serde(rename = "OK")]
    Ok,
}

/// Summary of an annotation pass.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct AnnotationReport {
    pub status: RunStatus,
    pub dictionary_terms: usize,
    pub workflows_processed: usize,
    pub fields_scanned: usize,
    pub annotations_written: usize,
    pub duplicates_skipped: usize,
}

/// Summary of a single generalization hop.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ExpansionReport {
    pub status: RunStatus,
    pub annotations_read: usize,
    pub roots_skipped: usize,
    pub annotations_written: usize,
    pub duplicates_skipped: usize,
    pub unresolved_references: Vec<String>,
}

/// Summary of a full annotate-then-expand pipeline.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct PipelineReport {
    pub status: RunStatus,
    pub annotation: AnnotationReport,
    pub expansions: Vec<ExpansionReport>,
}

impl PipelineReport {
    /// Total records written across every stage.
    #[must_use]
    pub fn annotations_written(&self) -> usize {
        self.annotation.annotations_written
            + self
                .expansions
                .iter()
                .map(|hop| hop.annotations_written)
                .sum::<usize>()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_serializes_like_the_coarse_contract() {
        let value = serde_json::to_value(ExpansionReport::default()).expect("serialize");
        assert_eq!(value["status"], "OK");
        assert_eq!(value["unresolved_references"], serde_json::json!([]));
    }

    #[test]
    fn pipeline_totals_every_stage() {
        let report = PipelineReport {
            annotation: AnnotationReport {
                annotations_written: 3,
                ..AnnotationReport::default()
            },
            expansions: vec![
                ExpansionReport {
                    annotations_written: 2,
                    ..ExpansionReport::default()
                },
                ExpansionReport {
                    annotations_written: 1,
                    ..ExpansionReport::default()
                },
            ],
            ..PipelineReport::default()
        };
        assert_eq!(report.annotations_written(), 6);
    }
}
