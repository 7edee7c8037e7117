use std::collections::{BTreeSet, HashMap};

use chrono::{DateTime, Utc};

use super::{model::SemanticAnnotation, repositories::ParentLink};
use crate::ontology::{ConceptId, OntologyStore};

/// Outcome of a single generalization hop.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Expansion {
    /// New generalization records, one per resolvable source annotation.
    pub annotations: Vec<SemanticAnnotation>,
    /// Source annotations whose concept has no parent.
    pub roots_skipped: usize,
    /// Parent references that no concept owns.
    pub unresolved: BTreeSet<String>,
}

/// Derives generalization annotations one hierarchy level up.
///
/// Every produced record has `distance = 1` whatever the distance of its
/// source, so calling [`Expander::expand`] again over its own output climbs
/// one further level per call.
pub struct Expander<'a, S>
where
    S: OntologyStore + ?Sized,
{
    store: &'a S,
}

impl<'a, S> Expander<'a, S>
where
    S: OntologyStore + ?Sized,
{
    #[must_use]
    pub fn new(store: &'a S) -> Self {
        Self { store }
    }

    /// Expands each link to its resolved parent concept.
    ///
    /// Missing parents and dangling references are skipped; only store
    /// failures abort the hop.
    pub async fn expand(
        &self,
        links: &[ParentLink],
        created_at: DateTime<Utc>,
    ) -> Result<Expansion, S::Error> {
        let mut expansion = Expansion::default();
        let mut resolved: HashMap<&str, Option<ConceptId>> = HashMap::new();

        for link in links {
            let Some(parent) = link.parent.as_deref().filter(|parent| !parent.is_empty()) else {
                expansion.roots_skipped += 1;
                continue;
            };

            let concept = match resolved.get(parent) {
                Some(cached) => *cached,
                None => {
                    let concept = self.store.resolve_parent_reference(parent).await?;
                    resolved.insert(parent, concept);
                    concept
                }
            };

            let Some(concept) = concept else {
                expansion.unresolved.insert(parent.to_owned());
                continue;
            };

            expansion.annotations.push(SemanticAnnotation::generalization(
                link.workflow,
                concept,
                link.metadata_type,
                link.metadata_item,
                created_at,
            ));
        }

        Ok(expansion)
    }
}
