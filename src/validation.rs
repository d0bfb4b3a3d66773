//! Subject attribute validation
//!
//! Every recording of a subject must carry exactly the same breed, weight and
//! age. Validation is done in one pass over all recordings and reports every
//! conflicting subject, not just the first.

use crate::error::ComputeError;
use crate::types::{Recording, SubjectAttributes, SubjectId};
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::warn;

/// A subject whose recordings disagree on static attributes
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AttributeConflict {
    pub pet_id: SubjectId,
    /// Distinct attribute sets, in order of first appearance
    pub variants: Vec<SubjectAttributes>,
    /// Row indices of the subject's recordings
    pub row_indices: Vec<usize>,
}

/// Validator for per-subject attribute invariance
pub struct SubjectValidator;

impl SubjectValidator {
    /// Collect every subject with more than one distinct attribute set
    pub fn find_conflicts(recordings: &[Recording]) -> Vec<AttributeConflict> {
        group_variants(recordings)
            .into_iter()
            .filter(|(_, group)| group.variants.len() > 1)
            .map(|(pet_id, group)| AttributeConflict {
                pet_id,
                variants: group.variants,
                row_indices: group.row_indices,
            })
            .collect()
    }

    /// Verify attribute invariance and return the attributes of each subject.
    ///
    /// # Errors
    /// [`ComputeError::InconsistentSubjectAttributes`] listing every offending
    /// subject, in subject order.
    pub fn verify(
        recordings: &[Recording],
    ) -> Result<BTreeMap<SubjectId, SubjectAttributes>, ComputeError> {
        let groups = group_variants(recordings);

        let offenders: Vec<String> = groups
            .iter()
            .filter(|(_, group)| group.variants.len() > 1)
            .map(|(pet_id, _)| pet_id.to_string())
            .collect();

        if !offenders.is_empty() {
            warn!(subjects = ?offenders, "inconsistent subject attributes");
            return Err(ComputeError::InconsistentSubjectAttributes(offenders));
        }

        Ok(groups
            .into_iter()
            .filter_map(|(pet_id, group)| {
                group
                    .variants
                    .into_iter()
                    .next()
                    .map(|attributes| (pet_id, attributes))
            })
            .collect())
    }
}

/// Verify that all recordings of each subject agree on breed, weight and age
pub fn verify_subject_attributes(
    recordings: &[Recording],
) -> Result<BTreeMap<SubjectId, SubjectAttributes>, ComputeError> {
    SubjectValidator::verify(recordings)
}

#[derive(Default)]
struct VariantGroup {
    variants: Vec<SubjectAttributes>,
    row_indices: Vec<usize>,
}

fn group_variants(recordings: &[Recording]) -> BTreeMap<SubjectId, VariantGroup> {
    let mut groups: BTreeMap<SubjectId, VariantGroup> = BTreeMap::new();

    for recording in recordings {
        let group = groups.entry(recording.pet_id.clone()).or_default();
        if !group.variants.contains(&recording.attributes) {
            group.variants.push(recording.attributes.clone());
        }
        group.row_indices.push(recording.row_index);
    }

    groups
}
