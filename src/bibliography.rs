/// [crate::bibliography] is the citation register: an order-preserving,
/// content-deduplicated view over [crate::project::Project::bibliography].
/// Duplicate detection compares canonical forms
/// ([crate::properties::canonical_citation]), so independently formatted
/// copies of the same source collapse to one entry.
use std::collections::BTreeSet;

use tracing::debug;

use crate::{error::SkripsiError, project::BibliographyEntry};

/// Result of a manual addition attempt. A duplicate is an informational
/// signal for the caller, never an error, and leaves the list untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegisterOutcome {
    Accepted,
    Duplicate,
}

fn canonical_set(entries: &[BibliographyEntry]) -> BTreeSet<String> {
    entries.iter().map(BibliographyEntry::canonical).collect()
}

/// Attempt to append a manually entered citation. Rejects (without mutating
/// the list) when an entry with the same canonical form is already present.
/// An entry whose citation text is empty after trimming is a validation
/// error: there is nothing to register.
pub fn add_manual(
    entries: &mut Vec<BibliographyEntry>,
    candidate: BibliographyEntry,
) -> Result<RegisterOutcome, SkripsiError> {
    if candidate.formatted_citation.trim().is_empty() {
        return Err(SkripsiError::Validation(
            "Citation text is empty; nothing to add to the bibliography".to_string(),
        ));
    }
    if canonical_set(entries).contains(&candidate.canonical()) {
        debug!("rejecting duplicate citation {}", candidate.id);
        return Ok(RegisterOutcome::Duplicate);
    }
    entries.push(candidate);
    Ok(RegisterOutcome::Accepted)
}

/// Merge a batch of backend-proposed references into the list. Duplicates of
/// existing entries, duplicates *within* the batch, and empty citation
/// payloads are silently dropped; genuinely new entries are appended at the
/// end in batch order. Returns how many entries were appended.
pub fn merge_generated(
    entries: &mut Vec<BibliographyEntry>,
    batch: Vec<BibliographyEntry>,
) -> usize {
    let mut seen = canonical_set(entries);
    let mut appended = 0;
    for candidate in batch {
        if candidate.formatted_citation.trim().is_empty() {
            debug!("dropping empty citation payload {}", candidate.id);
            continue;
        }
        if !seen.insert(candidate.canonical()) {
            debug!("dropping duplicate citation {}", candidate.id);
            continue;
        }
        entries.push(candidate);
        appended += 1;
    }
    appended
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(id: &str, citation: &str) -> BibliographyEntry {
        BibliographyEntry {
            id: id.to_string(),
            formatted_citation: citation.to_string(),
        }
    }

    #[test]
    fn manual_duplicate_is_rejected_without_mutation() {
        let mut list = vec![entry("kotler-2017", "Kotler, P (2017) Marketing")];
        let outcome = add_manual(&mut list, entry("manual-1", "Kotler, P. (2017). Marketing."));
        assert_eq!(outcome, Ok(RegisterOutcome::Duplicate));
        assert_eq!(list.len(), 1);
        assert_eq!(list[0].id, "kotler-2017");
    }

    #[test]
    fn manual_new_entry_is_appended() {
        let mut list = vec![entry("kotler-2017", "Kotler, P. (2017). Marketing.")];
        let outcome = add_manual(
            &mut list,
            entry("tjiptono-2020", "Tjiptono, F. (2020). Pemasaran Jasa."),
        );
        assert_eq!(outcome, Ok(RegisterOutcome::Accepted));
        assert_eq!(list.len(), 2);
        assert_eq!(list[1].id, "tjiptono-2020");
    }

    #[test]
    fn manual_empty_citation_is_a_validation_error() {
        let mut list = Vec::new();
        assert!(matches!(
            add_manual(&mut list, entry("manual-1", "   ")),
            Err(SkripsiError::Validation(_))
        ));
        assert!(list.is_empty());
    }

    #[test]
    fn merge_filters_duplicates_and_preserves_order() {
        let mut list = vec![entry("kotler-2017", "Kotler, P (2017) Marketing")];
        let appended = merge_generated(
            &mut list,
            vec![
                entry("kotler-2017b", "Kotler, P. (2017). Marketing."),
                entry("rangkuti-2019", "Rangkuti, F. (2019). Analisis SWOT."),
                entry("rangkuti-2019b", "RANGKUTI F 2019 analisis swot"),
                entry("empty", ""),
            ],
        );
        assert_eq!(appended, 1);
        assert_eq!(list.len(), 2);
        assert_eq!(list[0].id, "kotler-2017");
        assert_eq!(list[1].id, "rangkuti-2019");
    }

    #[test]
    fn merge_keeps_first_of_intra_batch_duplicates() {
        let mut list = Vec::new();
        merge_generated(
            &mut list,
            vec![
                entry("a", "Sugiyono. (2019). Metode Penelitian."),
                entry("b", "Sugiyono (2019) Metode Penelitian"),
            ],
        );
        assert_eq!(list.len(), 1);
        assert_eq!(list[0].id, "a");
    }
}
