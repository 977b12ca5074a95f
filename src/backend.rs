/// [crate::backend] is the interface contract with the generative-text
/// service. The service itself is an external collaborator; this module owns
/// the request/response data shapes, the tolerant parsing of raw model output
/// into a [ChapterResponse], and the granular paragraph-rewrite splice.
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;
use uuid::Uuid;

use crate::{
    error::SkripsiError,
    project::{BibliographyEntry, Outline},
    properties::{AcademicLevel, ChapterKey, UUID_NAMESPACE_SKRIPSI},
};

/// Fallback chapter content when the raw response carries no parseable JSON.
pub const FALLBACK_CONTENT: &str =
    "<p>Terjadi kesalahan saat memproses respons dari AI karena format data tidak sesuai. \
     Silakan coba lagi.</p>";

/// Fallback when the JSON parses but the content field is missing or empty.
pub const MISSING_CONTENT: &str = "<p>Gagal mengekstrak konten bab dari respons AI.</p>";

/// Everything the backend needs to draft one chapter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChapterRequest {
    pub chapter: ChapterKey,
    pub title: String,
    pub outline: Outline,
    pub academic_level: AcademicLevel,
    pub min_references: u32,
    pub min_characters: u32,
    /// Only attached for the bibliography-compilation chapter, which formats
    /// the collected list instead of researching new sources.
    pub bibliography: Option<Vec<BibliographyEntry>>,
}

/// Parsed generation result: chapter HTML plus newly proposed references.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChapterResponse {
    pub content: String,
    pub references: Vec<BibliographyEntry>,
}

impl ChapterResponse {
    fn fallback() -> Self {
        ChapterResponse {
            content: FALLBACK_CONTENT.to_string(),
            references: Vec::new(),
        }
    }
}

/// The generative-text service. Implementations wrap whatever transport the
/// host provides; `generate_chapter` returns the *raw* model text, which the
/// core then runs through [parse_chapter_response].
#[async_trait]
pub trait GenerativeBackend: Send + Sync {
    async fn generate_chapter(&self, request: &ChapterRequest) -> Result<String, SkripsiError>;

    /// Rewrite one paragraph with equivalent meaning but different structure
    /// and diction.
    async fn rewrite_paragraph(&self, text: &str) -> Result<String, SkripsiError>;
}

/// Extract a [ChapterResponse] from raw model output.
///
/// Models wrap JSON in markdown fences or prose, so the parser strips fence
/// markers and takes the substring between the first `{` and the last `}`.
/// Degrades rather than fails: unparseable output yields [FALLBACK_CONTENT],
/// a missing content field yields [MISSING_CONTENT], and references with a
/// missing or non-string citation are dropped.
pub fn parse_chapter_response(raw: &str) -> ChapterResponse {
    let cleaned = raw.replace("```json", "").replace("```", "");
    let cleaned = cleaned.trim();
    let (first, last) = match (cleaned.find('{'), cleaned.rfind('}')) {
        (Some(first), Some(last)) if first < last => (first, last),
        _ => {
            warn!("generation response contained no JSON object");
            return ChapterResponse::fallback();
        }
    };
    let value: Value = match serde_json::from_str(&cleaned[first..=last]) {
        Ok(value) => value,
        Err(err) => {
            warn!("generation response JSON did not parse: {err}");
            return ChapterResponse::fallback();
        }
    };

    let content = value
        .get("chapter_content")
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| MISSING_CONTENT.to_string());

    let references = value
        .get("references")
        .and_then(Value::as_array)
        .map(|items| items.iter().filter_map(reference_from_value).collect())
        .unwrap_or_default();

    ChapterResponse { content, references }
}

fn reference_from_value(value: &Value) -> Option<BibliographyEntry> {
    let citation = value.get("apa")?.as_str()?.trim();
    if citation.is_empty() {
        return None;
    }
    let id = match value.get("id").and_then(Value::as_str) {
        Some(id) if !id.is_empty() => id.to_string(),
        _ => {
            let tag = Uuid::new_v5(&UUID_NAMESPACE_SKRIPSI, citation.as_bytes());
            format!("ref-{}", tag.simple())
        }
    };
    Some(BibliographyEntry {
        id,
        formatted_citation: citation.to_string(),
    })
}

/// Replace the byte range `start..end` of `content` with `replacement`, as a
/// single granular edit. The bounds must lie on character boundaries.
pub fn splice_fragment(
    content: &str,
    start: usize,
    end: usize,
    replacement: &str,
) -> Result<String, SkripsiError> {
    if start > end
        || end > content.len()
        || !content.is_char_boundary(start)
        || !content.is_char_boundary(end)
    {
        return Err(SkripsiError::Command(format!(
            "Fragment range {start}..{end} does not address the target content"
        )));
    }
    let mut out = String::with_capacity(content.len() - (end - start) + replacement.len());
    out.push_str(&content[..start]);
    out.push_str(replacement);
    out.push_str(&content[end..]);
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_fenced_json_with_surrounding_prose() {
        let raw = "Here is the chapter:\n```json\n{\"chapter_content\": \"<p>Isi</p>\", \
                   \"references\": [{\"id\": \"kotler-2017\", \"apa\": \"Kotler, P. (2017).\"}]}\n```";
        let response = parse_chapter_response(raw);
        assert_eq!(response.content, "<p>Isi</p>");
        assert_eq!(response.references.len(), 1);
        assert_eq!(response.references[0].id, "kotler-2017");
    }

    #[test]
    fn non_json_output_degrades_to_fallback() {
        let response = parse_chapter_response("I could not comply with the request.");
        assert_eq!(response.content, FALLBACK_CONTENT);
        assert!(response.references.is_empty());
    }

    #[test]
    fn truncated_json_degrades_to_fallback() {
        let response = parse_chapter_response("{\"chapter_content\": \"<p>Is}");
        assert_eq!(response.content, FALLBACK_CONTENT);
    }

    #[test]
    fn missing_content_field_gets_placeholder_but_keeps_references() {
        let raw = r#"{"references": [{"id": "a", "apa": "Sugiyono. (2019)."}]}"#;
        let response = parse_chapter_response(raw);
        assert_eq!(response.content, MISSING_CONTENT);
        assert_eq!(response.references.len(), 1);
    }

    #[test]
    fn malformed_references_are_dropped() {
        let raw = r#"{
            "chapter_content": "<p>Isi</p>",
            "references": [
                {"id": "ok", "apa": "Kotler, P. (2017)."},
                {"id": "no-apa"},
                {"id": "numeric", "apa": 42},
                {"id": "blank", "apa": "   "},
                "not an object"
            ]
        }"#;
        let response = parse_chapter_response(raw);
        assert_eq!(response.references.len(), 1);
        assert_eq!(response.references[0].id, "ok");
    }

    #[test]
    fn reference_without_id_gets_a_derived_one() {
        let raw = r#"{"chapter_content": "<p>x</p>", "references": [{"apa": "Kotler, P. (2017)."}]}"#;
        let response = parse_chapter_response(raw);
        assert!(response.references[0].id.starts_with("ref-"));
    }

    #[test]
    fn splice_replaces_exactly_the_fragment() {
        let content = "<p>Alpha.</p><p>Beta.</p>";
        let spliced = splice_fragment(content, 12, 24, "<p>Gamma.</p>").unwrap();
        assert_eq!(spliced, "<p>Alpha.</p><p>Gamma.</p>");
    }

    #[test]
    fn splice_rejects_out_of_bounds_and_split_chars() {
        assert!(splice_fragment("abc", 2, 1, "x").is_err());
        assert!(splice_fragment("abc", 0, 9, "x").is_err());
        // 'é' is two bytes; offset 1 falls inside it.
        assert!(splice_fragment("é", 1, 2, "x").is_err());
    }
}
