/// [crate::project] defines the Document Model: the canonical in-memory
/// representation of one thesis project. It is the single source of truth;
/// the page table ([crate::pagination]) and unlock flags
/// ([crate::progression]) are pure views recomputed from it and are never
/// persisted as authoritative state.
use std::collections::BTreeMap;

use chrono::Local;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::properties::{
    canonical_citation, AcademicLevel, AppendixKind, ChapterKey, UUID_NAMESPACE_SKRIPSI,
};

/// Placeholder shown for a preface that has not been generated yet. Also the
/// backward-compatibility default for payloads missing the field entirely.
pub const PREFACE_PLACEHOLDER: &str = "<p>Kata Pengantar belum dibuat.</p>";
/// Placeholder shown for an abstract that has not been generated yet.
pub const ABSTRACT_PLACEHOLDER: &str = "<p>Abstrak belum dibuat.</p>";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthorInfo {
    pub student_name: String,
    pub student_id: String,
    pub institution_name: String,
    pub faculty_name: String,
    pub study_program: String,
    pub submission_year: String,
}

/// The six free-text outline fields seeding chapter generation. Editable
/// until the introduction chapter is complete, read-only afterwards.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Outline {
    pub background: String,
    pub problem: String,
    pub objective: String,
    pub benefits: String,
    pub writing_systematics: String,
    pub thinking_framework: String,
}

/// Names one field of [Outline] for granular edit commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum OutlineField {
    Background,
    Problem,
    Objective,
    Benefits,
    WritingSystematics,
    ThinkingFramework,
}

impl Outline {
    pub fn field(&self, field: OutlineField) -> &str {
        match field {
            OutlineField::Background => &self.background,
            OutlineField::Problem => &self.problem,
            OutlineField::Objective => &self.objective,
            OutlineField::Benefits => &self.benefits,
            OutlineField::WritingSystematics => &self.writing_systematics,
            OutlineField::ThinkingFramework => &self.thinking_framework,
        }
    }

    pub fn set_field(&mut self, field: OutlineField, value: String) {
        match field {
            OutlineField::Background => self.background = value,
            OutlineField::Problem => self.problem = value,
            OutlineField::Objective => self.objective = value,
            OutlineField::Benefits => self.benefits = value,
            OutlineField::WritingSystematics => self.writing_systematics = value,
            OutlineField::ThinkingFramework => self.thinking_framework = value,
        }
    }
}

/// One bibliography entry: a unique id plus the fully formatted citation
/// string (APA style, possibly carrying markup). Content-level uniqueness is
/// enforced by [crate::bibliography], not by the id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BibliographyEntry {
    pub id: String,
    /// Wire name kept as `apa` for compatibility with exchanged project files.
    #[serde(rename = "apa")]
    pub formatted_citation: String,
}

impl BibliographyEntry {
    /// Build a manually entered citation with a stable id derived from the
    /// canonical form of the citation text.
    pub fn manual(formatted_citation: impl Into<String>) -> Self {
        let formatted_citation = formatted_citation.into();
        let tag = Uuid::new_v5(
            &UUID_NAMESPACE_SKRIPSI,
            canonical_citation(&formatted_citation).as_bytes(),
        );
        BibliographyEntry {
            id: format!("manual-{}", tag.simple()),
            formatted_citation,
        }
    }

    pub fn canonical(&self) -> String {
        canonical_citation(&self.formatted_citation)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppendixEntry {
    pub id: String,
    pub title: String,
    #[serde(rename = "type")]
    pub kind: AppendixKind,
    /// HTML for `table` entries, serialized chart data for `chart` entries.
    pub content: String,
}

impl AppendixEntry {
    pub fn new(title: impl Into<String>, kind: AppendixKind, content: impl Into<String>) -> Self {
        let title = title.into();
        let content = content.into();
        let tag = Uuid::new_v5(&UUID_NAMESPACE_SKRIPSI, format!("{title}\n{content}").as_bytes());
        AppendixEntry {
            id: format!("appendix-{}", tag.simple()),
            title,
            kind,
            content,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatementPageData {
    pub student_name: String,
    pub student_id: String,
    pub statement_date: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApprovalData {
    pub student_name: String,
    pub student_id: String,
    pub study_program: String,
    pub supervisor1_name: String,
    pub supervisor1_id: String,
    pub supervisor2_name: String,
    pub supervisor2_id: String,
    pub approval_date: String,
}

/// The root aggregate: one thesis project.
///
/// The serde `default` attributes implement the backward-compatibility
/// contract for older payloads: missing lists become empty, missing
/// sub-records become `None`, a missing preface/abstract gets its placeholder
/// and a missing activation flag becomes `false`. A field that is *present*
/// is always preserved verbatim, including empty strings and explicit
/// `false`, and the defaulting is idempotent because every default value
/// round-trips unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub title: String,
    pub academic_level: AcademicLevel,
    pub author_info: AuthorInfo,
    pub outline: Outline,
    #[serde(default = "default_preface")]
    pub preface: String,
    #[serde(default = "default_abstract", rename = "abstract")]
    pub abstract_text: String,
    /// Chapter slot to generated HTML content. Keys are the fixed headings of
    /// [ChapterKey]; the enumeration order, not map order, governs sequencing.
    pub chapters: BTreeMap<ChapterKey, String>,
    #[serde(default)]
    pub bibliography: Vec<BibliographyEntry>,
    #[serde(default)]
    pub appendices: Vec<AppendixEntry>,
    #[serde(default)]
    pub statement_page_data: Option<StatementPageData>,
    #[serde(default)]
    pub approval_data: Option<ApprovalData>,
    /// Gates generation of the methodology chapter and everything after it.
    #[serde(default)]
    pub is_activated: bool,
}

fn default_preface() -> String {
    PREFACE_PLACEHOLDER.to_string()
}

fn default_abstract() -> String {
    ABSTRACT_PLACEHOLDER.to_string()
}

impl Project {
    /// Assemble a fresh project from the creation workflow's generated parts.
    /// Statement and approval records are pre-filled from the author info with
    /// today's date; supervisor fields are left blank for the user.
    pub fn new(
        title: impl Into<String>,
        academic_level: AcademicLevel,
        author_info: AuthorInfo,
        outline: Outline,
        preface: String,
        abstract_text: String,
    ) -> Self {
        let today = Local::now().format("%-d %B %Y").to_string();
        let statement_page_data = Some(StatementPageData {
            student_name: author_info.student_name.clone(),
            student_id: author_info.student_id.clone(),
            statement_date: today.clone(),
        });
        let approval_data = Some(ApprovalData {
            student_name: author_info.student_name.clone(),
            student_id: author_info.student_id.clone(),
            study_program: author_info.study_program.clone(),
            supervisor1_name: String::new(),
            supervisor1_id: String::new(),
            supervisor2_name: String::new(),
            supervisor2_id: String::new(),
            approval_date: today,
        });
        Project {
            title: title.into(),
            academic_level,
            author_info,
            outline,
            preface,
            abstract_text,
            chapters: BTreeMap::new(),
            bibliography: Vec::new(),
            appendices: Vec::new(),
            statement_page_data,
            approval_data,
            is_activated: false,
        }
    }

    pub fn chapter_content(&self, key: ChapterKey) -> Option<&str> {
        self.chapters.get(&key).map(String::as_str)
    }

    pub fn set_chapter(&mut self, key: ChapterKey, content: String) {
        self.chapters.insert(key, content);
    }
}
