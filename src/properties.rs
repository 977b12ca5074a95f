/// [crate::properties] contains the fixed, ordered enumerations that sequence a
/// [crate::project::Project] document, plus the shared text helpers used by the
/// register, progression and pagination computations.
use enumset::EnumSetType;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

pub use uuid::Uuid;

/// The skripsi-core namespace UUID, used to derive stable v5 identifiers for
/// locally created records (manual bibliography entries, appendix entries).
pub const UUID_NAMESPACE_SKRIPSI: Uuid = Uuid::from_bytes([
    0x9c, 0x41, 0x7a, 0x02, 0xd3, 0x5e, 0x4f, 0x81, 0xa6, 0x10, 0x2b, 0x74, 0xce, 0x09, 0x5d, 0x13,
]);

/// The six fixed chapter slots of the manuscript, in authoritative order.
///
/// The wire names (and display labels) are the canonical Indonesian chapter
/// headings; insertion order into the chapters map is irrelevant, this
/// enumeration's order governs all sequencing.
#[derive(EnumSetType, Debug, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ChapterKey {
    #[serde(rename = "BAB I PENDAHULUAN")]
    Introduction,
    #[serde(rename = "BAB II LANDASAN TEORI")]
    LiteratureReview,
    #[serde(rename = "BAB III METODOLOGI PENELITIAN")]
    Methodology,
    #[serde(rename = "BAB IV HASIL PENELITIAN DAN PEMBAHASAN")]
    Findings,
    #[serde(rename = "BAB V PENUTUP (KESIMPULAN DAN SARAN)")]
    Conclusion,
    #[serde(rename = "BAB VI DAFTAR PUSTAKA")]
    BibliographyCompilation,
}

impl ChapterKey {
    /// All chapter slots in fixed sequence order.
    pub const ALL: [ChapterKey; 6] = [
        ChapterKey::Introduction,
        ChapterKey::LiteratureReview,
        ChapterKey::Methodology,
        ChapterKey::Findings,
        ChapterKey::Conclusion,
        ChapterKey::BibliographyCompilation,
    ];

    /// The five primary prose chapters. The bibliography-compilation slot is
    /// excluded: it holds a derived listing, not research content.
    pub const PRIMARY: [ChapterKey; 5] = [
        ChapterKey::Introduction,
        ChapterKey::LiteratureReview,
        ChapterKey::Methodology,
        ChapterKey::Findings,
        ChapterKey::Conclusion,
    ];

    /// The canonical heading for this slot, as stored in the chapters map.
    pub fn label(&self) -> &'static str {
        match self {
            ChapterKey::Introduction => "BAB I PENDAHULUAN",
            ChapterKey::LiteratureReview => "BAB II LANDASAN TEORI",
            ChapterKey::Methodology => "BAB III METODOLOGI PENELITIAN",
            ChapterKey::Findings => "BAB IV HASIL PENELITIAN DAN PEMBAHASAN",
            ChapterKey::Conclusion => "BAB V PENUTUP (KESIMPULAN DAN SARAN)",
            ChapterKey::BibliographyCompilation => "BAB VI DAFTAR PUSTAKA",
        }
    }

    /// The slot immediately before this one in sequence order, if any.
    pub fn preceding(&self) -> Option<ChapterKey> {
        match self {
            ChapterKey::Introduction => None,
            ChapterKey::LiteratureReview => Some(ChapterKey::Introduction),
            ChapterKey::Methodology => Some(ChapterKey::LiteratureReview),
            ChapterKey::Findings => Some(ChapterKey::Methodology),
            ChapterKey::Conclusion => Some(ChapterKey::Findings),
            ChapterKey::BibliographyCompilation => Some(ChapterKey::Conclusion),
        }
    }

    /// Whether generating this slot requires the project activation flag.
    /// Editing already-generated content never does.
    pub fn requires_activation(&self) -> bool {
        matches!(self, ChapterKey::Methodology)
    }

    /// Whether this slot is the bibliography-compilation chapter, which takes
    /// the collected bibliography as generation input and yields no new
    /// references.
    pub fn is_bibliography(&self) -> bool {
        matches!(self, ChapterKey::BibliographyCompilation)
    }
}

impl Display for ChapterKey {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// The six fixed front-matter pages preceding the main chapters, in
/// authoritative order. Each occupies exactly one Roman-numbered page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum FrontMatterKey {
    TitlePage,
    ApprovalPage,
    StatementPage,
    Preface,
    Abstract,
    TableOfContents,
}

impl FrontMatterKey {
    pub const ALL: [FrontMatterKey; 6] = [
        FrontMatterKey::TitlePage,
        FrontMatterKey::ApprovalPage,
        FrontMatterKey::StatementPage,
        FrontMatterKey::Preface,
        FrontMatterKey::Abstract,
        FrontMatterKey::TableOfContents,
    ];
}

impl Display for FrontMatterKey {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        match self {
            FrontMatterKey::TitlePage => write!(f, "TitlePage"),
            FrontMatterKey::ApprovalPage => write!(f, "ApprovalPage"),
            FrontMatterKey::StatementPage => write!(f, "StatementPage"),
            FrontMatterKey::Preface => write!(f, "Preface"),
            FrontMatterKey::Abstract => write!(f, "Abstract"),
            FrontMatterKey::TableOfContents => write!(f, "TableOfContents"),
        }
    }
}

/// A key into the page table: either a front-matter page or a chapter slot.
/// The derived ordering places all front matter before all chapters, matching
/// the manuscript's physical ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SectionKey {
    FrontMatter(FrontMatterKey),
    Chapter(ChapterKey),
}

impl Display for SectionKey {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        match self {
            SectionKey::FrontMatter(k) => write!(f, "{k}"),
            SectionKey::Chapter(k) => write!(f, "{k}"),
        }
    }
}

/// Academic level of the manuscript (bachelor, master, doctoral).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum AcademicLevel {
    S1,
    S2,
    S3,
}

impl Display for AcademicLevel {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        match self {
            AcademicLevel::S1 => write!(f, "S1"),
            AcademicLevel::S2 => write!(f, "S2"),
            AcademicLevel::S3 => write!(f, "S3"),
        }
    }
}

/// Kind of an appendix entry: a data table (HTML) or a chart (serialized
/// chart description).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AppendixKind {
    Table,
    Chart,
}

static MARKUP_TAG: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"<[^>]*>").expect("markup tag pattern is statically valid"));

/// Remove every markup tag from an HTML fragment, leaving only text content.
/// Used both for the completion predicate and for page-length estimation.
pub fn strip_markup(html: &str) -> String {
    MARKUP_TAG.replace_all(html, "").into_owned()
}

/// Reduce a formatted citation to its canonical duplicate-detection form:
/// lowercase, with every character outside `[a-z0-9]` removed. Punctuation,
/// spacing and casing differences introduced by independent formatting passes
/// therefore never distinguish two citations.
pub fn canonical_citation(citation: &str) -> String {
    citation
        .to_lowercase()
        .chars()
        .filter(char::is_ascii_alphanumeric)
        .collect()
}

/// Lowercase a title and collapse every run of non-alphanumeric characters
/// into a single hyphen, trimming leading and trailing hyphens.
pub fn slugify(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    let mut pending_sep = false;
    for c in title.to_lowercase().chars() {
        if c.is_ascii_alphanumeric() {
            if pending_sep && !slug.is_empty() {
                slug.push('-');
            }
            pending_sep = false;
            slug.push(c);
        } else {
            pending_sep = true;
        }
    }
    slug
}
