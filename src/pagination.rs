/// [crate::pagination] derives the page-number table for a
/// [crate::project::Project]: Roman numerals for the fixed front matter,
/// Arabic ranges for content-bearing chapters. [compute_page_table] is a pure
/// function of the snapshot and is recomputed wholesale on every committed
/// change; a single edit can shift every subsequent chapter's range, so the
/// table is never patched incrementally.
use std::{collections::BTreeMap, ops::Deref};

use crate::{
    project::Project,
    properties::{strip_markup, ChapterKey, FrontMatterKey, SectionKey},
};

/// Heuristic character density of one typeset page (12pt, double-spaced).
pub const CHARS_PER_PAGE: usize = 2500;

const ROMAN: [(u32, &str); 13] = [
    (1000, "m"),
    (900, "cm"),
    (500, "d"),
    (400, "cd"),
    (100, "c"),
    (90, "xc"),
    (50, "l"),
    (40, "xl"),
    (10, "x"),
    (9, "ix"),
    (5, "v"),
    (4, "iv"),
    (1, "i"),
];

/// Convert a positive integer to a lowercase Roman numeral using standard
/// subtractive notation. Zero yields an empty string.
pub fn to_roman(mut value: u32) -> String {
    let mut out = String::new();
    for (weight, glyphs) in ROMAN {
        while value >= weight {
            out.push_str(glyphs);
            value -= weight;
        }
    }
    out
}

/// The pages assigned to one section of the manuscript.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageAssignment {
    /// A single Roman-numbered front-matter page.
    Roman(u32),
    /// An inclusive Arabic page range spanning a chapter.
    Arabic { start: u32, end: u32 },
}

impl PageAssignment {
    /// Rendered label for the section's first page (`"iv"` or `"12"`).
    pub fn start_label(&self) -> String {
        match self {
            PageAssignment::Roman(n) => to_roman(*n),
            PageAssignment::Arabic { start, .. } => start.to_string(),
        }
    }

    /// Rendered label for the full assignment (`"iv"`, `"12"` or `"12-15"`).
    pub fn label(&self) -> String {
        match self {
            PageAssignment::Roman(n) => to_roman(*n),
            PageAssignment::Arabic { start, end } if start == end => start.to_string(),
            PageAssignment::Arabic { start, end } => format!("{start}-{end}"),
        }
    }

    pub fn page_count(&self) -> u32 {
        match self {
            PageAssignment::Roman(_) => 1,
            PageAssignment::Arabic { start, end } => end - start + 1,
        }
    }
}

/// The derived page table. A pure view over the Document Model: never
/// mutated in place, never persisted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageTable(BTreeMap<SectionKey, PageAssignment>);

impl Deref for PageTable {
    type Target = BTreeMap<SectionKey, PageAssignment>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl PageTable {
    pub fn chapter(&self, key: ChapterKey) -> Option<PageAssignment> {
        self.0.get(&SectionKey::Chapter(key)).copied()
    }

    pub fn front_matter(&self, key: FrontMatterKey) -> Option<PageAssignment> {
        self.0.get(&SectionKey::FrontMatter(key)).copied()
    }
}

/// Estimated page span of one chapter: markup-stripped character count over
/// [CHARS_PER_PAGE], rounded up, minimum one page.
pub fn estimated_pages(content: &str) -> u32 {
    let text = strip_markup(content);
    (text.chars().count().div_ceil(CHARS_PER_PAGE)).max(1) as u32
}

/// Compute the full page table for a project snapshot.
///
/// Front matter always occupies six consecutive Roman-numbered single pages
/// regardless of content. Chapters are numbered with consecutive Arabic
/// ranges in fixed order, but a chapter with no content contributes no pages
/// and is absent from the table entirely.
pub fn compute_page_table(project: &Project) -> PageTable {
    let mut table = BTreeMap::new();

    for (offset, key) in FrontMatterKey::ALL.into_iter().enumerate() {
        table.insert(
            SectionKey::FrontMatter(key),
            PageAssignment::Roman(offset as u32 + 1),
        );
    }

    let mut next_page = 1u32;
    for key in ChapterKey::ALL {
        let content = match project.chapter_content(key) {
            Some(content) if !content.is_empty() => content,
            _ => continue,
        };
        let end = next_page + estimated_pages(content) - 1;
        table.insert(
            SectionKey::Chapter(key),
            PageAssignment::Arabic { start: next_page, end },
        );
        next_page = end + 1;
    }

    PageTable(table)
}
