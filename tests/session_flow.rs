//! End-to-end drafting flow tests
//!
//! These tests drive a [`Session`] through the full manuscript lifecycle with
//! a scripted generative backend: project creation, chapter-by-chapter
//! generation with activation gating, bibliography accumulation and
//! deduplication across chapters, derived pagination, the one-time appendices
//! navigation, paragraph rewriting under cooldown, and persistence through a
//! file-backed store.

use std::{collections::BTreeMap, sync::Mutex};

use async_trait::async_trait;
use tempfile::tempdir;
use test_log::test;

use skripsi_core::{
    backend::{ChapterRequest, GenerativeBackend},
    error::SkripsiError,
    pagination::PageAssignment,
    progression::Navigation,
    project::{AuthorInfo, Outline},
    properties::{AcademicLevel, ChapterKey, FrontMatterKey},
    session::{Command, GenerationStart, GenerationTicket, Outcome, Session},
    transport::{JsonFileStore, MemoryStore, ProjectStore},
};

/// Backend returning one pre-scripted raw response per chapter. Responses are
/// consumed on use; asking twice for the same chapter is a backend error,
/// which doubles as a failure-path fixture.
struct ScriptedBackend {
    responses: Mutex<BTreeMap<ChapterKey, String>>,
    rewrite: String,
}

impl ScriptedBackend {
    fn new(responses: BTreeMap<ChapterKey, String>) -> Self {
        ScriptedBackend {
            responses: Mutex::new(responses),
            rewrite: "<p>Kalimat yang telah ditulis ulang.</p>".to_string(),
        }
    }
}

#[async_trait]
impl GenerativeBackend for ScriptedBackend {
    async fn generate_chapter(&self, request: &ChapterRequest) -> Result<String, SkripsiError> {
        self.responses
            .lock()
            .unwrap()
            .remove(&request.chapter)
            .ok_or_else(|| {
                SkripsiError::Backend(format!("no scripted response for {}", request.chapter))
            })
    }

    async fn rewrite_paragraph(&self, _text: &str) -> Result<String, SkripsiError> {
        Ok(self.rewrite.clone())
    }
}

fn create_command() -> Command {
    Command::CreateProject {
        title: "Analisis Pengaruh Media Sosial Terhadap UMKM".into(),
        academic_level: AcademicLevel::S1,
        author_info: AuthorInfo {
            student_name: "Siti Rahma".into(),
            student_id: "19650123".into(),
            institution_name: "Universitas Contoh".into(),
            faculty_name: "Fakultas Ekonomi".into(),
            study_program: "Manajemen".into(),
            submission_year: "2026".into(),
        },
        outline: Outline {
            background: "Perkembangan media sosial di Indonesia.".into(),
            problem: "Bagaimana pengaruhnya terhadap omzet UMKM?".into(),
            objective: "Mengukur pengaruh tersebut.".into(),
            benefits: "Masukan bagi pelaku UMKM.".into(),
            writing_systematics: "Enam bab baku.".into(),
            thinking_framework: "Teori pemasaran digital.".into(),
        },
        preface: "<p>Kata pengantar.</p>".into(),
        abstract_text: "<p>Abstrak.</p>".into(),
    }
}

/// Fenced raw response the way models actually answer, with a body sized in
/// characters and a reference list.
fn raw_response(body_chars: usize, references: &[(&str, &str)]) -> String {
    let refs: Vec<serde_json::Value> = references
        .iter()
        .map(|(id, apa)| serde_json::json!({"id": id, "apa": apa}))
        .collect();
    let payload = serde_json::json!({
        "chapter_content": format!("<p>{}</p>", "a".repeat(body_chars)),
        "references": refs,
    });
    format!("```json\n{payload}\n```")
}

fn ticket<S: ProjectStore>(session: &mut Session<S>, chapter: ChapterKey) -> GenerationTicket {
    match session.begin_generation(chapter).unwrap() {
        GenerationStart::Ticket(t) => t,
        other => panic!("expected a ticket for {chapter}, got {other:?}"),
    }
}

#[test(tokio::test)]
async fn full_drafting_lifecycle() -> Result<(), Box<dyn std::error::Error>> {
    let backend = ScriptedBackend::new(BTreeMap::from([
        (
            ChapterKey::Introduction,
            raw_response(5200, &[("kotler-2017", "Kotler, P. (2017). Marketing.")]),
        ),
        (
            ChapterKey::LiteratureReview,
            // Same source formatted differently plus one genuinely new one.
            raw_response(
                2400,
                &[
                    ("kotler-2017b", "Kotler, P (2017) Marketing"),
                    ("sugiyono-2019", "Sugiyono. (2019). Metode Penelitian."),
                ],
            ),
        ),
        (ChapterKey::Methodology, raw_response(2600, &[])),
        (ChapterKey::Findings, raw_response(100, &[])),
        (ChapterKey::Conclusion, raw_response(900, &[])),
        (
            ChapterKey::BibliographyCompilation,
            raw_response(400, &[("stray", "Should never be merged.")]),
        ),
    ]));

    let mut session = Session::open(MemoryStore::default())?;
    session.apply(create_command())?;

    // Chapters I and II draft freely.
    for chapter in [ChapterKey::Introduction, ChapterKey::LiteratureReview] {
        let ticket = ticket(&mut session, chapter);
        let request = session.chapter_request(chapter, 15, 9000)?;
        let applied = session.run_generation(&backend, ticket, request).await?;
        assert_eq!(applied.outcome, Outcome::Committed);
    }

    // Duplicate Kotler citations collapsed to one entry.
    let bibliography = &session.project().unwrap().bibliography;
    assert_eq!(bibliography.len(), 2);
    assert_eq!(bibliography[0].id, "kotler-2017");
    assert_eq!(bibliography[1].id, "sugiyono-2019");

    // Chapter III is gated until activation.
    assert_eq!(
        session.begin_generation(ChapterKey::Methodology)?,
        GenerationStart::ActivationRequired
    );
    let activated = session.apply(Command::Activate {
        key: "SPN-NUkARi3j0xhGwYoEKQPGNXMfKnPJ1ofh".into(),
    })?;
    assert_eq!(activated.outcome, Outcome::Activated);

    // Remaining primary chapters; navigation fires exactly once, on V.
    let mut navigations = Vec::new();
    for chapter in [
        ChapterKey::Methodology,
        ChapterKey::Findings,
        ChapterKey::Conclusion,
    ] {
        let ticket = ticket(&mut session, chapter);
        let request = session.chapter_request(chapter, 15, 9000)?;
        let applied = session.run_generation(&backend, ticket, request).await?;
        if let Some(navigation) = applied.navigate {
            navigations.push((chapter, navigation));
        }
    }
    assert_eq!(navigations, vec![(ChapterKey::Conclusion, Navigation::Appendices)]);

    // The compilation chapter takes the collected list and adds nothing.
    let ticket = ticket(&mut session, ChapterKey::BibliographyCompilation);
    let request = session.chapter_request(ChapterKey::BibliographyCompilation, 15, 9000)?;
    assert_eq!(request.min_references, 0);
    assert_eq!(request.bibliography.as_ref().map(Vec::len), Some(2));
    session.run_generation(&backend, ticket, request).await?;
    assert_eq!(session.project().unwrap().bibliography.len(), 2);

    // Derived pagination: front matter on roman i..vi, chapters on
    // consecutive arabic ranges (I spans 3 pages at 5200 chars).
    let table = session.page_table();
    assert_eq!(
        table.front_matter(FrontMatterKey::TitlePage),
        Some(PageAssignment::Roman(1))
    );
    assert_eq!(
        table.front_matter(FrontMatterKey::TableOfContents).unwrap().label(),
        "vi"
    );
    assert_eq!(
        table.chapter(ChapterKey::Introduction),
        Some(PageAssignment::Arabic { start: 1, end: 3 })
    );
    assert_eq!(
        table.chapter(ChapterKey::LiteratureReview),
        Some(PageAssignment::Arabic { start: 4, end: 4 })
    );

    // Export and reimport into a second session.
    let (file_name, payload) = session.export()?;
    assert_eq!(
        file_name,
        "proyek-akademik-analisis-pengaruh-media-sosial-terhadap-umkm.json"
    );
    let mut other = Session::open(MemoryStore::default())?;
    let applied = other.apply(Command::ImportProject { payload })?;
    assert_eq!(applied.navigate, None, "import is not a completion transition");
    assert_eq!(other.project().unwrap(), session.project().unwrap());
    assert!(other.outline_locked());

    Ok(())
}

#[test(tokio::test)]
async fn backend_failure_leaves_the_project_untouched() -> Result<(), Box<dyn std::error::Error>> {
    let backend = ScriptedBackend::new(BTreeMap::new());
    let mut session = Session::open(MemoryStore::default())?;
    session.apply(create_command())?;

    let ticket = ticket(&mut session, ChapterKey::Introduction);
    let request = session.chapter_request(ChapterKey::Introduction, 15, 9000)?;
    let result = session.run_generation(&backend, ticket, request).await;
    assert!(matches!(result, Err(SkripsiError::Backend(_))));
    assert!(session
        .project()
        .unwrap()
        .chapter_content(ChapterKey::Introduction)
        .is_none());

    Ok(())
}

#[test(tokio::test)]
async fn humanize_splices_fragment_and_enforces_cooldown(
) -> Result<(), Box<dyn std::error::Error>> {
    let backend = ScriptedBackend::new(BTreeMap::new());
    let mut session = Session::open(MemoryStore::default())?;
    session.apply(create_command())?;
    let content = "<p>Pertama.</p><p>Kedua.</p>";
    session.apply(Command::SaveChapter {
        chapter: ChapterKey::Introduction,
        content: content.into(),
    })?;

    // Rewrite the second paragraph.
    let start = content.find("<p>Kedua.</p>").unwrap();
    let applied = session
        .run_humanize(&backend, ChapterKey::Introduction, start, content.len())
        .await?;
    assert_eq!(applied.outcome, Outcome::Committed);
    assert_eq!(
        session
            .project()
            .unwrap()
            .chapter_content(ChapterKey::Introduction),
        Some("<p>Pertama.</p><p>Kalimat yang telah ditulis ulang.</p>")
    );

    // An immediate second request is refused locally.
    let applied = session
        .run_humanize(&backend, ChapterKey::Introduction, 0, 15)
        .await?;
    assert_eq!(applied.outcome, Outcome::CooldownActive);

    Ok(())
}

#[test(tokio::test)]
async fn file_store_survives_reopen() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;

    {
        let mut session = Session::open(JsonFileStore::new(dir.path()))?;
        session.apply(create_command())?;
        session.apply(Command::SaveChapter {
            chapter: ChapterKey::Introduction,
            content: "<p>Bab satu.</p>".into(),
        })?;
    }

    let mut session = Session::open(JsonFileStore::new(dir.path()))?;
    let project = session.project().expect("project should be restored");
    assert_eq!(
        project.chapter_content(ChapterKey::Introduction),
        Some("<p>Bab satu.</p>")
    );
    assert!(session.outline_locked());

    // Clearing removes the stored file as well.
    session.apply(Command::NewProject)?;
    let session = Session::open(JsonFileStore::new(dir.path()))?;
    assert!(session.project().is_none());

    Ok(())
}

#[test(tokio::test)]
async fn older_payloads_gain_missing_fields_on_import() -> Result<(), Box<dyn std::error::Error>> {
    let payload = serde_json::json!({
        "title": "Skripsi Lama",
        "academicLevel": "S1",
        "authorInfo": {
            "studentName": "A", "studentId": "1", "institutionName": "U",
            "facultyName": "F", "studyProgram": "P", "submissionYear": "2020"
        },
        "outline": {
            "background": "b", "problem": "p", "objective": "o",
            "benefits": "m", "writingSystematics": "s", "thinkingFramework": "k"
        },
        "chapters": {
            "BAB I PENDAHULUAN": "<p>Isi lama.</p>"
        }
    })
    .to_string();

    let mut session = Session::open(MemoryStore::default())?;
    session.apply(Command::ImportProject { payload })?;

    let project = session.project().unwrap();
    assert_eq!(project.preface, skripsi_core::project::PREFACE_PLACEHOLDER);
    assert_eq!(project.abstract_text, skripsi_core::project::ABSTRACT_PLACEHOLDER);
    assert!(project.bibliography.is_empty());
    assert!(!project.is_activated);
    // The restored chapter still drives progression and pagination.
    assert!(session.outline_locked());
    assert!(session
        .page_table()
        .chapter(ChapterKey::Introduction)
        .is_some());

    Ok(())
}
