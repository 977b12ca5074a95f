/// [crate::session] is the command surface of the crate. A [Session] owns the
/// active [crate::project::Project] together with its derived views and the
/// storage mirror, and every state change flows through [Session::apply] so
/// that the recompute-and-persist cycle can never be skipped: each committed
/// command recomputes progression, emits at most one navigation signal,
/// rebuilds the page table and mirrors the snapshot to the store, in that
/// order.
use std::{
    collections::BTreeMap,
    fmt::{Display, Formatter},
    time::{Duration, Instant},
};

use tracing::debug;

use crate::{
    activation,
    backend::{parse_chapter_response, splice_fragment, ChapterRequest, ChapterResponse, GenerativeBackend},
    bibliography::{add_manual, merge_generated, RegisterOutcome},
    error::SkripsiError,
    pagination::{compute_page_table, PageTable},
    progression::{generation_gate, GenerationGate, Navigation, ProgressionSnapshot, ProgressionTracker},
    project::{ApprovalData, AppendixEntry, AuthorInfo, BibliographyEntry, Outline, OutlineField, Project, StatementPageData},
    properties::{AcademicLevel, AppendixKind, ChapterKey},
    transport::{deserialize_project, export_file_name, serialize_project, ProjectStore},
};

/// Minimum spacing between paragraph-rewrite requests.
pub const HUMANIZE_COOLDOWN: Duration = Duration::from_secs(15);

/// Handle for one in-flight chapter generation. The token is monotonically
/// increasing per session; a newer ticket for the same chapter invalidates
/// older ones so a late response can never overwrite newer work.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GenerationTicket {
    pub chapter: ChapterKey,
    token: u64,
}

/// Outcome of [Session::begin_generation].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenerationStart {
    Ticket(GenerationTicket),
    /// The slot is gated and the project has not been activated.
    ActivationRequired,
}

/// A state-changing request against the active project.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    CreateProject {
        title: String,
        academic_level: AcademicLevel,
        author_info: AuthorInfo,
        outline: Outline,
        preface: String,
        abstract_text: String,
    },
    /// Replace the active project with a validated imported payload.
    ImportProject { payload: String },
    /// Discard the active project and its stored mirror.
    NewProject,
    UpdateOutlineField { field: OutlineField, value: String },
    SaveChapter { chapter: ChapterKey, content: String },
    /// Commit a parsed generation result, provided its ticket is still live.
    ApplyGeneration {
        ticket: GenerationTicket,
        response: ChapterResponse,
    },
    AddManualCitation { citation: String },
    AddAppendix {
        title: String,
        kind: AppendixKind,
        content: String,
    },
    RemoveAppendix { id: String },
    SetPreface { content: String },
    SetAbstract { content: String },
    SetStatementPage { data: Option<StatementPageData> },
    SetApprovalData { data: Option<ApprovalData> },
    Activate { key: String },
}

impl Display for Command {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        match self {
            Command::CreateProject { title, .. } => write!(f, "CreateProject({title})"),
            Command::ImportProject { .. } => write!(f, "ImportProject"),
            Command::NewProject => write!(f, "NewProject"),
            Command::UpdateOutlineField { field, .. } => write!(f, "UpdateOutlineField({field:?})"),
            Command::SaveChapter { chapter, .. } => write!(f, "SaveChapter({chapter})"),
            Command::ApplyGeneration { ticket, .. } => write!(f, "ApplyGeneration({})", ticket.chapter),
            Command::AddManualCitation { .. } => write!(f, "AddManualCitation"),
            Command::AddAppendix { title, .. } => write!(f, "AddAppendix({title})"),
            Command::RemoveAppendix { id } => write!(f, "RemoveAppendix({id})"),
            Command::SetPreface { .. } => write!(f, "SetPreface"),
            Command::SetAbstract { .. } => write!(f, "SetAbstract"),
            Command::SetStatementPage { .. } => write!(f, "SetStatementPage"),
            Command::SetApprovalData { .. } => write!(f, "SetApprovalData"),
            Command::Activate { .. } => write!(f, "Activate"),
        }
    }
}

/// What an applied command did. All of these are ordinary results of a valid
/// request; invalid requests surface as [SkripsiError] instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The project changed and was committed.
    Committed,
    /// The citation matched an existing entry; nothing changed.
    DuplicateCitation,
    /// The generation ticket was superseded; the response was discarded.
    StaleGeneration,
    /// The activation key was not recognized; nothing changed.
    ActivationFailed,
    /// The project is now activated.
    Activated,
    /// The active project and its stored mirror were discarded.
    ProjectCleared,
    /// The rewrite cooldown has not elapsed; nothing was sent.
    CooldownActive,
}

impl Display for Outcome {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        match self {
            Outcome::Committed => write!(f, "Committed"),
            Outcome::DuplicateCitation => write!(f, "DuplicateCitation"),
            Outcome::StaleGeneration => write!(f, "StaleGeneration"),
            Outcome::ActivationFailed => write!(f, "ActivationFailed"),
            Outcome::Activated => write!(f, "Activated"),
            Outcome::ProjectCleared => write!(f, "ProjectCleared"),
            Outcome::CooldownActive => write!(f, "CooldownActive"),
        }
    }
}

/// Result of applying one command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Applied {
    pub outcome: Outcome,
    /// One-time navigation side effect, if this commit triggered one.
    pub navigate: Option<Navigation>,
}

impl Applied {
    fn plain(outcome: Outcome) -> Self {
        Applied {
            outcome,
            navigate: None,
        }
    }
}

/// The active editing session. Generic over the storage seam so hosts can
/// supply a file-backed or browser-local store.
pub struct Session<S: ProjectStore> {
    store: S,
    project: Option<Project>,
    tracker: ProgressionTracker,
    snapshot: Option<ProgressionSnapshot>,
    page_table: PageTable,
    tokens: BTreeMap<ChapterKey, u64>,
    next_token: u64,
    humanize_until: Option<Instant>,
}

impl<S: ProjectStore> Session<S> {
    /// Open a session against a store, restoring the project persisted there
    /// if one exists. Restoration absorbs progression state without emitting
    /// navigation: resuming an already-finished project is not a transition.
    pub fn open(store: S) -> Result<Self, SkripsiError> {
        let mut session = Session {
            store,
            project: None,
            tracker: ProgressionTracker::default(),
            snapshot: None,
            page_table: PageTable::default(),
            tokens: BTreeMap::new(),
            next_token: 0,
            humanize_until: None,
        };
        if let Some(project) = session.store.load()? {
            debug!("restoring persisted project '{}'", project.title);
            session.install(project);
        }
        Ok(session)
    }

    pub fn project(&self) -> Option<&Project> {
        self.project.as_ref()
    }

    pub fn page_table(&self) -> &PageTable {
        &self.page_table
    }

    pub fn progression(&self) -> Option<&ProgressionSnapshot> {
        self.snapshot.as_ref()
    }

    pub fn outline_locked(&self) -> bool {
        self.tracker.outline_locked()
    }

    pub fn humanize_cooldown_active(&self) -> bool {
        self.humanize_until.is_some_and(|until| Instant::now() < until)
    }

    fn current(&self) -> Result<&Project, SkripsiError> {
        self.project
            .as_ref()
            .ok_or_else(|| SkripsiError::Command("No active project".to_string()))
    }

    /// Adopt a project without treating it as an edit: prime the tracker,
    /// rebuild views, skip persistence.
    fn install(&mut self, project: Project) {
        let snapshot = ProgressionSnapshot::compute(&project);
        self.tracker.reset();
        self.tracker.prime(&snapshot);
        self.page_table = compute_page_table(&project);
        self.tokens.clear();
        self.project = Some(project);
        self.snapshot = Some(snapshot);
    }

    /// Commit an edited project: recompute progression, observe transitions,
    /// rebuild the page table and mirror to the store.
    fn commit(&mut self, project: Project) -> Result<Option<Navigation>, SkripsiError> {
        let snapshot = ProgressionSnapshot::compute(&project);
        let navigate = self.tracker.observe(&snapshot);
        self.page_table = compute_page_table(&project);
        self.store.save(&project)?;
        self.project = Some(project);
        self.snapshot = Some(snapshot);
        Ok(navigate)
    }

    /// Apply one command. Every mutation of the session goes through here.
    pub fn apply(&mut self, command: Command) -> Result<Applied, SkripsiError> {
        debug!("applying {command}");
        match command {
            Command::CreateProject {
                title,
                academic_level,
                author_info,
                outline,
                preface,
                abstract_text,
            } => {
                let project = Project::new(
                    title,
                    academic_level,
                    author_info,
                    outline,
                    preface,
                    abstract_text,
                );
                self.tracker.reset();
                self.tokens.clear();
                let navigate = self.commit(project)?;
                Ok(Applied {
                    outcome: Outcome::Committed,
                    navigate,
                })
            }
            Command::ImportProject { payload } => {
                let project = deserialize_project(&payload)?;
                self.store.save(&project)?;
                self.install(project);
                Ok(Applied::plain(Outcome::Committed))
            }
            Command::NewProject => {
                self.store.clear()?;
                self.project = None;
                self.snapshot = None;
                self.page_table = PageTable::default();
                self.tracker.reset();
                self.tokens.clear();
                Ok(Applied::plain(Outcome::ProjectCleared))
            }
            Command::UpdateOutlineField { field, value } => {
                if self.tracker.outline_locked() {
                    return Err(SkripsiError::Command(
                        "Outline is read-only once the introduction chapter is complete"
                            .to_string(),
                    ));
                }
                let mut project = self.current()?.clone();
                project.outline.set_field(field, value);
                let navigate = self.commit(project)?;
                Ok(Applied {
                    outcome: Outcome::Committed,
                    navigate,
                })
            }
            Command::SaveChapter { chapter, content } => {
                let unlocked = self
                    .snapshot
                    .as_ref()
                    .is_some_and(|s| s.is_unlocked(chapter));
                if !unlocked {
                    return Err(SkripsiError::Command(format!(
                        "{chapter} is locked; complete the preceding chapter first"
                    )));
                }
                let mut project = self.current()?.clone();
                project.set_chapter(chapter, content);
                let navigate = self.commit(project)?;
                Ok(Applied {
                    outcome: Outcome::Committed,
                    navigate,
                })
            }
            Command::ApplyGeneration { ticket, response } => {
                if self.tokens.get(&ticket.chapter) != Some(&ticket.token) {
                    debug!("discarding stale generation for {}", ticket.chapter);
                    return Ok(Applied::plain(Outcome::StaleGeneration));
                }
                let mut project = self.current()?.clone();
                project.set_chapter(ticket.chapter, response.content);
                // The bibliography-compilation chapter renders the collected
                // list; it never contributes new references.
                if !ticket.chapter.is_bibliography() {
                    merge_generated(&mut project.bibliography, response.references);
                }
                let navigate = self.commit(project)?;
                Ok(Applied {
                    outcome: Outcome::Committed,
                    navigate,
                })
            }
            Command::AddManualCitation { citation } => {
                let mut project = self.current()?.clone();
                let entry = BibliographyEntry::manual(citation);
                match add_manual(&mut project.bibliography, entry)? {
                    RegisterOutcome::Duplicate => Ok(Applied::plain(Outcome::DuplicateCitation)),
                    RegisterOutcome::Accepted => {
                        let navigate = self.commit(project)?;
                        Ok(Applied {
                            outcome: Outcome::Committed,
                            navigate,
                        })
                    }
                }
            }
            Command::AddAppendix {
                title,
                kind,
                content,
            } => {
                let mut project = self.current()?.clone();
                project.appendices.push(AppendixEntry::new(title, kind, content));
                let navigate = self.commit(project)?;
                Ok(Applied {
                    outcome: Outcome::Committed,
                    navigate,
                })
            }
            Command::RemoveAppendix { id } => {
                let mut project = self.current()?.clone();
                project.appendices.retain(|entry| entry.id != id);
                let navigate = self.commit(project)?;
                Ok(Applied {
                    outcome: Outcome::Committed,
                    navigate,
                })
            }
            Command::SetPreface { content } => {
                let mut project = self.current()?.clone();
                project.preface = content;
                let navigate = self.commit(project)?;
                Ok(Applied {
                    outcome: Outcome::Committed,
                    navigate,
                })
            }
            Command::SetAbstract { content } => {
                let mut project = self.current()?.clone();
                project.abstract_text = content;
                let navigate = self.commit(project)?;
                Ok(Applied {
                    outcome: Outcome::Committed,
                    navigate,
                })
            }
            Command::SetStatementPage { data } => {
                let mut project = self.current()?.clone();
                project.statement_page_data = data;
                let navigate = self.commit(project)?;
                Ok(Applied {
                    outcome: Outcome::Committed,
                    navigate,
                })
            }
            Command::SetApprovalData { data } => {
                let mut project = self.current()?.clone();
                project.approval_data = data;
                let navigate = self.commit(project)?;
                Ok(Applied {
                    outcome: Outcome::Committed,
                    navigate,
                })
            }
            Command::Activate { key } => {
                if !activation::validate_key(&key) {
                    return Ok(Applied::plain(Outcome::ActivationFailed));
                }
                let mut project = self.current()?.clone();
                project.is_activated = true;
                let navigate = self.commit(project)?;
                Ok(Applied {
                    outcome: Outcome::Activated,
                    navigate,
                })
            }
        }
    }

    /// Start a generation for a chapter slot, issuing a ticket that supersedes
    /// any earlier ticket for the same slot. Locked slots are command errors;
    /// a gated slot on an unactivated project yields
    /// [GenerationStart::ActivationRequired] instead of a ticket.
    pub fn begin_generation(
        &mut self,
        chapter: ChapterKey,
    ) -> Result<GenerationStart, SkripsiError> {
        let project = self.current()?;
        let unlocked = self
            .snapshot
            .as_ref()
            .is_some_and(|s| s.is_unlocked(chapter));
        if !unlocked {
            return Err(SkripsiError::Command(format!(
                "{chapter} is locked; complete the preceding chapter first"
            )));
        }
        if generation_gate(project, chapter) == GenerationGate::ActivationRequired {
            return Ok(GenerationStart::ActivationRequired);
        }
        let token = self.next_token;
        self.next_token += 1;
        self.tokens.insert(chapter, token);
        Ok(GenerationStart::Ticket(GenerationTicket { chapter, token }))
    }

    /// Assemble the backend request for a chapter. The bibliography slot gets
    /// the collected entry list and no reference or length minimums.
    pub fn chapter_request(
        &self,
        chapter: ChapterKey,
        min_references: u32,
        min_characters: u32,
    ) -> Result<ChapterRequest, SkripsiError> {
        let project = self.current()?;
        let bibliography_slot = chapter.is_bibliography();
        Ok(ChapterRequest {
            chapter,
            title: project.title.clone(),
            outline: project.outline.clone(),
            academic_level: project.academic_level,
            min_references: if bibliography_slot { 0 } else { min_references },
            min_characters: if bibliography_slot { 0 } else { min_characters },
            bibliography: bibliography_slot.then(|| project.bibliography.clone()),
        })
    }

    /// Run one chapter generation end to end: call the backend, parse the raw
    /// output tolerantly, and commit under the ticket. A backend failure
    /// propagates without touching the project; a superseded ticket discards
    /// the response.
    pub async fn run_generation(
        &mut self,
        backend: &dyn GenerativeBackend,
        ticket: GenerationTicket,
        request: ChapterRequest,
    ) -> Result<Applied, SkripsiError> {
        let raw = backend.generate_chapter(&request).await?;
        let response = parse_chapter_response(&raw);
        self.apply(Command::ApplyGeneration { ticket, response })
    }

    /// Rewrite the byte range `start..end` of a chapter through the backend
    /// and commit the spliced result. Rate-limited by [HUMANIZE_COOLDOWN];
    /// the cooldown starts when the request is sent, not when it succeeds.
    pub async fn run_humanize(
        &mut self,
        backend: &dyn GenerativeBackend,
        chapter: ChapterKey,
        start: usize,
        end: usize,
    ) -> Result<Applied, SkripsiError> {
        if self.humanize_cooldown_active() {
            return Ok(Applied::plain(Outcome::CooldownActive));
        }
        let content = self
            .current()?
            .chapter_content(chapter)
            .ok_or_else(|| SkripsiError::NotFound(format!("{chapter} has no content")))?
            .to_string();
        let fragment = content.get(start..end).ok_or_else(|| {
            SkripsiError::Command(format!(
                "Fragment range {start}..{end} does not address the target content"
            ))
        })?;
        if fragment.trim().is_empty() {
            return Err(SkripsiError::Command(
                "Selected fragment is empty; nothing to rewrite".to_string(),
            ));
        }
        self.humanize_until = Some(Instant::now() + HUMANIZE_COOLDOWN);
        let rewritten = backend.rewrite_paragraph(fragment).await?;
        let spliced = splice_fragment(&content, start, end, &rewritten)?;
        self.apply(Command::SaveChapter {
            chapter,
            content: spliced,
        })
    }

    /// Produce the export filename and pretty-printed payload for the active
    /// project.
    pub fn export(&self) -> Result<(String, String), SkripsiError> {
        let project = self.current()?;
        Ok((export_file_name(&project.title), serialize_project(project)?))
    }
}
