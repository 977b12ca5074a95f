//! # skripsi-core
//!
//! A Rust library implementing the document core of an Indonesian academic
//! thesis ("skripsi") writing assistant: a fixed six-chapter manuscript that
//! is drafted chapter by chapter through a generative backend, with derived
//! pagination, sequential unlock progression and a deduplicated bibliography.
//!
//! ## Overview
//!
//! skripsi-core owns the [`project::Project`] aggregate as the single source
//! of truth. Everything the reader sees around it is a derived view: the
//! page-number table (Roman numerals for the six front-matter pages, Arabic
//! ranges for content-bearing chapters) and the per-chapter lock state are
//! recomputed wholesale from the aggregate on every committed change and are
//! never persisted as authoritative state.
//!
//! ### Key Features
//!
//! - **Command surface**: every mutation flows through [`session::Session::apply`],
//!   which recomputes progression, rebuilds the page table and mirrors the
//!   snapshot to durable storage in a fixed order
//! - **Sequential progression**: chapters unlock strictly in order as their
//!   predecessors reach substantial content, with a one-way outline lock and
//!   an edge-triggered appendices navigation signal
//! - **Deduplicated bibliography**: citations collected across chapters and
//!   manual entry collapse on a canonical punctuation-free form
//! - **Tolerant generation parsing**: raw model output is unfenced, brace-
//!   extracted and degraded to placeholder content rather than failing
//! - **Stale-response protection**: generation commits are guarded by
//!   monotonic tickets so a late response never overwrites newer work
//! - **Backward-compatible persistence**: older stored payloads gain missing
//!   fields through idempotent defaulting on import
//!
//! ## Architecture
//!
//! - **[`project`]**: the Document Model (`Project` and its sub-records)
//! - **[`properties`]**: fixed chapter/front-matter enumerations and shared
//!   text helpers
//! - **[`progression`]**: lock states, completion, activation gate and the
//!   progression tracker
//! - **[`pagination`]**: the derived page-number table
//! - **[`bibliography`]**: the deduplicating citation register
//! - **[`backend`]**: the generative-backend seam and response parsing
//! - **[`session`]**: the command surface tying it all together
//! - **[`transport`]**: JSON import/export validation and the storage seam
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use skripsi_core::{
//!     project::{AuthorInfo, Outline},
//!     properties::AcademicLevel,
//!     session::{Command, Session},
//!     transport::JsonFileStore,
//! };
//!
//! fn main() -> Result<(), skripsi_core::SkripsiError> {
//!     let mut session = Session::open(JsonFileStore::new("./data"))?;
//!     session.apply(Command::CreateProject {
//!         title: "Analisis Pengaruh Media Sosial".into(),
//!         academic_level: AcademicLevel::S1,
//!         author_info: AuthorInfo {
//!             student_name: "Siti Rahma".into(),
//!             student_id: "19650123".into(),
//!             institution_name: "Universitas Contoh".into(),
//!             faculty_name: "Fakultas Ekonomi".into(),
//!             study_program: "Manajemen".into(),
//!             submission_year: "2026".into(),
//!         },
//!         outline: Outline::default(),
//!         preface: skripsi_core::project::PREFACE_PLACEHOLDER.into(),
//!         abstract_text: skripsi_core::project::ABSTRACT_PLACEHOLDER.into(),
//!     })?;
//!     let (file_name, payload) = session.export()?;
//!     println!("{file_name}: {} bytes", payload.len());
//!     Ok(())
//! }
//! ```

pub mod activation;
pub mod backend;
pub mod bibliography;
pub mod error;
pub mod pagination;
pub mod progression;
pub mod project;
pub mod properties;
pub mod session;
pub mod transport;

pub use error::*;
