/// [crate::progression] computes which chapter slots are locked, unlocked or
/// complete for a given [crate::project::Project] snapshot, and tracks the two
/// pieces of progression state that are deliberately *not* pure views: the
/// one-way outline lock and the edge-triggered appendices navigation signal.
use std::collections::BTreeMap;

use enumset::EnumSet;
use tracing::debug;

use crate::{
    project::Project,
    properties::{strip_markup, ChapterKey},
};

/// State of one chapter slot in fixed sequence order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChapterState {
    /// Not yet reachable: the preceding slot is incomplete.
    Locked,
    /// Reachable for generation and editing, but without substantial content.
    Unlocked,
    /// Holds substantial content (non-empty after markup stripping).
    Complete,
}

/// A chapter counts as complete when stripping all markup tags from its
/// content leaves non-empty trimmed text. Empty tags alone are incomplete.
pub fn chapter_complete(content: &str) -> bool {
    !strip_markup(content).trim().is_empty()
}

/// Whether generation may proceed for a slot right now. Distinct from the
/// completion state machine: this is a pure gate on the activation flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenerationGate {
    Ready,
    ActivationRequired,
}

pub fn generation_gate(project: &Project, chapter: ChapterKey) -> GenerationGate {
    if chapter.requires_activation() && !project.is_activated {
        GenerationGate::ActivationRequired
    } else {
        GenerationGate::Ready
    }
}

/// Pure per-snapshot view of chapter progression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressionSnapshot {
    states: BTreeMap<ChapterKey, ChapterState>,
    complete: EnumSet<ChapterKey>,
}

impl ProgressionSnapshot {
    pub fn compute(project: &Project) -> Self {
        let mut complete = EnumSet::new();
        for key in ChapterKey::ALL {
            if project.chapter_content(key).is_some_and(chapter_complete) {
                complete |= key;
            }
        }

        let mut states = BTreeMap::new();
        for key in ChapterKey::ALL {
            // The first slot is always unlocked. A later slot is unlocked
            // when its predecessor is complete, or when it already has
            // content itself (imported projects may fill gaps out of order).
            let unlocked = match key.preceding() {
                None => true,
                Some(prev) => {
                    complete.contains(prev)
                        || complete.contains(key)
                        || project.chapter_content(key).is_some_and(|c| !c.is_empty())
                }
            };
            let state = if complete.contains(key) {
                ChapterState::Complete
            } else if unlocked {
                ChapterState::Unlocked
            } else {
                ChapterState::Locked
            };
            states.insert(key, state);
        }
        ProgressionSnapshot { states, complete }
    }

    pub fn state(&self, key: ChapterKey) -> ChapterState {
        self.states[&key]
    }

    pub fn is_unlocked(&self, key: ChapterKey) -> bool {
        self.state(key) != ChapterState::Locked
    }

    pub fn is_complete(&self, key: ChapterKey) -> bool {
        self.complete.contains(key)
    }

    pub fn complete_set(&self) -> EnumSet<ChapterKey> {
        self.complete
    }

    /// Whether the introduction chapter is complete, which freezes the
    /// outline fields. The permanent latch lives in [ProgressionTracker].
    pub fn outline_lock_reached(&self) -> bool {
        self.complete.contains(ChapterKey::Introduction)
    }

    /// All five primary chapters simultaneously complete.
    pub fn all_primary_complete(&self) -> bool {
        ChapterKey::PRIMARY.iter().all(|k| self.complete.contains(*k))
    }
}

/// One-time navigation side effects derived from progression transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Navigation {
    /// All five primary chapters just became complete; move to the
    /// appendices view.
    Appendices,
}

/// Tracks progression state across snapshots.
///
/// Two facts cannot be recomputed purely: the outline lock is a one-way latch
/// (emptying chapter I later must not re-open the outline), and the
/// appendices navigation must fire exactly once per transition of the
/// five-primary set from incomplete to complete, not on every recompute.
#[derive(Debug, Default, Clone)]
pub struct ProgressionTracker {
    outline_locked: bool,
    primaries_complete: bool,
}

impl ProgressionTracker {
    /// Absorb a snapshot without emitting navigation. Used when restoring a
    /// project at startup or import, where reaching an already-complete state
    /// is not a transition.
    pub fn prime(&mut self, snapshot: &ProgressionSnapshot) {
        self.outline_locked |= snapshot.outline_lock_reached();
        self.primaries_complete = snapshot.all_primary_complete();
    }

    /// Absorb a snapshot committed by an edit or generation, returning the
    /// navigation signal when the five-primary set transitions into complete.
    pub fn observe(&mut self, snapshot: &ProgressionSnapshot) -> Option<Navigation> {
        self.outline_locked |= snapshot.outline_lock_reached();
        let now = snapshot.all_primary_complete();
        let fired = now && !self.primaries_complete;
        self.primaries_complete = now;
        if fired {
            debug!("all primary chapters complete; emitting appendices navigation");
            Some(Navigation::Appendices)
        } else {
            None
        }
    }

    pub fn outline_locked(&self) -> bool {
        self.outline_locked
    }

    /// Forget all latched state, e.g. when the project is cleared or replaced.
    pub fn reset(&mut self) {
        *self = ProgressionTracker::default();
    }
}
