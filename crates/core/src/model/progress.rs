use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::config::{DEFAULT_THEME, PROGRESS_DOCUMENT_VERSION};
use crate::model::ids::QuestionId;
use crate::model::question::QuestionProgress;
use crate::model::stats::ProgressStats;
use crate::time::Clock;

//
// ─── UNDO MEMO ─────────────────────────────────────────────────────────────────
//

/// Which toggle produced a [`LastAction`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionKind {
    Done,
    Bookmark,
}

/// One-slot memo of the most recent toggle, enough to restore it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LastAction {
    pub kind: ActionKind,
    pub question_id: QuestionId,
    pub previous_state: bool,
}

//
// ─── DOCUMENT ──────────────────────────────────────────────────────────────────
//

/// Root progress document, persisted as a single JSON value.
///
/// Loading merges stored fields over [`ProgressDocument::default`], so fields
/// added later pick up defaults instead of failing the whole load.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ProgressDocument {
    pub version: u32,
    pub theme: String,
    pub dark_mode: bool,
    pub questions: BTreeMap<QuestionId, QuestionProgress>,
    pub stats: ProgressStats,
    pub achievements: Vec<String>,
}

impl Default for ProgressDocument {
    fn default() -> Self {
        Self {
            version: PROGRESS_DOCUMENT_VERSION,
            theme: DEFAULT_THEME.to_string(),
            dark_mode: false,
            questions: BTreeMap::new(),
            stats: ProgressStats::default(),
            achievements: Vec::new(),
        }
    }
}

impl ProgressDocument {
    #[must_use]
    pub fn question(&self, id: &QuestionId) -> Option<&QuestionProgress> {
        self.questions.get(id)
    }

    #[must_use]
    pub fn is_done(&self, id: &QuestionId) -> bool {
        self.questions.get(id).is_some_and(|q| q.done)
    }

    #[must_use]
    pub fn is_bookmarked(&self, id: &QuestionId) -> bool {
        self.questions.get(id).is_some_and(|q| q.bookmarked)
    }

    #[must_use]
    pub fn note(&self, id: &QuestionId) -> &str {
        self.questions.get(id).map_or("", |q| q.notes.as_str())
    }

    /// Number of `ids` currently marked done.
    #[must_use]
    pub fn completed_count<'a, I>(&self, ids: I) -> usize
    where
        I: IntoIterator<Item = &'a QuestionId>,
    {
        ids.into_iter().filter(|id| self.is_done(id)).count()
    }

    /// Questions whose completion timestamp falls on `date`.
    #[must_use]
    pub fn completions_on(&self, date: NaiveDate, clock: &Clock) -> usize {
        self.questions
            .values()
            .filter(|q| q.done)
            .filter_map(|q| q.completed_at)
            .filter(|at| clock.date_of(*at) == date)
            .count()
    }

    fn entry(&mut self, id: &QuestionId) -> &mut QuestionProgress {
        self.questions.entry(id.clone()).or_default()
    }

    /// Flip `done`, keeping the aggregate counters and streak in step.
    ///
    /// The streak only moves on a transition to done.
    pub fn toggle_done(&mut self, id: &QuestionId, clock: &Clock) -> LastAction {
        let now = clock.now();
        let question = self.entry(id);
        let was_done = question.done;
        let done = !was_done;
        question.done = done;
        question.completed_at = done.then_some(now);

        self.stats.apply_completion(done);
        if done {
            self.stats.record_activity(clock.today(), clock.yesterday());
        }

        LastAction {
            kind: ActionKind::Done,
            question_id: id.clone(),
            previous_state: was_done,
        }
    }

    pub fn toggle_bookmark(&mut self, id: &QuestionId) -> LastAction {
        let question = self.entry(id);
        let was_bookmarked = question.bookmarked;
        question.bookmarked = !was_bookmarked;

        LastAction {
            kind: ActionKind::Bookmark,
            question_id: id.clone(),
            previous_state: was_bookmarked,
        }
    }

    /// Restore the state captured in `action`.
    ///
    /// Completion counters move as they would for a forward toggle in the
    /// opposite direction; the streak and `last_active_date` are left alone.
    /// Returns `false` when the flag already holds the previous value.
    pub fn undo(&mut self, action: &LastAction, clock: &Clock) -> bool {
        let now = clock.now();
        let question = self.entry(&action.question_id);
        match action.kind {
            ActionKind::Done => {
                if question.done == action.previous_state {
                    return false;
                }
                question.done = action.previous_state;
                question.completed_at = action.previous_state.then_some(now);
                self.stats.apply_completion(action.previous_state);
            }
            ActionKind::Bookmark => {
                if question.bookmarked == action.previous_state {
                    return false;
                }
                question.bookmarked = action.previous_state;
            }
        }
        true
    }

    pub fn set_note(&mut self, id: &QuestionId, text: impl Into<String>) {
        self.entry(id).notes = text.into();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::{fixed_clock, fixed_now};
    use chrono::Duration;

    fn qid(s: &str) -> QuestionId {
        QuestionId::new(s)
    }

    #[test]
    fn reads_default_for_unknown_ids() {
        let doc = ProgressDocument::default();
        assert!(!doc.is_done(&qid("nope")));
        assert!(!doc.is_bookmarked(&qid("nope")));
        assert_eq!(doc.note(&qid("nope")), "");
        assert!(doc.questions.is_empty());
    }

    #[test]
    fn toggle_done_twice_restores_counters() {
        let clock = fixed_clock();
        let mut doc = ProgressDocument::default();

        doc.toggle_done(&qid("q1"), &clock);
        assert!(doc.is_done(&qid("q1")));
        assert_eq!(doc.stats.total_completed, 1);
        assert_eq!(doc.stats.xp, 10);
        assert_eq!(doc.stats.streak_days, 1);
        assert_eq!(doc.question(&qid("q1")).unwrap().completed_at, Some(fixed_now()));

        doc.toggle_done(&qid("q1"), &clock);
        assert!(!doc.is_done(&qid("q1")));
        assert_eq!(doc.stats.total_completed, 0);
        assert_eq!(doc.stats.xp, 0);
        assert_eq!(doc.stats.level, 1);
        assert_eq!(doc.question(&qid("q1")).unwrap().completed_at, None);
        // Un-completing leaves the streak untouched.
        assert_eq!(doc.stats.streak_days, 1);
    }

    #[test]
    fn undo_restores_previous_done_state() {
        let clock = fixed_clock();
        let mut doc = ProgressDocument::default();
        let action = doc.toggle_done(&qid("q1"), &clock);
        assert!(doc.undo(&action, &clock));
        assert!(!doc.is_done(&qid("q1")));
        assert_eq!(doc.stats.total_completed, 0);
        assert_eq!(doc.stats.xp, 0);
        assert_eq!(doc.stats.streak_days, 1);

        // Applying the same memo again changes nothing.
        assert!(!doc.undo(&action, &clock));
        assert_eq!(doc.stats.total_completed, 0);
    }

    #[test]
    fn undo_bookmark() {
        let clock = fixed_clock();
        let mut doc = ProgressDocument::default();
        let action = doc.toggle_bookmark(&qid("q7"));
        assert!(doc.is_bookmarked(&qid("q7")));
        assert_eq!(action.kind, ActionKind::Bookmark);
        assert!(doc.undo(&action, &clock));
        assert!(!doc.is_bookmarked(&qid("q7")));
        assert_eq!(doc.stats, ProgressStats::default());
    }

    #[test]
    fn completed_count_and_daily_completions() {
        let mut clock = fixed_clock();
        let mut doc = ProgressDocument::default();
        doc.toggle_done(&qid("q2"), &clock);
        clock.advance(Duration::days(1));
        doc.toggle_done(&qid("q3"), &clock);

        let ids = [qid("q1"), qid("q2"), qid("q3")];
        assert_eq!(doc.completed_count(&ids), 2);
        assert_eq!(doc.completions_on(clock.today(), &clock), 1);
        assert_eq!(doc.stats.streak_days, 2);
    }

    #[test]
    fn partial_json_merges_over_defaults() {
        let doc: ProgressDocument =
            serde_json::from_str(r#"{"darkMode":true,"questions":{"a":{"bookmarked":true}}}"#)
                .unwrap();
        assert!(doc.dark_mode);
        assert_eq!(doc.theme, DEFAULT_THEME);
        assert_eq!(doc.version, PROGRESS_DOCUMENT_VERSION);
        assert!(doc.is_bookmarked(&qid("a")));
        assert_eq!(doc.stats.level, 1);
    }
}
