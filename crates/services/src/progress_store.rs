use std::sync::Arc;

use devmap_core::model::{LastAction, ProgressDocument, ProgressStats, QuestionId};
use devmap_core::time::Clock;
use storage::repository::ProgressRepository;
use tracing::{debug, warn};

//
// ─── RESULTS ───────────────────────────────────────────────────────────────────
//

/// State after a `toggle_done`, returned so callers never read stale stats.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DoneToggle {
    pub question_id: QuestionId,
    /// New value of the question's `done` flag.
    pub done: bool,
    pub stats: ProgressStats,
}

//
// ─── STORE ─────────────────────────────────────────────────────────────────────
//

/// Owns the progress document: per-question state plus aggregate stats.
///
/// Every mutation rewrites the whole document. Storage failures are logged
/// and swallowed; the in-memory document stays authoritative and the next
/// successful write brings storage back in line.
pub struct ProgressStore {
    clock: Clock,
    repo: Arc<dyn ProgressRepository>,
    document: ProgressDocument,
    last_action: Option<LastAction>,
}

impl ProgressStore {
    /// Load the stored document, falling back to defaults when it is
    /// missing, malformed, or unreadable.
    pub async fn load(clock: Clock, repo: Arc<dyn ProgressRepository>) -> Self {
        let document = match repo.get_progress().await {
            Ok(Some(mut document)) => {
                document.stats.normalize();
                document
            }
            Ok(None) => {
                debug!("no stored progress, starting fresh");
                ProgressDocument::default()
            }
            Err(err) => {
                warn!(error = %err, "failed to load progress, using defaults");
                ProgressDocument::default()
            }
        };
        Self::with_document(clock, repo, document)
    }

    /// Build a store around an already-loaded document.
    #[must_use]
    pub fn with_document(
        clock: Clock,
        repo: Arc<dyn ProgressRepository>,
        document: ProgressDocument,
    ) -> Self {
        Self {
            clock,
            repo,
            document,
            last_action: None,
        }
    }

    /// Override the clock (usually for deterministic testing).
    pub fn set_clock(&mut self, clock: Clock) {
        self.clock = clock;
    }

    #[must_use]
    pub fn clock(&self) -> Clock {
        self.clock
    }

    #[must_use]
    pub fn document(&self) -> &ProgressDocument {
        &self.document
    }

    #[must_use]
    pub fn stats(&self) -> &ProgressStats {
        &self.document.stats
    }

    #[must_use]
    pub fn last_action(&self) -> Option<&LastAction> {
        self.last_action.as_ref()
    }

    async fn persist(&self) {
        if let Err(err) = self.repo.save_progress(&self.document).await {
            warn!(error = %err, "failed to save progress");
        }
    }

    /// Flip a question's `done` flag and return the updated stats.
    pub async fn toggle_done(&mut self, id: &QuestionId) -> DoneToggle {
        let action = self.document.toggle_done(id, &self.clock);
        let done = !action.previous_state;
        self.last_action = Some(action);
        self.persist().await;

        DoneToggle {
            question_id: id.clone(),
            done,
            stats: self.document.stats.clone(),
        }
    }

    /// Flip a question's bookmark. Returns the new value.
    pub async fn toggle_bookmark(&mut self, id: &QuestionId) -> bool {
        let action = self.document.toggle_bookmark(id);
        let bookmarked = !action.previous_state;
        self.last_action = Some(action);
        self.persist().await;
        bookmarked
    }

    /// Reverse the most recent toggle and consume the memo.
    ///
    /// Returns the action that was undone, or `None` when there was nothing
    /// to undo. Streak changes from the undone toggle are not reverted.
    pub async fn undo_last_action(&mut self) -> Option<LastAction> {
        let Some(action) = self.last_action.take() else {
            debug!("undo requested with no prior action");
            return None;
        };
        if self.document.undo(&action, &self.clock) {
            self.persist().await;
        }
        Some(action)
    }

    #[must_use]
    pub fn is_question_done(&self, id: &QuestionId) -> bool {
        self.document.is_done(id)
    }

    #[must_use]
    pub fn is_question_bookmarked(&self, id: &QuestionId) -> bool {
        self.document.is_bookmarked(id)
    }

    #[must_use]
    pub fn question_note(&self, id: &QuestionId) -> &str {
        self.document.note(id)
    }

    /// Overwrite the note for a question. No validation happens here.
    pub async fn update_question_note(&mut self, id: &QuestionId, text: impl Into<String>) {
        self.document.set_note(id, text);
        self.persist().await;
    }

    #[must_use]
    pub fn completed_count<'a, I>(&self, ids: I) -> usize
    where
        I: IntoIterator<Item = &'a QuestionId>,
    {
        self.document.completed_count(ids)
    }

    /// Questions completed on the clock's current day.
    #[must_use]
    pub fn completed_today(&self) -> usize {
        self.document
            .completions_on(self.clock.today(), &self.clock)
    }

    pub async fn set_theme(&mut self, theme: impl Into<String>) {
        self.document.theme = theme.into();
        self.persist().await;
    }

    pub async fn set_dark_mode(&mut self, dark_mode: bool) {
        self.document.dark_mode = dark_mode;
        self.persist().await;
    }
}
