use std::sync::Arc;

use devmap_core::config::XP_PER_QUESTION;
use devmap_core::model::{
    ACHIEVEMENTS, Achievement, AchievementCategory, Catalog, LastAction, ProgressDocument,
    ProgressStats, QuestionId,
};
use devmap_core::time::Clock;
use storage::repository::Storage;
use tracing::debug;

use crate::achievement_engine::AchievementEngine;
use crate::insights::{self, TopicProgress};
use crate::progress_store::ProgressStore;

//
// ─── TOASTS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastSeverity {
    Success,
    Info,
    Warning,
}

/// Transient message for the UI. `undo` marks toasts that offer an undo
/// affordance; activating it reverses the store's most recent toggle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toast {
    pub id: u64,
    pub message: String,
    pub severity: ToastSeverity,
    pub undo: bool,
}

//
// ─── OUTCOMES ──────────────────────────────────────────────────────────────────
//

/// Everything a UI needs to re-render after `toggle_done`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToggleDoneOutcome {
    pub done: bool,
    pub stats: ProgressStats,
    /// Achievements unlocked by this toggle, in evaluation order.
    pub unlocked: Vec<&'static Achievement>,
    pub toast_id: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToggleBookmarkOutcome {
    pub bookmarked: bool,
    pub toast_id: u64,
}

//
// ─── CONTEXT ───────────────────────────────────────────────────────────────────
//

/// The single handle a front end talks to.
///
/// Composes the progress store and the achievement engine, sequences
/// achievement checks after completions, and keeps UI-facing state (toasts
/// and the achievement popup currently on screen). Mutating calls return
/// what changed; callers re-read and re-render from the return value.
pub struct ProgressContext {
    store: ProgressStore,
    achievements: AchievementEngine,
    catalog: Option<Arc<Catalog>>,
    toasts: Vec<Toast>,
    next_toast_id: u64,
    current_achievement: Option<&'static Achievement>,
}

impl ProgressContext {
    #[must_use]
    pub fn new(
        store: ProgressStore,
        achievements: AchievementEngine,
        catalog: Option<Arc<Catalog>>,
    ) -> Self {
        let mut context = Self {
            store,
            achievements,
            catalog,
            toasts: Vec::new(),
            next_toast_id: 0,
            current_achievement: None,
        };
        context.poll_achievement_popup();
        context
    }

    /// Load both documents from `storage` and assemble a context.
    pub async fn load(storage: &Storage, clock: Clock, catalog: Option<Arc<Catalog>>) -> Self {
        let store = ProgressStore::load(clock, Arc::clone(&storage.progress)).await;
        let achievements = AchievementEngine::load(clock, Arc::clone(&storage.achievements)).await;
        Self::new(store, achievements, catalog)
    }

    /// Override the clock on both components.
    pub fn set_clock(&mut self, clock: Clock) {
        self.store.set_clock(clock);
        self.achievements.set_clock(clock);
    }

    #[must_use]
    pub fn catalog(&self) -> Option<&Catalog> {
        self.catalog.as_deref()
    }

    #[must_use]
    pub fn progress(&self) -> &ProgressDocument {
        self.store.document()
    }

    #[must_use]
    pub fn stats(&self) -> &ProgressStats {
        self.store.stats()
    }

    // ─── Toggles ──────────────────────────────────────────────────────────────

    /// Toggle completion, emit a toast, and on a transition to done run the
    /// achievement checks against the stats this toggle produced.
    pub async fn toggle_done(&mut self, id: &QuestionId) -> ToggleDoneOutcome {
        let toggle = self.store.toggle_done(id).await;

        let message = if toggle.done {
            format!("Question marked as done! +{XP_PER_QUESTION} XP")
        } else {
            "Question marked as incomplete".to_string()
        };
        let toast_id = self.show_toast(message, ToastSeverity::Success, true);

        let unlocked = if toggle.done {
            self.run_achievement_checks(&toggle.stats).await
        } else {
            Vec::new()
        };
        self.poll_achievement_popup();

        ToggleDoneOutcome {
            done: toggle.done,
            stats: toggle.stats,
            unlocked,
            toast_id,
        }
    }

    pub async fn toggle_bookmark(&mut self, id: &QuestionId) -> ToggleBookmarkOutcome {
        let bookmarked = self.store.toggle_bookmark(id).await;
        let message = if bookmarked {
            "Question bookmarked!"
        } else {
            "Bookmark removed"
        };
        let toast_id = self.show_toast(message, ToastSeverity::Info, true);
        ToggleBookmarkOutcome {
            bookmarked,
            toast_id,
        }
    }

    /// Progress, streak and time checks run first and in that order; the
    /// volume, exploration and mastery checks follow.
    async fn run_achievement_checks(&mut self, stats: &ProgressStats) -> Vec<&'static Achievement> {
        let mut unlocked = self
            .achievements
            .check_progress_achievements(stats.total_completed)
            .await;
        unlocked.extend(
            self.achievements
                .check_streak_achievements(stats.streak_days)
                .await,
        );
        unlocked.extend(self.achievements.check_time_achievements().await);

        let today = u32::try_from(self.store.completed_today()).unwrap_or(u32::MAX);
        unlocked.extend(
            self.achievements
                .check_daily_volume_achievements(today)
                .await,
        );

        if let Some(catalog) = self.catalog.clone() {
            let attempted = insights::topics_attempted(&catalog, self.store.document());
            let attempted = u32::try_from(attempted).unwrap_or(u32::MAX);
            unlocked.extend(
                self.achievements
                    .check_exploration_achievements(attempted)
                    .await,
            );
            unlocked.extend(
                self.achievements
                    .check_mastery_achievements(&catalog, self.store.document())
                    .await,
            );
        }
        unlocked
    }

    // ─── Undo ─────────────────────────────────────────────────────────────────

    /// Undo the most recent toggle. No achievement is revoked.
    pub async fn undo_last_action(&mut self) -> Option<LastAction> {
        self.store.undo_last_action().await
    }

    /// Activate the undo affordance on a toast and dismiss it.
    ///
    /// The undo memo holds one slot, so this reverses the latest toggle even
    /// when an older toast is activated. Returns `None` if the toast has no
    /// undo or there was nothing left to undo.
    pub async fn activate_undo(&mut self, toast_id: u64) -> Option<LastAction> {
        let offers_undo = self
            .toasts
            .iter()
            .any(|t| t.id == toast_id && t.undo);
        if !offers_undo {
            return None;
        }
        self.remove_toast(toast_id);
        self.store.undo_last_action().await
    }

    // ─── Toasts ───────────────────────────────────────────────────────────────

    /// Queue a toast and return its id.
    pub fn show_toast(
        &mut self,
        message: impl Into<String>,
        severity: ToastSeverity,
        undo: bool,
    ) -> u64 {
        self.next_toast_id += 1;
        let id = self.next_toast_id;
        self.toasts.push(Toast {
            id,
            message: message.into(),
            severity,
            undo,
        });
        id
    }

    pub fn remove_toast(&mut self, id: u64) {
        self.toasts.retain(|t| t.id != id);
    }

    #[must_use]
    pub fn toasts(&self) -> &[Toast] {
        &self.toasts
    }

    /// Remove and return all queued toasts.
    pub fn drain_toasts(&mut self) -> Vec<Toast> {
        std::mem::take(&mut self.toasts)
    }

    // ─── Achievement popup ────────────────────────────────────────────────────

    /// If nothing is on screen, pull the next pending unlock into view.
    pub fn poll_achievement_popup(&mut self) -> Option<&'static Achievement> {
        if self.current_achievement.is_none() {
            self.current_achievement = self.achievements.next_pending_notification();
            if let Some(achievement) = self.current_achievement {
                debug!(achievement = achievement.id, "showing achievement popup");
            }
        }
        self.current_achievement
    }

    #[must_use]
    pub fn current_achievement(&self) -> Option<&'static Achievement> {
        self.current_achievement
    }

    /// Acknowledge the popup on screen. The next pending unlock surfaces on
    /// the following [`ProgressContext::poll_achievement_popup`].
    pub async fn dismiss_achievement(&mut self) {
        if let Some(achievement) = self.current_achievement.take() {
            self.achievements.mark_notified(achievement.id).await;
        }
    }

    // ─── Read-through queries ─────────────────────────────────────────────────

    #[must_use]
    pub fn is_question_done(&self, id: &QuestionId) -> bool {
        self.store.is_question_done(id)
    }

    #[must_use]
    pub fn is_question_bookmarked(&self, id: &QuestionId) -> bool {
        self.store.is_question_bookmarked(id)
    }

    #[must_use]
    pub fn question_note(&self, id: &QuestionId) -> &str {
        self.store.question_note(id)
    }

    pub async fn update_question_note(&mut self, id: &QuestionId, text: impl Into<String>) {
        self.store.update_question_note(id, text).await;
    }

    #[must_use]
    pub fn completed_count<'a, I>(&self, ids: I) -> usize
    where
        I: IntoIterator<Item = &'a QuestionId>,
    {
        self.store.completed_count(ids)
    }

    pub async fn set_theme(&mut self, theme: impl Into<String>) {
        self.store.set_theme(theme).await;
    }

    pub async fn set_dark_mode(&mut self, dark_mode: bool) {
        self.store.set_dark_mode(dark_mode).await;
    }

    #[must_use]
    pub fn achievements(&self) -> &'static [Achievement] {
        ACHIEVEMENTS
    }

    #[must_use]
    pub fn unlocked_achievements(&self) -> Vec<&'static Achievement> {
        self.achievements.unlocked_achievements()
    }

    #[must_use]
    pub fn achievements_by_category(
        &self,
        category: AchievementCategory,
    ) -> Vec<&'static Achievement> {
        self.achievements.achievements_by_category(category)
    }

    #[must_use]
    pub fn is_achievement_unlocked(&self, id: &str) -> bool {
        self.achievements.is_unlocked(id)
    }

    #[must_use]
    pub fn unlocked_count(&self) -> usize {
        self.achievements.unlocked_count()
    }

    #[must_use]
    pub fn total_achievement_count(&self) -> usize {
        self.achievements.total_count()
    }

    #[must_use]
    pub fn pending_notification_count(&self) -> usize {
        self.achievements.state().pending_notifications.len()
    }

    // ─── Insights ─────────────────────────────────────────────────────────────

    /// Per-topic completion; empty without a catalog.
    #[must_use]
    pub fn topic_progress(&self) -> Vec<TopicProgress> {
        self.catalog()
            .map(|catalog| insights::topic_progress(catalog, self.store.document()))
            .unwrap_or_default()
    }

    #[must_use]
    pub fn readiness_score(&self) -> Option<u32> {
        self.catalog()
            .map(|catalog| insights::readiness_score(catalog, self.store.document()))
    }

    #[must_use]
    pub fn activity_by_day(&self) -> std::collections::BTreeMap<chrono::NaiveDate, usize> {
        insights::activity_by_day(self.store.document(), &self.store.clock())
    }
}
