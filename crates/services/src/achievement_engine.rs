use std::sync::Arc;

use devmap_core::model::achievement::{DAILY_VOLUME, EARLY_BIRD, NIGHT_OWL};
use devmap_core::model::{
    ACHIEVEMENTS, Achievement, AchievementCategory, AchievementState, Catalog, ProgressDocument,
    achievements_in, find_achievement,
};
use devmap_core::time::Clock;
use storage::repository::AchievementRepository;
use tracing::{debug, info, warn};

/// Evaluates the static achievement catalog against progress signals.
///
/// Checks are pull-based: nothing here observes the progress document, so
/// callers must run the relevant `check_*` after each change. Every check is
/// idempotent, which makes running one with slightly stale input harmless.
pub struct AchievementEngine {
    clock: Clock,
    repo: Arc<dyn AchievementRepository>,
    state: AchievementState,
}

impl AchievementEngine {
    /// Load unlock state, falling back to empty state on any storage problem.
    pub async fn load(clock: Clock, repo: Arc<dyn AchievementRepository>) -> Self {
        let state = match repo.get_achievement_state().await {
            Ok(Some(mut state)) => {
                Self::drop_unknown_pending(&mut state);
                state
            }
            Ok(None) => AchievementState::default(),
            Err(err) => {
                warn!(error = %err, "failed to load achievements, using defaults");
                AchievementState::default()
            }
        };
        Self { clock, repo, state }
    }

    /// Queued ids that left the catalog can never be shown or acknowledged.
    fn drop_unknown_pending(state: &mut AchievementState) {
        state.pending_notifications.retain(|id| {
            let known = find_achievement(id).is_some();
            if !known {
                debug!(achievement = %id, "dropping pending notification for unknown achievement");
            }
            known
        });
    }

    /// Override the clock (usually for deterministic testing).
    pub fn set_clock(&mut self, clock: Clock) {
        self.clock = clock;
    }

    #[must_use]
    pub fn state(&self) -> &AchievementState {
        &self.state
    }

    async fn persist(&self) {
        if let Err(err) = self.repo.save_achievement_state(&self.state).await {
            warn!(error = %err, "failed to save achievements");
        }
    }

    #[must_use]
    pub fn is_unlocked(&self, id: &str) -> bool {
        self.state.is_unlocked(id)
    }

    fn record_unlock(&mut self, achievement: &'static Achievement) -> bool {
        let unlocked = self.state.unlock(achievement.id, self.clock.now());
        if unlocked {
            info!(
                achievement = achievement.id,
                rarity = ?achievement.rarity,
                "achievement unlocked"
            );
        }
        unlocked
    }

    /// Unlock one achievement by id.
    ///
    /// Returns the catalog entry when this call unlocked it, `None` if it was
    /// already unlocked or the id is not in the catalog.
    pub async fn unlock_achievement(&mut self, id: &str) -> Option<&'static Achievement> {
        let Some(achievement) = find_achievement(id) else {
            debug!(achievement = id, "ignoring unlock of unknown achievement");
            return None;
        };
        if !self.record_unlock(achievement) {
            return None;
        }
        self.persist().await;
        Some(achievement)
    }

    /// Unlock every candidate not yet unlocked, in the order given, with one write.
    async fn unlock_all<I>(&mut self, candidates: I) -> Vec<&'static Achievement>
    where
        I: IntoIterator<Item = &'static Achievement>,
    {
        let mut newly = Vec::new();
        for achievement in candidates {
            if self.record_unlock(achievement) {
                newly.push(achievement);
            }
        }
        if !newly.is_empty() {
            self.persist().await;
        }
        newly
    }

    fn reached(
        category: AchievementCategory,
        value: u32,
    ) -> impl Iterator<Item = &'static Achievement> {
        achievements_in(category).filter(move |a| value >= a.requirement)
    }

    pub async fn check_progress_achievements(
        &mut self,
        completed_count: u32,
    ) -> Vec<&'static Achievement> {
        self.unlock_all(Self::reached(AchievementCategory::Progress, completed_count))
            .await
    }

    pub async fn check_streak_achievements(&mut self, streak_days: u32) -> Vec<&'static Achievement> {
        self.unlock_all(Self::reached(AchievementCategory::Streak, streak_days))
            .await
    }

    /// Night owl for completions in `[00:00, 05:00)`, early bird in `[05:00, 06:00)`.
    pub async fn check_time_achievements(&mut self) -> Vec<&'static Achievement> {
        let id = match self.clock.hour() {
            0..=4 => Some(NIGHT_OWL),
            5 => Some(EARLY_BIRD),
            _ => None,
        };
        let candidates = id.and_then(find_achievement);
        self.unlock_all(candidates).await
    }

    /// Same-day volume: `completed_today` completions on the current calendar day.
    pub async fn check_daily_volume_achievements(
        &mut self,
        completed_today: u32,
    ) -> Vec<&'static Achievement> {
        let candidates = DAILY_VOLUME
            .iter()
            .filter_map(|id| find_achievement(id))
            .filter(|a| completed_today >= a.requirement);
        self.unlock_all(candidates).await
    }

    /// Distinct catalog topics with at least one completed question.
    pub async fn check_exploration_achievements(
        &mut self,
        topics_attempted: u32,
    ) -> Vec<&'static Achievement> {
        self.unlock_all(Self::reached(AchievementCategory::Exploration, topics_attempted))
            .await
    }

    /// Unlock mastery entries whose named topic exists and is fully done.
    pub async fn check_mastery_achievements(
        &mut self,
        catalog: &Catalog,
        progress: &ProgressDocument,
    ) -> Vec<&'static Achievement> {
        let candidates = achievements_in(AchievementCategory::Mastery).filter(|a| {
            a.mastery_topic()
                .and_then(|heading| catalog.topic_by_heading(heading))
                .is_some_and(|topic| {
                    topic.question_count() > 0
                        && progress.completed_count(topic.question_ids()) == topic.question_count()
                })
        });
        self.unlock_all(candidates).await
    }

    /// Acknowledge a shown notification.
    pub async fn mark_notified(&mut self, id: &str) {
        if self.state.mark_notified(id) {
            self.persist().await;
        }
    }

    /// Catalog entry at the head of the notification queue.
    #[must_use]
    pub fn next_pending_notification(&self) -> Option<&'static Achievement> {
        self.state
            .pending_notifications
            .front()
            .and_then(|id| find_achievement(id))
    }

    #[must_use]
    pub fn unlocked_count(&self) -> usize {
        self.state.unlocked.len()
    }

    #[must_use]
    pub fn total_count(&self) -> usize {
        ACHIEVEMENTS.len()
    }

    #[must_use]
    pub fn achievements_by_category(
        &self,
        category: AchievementCategory,
    ) -> Vec<&'static Achievement> {
        achievements_in(category).collect()
    }

    /// Unlocked entries, in catalog order.
    #[must_use]
    pub fn unlocked_achievements(&self) -> Vec<&'static Achievement> {
        ACHIEVEMENTS
            .iter()
            .filter(|a| self.state.is_unlocked(a.id))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};
    use devmap_core::model::QuestionId;
    use devmap_core::time::fixed_clock;
    use storage::repository::InMemoryRepository;

    async fn engine_at(clock: Clock) -> AchievementEngine {
        AchievementEngine::load(clock, Arc::new(InMemoryRepository::new())).await
    }

    fn ids(list: &[&'static Achievement]) -> Vec<&'static str> {
        list.iter().map(|a| a.id).collect()
    }

    #[tokio::test]
    async fn progress_jump_unlocks_in_catalog_order() {
        let mut engine = engine_at(fixed_clock()).await;
        engine.check_progress_achievements(5).await;
        engine.mark_notified("first_blood").await;

        let newly = engine.check_progress_achievements(30).await;
        assert_eq!(ids(&newly), vec!["getting_started", "warming_up"]);
        assert_eq!(engine.next_pending_notification().unwrap().id, "getting_started");

        engine.mark_notified("getting_started").await;
        assert_eq!(engine.next_pending_notification().unwrap().id, "warming_up");
        engine.mark_notified("warming_up").await;
        assert!(engine.next_pending_notification().is_none());
    }

    #[tokio::test]
    async fn repeated_checks_never_duplicate() {
        let mut engine = engine_at(fixed_clock()).await;
        for count in [1, 1, 10, 10, 26, 100] {
            engine.check_progress_achievements(count).await;
        }
        assert_eq!(engine.unlocked_count(), 5);
        let pending = &engine.state().pending_notifications;
        let mut sorted: Vec<_> = pending.iter().collect();
        sorted.sort();
        sorted.dedup();
        assert_eq!(sorted.len(), pending.len());
    }

    #[tokio::test]
    async fn unlock_unknown_or_twice_returns_none() {
        let mut engine = engine_at(fixed_clock()).await;
        assert!(engine.unlock_achievement("no_such_thing").await.is_none());
        assert_eq!(
            engine.unlock_achievement("century").await.map(|a| a.xp_reward),
            Some(500)
        );
        assert!(engine.unlock_achievement("century").await.is_none());
        assert!(engine.is_unlocked("century"));
    }

    #[tokio::test]
    async fn streak_thresholds() {
        let mut engine = engine_at(fixed_clock()).await;
        assert!(engine.check_streak_achievements(2).await.is_empty());
        let newly = engine.check_streak_achievements(14).await;
        assert_eq!(ids(&newly), vec!["streak_3", "streak_7", "streak_14"]);
    }

    #[tokio::test]
    async fn time_of_day_windows() {
        let at = |h: u32| Clock::fixed(Utc.with_ymd_and_hms(2024, 1, 2, h, 30, 0).unwrap());

        let mut engine = engine_at(at(3)).await;
        assert_eq!(ids(&engine.check_time_achievements().await), vec!["night_owl"]);

        engine.set_clock(at(5));
        assert_eq!(ids(&engine.check_time_achievements().await), vec!["early_bird"]);

        let mut daytime = engine_at(at(6)).await;
        assert!(daytime.check_time_achievements().await.is_empty());
    }

    #[tokio::test]
    async fn daily_volume_and_exploration() {
        let mut engine = engine_at(fixed_clock()).await;
        assert!(engine.check_daily_volume_achievements(4).await.is_empty());
        assert_eq!(
            ids(&engine.check_daily_volume_achievements(10).await),
            vec!["speed_demon", "marathon"]
        );
        assert_eq!(
            ids(&engine.check_exploration_achievements(10).await),
            vec!["explorer_5", "explorer_10"]
        );
    }

    #[tokio::test]
    async fn mastery_requires_full_topic() {
        let catalog = Catalog::from_json(
            r#"{"data":{"content":[{"contentPath":"arrays","contentHeading":"Arrays","categoryList":[
                {"categoryId":1,"categoryName":"Basics","questionList":[
                    {"questionId":"a1","questionHeading":"One"},
                    {"questionId":"a2","questionHeading":"Two"}]}]}]}}"#,
        )
        .unwrap();
        let mut clock = fixed_clock();
        let mut doc = ProgressDocument::default();
        doc.toggle_done(&QuestionId::new("a1"), &clock);

        let mut engine = engine_at(clock).await;
        assert!(engine.check_mastery_achievements(&catalog, &doc).await.is_empty());

        clock.advance(Duration::minutes(5));
        doc.toggle_done(&QuestionId::new("a2"), &clock);
        assert_eq!(
            ids(&engine.check_mastery_achievements(&catalog, &doc).await),
            vec!["master_arrays"]
        );
    }

    #[tokio::test]
    async fn queries_over_catalog() {
        let mut engine = engine_at(fixed_clock()).await;
        assert_eq!(engine.total_count(), ACHIEVEMENTS.len());
        assert_eq!(engine.achievements_by_category(AchievementCategory::Special).len(), 4);

        engine.unlock_achievement("streak_7").await;
        engine.unlock_achievement("first_blood").await;
        assert_eq!(ids(&engine.unlocked_achievements()), vec!["first_blood", "streak_7"]);
    }

    #[tokio::test]
    async fn unknown_pending_ids_are_dropped_on_load() {
        use devmap_core::config::StorageKey;
        use storage::repository::DocumentRepository;

        let repo = InMemoryRepository::new();
        repo.save_raw(
            StorageKey::Achievements,
            r#"{"unlocked":[],"pendingNotifications":["retired_badge","first_blood"]}"#,
        )
        .await
        .unwrap();
        let engine = AchievementEngine::load(fixed_clock(), Arc::new(repo)).await;
        assert_eq!(
            engine.state().pending_notifications.iter().collect::<Vec<_>>(),
            vec!["first_blood"]
        );
        assert_eq!(engine.next_pending_notification().unwrap().id, "first_blood");
    }

    #[tokio::test]
    async fn state_survives_reload() {
        let repo = InMemoryRepository::new();
        let mut engine = AchievementEngine::load(fixed_clock(), Arc::new(repo.clone())).await;
        engine.check_progress_achievements(1).await;

        let reloaded = AchievementEngine::load(fixed_clock(), Arc::new(repo)).await;
        assert!(reloaded.is_unlocked("first_blood"));
        assert_eq!(reloaded.next_pending_notification().unwrap().id, "first_blood");
    }
}
