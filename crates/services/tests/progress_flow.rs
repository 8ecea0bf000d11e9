use chrono::{Duration, TimeZone, Utc};
use devmap_core::Clock;
use devmap_core::config::StorageKey;
use devmap_core::model::{Catalog, QuestionId};
use devmap_core::time::fixed_clock;
use services::{ProgressContext, TrackerServices};
use storage::repository::{DocumentRepository, InMemoryRepository, Storage};

fn qid(s: &str) -> QuestionId {
    QuestionId::new(s)
}

async fn fresh_context() -> ProgressContext {
    TrackerServices::in_memory(fixed_clock(), None).context().await
}

#[tokio::test]
async fn first_completion_unlocks_first_blood() {
    let mut ctx = fresh_context().await;
    let outcome = ctx.toggle_done(&qid("q1")).await;

    assert!(ctx.is_question_done(&qid("q1")));
    assert_eq!(outcome.stats.total_completed, 1);
    assert_eq!(outcome.stats.xp, 10);
    assert_eq!(outcome.stats.level, 1);
    assert_eq!(outcome.stats.streak_days, 1);
    assert_eq!(
        outcome.unlocked.iter().map(|a| a.id).collect::<Vec<_>>(),
        vec!["first_blood"]
    );
    assert_eq!(ctx.current_achievement().map(|a| a.id), Some("first_blood"));
}

#[tokio::test]
async fn re_toggle_reverts_stats_but_keeps_achievement() {
    let mut ctx = fresh_context().await;
    ctx.toggle_done(&qid("q1")).await;
    let outcome = ctx.toggle_done(&qid("q1")).await;

    assert!(!outcome.done);
    assert_eq!(outcome.stats.total_completed, 0);
    assert_eq!(outcome.stats.xp, 0);
    assert_eq!(outcome.stats.level, 1);
    assert!(ctx.is_achievement_unlocked("first_blood"));
    assert!(ctx.progress().question(&qid("q1")).unwrap().completed_at.is_none());
}

#[tokio::test]
async fn toggle_twice_is_symmetric() {
    let mut ctx = fresh_context().await;
    for id in ["a", "b", "c"] {
        ctx.toggle_done(&qid(id)).await;
    }
    let before = ctx.stats().clone();

    ctx.toggle_done(&qid("z")).await;
    ctx.toggle_done(&qid("z")).await;

    assert_eq!(ctx.stats().total_completed, before.total_completed);
    assert_eq!(ctx.stats().xp, before.xp);
    assert!(!ctx.is_question_done(&qid("z")));
}

#[tokio::test]
async fn completed_count_over_id_list() {
    let mut ctx = fresh_context().await;
    ctx.toggle_done(&qid("q2")).await;
    let ids = [qid("q1"), qid("q2"), qid("q3")];
    assert_eq!(ctx.completed_count(&ids), 1);
}

#[tokio::test]
async fn level_tracks_xp() {
    let mut ctx = fresh_context().await;
    for n in 0..25 {
        ctx.toggle_done(&qid(&format!("q{n}"))).await;
        let stats = ctx.stats();
        assert_eq!(stats.level, stats.xp / 100 + 1);
    }
    assert_eq!(ctx.stats().xp, 250);
    assert_eq!(ctx.stats().level, 3);
    assert!(ctx.is_achievement_unlocked("warming_up"));
}

#[tokio::test]
async fn xp_never_goes_negative_from_inconsistent_document() {
    let repo = InMemoryRepository::new();
    repo.save_raw(
        StorageKey::Progress,
        r#"{"questions":{"q1":{"done":true}},"stats":{"totalCompleted":0,"xp":0,"level":1}}"#,
    )
    .await
    .unwrap();
    let storage = Storage::from_documents(repo);
    let mut ctx = ProgressContext::load(&storage, fixed_clock(), None).await;

    let outcome = ctx.toggle_done(&qid("q1")).await;
    assert!(!outcome.done);
    assert_eq!(outcome.stats.total_completed, 0);
    assert_eq!(outcome.stats.xp, 0);

    // Undo restores the flag and re-applies the completion.
    ctx.undo_last_action().await;
    assert_eq!(ctx.stats().xp, 10);
    ctx.toggle_done(&qid("q1")).await;
    assert_eq!(ctx.stats().xp, 0);
    assert_eq!(ctx.stats().level, 1);
}

#[tokio::test]
async fn streak_counts_days_not_completions() {
    let mut ctx = fresh_context().await;
    let mut clock = fixed_clock();
    for day in 0..3 {
        for n in 0..3 {
            ctx.toggle_done(&qid(&format!("d{day}-{n}"))).await;
        }
        assert_eq!(ctx.stats().streak_days, day + 1);
        clock.advance(Duration::days(1));
        ctx.set_clock(clock);
    }
    assert!(ctx.is_achievement_unlocked("streak_3"));

    // Skip a day: the next completion restarts the streak.
    clock.advance(Duration::days(1));
    ctx.set_clock(clock);
    ctx.toggle_done(&qid("late")).await;
    assert_eq!(ctx.stats().streak_days, 1);
}

#[tokio::test]
async fn undo_does_not_reverse_streak() {
    let mut ctx = fresh_context().await;
    ctx.toggle_done(&qid("q1")).await;
    ctx.undo_last_action().await;
    assert_eq!(ctx.stats().total_completed, 0);
    assert_eq!(ctx.stats().streak_days, 1);
}

#[tokio::test]
async fn notifications_follow_catalog_order() {
    let mut ctx = fresh_context().await;
    let mut clock = fixed_clock();
    // Spread completions over days so the daily volume badges stay locked.
    for n in 0..30 {
        if n % 4 == 0 {
            clock.advance(Duration::days(1));
            ctx.set_clock(clock);
        }
        ctx.toggle_done(&qid(&format!("q{n}"))).await;
    }

    let mut shown = Vec::new();
    while let Some(achievement) = ctx.poll_achievement_popup() {
        shown.push(achievement.id);
        ctx.dismiss_achievement().await;
    }
    assert_eq!(
        shown,
        vec!["first_blood", "streak_3", "getting_started", "warming_up", "streak_7"]
    );
    assert_eq!(ctx.pending_notification_count(), 0);
}

#[tokio::test]
async fn night_completion_unlocks_night_owl() {
    let clock = Clock::fixed(Utc.with_ymd_and_hms(2024, 3, 9, 2, 15, 0).unwrap());
    let mut ctx = TrackerServices::in_memory(clock, None).context().await;
    let outcome = ctx.toggle_done(&qid("q1")).await;
    let ids: Vec<_> = outcome.unlocked.iter().map(|a| a.id).collect();
    assert_eq!(ids, vec!["first_blood", "night_owl"]);
}

#[tokio::test]
async fn catalog_drives_exploration_mastery_and_insights() {
    let catalog = Catalog::from_json(
        r#"{"data":{"content":[
            {"contentPath":"basics","contentHeading":"Basics","categoryList":[
                {"categoryId":1,"categoryName":"Intro","questionList":[
                    {"questionId":"b1","questionHeading":"Hello"},
                    {"questionId":"b2","questionHeading":"Loops"}]}]},
            {"contentPath":"arrays","contentHeading":"Arrays","categoryList":[
                {"categoryId":2,"categoryName":"Easy","questionList":[
                    {"questionId":"a1","questionHeading":"Two Sum"}]}]},
            {"contentPath":"graphs","contentHeading":"Graphs","categoryList":[
                {"categoryId":3,"categoryName":"BFS","questionList":[
                    {"questionId":"g1","questionHeading":"Islands"}]}]},
            {"contentPath":"dp","contentHeading":"Dynamic Programming","categoryList":[
                {"categoryId":4,"categoryName":"1D","questionList":[
                    {"questionId":"p1","questionHeading":"Stairs"}]}]},
            {"contentPath":"trees","contentHeading":"Binary Trees","categoryList":[
                {"categoryId":5,"categoryName":"Traversal","questionList":[
                    {"questionId":"t1","questionHeading":"Inorder"}]}]}
        ]}}"#,
    )
    .unwrap();
    let mut ctx = TrackerServices::in_memory(fixed_clock(), Some(catalog))
        .context()
        .await;

    let outcome = ctx.toggle_done(&qid("b1")).await;
    assert!(!outcome.unlocked.iter().any(|a| a.id == "master_basics"));
    let outcome = ctx.toggle_done(&qid("b2")).await;
    assert!(outcome.unlocked.iter().any(|a| a.id == "master_basics"));

    for id in ["a1", "g1", "p1"] {
        ctx.toggle_done(&qid(id)).await;
    }
    assert!(!ctx.is_achievement_unlocked("explorer_5"));
    let outcome = ctx.toggle_done(&qid("t1")).await;
    let ids: Vec<_> = outcome.unlocked.iter().map(|a| a.id).collect();
    assert!(ids.contains(&"explorer_5"));
    assert!(ids.contains(&"master_trees"));

    let rows = ctx.topic_progress();
    assert_eq!(rows.len(), 5);
    assert!(rows.iter().all(|row| row.percent == 100));
    // 100 base + 10 variety + 2 streak, capped.
    assert_eq!(ctx.readiness_score(), Some(100));
    assert_eq!(ctx.activity_by_day().values().sum::<usize>(), 6);
}

#[tokio::test]
async fn sqlite_backed_context_survives_restart() {
    let url = "sqlite:file:memdb_progress_flow?mode=memory&cache=shared";
    let services = TrackerServices::new_sqlite(url, fixed_clock(), None)
        .await
        .expect("open sqlite");

    let mut ctx = services.context().await;
    ctx.toggle_done(&qid("q1")).await;
    ctx.toggle_bookmark(&qid("q2")).await;
    ctx.update_question_note(&qid("q2"), "two pointers").await;
    ctx.dismiss_achievement().await;

    let reopened = services.context().await;
    assert!(reopened.is_question_done(&qid("q1")));
    assert!(reopened.is_question_bookmarked(&qid("q2")));
    assert_eq!(reopened.question_note(&qid("q2")), "two pointers");
    assert!(reopened.is_achievement_unlocked("first_blood"));
    assert!(reopened.current_achievement().is_none());
}
