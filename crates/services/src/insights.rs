//! Read models derived from the progress document and the catalog.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use devmap_core::model::{Catalog, ProgressDocument, Topic};
use devmap_core::time::Clock;
use serde::Serialize;

/// Completion of one catalog topic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TopicProgress {
    pub path: String,
    pub heading: String,
    pub completed: usize,
    pub total: usize,
    /// Rounded percentage, `0` for an empty topic.
    pub percent: u32,
}

impl TopicProgress {
    fn for_topic(topic: &Topic, progress: &ProgressDocument) -> Self {
        let completed = progress.completed_count(topic.question_ids());
        let total = topic.question_count();
        Self {
            path: topic.path.clone(),
            heading: topic.heading.clone(),
            completed,
            total,
            percent: percent(completed, total),
        }
    }
}

#[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn percent(part: usize, whole: usize) -> u32 {
    if whole == 0 {
        return 0;
    }
    ((part as f64 / whole as f64) * 100.0).round() as u32
}

#[must_use]
pub fn topic_progress(catalog: &Catalog, progress: &ProgressDocument) -> Vec<TopicProgress> {
    catalog
        .topics()
        .iter()
        .map(|topic| TopicProgress::for_topic(topic, progress))
        .collect()
}

/// Topics with at least one completed question.
#[must_use]
pub fn topics_attempted(catalog: &Catalog, progress: &ProgressDocument) -> usize {
    catalog
        .topics()
        .iter()
        .filter(|topic| topic.question_ids().any(|id| progress.is_done(id)))
        .count()
}

/// Completed questions per calendar day, keyed by the day of `completedAt`.
#[must_use]
pub fn activity_by_day(progress: &ProgressDocument, clock: &Clock) -> BTreeMap<NaiveDate, usize> {
    let mut days = BTreeMap::new();
    for at in progress
        .questions
        .values()
        .filter(|q| q.done)
        .filter_map(|q| q.completed_at)
    {
        *days.entry(clock.date_of(at)).or_insert(0) += 1;
    }
    days
}

/// Interview readiness in `0..=100`.
///
/// Overall completion percentage, plus up to 10 points for topic variety
/// and up to 10 points for the current streak (2 per day).
#[must_use]
#[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn readiness_score(catalog: &Catalog, progress: &ProgressDocument) -> u32 {
    let total_questions = catalog.count_all_questions();
    let base = if total_questions == 0 {
        0.0
    } else {
        f64::from(progress.stats.total_completed) / total_questions as f64 * 100.0
    };

    let topics = catalog.topics().len();
    let variety = if topics == 0 {
        0.0
    } else {
        topics_attempted(catalog, progress) as f64 / topics as f64 * 10.0
    };

    let streak = f64::from(progress.stats.streak_days.saturating_mul(2).min(10));

    ((base + variety + streak).round() as u32).min(100)
}
