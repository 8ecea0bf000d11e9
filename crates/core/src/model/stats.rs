use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::config::{XP_PER_QUESTION, level_for_xp};

/// Aggregate counters kept alongside the question map.
///
/// `total_completed` is maintained incrementally and must move together with
/// `xp` and `level` whenever a question's `done` flag flips.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ProgressStats {
    pub total_completed: u32,
    pub streak_days: u32,
    /// Serialized as `YYYY-MM-DD`, or the empty string before any activity.
    #[serde(with = "date_or_empty")]
    pub last_active_date: Option<NaiveDate>,
    pub xp: u32,
    pub level: u32,
}

impl Default for ProgressStats {
    fn default() -> Self {
        Self {
            total_completed: 0,
            streak_days: 0,
            last_active_date: None,
            xp: 0,
            level: 1,
        }
    }
}

impl ProgressStats {
    /// Re-derive `level` from `xp`. Stored documents may carry a stale or
    /// missing level.
    pub fn normalize(&mut self) {
        self.level = level_for_xp(self.xp);
    }

    /// Apply one question flipping to `done` (or back), floored at zero.
    pub fn apply_completion(&mut self, done: bool) {
        if done {
            self.total_completed = self.total_completed.saturating_add(1);
            self.xp = self.xp.saturating_add(XP_PER_QUESTION);
        } else {
            self.total_completed = self.total_completed.saturating_sub(1);
            self.xp = self.xp.saturating_sub(XP_PER_QUESTION);
        }
        self.level = level_for_xp(self.xp);
    }

    /// Extend, keep, or restart the streak for activity on `today`.
    ///
    /// Only the first completion of a day counts; any gap (including no
    /// prior activity at all) restarts the streak at one.
    pub fn record_activity(&mut self, today: NaiveDate, yesterday: NaiveDate) {
        match self.last_active_date {
            Some(last) if last == today => {}
            Some(last) if last == yesterday => {
                self.streak_days = self.streak_days.saturating_add(1);
            }
            _ => self.streak_days = 1,
        }
        self.last_active_date = Some(today);
    }
}

mod date_or_empty {
    use chrono::NaiveDate;
    use serde::{Deserialize, Deserializer, Serializer};

    const FORMAT: &str = "%Y-%m-%d";

    pub fn serialize<S>(value: &Option<NaiveDate>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(date) => serializer.serialize_str(&date.format(FORMAT).to_string()),
            None => serializer.serialize_str(""),
        }
    }

    // Unparseable dates read as "never active", which restarts the streak.
    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw: Option<String> = Option::deserialize(deserializer)?;
        Ok(raw.and_then(|s| NaiveDate::parse_from_str(s.trim(), FORMAT).ok()))
    }
}
