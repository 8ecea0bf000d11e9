use std::collections::VecDeque;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum AchievementError {
    #[error("unknown achievement category: {0}")]
    UnknownCategory(String),
}

//
// ─── CATEGORY / RARITY ─────────────────────────────────────────────────────────
//

/// Which progress signal an achievement's requirement is measured against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AchievementCategory {
    /// Cumulative completed-question count.
    Progress,
    /// Current streak length in days.
    Streak,
    /// A named topic fully completed.
    Mastery,
    /// Distinct topics with at least one completion.
    Exploration,
    /// Time-of-day and same-day volume.
    Special,
}

impl AchievementCategory {
    pub const ALL: [AchievementCategory; 5] = [
        AchievementCategory::Progress,
        AchievementCategory::Streak,
        AchievementCategory::Mastery,
        AchievementCategory::Exploration,
        AchievementCategory::Special,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            AchievementCategory::Progress => "progress",
            AchievementCategory::Streak => "streak",
            AchievementCategory::Mastery => "mastery",
            AchievementCategory::Exploration => "exploration",
            AchievementCategory::Special => "special",
        }
    }
}

impl fmt::Display for AchievementCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AchievementCategory {
    type Err = AchievementError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| AchievementError::UnknownCategory(s.to_string()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Rarity {
    Common,
    Uncommon,
    Rare,
    Epic,
    Legendary,
}

impl Rarity {
    /// Hex colour used when rendering a badge of this rarity.
    #[must_use]
    pub fn color(self) -> &'static str {
        match self {
            Rarity::Common => "#9ca3af",
            Rarity::Uncommon => "#22c55e",
            Rarity::Rare => "#3b82f6",
            Rarity::Epic => "#a855f7",
            Rarity::Legendary => "#f59e0b",
        }
    }
}

//
// ─── CATALOG ENTRY ─────────────────────────────────────────────────────────────
//

/// Immutable achievement definition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Achievement {
    pub id: &'static str,
    pub title: &'static str,
    pub description: &'static str,
    pub icon: &'static str,
    pub category: AchievementCategory,
    pub requirement: u32,
    pub xp_reward: u32,
    pub rarity: Rarity,
}

impl Achievement {
    /// Catalog topic heading a mastery achievement is tied to.
    #[must_use]
    pub fn mastery_topic(&self) -> Option<&'static str> {
        match self.id {
            "master_basics" => Some("Basics"),
            "master_arrays" => Some("Arrays"),
            "master_dp" => Some("Dynamic Programming"),
            "master_graphs" => Some("Graphs"),
            "master_trees" => Some("Binary Trees"),
            _ => None,
        }
    }
}

macro_rules! achievement {
    ($id:literal, $title:literal, $desc:literal, $icon:literal, $cat:ident, $req:literal, $xp:literal, $rarity:ident) => {
        Achievement {
            id: $id,
            title: $title,
            description: $desc,
            icon: $icon,
            category: AchievementCategory::$cat,
            requirement: $req,
            xp_reward: $xp,
            rarity: Rarity::$rarity,
        }
    };
}

/// Ordered achievement catalog. Checks walk it front to back, so catalog
/// order is also unlock (and notification) order within one check.
///
/// Progress thresholds are tied to a 456-question catalog.
pub static ACHIEVEMENTS: &[Achievement] = &[
    achievement!("first_blood", "First Blood", "Complete your first problem", "🎯", Progress, 1, 10, Common),
    achievement!("getting_started", "Getting Started", "Complete 10 problems", "🚀", Progress, 10, 50, Common),
    achievement!("warming_up", "Warming Up", "Complete 25 problems", "🔥", Progress, 25, 100, Uncommon),
    achievement!("on_a_roll", "On a Roll", "Complete 50 problems", "⚡", Progress, 50, 200, Uncommon),
    achievement!("century", "Century", "Complete 100 problems", "💯", Progress, 100, 500, Rare),
    achievement!("halfway_there", "Halfway There", "Complete 228 problems (50%)", "🎖️", Progress, 228, 1000, Rare),
    achievement!("almost_there", "Almost There", "Complete 400 problems", "🏆", Progress, 400, 2000, Epic),
    achievement!("completionist", "Completionist", "Complete all 456 problems", "👑", Progress, 456, 5000, Legendary),
    achievement!("streak_3", "Hat Trick", "Maintain a 3-day streak", "🔥", Streak, 3, 30, Common),
    achievement!("streak_7", "Week Warrior", "Maintain a 7-day streak", "📅", Streak, 7, 100, Uncommon),
    achievement!("streak_14", "Fortnight Fighter", "Maintain a 14-day streak", "⚔️", Streak, 14, 250, Rare),
    achievement!("streak_30", "Monthly Master", "Maintain a 30-day streak", "🌟", Streak, 30, 500, Epic),
    achievement!("streak_100", "Centurion", "Maintain a 100-day streak", "🏅", Streak, 100, 2000, Legendary),
    achievement!("master_basics", "Foundation Builder", "Complete all Basics problems", "📚", Mastery, 1, 100, Uncommon),
    achievement!("master_arrays", "Array Architect", "Complete all Arrays problems", "🧱", Mastery, 1, 200, Rare),
    achievement!("master_dp", "DP Wizard", "Complete all Dynamic Programming problems", "🧙", Mastery, 1, 500, Epic),
    achievement!("master_graphs", "Graph Navigator", "Complete all Graphs problems", "🗺️", Mastery, 1, 400, Epic),
    achievement!("master_trees", "Tree Hugger", "Complete all Binary Trees problems", "🌳", Mastery, 1, 300, Rare),
    achievement!("explorer_5", "Curious Mind", "Attempt problems from 5 different topics", "🔍", Exploration, 5, 50, Common),
    achievement!("explorer_10", "Well Rounded", "Attempt problems from 10 different topics", "🌐", Exploration, 10, 150, Uncommon),
    achievement!("explorer_all", "Jack of All Trades", "Attempt problems from all topics", "🎨", Exploration, 17, 300, Rare),
    achievement!("night_owl", "Night Owl", "Complete a problem after midnight", "🦉", Special, 1, 50, Uncommon),
    achievement!("early_bird", "Early Bird", "Complete a problem before 6 AM", "🐦", Special, 1, 50, Uncommon),
    achievement!("speed_demon", "Speed Demon", "Complete 5 problems in one day", "💨", Special, 5, 100, Rare),
    achievement!("marathon", "Marathon Runner", "Complete 10 problems in one day", "🏃", Special, 10, 250, Epic),
];

/// Special achievements driven by the hour of completion.
pub const NIGHT_OWL: &str = "night_owl";
pub const EARLY_BIRD: &str = "early_bird";
/// Special achievements driven by completions within one calendar day.
pub const DAILY_VOLUME: [&str; 2] = ["speed_demon", "marathon"];

#[must_use]
pub fn find_achievement(id: &str) -> Option<&'static Achievement> {
    ACHIEVEMENTS.iter().find(|a| a.id == id)
}

/// Catalog entries of one category, in catalog order.
pub fn achievements_in(
    category: AchievementCategory,
) -> impl Iterator<Item = &'static Achievement> {
    ACHIEVEMENTS.iter().filter(move |a| a.category == category)
}

//
// ─── UNLOCK STATE ──────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnlockedAchievement {
    pub achievement_id: String,
    pub unlocked_at: DateTime<Utc>,
    pub notified: bool,
}

/// Persisted unlock record plus the FIFO of unlocks not yet shown.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AchievementState {
    pub unlocked: Vec<UnlockedAchievement>,
    pub pending_notifications: VecDeque<String>,
}

impl AchievementState {
    #[must_use]
    pub fn is_unlocked(&self, id: &str) -> bool {
        self.unlocked.iter().any(|u| u.achievement_id == id)
    }

    /// Record an unlock and queue its notification. Returns `false` if it
    /// was already unlocked.
    pub fn unlock(&mut self, id: &str, at: DateTime<Utc>) -> bool {
        if self.is_unlocked(id) {
            return false;
        }
        self.unlocked.push(UnlockedAchievement {
            achievement_id: id.to_string(),
            unlocked_at: at,
            notified: false,
        });
        if !self.pending_notifications.iter().any(|p| p == id) {
            self.pending_notifications.push_back(id.to_string());
        }
        true
    }

    /// Acknowledge a notification and drop it from the queue.
    pub fn mark_notified(&mut self, id: &str) -> bool {
        let before = self.pending_notifications.len();
        self.pending_notifications.retain(|p| p != id);
        let mut changed = before != self.pending_notifications.len();
        for unlocked in self.unlocked.iter_mut().filter(|u| u.achievement_id == id) {
            changed |= !unlocked.notified;
            unlocked.notified = true;
        }
        changed
    }

    #[must_use]
    pub fn next_pending(&self) -> Option<&str> {
        self.pending_notifications.front().map(String::as_str)
    }
}
