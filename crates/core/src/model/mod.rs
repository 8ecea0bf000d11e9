pub mod achievement;
pub mod catalog;
mod ids;
mod progress;
mod question;
mod stats;
mod theme;

pub use achievement::{
    ACHIEVEMENTS, Achievement, AchievementCategory, AchievementError, AchievementState, Rarity,
    UnlockedAchievement, achievements_in, find_achievement,
};
pub use catalog::{Catalog, CatalogError, Category, Question, Topic};
pub use ids::{ParseIdError, QuestionId};
pub use progress::{ActionKind, LastAction, ProgressDocument};
pub use question::QuestionProgress;
pub use stats::ProgressStats;
pub use theme::{ThemeError, ThemeMode};
