//! Fixed tuning values and storage slot names shared by every layer.

/// XP granted for each question marked as done.
pub const XP_PER_QUESTION: u32 = 10;

/// XP required to advance one level.
pub const XP_PER_LEVEL: u32 = 100;

/// Schema version written into new progress documents.
pub const PROGRESS_DOCUMENT_VERSION: u32 = 1;

/// Theme applied when the stored document carries none.
pub const DEFAULT_THEME: &str = "fusion";

/// Level reached with the given amount of XP: `floor(xp / 100) + 1`.
#[must_use]
pub fn level_for_xp(xp: u32) -> u32 {
    xp / XP_PER_LEVEL + 1
}

/// Named key-value slots where the persisted documents live.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StorageKey {
    Progress,
    Achievements,
}

impl StorageKey {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            StorageKey::Progress => "dsa-progress",
            StorageKey::Achievements => "dsa-achievements",
        }
    }
}

impl std::fmt::Display for StorageKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
