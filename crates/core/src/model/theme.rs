use std::fmt;
use std::str::FromStr;

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("unknown theme: {0}")]
pub struct ThemeError(pub String);

/// Visual themes a front end can offer. The progress document stores the
/// theme as a free-form string; this is the recognised set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ThemeMode {
    #[default]
    Fusion,
    Terminal,
    Zen,
    Quest,
    Modern,
    Retro,
}

impl ThemeMode {
    pub const ALL: [ThemeMode; 6] = [
        ThemeMode::Fusion,
        ThemeMode::Terminal,
        ThemeMode::Zen,
        ThemeMode::Quest,
        ThemeMode::Modern,
        ThemeMode::Retro,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            ThemeMode::Fusion => "fusion",
            ThemeMode::Terminal => "terminal",
            ThemeMode::Zen => "zen",
            ThemeMode::Quest => "quest",
            ThemeMode::Modern => "modern",
            ThemeMode::Retro => "retro",
        }
    }

    #[must_use]
    pub fn display_name(self) -> &'static str {
        match self {
            ThemeMode::Fusion => "Fusion",
            ThemeMode::Terminal => "Terminal",
            ThemeMode::Zen => "Zen",
            ThemeMode::Quest => "Quest",
            ThemeMode::Modern => "Modern",
            ThemeMode::Retro => "Retro",
        }
    }

    #[must_use]
    pub fn description(self) -> &'static str {
        match self {
            ThemeMode::Fusion => "Signature blend",
            ThemeMode::Terminal => "Hacker command-line aesthetic",
            ThemeMode::Zen => "Minimal, distraction-free",
            ThemeMode::Quest => "RPG-style gamification",
            ThemeMode::Modern => "Sleek startup aesthetic",
            ThemeMode::Retro => "Pixel art nostalgia",
        }
    }
}

impl fmt::Display for ThemeMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ThemeMode {
    type Err = ThemeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim();
        Self::ALL
            .into_iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(needle))
            .ok_or_else(|| ThemeError(s.to_string()))
    }
}
