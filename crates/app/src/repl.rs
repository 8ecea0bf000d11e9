use std::fmt;
use std::io::{self, Write};

use devmap_core::model::{AchievementCategory, QuestionId, ThemeMode};
use services::{ProgressContext, ToastSeverity};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Done(QuestionId),
    Bookmark(QuestionId),
    Note { id: QuestionId, text: String },
    Undo,
    Stats,
    Achievements(Option<AchievementCategory>),
    Dismiss,
    Theme(Option<ThemeMode>),
    Dark(bool),
    Topics,
    Help,
    Quit,
}

#[derive(Debug, PartialEq, Eq)]
pub enum CommandError {
    Empty,
    Unknown(String),
    MissingArg { command: &'static str, arg: &'static str },
    Invalid { command: &'static str, raw: String },
}

impl fmt::Display for CommandError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CommandError::Empty => write!(f, "empty command"),
            CommandError::Unknown(cmd) => write!(f, "unknown command: {cmd} (try `help`)"),
            CommandError::MissingArg { command, arg } => write!(f, "{command} requires <{arg}>"),
            CommandError::Invalid { command, raw } => write!(f, "invalid {command} value: {raw}"),
        }
    }
}

impl std::error::Error for CommandError {}

fn question_arg(raw: Option<&str>, command: &'static str) -> Result<QuestionId, CommandError> {
    let raw = raw.ok_or(CommandError::MissingArg { command, arg: "question-id" })?;
    raw.parse::<QuestionId>().map_err(|_| CommandError::Invalid {
        command,
        raw: raw.to_string(),
    })
}

impl Command {
    pub fn parse(line: &str) -> Result<Self, CommandError> {
        let line = line.trim();
        let (head, rest) = line
            .split_once(char::is_whitespace)
            .map_or((line, ""), |(h, r)| (h, r.trim()));
        let arg = Some(rest).filter(|r| !r.is_empty());

        match head {
            "" => Err(CommandError::Empty),
            "done" => question_arg(arg, "done").map(Command::Done),
            "bookmark" => question_arg(arg, "bookmark").map(Command::Bookmark),
            "note" => {
                let (id, text) = rest
                    .split_once(char::is_whitespace)
                    .map_or((rest, ""), |(id, text)| (id, text.trim()));
                let id = question_arg(Some(id).filter(|s| !s.is_empty()), "note")?;
                Ok(Command::Note {
                    id,
                    text: text.to_string(),
                })
            }
            "undo" => Ok(Command::Undo),
            "stats" => Ok(Command::Stats),
            "achievements" => arg
                .map(|raw| {
                    raw.parse::<AchievementCategory>().map_err(|_| CommandError::Invalid {
                        command: "achievements",
                        raw: raw.to_string(),
                    })
                })
                .transpose()
                .map(Command::Achievements),
            "dismiss" => Ok(Command::Dismiss),
            "theme" => arg
                .map(|raw| {
                    raw.parse::<ThemeMode>().map_err(|_| CommandError::Invalid {
                        command: "theme",
                        raw: raw.to_string(),
                    })
                })
                .transpose()
                .map(Command::Theme),
            "dark" => match arg {
                Some("on") => Ok(Command::Dark(true)),
                Some("off") => Ok(Command::Dark(false)),
                Some(other) => Err(CommandError::Invalid {
                    command: "dark",
                    raw: other.to_string(),
                }),
                None => Err(CommandError::MissingArg {
                    command: "dark",
                    arg: "on|off",
                }),
            },
            "topics" => Ok(Command::Topics),
            "help" | "?" => Ok(Command::Help),
            "quit" | "exit" => Ok(Command::Quit),
            other => Err(CommandError::Unknown(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

pub fn print_help(out: &mut impl Write) -> io::Result<()> {
    writeln!(out, "Commands:")?;
    writeln!(out, "  done <id>               toggle a question's completion")?;
    writeln!(out, "  bookmark <id>           toggle a bookmark")?;
    writeln!(out, "  note <id> [text]        replace a question's note")?;
    writeln!(out, "  undo                    undo the last toggle")?;
    writeln!(out, "  stats                   show XP, level and streak")?;
    writeln!(out, "  achievements [category] list achievements")?;
    writeln!(out, "  dismiss                 acknowledge the achievement popup")?;
    writeln!(out, "  theme [name]            show or set the theme")?;
    writeln!(out, "  dark on|off             toggle dark mode")?;
    writeln!(out, "  topics                  per-topic progress (needs a catalog)")?;
    writeln!(out, "  quit                    exit")
}

/// Run one command against the context and render what changed.
pub async fn execute(
    ctx: &mut ProgressContext,
    command: Command,
    out: &mut impl Write,
) -> io::Result<Flow> {
    match command {
        Command::Done(id) => {
            let outcome = ctx.toggle_done(&id).await;
            writeln!(
                out,
                "{id}: {} (level {}, {} XP)",
                if outcome.done { "done" } else { "not done" },
                outcome.stats.level,
                outcome.stats.xp
            )?;
        }
        Command::Bookmark(id) => {
            ctx.toggle_bookmark(&id).await;
        }
        Command::Note { id, text } => {
            ctx.update_question_note(&id, text).await;
            writeln!(out, "note saved for {id}")?;
        }
        Command::Undo => match ctx.undo_last_action().await {
            Some(action) => writeln!(out, "undid {:?} on {}", action.kind, action.question_id)?,
            None => writeln!(out, "nothing to undo")?,
        },
        Command::Stats => {
            let stats = ctx.stats();
            writeln!(out, "completed: {}", stats.total_completed)?;
            writeln!(out, "xp:        {} (level {})", stats.xp, stats.level)?;
            writeln!(out, "streak:    {} day(s)", stats.streak_days)?;
            if let Some(day) = stats.last_active_date {
                writeln!(out, "last active: {day}")?;
            }
            writeln!(
                out,
                "achievements: {}/{}",
                ctx.unlocked_count(),
                ctx.total_achievement_count()
            )?;
            if let Some(score) = ctx.readiness_score() {
                writeln!(out, "readiness: {score}/100")?;
            }
        }
        Command::Achievements(category) => {
            let list = match category {
                Some(category) => ctx.achievements_by_category(category),
                None => ctx.achievements().iter().collect(),
            };
            for achievement in list {
                let mark = if ctx.is_achievement_unlocked(achievement.id) {
                    "x"
                } else {
                    " "
                };
                writeln!(
                    out,
                    "[{mark}] {} {:<20} {:<10} {:?} {}",
                    achievement.icon,
                    achievement.title,
                    achievement.category,
                    achievement.rarity,
                    achievement.description
                )?;
            }
        }
        Command::Dismiss => {
            if ctx.current_achievement().is_some() {
                ctx.dismiss_achievement().await;
            } else {
                writeln!(out, "no achievement to dismiss")?;
            }
        }
        Command::Theme(None) => {
            let current = ctx.progress().theme.as_str();
            for theme in ThemeMode::ALL {
                let mark = if theme.as_str() == current { "*" } else { " " };
                writeln!(
                    out,
                    "{mark} {:<9} {}",
                    theme.display_name(),
                    theme.description()
                )?;
            }
        }
        Command::Theme(Some(theme)) => {
            ctx.set_theme(theme.as_str()).await;
            writeln!(out, "theme set to {}", theme.display_name())?;
        }
        Command::Dark(on) => {
            ctx.set_dark_mode(on).await;
            writeln!(out, "dark mode {}", if on { "on" } else { "off" })?;
        }
        Command::Topics => {
            let rows = ctx.topic_progress();
            if rows.is_empty() {
                writeln!(out, "no catalog loaded (pass --catalog)")?;
            }
            for row in rows {
                writeln!(
                    out,
                    "{:<28} {:>4}/{:<4} {:>3}%",
                    row.heading, row.completed, row.total, row.percent
                )?;
            }
        }
        Command::Help => print_help(out)?,
        Command::Quit => return Ok(Flow::Quit),
    }

    render_notifications(ctx, out)?;
    Ok(Flow::Continue)
}

/// Print queued toasts and the achievement popup, if one is up.
pub fn render_notifications(ctx: &mut ProgressContext, out: &mut impl Write) -> io::Result<()> {
    for toast in ctx.drain_toasts() {
        let tag = match toast.severity {
            ToastSeverity::Success => "ok",
            ToastSeverity::Info => "info",
            ToastSeverity::Warning => "warn",
        };
        let hint = if toast.undo { " (type `undo` to revert)" } else { "" };
        writeln!(out, "[{tag}] {}{hint}", toast.message)?;
    }
    if let Some(achievement) = ctx.poll_achievement_popup() {
        let rarity = format!("{:?}", achievement.rarity);
        writeln!(
            out,
            "*** Achievement unlocked: {} {} ({}, +{} XP) - {}. Type `dismiss`.",
            achievement.icon,
            achievement.title,
            paint(&rarity, achievement.rarity.color()),
            achievement.xp_reward,
            achievement.description
        )?;
    }
    Ok(())
}

/// Wrap `text` in a 24-bit ANSI foreground colour given as `#rrggbb`.
/// Anything else leaves the text unstyled.
fn paint(text: &str, hex: &str) -> String {
    let channel = |range: std::ops::Range<usize>| {
        hex.strip_prefix('#')
            .filter(|h| h.len() == 6)
            .and_then(|h| h.get(range))
            .and_then(|c| u8::from_str_radix(c, 16).ok())
    };
    match (channel(0..2), channel(2..4), channel(4..6)) {
        (Some(r), Some(g), Some(b)) => format!("\x1b[38;2;{r};{g};{b}m{text}\x1b[0m"),
        _ => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use devmap_core::time::fixed_clock;
    use services::TrackerServices;

    #[test]
    fn parses_commands() {
        assert_eq!(
            Command::parse("done two-sum"),
            Ok(Command::Done(QuestionId::new("two-sum")))
        );
        assert_eq!(
            Command::parse("  note q1 use a   stack "),
            Ok(Command::Note {
                id: QuestionId::new("q1"),
                text: "use a   stack".into()
            })
        );
        assert_eq!(
            Command::parse("note q1"),
            Ok(Command::Note {
                id: QuestionId::new("q1"),
                text: String::new()
            })
        );
        assert_eq!(
            Command::parse("achievements streak"),
            Ok(Command::Achievements(Some(AchievementCategory::Streak)))
        );
        assert_eq!(Command::parse("theme"), Ok(Command::Theme(None)));
        assert_eq!(Command::parse("dark on"), Ok(Command::Dark(true)));
        assert_eq!(Command::parse("exit"), Ok(Command::Quit));
    }

    #[test]
    fn rejects_bad_input() {
        assert_eq!(Command::parse("   "), Err(CommandError::Empty));
        assert!(matches!(
            Command::parse("done"),
            Err(CommandError::MissingArg { command: "done", .. })
        ));
        assert!(matches!(
            Command::parse("dark maybe"),
            Err(CommandError::Invalid { command: "dark", .. })
        ));
        assert!(matches!(
            Command::parse("theme neon"),
            Err(CommandError::Invalid { command: "theme", .. })
        ));
        assert_eq!(
            Command::parse("fly"),
            Err(CommandError::Unknown("fly".into()))
        );
    }

    #[tokio::test]
    async fn done_prints_toast_and_popup() {
        let mut ctx = TrackerServices::in_memory(fixed_clock(), None)
            .context()
            .await;
        let mut out = Vec::new();
        let flow = execute(&mut ctx, Command::Done(QuestionId::new("q1")), &mut out)
            .await
            .unwrap();
        assert_eq!(flow, Flow::Continue);

        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("q1: done (level 1, 10 XP)"));
        assert!(text.contains("[ok] Question marked as done! +10 XP"));
        assert!(text.contains("Achievement unlocked: 🎯 First Blood"));

        let mut out = Vec::new();
        execute(&mut ctx, Command::Dismiss, &mut out).await.unwrap();
        assert!(ctx.current_achievement().is_none());
        assert!(String::from_utf8(out).unwrap().is_empty());
    }

    #[test]
    fn paint_uses_rarity_colour() {
        assert_eq!(paint("Rare", "#3b82f6"), "\x1b[38;2;59;130;246mRare\x1b[0m");
        assert_eq!(paint("Rare", "blue"), "Rare");
    }

    #[tokio::test]
    async fn quit_stops_loop() {
        let mut ctx = TrackerServices::in_memory(fixed_clock(), None)
            .context()
            .await;
        let mut out = Vec::new();
        assert_eq!(
            execute(&mut ctx, Command::Quit, &mut out).await.unwrap(),
            Flow::Quit
        );
    }
}
