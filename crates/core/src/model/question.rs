use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Per-question user state.
///
/// Records are created lazily on the first mutation; a missing record reads
/// the same as `QuestionProgress::default()`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct QuestionProgress {
    pub done: bool,
    pub bookmarked: bool,
    /// Set when the question transitions to done, cleared when it is undone.
    #[serde(
        with = "chrono::serde::ts_milliseconds_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub completed_at: Option<DateTime<Utc>>,
    /// Free text. Length limits belong to whoever produces the note.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub notes: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::fixed_now;

    #[test]
    fn missing_fields_fall_back_to_defaults() {
        let parsed: QuestionProgress = serde_json::from_str(r#"{"done":true}"#).unwrap();
        assert!(parsed.done);
        assert!(!parsed.bookmarked);
        assert_eq!(parsed.completed_at, None);
        assert!(parsed.notes.is_empty());
    }

    #[test]
    fn completed_at_is_stored_as_epoch_millis() {
        let progress = QuestionProgress {
            done: true,
            completed_at: Some(fixed_now()),
            ..QuestionProgress::default()
        };
        let json = serde_json::to_value(&progress).unwrap();
        assert_eq!(json["completedAt"], 1_700_000_000_000_i64);
        assert!(json.get("notes").is_none());
    }
}
