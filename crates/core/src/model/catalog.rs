//! Read-only view of the practice-question catalog.
//!
//! The catalog is owned elsewhere; progress tracking only reads question ids
//! from it to compute counts and key lookups.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::ids::QuestionId;

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum CatalogError {
    #[error("invalid catalog JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("question id {0} appears more than once")]
    DuplicateQuestion(QuestionId),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    pub question_id: QuestionId,
    pub question_heading: String,
    #[serde(default)]
    pub question_index: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub question_link: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    #[serde(rename = "categoryId")]
    pub id: u32,
    #[serde(rename = "categoryName")]
    pub name: String,
    #[serde(rename = "questionList", default)]
    pub questions: Vec<Question>,
}

impl Category {
    #[must_use]
    pub fn question_count(&self) -> usize {
        self.questions.len()
    }

    pub fn question_ids(&self) -> impl Iterator<Item = &QuestionId> {
        self.questions.iter().map(|q| &q.question_id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Topic {
    #[serde(rename = "contentPath")]
    pub path: String,
    #[serde(rename = "contentHeading")]
    pub heading: String,
    #[serde(rename = "contentSubHeading", default)]
    pub sub_heading: String,
    #[serde(rename = "categoryList", default)]
    pub categories: Vec<Category>,
}

impl Topic {
    #[must_use]
    pub fn question_count(&self) -> usize {
        self.categories.iter().map(Category::question_count).sum()
    }

    pub fn question_ids(&self) -> impl Iterator<Item = &QuestionId> {
        self.categories.iter().flat_map(Category::question_ids)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Catalog {
    topics: Vec<Topic>,
}

#[derive(Deserialize)]
struct Envelope {
    data: EnvelopeData,
}

#[derive(Deserialize)]
struct EnvelopeData {
    content: Vec<Topic>,
}

impl Catalog {
    /// Build a catalog, rejecting duplicate question ids.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::DuplicateQuestion` if an id is used twice.
    pub fn new(topics: Vec<Topic>) -> Result<Self, CatalogError> {
        let mut seen = HashSet::new();
        for id in topics.iter().flat_map(Topic::question_ids) {
            if !seen.insert(id) {
                return Err(CatalogError::DuplicateQuestion(id.clone()));
            }
        }
        Ok(Self { topics })
    }

    /// Parse the `{ "data": { "content": [...] } }` catalog document.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError` on malformed JSON or duplicate ids.
    pub fn from_json(raw: &str) -> Result<Self, CatalogError> {
        let envelope: Envelope = serde_json::from_str(raw)?;
        Self::new(envelope.data.content)
    }

    #[must_use]
    pub fn topics(&self) -> &[Topic] {
        &self.topics
    }

    /// Total questions, summed over category sizes.
    #[must_use]
    pub fn count_all_questions(&self) -> usize {
        self.topics.iter().map(Topic::question_count).sum()
    }

    #[must_use]
    pub fn topic_by_heading(&self, heading: &str) -> Option<&Topic> {
        self.topics
            .iter()
            .find(|t| t.heading.eq_ignore_ascii_case(heading))
    }

    #[must_use]
    pub fn topic_by_path(&self, path: &str) -> Option<&Topic> {
        self.topics.iter().find(|t| t.path == path)
    }
}
