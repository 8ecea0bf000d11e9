use async_trait::async_trait;
use devmap_core::config::StorageKey;
use devmap_core::model::{AchievementState, ProgressDocument};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use thiserror::Error;

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

//
// ─── RAW DOCUMENT SLOTS ────────────────────────────────────────────────────────
//

/// Key-value contract: one JSON text per [`StorageKey`], read and written whole.
#[async_trait]
pub trait DocumentRepository: Send + Sync {
    /// Fetch the stored text for `key`, or `None` if the slot is empty.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backend cannot be read.
    async fn load_raw(&self, key: StorageKey) -> Result<Option<String>, StorageError>;

    /// Replace the stored text for `key`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backend cannot be written.
    async fn save_raw(&self, key: StorageKey, body: &str) -> Result<(), StorageError>;
}

/// Decode a stored document.
///
/// # Errors
///
/// Returns `StorageError::Serialization` if the text is not valid JSON for `T`.
pub fn decode<T: DeserializeOwned>(raw: &str) -> Result<T, StorageError> {
    serde_json::from_str(raw).map_err(|err| StorageError::Serialization(err.to_string()))
}

/// Encode a document for storage.
///
/// # Errors
///
/// Returns `StorageError::Serialization` if `value` cannot be represented as JSON.
pub fn encode<T: Serialize>(value: &T) -> Result<String, StorageError> {
    serde_json::to_string(value).map_err(|err| StorageError::Serialization(err.to_string()))
}

//
// ─── TYPED REPOSITORIES ────────────────────────────────────────────────────────
//

#[async_trait]
pub trait ProgressRepository: Send + Sync {
    /// Load the progress document, merged over defaults.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the slot cannot be read or decoded.
    async fn get_progress(&self) -> Result<Option<ProgressDocument>, StorageError>;

    /// Persist the full progress document.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the document cannot be stored.
    async fn save_progress(&self, document: &ProgressDocument) -> Result<(), StorageError>;
}

#[async_trait]
pub trait AchievementRepository: Send + Sync {
    /// Load the achievement unlock state.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the slot cannot be read or decoded.
    async fn get_achievement_state(&self) -> Result<Option<AchievementState>, StorageError>;

    /// Persist the full achievement state.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the state cannot be stored.
    async fn save_achievement_state(&self, state: &AchievementState) -> Result<(), StorageError>;
}

#[async_trait]
impl<T> ProgressRepository for T
where
    T: DocumentRepository + ?Sized,
{
    async fn get_progress(&self) -> Result<Option<ProgressDocument>, StorageError> {
        match self.load_raw(StorageKey::Progress).await? {
            Some(raw) => decode(&raw).map(Some),
            None => Ok(None),
        }
    }

    async fn save_progress(&self, document: &ProgressDocument) -> Result<(), StorageError> {
        let body = encode(document)?;
        self.save_raw(StorageKey::Progress, &body).await
    }
}

#[async_trait]
impl<T> AchievementRepository for T
where
    T: DocumentRepository + ?Sized,
{
    async fn get_achievement_state(&self) -> Result<Option<AchievementState>, StorageError> {
        match self.load_raw(StorageKey::Achievements).await? {
            Some(raw) => decode(&raw).map(Some),
            None => Ok(None),
        }
    }

    async fn save_achievement_state(&self, state: &AchievementState) -> Result<(), StorageError> {
        let body = encode(state)?;
        self.save_raw(StorageKey::Achievements, &body).await
    }
}

//
// ─── IN-MEMORY ─────────────────────────────────────────────────────────────────
//

/// Simple in-memory repository implementation for testing and prototyping.
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    slots: Arc<Mutex<HashMap<StorageKey, String>>>,
}

impl InMemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self {
            slots: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Current raw text of a slot, for inspecting what was written.
    #[must_use]
    pub fn raw(&self, key: StorageKey) -> Option<String> {
        self.slots
            .lock()
            .ok()
            .and_then(|guard| guard.get(&key).cloned())
    }
}

#[async_trait]
impl DocumentRepository for InMemoryRepository {
    async fn load_raw(&self, key: StorageKey) -> Result<Option<String>, StorageError> {
        let guard = self
            .slots
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(guard.get(&key).cloned())
    }

    async fn save_raw(&self, key: StorageKey, body: &str) -> Result<(), StorageError> {
        let mut guard = self
            .slots
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard.insert(key, body.to_owned());
        Ok(())
    }
}

/// Aggregates the two document repositories behind trait objects for easy backend swapping.
///
/// The slots are independent: nothing writes both in one transaction.
#[derive(Clone)]
pub struct Storage {
    pub progress: Arc<dyn ProgressRepository>,
    pub achievements: Arc<dyn AchievementRepository>,
}

impl Storage {
    #[must_use]
    pub fn in_memory() -> Self {
        Self::from_documents(InMemoryRepository::new())
    }

    /// Wire both typed repositories to one key-value backend.
    #[must_use]
    pub fn from_documents<R>(repo: R) -> Self
    where
        R: DocumentRepository + Clone + 'static,
    {
        let progress: Arc<dyn ProgressRepository> = Arc::new(repo.clone());
        let achievements: Arc<dyn AchievementRepository> = Arc::new(repo);
        Self {
            progress,
            achievements,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use devmap_core::model::QuestionId;
    use devmap_core::time::{fixed_clock, fixed_now};

    #[tokio::test]
    async fn empty_slots_read_as_none() {
        let repo = InMemoryRepository::new();
        assert!(repo.get_progress().await.unwrap().is_none());
        assert!(repo.get_achievement_state().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn progress_roundtrips_through_raw_slot() {
        let repo = InMemoryRepository::new();
        let mut doc = ProgressDocument::default();
        doc.toggle_done(&QuestionId::new("q1"), &fixed_clock());
        repo.save_progress(&doc).await.unwrap();

        let raw = repo.raw(StorageKey::Progress).unwrap();
        assert!(raw.contains("\"totalCompleted\":1"));
        assert_eq!(repo.get_progress().await.unwrap(), Some(doc));
    }

    #[tokio::test]
    async fn slots_are_independent() {
        let repo = InMemoryRepository::new();
        let mut state = AchievementState::default();
        state.unlock("first_blood", fixed_now());
        repo.save_achievement_state(&state).await.unwrap();

        assert!(repo.raw(StorageKey::Progress).is_none());
        assert_eq!(repo.get_achievement_state().await.unwrap(), Some(state));
    }

    #[tokio::test]
    async fn malformed_json_is_a_serialization_error() {
        let repo = InMemoryRepository::new();
        repo.save_raw(StorageKey::Progress, "{oops").await.unwrap();
        let err = repo.get_progress().await.unwrap_err();
        assert!(matches!(err, StorageError::Serialization(_)));
    }

    #[tokio::test]
    async fn storage_in_memory_shares_one_backend() {
        let storage = Storage::in_memory();
        storage
            .progress
            .save_progress(&ProgressDocument::default())
            .await
            .unwrap();
        assert!(storage.progress.get_progress().await.unwrap().is_some());
        assert!(
            storage
                .achievements
                .get_achievement_state()
                .await
                .unwrap()
                .is_none()
        );
    }
}
