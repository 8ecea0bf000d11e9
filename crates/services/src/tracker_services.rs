use std::path::Path;
use std::sync::Arc;

use devmap_core::model::Catalog;
use storage::repository::Storage;
use tracing::info;

use crate::Clock;
use crate::context::ProgressContext;
use crate::error::TrackerInitError;

/// Opens storage and the question catalog, and hands out contexts wired to them.
#[derive(Clone)]
pub struct TrackerServices {
    clock: Clock,
    storage: Storage,
    catalog: Option<Arc<Catalog>>,
}

impl TrackerServices {
    /// Build services backed by `SQLite` storage.
    ///
    /// # Errors
    ///
    /// Returns `TrackerInitError` if the database cannot be opened or migrated.
    pub async fn new_sqlite(
        db_url: &str,
        clock: Clock,
        catalog: Option<Catalog>,
    ) -> Result<Self, TrackerInitError> {
        let storage = Storage::sqlite(db_url).await?;
        info!(db = db_url, "opened progress database");
        Ok(Self::with_storage(storage, clock, catalog))
    }

    /// Build services over volatile storage.
    #[must_use]
    pub fn in_memory(clock: Clock, catalog: Option<Catalog>) -> Self {
        Self::with_storage(Storage::in_memory(), clock, catalog)
    }

    #[must_use]
    pub fn with_storage(storage: Storage, clock: Clock, catalog: Option<Catalog>) -> Self {
        Self {
            clock,
            storage,
            catalog: catalog.map(Arc::new),
        }
    }

    #[must_use]
    pub fn clock(&self) -> Clock {
        self.clock
    }

    #[must_use]
    pub fn storage(&self) -> &Storage {
        &self.storage
    }

    #[must_use]
    pub fn catalog(&self) -> Option<Arc<Catalog>> {
        self.catalog.clone()
    }

    /// Load both documents and assemble a context.
    pub async fn context(&self) -> ProgressContext {
        ProgressContext::load(&self.storage, self.clock, self.catalog()).await
    }
}

/// Read and parse a catalog JSON file.
///
/// # Errors
///
/// Returns `TrackerInitError` if the file cannot be read or does not parse.
pub fn load_catalog_file(path: &Path) -> Result<Catalog, TrackerInitError> {
    let raw = std::fs::read_to_string(path).map_err(|source| TrackerInitError::CatalogRead {
        path: path.to_path_buf(),
        source,
    })?;
    let catalog = Catalog::from_json(&raw)?;
    info!(
        path = %path.display(),
        topics = catalog.topics().len(),
        questions = catalog.count_all_questions(),
        "loaded question catalog"
    );
    Ok(catalog)
}
