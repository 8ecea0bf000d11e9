//! Shared error types for the services crate.

use std::path::PathBuf;

use thiserror::Error;

use devmap_core::model::CatalogError;
use storage::repository::StorageError;
use storage::sqlite::SqliteInitError;

/// Errors emitted while bootstrapping tracker services.
///
/// Everything past bootstrap logs storage failures instead of returning them.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum TrackerInitError {
    #[error(transparent)]
    Sqlite(#[from] SqliteInitError),
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error("failed to read catalog {}: {source}", path.display())]
    CatalogRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error(transparent)]
    Catalog(#[from] CatalogError),
}
