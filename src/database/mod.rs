pub mod manager;
pub mod memory;
pub mod store;

use std::sync::Arc;

pub use manager::{DataAccess, DatabaseError};
pub use memory::MemoryDocumentStore;
pub use store::{Document, DocumentStore, PgDocumentStore, DOCUMENT_ID_FIELD};

use crate::config::DatabaseConfig;

/// Build the document store named by the configured database URL
pub fn open_store(config: &DatabaseConfig) -> Result<Arc<dyn DocumentStore>, DatabaseError> {
    match config.url.as_deref() {
        Some(url) if url.starts_with("memory:") => {
            tracing::warn!("Using in-memory document store; data is lost on exit");
            Ok(Arc::new(MemoryDocumentStore::new()))
        }
        _ => {
            let access = DataAccess::from_config(config)?;
            Ok(Arc::new(PgDocumentStore::new(Arc::new(access))))
        }
    }
}
