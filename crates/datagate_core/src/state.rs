//! Shared state handed to every request handler.

use std::sync::Arc;

use crate::models::PoolStatus;
use crate::services::{Database, UploadStore};

/// Central gateway state.
///
/// Cheap to clone; all members are shared handles.
#[derive(Clone)]
pub struct GatewayState {
    db: Arc<dyn Database>,
    schema: Arc<str>,
    uploads: Arc<UploadStore>,
}

impl GatewayState {
    /// Create state over a database handle, the exposed schema and an upload store.
    pub fn new(db: Arc<dyn Database>, schema: impl Into<Arc<str>>, uploads: UploadStore) -> Self {
        let schema = schema.into();
        tracing::debug!(schema = %schema, uploads = %uploads.dir().display(), "Gateway state created");
        Self { db, schema, uploads: Arc::new(uploads) }
    }

    /// Database handle.
    pub fn db(&self) -> &dyn Database {
        self.db.as_ref()
    }

    /// Schema whose tables are exposed.
    pub fn schema(&self) -> &str {
        &self.schema
    }

    /// Upload directory.
    pub fn uploads(&self) -> &UploadStore {
        &self.uploads
    }

    /// Pool statistics, when the backend has a pool.
    pub fn pool_status(&self) -> Option<PoolStatus> {
        self.db.status()
    }

    /// Close the database handle. Called once on shutdown.
    pub fn shutdown(&self) {
        tracing::info!("Closing database connections");
        self.db.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::uploads::DEFAULT_MAX_UPLOAD_BYTES;
    use crate::testing::MemoryDatabase;

    #[test]
    fn test_state_accessors() {
        let dir = tempfile::tempdir().unwrap();
        let state = GatewayState::new(
            Arc::new(MemoryDatabase::new()),
            "dados",
            UploadStore::new(dir.path(), DEFAULT_MAX_UPLOAD_BYTES),
        );

        let clone = state.clone();
        assert_eq!(clone.schema(), "dados");
        assert_eq!(clone.uploads().dir(), dir.path());
        assert!(clone.pool_status().is_none());
        clone.shutdown();
    }
}
