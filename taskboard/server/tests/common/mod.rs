use std::sync::Arc;
use taskboard_server::store::DataStore;

/// Opens a fresh in-memory store with the task layout applied.
///
/// Each in-memory SQLite connection is its own database, so the pool is held
/// at a single connection.
pub async fn setup_store() -> anyhow::Result<Arc<DataStore>> {
    // Allow multiple calls to init for tests.
    let _ = tracing_subscriber::fmt().try_init();
    let store = Arc::new(DataStore::new("sqlite::memory:").with_max_connections(1));
    store.connect().await?;
    Ok(store)
}
