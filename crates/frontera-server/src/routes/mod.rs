pub mod assessment;
pub mod assumptions;
pub mod bets;
pub mod conversations;
pub mod gamification;
pub mod insights;
pub mod reviews;

use crate::error::AppError;
use crate::state::AppState;
use frontera_core::store::Store;

/// Run a store operation on the blocking pool. SQLite calls are synchronous,
/// so every handler funnels store access through here rather than holding
/// the lock across an await point.
pub(crate) async fn with_store<T, F>(state: &AppState, op: F) -> Result<T, AppError>
where
    T: Send + 'static,
    F: FnOnce(&Store) -> anyhow::Result<T> + Send + 'static,
{
    let store = state.store.clone();
    tokio::task::spawn_blocking(move || {
        let store = store
            .lock()
            .map_err(|_| anyhow::anyhow!("store lock poisoned"))?;
        op(&store)
    })
    .await
    .map_err(|e| AppError(anyhow::anyhow!("task join error: {e}")))?
    .map_err(AppError)
}
