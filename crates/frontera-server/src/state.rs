use crate::analytics::Analytics;
use frontera_coach::CoachClient;
use frontera_core::config::Config;
use frontera_core::store::Store;
use std::sync::{Arc, Mutex};

/// Shared application state passed to all route handlers.
///
/// The store wraps a single SQLite connection, so access goes through a
/// mutex; handlers take it inside `spawn_blocking` and hold it only for the
/// duration of one operation.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<Mutex<Store>>,
    pub coach: CoachClient,
    pub analytics: Analytics,
}

impl AppState {
    pub fn new(config: &Config) -> anyhow::Result<Self> {
        let store = Store::open(&config.database_path)?;
        let coach = CoachClient::new(&config.coach)?;
        let analytics = Analytics::new(config.analytics.endpoint.clone());
        Ok(Self {
            store: Arc::new(Mutex::new(store)),
            coach,
            analytics,
        })
    }

    /// Assemble state from already-built parts. The integration tests use
    /// this to point at a scratch database and a mock coach endpoint.
    pub fn from_parts(store: Store, coach: CoachClient, analytics: Analytics) -> Self {
        Self {
            store: Arc::new(Mutex::new(store)),
            coach,
            analytics,
        }
    }
}
