use std::sync::Arc;
use std::time::Instant;

use crate::db::Database;
use crate::services::lookup::LookupClient;

#[derive(Clone)]
pub struct AppState {
    started_at: Instant,
    db: Database,
    lookup: Arc<LookupClient>,
}

impl AppState {
    pub fn new(db: Database) -> Self {
        Self {
            started_at: Instant::now(),
            db,
            lookup: Arc::new(LookupClient::from_env()),
        }
    }

    pub fn db(&self) -> &Database {
        &self.db
    }

    pub fn lookup(&self) -> &LookupClient {
        &self.lookup
    }

    pub fn uptime_seconds(&self) -> u64 {
        self.started_at.elapsed().as_secs()
    }
}
