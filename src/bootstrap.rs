use std::sync::Arc;
use tracing::{info, warn};

use crate::api::handler::AppState;
use crate::config::Config;
use crate::error::AppResult;
use crate::store::{memory::MemoryStore, postgres::PgStore, Store};

/// Composition root: every service is constructed here and injected
/// through `AppState`; nothing reaches for ambient globals.
pub async fn initialize_app_state(config: &Config) -> AppResult<AppState> {
    info!("initializing application components");

    let store: Arc<dyn Store> = match &config.database_url {
        Some(url) => Arc::new(PgStore::connect(url).await?),
        None => {
            warn!("DATABASE_URL not set - falling back to the in-memory store");
            Arc::new(MemoryStore::new())
        }
    };

    Ok(AppState::new(store))
}
