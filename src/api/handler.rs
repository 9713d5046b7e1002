use axum::Json;
use serde_json::{json, Value};
use std::sync::Arc;

use crate::settlement::SettlementService;
use crate::store::Store;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub settlement: Arc<SettlementService>,
}

impl AppState {
    pub fn new(store: Arc<dyn Store>) -> Self {
        let settlement = Arc::new(SettlementService::new(store.clone()));
        Self { store, settlement }
    }
}

/// GET /health
pub async fn health_check() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}
