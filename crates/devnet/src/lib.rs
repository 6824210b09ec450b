//! Local development chain speaking the wallet and registry JSON-RPC methods.

use std::sync::Arc;

use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use shared::protocol::{RpcRequest, RpcResponse};
use tokio::sync::Mutex;
use tower_http::limit::RequestBodyLimitLayer;

pub mod api;
pub mod chain;
pub mod config;

use chain::DevChain;
use config::Settings;

const MAX_REQUEST_BYTES: usize = 64 * 1024;

pub struct AppState {
    chain: Mutex<DevChain>,
}

impl AppState {
    pub fn new(settings: &Settings) -> Arc<Self> {
        Arc::new(Self {
            chain: Mutex::new(DevChain::new(settings)),
        })
    }
}

pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/rpc", post(rpc))
        .layer(RequestBodyLimitLayer::new(MAX_REQUEST_BYTES))
        .with_state(state)
}

async fn healthz() -> &'static str {
    "ok"
}

async fn rpc(
    State(state): State<Arc<AppState>>,
    Json(request): Json<RpcRequest>,
) -> Json<RpcResponse> {
    Json(api::dispatch(&state.chain, request).await)
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
