use std::net::SocketAddr;

use axum::{Json, Router, http::StatusCode, routing::get};
use ethlean_blockchain::SharedStore;
use ethlean_types::state::{Checkpoint, State};

pub mod metrics;

/// Serve the HTTP API (chain queries, metrics, health) on the given address.
pub async fn start_rpc_server(
    address: SocketAddr,
    store: SharedStore,
) -> Result<(), std::io::Error> {
    let metrics_router = metrics::start_prometheus_metrics_api();
    let api_router = build_api_router(store);

    let app = Router::new().merge(metrics_router).merge(api_router);

    let listener = tokio::net::TcpListener::bind(address).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Build the API router with the given store.
fn build_api_router(store: SharedStore) -> Router {
    Router::new()
        .route("/lean/v0/head", get(get_head))
        .route("/lean/v0/checkpoints/justified", get(get_latest_justified))
        .route("/lean/v0/checkpoints/finalized", get(get_latest_finalized))
        .route("/lean/v0/states/finalized", get(get_latest_finalized_state))
        .with_state(store)
}

async fn get_head(
    axum::extract::State(store): axum::extract::State<SharedStore>,
) -> Json<Checkpoint> {
    Json(store.lock().unwrap().head_checkpoint())
}

async fn get_latest_justified(
    axum::extract::State(store): axum::extract::State<SharedStore>,
) -> Json<Checkpoint> {
    Json(*store.lock().unwrap().latest_justified())
}

async fn get_latest_finalized(
    axum::extract::State(store): axum::extract::State<SharedStore>,
) -> Json<Checkpoint> {
    Json(*store.lock().unwrap().latest_finalized())
}

async fn get_latest_finalized_state(
    axum::extract::State(store): axum::extract::State<SharedStore>,
) -> Result<Json<State>, StatusCode> {
    let store = store.lock().unwrap();
    let finalized = *store.latest_finalized();
    store
        .state(&finalized.root)
        .cloned()
        .map(Json)
        .ok_or(StatusCode::NOT_FOUND)
}
