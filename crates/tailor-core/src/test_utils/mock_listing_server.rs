// src/test_utils/mock_listing_server.rs
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::{routing::get, Json, Router};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use tokio::net::TcpListener;

use crate::core_types::ListingPage;

#[derive(Deserialize, Serialize, Debug, Clone, Default)]
pub struct MockListingRequest {
    #[serde(rename = "profileArn")]
    pub profile_arn: Option<String>,
    #[serde(rename = "nextToken")]
    pub next_token: Option<String>,
    #[serde(rename = "maxResults")]
    pub max_results: Option<u32>,
}

/// A queued response: a page, or an HTTP status to fail with.
pub type MockListingResponse = Result<ListingPage, u16>;

#[derive(Clone)]
struct MockServerState {
    responses: Arc<Mutex<VecDeque<MockListingResponse>>>,
    requests: Arc<Mutex<Vec<MockListingRequest>>>,
}

async fn customizations_handler(
    State(state): State<MockServerState>,
    Query(request): Query<MockListingRequest>,
) -> Result<Json<ListingPage>, StatusCode> {
    log::debug!("Mock listing server received request: {:?}", request);
    state.requests.lock().unwrap().push(request);

    match state.responses.lock().unwrap().pop_front() {
        Some(Ok(page)) => Ok(Json(page)),
        Some(Err(code)) => {
            log::error!("Mock listing server simulating status {}", code);
            Err(StatusCode::from_u16(code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR))
        }
        None => {
            log::error!("Mock listing server ran out of responses!");
            Err(StatusCode::SERVICE_UNAVAILABLE)
        }
    }
}

pub struct MockListingServer {
    addr: SocketAddr,
    shutdown_tx: tokio::sync::oneshot::Sender<()>,
    pub recorded_requests: Arc<Mutex<Vec<MockListingRequest>>>,
}

impl MockListingServer {
    pub async fn start(responses: Vec<MockListingResponse>) -> Self {
        let state = MockServerState {
            responses: Arc::new(Mutex::new(VecDeque::from(responses))),
            requests: Arc::new(Mutex::new(Vec::new())),
        };
        let recorded_requests = state.requests.clone();

        let app = Router::new()
            .route("/customizations", get(customizations_handler))
            .with_state(state);

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap_or_else(|e| {
            panic!("Failed to bind mock server to 127.0.0.1:0. Error: {}", e);
        });
        let addr = listener.local_addr().unwrap();
        log::info!("Mock listing server listening on {}", addr);

        let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel::<()>();

        tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    shutdown_rx.await.ok();
                })
                .await
                .unwrap_or_else(|e| {
                    log::error!("Mock listing server error: {}", e);
                });
        });

        MockListingServer {
            addr,
            shutdown_tx,
            recorded_requests,
        }
    }

    pub fn address(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub async fn shutdown(self) {
        if self.shutdown_tx.send(()).is_err() {
            log::warn!("Mock listing server shutdown signal already sent or receiver dropped.");
        }
        tokio::time::sleep(std::time::Duration::from_millis(50)).await;
    }
}
