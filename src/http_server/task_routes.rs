//! Task HTTP Routes
//!
//! Mint tasks, voice queries and gift proposals, plus `/ws`: a websocket
//! where every text frame is a voice query answered with the JSON reply.
//! Handlers that write to the store run it on the blocking pool.

use std::sync::Arc;

use axum::{
    extract::{
        rejection::JsonRejection,
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::Response,
    routing::{get, post, put},
    Json, Router,
};
use futures_util::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};

use super::errors::{ApiError, ApiResult};
use super::server::AppState;
use crate::observability::{log_event, Event};
use crate::submitter::{GiftProposal, MintOutcome, MintTask, VoiceMode, VoiceResponse};

#[derive(Debug, Deserialize)]
pub struct QueryRequest {
    pub query: String,
}

#[derive(Debug, Deserialize)]
pub struct GiftRequest {
    pub recipient: String,
    pub amount: u64,
}

#[derive(Debug, Deserialize)]
pub struct VoiceModeRequest {
    pub mode: String,
}

#[derive(Debug, Serialize)]
pub struct VoiceModeResponse {
    pub mode: VoiceMode,
}

pub fn task_routes(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/mint", post(mint_handler))
        .route("/query", post(query_handler))
        .route("/gift", post(gift_handler))
        .route("/voice", put(voice_mode_handler))
        .route("/ws", get(voice_socket_handler))
        .with_state(state)
}

async fn mint_handler(
    State(state): State<Arc<AppState>>,
    body: Result<Json<MintTask>, JsonRejection>,
) -> ApiResult<Json<MintOutcome>> {
    let Json(task) = body?;
    let outcome = state.orchestrator.execute(&task).await?;
    Ok(Json(outcome))
}

async fn query_handler(
    State(state): State<Arc<AppState>>,
    body: Result<Json<QueryRequest>, JsonRejection>,
) -> ApiResult<Json<VoiceResponse>> {
    let Json(request) = body?;
    Ok(Json(answer_query(&state, request.query).await?))
}

async fn gift_handler(
    State(state): State<Arc<AppState>>,
    body: Result<Json<GiftRequest>, JsonRejection>,
) -> ApiResult<Json<GiftProposal>> {
    let Json(request) = body?;
    let proposal = tokio::task::spawn_blocking(move || {
        state
            .orchestrator
            .propose_gift(&request.recipient, request.amount)
    })
    .await??;
    Ok(Json(proposal))
}

async fn voice_mode_handler(
    State(state): State<Arc<AppState>>,
    body: Result<Json<VoiceModeRequest>, JsonRejection>,
) -> ApiResult<Json<VoiceModeResponse>> {
    let Json(request) = body?;
    let mode: VoiceMode = request.mode.parse().map_err(ApiError::InvalidBody)?;
    state.voice.switch_voice_mode(mode);
    Ok(Json(VoiceModeResponse { mode }))
}

async fn answer_query(state: &Arc<AppState>, query: String) -> ApiResult<VoiceResponse> {
    let state = Arc::clone(state);
    let response = tokio::task::spawn_blocking(move || state.voice.process_query(&query)).await??;
    Ok(response)
}

async fn voice_socket_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> Response {
    ws.on_upgrade(move |socket| handle_voice_socket(socket, state))
}

async fn handle_voice_socket(socket: WebSocket, state: Arc<AppState>) {
    log_event(Event::VoiceSocketOpened);
    let (mut sender, mut receiver) = socket.split();

    while let Some(msg) = receiver.next().await {
        let query = match msg {
            Ok(Message::Text(query)) => query,
            Ok(Message::Ping(data)) => {
                if sender.send(Message::Pong(data)).await.is_err() {
                    break;
                }
                continue;
            }
            Ok(Message::Close(_)) | Err(_) => break,
            Ok(_) => continue,
        };

        let reply = match answer_query(&state, query).await {
            Ok(response) => serde_json::to_string(&response),
            Err(e) => serde_json::to_string(&e.to_body()),
        };
        let Ok(reply) = reply else { break };

        if sender.send(Message::Text(reply)).await.is_err() {
            break;
        }
    }

    log_event(Event::VoiceSocketClosed);
}
