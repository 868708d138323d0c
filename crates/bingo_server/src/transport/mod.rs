//! WebSocket and HTTP surface over the session engine.
//!
//! One WebSocket per client. Inbound frames are parsed into
//! [`ClientMessage`]s and applied on the blocking pool; room events and
//! unicast [`Reply`]s share a single outbound queue per connection so only
//! one task ever writes to the socket.

mod protocol;

pub use protocol::{ClientMessage, Reply};

use crate::engine::{Outcome, SessionEngine};
use crate::events::ServerEvent;
use crate::rooms::{Broadcaster, Rooms};
use crate::session::{PlayerId, SessionId};
use crate::store::SessionStore;
use crate::EngineError;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use derive_getters::Getters;
use derive_new::new;
use futures::{SinkExt, StreamExt};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::broadcast::{self, error::RecvError};
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, instrument, warn};

/// Messages queued for one connection before further ones are dropped.
const OUTBOX_CAPACITY: usize = 256;

/// The engine as the server runs it.
pub type ServerEngine = SessionEngine<Box<dyn SessionStore>, Rooms>;

/// Shared handler state.
#[derive(Debug, Clone, new, Getters)]
pub struct AppState {
    engine: Arc<ServerEngine>,
}

/// The membership a connection acts as.
#[derive(Debug, Clone, PartialEq, Eq, new, Getters)]
pub struct Binding {
    session_id: SessionId,
    player_id: PlayerId,
}

/// What applying one client message produced.
#[derive(Debug, Default)]
pub struct Handled {
    /// Messages for this connection only.
    pub replies: Vec<Reply>,
    /// New membership to bind the connection to.
    pub bind: Option<Binding>,
}

impl Handled {
    fn reply(reply: Reply) -> Self {
        Self {
            replies: vec![reply],
            bind: None,
        }
    }
}

/// Builds the HTTP router.
#[instrument(skip_all)]
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/ws", get(ws_handler))
        .route("/games/{code}", get(game_info))
        .route("/prompts/groups", get(prompt_groups))
        .route("/health", get(health))
        .with_state(state)
}

/// Applies one message to the engine.
///
/// Synchronous so it can run on the blocking pool. Ignored actions produce
/// no reply; rejections and storage failures reply to the sender only.
#[instrument(skip(engine, message), fields(session_id = binding.map(|b| b.session_id.as_str())))]
pub fn handle_message<S: SessionStore, B: Broadcaster>(
    engine: &SessionEngine<S, B>,
    binding: Option<&Binding>,
    message: ClientMessage,
) -> Handled {
    let bound = |joined: Result<crate::Joined, EngineError>| match joined {
        Ok(joined) => {
            let binding = Binding::new(joined.session_id.clone(), joined.player_id.clone());
            let mut replies = vec![Reply::Welcome(joined)];
            match engine.attach(binding.session_id(), binding.player_id()) {
                Ok(snapshot) => replies.push(Reply::State(Box::new(snapshot))),
                Err(err) => replies.push(refusal(err)),
            }
            Handled {
                replies,
                bind: Some(binding),
            }
        }
        Err(err) => Handled::reply(refusal(err)),
    };

    match message {
        ClientMessage::Create(request) => bound(engine.create_session(request)),
        ClientMessage::Join { code, name, color } => {
            bound(engine.join(&code, &name, color.as_deref()))
        }
        ClientMessage::Attach {
            session_id,
            player_id,
        } => match engine.attach(&session_id, &player_id) {
            Ok(snapshot) => Handled {
                replies: vec![Reply::State(Box::new(snapshot))],
                bind: Some(Binding::new(session_id, player_id)),
            },
            Err(err) => Handled::reply(refusal(err)),
        },
        ClientMessage::Mark { row, col } => act(binding, |s, p| engine.mark(s, p, row, col)),
        ClientMessage::Reroll {
            target_player_id,
            region,
        } => act(binding, |s, p| {
            engine.reroll(s, p, target_player_id.as_deref(), &region)
        }),
        ClientMessage::NewRound => act(binding, |s, p| engine.new_round(s, p)),
        ClientMessage::StartTimer => act(binding, |s, p| engine.start_timer(s, p)),
        ClientMessage::PauseTimer => act(binding, |s, p| engine.pause_timer(s, p)),
        ClientMessage::ResumeTimer => act(binding, |s, p| engine.resume_timer(s, p)),
        ClientMessage::ResetTimer => act(binding, |s, p| engine.reset_timer(s, p)),
        ClientMessage::TimerSync => match binding {
            Some(binding) => Handled::reply(
                match engine.timer_sync(binding.session_id(), binding.player_id()) {
                    Ok(view) => Reply::TimerSync(view),
                    Err(err) => refusal(err),
                },
            ),
            None => unbound(),
        },
        ClientMessage::ThrowFlag {
            target_player_id,
            row,
            col,
        } => act(binding, |s, p| {
            engine.throw_flag(s, p, &target_player_id, row, col)
        }),
        ClientMessage::CastVote { vote } => act(binding, |s, p| engine.cast_vote(s, p, vote)),
        ClientMessage::Chat { content } => act(binding, |s, p| engine.send_chat(s, p, &content)),
    }
}

/// Runs an action as the bound member; only refusals are replied to.
#[instrument(skip(action))]
fn act<F>(binding: Option<&Binding>, action: F) -> Handled
where
    F: FnOnce(&str, &str) -> Result<Outcome, EngineError>,
{
    let Some(binding) = binding else {
        return unbound();
    };
    match action(binding.session_id(), binding.player_id()) {
        Ok(Outcome::Applied) => Handled::default(),
        Ok(Outcome::Ignored(reason)) => {
            debug!(%reason, "Action ignored");
            Handled::default()
        }
        Err(err) => Handled::reply(refusal(err)),
    }
}

#[instrument]
fn unbound() -> Handled {
    debug!("Action before joining a session");
    Handled::reply(Reply::rejected("Not in a session"))
}

#[instrument]
fn refusal(err: EngineError) -> Reply {
    match err {
        EngineError::Store(err) => {
            error!(error = %err, "Action aborted by storage failure");
            Reply::rejected("Action failed, please retry")
        }
        EngineError::Rejected(rejection) => Reply::rejected(rejection),
        other => Reply::rejected(other),
    }
}

#[instrument(skip_all)]
async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

#[instrument(skip_all)]
async fn handle_socket(socket: WebSocket, state: AppState) {
    let (mut sink, mut stream) = socket.split();
    let (outbox, mut queued) = mpsc::channel::<String>(OUTBOX_CAPACITY);
    let writer = tokio::spawn(async move {
        while let Some(text) = queued.recv().await {
            if sink.send(Message::Text(text.into())).await.is_err() {
                break;
            }
        }
    });
    info!("Connection opened");

    let mut binding: Option<Binding> = None;
    let mut forward: Option<JoinHandle<()>> = None;
    while let Some(frame) = stream.next().await {
        let text = match frame {
            Ok(Message::Text(text)) => text,
            Ok(Message::Close(_)) => break,
            Ok(_) => continue,
            Err(err) => {
                debug!(error = %err, "Socket read failed");
                break;
            }
        };
        let message = match serde_json::from_str::<ClientMessage>(text.as_str()) {
            Ok(message) => message,
            Err(err) => {
                debug!(error = %err, "Dropping malformed message");
                continue;
            }
        };

        let engine = Arc::clone(state.engine());
        let current = binding.clone();
        let handled =
            match tokio::task::spawn_blocking(move || handle_message(&*engine, current.as_ref(), message))
                .await
            {
                Ok(handled) => handled,
                Err(err) => {
                    warn!(error = %err, "Message handler panicked");
                    continue;
                }
            };

        if let Some(next) = handled.bind {
            if let Some(task) = forward.take() {
                task.abort();
            }
            let room = state.engine().broadcaster().join_room(next.session_id());
            forward = Some(forward_room(room, outbox.clone()));
            info!(session_id = %next.session_id(), player_id = %next.player_id(), "Connection bound");
            binding = Some(next);
        }
        for reply in &handled.replies {
            push(&outbox, reply);
        }
    }

    if let Some(task) = forward {
        task.abort();
    }
    drop(outbox);
    if writer.await.is_err() {
        debug!("Writer task ended abnormally");
    }
    info!("Connection closed");
}

#[instrument(skip_all)]
fn forward_room(
    mut room: broadcast::Receiver<ServerEvent>,
    outbox: mpsc::Sender<String>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            match room.recv().await {
                Ok(event) => {
                    if !push(&outbox, &event) {
                        break;
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    warn!(skipped, "Connection fell behind its room");
                }
                Err(RecvError::Closed) => break,
            }
        }
    })
}

/// Queues a message; returns false once the connection is gone.
///
/// A full outbox drops the message. The next `state` event carries the
/// whole session, so a slow client catches up once it drains.
#[instrument(skip_all)]
fn push<T: Serialize>(outbox: &mpsc::Sender<String>, message: &T) -> bool {
    let json = match serde_json::to_string(message) {
        Ok(json) => json,
        Err(err) => {
            warn!(error = %err, "Failed to encode outbound message");
            return true;
        }
    };
    match outbox.try_send(json) {
        Ok(()) => true,
        Err(TrySendError::Full(_)) => {
            warn!(capacity = OUTBOX_CAPACITY, "Outbox full, dropping message");
            true
        }
        Err(TrySendError::Closed(_)) => false,
    }
}

#[instrument(skip(state))]
async fn game_info(State(state): State<AppState>, Path(code): Path<String>) -> Response {
    let engine = Arc::clone(state.engine());
    match tokio::task::spawn_blocking(move || engine.game_info(&code)).await {
        Ok(Ok(info)) => Json(info).into_response(),
        Ok(Err(EngineError::UnknownSession)) => {
            (StatusCode::NOT_FOUND, Json(ErrorBody::new("Game not found"))).into_response()
        }
        Ok(Err(err)) => {
            warn!(error = %err, "Game lookup failed");
            (StatusCode::INTERNAL_SERVER_ERROR, Json(ErrorBody::new("Lookup failed"))).into_response()
        }
        Err(err) => {
            warn!(error = %err, "Game lookup panicked");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

#[instrument(skip_all)]
async fn prompt_groups(State(state): State<AppState>) -> Response {
    Json(state.engine().catalog().groups()).into_response()
}

#[instrument]
async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: &'static str,
}

impl ErrorBody {
    fn new(error: &'static str) -> Self {
        Self { error }
    }
}
