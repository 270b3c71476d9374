// Websocket handling for game clients: one task per connection, bridging the socket to the
// session registry and the game's update channel.

use crate::interface_adapters::protocol::{ServerMessage, encode_update, parse_direction};
use crate::interface_adapters::state::AppState;
use crate::interface_adapters::utils::rng::next_conn_id;
use crate::use_cases::{
    ConnId, DisconnectOutcome, GameUpdate, MoveDisposition, SessionError, SessionRegistry,
};

use axum::{
    Error,
    extract::{
        State,
        ws::{CloseFrame, Message, WebSocket, WebSocketUpgrade, close_code},
    },
    response::IntoResponse,
};
use futures::SinkExt;
use std::{
    sync::Arc,
    time::{Duration, Instant},
};
use tokio::sync::{Mutex, broadcast};
use tracing::{Instrument, debug, error, info, info_span, warn};

#[derive(Debug)]
enum NetError {
    // Categorizes connection lifecycle failures so the loop can log and close.
    #[allow(dead_code)]
    Ws(axum::Error),
    #[allow(dead_code)]
    Serialization(serde_json::Error),
    #[allow(dead_code)]
    Registry(SessionError),
}

impl From<axum::Error> for NetError {
    fn from(e: axum::Error) -> Self {
        NetError::Ws(e)
    }
}

impl From<SessionError> for NetError {
    fn from(e: SessionError) -> Self {
        NetError::Registry(e)
    }
}

enum LoopControl {
    Continue,
    Disconnect,
}

const LOG_THROTTLE: Duration = Duration::from_secs(2);

pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| {
        let conn_id = next_conn_id();
        let span = info_span!(
            "conn",
            conn_id,
            game_id = tracing::field::Empty,
            color = tracing::field::Empty
        );
        handle_socket(socket, conn_id, state.sessions).instrument(span)
    })
}

async fn handle_socket(mut socket: WebSocket, conn_id: ConnId, sessions: Arc<Mutex<SessionRegistry>>) {
    // Matching and subscribing happen under one lock so no update is missed.
    let connected = sessions.lock().await.connect(conn_id);
    let ticket = match connected {
        Ok(ticket) => ticket,
        Err(e) => {
            error!(error = ?NetError::from(e), "failed to assign connection");
            let _ = send_close(&mut socket, close_code::POLICY, "already assigned").await;
            return;
        }
    };

    let span = tracing::Span::current();
    span.record("game_id", tracing::field::display(ticket.game_id));
    span.record("color", ticket.color.as_str());
    info!(started = ticket.started, "client connected");

    let now = Instant::now() - LOG_THROTTLE;
    let mut ctx = ConnCtx {
        conn_id,
        sessions,
        updates: ticket.updates,
        msgs_in: 0,
        msgs_out: 0,
        bytes_in: 0,
        bytes_out: 0,
        ignored: 0,
        lagged: 0,
        last_ignored_log: now,
        last_lag_log: now,
        close_frame: None,
    };

    let assigned = ServerMessage::Assigned {
        game_id: ticket.game_id,
        color: ticket.color.into(),
    };
    let result = match send_message(&mut socket, &assigned).await {
        Ok(bytes) => {
            ctx.msgs_out += 1;
            ctx.bytes_out += bytes as u64;
            run_client_loop(&mut socket, &mut ctx).await
        }
        Err(e) => Err(e),
    };
    if let Err(e) = result {
        warn!(error = ?e, "client loop exited with error");
    }

    if let Some(frame) = ctx.close_frame.take() {
        let _ = socket.send(Message::Close(Some(frame))).await;
    }
    if let Err(err) = socket.close().await {
        debug!(error = ?err, "socket close error");
    }

    disconnect_cleanup(&ctx).await;
}

async fn send_message(socket: &mut WebSocket, msg: &ServerMessage) -> Result<usize, NetError> {
    let txt = serde_json::to_string(msg).map_err(NetError::Serialization)?;
    let bytes = txt.len();
    socket
        .send(Message::Text(txt.into()))
        .await
        .map_err(NetError::Ws)?;
    Ok(bytes)
}

async fn send_close(socket: &mut WebSocket, code: u16, reason: &'static str) -> Result<(), NetError> {
    socket
        .send(Message::Close(Some(CloseFrame {
            code,
            reason: reason.into(),
        })))
        .await?;
    socket.close().await?;
    Ok(())
}

struct ConnCtx {
    conn_id: ConnId,
    sessions: Arc<Mutex<SessionRegistry>>,
    updates: broadcast::Receiver<GameUpdate>,

    msgs_in: u64,
    msgs_out: u64,
    bytes_in: u64,
    bytes_out: u64,

    // Payloads that were not a direction token.
    ignored: u64,
    lagged: u64,

    last_ignored_log: Instant,
    last_lag_log: Instant,

    close_frame: Option<CloseFrame>,
}

fn should_log(last: &mut Instant) -> bool {
    if last.elapsed() >= LOG_THROTTLE {
        *last = Instant::now();
        true
    } else {
        false
    }
}

async fn run_client_loop(socket: &mut WebSocket, ctx: &mut ConnCtx) -> Result<(), NetError> {
    loop {
        let control = tokio::select! {
            incoming = socket.recv() => handle_incoming_ws(incoming, ctx).await,

            update = ctx.updates.recv() => match update {
                Ok(update) => forward_update(update, socket, ctx).await?,
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    // Every snapshot is a full state, so skipping ahead loses nothing.
                    ctx.lagged += n;
                    if should_log(&mut ctx.last_lag_log) {
                        warn!(missed = n, "game updates lagged; skipping ahead");
                    }
                    LoopControl::Continue
                }
                Err(broadcast::error::RecvError::Closed) => {
                    debug!("game update channel closed");
                    LoopControl::Disconnect
                }
            },
        };

        if let LoopControl::Disconnect = control {
            return Ok(());
        }
    }
}

async fn handle_incoming_ws(incoming: Option<Result<Message, Error>>, ctx: &mut ConnCtx) -> LoopControl {
    match incoming {
        Some(Ok(msg)) => match msg {
            Message::Text(text) => {
                ctx.msgs_in += 1;
                ctx.bytes_in += text.len() as u64;
                handle_payload(text.as_str(), ctx).await;
                LoopControl::Continue
            }
            Message::Binary(bytes) => {
                ctx.msgs_in += 1;
                ctx.bytes_in += bytes.len() as u64;
                match std::str::from_utf8(&bytes) {
                    Ok(text) => handle_payload(text, ctx).await,
                    Err(_) => note_ignored(ctx, bytes.len()),
                }
                LoopControl::Continue
            }
            Message::Ping(_) | Message::Pong(_) => LoopControl::Continue,
            Message::Close(_) => LoopControl::Disconnect,
        },
        Some(Err(e)) => {
            warn!(error = %e, "websocket recv error");
            LoopControl::Disconnect
        }
        None => {
            info!("websocket closed");
            LoopControl::Disconnect
        }
    }
}

async fn handle_payload(payload: &str, ctx: &mut ConnCtx) {
    let Some(direction) = parse_direction(payload) else {
        note_ignored(ctx, payload.len());
        return;
    };

    let disposition = ctx.sessions.lock().await.bind_move(ctx.conn_id, direction);
    match disposition {
        MoveDisposition::Queued => {}
        MoveDisposition::NotStarted => debug!(?direction, "move before game start dropped"),
        MoveDisposition::Unbound => debug!(?direction, "move after game end dropped"),
    }
}

fn note_ignored(ctx: &mut ConnCtx, bytes: usize) {
    ctx.ignored += 1;
    if should_log(&mut ctx.last_ignored_log) {
        warn!(bytes, ignored = ctx.ignored, "ignoring unrecognized client payload");
    }
}

async fn forward_update(
    update: GameUpdate,
    socket: &mut WebSocket,
    ctx: &mut ConnCtx,
) -> Result<LoopControl, NetError> {
    let finished = matches!(update, GameUpdate::Finished { .. });
    let txt = encode_update(update).map_err(NetError::Serialization)?;
    let bytes = txt.len();

    match socket.send(Message::Text(txt.into())).await.map_err(NetError::Ws) {
        Ok(()) => {
            ctx.msgs_out += 1;
            ctx.bytes_out += bytes as u64;
        }
        Err(NetError::Ws(err)) => {
            // The peer is gone; disconnect cleanup follows.
            warn!(error = ?err, "failed to send game update");
            return Ok(LoopControl::Disconnect);
        }
        Err(e) => return Err(e),
    }

    if finished {
        ctx.close_frame = Some(CloseFrame {
            code: close_code::NORMAL,
            reason: "game over".into(),
        });
        return Ok(LoopControl::Disconnect);
    }
    Ok(LoopControl::Continue)
}

async fn disconnect_cleanup(ctx: &ConnCtx) {
    let outcome = ctx.sessions.lock().await.disconnect(ctx.conn_id);
    match outcome {
        DisconnectOutcome::Forfeited {
            game_id,
            winner,
            winner_conn,
        } => info!(%game_id, winner = winner.as_str(), winner_conn, "forfeited active game"),
        DisconnectOutcome::LeftPool { game_id } => info!(%game_id, "left before match"),
        // Game already finished; nothing left to tear down.
        DisconnectOutcome::Unbound => {}
    }

    debug!(
        msgs_in = ctx.msgs_in,
        msgs_out = ctx.msgs_out,
        bytes_in = ctx.bytes_in,
        bytes_out = ctx.bytes_out,
        ignored = ctx.ignored,
        lagged = ctx.lagged,
        "connection stats"
    );
    info!("client disconnected");
}
