//! Server-hosted solo matches over WebSocket
//!
//! Each connection gets its own `Match` (one human plus bots) running in a
//! dedicated task. Client messages are translated into `MatchCommand`s and
//! every `ServerMsg` the match broadcasts is forwarded back to the socket.

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Query, State,
    },
    response::Response,
};
use futures::{SinkExt, StreamExt};
use serde::Deserialize;
use tokio::sync::broadcast;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::app::AppState;
use crate::game::{
    Match, MatchCommand, MatchConfig, MatchHandle, MatchRunner, PlayerCommand, PlayerId,
    SessionLink,
};
use crate::http::AppError;
use crate::util::names::guest_name;
use crate::util::rate_limit::{ConnectionRateLimiter, COMMAND_RATE_LIMIT};
use crate::util::time::unix_millis;
use crate::ws::protocol::{ClientMsg, ServerMsg};

/// Query parameters for a solo match connection
#[derive(Debug, Default, Deserialize)]
pub struct SoloQuery {
    /// Display name; a guest name is generated when absent
    pub name: Option<String>,
    /// Session the result is reported into
    pub session_id: Option<Uuid>,
    /// Session player the human is linked to
    pub player_id: Option<Uuid>,
}

/// WebSocket upgrade handler for hosted solo matches
pub async fn solo_handler(
    ws: WebSocketUpgrade,
    Query(query): Query<SoloQuery>,
    State(state): State<AppState>,
) -> Result<Response, AppError> {
    let (game, human) = build_solo_match(&query, state.config.solo_bot_count)?;
    let session = query.session_id.map(|session_id| SessionLink {
        session_id,
        relay: Some(state.relay.clone()),
    });

    Ok(ws.on_upgrade(move |socket| handle_socket(socket, game, human, session, state)))
}

/// Create a seeded solo match and return it with the human's id
fn build_solo_match(query: &SoloQuery, bot_count: usize) -> Result<(Match, PlayerId), AppError> {
    let name = query
        .name
        .as_deref()
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| guest_name(&mut rand::thread_rng()));

    let config = MatchConfig {
        bot_count,
        ..MatchConfig::default()
    };
    let mut game = Match::new(Uuid::new_v4(), rand::random(), config);
    let human = game
        .setup_solo(name)
        .map_err(|e| AppError::Internal(e.to_string()))?;
    if let Some(account_id) = query.player_id {
        game.set_account(human, account_id);
    }

    Ok((game, human))
}

async fn handle_socket(
    socket: WebSocket,
    game: Match,
    human: PlayerId,
    session: Option<SessionLink>,
    state: AppState,
) {
    let welcome = ServerMsg::Welcome {
        match_id: game.id(),
        player_id: human,
        player_name: game
            .players()
            .get(human)
            .map(|p| p.name.clone())
            .unwrap_or_default(),
        seed: game.seed(),
        server_time: unix_millis(),
        bounds: *game.bounds(),
        obstacles: game.obstacles().to_vec(),
    };

    let (runner, handle) = MatchRunner::new(game, state.gateway.clone(), session);
    let match_id = handle.id;
    // Subscribe before the runner starts so the match has a watcher
    let events_rx = handle.subscribe();
    state.match_registry.insert(handle.clone());

    let registry = state.match_registry.clone();
    tokio::spawn(async move {
        runner.run().await;
        registry.remove(&match_id);
    });

    info!(match_id = %match_id, "Solo match connection opened");

    let (mut ws_sink, ws_stream) = socket.split();
    if let Err(e) = send_msg(&mut ws_sink, &welcome).await {
        error!(match_id = %match_id, error = %e, "Failed to send welcome");
        let _ = handle.send(MatchCommand::Quit).await;
        return;
    }

    run_session(&handle, human, ws_sink, ws_stream, events_rx).await;

    info!(match_id = %match_id, "Solo match connection closed");
}

/// Bridge the socket and the match task with read/write split
async fn run_session(
    handle: &MatchHandle,
    human: PlayerId,
    mut ws_sink: futures::stream::SplitSink<WebSocket, Message>,
    mut ws_stream: futures::stream::SplitStream<WebSocket>,
    mut events_rx: broadcast::Receiver<ServerMsg>,
) {
    let match_id = handle.id;
    let rate_limiter = ConnectionRateLimiter::new(COMMAND_RATE_LIMIT);

    // Writer task: match broadcast -> WebSocket
    let writer_handle = tokio::spawn(async move {
        loop {
            match events_rx.recv().await {
                Ok(msg) => {
                    if let Err(e) = send_msg(&mut ws_sink, &msg).await {
                        debug!(match_id = %match_id, error = %e, "WebSocket send failed");
                        break;
                    }
                }
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    warn!(match_id = %match_id, lagged_count = n, "Client lagged, skipping {} messages", n);
                }
                Err(broadcast::error::RecvError::Closed) => {
                    debug!(match_id = %match_id, "Match channel closed");
                    break;
                }
            }
        }
    });

    // Reader loop: WebSocket -> match task
    while let Some(result) = ws_stream.next().await {
        match result {
            Ok(Message::Text(text)) => {
                if !rate_limiter.check() {
                    warn!(match_id = %match_id, "Rate limited match command");
                    continue;
                }

                match serde_json::from_str::<ClientMsg>(&text) {
                    Ok(msg) => {
                        if !handle.send(to_command(msg, human)).await {
                            debug!(match_id = %match_id, "Match task finished");
                            break;
                        }
                    }
                    Err(e) => {
                        warn!(match_id = %match_id, error = %e, "Failed to parse client message");
                    }
                }
            }
            Ok(Message::Binary(_)) => {
                warn!(match_id = %match_id, "Received binary message, ignoring");
            }
            Ok(Message::Ping(_)) | Ok(Message::Pong(_)) => {}
            Ok(Message::Close(_)) => {
                info!(match_id = %match_id, "Client initiated close");
                break;
            }
            Err(e) => {
                error!(match_id = %match_id, error = %e, "WebSocket error");
                break;
            }
        }
    }

    // A departed player forfeits
    let _ = handle.send(MatchCommand::Quit).await;
    writer_handle.abort();
}

/// Translate a client message into a command for the match task
fn to_command(msg: ClientMsg, human: PlayerId) -> MatchCommand {
    match msg {
        ClientMsg::Move { dx, dy } => MatchCommand::Player(PlayerCommand::Move { dx, dy }),
        ClientMsg::AimAndFire { angle } => {
            MatchCommand::Player(PlayerCommand::AimAndFire { angle })
        }
        ClientMsg::EquipWeapon { weapon } => {
            MatchCommand::Player(PlayerCommand::EquipWeapon { weapon })
        }
        ClientMsg::Start => MatchCommand::Start(human),
        ClientMsg::Ping { t } => MatchCommand::Ping { t },
        ClientMsg::Quit => MatchCommand::Quit,
    }
}

/// Send a message over WebSocket
async fn send_msg(
    sink: &mut futures::stream::SplitSink<WebSocket, Message>,
    msg: &ServerMsg,
) -> Result<(), String> {
    let json = serde_json::to_string(msg).map_err(|e| e.to_string())?;
    sink.send(Message::Text(json))
        .await
        .map_err(|e| e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::combat::WeaponClass;
    use crate::game::MatchPhase;

    #[test]
    fn solo_match_uses_configured_bots_and_account() {
        let account = Uuid::new_v4();
        let query = SoloQuery {
            name: Some("  Ace ".into()),
            session_id: None,
            player_id: Some(account),
        };
        let (game, human) = build_solo_match(&query, 3).unwrap();

        assert_eq!(game.player_count(), 4);
        assert_eq!(game.phase(), MatchPhase::Waiting);
        assert_eq!(game.human(), Some(human));
        let player = game.players().get(human).unwrap();
        assert_eq!(player.name, "Ace");
        assert_eq!(player.account_id, Some(account));
    }

    #[test]
    fn blank_name_falls_back_to_guest_name() {
        let query = SoloQuery {
            name: Some("   ".into()),
            ..SoloQuery::default()
        };
        let (game, human) = build_solo_match(&query, 0).unwrap();
        assert!(!game.players().get(human).unwrap().name.trim().is_empty());
    }

    #[test]
    fn client_messages_map_to_commands() {
        let (game, human) = build_solo_match(&SoloQuery::default(), 1).unwrap();
        drop(game);

        assert!(matches!(to_command(ClientMsg::Start, human), MatchCommand::Start(id) if id == human));
        assert!(matches!(
            to_command(ClientMsg::EquipWeapon { weapon: WeaponClass::Shotgun }, human),
            MatchCommand::Player(PlayerCommand::EquipWeapon { weapon: WeaponClass::Shotgun })
        ));
        assert!(matches!(
            to_command(ClientMsg::Ping { t: 9 }, human),
            MatchCommand::Ping { t: 9 }
        ));
        assert!(matches!(to_command(ClientMsg::Quit, human), MatchCommand::Quit));
    }
}
