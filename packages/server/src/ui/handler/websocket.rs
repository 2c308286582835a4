//! WebSocket connection handlers.
//!
//! 接続の受付とコマンドのディスパッチを担当します。ゲームロジックには
//! 触れず、入力の変換（JSON → ドメイン型）、UseCase の呼び出し、
//! 結果の直列化と配信だけを行います。すべての拒否は操作した本人への
//! イベントになり、ブロードキャストには変更後の状態だけが載ります。

use std::sync::Arc;

use axum::{
    extract::{
        Query, State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    http::StatusCode,
    response::IntoResponse,
};
use futures_util::{sink::SinkExt, stream::StreamExt};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use crate::domain::{
    ChoiceOutcome, ConnectionId, Departure, GameType, JoinOutcome, LobbyMessage, RoomId, RoomName,
    Username,
};
use crate::infrastructure::dto::websocket::{
    ClientCommand, ErrorMessage, GameRestartedMessage, GameStartedMessage, GameStateMessage,
    InvitationAcceptedMessage, InvitationDeclinedMessage, InvitationErrorMessage,
    InvitationReceivedMessage, JoinedAsSpectatorMessage, LobbyChatMessage, LobbyHistoryMessage,
    MemoryResultMessage, MessageType, MoveErrorMessage, PlayerDisconnectedMessage,
    PlayerRoleMessage, RematchPendingMessage, RoomChatMessage, RoomCreatedMessage,
    RoomsListMessage, RoundResultMessage, RpsResultMessage, RpsStatusMessage,
    ScoreboardDataMessage,
};
use crate::ui::state::AppState;
use crate::usecase::broadcast_lobby;
use crate::usecase::scoreboard::SCOREBOARD_LIMIT;

/// Query parameters for WebSocket connection
///
/// `username` は外部の認証基盤が検証済みの表示名。コアはそれを
/// 信用するが、空の名前だけは接続境界で弾く。
#[derive(Debug, Deserialize)]
pub struct ConnectQuery {
    pub username: String,
}

pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
    Query(query): Query<ConnectQuery>,
) -> Result<impl IntoResponse, StatusCode> {
    // Convert String -> Username (Domain Model)
    let username = match Username::new(query.username.clone()) {
        Ok(username) => username,
        Err(e) => {
            tracing::warn!("Rejected connection with invalid username: {}", e);
            return Err(StatusCode::BAD_REQUEST);
        }
    };

    let connection_id = ConnectionId::generate();

    // Create a channel for this client to receive messages
    let (tx, rx) = mpsc::unbounded_channel();

    let backlog = state
        .connect_player_usecase
        .execute(connection_id.clone(), username.clone(), tx)
        .await;

    tracing::info!(
        "User '{}' connected as '{}'",
        username,
        connection_id
    );

    Ok(ws.on_upgrade(move |socket| handle_socket(socket, state, connection_id, username, rx, backlog)))
}

/// Spawns a task that receives messages from the rx channel and pushes them
/// to the WebSocket sender.
fn pusher_loop(
    mut rx: mpsc::UnboundedReceiver<String>,
    mut sender: futures_util::stream::SplitSink<WebSocket, Message>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            if sender.send(Message::Text(msg.into())).await.is_err() {
                break;
            }
        }
    })
}

async fn handle_socket(
    socket: WebSocket,
    state: Arc<AppState>,
    connection_id: ConnectionId,
    username: Username,
    rx: mpsc::UnboundedReceiver<String>,
    backlog: Vec<LobbyMessage>,
) {
    let (mut sender, mut receiver) = socket.split();

    // Send the lobby chat backlog to the newly connected client
    {
        let history = LobbyHistoryMessage {
            r#type: MessageType::LobbyHistory,
            messages: backlog,
        };
        let history_json = serde_json::to_string(&history).unwrap();
        if let Err(e) = sender.send(Message::Text(history_json.into())).await {
            tracing::error!(
                "Failed to send lobby history to '{}': {}",
                connection_id,
                e
            );
        }
    }

    // Everyone sees the newcomer in the lobby
    broadcast_lobby(&state.repository, &state.message_pusher).await;

    let state_for_recv = Arc::clone(&state);
    let connection_for_recv = connection_id.clone();
    let username_for_recv = username.clone();

    // Spawn a task to receive commands from this client
    let mut recv_task = tokio::spawn(async move {
        while let Some(msg) = receiver.next().await {
            let msg = match msg {
                Ok(msg) => msg,
                Err(e) => {
                    tracing::error!("WebSocket error: {}", e);
                    break;
                }
            };

            match msg {
                Message::Text(text) => {
                    dispatch_command(
                        &state_for_recv,
                        &connection_for_recv,
                        &username_for_recv,
                        &text,
                    )
                    .await;
                }
                Message::Ping(_) => {
                    // Ping/pong is handled automatically by the WebSocket protocol
                }
                Message::Close(_) => {
                    tracing::info!("Connection '{}' requested close", connection_for_recv);
                    break;
                }
                _ => {}
            }
        }
    });

    // Spawn a task to push messages from other handlers to this client
    let mut send_task = pusher_loop(rx, sender);

    // If any one of the tasks completes, abort the other
    tokio::select! {
        _ = &mut recv_task => send_task.abort(),
        _ = &mut send_task => recv_task.abort(),
    };

    // Teardown: forced forfeit if the user was mid-game, then lobby refresh
    let departure = state.disconnect_player_usecase.execute(&connection_id).await;
    broadcast_departure(&state, departure, username.as_str(), "opponent_disconnected").await;
    broadcast_lobby(&state.repository, &state.message_pusher).await;
    tracing::info!("User '{}' ('{}') disconnected", username, connection_id);
}

/// 1 コマンドを処理する。拒否は操作した本人へのイベントで返す
async fn dispatch_command(
    state: &Arc<AppState>,
    connection_id: &ConnectionId,
    username: &Username,
    text: &str,
) {
    let command = match serde_json::from_str::<ClientCommand>(text) {
        Ok(command) => command,
        Err(e) => {
            tracing::warn!("Failed to parse command from '{}': {}", connection_id, e);
            push_json(
                state,
                connection_id,
                &ErrorMessage {
                    r#type: MessageType::Error,
                    error: "Unrecognized command".to_string(),
                },
            )
            .await;
            return;
        }
    };

    match command {
        ClientCommand::CreateRoom {
            room_name,
            game_type,
        } => handle_create_room(state, connection_id, room_name, game_type).await,
        ClientCommand::JoinRoom {
            room_id,
            as_spectator,
        } => handle_join_room(state, connection_id, RoomId::new(room_id), as_spectator).await,
        ClientCommand::MakeMove {
            room_id,
            cell_id,
            role,
        } => {
            match state
                .play_turn_usecase
                .make_move(connection_id, RoomId::new(room_id), cell_id, role)
                .await
            {
                Ok(applied) => {
                    broadcast_json(
                        state,
                        applied.targets.clone(),
                        &GameStateMessage {
                            r#type: MessageType::GameState,
                            room_id: applied.room_id,
                            state: applied.game_state.clone(),
                        },
                    )
                    .await;
                    // ラウンドだけ決着した場合はラウンド結果も流す
                    if applied.report.round_over && !applied.report.game_over {
                        if let Some(round_winner) = applied.report.round_winner {
                            broadcast_json(
                                state,
                                applied.targets.clone(),
                                &RoundResultMessage {
                                    r#type: MessageType::RoundResult,
                                    round_winner,
                                    scores: applied.report.scores,
                                },
                            )
                            .await;
                        }
                    }
                    if applied.finished.is_some() {
                        broadcast_lobby(&state.repository, &state.message_pusher).await;
                    }
                }
                Err(e) => push_move_error(state, connection_id, &e.to_string()).await,
            }
        }
        ClientCommand::SubmitChoice { room_id, choice } => {
            match state
                .play_turn_usecase
                .submit_choice(connection_id, RoomId::new(room_id), choice)
                .await
            {
                Ok(ChoiceOutcome::Waiting) => {
                    push_json(
                        state,
                        connection_id,
                        &RpsStatusMessage {
                            r#type: MessageType::RpsStatus,
                            waiting: true,
                        },
                    )
                    .await;
                }
                Ok(ChoiceOutcome::Resolved {
                    room_id,
                    report,
                    winner_username,
                    game_winner_username,
                    game_state,
                    targets,
                    finished,
                }) => {
                    broadcast_json(
                        state,
                        targets.clone(),
                        &RpsResultMessage::from_report(
                            &report,
                            winner_username,
                            game_winner_username,
                        ),
                    )
                    .await;
                    broadcast_json(
                        state,
                        targets,
                        &GameStateMessage {
                            r#type: MessageType::GameState,
                            room_id,
                            state: game_state,
                        },
                    )
                    .await;
                    if finished.is_some() {
                        broadcast_lobby(&state.repository, &state.message_pusher).await;
                    }
                }
                Err(e) => push_move_error(state, connection_id, &e.to_string()).await,
            }
        }
        ClientCommand::FlipCard { room_id, card_id } => {
            match state
                .play_turn_usecase
                .flip_card(connection_id, RoomId::new(room_id), card_id)
                .await
            {
                Ok(applied) => {
                    broadcast_json(
                        state,
                        applied.targets.clone(),
                        &GameStateMessage {
                            r#type: MessageType::GameState,
                            room_id: applied.room_id,
                            state: applied.game_state.clone(),
                        },
                    )
                    .await;
                    broadcast_json(
                        state,
                        applied.targets.clone(),
                        &MemoryResultMessage::from_report(applied.room_id, &applied.report),
                    )
                    .await;
                    if applied.finished.is_some() {
                        broadcast_lobby(&state.repository, &state.message_pusher).await;
                    }
                }
                Err(e) => push_move_error(state, connection_id, &e.to_string()).await,
            }
        }
        ClientCommand::RequestRestart { room_id } => {
            match state
                .restart_game_usecase
                .execute(connection_id, RoomId::new(room_id))
                .await
            {
                Ok(outcome) if outcome.restarted => {
                    if let Some(first_turn) = outcome.first_turn {
                        broadcast_json(
                            state,
                            outcome.targets.clone(),
                            &GameRestartedMessage {
                                r#type: MessageType::GameRestarted,
                                first_turn,
                                players: outcome.players.clone(),
                                game_type: outcome.game_type.to_string(),
                            },
                        )
                        .await;
                    }
                    broadcast_json(
                        state,
                        outcome.targets.clone(),
                        &GameStateMessage {
                            r#type: MessageType::GameState,
                            room_id: outcome.room_id,
                            state: outcome.game_state.clone(),
                        },
                    )
                    .await;
                    broadcast_lobby(&state.repository, &state.message_pusher).await;
                }
                Ok(_) => {
                    // 相手の投票待ち
                    push_json(
                        state,
                        connection_id,
                        &RematchPendingMessage {
                            r#type: MessageType::RematchPending,
                            waiting: true,
                        },
                    )
                    .await;
                }
                Err(e) => push_move_error(state, connection_id, &e.to_string()).await,
            }
        }
        ClientCommand::SendInvitation { to, game_type } => {
            let game_type = parse_game_type(game_type);
            match state
                .invitation_usecase
                .send(connection_id, &to, game_type)
                .await
            {
                Ok(sent) => {
                    push_json(
                        state,
                        &sent.recipient_connection,
                        &InvitationReceivedMessage {
                            r#type: MessageType::InvitationReceived,
                            from: sent.from.to_string(),
                            game_type: sent.game_type.to_string(),
                        },
                    )
                    .await;
                }
                Err(e) => push_invitation_error(state, connection_id, &e.to_string()).await,
            }
        }
        ClientCommand::AcceptInvitation { from } => {
            match state.invitation_usecase.accept(connection_id, &from).await {
                Ok(accepted) => {
                    // 送信者と承諾者それぞれに個別イベントを送ってから、
                    // ルーム全体へのゲーム開始を 1 回だけ流す
                    push_json(
                        state,
                        &accepted.sender_connection,
                        &RoomCreatedMessage {
                            r#type: MessageType::RoomCreated,
                            room_id: accepted.room_id,
                            room_name: accepted.room_name.clone(),
                            player: accepted.sender_player.clone(),
                            game_type: accepted.game_type.to_string(),
                        },
                    )
                    .await;
                    push_json(
                        state,
                        connection_id,
                        &InvitationAcceptedMessage {
                            r#type: MessageType::InvitationAccepted,
                            room_id: accepted.room_id,
                            room_name: accepted.room_name.clone(),
                            game_type: accepted.game_type.to_string(),
                        },
                    )
                    .await;
                    push_json(
                        state,
                        connection_id,
                        &PlayerRoleMessage {
                            r#type: MessageType::PlayerRole,
                            role: accepted.acceptor_player.role,
                            room_name: accepted.room_name.clone(),
                            players: accepted.players.clone(),
                            game_type: accepted.game_type.to_string(),
                        },
                    )
                    .await;
                    broadcast_json(
                        state,
                        accepted.targets.clone(),
                        &GameStartedMessage {
                            r#type: MessageType::GameStarted,
                            first_turn: accepted.first_turn,
                            players: accepted.players.clone(),
                            game_type: accepted.game_type.to_string(),
                        },
                    )
                    .await;
                    broadcast_json(
                        state,
                        accepted.targets.clone(),
                        &GameStateMessage {
                            r#type: MessageType::GameState,
                            room_id: accepted.room_id,
                            state: accepted.game_state.clone(),
                        },
                    )
                    .await;
                    broadcast_lobby(&state.repository, &state.message_pusher).await;
                }
                Err(e) => push_invitation_error(state, connection_id, &e.to_string()).await,
            }
        }
        ClientCommand::DeclineInvitation { from } => {
            match state.invitation_usecase.decline(connection_id, &from).await {
                Ok(declined) => {
                    if let Some(sender_connection) = declined.sender_connection {
                        push_json(
                            state,
                            &sender_connection,
                            &InvitationDeclinedMessage {
                                r#type: MessageType::InvitationDeclined,
                                to: declined.to.to_string(),
                            },
                        )
                        .await;
                    }
                }
                Err(e) => {
                    tracing::debug!("Ignoring decline from '{}': {}", connection_id, e);
                }
            }
        }
        ClientCommand::LeaveRoom { room_id } => {
            match state
                .leave_room_usecase
                .execute(connection_id, RoomId::new(room_id))
                .await
            {
                Ok(departure) => {
                    broadcast_departure(state, departure, username.as_str(), "opponent_left").await;
                    broadcast_lobby(&state.repository, &state.message_pusher).await;
                }
                Err(e) => {
                    tracing::debug!("Ignoring leave from '{}': {}", connection_id, e);
                }
            }
        }
        ClientCommand::LobbyChat { message } => {
            match state.chat_usecase.lobby_message(connection_id, &message).await {
                Ok((entry, targets)) => {
                    broadcast_json(state, targets, &LobbyChatMessage::from(&entry)).await;
                }
                Err(e) => push_error(state, connection_id, &e.to_string()).await,
            }
        }
        ClientCommand::RoomChat { room_id, message } => {
            match state
                .chat_usecase
                .room_message(connection_id, RoomId::new(room_id), &message)
                .await
            {
                Ok(chat) => {
                    broadcast_json(state, chat.targets.clone(), &RoomChatMessage::from(&chat))
                        .await;
                }
                Err(e) => push_error(state, connection_id, &e.to_string()).await,
            }
        }
        ClientCommand::GetRooms => {
            let rooms = state.repository.rooms_list().await;
            push_json(
                state,
                connection_id,
                &RoomsListMessage {
                    r#type: MessageType::RoomsList,
                    rooms,
                },
            )
            .await;
        }
        ClientCommand::GetScoreboard => {
            let players = state.scoreboard_usecase.top_players(SCOREBOARD_LIMIT).await;
            push_json(
                state,
                connection_id,
                &ScoreboardDataMessage {
                    r#type: MessageType::ScoreboardData,
                    players,
                },
            )
            .await;
        }
    }
}

async fn handle_create_room(
    state: &Arc<AppState>,
    connection_id: &ConnectionId,
    room_name: Option<String>,
    game_type: Option<String>,
) {
    let game_type = parse_game_type(game_type);
    let room_name = room_name.and_then(|name| RoomName::new(name).ok());
    match state
        .create_room_usecase
        .execute(connection_id, room_name, game_type)
        .await
    {
        Ok(created) => {
            // 1 人でも盤が見えるように、作成直後から状態を流す
            push_json(
                state,
                connection_id,
                &GameStateMessage {
                    r#type: MessageType::GameState,
                    room_id: created.room_id,
                    state: created.game_state.clone(),
                },
            )
            .await;
            push_json(
                state,
                connection_id,
                &RoomCreatedMessage {
                    r#type: MessageType::RoomCreated,
                    room_id: created.room_id,
                    room_name: created.room_name.clone(),
                    player: created.player.clone(),
                    game_type: created.game_type.to_string(),
                },
            )
            .await;
            broadcast_lobby(&state.repository, &state.message_pusher).await;
        }
        Err(e) => push_error(state, connection_id, &e.to_string()).await,
    }
}

async fn handle_join_room(
    state: &Arc<AppState>,
    connection_id: &ConnectionId,
    room_id: RoomId,
    as_spectator: bool,
) {
    match state
        .join_room_usecase
        .execute(connection_id, room_id, as_spectator)
        .await
    {
        Ok(JoinOutcome::Player {
            room_id,
            room_name,
            game_type,
            player,
            players,
            started,
            targets,
            game_state,
        }) => {
            push_json(
                state,
                connection_id,
                &PlayerRoleMessage {
                    r#type: MessageType::PlayerRole,
                    role: player.role,
                    room_name,
                    players: players.clone(),
                    game_type: game_type.to_string(),
                },
            )
            .await;
            if let Some(first_turn) = started {
                broadcast_json(
                    state,
                    targets.clone(),
                    &GameStartedMessage {
                        r#type: MessageType::GameStarted,
                        first_turn,
                        players,
                        game_type: game_type.to_string(),
                    },
                )
                .await;
            }
            broadcast_json(
                state,
                targets,
                &GameStateMessage {
                    r#type: MessageType::GameState,
                    room_id,
                    state: game_state,
                },
            )
            .await;
            broadcast_lobby(&state.repository, &state.message_pusher).await;
        }
        Ok(JoinOutcome::Spectator {
            room_info,
            game_type,
            targets,
            game_state,
        }) => {
            let room_id = room_info.room_id;
            push_json(
                state,
                connection_id,
                &JoinedAsSpectatorMessage {
                    r#type: MessageType::JoinedAsSpectator,
                    room: room_info,
                    game_type: game_type.to_string(),
                },
            )
            .await;
            broadcast_json(
                state,
                targets,
                &GameStateMessage {
                    r#type: MessageType::GameState,
                    room_id,
                    state: game_state,
                },
            )
            .await;
            broadcast_lobby(&state.repository, &state.message_pusher).await;
        }
        Err(e) => push_error(state, connection_id, &e.to_string()).await,
    }
}

/// 退室・切断の後始末のブロードキャスト
async fn broadcast_departure(
    state: &Arc<AppState>,
    departure: Departure,
    leaver_username: &str,
    reason: &str,
) {
    match departure {
        Departure::Forfeit {
            winner, evicted, ..
        } => {
            let notice = PlayerDisconnectedMessage {
                r#type: MessageType::PlayerDisconnected,
                username: leaver_username.to_string(),
                winner: winner.username.clone(),
                reason: reason.to_string(),
                force_leave: true,
            };
            for connection in &evicted {
                push_json(state, connection, &notice).await;
            }
        }
        Departure::Left {
            room_id,
            targets,
            game_state: Some(game_state),
            ..
        } => {
            broadcast_json(
                state,
                targets,
                &GameStateMessage {
                    r#type: MessageType::GameState,
                    room_id,
                    state: game_state,
                },
            )
            .await;
        }
        _ => {}
    }
}

/// ゲーム種別のパース（未指定・不正な値は三目並べに倒す）
fn parse_game_type(game_type: Option<String>) -> GameType {
    game_type
        .as_deref()
        .and_then(|value| GameType::parse(value).ok())
        .unwrap_or(GameType::TicTacToe)
}

async fn push_json<T: Serialize>(state: &Arc<AppState>, connection_id: &ConnectionId, message: &T) {
    let json = serde_json::to_string(message).unwrap();
    if let Err(e) = state.message_pusher.push_to(connection_id, &json).await {
        tracing::debug!("Failed to push to '{}': {}", connection_id, e);
    }
}

async fn broadcast_json<T: Serialize>(
    state: &Arc<AppState>,
    targets: Vec<ConnectionId>,
    message: &T,
) {
    let json = serde_json::to_string(message).unwrap();
    if let Err(e) = state.message_pusher.broadcast(targets, &json).await {
        tracing::warn!("Failed to broadcast: {}", e);
    }
}

async fn push_error(state: &Arc<AppState>, connection_id: &ConnectionId, error: &str) {
    push_json(
        state,
        connection_id,
        &ErrorMessage {
            r#type: MessageType::Error,
            error: error.to_string(),
        },
    )
    .await;
}

async fn push_move_error(state: &Arc<AppState>, connection_id: &ConnectionId, error: &str) {
    push_json(
        state,
        connection_id,
        &MoveErrorMessage {
            r#type: MessageType::MoveError,
            error: error.to_string(),
        },
    )
    .await;
}

async fn push_invitation_error(state: &Arc<AppState>, connection_id: &ConnectionId, error: &str) {
    push_json(
        state,
        connection_id,
        &InvitationErrorMessage {
            r#type: MessageType::InvitationError,
            error: error.to_string(),
        },
    )
    .await;
}
