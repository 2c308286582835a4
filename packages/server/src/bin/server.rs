//! Game hub server: rooms, turn-based mini-games and a lobby over WebSocket.
//!
//! Run with:
//! ```not_rust
//! cargo run --bin asobiba-server
//! cargo run --bin asobiba-server -- --host 0.0.0.0 --port 3000
//! ```

use std::sync::Arc;

use asobiba_server::{
    domain::{GameHub, HubRepository, MessagePusher, StatsRepository},
    infrastructure::{
        message_pusher::WebSocketMessagePusher,
        repository::{InMemoryHubRepository, InMemoryScoreboard},
    },
    ui::{AppState, Server},
    usecase::{
        ChatUseCase, ConnectPlayerUseCase, CreateRoomUseCase, DisconnectPlayerUseCase,
        InvitationUseCase, JoinRoomUseCase, LeaveRoomUseCase, PlayTurnUseCase, RestartGameUseCase,
        ScoreboardUseCase,
    },
};
use asobiba_shared::logger::setup_logger;
use clap::Parser;
use tokio::sync::Mutex;

#[derive(Parser, Debug)]
#[command(name = "asobiba-server")]
#[command(about = "Mini-games hub server with rooms, spectating and a lobby", long_about = None)]
struct Args {
    /// Host address to bind the server to
    #[arg(short = 'H', long, default_value = "127.0.0.1")]
    host: String,

    /// Port number to bind the server to
    #[arg(short = 'p', long, default_value = "8080")]
    port: u16,
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    setup_logger(env!("CARGO_BIN_NAME"), "info");

    let args = Args::parse();

    // Initialize dependencies in order:
    // 1. Repositories
    // 2. MessagePusher
    // 3. UseCases
    // 4. AppState
    // 5. Server

    // 1. Create repositories (in-memory database)
    let hub = Arc::new(Mutex::new(GameHub::new()));
    let repository: Arc<dyn HubRepository> = Arc::new(InMemoryHubRepository::new(hub));
    let stats: Arc<dyn StatsRepository> = Arc::new(InMemoryScoreboard::new());

    // 2. Create MessagePusher (WebSocket implementation)
    let message_pusher: Arc<dyn MessagePusher> = Arc::new(WebSocketMessagePusher::new());

    // 3. Create UseCases
    let connect_player_usecase = Arc::new(ConnectPlayerUseCase::new(
        Arc::clone(&repository),
        Arc::clone(&message_pusher),
    ));
    let disconnect_player_usecase = Arc::new(DisconnectPlayerUseCase::new(
        Arc::clone(&repository),
        Arc::clone(&message_pusher),
        Arc::clone(&stats),
    ));
    let create_room_usecase = Arc::new(CreateRoomUseCase::new(Arc::clone(&repository)));
    let join_room_usecase = Arc::new(JoinRoomUseCase::new(Arc::clone(&repository)));
    let leave_room_usecase = Arc::new(LeaveRoomUseCase::new(
        Arc::clone(&repository),
        Arc::clone(&stats),
    ));
    let play_turn_usecase = Arc::new(PlayTurnUseCase::new(
        Arc::clone(&repository),
        Arc::clone(&message_pusher),
        Arc::clone(&stats),
    ));
    let restart_game_usecase = Arc::new(RestartGameUseCase::new(Arc::clone(&repository)));
    let invitation_usecase = Arc::new(InvitationUseCase::new(Arc::clone(&repository)));
    let chat_usecase = Arc::new(ChatUseCase::new(Arc::clone(&repository)));
    let scoreboard_usecase = Arc::new(ScoreboardUseCase::new(Arc::clone(&stats)));

    // 4. Compose AppState
    let app_state = AppState {
        connect_player_usecase,
        disconnect_player_usecase,
        create_room_usecase,
        join_room_usecase,
        leave_room_usecase,
        play_turn_usecase,
        restart_game_usecase,
        invitation_usecase,
        chat_usecase,
        scoreboard_usecase,
        repository,
        message_pusher,
    };

    // 5. Run the server
    let server = Server::new(app_state);
    if let Err(e) = server.run(args.host, args.port).await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}
