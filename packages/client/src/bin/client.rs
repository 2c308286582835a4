//! CLI client for the asobiba game hub.
//!
//! Run with:
//! ```not_rust
//! cargo run --bin asobiba-client -- --username alice
//! cargo run --bin asobiba-client -- --url ws://example.com:8080/ws --username alice
//! ```

use asobiba_client::session::run_client_session;
use asobiba_shared::logger::setup_logger;
use clap::Parser;

#[derive(Parser, Debug)]
#[command(name = "asobiba-client")]
#[command(about = "Terminal client for the asobiba mini-games hub", long_about = None)]
struct Args {
    /// WebSocket URL of the server
    #[arg(short, long, default_value = "ws://127.0.0.1:8080/ws")]
    url: String,

    /// Display name to connect with
    #[arg(short = 'n', long)]
    username: String,
}

#[tokio::main]
async fn main() {
    setup_logger(env!("CARGO_BIN_NAME"), "warn");

    let args = Args::parse();

    if let Err(e) = run_client_session(&args.url, &args.username).await {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
