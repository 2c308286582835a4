//! WebSocket client session management.

use futures_util::{SinkExt, StreamExt};
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use tokio::sync::mpsc;
use tokio_tungstenite::{connect_async, tungstenite::protocol::Message};

use crate::{command::parse_line, error::ClientError, formatter::format_server_message,
    ui::redisplay_prompt};

/// Run the WebSocket client session until the connection closes.
pub async fn run_client_session(
    url: &str,
    username: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    // Pass the display name as a query parameter
    let url = format!("{url}?username={username}");

    let (ws_stream, response) = match connect_async(&url).await {
        Ok(result) => result,
        Err(e) => {
            let error_msg = e.to_string();
            // The server answers 400 when it rejects the username
            if error_msg.contains("400") || error_msg.contains("Bad Request") {
                return Err(Box::new(ClientError::UsernameRejected(
                    username.to_string(),
                )));
            }
            return Err(Box::new(ClientError::ConnectionError(error_msg)));
        }
    };

    if response.status().as_u16() == 400 {
        return Err(Box::new(ClientError::UsernameRejected(
            username.to_string(),
        )));
    }

    tracing::info!("Connected to the game hub");
    println!(
        "\nYou are '{username}'. Type /rooms, /create, /join <id> ... or plain text for lobby chat. Ctrl+C to exit.\n"
    );

    let (mut write, mut read) = ws_stream.split();

    // Spawn a task to render incoming messages
    let username_for_read = username.to_string();
    let mut read_task = tokio::spawn(async move {
        while let Some(message) = read.next().await {
            match message {
                Ok(Message::Text(text)) => {
                    print!("{}", format_server_message(&text));
                    redisplay_prompt(&username_for_read);
                }
                Ok(Message::Close(_)) => {
                    tracing::info!("Server closed the connection");
                    break;
                }
                Err(e) => {
                    tracing::warn!("WebSocket read error: {}", e);
                    break;
                }
                _ => {}
            }
        }
    });

    // Create channel for rustyline input
    let (input_tx, mut input_rx) = mpsc::unbounded_channel::<String>();

    // Spawn a blocking thread for rustyline (synchronous readline)
    let prompt_username = username.to_string();
    let _readline_handle = std::thread::spawn(move || {
        let mut rl = match DefaultEditor::new() {
            Ok(rl) => rl,
            Err(e) => {
                eprintln!("Failed to initialize readline: {e}");
                return;
            }
        };

        let prompt = format!("{prompt_username}> ");

        loop {
            match rl.readline(&prompt) {
                Ok(line) => {
                    let line = line.trim();
                    if !line.is_empty() {
                        rl.add_history_entry(line).ok();
                        if input_tx.send(line.to_string()).is_err() {
                            break;
                        }
                    }
                }
                Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => {
                    tracing::info!("Input closed");
                    break;
                }
                Err(e) => {
                    tracing::error!("Readline error: {}", e);
                    break;
                }
            }
        }
    });

    // Turn input lines into protocol commands and send them
    let mut write_task = tokio::spawn(async move {
        while let Some(line) = input_rx.recv().await {
            match parse_line(&line) {
                Ok(command) => {
                    let json = serde_json::to_string(&command).unwrap();
                    if write.send(Message::Text(json.into())).await.is_err() {
                        tracing::warn!("Failed to send, connection lost");
                        break;
                    }
                }
                Err(usage) => {
                    println!("! {usage}");
                }
            }
        }
    });

    // When either side finishes, stop the other
    tokio::select! {
        _ = &mut read_task => write_task.abort(),
        _ = &mut write_task => read_task.abort(),
    };

    Ok(())
}
