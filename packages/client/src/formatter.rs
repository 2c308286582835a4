//! Terminal rendering for server events.
//!
//! The server sends one JSON object per message with a `type` field; we
//! match on it loosely (via `serde_json::Value`) so an older client still
//! prints something useful when the server grows new fields.

use chrono::{FixedOffset, TimeZone};
use serde_json::Value;

/// Format one incoming server message for display. Unknown types fall back
/// to raw JSON so nothing is silently dropped.
pub fn format_server_message(text: &str) -> String {
    let Ok(value) = serde_json::from_str::<Value>(text) else {
        return format!("<- {text}\n");
    };
    let message_type = value.get("type").and_then(Value::as_str).unwrap_or("");

    match message_type {
        "lobby-history" => {
            let mut out = String::new();
            for entry in value
                .get("messages")
                .and_then(Value::as_array)
                .into_iter()
                .flatten()
            {
                out.push_str(&format_chat_line(entry, "lobby"));
            }
            out
        }
        "lobby-message" => format_chat_line(&value, "lobby"),
        "room-message" => format_chat_line(&value, "room"),
        "lobby-update" => {
            let rooms = value
                .get("rooms")
                .and_then(Value::as_array)
                .map(Vec::len)
                .unwrap_or(0);
            let users = value
                .get("users")
                .and_then(Value::as_array)
                .map(Vec::len)
                .unwrap_or(0);
            format!("* lobby: {rooms} open room(s), {users} online\n")
        }
        "rooms-list" => {
            let mut out = String::from("* open rooms:\n");
            for room in value
                .get("rooms")
                .and_then(Value::as_array)
                .into_iter()
                .flatten()
            {
                let id = room.get("room_id").and_then(Value::as_u64).unwrap_or(0);
                let name = room
                    .get("room_name")
                    .and_then(Value::as_str)
                    .unwrap_or("?");
                let game = room
                    .get("game_type")
                    .and_then(Value::as_str)
                    .unwrap_or("?");
                let players = room
                    .get("player_count")
                    .and_then(Value::as_u64)
                    .unwrap_or(0);
                out.push_str(&format!("    {id}  {name}  [{game}]  {players}/2 players\n"));
            }
            out
        }
        "room-created" => {
            let id = value.get("room_id").and_then(Value::as_u64).unwrap_or(0);
            let name = value
                .get("room_name")
                .and_then(Value::as_str)
                .unwrap_or("?");
            format!("* room {id} ('{name}') created, waiting for an opponent\n")
        }
        "player-role" => {
            let role = value.get("role").and_then(Value::as_str).unwrap_or("?");
            let name = value
                .get("room_name")
                .and_then(Value::as_str)
                .unwrap_or("?");
            format!("* joined '{name}' as {role}\n")
        }
        "joined-as-spectator" => "* joined as spectator\n".to_string(),
        "game-started" => {
            let first = value
                .get("first_turn")
                .and_then(Value::as_str)
                .unwrap_or("?");
            format!("* game started, {first} moves first\n")
        }
        "game-restarted" => {
            let first = value
                .get("first_turn")
                .and_then(Value::as_str)
                .unwrap_or("?");
            format!("* rematch! {first} moves first\n")
        }
        "rematch-pending" => "* rematch vote registered, waiting for opponent\n".to_string(),
        "game-state" => format_game_state(&value),
        "round-result" => {
            let winner = value
                .get("round_winner")
                .and_then(Value::as_str)
                .unwrap_or("?");
            format!("* round over: {winner}\n")
        }
        "rps-status" => "* choice registered, waiting for opponent\n".to_string(),
        "rps-result" => {
            let x = value.get("choice_x").and_then(Value::as_str).unwrap_or("?");
            let o = value.get("choice_o").and_then(Value::as_str).unwrap_or("?");
            let winner = value.get("winner").and_then(Value::as_str).unwrap_or("?");
            format!("* X played {x}, O played {o} -> {winner}\n")
        }
        "memory-result" => {
            let outcome = value.get("outcome").and_then(Value::as_str).unwrap_or("?");
            format!("* flip: {outcome}\n")
        }
        "game-finished" => {
            let winner = value.get("winner").and_then(Value::as_str).unwrap_or("?");
            format!("* game finished, winner: {winner} (returning to lobby)\n")
        }
        "player-disconnected" => {
            let who = value.get("username").and_then(Value::as_str).unwrap_or("?");
            let winner = value.get("winner").and_then(Value::as_str).unwrap_or("?");
            format!("* {who} left the game, {winner} wins by forfeit\n")
        }
        "invitation-received" => {
            let from = value.get("from").and_then(Value::as_str).unwrap_or("?");
            let game = value
                .get("game_type")
                .and_then(Value::as_str)
                .unwrap_or("?");
            format!("* {from} invites you to {game} (/accept {from} or /decline {from})\n")
        }
        "invitation-accepted" => {
            let id = value.get("room_id").and_then(Value::as_u64).unwrap_or(0);
            format!("* invitation accepted, room {id}\n")
        }
        "invitation-declined" => {
            let to = value.get("to").and_then(Value::as_str).unwrap_or("?");
            format!("* {to} declined your invitation\n")
        }
        "scoreboard-data" => {
            let mut out = String::from("* scoreboard:\n");
            for (index, row) in value
                .get("players")
                .and_then(Value::as_array)
                .into_iter()
                .flatten()
                .enumerate()
            {
                let name = row.get("username").and_then(Value::as_str).unwrap_or("?");
                let wins = row.get("wins").and_then(Value::as_u64).unwrap_or(0);
                let losses = row.get("losses").and_then(Value::as_u64).unwrap_or(0);
                let rate = row.get("win_rate").and_then(Value::as_f64).unwrap_or(0.0);
                out.push_str(&format!(
                    "    {}. {name}  {wins}W/{losses}L  ({rate}%)\n",
                    index + 1
                ));
            }
            out
        }
        "invitation-error" | "move-error" | "error" => {
            let error = value.get("error").and_then(Value::as_str).unwrap_or("?");
            format!("! {error}\n")
        }
        _ => format!("<- {text}\n"),
    }
}

fn format_chat_line(value: &Value, scope: &str) -> String {
    let username = value.get("username").and_then(Value::as_str).unwrap_or("?");
    let message = value.get("message").and_then(Value::as_str).unwrap_or("");
    let time = value
        .get("timestamp")
        .and_then(Value::as_i64)
        .map(format_time)
        .unwrap_or_default();
    format!("[{scope}] {time} {username}: {message}\n")
}

/// JST ミリ秒タイムスタンプを HH:MM:SS に整形する
fn format_time(timestamp_millis: i64) -> String {
    let jst = FixedOffset::east_opt(9 * 3600).unwrap();
    match jst.timestamp_millis_opt(timestamp_millis) {
        chrono::LocalResult::Single(dt) => dt.format("%H:%M:%S").to_string(),
        _ => String::new(),
    }
}

fn format_game_state(value: &Value) -> String {
    let game_type = value
        .get("game_type")
        .and_then(Value::as_str)
        .unwrap_or("?");
    let status = value.get("status").and_then(Value::as_str).unwrap_or("?");

    let mut out = format!("* [{game_type}] {status}");
    if let Some(turn) = value.get("current_turn").and_then(Value::as_str) {
        out.push_str(&format!(", turn: {turn}"));
    }
    if let Some(winner) = value.get("winner").and_then(Value::as_str) {
        out.push_str(&format!(", winner: {winner}"));
    }
    out.push('\n');

    // 三目並べは盤面も描く
    if let Some(board) = value.get("board").and_then(Value::as_array) {
        for row in board.chunks(3) {
            let cells: Vec<&str> = row
                .iter()
                .map(|cell| cell.as_str().unwrap_or("."))
                .collect();
            out.push_str(&format!("    {}\n", cells.join(" ")));
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_type_falls_back_to_raw() {
        // テスト項目: 未知の type は生の JSON がそのまま出る
        let raw = r#"{"type":"brand-new-thing","x":1}"#;
        let formatted = format_server_message(raw);
        assert!(formatted.contains("brand-new-thing"));
    }

    #[test]
    fn test_chat_line_contains_user_and_message() {
        // テスト項目: チャット行にユーザー名と本文が載る
        let raw = r#"{"type":"lobby-message","username":"alice","message":"hi","timestamp":1672498800000}"#;
        let formatted = format_server_message(raw);
        assert!(formatted.contains("alice"));
        assert!(formatted.contains("hi"));
        assert!(formatted.contains("[lobby]"));
    }

    #[test]
    fn test_board_rendered_in_rows() {
        // テスト項目: 三目並べの盤が 3 行で描かれる
        let raw = r#"{"type":"game-state","game_type":"tic-tac-toe","status":"in-progress","current_turn":"O","players":[],"board":["X",null,null,null,"O",null,null,null,null]}"#;
        let formatted = format_server_message(raw);
        assert_eq!(formatted.lines().count(), 4); // ヘッダ + 3 行
        assert!(formatted.contains("X . ."));
    }

    #[test]
    fn test_error_messages_are_flagged() {
        // テスト項目: エラーは '!' 付きで表示される
        let raw = r#"{"type":"move-error","error":"Not your turn"}"#;
        let formatted = format_server_message(raw);
        assert_eq!(formatted, "! Not your turn\n");
    }
}
