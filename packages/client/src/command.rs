//! Slash-command parsing.
//!
//! Lines starting with `/` become protocol commands; anything else is sent
//! as lobby chat. Parse failures return a usage string that is shown
//! locally, nothing is sent.

use asobiba_server::infrastructure::dto::websocket::ClientCommand;

/// Parse one input line into a protocol command.
pub fn parse_line(line: &str) -> Result<ClientCommand, String> {
    let line = line.trim();
    if !line.starts_with('/') {
        return Ok(ClientCommand::LobbyChat {
            message: line.to_string(),
        });
    }

    let mut parts = line.split_whitespace();
    let keyword = parts.next().unwrap_or_default();
    match keyword {
        "/create" => {
            let room_name = parts.next().map(|s| s.to_string());
            let game_type = parts.next().map(|s| s.to_string());
            Ok(ClientCommand::CreateRoom {
                room_name,
                game_type,
            })
        }
        "/join" => {
            let room_id = parse_room_id(parts.next())?;
            let as_spectator = matches!(parts.next(), Some("watch"));
            Ok(ClientCommand::JoinRoom {
                room_id,
                as_spectator,
            })
        }
        "/move" => {
            let room_id = parse_room_id(parts.next())?;
            let cell_id = parts
                .next()
                .and_then(|s| s.parse().ok())
                .ok_or("usage: /move <room> <cell 0-8> <X|O>")?;
            let role = match parts.next() {
                Some("X") | Some("x") => asobiba_server::domain::Role::X,
                Some("O") | Some("o") => asobiba_server::domain::Role::O,
                _ => return Err("usage: /move <room> <cell 0-8> <X|O>".to_string()),
            };
            Ok(ClientCommand::MakeMove {
                room_id,
                cell_id,
                role,
            })
        }
        "/choice" => {
            let room_id = parse_room_id(parts.next())?;
            let choice = match parts.next() {
                Some("rock") => asobiba_server::domain::RpsChoice::Rock,
                Some("paper") => asobiba_server::domain::RpsChoice::Paper,
                Some("scissors") => asobiba_server::domain::RpsChoice::Scissors,
                _ => return Err("usage: /choice <room> <rock|paper|scissors>".to_string()),
            };
            Ok(ClientCommand::SubmitChoice { room_id, choice })
        }
        "/flip" => {
            let room_id = parse_room_id(parts.next())?;
            let card_id = parts
                .next()
                .and_then(|s| s.parse().ok())
                .ok_or("usage: /flip <room> <card>")?;
            Ok(ClientCommand::FlipCard { room_id, card_id })
        }
        "/rematch" => Ok(ClientCommand::RequestRestart {
            room_id: parse_room_id(parts.next())?,
        }),
        "/invite" => {
            let to = parts
                .next()
                .ok_or("usage: /invite <user> [game]")?
                .to_string();
            let game_type = parts.next().map(|s| s.to_string());
            Ok(ClientCommand::SendInvitation { to, game_type })
        }
        "/accept" => Ok(ClientCommand::AcceptInvitation {
            from: parts.next().ok_or("usage: /accept <user>")?.to_string(),
        }),
        "/decline" => Ok(ClientCommand::DeclineInvitation {
            from: parts.next().ok_or("usage: /decline <user>")?.to_string(),
        }),
        "/leave" => Ok(ClientCommand::LeaveRoom {
            room_id: parse_room_id(parts.next())?,
        }),
        "/room" => {
            let room_id = parse_room_id(parts.next())?;
            let message = parts.collect::<Vec<_>>().join(" ");
            if message.is_empty() {
                return Err("usage: /room <room> <message>".to_string());
            }
            Ok(ClientCommand::RoomChat { room_id, message })
        }
        "/rooms" => Ok(ClientCommand::GetRooms),
        "/scoreboard" => Ok(ClientCommand::GetScoreboard),
        other => Err(format!("unknown command: {other}")),
    }
}

fn parse_room_id(part: Option<&str>) -> Result<u32, String> {
    part.and_then(|s| s.parse().ok())
        .ok_or_else(|| "a numeric room id is required".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use asobiba_server::domain::{Role, RpsChoice};

    #[test]
    fn test_plain_text_becomes_lobby_chat() {
        // テスト項目: スラッシュで始まらない行はロビーチャットになる
        let command = parse_line("hello everyone").unwrap();
        assert_eq!(
            command,
            ClientCommand::LobbyChat {
                message: "hello everyone".to_string()
            }
        );
    }

    #[test]
    fn test_join_with_watch_flag() {
        // テスト項目: /join の watch フラグで観戦参加になる
        let command = parse_line("/join 123456 watch").unwrap();
        assert_eq!(
            command,
            ClientCommand::JoinRoom {
                room_id: 123456,
                as_spectator: true
            }
        );
    }

    #[test]
    fn test_move_parses_cell_and_role() {
        // テスト項目: /move がマスと座席をパースする
        let command = parse_line("/move 1 4 X").unwrap();
        assert_eq!(
            command,
            ClientCommand::MakeMove {
                room_id: 1,
                cell_id: 4,
                role: Role::X
            }
        );
    }

    #[test]
    fn test_choice_validates_hand() {
        // テスト項目: /choice は手の名前を検証する
        assert_eq!(
            parse_line("/choice 1 rock").unwrap(),
            ClientCommand::SubmitChoice {
                room_id: 1,
                choice: RpsChoice::Rock
            }
        );
        assert!(parse_line("/choice 1 lizard").is_err());
    }

    #[test]
    fn test_room_chat_keeps_spaces() {
        // テスト項目: /room は残りの語をメッセージとして結合する
        let command = parse_line("/room 7 good luck both").unwrap();
        assert_eq!(
            command,
            ClientCommand::RoomChat {
                room_id: 7,
                message: "good luck both".to_string()
            }
        );
    }

    #[test]
    fn test_unknown_command_is_rejected() {
        // テスト項目: 未知のコマンドは使い方エラーになる
        assert!(parse_line("/frobnicate").is_err());
        assert!(parse_line("/join abc").is_err());
    }

    #[test]
    fn test_commands_serialize_with_kebab_case_tag() {
        // テスト項目: 直列化したコマンドの type タグが kebab-case になる
        let json = serde_json::to_string(&parse_line("/rooms").unwrap()).unwrap();
        assert!(json.contains(r#""type":"get-rooms""#));
    }
}
