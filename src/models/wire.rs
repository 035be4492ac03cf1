use serde::Deserialize;
use serde_json::Value;

/// Player identity plus an opaque payload the coordinator never inspects,
/// passed through to the durable record as-is.
#[derive(Debug, Clone, Deserialize)]
pub struct PlayerPayload {
    pub name: String,
    #[serde(default)]
    pub data: Value,
}

/// One inbound client message: `{"command": ..., "data": {...}}`.
/// Anything that fails to parse into a known command is dropped at the
/// boundary before it can touch session state.
#[derive(Debug, Deserialize)]
#[serde(tag = "command", content = "data", rename_all = "camelCase")]
pub enum ClientCommand {
    CreateGame(PlayerPayload),
    AddPlayer {
        id: String,
        player: PlayerPayload,
    },
    RemovePlayer {
        id: String,
        player: String,
    },
    ScoreUpdate {
        id: String,
        player: String,
        score: Option<i64>,
    },
    #[serde(rename_all = "camelCase")]
    BroadcastLetter {
        id: String,
        letter: String,
        #[serde(default)]
        last_question: bool,
        #[serde(default)]
        index: u32,
    },
    StartGame {
        id: String,
    },
}

impl ClientCommand {
    pub fn parse(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_create_game() {
        let raw = r#"{"command": "createGame", "data": {"name": "alice", "data": {"score": 0}}}"#;
        match ClientCommand::parse(raw).unwrap() {
            ClientCommand::CreateGame(host) => {
                assert_eq!(host.name, "alice");
                assert_eq!(host.data["score"], 0);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_parse_add_player() {
        let raw = r#"{"command": "addPlayer", "data": {"id": "4217", "player": {"name": "bob"}}}"#;
        match ClientCommand::parse(raw).unwrap() {
            ClientCommand::AddPlayer { id, player } => {
                assert_eq!(id, "4217");
                assert_eq!(player.name, "bob");
                assert!(player.data.is_null());
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_parse_remove_player() {
        let raw = r#"{"command": "removePlayer", "data": {"id": "6618", "player": "player"}}"#;
        match ClientCommand::parse(raw).unwrap() {
            ClientCommand::RemovePlayer { id, player } => {
                assert_eq!(id, "6618");
                assert_eq!(player, "player");
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_parse_score_update_with_and_without_score() {
        let with = r#"{"command": "scoreUpdate", "data": {"id": "4217", "player": "bob", "score": 10}}"#;
        match ClientCommand::parse(with).unwrap() {
            ClientCommand::ScoreUpdate { score, .. } => assert_eq!(score, Some(10)),
            other => panic!("unexpected command: {other:?}"),
        }

        let without = r#"{"command": "scoreUpdate", "data": {"id": "4217", "player": "alice"}}"#;
        match ClientCommand::parse(without).unwrap() {
            ClientCommand::ScoreUpdate { score, .. } => assert_eq!(score, None),
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_parse_broadcast_letter() {
        let raw = r#"{"command": "broadcastLetter", "data": {"id": "4217", "letter": "K", "lastQuestion": true, "index": 7}}"#;
        match ClientCommand::parse(raw).unwrap() {
            ClientCommand::BroadcastLetter {
                letter,
                last_question,
                index,
                ..
            } => {
                assert_eq!(letter, "K");
                assert!(last_question);
                assert_eq!(index, 7);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_malformed_and_unknown_input_fail_parse() {
        assert!(ClientCommand::parse("not json at all").is_err());
        assert!(ClientCommand::parse(r#"{"command": "reboot", "data": {}}"#).is_err());
        assert!(ClientCommand::parse(r#"{"command": "addPlayer", "data": {}}"#).is_err());
    }
}
