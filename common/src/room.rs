use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::player::{ConnectionId, PlayerRef};

/// A room as the server describes it. Players are listed in join order.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct RoomSnapshot {
    pub code: String,
    pub host: ConnectionId,
    pub players: Vec<PlayerRef>,
}

impl RoomSnapshot {
    pub fn player(&self, connection_id: ConnectionId) -> Option<&PlayerRef> {
        self.players
            .iter()
            .find(|player| player.connection_id == connection_id)
    }
}

/// Removes repeated room codes, keeping the first occurrence of each.
pub fn dedup_codes<I>(codes: I) -> Vec<String>
where
    I: IntoIterator<Item = String>,
{
    let mut seen = HashSet::new();
    codes
        .into_iter()
        .filter(|code| seen.insert(code.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dedup_keeps_first_occurrence_order() {
        let codes = vec![
            "AB12".to_string(),
            "CD34".to_string(),
            "AB12".to_string(),
            "EF56".to_string(),
            "CD34".to_string(),
        ];
        assert_eq!(dedup_codes(codes), vec!["AB12", "CD34", "EF56"]);
    }

    #[test]
    fn player_lookup_is_by_connection_id() {
        let snapshot = RoomSnapshot {
            code: "AB12".to_string(),
            host: 1,
            players: vec![
                PlayerRef {
                    connection_id: 1,
                    nickname: "alice".to_string(),
                    avatar: None,
                },
                PlayerRef {
                    connection_id: 2,
                    nickname: "bob".to_string(),
                    avatar: None,
                },
            ],
        };
        assert_eq!(snapshot.player(2).map(|p| p.nickname.as_str()), Some("bob"));
        assert!(snapshot.player(3).is_none());
    }
}
