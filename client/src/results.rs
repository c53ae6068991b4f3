use crate::room::RoomState;
use common::{player::ConnectionId, protocol::ScoreEntry};

/// Scores received so far for one round, one entry per nickname.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Scoreboard {
    entries: Vec<ScoreEntry>,
}

impl Scoreboard {
    /// Entries keep the order in which their nickname first arrived; a
    /// later score for the same nickname replaces the earlier one.
    pub fn merge(&mut self, scores: Vec<ScoreEntry>) {
        for score in scores {
            match self
                .entries
                .iter_mut()
                .find(|entry| entry.player_name == score.player_name)
            {
                Some(entry) => *entry = score,
                None => self.entries.push(score),
            }
        }
    }

    pub fn get(&self, nickname: &str) -> Option<&ScoreEntry> {
        self.entries
            .iter()
            .find(|entry| entry.player_name == nickname)
    }

    pub fn entries(&self) -> &[ScoreEntry] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// One row per room player, in roster order.
    pub fn rows<'a>(&'a self, room: &'a RoomState) -> Vec<ResultRow<'a>> {
        room.players()
            .iter()
            .map(|player| ResultRow {
                nickname: &player.nickname,
                avatar: player.avatar.as_deref(),
                is_host: player.connection_id == room.host(),
                status: match self.get(&player.nickname) {
                    Some(entry) => ScoreStatus::Scored {
                        percent: rounded_percent(entry.score_percent),
                        image: &entry.image,
                    },
                    None => ScoreStatus::Pending,
                },
            })
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScoreStatus<'a> {
    Pending,
    Scored { percent: u32, image: &'a [u8] },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultRow<'a> {
    pub nickname: &'a str,
    pub avatar: Option<&'a str>,
    pub is_host: bool,
    pub status: ScoreStatus<'a>,
}

/// Only the host moves the room on to the next round.
pub fn can_advance(room: &RoomState, connection_id: Option<ConnectionId>) -> bool {
    room.is_host(connection_id)
}

fn rounded_percent(score: f32) -> u32 {
    if score.is_nan() {
        return 0;
    }
    score.round().clamp(0.0, 100.0) as u32
}
