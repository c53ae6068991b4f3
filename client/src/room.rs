use std::collections::HashSet;

use tracing::debug;

use crate::{error::EventError, net::EventChannel};
use common::{
    player::{ConnectionId, PlayerRef},
    protocol::{ClientMessage, EventKind},
    room::RoomSnapshot,
};

/// A validated room snapshot: the host is one of the players and no player
/// appears twice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoomState {
    code: String,
    host: ConnectionId,
    players: Vec<PlayerRef>,
}

impl RoomState {
    pub fn from_snapshot(snapshot: RoomSnapshot) -> Result<Self, EventError> {
        let RoomSnapshot {
            code,
            host,
            players,
        } = snapshot;

        let mut seen = HashSet::new();
        let players: Vec<PlayerRef> = players
            .into_iter()
            .filter(|player| seen.insert(player.connection_id))
            .collect();

        if !players.iter().any(|player| player.connection_id == host) {
            return Err(EventError::missing(
                EventKind::RoomData,
                format!("host {} of room {} is not among its players", host, code),
            ));
        }

        Ok(Self {
            code,
            host,
            players,
        })
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    pub fn host(&self) -> ConnectionId {
        self.host
    }

    pub fn players(&self) -> &[PlayerRef] {
        &self.players
    }

    pub fn player(&self, connection_id: ConnectionId) -> Option<&PlayerRef> {
        self.players
            .iter()
            .find(|player| player.connection_id == connection_id)
    }

    pub fn is_host(&self, connection_id: Option<ConnectionId>) -> bool {
        connection_id == Some(self.host)
    }

    pub fn to_snapshot(&self) -> RoomSnapshot {
        RoomSnapshot {
            code: self.code.clone(),
            host: self.host,
            players: self.players.clone(),
        }
    }
}

/// Local mirror of one room, owned by the view showing it.
#[derive(Debug)]
pub struct RoomStore {
    code: String,
    state: Option<RoomState>,
}

impl RoomStore {
    pub fn new(code: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            state: None,
        }
    }

    /// Seeds the store with a snapshot that arrived alongside a navigation.
    /// A snapshot that does not check out is dropped and fetched again.
    pub fn with_snapshot(code: impl Into<String>, snapshot: Option<RoomSnapshot>) -> Self {
        let mut store = Self::new(code);
        if let Some(snapshot) = snapshot {
            if let Err(e) = store.apply(Some(snapshot)) {
                debug!("ignoring seed snapshot: {}", e);
            }
        }
        store
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    pub fn state(&self) -> Option<&RoomState> {
        self.state.as_ref()
    }

    pub fn request_room_data(&self, channel: &mut EventChannel) {
        channel.emit(ClientMessage::GetRoomData {
            room_code: self.code.clone(),
        });
    }

    /// Applies a `room:data` reply. An empty reply means the room is gone:
    /// the old state is discarded and `StaleRoom` is returned.
    pub fn apply(&mut self, data: Option<RoomSnapshot>) -> Result<(), EventError> {
        let Some(snapshot) = data else {
            self.state = None;
            return Err(EventError::StaleRoom {
                code: self.code.clone(),
            });
        };

        if snapshot.code != self.code {
            return Err(EventError::missing(
                EventKind::RoomData,
                format!(
                    "snapshot for room {} while showing room {}",
                    snapshot.code, self.code
                ),
            ));
        }

        self.state = Some(RoomState::from_snapshot(snapshot)?);
        Ok(())
    }

    pub fn is_host(&self, connection_id: Option<ConnectionId>) -> bool {
        self.state
            .as_ref()
            .is_some_and(|state| state.is_host(connection_id))
    }
}

/// The room codes listed in the lobby, without duplicates.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LobbyRooms {
    codes: Vec<String>,
}

impl LobbyRooms {
    pub fn replace(&mut self, codes: Vec<String>) {
        self.codes = common::room::dedup_codes(codes);
    }

    pub fn add(&mut self, code: &str) {
        if !self.codes.iter().any(|existing| existing == code) {
            self.codes.push(code.to_string());
        }
    }

    pub fn codes(&self) -> &[String] {
        &self.codes
    }
}
