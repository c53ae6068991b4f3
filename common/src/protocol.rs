use serde::{Deserialize, Serialize};
use strum::{Display, EnumString, IntoStaticStr};

use crate::room::RoomSnapshot;

/// Names of the inbound events a view can subscribe to. `Connect` and
/// `Disconnect` are produced by the channel itself, not by the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, IntoStaticStr)]
pub enum EventKind {
    #[strum(serialize = "connect")]
    Connect,
    #[strum(serialize = "disconnect")]
    Disconnect,
    #[strum(serialize = "token")]
    Token,
    #[strum(serialize = "navigate")]
    Navigate,
    #[strum(serialize = "room:data")]
    RoomData,
    #[strum(serialize = "roomCreated")]
    RoomCreated,
    #[strum(serialize = "lobby:rooms-updated")]
    LobbyRoomsUpdated,
    #[strum(serialize = "game-started")]
    GameStarted,
    #[strum(serialize = "round:precountdown")]
    RoundPreCountdown,
    #[strum(serialize = "round:start")]
    RoundStart,
    #[strum(serialize = "round-results")]
    RoundResults,
    #[strum(serialize = "next-round-started")]
    NextRoundStarted,
    #[strum(serialize = "roomClosed")]
    RoomClosed,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ScoreEntry {
    pub player_name: String,
    pub score_percent: f32,
    pub image: Vec<u8>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub enum ServerMessage {
    Token {
        token: Option<String>,
    },
    Navigate {
        page: String,
        room_code: Option<String>,
    },
    /// `None` means the room no longer exists.
    RoomData(Option<RoomSnapshot>),
    RoomCreated {
        room_code: Option<String>,
        room: Option<RoomSnapshot>,
    },
    LobbyRoomsUpdated {
        codes: Vec<String>,
    },
    GameStarted {
        room_code: String,
        room: Option<RoomSnapshot>,
    },
    RoundPreCountdown {
        count: u32,
        prompt: String,
    },
    RoundStart {
        duration: u32,
        prompt: String,
    },
    RoundResults {
        scores: Vec<ScoreEntry>,
    },
    NextRoundStarted {
        room_code: String,
        room: Option<RoomSnapshot>,
    },
    RoomClosed {
        room_code: String,
    },
}

impl ServerMessage {
    pub fn kind(&self) -> EventKind {
        match self {
            Self::Token { .. } => EventKind::Token,
            Self::Navigate { .. } => EventKind::Navigate,
            Self::RoomData(_) => EventKind::RoomData,
            Self::RoomCreated { .. } => EventKind::RoomCreated,
            Self::LobbyRoomsUpdated { .. } => EventKind::LobbyRoomsUpdated,
            Self::GameStarted { .. } => EventKind::GameStarted,
            Self::RoundPreCountdown { .. } => EventKind::RoundPreCountdown,
            Self::RoundStart { .. } => EventKind::RoundStart,
            Self::RoundResults { .. } => EventKind::RoundResults,
            Self::NextRoundStarted { .. } => EventKind::NextRoundStarted,
            Self::RoomClosed { .. } => EventKind::RoomClosed,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, IntoStaticStr)]
pub enum ClientMessage {
    #[strum(serialize = "set-nickname")]
    SetNickname {
        nickname: String,
        avatar: Option<String>,
    },
    #[strum(serialize = "lobby:join")]
    LobbyJoin,
    #[strum(serialize = "create-room")]
    CreateRoom { token: String },
    #[strum(serialize = "get-room-data")]
    GetRoomData { room_code: String },
    #[strum(serialize = "join-room")]
    JoinRoom {
        room_code: String,
        nickname: String,
        token: Option<String>,
        avatar: Option<String>,
    },
    #[strum(serialize = "start-game")]
    StartGame {
        room_code: String,
        token: Option<String>,
    },
    #[strum(serialize = "quit-room")]
    QuitRoom { room_code: String },
    #[strum(serialize = "next-round")]
    NextRound { room_code: String },
}

impl ClientMessage {
    pub fn name(&self) -> &'static str {
        self.into()
    }
}

pub fn version() -> u64 {
    env!("CARGO_PKG_VERSION")
        .split('.')
        .next()
        .and_then(|major| major.parse().ok())
        .unwrap_or(0)
}
