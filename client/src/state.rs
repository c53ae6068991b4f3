use crate::{events::Subscription, room::RoomStore, round::RoundLifecycle};

/// Which of the two round pages the round view is showing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoundPage {
    Canvas,
    Results,
}

#[derive(Debug)]
pub struct LobbyView {
    pub(crate) _events: Subscription,
}

#[derive(Debug)]
pub struct RoomView {
    pub store: RoomStore,
    pub(crate) _events: Subscription,
}

/// Canvas and results pages of one room. Dropping the view drops its
/// subscription and its countdown with it.
#[derive(Debug)]
pub struct RoundView {
    pub store: RoomStore,
    pub lifecycle: RoundLifecycle,
    pub page: RoundPage,
    pub upload_error: Option<String>,
    pub(crate) _events: Subscription,
}

#[derive(Debug, Default)]
pub enum ClientState {
    #[default]
    Connecting,
    Landing,
    Lobby(LobbyView),
    Room(RoomView),
    Round(RoundView),
    Disconnected {
        message: String,
    },
}

impl ClientState {
    pub fn is_disconnected(&self) -> bool {
        matches!(self, ClientState::Disconnected { .. })
    }

    /// Room the player is currently in, if any.
    pub fn room_code(&self) -> Option<&str> {
        match self {
            ClientState::Room(view) => Some(view.store.code()),
            ClientState::Round(view) => Some(view.store.code()),
            _ => None,
        }
    }
}
