use tracing::{info, warn};

use super::Navigation;
use crate::{
    error::EventError,
    net::{EventChannel, Inbound},
    session::ClientSession,
    state::ClientState,
    ui::{ClientUi, Route},
};
use common::protocol::{ClientMessage, EventKind, ServerMessage};

/// Kinds handled for the whole life of the client, whatever view is up.
pub const APP_EVENTS: [EventKind; 4] = [
    EventKind::Connect,
    EventKind::Disconnect,
    EventKind::Token,
    EventKind::Navigate,
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transition {
    Navigate(Navigation),
    Disconnected { message: String },
}

pub fn handle_event(
    session: &mut ClientSession,
    ui: &mut dyn ClientUi,
    channel: &mut EventChannel,
    event: Inbound,
) -> Option<Transition> {
    match event {
        Inbound::Connected => connected(session, channel),
        Inbound::Disconnected { reason } => {
            warn!(%reason, "lost connection to server");
            ui.show_sanitized_notice(&format!("Connection lost ({}). Reconnecting...", reason));
            Some(Transition::Disconnected {
                message: format!("Disconnected: {}.", reason),
            })
        }
        Inbound::Server(ServerMessage::Token { token }) => {
            match token.filter(|token| !token.trim().is_empty()) {
                Some(token) => session.identity.set_token(token),
                None => warn!("{}", EventError::missing(EventKind::Token, "no token")),
            }
            None
        }
        Inbound::Server(ServerMessage::Navigate { page, room_code }) => {
            match Route::from_page(&page, room_code.as_deref()) {
                Some(route) => Some(Transition::Navigate(Navigation::to(route))),
                None => {
                    let error = EventError::missing(
                        EventKind::Navigate,
                        format!("unknown page {:?}", page),
                    );
                    warn!("{}", error);
                    None
                }
            }
        }
        Inbound::Server(other) => {
            warn!(event = %other.kind(), "not an app-level event");
            None
        }
    }
}

/// A fresh connection has a fresh id and no room membership, so the
/// client re-announces itself and starts over from the lobby.
fn connected(session: &mut ClientSession, channel: &mut EventChannel) -> Option<Transition> {
    info!(connection_id = ?channel.connection_id(), "connected to server");

    if !matches!(
        session.state(),
        ClientState::Connecting | ClientState::Disconnected { .. }
    ) {
        return None;
    }

    let Some(nickname) = session.identity.nickname().map(str::to_string) else {
        return Some(Transition::Navigate(Navigation::to(Route::Landing)));
    };

    let avatar = session.identity.ensure_avatar().map(str::to_string);
    channel.emit(ClientMessage::SetNickname { nickname, avatar });
    Some(Transition::Navigate(Navigation::to(Route::Lobby)))
}
