use tracing::{info, trace, warn};

use super::{Navigation, room_closed, room_data_result};
use crate::{
    error::EventError,
    net::EventChannel,
    room::{RoomState, RoomStore},
    session::ClientSession,
    state::RoomView,
    ui::{ClientUi, Route, UserAction},
};
use common::{
    protocol::{ClientMessage, EventKind, ServerMessage},
    room::RoomSnapshot,
};

pub fn mount(
    code: String,
    room: Option<RoomSnapshot>,
    session: &mut ClientSession,
    channel: &mut EventChannel,
) -> RoomView {
    let events = channel.on(&[
        EventKind::RoomData,
        EventKind::RoomClosed,
        EventKind::GameStarted,
    ]);
    let store = RoomStore::with_snapshot(code, room);

    let nickname = session.identity.nickname().unwrap_or_default().to_string();
    let avatar = session.identity.ensure_avatar().map(str::to_string);
    channel.emit(ClientMessage::JoinRoom {
        room_code: store.code().to_string(),
        nickname,
        token: session.identity.token().map(str::to_string),
        avatar,
    });

    RoomView {
        store,
        _events: events,
    }
}

pub fn handle_event(
    view: &mut RoomView,
    _session: &mut ClientSession,
    _ui: &mut dyn ClientUi,
    _channel: &mut EventChannel,
    message: ServerMessage,
) -> Option<Navigation> {
    match message {
        ServerMessage::RoomData(data) => room_data_result(view.store.apply(data)),
        ServerMessage::RoomClosed { room_code } => room_closed(view.store.code(), &room_code),
        ServerMessage::GameStarted { room_code, room } => {
            if room_code != view.store.code() {
                let error = EventError::missing(
                    EventKind::GameStarted,
                    format!("game started in room {} while in {}", room_code, view.store.code()),
                );
                warn!("{}", error);
                return None;
            }

            info!(room = %room_code, "game started");
            let room = room.or_else(|| view.store.state().map(RoomState::to_snapshot));
            Some(Navigation::to(Route::Canvas { code: room_code }).with_room(room))
        }
        other => {
            trace!(event = %other.kind(), "room view ignores event");
            None
        }
    }
}

pub fn handle_action(
    view: &mut RoomView,
    session: &mut ClientSession,
    ui: &mut dyn ClientUi,
    channel: &mut EventChannel,
    action: UserAction,
) -> Option<Navigation> {
    match action {
        UserAction::StartGame => {
            if view.store.is_host(channel.connection_id()) {
                channel.emit(ClientMessage::StartGame {
                    room_code: view.store.code().to_string(),
                    token: session.identity.token().map(str::to_string),
                });
            } else {
                ui.show_error("Only the host can start the game.");
            }
            None
        }
        UserAction::QuitRoom => {
            channel.emit(ClientMessage::QuitRoom {
                room_code: view.store.code().to_string(),
            });
            Some(Navigation::to(Route::Lobby))
        }
        _ => {
            ui.show_error("Waiting for the game to start. `quit` leaves the room.");
            None
        }
    }
}
