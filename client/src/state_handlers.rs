pub mod app;
pub mod landing;
pub mod lobby;
pub mod room;
pub mod round;

use tracing::warn;

use crate::{
    error::EventError,
    net::EventChannel,
    session::ClientSession,
    state::ClientState,
    ui::{ClientUi, Route, Screen},
};
use common::{player::ConnectionId, protocol::EventKind, room::RoomSnapshot};

/// A request to leave the current view for another one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Navigation {
    pub route: Route,
    /// Snapshot to seed the next view's room store with.
    pub room: Option<RoomSnapshot>,
    pub notice: Option<String>,
}

impl Navigation {
    pub fn to(route: Route) -> Self {
        Self {
            route,
            room: None,
            notice: None,
        }
    }

    pub fn with_room(mut self, room: Option<RoomSnapshot>) -> Self {
        self.room = room;
        self
    }

    pub fn with_notice(mut self, notice: impl Into<String>) -> Self {
        self.notice = Some(notice.into());
        self
    }
}

/// Builds the view a navigation points at. Views register their
/// subscriptions and send their on-mount events here.
pub fn mount(
    navigation: Navigation,
    session: &mut ClientSession,
    ui: &mut dyn ClientUi,
    channel: &mut EventChannel,
) -> ClientState {
    let Navigation {
        route,
        room,
        notice,
    } = navigation;

    if let Some(notice) = notice {
        ui.show_sanitized_notice(&notice);
    }

    let route = match route {
        Route::Room { .. } if session.identity.nickname().is_none() => {
            ui.show_error("Choose a nickname before joining a room.");
            Route::Landing
        }
        route => route,
    };

    ui.navigate(&route);

    match route {
        Route::Landing => ClientState::Landing,
        Route::Lobby => ClientState::Lobby(lobby::mount(channel)),
        Route::Room { code } => ClientState::Room(room::mount(code, room, session, channel)),
        Route::Canvas { code } => ClientState::Round(round::mount_canvas(code, room, channel)),
        Route::Results { code, prompt } => {
            ClientState::Round(round::mount_results(code, &prompt, channel))
        }
    }
}

/// Shared `roomClosed` handling for the room and round views.
pub(crate) fn room_closed(current_code: &str, closed_code: &str) -> Option<Navigation> {
    if closed_code != current_code {
        let error = EventError::missing(
            EventKind::RoomClosed,
            format!("room {} closed while showing room {}", closed_code, current_code),
        );
        warn!("{}", error);
        return None;
    }

    Some(Navigation::to(Route::Lobby).with_notice(format!(
        "Room {} was closed because the host left. Returning to lobby...",
        closed_code
    )))
}

/// Outcome of applying a `room:data` reply inside a view.
pub(crate) fn room_data_result(result: Result<(), EventError>) -> Option<Navigation> {
    match result {
        Ok(()) => None,
        Err(EventError::StaleRoom { code }) => Some(
            Navigation::to(Route::Lobby).with_notice(format!(
                "Room {} no longer exists. Returning to lobby...",
                code
            )),
        ),
        Err(e) => {
            warn!("{}", e);
            None
        }
    }
}

/// What the current state looks like this frame.
pub fn screen(session: &ClientSession, me: Option<ConnectionId>) -> Screen<'_> {
    match session.state() {
        ClientState::Connecting => Screen::Connecting,
        ClientState::Disconnected { message } => Screen::Disconnected { message },
        ClientState::Landing => Screen::Landing {
            nickname: session.identity.nickname(),
        },
        ClientState::Lobby(_) => Screen::Lobby {
            nickname: session.identity.nickname(),
            rooms: session.lobby_rooms.codes(),
        },
        ClientState::Room(view) => Screen::Room {
            code: view.store.code(),
            room: view.store.state(),
            me,
        },
        ClientState::Round(view) => Screen::Round(round::screen(view, me)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{MockTransport, MockUi, room_snapshot, test_session};
    use common::protocol::ClientMessage;

    #[test]
    fn room_route_without_nickname_falls_back_to_landing() {
        let (mut session, _) = test_session(None, None);
        let transport = MockTransport::connected(1);
        let mut channel = EventChannel::new(Box::new(transport.clone()));
        let mut ui = MockUi::new();

        let state = mount(
            Navigation::to(Route::Room {
                code: "AB12".to_string(),
            }),
            &mut session,
            &mut ui,
            &mut channel,
        );

        assert!(matches!(state, ClientState::Landing));
        assert_eq!(ui.routes, vec![Route::Landing]);
        assert!(transport.sent_client_messages().is_empty());
    }

    #[test]
    fn notices_are_shown_before_navigating() {
        let (mut session, _) = test_session(Some("ana"), None);
        let transport = MockTransport::connected(1);
        let mut channel = EventChannel::new(Box::new(transport.clone()));
        let mut ui = MockUi::new();

        let state = mount(
            Navigation::to(Route::Lobby).with_notice("Room AB12 no longer exists."),
            &mut session,
            &mut ui,
            &mut channel,
        );

        assert!(matches!(state, ClientState::Lobby(_)));
        assert_eq!(ui.notices, vec!["Room AB12 no longer exists."]);
        assert_eq!(transport.sent_client_messages(), vec![ClientMessage::LobbyJoin]);
    }

    #[test]
    fn canvas_mount_with_snapshot_skips_the_room_query() {
        let (mut session, _) = test_session(Some("ana"), None);
        let transport = MockTransport::connected(1);
        let mut channel = EventChannel::new(Box::new(transport.clone()));
        let mut ui = MockUi::new();

        let state = mount(
            Navigation::to(Route::Canvas {
                code: "AB12".to_string(),
            })
            .with_room(Some(room_snapshot("AB12", 1, &[(1, "ana")]))),
            &mut session,
            &mut ui,
            &mut channel,
        );

        assert!(matches!(state, ClientState::Round(_)));
        assert!(transport.sent_client_messages().is_empty());
    }

    #[test]
    fn closed_room_elsewhere_is_ignored() {
        assert_eq!(room_closed("AB12", "ZZ99"), None);
        assert!(room_closed("AB12", "AB12").is_some_and(|nav| nav.route == Route::Lobby));
    }
}
