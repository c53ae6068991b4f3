use tracing::{trace, warn};

use super::{Navigation, landing};
use crate::{
    error::EventError,
    net::EventChannel,
    session::ClientSession,
    state::LobbyView,
    ui::{ClientUi, Route, UserAction},
};
use common::protocol::{ClientMessage, EventKind, ServerMessage};

pub fn mount(channel: &mut EventChannel) -> LobbyView {
    let events = channel.on(&[EventKind::LobbyRoomsUpdated, EventKind::RoomCreated]);
    channel.emit(ClientMessage::LobbyJoin);
    LobbyView { _events: events }
}

pub fn handle_event(
    _view: &mut LobbyView,
    session: &mut ClientSession,
    _ui: &mut dyn ClientUi,
    _channel: &mut EventChannel,
    message: ServerMessage,
) -> Option<Navigation> {
    match message {
        ServerMessage::LobbyRoomsUpdated { codes } => {
            session.lobby_rooms.replace(codes);
            None
        }
        ServerMessage::RoomCreated { room_code, room } => {
            let code = room_code
                .filter(|code| !code.trim().is_empty())
                .or_else(|| room.as_ref().map(|room| room.code.clone()));

            let Some(code) = code else {
                warn!(
                    "{}",
                    EventError::missing(EventKind::RoomCreated, "no room code")
                );
                return None;
            };

            session.lobby_rooms.add(&code);
            Some(Navigation::to(Route::Room { code }).with_room(room))
        }
        other => {
            trace!(event = %other.kind(), "lobby ignores event");
            None
        }
    }
}

pub fn handle_action(
    _view: &mut LobbyView,
    session: &mut ClientSession,
    ui: &mut dyn ClientUi,
    channel: &mut EventChannel,
    action: UserAction,
) -> Option<Navigation> {
    match action {
        UserAction::CreateRoom => {
            match session.identity.token() {
                Some(token) => channel.emit(ClientMessage::CreateRoom {
                    token: token.to_string(),
                }),
                None => {
                    warn!("create-room requested without an auth token");
                    ui.show_error("Not signed in yet, so a room cannot be created.");
                }
            }
            None
        }
        UserAction::JoinRoom(code) => {
            let code = code.trim();
            if code.is_empty() {
                ui.show_error("Which room? Usage: join <code>");
                return None;
            }
            Some(Navigation::to(Route::Room {
                code: code.to_string(),
            }))
        }
        UserAction::SetProfile { nickname, avatar } => {
            landing::set_profile(session, ui, channel, &nickname, avatar);
            None
        }
        _ => {
            ui.show_error("Create or join a room first.");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{MockTransport, MockUi, room_snapshot, test_session};

    fn lobby(token: Option<&str>) -> (ClientSession, LobbyView, EventChannel, MockTransport) {
        let (session, _) = test_session(Some("ana"), token);
        let transport = MockTransport::connected(1);
        let mut channel = EventChannel::new(Box::new(transport.clone()));
        let view = mount(&mut channel);
        (session, view, channel, transport)
    }

    #[test]
    fn mounting_joins_the_lobby_channel() {
        let (_session, _view, _channel, transport) = lobby(None);
        assert_eq!(transport.sent_client_messages(), vec![ClientMessage::LobbyJoin]);
    }

    #[test]
    fn room_list_updates_are_deduplicated() {
        let (mut session, mut view, mut channel, _) = lobby(None);
        let mut ui = MockUi::new();

        handle_event(
            &mut view,
            &mut session,
            &mut ui,
            &mut channel,
            ServerMessage::LobbyRoomsUpdated {
                codes: vec!["AB12".into(), "AB12".into(), "CD34".into()],
            },
        );

        assert_eq!(session.lobby_rooms.codes(), ["AB12", "CD34"]);
    }

    #[test]
    fn create_room_needs_a_token() {
        let (mut session, mut view, mut channel, transport) = lobby(None);
        let mut ui = MockUi::new();

        handle_action(&mut view, &mut session, &mut ui, &mut channel, UserAction::CreateRoom);

        assert_eq!(transport.sent_client_messages(), vec![ClientMessage::LobbyJoin]);
        assert_eq!(ui.errors.len(), 1);
    }

    #[test]
    fn create_room_sends_the_token() {
        let (mut session, mut view, mut channel, transport) = lobby(Some("tok"));
        let mut ui = MockUi::new();

        handle_action(&mut view, &mut session, &mut ui, &mut channel, UserAction::CreateRoom);

        assert_eq!(
            transport.sent_client_messages().last(),
            Some(&ClientMessage::CreateRoom {
                token: "tok".to_string()
            })
        );
    }

    #[test]
    fn room_created_opens_the_room_with_its_snapshot() {
        let (mut session, mut view, mut channel, _) = lobby(Some("tok"));
        let mut ui = MockUi::new();
        let snapshot = room_snapshot("AB12", 1, &[(1, "ana")]);

        let navigation = handle_event(
            &mut view,
            &mut session,
            &mut ui,
            &mut channel,
            ServerMessage::RoomCreated {
                room_code: None,
                room: Some(snapshot.clone()),
            },
        );

        assert_eq!(
            navigation,
            Some(
                Navigation::to(Route::Room {
                    code: "AB12".to_string()
                })
                .with_room(Some(snapshot))
            )
        );
        assert_eq!(session.lobby_rooms.codes(), ["AB12"]);
    }

    #[test]
    fn room_created_without_any_code_is_ignored() {
        let (mut session, mut view, mut channel, _) = lobby(Some("tok"));
        let mut ui = MockUi::new();

        let navigation = handle_event(
            &mut view,
            &mut session,
            &mut ui,
            &mut channel,
            ServerMessage::RoomCreated {
                room_code: Some(" ".to_string()),
                room: None,
            },
        );

        assert_eq!(navigation, None);
        assert!(session.lobby_rooms.codes().is_empty());
    }

    #[test]
    fn join_opens_the_room() {
        let (mut session, mut view, mut channel, _) = lobby(None);
        let mut ui = MockUi::new();

        let navigation = handle_action(
            &mut view,
            &mut session,
            &mut ui,
            &mut channel,
            UserAction::JoinRoom(" AB12 ".to_string()),
        );

        assert_eq!(
            navigation,
            Some(Navigation::to(Route::Room {
                code: "AB12".to_string()
            }))
        );
    }
}
