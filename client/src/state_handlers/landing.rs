use tracing::info;

use super::Navigation;
use crate::{
    net::EventChannel,
    session::ClientSession,
    ui::{ClientUi, Route, UserAction},
};
use common::protocol::ClientMessage;

pub fn handle_action(
    session: &mut ClientSession,
    ui: &mut dyn ClientUi,
    channel: &mut EventChannel,
    action: UserAction,
) -> Option<Navigation> {
    match action {
        UserAction::SetProfile { nickname, avatar } => {
            set_profile(session, ui, channel, &nickname, avatar)
                .then(|| Navigation::to(Route::Lobby))
        }
        _ => {
            ui.show_error("Choose a nickname first: nick <name> [avatar]");
            None
        }
    }
}

/// Validates and stores the nickname, then announces it. Returns false if
/// the nickname was rejected.
pub(crate) fn set_profile(
    session: &mut ClientSession,
    ui: &mut dyn ClientUi,
    channel: &mut EventChannel,
    nickname: &str,
    avatar: Option<String>,
) -> bool {
    let nickname = match session.identity.set_nickname(nickname) {
        Ok(nickname) => nickname.to_string(),
        Err(e) => {
            ui.show_error(&format!("Invalid nickname: {}.", e));
            return false;
        }
    };

    if avatar.is_some() {
        session.identity.set_avatar(avatar);
    }
    let avatar = session.identity.ensure_avatar().map(str::to_string);

    info!(%nickname, "nickname set");
    channel.emit(ClientMessage::SetNickname { nickname, avatar });
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{MockTransport, MockUi, test_session};

    #[test]
    fn valid_profile_is_announced_and_opens_the_lobby() {
        let (mut session, _) = test_session(None, None);
        let transport = MockTransport::connected(1);
        let mut channel = EventChannel::new(Box::new(transport.clone()));
        let mut ui = MockUi::new();

        let navigation = handle_action(
            &mut session,
            &mut ui,
            &mut channel,
            UserAction::SetProfile {
                nickname: " ana ".to_string(),
                avatar: Some("avatars/owl.png".to_string()),
            },
        );

        assert_eq!(navigation, Some(Navigation::to(Route::Lobby)));
        assert_eq!(
            transport.sent_client_messages(),
            vec![ClientMessage::SetNickname {
                nickname: "ana".to_string(),
                avatar: Some("avatars/owl.png".to_string()),
            }]
        );
    }

    #[test]
    fn rejected_nickname_stays_on_landing() {
        let (mut session, _) = test_session(None, None);
        let transport = MockTransport::connected(1);
        let mut channel = EventChannel::new(Box::new(transport.clone()));
        let mut ui = MockUi::new();

        let navigation = handle_action(
            &mut session,
            &mut ui,
            &mut channel,
            UserAction::SetProfile {
                nickname: "x".repeat(30),
                avatar: None,
            },
        );

        assert_eq!(navigation, None);
        assert_eq!(ui.errors.len(), 1);
        assert!(transport.sent_client_messages().is_empty());
    }

    #[test]
    fn other_actions_ask_for_a_nickname() {
        let (mut session, _) = test_session(None, None);
        let mut channel = EventChannel::new(Box::new(MockTransport::connected(1)));
        let mut ui = MockUi::new();

        let navigation = handle_action(&mut session, &mut ui, &mut channel, UserAction::CreateRoom);

        assert_eq!(navigation, None);
        assert_eq!(ui.errors.len(), 1);
    }
}
