use std::{
    sync::atomic::{AtomicBool, Ordering},
    thread,
    time::{Duration, Instant},
};

use tracing::{debug, info, trace, warn};

use crate::{
    error::ChannelError,
    events::Subscription,
    net::{EventChannel, Inbound, Transport},
    session::ClientSession,
    state::ClientState,
    state_handlers::{
        self, Navigation,
        app::{self, APP_EVENTS, Transition},
        landing, lobby, room, round,
    },
    ui::{ClientUi, UserAction},
};
use common::protocol::{ClientMessage, ServerMessage};

/// Opens a fresh transport. Called once at startup and again for every
/// reconnect attempt.
pub type Connector = Box<dyn FnMut() -> Result<Box<dyn Transport>, ChannelError>>;

const FRAME: Duration = Duration::from_millis(16);
pub const RECONNECT_DELAY: Duration = Duration::from_secs(3);

/// Drives one client: network, input, timers and drawing, once per frame.
pub struct ClientRunner<U: ClientUi> {
    pub session: ClientSession,
    pub channel: EventChannel,
    pub ui: U,
    connector: Connector,
    reconnect_in: Duration,
    input_closed: bool,
    _app_events: Subscription,
}

impl<U: ClientUi> ClientRunner<U> {
    pub fn new(session: ClientSession, channel: EventChannel, connector: Connector, ui: U) -> Self {
        let app_events = channel.on(&APP_EVENTS);
        Self {
            session,
            channel,
            ui,
            connector,
            reconnect_in: RECONNECT_DELAY,
            input_closed: false,
            _app_events: app_events,
        }
    }

    /// Runs frames until `running` is cleared or the input closes.
    pub fn run(&mut self, running: &AtomicBool) {
        let mut last_updated = Instant::now();

        while running.load(Ordering::SeqCst) {
            let now = Instant::now();
            let dt = now - last_updated;
            last_updated = now;

            if !self.frame(dt) {
                break;
            }

            thread::sleep(FRAME);
        }

        self.shutdown();
    }

    /// One pass of the loop. Events are handled in arrival order, the
    /// screen is drawn once at the end. Returns false once the player has
    /// closed the input.
    pub fn frame(&mut self, dt: Duration) -> bool {
        self.channel.pump(dt);
        while let Some(event) = self.channel.next_event() {
            self.dispatch_event(event);
        }

        self.poll_actions();
        self.tick(dt);
        self.poll_uploads();
        self.reconnect(dt);
        self.channel.flush();

        let me = self.channel.connection_id();
        let screen = state_handlers::screen(&self.session, me);
        self.ui.draw(&screen);

        !self.input_closed
    }

    /// Leaves the current room, if any, and closes the connection.
    pub fn shutdown(&mut self) {
        if let Some(code) = self.session.state.room_code() {
            self.channel.emit(ClientMessage::QuitRoom {
                room_code: code.to_string(),
            });
        }
        self.channel.flush();
        self.channel.disconnect();
        info!("client shut down");
    }

    fn dispatch_event(&mut self, event: Inbound) {
        if APP_EVENTS.contains(&event.kind()) {
            if let Some(transition) =
                app::handle_event(&mut self.session, &mut self.ui, &mut self.channel, event)
            {
                self.apply(transition);
            }
            return;
        }

        let Inbound::Server(message) = event else {
            return;
        };
        if let Some(navigation) = self.view_event(message) {
            self.navigate(navigation);
        }
    }

    fn view_event(&mut self, message: ServerMessage) -> Option<Navigation> {
        let mut state = std::mem::take(&mut self.session.state);
        let session = &mut self.session;
        let ui = &mut self.ui;
        let channel = &mut self.channel;

        let navigation = match &mut state {
            ClientState::Lobby(view) => lobby::handle_event(view, session, ui, channel, message),
            ClientState::Room(view) => room::handle_event(view, session, ui, channel, message),
            ClientState::Round(view) => round::handle_event(view, session, ui, channel, message),
            _ => {
                trace!(event = %message.kind(), "no view for event");
                None
            }
        };

        self.session.state = state;
        navigation
    }

    fn poll_actions(&mut self) {
        loop {
            match self.ui.poll_action() {
                Ok(Some(action)) => {
                    if let Some(navigation) = self.handle_action(action) {
                        self.navigate(navigation);
                    }
                }
                Ok(None) => break,
                Err(e) => {
                    info!("input closed: {}", e);
                    self.input_closed = true;
                    break;
                }
            }
        }
    }

    fn handle_action(&mut self, action: UserAction) -> Option<Navigation> {
        debug!(?action, "user action");
        let mut state = std::mem::take(&mut self.session.state);
        let session = &mut self.session;
        let ui = &mut self.ui;
        let channel = &mut self.channel;

        let navigation = match &mut state {
            ClientState::Landing => landing::handle_action(session, ui, channel, action),
            ClientState::Lobby(view) => lobby::handle_action(view, session, ui, channel, action),
            ClientState::Room(view) => room::handle_action(view, session, ui, channel, action),
            ClientState::Round(view) => round::handle_action(view, session, ui, channel, action),
            ClientState::Connecting | ClientState::Disconnected { .. } => {
                ui.show_error("Not connected to the server yet.");
                None
            }
        };

        self.session.state = state;
        navigation
    }

    fn tick(&mut self, dt: Duration) {
        let mut state = std::mem::take(&mut self.session.state);
        if let ClientState::Round(view) = &mut state {
            round::tick(view, &mut self.session, &mut self.ui, &mut self.channel, dt);
        }
        self.session.state = state;
    }

    fn poll_uploads(&mut self) {
        while let Some(outcome) = self.session.pipeline.uploader.poll_completed() {
            match &mut self.session.state {
                ClientState::Round(view) => {
                    round::finish_upload(view, &mut self.ui, &mut self.channel, outcome)
                }
                _ => info!(round = outcome.round, "upload finished after leaving the round"),
            }
        }
    }

    /// While the connection is down, opens a new transport every
    /// [`RECONNECT_DELAY`]. The new transport brings a new connection id.
    fn reconnect(&mut self, dt: Duration) {
        if !self.channel.is_down() {
            self.reconnect_in = RECONNECT_DELAY;
            return;
        }

        self.reconnect_in = self.reconnect_in.saturating_sub(dt);
        if !self.reconnect_in.is_zero() {
            return;
        }
        self.reconnect_in = RECONNECT_DELAY;

        match (self.connector)() {
            Ok(transport) => {
                info!("reconnecting");
                self.channel.replace_transport(transport);
            }
            Err(e) => warn!("reconnect attempt failed: {}", e),
        }
    }

    fn apply(&mut self, transition: Transition) {
        match transition {
            Transition::Navigate(navigation) => self.navigate(navigation),
            Transition::Disconnected { message } => {
                self.session
                    .transition(ClientState::Disconnected { message });
            }
        }
    }

    /// Tears down the current view before mounting the next one.
    fn navigate(&mut self, navigation: Navigation) {
        debug!(route = %navigation.route, "navigate");
        drop(std::mem::take(&mut self.session.state));
        let state = state_handlers::mount(
            navigation,
            &mut self.session,
            &mut self.ui,
            &mut self.channel,
        );
        self.session.transition(state);
    }
}

#[cfg(test)]
mod tests {
    use std::{cell::Cell, rc::Rc};

    use super::*;
    use crate::{
        test_helpers::{MockTransport, MockUi, room_snapshot, test_session},
        ui::Route,
    };

    fn runner(
        nickname: Option<&str>,
        transport: &MockTransport,
        ui: MockUi,
    ) -> (ClientRunner<MockUi>, Rc<Cell<u32>>) {
        let (session, _) = test_session(nickname, Some("tok"));
        let attempts = Rc::new(Cell::new(0));
        let counter = attempts.clone();
        let connector: Connector = Box::new(move || {
            counter.set(counter.get() + 1);
            Ok(Box::new(MockTransport::connected(100 + u64::from(counter.get())))
                as Box<dyn Transport>)
        });
        let channel = EventChannel::new(Box::new(transport.clone()));
        (ClientRunner::new(session, channel, connector, ui), attempts)
    }

    #[test]
    fn connecting_with_a_nickname_opens_the_lobby() {
        let transport = MockTransport::connected(5);
        let (mut runner, _) = runner(Some("ana"), &transport, MockUi::new());

        runner.frame(FRAME);

        assert!(matches!(runner.session.state(), ClientState::Lobby(_)));
        let sent = transport.sent_client_messages();
        assert!(matches!(sent.first(), Some(ClientMessage::SetNickname { .. })));
        assert_eq!(sent.last(), Some(&ClientMessage::LobbyJoin));
    }

    #[test]
    fn connecting_without_a_nickname_opens_landing() {
        let transport = MockTransport::connected(5);
        let (mut runner, _) = runner(None, &transport, MockUi::new());

        runner.frame(FRAME);

        assert!(matches!(runner.session.state(), ClientState::Landing));
        assert_eq!(runner.ui.routes, vec![Route::Landing]);
    }

    #[test]
    fn profile_action_on_landing_moves_to_the_lobby() {
        let transport = MockTransport::connected(5);
        let ui = MockUi::new();
        let (mut runner, _) = runner(None, &transport, ui);
        runner.frame(FRAME);

        runner.ui.actions.push_back(Ok(Some(UserAction::SetProfile {
            nickname: "ana".to_string(),
            avatar: None,
        })));
        runner.frame(FRAME);

        assert!(matches!(runner.session.state(), ClientState::Lobby(_)));
        assert_eq!(runner.session.identity.nickname(), Some("ana"));
    }

    #[test]
    fn game_start_moves_the_room_to_the_canvas() {
        let transport = MockTransport::connected(2);
        let (mut runner, _) = runner(Some("bob"), &transport, MockUi::new());
        runner.frame(FRAME);
        runner.ui.actions.push_back(Ok(Some(UserAction::JoinRoom("AB12".to_string()))));
        runner.frame(FRAME);
        assert!(matches!(runner.session.state(), ClientState::Room(_)));

        transport.queue_server_message(ServerMessage::GameStarted {
            room_code: "AB12".to_string(),
            room: Some(room_snapshot("AB12", 1, &[(1, "alice"), (2, "bob")])),
        });
        runner.frame(FRAME);

        assert!(matches!(runner.session.state(), ClientState::Round(_)));
        assert_eq!(
            runner.ui.routes.last(),
            Some(&Route::Canvas {
                code: "AB12".to_string()
            })
        );
    }

    #[test]
    fn lost_connection_drops_the_view_and_retries_every_three_seconds() {
        let transport = MockTransport::connected(5);
        let (mut runner, attempts) = runner(Some("ana"), &transport, MockUi::new());
        runner.frame(FRAME);

        transport.set_disconnected("timeout");
        runner.frame(Duration::from_secs(1));
        assert!(runner.session.state().is_disconnected());
        assert_eq!(runner.ui.notices.len(), 1);

        runner.frame(Duration::from_secs(1));
        assert_eq!(attempts.get(), 0);
        runner.frame(Duration::from_secs(1));
        assert_eq!(attempts.get(), 1);

        runner.frame(FRAME);
        assert!(matches!(runner.session.state(), ClientState::Lobby(_)));
        assert_eq!(runner.channel.connection_id(), Some(101));
    }

    #[test]
    fn closed_input_stops_the_loop() {
        let transport = MockTransport::connected(5);
        let mut ui = MockUi::new();
        ui.actions.push_back(Err(crate::ui::UiInputError::Disconnected));
        let (mut runner, _) = runner(Some("ana"), &transport, ui);

        assert!(!runner.frame(FRAME));
    }

    #[test]
    fn shutdown_leaves_the_room() {
        let transport = MockTransport::connected(2);
        let ui = MockUi::with_actions([UserAction::JoinRoom("AB12".to_string())]);
        let (mut runner, _) = runner(Some("bob"), &transport, ui);
        runner.frame(FRAME);
        runner.frame(FRAME);
        transport.take_sent();

        runner.shutdown();

        assert_eq!(
            transport.sent_client_messages(),
            vec![ClientMessage::QuitRoom {
                room_code: "AB12".to_string()
            }]
        );
        assert!(transport.disconnect_called());
    }

    #[test]
    fn one_screen_is_drawn_per_frame() {
        let transport = MockTransport::connected(5);
        let (mut runner, _) = runner(Some("ana"), &transport, MockUi::new());

        runner.frame(FRAME);
        runner.frame(FRAME);

        assert_eq!(runner.ui.screens.len(), 2);
    }
}
