use std::{cell::RefCell, collections::VecDeque, rc::Rc, time::Duration};

use bincode::{
    config::standard,
    serde::{decode_from_slice, encode_to_vec},
};

use crate::{
    error::{CaptureError, UploadError},
    identity::{Identity, MemoryTokenStore},
    net::Transport,
    session::ClientSession,
    submission::{SubmissionPipeline, UploadAck, UploadOutcome, UploadRequest, Uploader},
    surface::DrawingSurface,
    ui::{ClientUi, Route, Screen, UiInputError, UserAction},
};
use common::{
    net::AppChannel,
    player::{ConnectionId, PlayerRef},
    protocol::{ClientMessage, ScoreEntry, ServerMessage},
    room::RoomSnapshot,
};

#[derive(Default)]
pub struct MockUi {
    pub messages: Vec<String>,
    pub errors: Vec<String>,
    pub notices: Vec<String>,
    pub routes: Vec<Route>,
    pub actions: VecDeque<Result<Option<UserAction>, UiInputError>>,
    pub screens: Vec<String>,
}

impl MockUi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_actions<I>(actions: I) -> Self
    where
        I: IntoIterator<Item = UserAction>,
    {
        Self {
            actions: actions.into_iter().map(|action| Ok(Some(action))).collect(),
            ..Default::default()
        }
    }
}

impl ClientUi for MockUi {
    fn show_message(&mut self, message: &str) {
        self.messages.push(message.to_string());
    }

    fn show_error(&mut self, message: &str) {
        self.errors.push(message.to_string());
    }

    fn show_notice(&mut self, message: &str) {
        self.notices.push(message.to_string());
    }

    fn navigate(&mut self, route: &Route) {
        self.routes.push(route.clone());
    }

    fn poll_action(&mut self) -> Result<Option<UserAction>, UiInputError> {
        self.actions.pop_front().unwrap_or(Ok(None))
    }

    fn draw(&mut self, screen: &Screen<'_>) {
        self.screens.push(format!("{:?}", screen));
    }
}

#[derive(Default)]
struct TransportState {
    client_id: Option<ConnectionId>,
    disconnect_reason: Option<String>,
    inbound: VecDeque<Vec<u8>>,
    sent: Vec<(AppChannel, Vec<u8>)>,
    disconnect_called: bool,
}

/// In-memory transport. Clones share state, so a test keeps one handle
/// while the channel owns another.
#[derive(Clone, Default)]
pub struct MockTransport {
    state: Rc<RefCell<TransportState>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn connected(client_id: ConnectionId) -> Self {
        let transport = Self::new();
        transport.set_connected(client_id);
        transport
    }

    pub fn set_connected(&self, client_id: ConnectionId) {
        let mut state = self.state.borrow_mut();
        state.client_id = Some(client_id);
        state.disconnect_reason = None;
    }

    pub fn set_disconnected(&self, reason: &str) {
        let mut state = self.state.borrow_mut();
        state.client_id = None;
        state.disconnect_reason = Some(reason.to_string());
    }

    pub fn queue_server_message(&self, message: ServerMessage) {
        let data = encode_to_vec(&message, standard()).expect("failed to serialize test message");
        self.queue_raw(data);
    }

    pub fn queue_raw(&self, data: Vec<u8>) {
        self.state.borrow_mut().inbound.push_back(data);
    }

    pub fn sent_client_messages(&self) -> Vec<ClientMessage> {
        self.state
            .borrow()
            .sent
            .iter()
            .map(|(_, data)| {
                decode_from_slice::<ClientMessage, _>(data, standard())
                    .expect("client sent an undecodable message")
                    .0
            })
            .collect()
    }

    /// Forgets what was sent so far.
    pub fn take_sent(&self) -> Vec<ClientMessage> {
        let messages = self.sent_client_messages();
        self.state.borrow_mut().sent.clear();
        messages
    }

    pub fn disconnect_called(&self) -> bool {
        self.state.borrow().disconnect_called
    }
}

impl Transport for MockTransport {
    fn update(&mut self, _duration: Duration) -> Result<(), String> {
        Ok(())
    }

    fn send_packets(&mut self) -> Result<(), String> {
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.state.borrow().client_id.is_some()
    }

    fn is_disconnected(&self) -> bool {
        self.state.borrow().disconnect_reason.is_some()
    }

    fn get_disconnect_reason(&self) -> String {
        self.state
            .borrow()
            .disconnect_reason
            .clone()
            .unwrap_or_default()
    }

    fn client_id(&self) -> Option<ConnectionId> {
        self.state.borrow().client_id
    }

    fn send_message(&mut self, channel: AppChannel, message: Vec<u8>) {
        self.state.borrow_mut().sent.push((channel, message));
    }

    fn receive_message(&mut self, _channel: AppChannel) -> Option<Vec<u8>> {
        self.state.borrow_mut().inbound.pop_front()
    }

    fn disconnect(&mut self) {
        let mut state = self.state.borrow_mut();
        state.disconnect_called = true;
        state.client_id = None;
    }
}

#[derive(Default)]
struct UploaderState {
    started: Vec<UploadRequest>,
    completed: VecDeque<UploadOutcome>,
}

/// Records started uploads; tests complete them by hand.
#[derive(Clone, Default)]
pub struct MockUploader {
    state: Rc<RefCell<UploaderState>>,
}

impl MockUploader {
    pub fn started(&self) -> Vec<UploadRequest> {
        self.state.borrow().started.clone()
    }

    pub fn complete(&self, round: u32, result: Result<UploadAck, UploadError>) {
        self.state
            .borrow_mut()
            .completed
            .push_back(UploadOutcome { round, result });
    }
}

impl Uploader for MockUploader {
    fn start(&mut self, request: UploadRequest) {
        self.state.borrow_mut().started.push(request);
    }

    fn poll_completed(&mut self) -> Option<UploadOutcome> {
        self.state.borrow_mut().completed.pop_front()
    }
}

pub struct StubSurface {
    bytes: Option<Vec<u8>>,
}

impl StubSurface {
    pub fn not_ready() -> Self {
        Self { bytes: None }
    }

    pub fn with_bytes(bytes: Vec<u8>) -> Self {
        Self { bytes: Some(bytes) }
    }
}

impl Default for StubSurface {
    fn default() -> Self {
        // JPEG start and end markers.
        Self::with_bytes(vec![0xff, 0xd8, 0xff, 0xd9])
    }
}

impl DrawingSurface for StubSurface {
    fn clear(&mut self) {}

    fn capture(&self) -> Result<Vec<u8>, CaptureError> {
        self.bytes.clone().ok_or(CaptureError::NotReady)
    }
}

pub fn room_snapshot(code: &str, host: ConnectionId, players: &[(ConnectionId, &str)]) -> RoomSnapshot {
    RoomSnapshot {
        code: code.to_string(),
        host,
        players: players
            .iter()
            .map(|(connection_id, nickname)| PlayerRef {
                connection_id: *connection_id,
                nickname: nickname.to_string(),
                avatar: None,
            })
            .collect(),
    }
}

pub fn score(player_name: &str, score_percent: f32) -> ScoreEntry {
    ScoreEntry {
        player_name: player_name.to_string(),
        score_percent,
        image: vec![0xff, 0xd8],
    }
}

/// A session with an in-memory token store, a stub surface and a mock
/// uploader whose handle is returned alongside.
pub fn test_session(nickname: Option<&str>, token: Option<&str>) -> (ClientSession, MockUploader) {
    let store = match token {
        Some(token) => MemoryTokenStore::with_token(token),
        None => MemoryTokenStore::default(),
    };
    let mut identity = Identity::load(Box::new(store));
    if let Some(nickname) = nickname {
        identity
            .set_nickname(nickname)
            .expect("test nickname should be valid");
    }

    let uploader = MockUploader::default();
    let pipeline = SubmissionPipeline::new(
        Box::new(StubSurface::default()),
        Box::new(uploader.clone()),
    );
    (ClientSession::new(identity, pipeline), uploader)
}
