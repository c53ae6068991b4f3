use std::{
    collections::VecDeque,
    net::{IpAddr, Ipv4Addr, SocketAddr},
    time::Duration,
};

use bincode::{
    config::standard,
    serde::{decode_from_slice, encode_to_vec},
};
use renet::RenetClient;
use renet_netcode::{ClientAuthentication, ConnectToken, NetcodeClientTransport};
use tracing::{debug, info, trace, warn};

use crate::{
    error::ChannelError,
    events::{Subscription, Subscriptions},
};
use common::{
    net::{AppChannel, bind_socket, connection_config},
    player::ConnectionId,
    protocol::{self, ClientMessage, EventKind, ServerMessage},
};

/// Byte-level connection to the game server.
pub trait Transport {
    /// Receives pending packets and advances connection timers.
    fn update(&mut self, duration: Duration) -> Result<(), String>;
    /// Sends everything queued since the last call.
    fn send_packets(&mut self) -> Result<(), String>;
    fn is_connected(&self) -> bool;
    fn is_disconnected(&self) -> bool;
    fn get_disconnect_reason(&self) -> String;
    /// Id the server knows this client by, while connected.
    fn client_id(&self) -> Option<ConnectionId>;
    fn send_message(&mut self, channel: AppChannel, message: Vec<u8>);
    fn receive_message(&mut self, channel: AppChannel) -> Option<Vec<u8>>;
    fn disconnect(&mut self);
}

pub fn create_connect_token(
    current_time: Duration,
    protocol_id: u64,
    client_id: u64,
    server_addr: SocketAddr,
    private_key: &[u8; 32],
) -> Result<ConnectToken, ChannelError> {
    ConnectToken::generate(
        current_time,
        protocol_id,
        3600,
        client_id,
        15,
        vec![server_addr],
        None,
        private_key,
    )
    .map_err(|e| ChannelError::Token(format!("{:?}", e)))
}

pub struct RenetTransport {
    client: RenetClient,
    transport: NetcodeClientTransport,
    client_id: ConnectionId,
}

impl RenetTransport {
    /// Opens a new netcode connection under a freshly generated client id.
    /// Reconnecting goes through here too, so the server sees a new id.
    pub fn connect(server_addr: SocketAddr, private_key: &[u8; 32]) -> Result<Self, ChannelError> {
        let client_id = rand::random::<u64>();
        let current_time = common::time::now();
        let connect_token = create_connect_token(
            current_time,
            protocol::version(),
            client_id,
            server_addr,
            private_key,
        )?;

        let local_addr = SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), 0);
        let socket = bind_socket(local_addr).map_err(ChannelError::Bind)?;
        socket.set_nonblocking(true).map_err(ChannelError::Bind)?;

        let authentication = ClientAuthentication::Secure { connect_token };
        let transport = NetcodeClientTransport::new(current_time, authentication, socket)
            .map_err(|e| ChannelError::Transport(e.to_string()))?;

        info!(%server_addr, client_id, "connecting to game server");

        Ok(Self {
            client: RenetClient::new(connection_config()),
            transport,
            client_id,
        })
    }
}

impl Transport for RenetTransport {
    fn update(&mut self, duration: Duration) -> Result<(), String> {
        self.client.update(duration);
        self.transport
            .update(duration, &mut self.client)
            .map_err(|e| format!("transport error: {}", e))
    }

    fn send_packets(&mut self) -> Result<(), String> {
        self.transport
            .send_packets(&mut self.client)
            .map_err(|e| format!("error sending packets: {}", e))
    }

    fn is_connected(&self) -> bool {
        self.client.is_connected()
    }

    fn is_disconnected(&self) -> bool {
        self.client.is_disconnected()
    }

    fn get_disconnect_reason(&self) -> String {
        if let Some(reason) = self.client.disconnect_reason() {
            format!("{:?}", reason)
        } else if let Some(reason) = self.transport.disconnect_reason() {
            format!("{:?}", reason)
        } else {
            "unknown reason".to_string()
        }
    }

    fn client_id(&self) -> Option<ConnectionId> {
        self.client.is_connected().then_some(self.client_id)
    }

    fn send_message(&mut self, channel: AppChannel, message: Vec<u8>) {
        self.client.send_message(channel, message);
    }

    fn receive_message(&mut self, channel: AppChannel) -> Option<Vec<u8>> {
        self.client
            .receive_message(channel)
            .map(|bytes| bytes.to_vec())
    }

    fn disconnect(&mut self) {
        self.transport.disconnect();
    }
}

/// Something the channel hands to the event loop.
#[derive(Debug, Clone, PartialEq)]
pub enum Inbound {
    Connected,
    Disconnected { reason: String },
    Server(ServerMessage),
}

impl Inbound {
    pub fn kind(&self) -> EventKind {
        match self {
            Self::Connected => EventKind::Connect,
            Self::Disconnected { .. } => EventKind::Disconnect,
            Self::Server(message) => message.kind(),
        }
    }
}

/// Typed, subscription-filtered event stream over a [`Transport`].
///
/// One channel lives for the whole process. On reconnect its transport is
/// swapped out, while subscriptions and the identity that reads
/// [`EventChannel::connection_id`] stay put.
pub struct EventChannel {
    transport: Box<dyn Transport>,
    subscriptions: Subscriptions,
    inbox: VecDeque<Inbound>,
    was_connected: bool,
    disconnect_reported: bool,
}

impl EventChannel {
    pub fn new(transport: Box<dyn Transport>) -> Self {
        Self {
            transport,
            subscriptions: Subscriptions::new(),
            inbox: VecDeque::new(),
            was_connected: false,
            disconnect_reported: false,
        }
    }

    pub fn replace_transport(&mut self, transport: Box<dyn Transport>) {
        self.transport.disconnect();
        self.transport = transport;
        self.inbox.clear();
        self.was_connected = false;
        self.disconnect_reported = false;
    }

    /// Subscribes to `kinds` until the guard is dropped.
    pub fn on(&self, kinds: &[EventKind]) -> Subscription {
        self.subscriptions.subscribe(kinds)
    }

    pub fn is_connected(&self) -> bool {
        self.transport.is_connected()
    }

    /// True once a disconnect has been reported for the current transport.
    pub fn is_down(&self) -> bool {
        self.disconnect_reported
    }

    /// Asked on every call; never cache it across a reconnect.
    pub fn connection_id(&self) -> Option<ConnectionId> {
        self.transport.client_id()
    }

    /// Queues `message` for the server. Messages emitted while the
    /// connection is down are dropped.
    pub fn emit(&mut self, message: ClientMessage) {
        let name = message.name();
        if !self.transport.is_connected() {
            warn!(event = name, "dropping outbound event while disconnected");
            return;
        }

        match encode_to_vec(&message, standard()) {
            Ok(payload) => {
                debug!(event = name, bytes = payload.len(), "emit");
                self.transport
                    .send_message(AppChannel::ReliableOrdered, payload);
            }
            Err(e) => {
                let error = ChannelError::Encode {
                    name,
                    reason: e.to_string(),
                };
                warn!("{}", error);
            }
        }
    }

    /// Pumps the transport and decodes everything that arrived.
    pub fn pump(&mut self, duration: Duration) {
        if let Err(reason) = self.transport.update(duration) {
            self.report_disconnect(reason);
            return;
        }

        if self.transport.is_connected() && !self.was_connected {
            self.was_connected = true;
            self.inbox.push_back(Inbound::Connected);
        }

        while let Some(data) = self
            .transport
            .receive_message(AppChannel::ReliableOrdered)
        {
            match decode_from_slice::<ServerMessage, _>(&data, standard()) {
                Ok((message, _)) => {
                    trace!(event = %message.kind(), "received");
                    self.inbox.push_back(Inbound::Server(message));
                }
                Err(e) => warn!("dropping undecodable server message: {}", e),
            }
        }

        if self.transport.is_disconnected() {
            let reason = self.transport.get_disconnect_reason();
            self.report_disconnect(reason);
        }
    }

    pub fn flush(&mut self) {
        if let Err(reason) = self.transport.send_packets() {
            self.report_disconnect(reason);
        }
    }

    /// Next event that somebody is subscribed to, in arrival order.
    /// Events nobody listens for at the moment they are dequeued are
    /// discarded.
    pub fn next_event(&mut self) -> Option<Inbound> {
        while let Some(event) = self.inbox.pop_front() {
            let kind = event.kind();
            if self.subscriptions.is_subscribed(kind) {
                return Some(event);
            }
            trace!(event = %kind, "no subscriber; discarding");
        }
        None
    }

    pub fn disconnect(&mut self) {
        self.transport.disconnect();
    }

    fn report_disconnect(&mut self, reason: String) {
        if self.disconnect_reported {
            return;
        }
        self.disconnect_reported = true;
        self.was_connected = false;
        self.inbox.push_back(Inbound::Disconnected { reason });
    }
}
