use std::{
    env, io,
    net::{AddrParseError, SocketAddr, UdpSocket},
    time::Duration,
};

use renet::{ChannelConfig, ConnectionConfig, SendType};
use socket2::{Domain, Socket, Type};

const DEFAULT_PRIVATE_KEY: [u8; 32] = [
    211, 120, 2, 54, 202, 170, 80, 236, 225, 33, 220, 193, 223, 199, 20, 80, 202, 88, 77, 123, 88,
    129, 160, 222, 33, 251, 99, 37, 145, 18, 199, 199,
];

pub fn private_key() -> [u8; 32] {
    DEFAULT_PRIVATE_KEY
}

/// Reads `IP` and `PORT` from the environment (after loading `.env`, if
/// present), falling back to `127.0.0.1:5000`.
pub fn get_connectable_address() -> Result<SocketAddr, AddrParseError> {
    dotenvy::dotenv().ok();

    let ip = env::var("IP").unwrap_or_else(|_| "127.0.0.1".to_string());
    let port = env::var("PORT").unwrap_or_else(|_| "5000".to_string());

    format!("{}:{}", ip, port).parse()
}

/// Room and round events all travel on one reliable, ordered channel so the
/// client sees them in the order the server sent them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppChannel {
    ReliableOrdered,
}

impl From<AppChannel> for u8 {
    fn from(channel: AppChannel) -> Self {
        match channel {
            AppChannel::ReliableOrdered => 0,
        }
    }
}

pub fn connection_config() -> ConnectionConfig {
    // Score lists carry every player's drawing, so leave headroom.
    let reliable_config = ChannelConfig {
        channel_id: AppChannel::ReliableOrdered.into(),
        max_memory_usage_bytes: 16 * 1024 * 1024,
        send_type: SendType::ReliableOrdered {
            resend_time: Duration::from_millis(100),
        },
    };

    ConnectionConfig {
        client_channels_config: vec![reliable_config.clone()],
        server_channels_config: vec![reliable_config],
        ..Default::default()
    }
}

pub fn bind_socket(addr: SocketAddr) -> io::Result<UdpSocket> {
    let domain = if addr.is_ipv4() {
        Domain::IPV4
    } else {
        Domain::IPV6
    };
    let socket = Socket::new(domain, Type::DGRAM, None)?;
    socket.set_reuse_address(true)?;
    socket.bind(&addr.into())?;
    Ok(socket.into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reliable_channel_maps_to_renet_channel_zero() {
        assert_eq!(u8::from(AppChannel::ReliableOrdered), 0);
    }

    #[test]
    fn client_and_server_share_the_reliable_channel() {
        let config = connection_config();
        assert_eq!(config.client_channels_config.len(), 1);
        assert_eq!(config.server_channels_config.len(), 1);
        assert_eq!(config.client_channels_config[0].channel_id, 0);
        assert!(matches!(
            config.server_channels_config[0].send_type,
            SendType::ReliableOrdered { .. }
        ));
    }
}
