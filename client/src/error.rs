use std::{io, net::AddrParseError, path::PathBuf};

use thiserror::Error;

use common::protocol::EventKind;

/// Problems with an inbound event. Neither is allowed to escape the event
/// loop: `MissingData` is logged and ignored, `StaleRoom` sends the player
/// back to the lobby.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EventError {
    #[error("{kind} event is missing data: {detail}")]
    MissingData { kind: EventKind, detail: String },
    #[error("room {code} no longer exists")]
    StaleRoom { code: String },
}

impl EventError {
    pub fn missing(kind: EventKind, detail: impl Into<String>) -> Self {
        Self::MissingData {
            kind,
            detail: detail.into(),
        }
    }
}

#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("drawing surface is not ready")]
    NotReady,
    #[error("failed to encode drawing: {0}")]
    Encode(#[from] image::ImageError),
}

/// The only errors shown to the player as text on the drawing view.
#[derive(Debug, Error)]
pub enum UploadError {
    #[error("cannot submit drawing: {0}")]
    InvalidState(String),
    #[error("upload failed: {}", failure_text(.status, .body))]
    UploadFailed { status: Option<u16>, body: String },
    #[error(transparent)]
    Capture(#[from] CaptureError),
}

fn failure_text(status: &Option<u16>, body: &str) -> String {
    match status {
        Some(status) => format!("{} {}", status, body),
        None => body.to_string(),
    }
}

#[derive(Debug, Error)]
pub enum TokenStoreError {
    #[error("no data directory available for the token file")]
    NoDataDir,
    #[error("failed to access token file {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

#[derive(Debug, Error)]
pub enum ChannelError {
    #[error("failed to bind client socket: {0}")]
    Bind(#[source] io::Error),
    #[error("failed to generate connect token: {0}")]
    Token(String),
    #[error("failed to create network transport: {0}")]
    Transport(String),
    #[error("failed to encode {name} message: {reason}")]
    Encode { name: &'static str, reason: String },
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid server address: {0}")]
    ServerAddress(#[from] AddrParseError),
    #[error("invalid NICKNAME: {0}")]
    Nickname(#[from] common::player::NicknameError),
}

/// Anything that stops the client before its frame loop runs.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Channel(#[from] ChannelError),
    #[error("failed to install Ctrl-C handler: {0}")]
    Signal(#[from] ctrlc::Error),
    #[error("failed to initialize terminal: {0}")]
    Terminal(#[source] io::Error),
}
