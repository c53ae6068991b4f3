pub mod http;
pub mod multipart;

use serde_json::Value;

use crate::{error::UploadError, surface::DrawingSurface};
use common::{
    constants::{UPLOAD_IMAGE_CONTENT_TYPE, UPLOAD_IMAGE_FILENAME},
    player::ConnectionId,
};

use self::multipart::MultipartForm;

/// At most one submission per round. Once `sent` is set it stays set until
/// the next round replaces the ticket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionTicket {
    room_code: String,
    round: u32,
    connection_id: Option<ConnectionId>,
    sent: bool,
}

impl SubmissionTicket {
    pub fn new(room_code: &str, round: u32) -> Self {
        Self {
            room_code: room_code.to_string(),
            round,
            connection_id: None,
            sent: false,
        }
    }

    pub fn room_code(&self) -> &str {
        &self.room_code
    }

    pub fn round(&self) -> u32 {
        self.round
    }

    pub fn is_sent(&self) -> bool {
        self.sent
    }

    /// Connection the drawing was submitted under, once sent.
    pub fn connection_id(&self) -> Option<ConnectionId> {
        self.connection_id
    }

    pub(crate) fn mark_sent(&mut self, connection_id: ConnectionId) {
        self.sent = true;
        self.connection_id = Some(connection_id);
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadRequest {
    pub round: u32,
    pub room_code: String,
    pub socket_id: ConnectionId,
    pub token: Option<String>,
    pub nickname: Option<String>,
    pub image: Vec<u8>,
}

impl UploadRequest {
    pub fn to_form(&self, boundary: &str) -> MultipartForm {
        let mut form = MultipartForm::new(boundary)
            .file(
                "image",
                UPLOAD_IMAGE_FILENAME,
                UPLOAD_IMAGE_CONTENT_TYPE,
                &self.image,
            )
            .text("roomCode", &self.room_code)
            .text("socketId", &self.socket_id.to_string());

        if let Some(token) = &self.token {
            form = form.text("token", token);
        }
        if let Some(nickname) = &self.nickname {
            form = form.text("nickname", nickname);
        }
        form
    }
}

/// Body of a successful upload. Anything that is not JSON reads as `null`.
#[derive(Debug, Clone, PartialEq)]
pub struct UploadAck(pub Value);

impl UploadAck {
    pub fn from_body(body: &str) -> Self {
        Self(serde_json::from_str(body).unwrap_or(Value::Null))
    }
}

#[derive(Debug)]
pub struct UploadOutcome {
    pub round: u32,
    pub result: Result<UploadAck, UploadError>,
}

/// Runs uploads off the frame loop and reports them back when polled.
pub trait Uploader {
    fn start(&mut self, request: UploadRequest);
    fn poll_completed(&mut self) -> Option<UploadOutcome>;
}

/// The drawing surface and the uploader a round view submits through.
pub struct SubmissionPipeline {
    pub surface: Box<dyn DrawingSurface>,
    pub uploader: Box<dyn Uploader>,
}

impl SubmissionPipeline {
    pub fn new(surface: Box<dyn DrawingSurface>, uploader: Box<dyn Uploader>) -> Self {
        Self { surface, uploader }
    }
}

/// Checks everything a submission needs before any network call is made.
pub fn prepare_request(
    ticket: &SubmissionTicket,
    connection_id: Option<ConnectionId>,
    token: Option<&str>,
    nickname: Option<&str>,
    surface: &dyn DrawingSurface,
) -> Result<UploadRequest, UploadError> {
    if ticket.room_code().trim().is_empty() {
        return Err(UploadError::InvalidState("no room code".to_string()));
    }
    let Some(socket_id) = connection_id else {
        return Err(UploadError::InvalidState(
            "not connected to the server".to_string(),
        ));
    };

    let image = surface.capture()?;

    Ok(UploadRequest {
        round: ticket.round(),
        room_code: ticket.room_code().to_string(),
        socket_id,
        token: token.map(str::to_string),
        nickname: nickname.map(str::to_string),
        image,
    })
}
