use std::{
    sync::mpsc::{self, Receiver, Sender},
    thread,
};

use tracing::{debug, info, warn};

use super::{UploadAck, UploadOutcome, UploadRequest, Uploader, multipart::random_boundary};
use crate::error::UploadError;

/// Posts drawings to the upload endpoint, one worker thread per upload.
pub struct HttpUploader {
    url: String,
    tx: Sender<UploadOutcome>,
    rx: Receiver<UploadOutcome>,
}

impl HttpUploader {
    pub fn new(url: impl Into<String>) -> Self {
        let (tx, rx) = mpsc::channel();
        Self {
            url: url.into(),
            tx,
            rx,
        }
    }
}

impl Uploader for HttpUploader {
    fn start(&mut self, request: UploadRequest) {
        let url = self.url.clone();
        let tx = self.tx.clone();
        let round = request.round;

        debug!(round, bytes = request.image.len(), %url, "starting upload");

        let spawned = thread::Builder::new()
            .name(format!("upload-round-{}", round))
            .spawn(move || {
                let result = post(&url, &request);
                // The receiver is gone only if the client is shutting down.
                let _ = tx.send(UploadOutcome { round, result });
            });

        if let Err(e) = spawned {
            warn!("could not start upload thread: {}", e);
            let _ = self.tx.send(UploadOutcome {
                round,
                result: Err(UploadError::UploadFailed {
                    status: None,
                    body: e.to_string(),
                }),
            });
        }
    }

    fn poll_completed(&mut self) -> Option<UploadOutcome> {
        self.rx.try_recv().ok()
    }
}

fn post(url: &str, request: &UploadRequest) -> Result<UploadAck, UploadError> {
    let form = request.to_form(&random_boundary());
    let content_type = form.content_type();

    match ureq::post(url)
        .set("Content-Type", &content_type)
        .send_bytes(&form.into_body())
    {
        Ok(response) => {
            let status = response.status();
            let body = response.into_string().unwrap_or_default();
            info!(round = request.round, status, "drawing uploaded");
            Ok(UploadAck::from_body(&body))
        }
        Err(ureq::Error::Status(status, response)) => {
            let body = response.into_string().unwrap_or_default();
            Err(UploadError::UploadFailed {
                status: Some(status),
                body,
            })
        }
        Err(ureq::Error::Transport(transport)) => Err(UploadError::UploadFailed {
            status: None,
            body: transport.to_string(),
        }),
    }
}
