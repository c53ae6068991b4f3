pub mod config;
pub mod error;
pub mod events;
pub mod identity;
pub mod net;
pub mod results;
pub mod room;
pub mod round;
pub mod run;
pub mod session;
pub mod state;
pub mod state_handlers;
pub mod submission;
pub mod surface;
pub mod ui;

#[cfg(test)]
mod test_helpers;

use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};

use tracing::{info, warn};

use crate::{
    config::ClientConfig,
    error::{ConfigError, StartupError},
    identity::{FileTokenStore, Identity, MemoryTokenStore, TokenStore},
    net::{EventChannel, RenetTransport, Transport},
    run::{ClientRunner, Connector},
    session::ClientSession,
    submission::{SubmissionPipeline, http::HttpUploader},
    surface::RasterSurface,
    ui::TerminalUi,
};

pub fn run_client() -> Result<(), StartupError> {
    let config = ClientConfig::from_env()?;
    info!(
        server = %config.server_addr,
        upload_url = %config.upload_url,
        "starting client"
    );

    let session = ClientSession::new(
        load_identity(&config)?,
        SubmissionPipeline::new(
            Box::new(RasterSurface::new()),
            Box::new(HttpUploader::new(config.upload_url.clone())),
        ),
    );

    let server_addr = config.server_addr;
    let private_key = common::net::private_key();
    let mut connector: Connector = Box::new(move || {
        RenetTransport::connect(server_addr, &private_key)
            .map(|transport| Box::new(transport) as Box<dyn Transport>)
    });
    let channel = EventChannel::new(connector()?);

    let running = Arc::new(AtomicBool::new(true));
    let handler_flag = Arc::clone(&running);
    ctrlc::set_handler(move || handler_flag.store(false, Ordering::SeqCst))?;

    let ui = TerminalUi::new().map_err(StartupError::Terminal)?;
    let mut runner = ClientRunner::new(session, channel, connector, ui);
    runner.run(&running);

    Ok(())
}

fn load_identity(config: &ClientConfig) -> Result<Identity, StartupError> {
    let store: Box<dyn TokenStore> = match &config.token_file {
        Some(path) => Box::new(FileTokenStore::new(path)),
        None => match FileTokenStore::in_data_dir() {
            Ok(store) => Box::new(store),
            Err(e) => {
                warn!("{}; the auth token will not outlive this run", e);
                Box::new(MemoryTokenStore::default())
            }
        },
    };

    let mut identity = Identity::load(store);
    if let Some(nickname) = &config.nickname {
        identity
            .set_nickname(nickname)
            .map_err(ConfigError::from)?;
    }
    identity.set_avatar(config.avatar.clone());
    Ok(identity)
}
