use std::{
    fs, io,
    path::{Path, PathBuf},
};

use rand::seq::IndexedRandom;
use tracing::{debug, warn};

use crate::{error::TokenStoreError, net::EventChannel};
use common::{
    constants::{APP_DIR_NAME, DEFAULT_AVATARS, TOKEN_KEY},
    player::{ConnectionId, NicknameError, sanitize_nickname},
};

/// Durable home of the auth token, so it survives a restart.
pub trait TokenStore {
    fn load(&self) -> Result<Option<String>, TokenStoreError>;
    fn save(&mut self, token: &str) -> Result<(), TokenStoreError>;
}

#[derive(Debug, Clone)]
pub struct FileTokenStore {
    path: PathBuf,
}

impl FileTokenStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `<local data dir>/doodle-duel/authToken`.
    pub fn in_data_dir() -> Result<Self, TokenStoreError> {
        let dir = dirs::data_local_dir().ok_or(TokenStoreError::NoDataDir)?;
        Ok(Self::new(dir.join(APP_DIR_NAME).join(TOKEN_KEY)))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, source: io::Error) -> TokenStoreError {
        TokenStoreError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

impl TokenStore for FileTokenStore {
    fn load(&self) -> Result<Option<String>, TokenStoreError> {
        match fs::read_to_string(&self.path) {
            Ok(contents) => {
                let token = contents.trim();
                Ok((!token.is_empty()).then(|| token.to_string()))
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(self.io_error(e)),
        }
    }

    fn save(&mut self, token: &str) -> Result<(), TokenStoreError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|e| self.io_error(e))?;
        }
        fs::write(&self.path, token).map_err(|e| self.io_error(e))
    }
}

#[derive(Debug, Clone, Default)]
pub struct MemoryTokenStore {
    token: Option<String>,
}

impl MemoryTokenStore {
    pub fn with_token(token: &str) -> Self {
        Self {
            token: Some(token.to_string()),
        }
    }
}

impl TokenStore for MemoryTokenStore {
    fn load(&self) -> Result<Option<String>, TokenStoreError> {
        Ok(self.token.clone())
    }

    fn save(&mut self, token: &str) -> Result<(), TokenStoreError> {
        self.token = Some(token.to_string());
        Ok(())
    }
}

/// Who this client is: the persisted auth token plus the nickname and
/// avatar chosen on the landing page. The connection id is not stored
/// here; see [`Identity::connection_id`].
pub struct Identity {
    token: Option<String>,
    store: Box<dyn TokenStore>,
    nickname: Option<String>,
    avatar: Option<String>,
}

impl Identity {
    /// Reads any token left by an earlier run. A store that cannot be read
    /// is treated as empty.
    pub fn load(store: Box<dyn TokenStore>) -> Self {
        let token = match store.load() {
            Ok(token) => token,
            Err(e) => {
                warn!("could not read stored auth token: {}", e);
                None
            }
        };

        Self {
            token,
            store,
            nickname: None,
            avatar: None,
        }
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    /// Keeps the token in memory even if persisting it fails.
    pub fn set_token(&mut self, token: String) {
        if let Err(e) = self.store.save(&token) {
            warn!("could not persist auth token: {}", e);
        }
        debug!("auth token updated");
        self.token = Some(token);
    }

    pub fn nickname(&self) -> Option<&str> {
        self.nickname.as_deref()
    }

    pub fn set_nickname(&mut self, input: &str) -> Result<&str, NicknameError> {
        let nickname = sanitize_nickname(input)?;
        Ok(self.nickname.insert(nickname).as_str())
    }

    pub fn avatar(&self) -> Option<&str> {
        self.avatar.as_deref()
    }

    pub fn set_avatar(&mut self, avatar: Option<String>) {
        self.avatar = avatar.filter(|avatar| !avatar.trim().is_empty());
    }

    /// Picks a random default avatar if none was chosen.
    pub fn ensure_avatar(&mut self) -> Option<&str> {
        if self.avatar.is_none() {
            self.avatar = DEFAULT_AVATARS
                .choose(&mut rand::rng())
                .map(|avatar| avatar.to_string());
        }
        self.avatar.as_deref()
    }

    /// Current connection id, read from the channel every time. Any
    /// reconnect changes it.
    pub fn connection_id(&self, channel: &EventChannel) -> Option<ConnectionId> {
        channel.connection_id()
    }
}
