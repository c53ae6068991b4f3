use std::{env, net::SocketAddr, path::PathBuf};

use crate::error::ConfigError;
use common::{constants::DEFAULT_UPLOAD_URL, net::get_connectable_address, player::sanitize_nickname};

/// Startup settings, read from the environment after `.env` is loaded.
///
/// | variable     | default                          |
/// |--------------|----------------------------------|
/// | `IP`, `PORT` | `127.0.0.1:5000`                 |
/// | `UPLOAD_URL` | `http://localhost:3000/upload`   |
/// | `TOKEN_FILE` | local data dir                   |
/// | `NICKNAME`   | asked for on the landing page    |
/// | `AVATAR`     | random default                   |
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub server_addr: SocketAddr,
    pub upload_url: String,
    pub token_file: Option<PathBuf>,
    pub nickname: Option<String>,
    pub avatar: Option<String>,
}

impl ClientConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let server_addr = get_connectable_address()?;
        Self::from_lookup(server_addr, |key| env::var(key).ok())
    }

    fn from_lookup<F>(server_addr: SocketAddr, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let nickname = non_empty("NICKNAME")
            .map(|nickname| sanitize_nickname(&nickname))
            .transpose()?;

        Ok(Self {
            server_addr,
            upload_url: non_empty("UPLOAD_URL").unwrap_or_else(|| DEFAULT_UPLOAD_URL.to_string()),
            token_file: non_empty("TOKEN_FILE").map(PathBuf::from),
            nickname,
            avatar: non_empty("AVATAR"),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::player::NicknameError;
    use std::collections::HashMap;

    fn addr() -> SocketAddr {
        "127.0.0.1:5000".parse().expect("valid address")
    }

    fn config_from(vars: &[(&str, &str)]) -> Result<ClientConfig, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect();
        ClientConfig::from_lookup(addr(), |key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_apply_when_nothing_is_set() {
        let config = config_from(&[]).expect("defaults are valid");

        assert_eq!(config.upload_url, DEFAULT_UPLOAD_URL);
        assert_eq!(config.token_file, None);
        assert_eq!(config.nickname, None);
        assert_eq!(config.avatar, None);
    }

    #[test]
    fn blank_values_count_as_unset() {
        let config = config_from(&[("UPLOAD_URL", "  "), ("NICKNAME", "")]).expect("valid");

        assert_eq!(config.upload_url, DEFAULT_UPLOAD_URL);
        assert_eq!(config.nickname, None);
    }

    #[test]
    fn overrides_are_read() {
        let config = config_from(&[
            ("UPLOAD_URL", "http://example.test/upload"),
            ("TOKEN_FILE", "/tmp/token"),
            ("NICKNAME", " ana "),
            ("AVATAR", "avatars/fox.png"),
        ])
        .expect("valid");

        assert_eq!(config.upload_url, "http://example.test/upload");
        assert_eq!(config.token_file, Some(PathBuf::from("/tmp/token")));
        assert_eq!(config.nickname.as_deref(), Some("ana"));
        assert_eq!(config.avatar.as_deref(), Some("avatars/fox.png"));
    }

    #[test]
    fn invalid_nickname_is_rejected() {
        let result = config_from(&[("NICKNAME", "a-name-that-is-far-too-long")]);

        assert!(matches!(
            result,
            Err(ConfigError::Nickname(NicknameError::TooLong))
        ));
    }
}
