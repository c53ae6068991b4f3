pub mod terminal;

use std::fmt;

use crate::{results::ResultRow, room::RoomState};
use common::{player::ConnectionId, text::sanitize};

pub use terminal::TerminalUi;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UiInputError {
    #[error("Input source disconnected")]
    Disconnected,
}

/// Where the player is. Mirrors the page paths the server navigates by.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Landing,
    Lobby,
    Room { code: String },
    Canvas { code: String },
    Results { code: String, prompt: String },
}

impl Route {
    /// Maps a server `navigate` target onto a route. The room code may be
    /// part of the page (`room/AB12`) or sent alongside it.
    pub fn from_page(page: &str, room_code: Option<&str>) -> Option<Route> {
        let page = page.trim().trim_matches('/');
        let (name, inline_code) = match page.split_once('/') {
            Some((name, code)) => (name, Some(code)),
            None => (page, None),
        };
        let code = inline_code
            .or(room_code)
            .map(str::trim)
            .filter(|code| !code.is_empty())
            .map(str::to_string);

        match (name, code) {
            ("" | "landing", _) => Some(Route::Landing),
            ("lobby", _) => Some(Route::Lobby),
            ("room", Some(code)) => Some(Route::Room { code }),
            ("canvas", Some(code)) => Some(Route::Canvas { code }),
            ("results", Some(code)) => Some(Route::Results {
                code,
                prompt: String::new(),
            }),
            _ => None,
        }
    }

    pub fn room_code(&self) -> Option<&str> {
        match self {
            Route::Landing | Route::Lobby => None,
            Route::Room { code } | Route::Canvas { code } | Route::Results { code, .. } => {
                Some(code)
            }
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Route::Landing => write!(f, "/"),
            Route::Lobby => write!(f, "/lobby"),
            Route::Room { code } => write!(f, "/room/{}", code),
            Route::Canvas { code } => write!(f, "/canvas/{}", code),
            Route::Results { code, .. } => write!(f, "/results/{}", code),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserAction {
    SetProfile {
        nickname: String,
        avatar: Option<String>,
    },
    CreateRoom,
    JoinRoom(String),
    StartGame,
    SubmitDrawing,
    NextRound,
    QuitRoom,
}

pub const HELP_TEXT: &str = "Commands: nick <name> [avatar], create, join <code>, start, submit, next, quit. Ctrl+C exits.";

/// Parses one line of console input.
pub fn parse_command(line: &str) -> Result<UserAction, String> {
    let mut words = line.split_whitespace();
    let Some(command) = words.next() else {
        return Err("Type a command, or `help`.".to_string());
    };

    match command.to_ascii_lowercase().as_str() {
        "nick" | "name" => {
            let Some(nickname) = words.next() else {
                return Err("Usage: nick <name> [avatar]".to_string());
            };
            Ok(UserAction::SetProfile {
                nickname: nickname.to_string(),
                avatar: words.next().map(str::to_string),
            })
        }
        "create" => Ok(UserAction::CreateRoom),
        "join" => match words.next() {
            Some(code) => Ok(UserAction::JoinRoom(code.to_string())),
            None => Err("Usage: join <code>".to_string()),
        },
        "start" => Ok(UserAction::StartGame),
        "submit" | "s" => Ok(UserAction::SubmitDrawing),
        "next" => Ok(UserAction::NextRound),
        "quit" | "leave" => Ok(UserAction::QuitRoom),
        other => Err(format!("Unknown command `{}`. Type `help`.", other)),
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoundScreen<'a> {
    Loading {
        code: &'a str,
    },
    Waiting {
        prompt: Option<&'a str>,
    },
    PreCountdown {
        count: u32,
        prompt: &'a str,
    },
    Drawing {
        prompt: &'a str,
        remaining: u32,
    },
    Submitting {
        prompt: &'a str,
        error: Option<&'a str>,
    },
    Results {
        prompt: &'a str,
        rows: Vec<ResultRow<'a>>,
        can_advance: bool,
    },
}

/// Everything a front end needs to draw one frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Screen<'a> {
    Connecting,
    Disconnected {
        message: &'a str,
    },
    Landing {
        nickname: Option<&'a str>,
    },
    Lobby {
        nickname: Option<&'a str>,
        rooms: &'a [String],
    },
    Room {
        code: &'a str,
        room: Option<&'a RoomState>,
        me: Option<ConnectionId>,
    },
    Round(RoundScreen<'a>),
}

pub trait ClientUi {
    fn show_message(&mut self, message: &str);
    fn show_error(&mut self, message: &str);
    /// Blocking-style notice, e.g. "the host left".
    fn show_notice(&mut self, message: &str);
    fn navigate(&mut self, route: &Route);
    fn poll_action(&mut self) -> Result<Option<UserAction>, UiInputError>;
    fn draw(&mut self, screen: &Screen<'_>);

    fn show_sanitized_message(&mut self, message: &str) {
        self.show_message(&sanitize(message));
    }

    fn show_sanitized_error(&mut self, message: &str) {
        self.show_error(&sanitize(message));
    }

    fn show_sanitized_notice(&mut self, message: &str) {
        self.show_notice(&sanitize(message));
    }
}
