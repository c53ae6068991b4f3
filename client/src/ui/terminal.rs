use std::{
    fmt::Display,
    io::{self, Stdout, Write, stdout},
    time::Duration,
};

use crossterm::{
    cursor::{MoveDown, MoveToColumn, MoveUp},
    event::{self, Event, KeyCode, KeyModifiers},
    execute, queue,
    style::{Print, Stylize},
    terminal::{self, Clear, ClearType},
};
use tracing::warn;

use super::{
    ClientUi, HELP_TEXT, Route, RoundScreen, Screen, UiInputError, UserAction, parse_command,
};
use crate::results::ScoreStatus;
use common::{player::MAX_NICKNAME_LENGTH, text::sanitize};

const PROMPT: &str = "> ";
const MAX_INPUT_CHARS: usize = 64 + MAX_NICKNAME_LENGTH;

/// Line-command front end on a raw-mode terminal. Screens are printed
/// when their text changes; the input line is kept at the bottom.
pub struct TerminalUi<W: Write> {
    stdout: W,
    buffer: String,
    prompt_lines: u16,
    cols: u16,
    last_screen: Vec<String>,
    is_raw_mode_owner: bool, // True except in tests.
}

impl TerminalUi<Stdout> {
    pub fn new() -> io::Result<Self> {
        terminal::enable_raw_mode()?;
        let mut stdout = stdout();
        let (cols, _) = terminal::size().unwrap_or((80, 24));
        execute!(
            stdout,
            MoveToColumn(0),
            Clear(ClearType::CurrentLine),
            Print(HELP_TEXT.dark_grey()),
            Print("\r\n"),
            Print(PROMPT)
        )?;
        Ok(Self {
            stdout,
            buffer: String::new(),
            prompt_lines: 1,
            cols,
            last_screen: Vec::new(),
            is_raw_mode_owner: true,
        })
    }
}

impl<W: Write> TerminalUi<W> {
    fn clear_prompt(&mut self) -> io::Result<()> {
        if self.prompt_lines > 1 {
            queue!(self.stdout, MoveUp(self.prompt_lines - 1))?;
        }
        for i in 0..self.prompt_lines {
            queue!(self.stdout, MoveToColumn(0), Clear(ClearType::CurrentLine))?;
            if i + 1 < self.prompt_lines {
                queue!(self.stdout, MoveDown(1))?;
            }
        }
        if self.prompt_lines > 1 {
            queue!(self.stdout, MoveUp(self.prompt_lines - 1))?;
        }
        queue!(self.stdout, MoveToColumn(0))
    }

    fn redraw_prompt(&mut self) -> io::Result<()> {
        self.clear_prompt()?;

        let cols = usize::from(self.cols.max(1));
        let width = PROMPT.len() + self.buffer.chars().count();
        self.prompt_lines = width.max(1).div_ceil(cols) as u16;

        queue!(self.stdout, Print(PROMPT), Print(&self.buffer))?;
        self.stdout.flush()
    }

    fn print_lines<T: Display>(&mut self, lines: &[T]) -> io::Result<()> {
        self.clear_prompt()?;
        for line in lines {
            queue!(self.stdout, Print(line), Print("\r\n"))?;
        }
        self.prompt_lines = 1;
        self.redraw_prompt()
    }

    fn print(&mut self, line: impl Display) {
        if let Err(e) = self.print_lines(&[line]) {
            warn!("failed to write to terminal: {}", e);
        }
    }

    fn handle_event(&mut self, event: Event) -> Result<Option<String>, UiInputError> {
        match event {
            Event::Key(key_event) => {
                if key_event.modifiers == KeyModifiers::CONTROL {
                    return match key_event.code {
                        KeyCode::Char('c') | KeyCode::Char('d') => Err(UiInputError::Disconnected),
                        _ => Ok(None),
                    };
                }

                match key_event.code {
                    KeyCode::Enter => {
                        let line = self.buffer.drain(..).collect();
                        let _ = queue!(self.stdout, Print("\r\n"));
                        self.prompt_lines = 1;
                        let _ = self.redraw_prompt();
                        Ok(Some(line))
                    }
                    KeyCode::Backspace => {
                        if self.buffer.pop().is_some() {
                            let _ = self.redraw_prompt();
                        }
                        Ok(None)
                    }
                    KeyCode::Esc => {
                        if !self.buffer.is_empty() {
                            self.buffer.clear();
                            let _ = self.redraw_prompt();
                        }
                        Ok(None)
                    }
                    KeyCode::Char(c) => {
                        if self.buffer.chars().count() < MAX_INPUT_CHARS {
                            self.buffer.push(c);
                            let _ = self.redraw_prompt();
                        }
                        Ok(None)
                    }
                    _ => Ok(None),
                }
            }
            Event::Resize(cols, _) => {
                self.cols = cols;
                let _ = self.redraw_prompt();
                Ok(None)
            }
            _ => Ok(None),
        }
    }

    fn action_from_line(&mut self, line: &str) -> Option<UserAction> {
        if line.trim().eq_ignore_ascii_case("help") {
            self.print(HELP_TEXT.dark_grey());
            return None;
        }
        match parse_command(line) {
            Ok(action) => Some(action),
            Err(message) => {
                self.show_error(&message);
                None
            }
        }
    }
}

impl<W: Write> ClientUi for TerminalUi<W> {
    fn show_message(&mut self, message: &str) {
        self.print(message);
    }

    fn show_error(&mut self, message: &str) {
        self.print(format!("[ERROR] {}", message).red());
    }

    fn show_notice(&mut self, message: &str) {
        self.print(message.yellow().bold());
    }

    fn navigate(&mut self, route: &Route) {
        self.last_screen.clear();
        self.print(format!("-> {}", route).dark_grey());
    }

    fn poll_action(&mut self) -> Result<Option<UserAction>, UiInputError> {
        if !event::poll(Duration::ZERO).unwrap_or(false) {
            return Ok(None);
        }

        let event = event::read().map_err(|_| UiInputError::Disconnected)?;
        match self.handle_event(event)? {
            Some(line) => Ok(self.action_from_line(&line)),
            None => Ok(None),
        }
    }

    fn draw(&mut self, screen: &Screen<'_>) {
        let lines = render(screen);
        if lines == self.last_screen {
            return;
        }

        let styled: Vec<String> = lines
            .iter()
            .enumerate()
            .map(|(i, line)| {
                if i == 0 {
                    line.as_str().cyan().bold().to_string()
                } else {
                    line.clone()
                }
            })
            .collect();
        if let Err(e) = self.print_lines(&styled) {
            warn!("failed to draw screen: {}", e);
        }
        self.last_screen = lines;
    }
}

impl<W: Write> Drop for TerminalUi<W> {
    fn drop(&mut self) {
        if self.is_raw_mode_owner {
            // Only the instance that enabled raw mode turns it off, so tests
            // never touch the test runner's terminal.
            execute!(self.stdout, Print("\r\n")).ok();
            terminal::disable_raw_mode().ok();
        }
    }
}

/// Plain-text lines for one screen; the first line is the heading.
pub fn render(screen: &Screen<'_>) -> Vec<String> {
    match screen {
        Screen::Connecting => vec!["Connecting to server...".to_string()],
        Screen::Disconnected { message } => vec![
            "Disconnected".to_string(),
            sanitize(message),
            "Reconnecting...".to_string(),
        ],
        Screen::Landing { nickname } => vec![
            "Doodle Duel".to_string(),
            match nickname {
                Some(nickname) => format!("Playing as {}.", nickname),
                None => "Choose a nickname: nick <name> [avatar]".to_string(),
            },
        ],
        Screen::Lobby { nickname, rooms } => {
            let mut lines = vec![format!("Lobby ({})", nickname.unwrap_or("anonymous"))];
            if rooms.is_empty() {
                lines.push("No open rooms. `create` one!".to_string());
            } else {
                lines.push(format!("Open rooms: {}", rooms.join(", ")));
                lines.push("`join <code>` or `create`".to_string());
            }
            lines
        }
        Screen::Room { code, room, me } => {
            let mut lines = vec![format!("Room {}", code)];
            match room {
                Some(room) => {
                    for player in room.players() {
                        let mut line = format!("  {}", sanitize(&player.nickname));
                        if player.connection_id == room.host() {
                            line.push_str(" (host)");
                        }
                        if Some(player.connection_id) == *me {
                            line.push_str(" (you)");
                        }
                        lines.push(line);
                    }
                    if room.is_host(*me) {
                        lines.push("`start` when everyone is here.".to_string());
                    } else {
                        lines.push("Waiting for the host to start...".to_string());
                    }
                }
                None => lines.push("Loading room...".to_string()),
            }
            lines
        }
        Screen::Round(round) => render_round(round),
    }
}

fn render_round(screen: &RoundScreen<'_>) -> Vec<String> {
    match screen {
        RoundScreen::Loading { code } => vec![format!("Room {}", code), "Loading...".to_string()],
        RoundScreen::Waiting { prompt } => vec![
            "Waiting for round to begin...".to_string(),
            prompt
                .map(|prompt| format!("Last prompt: {}", prompt))
                .unwrap_or_default(),
        ],
        RoundScreen::PreCountdown { count, prompt } => vec![
            format!("Get ready: {}", count),
            format!("Draw: {}", prompt),
        ],
        RoundScreen::Drawing { prompt, remaining } => vec![
            format!("Draw: {}", prompt),
            format!("{}s left. `submit` when done.", remaining),
        ],
        RoundScreen::Submitting { prompt, error } => match error {
            Some(error) => vec![format!("Draw: {}", prompt), format!("Submit failed: {}", error)],
            None => vec![format!("Draw: {}", prompt), "Submitting...".to_string()],
        },
        RoundScreen::Results {
            prompt,
            rows,
            can_advance,
        } => {
            let mut lines = vec![format!("Results: {}", prompt)];
            for row in rows {
                let status = match row.status {
                    ScoreStatus::Pending => "waiting...".to_string(),
                    ScoreStatus::Scored { percent, .. } => format!("{}%", percent),
                };
                let host = if row.is_host { " (host)" } else { "" };
                lines.push(format!("  {}{}: {}", sanitize(row.nickname), host, status));
            }
            if *can_advance {
                lines.push("`next` to start the next round.".to_string());
            } else {
                lines.push("Waiting for the host...".to_string());
            }
            lines
        }
    }
}
