use std::time::Duration;

use tracing::debug;

use crate::{results::Scoreboard, submission::SubmissionTicket};
use common::{player::ConnectionId, protocol::ScoreEntry, text::display_prompt};

const TICK: Duration = Duration::from_secs(1);

/// Local drawing countdown, seeded from the server's duration. It runs in
/// whole-second ticks and reports expiry exactly once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Countdown {
    remaining: u32,
    elapsed: Duration,
    fired: bool,
}

impl Countdown {
    pub fn new(seconds: u32) -> Self {
        Self {
            remaining: seconds,
            elapsed: Duration::ZERO,
            fired: false,
        }
    }

    pub fn remaining(&self) -> u32 {
        self.remaining
    }

    /// Returns true on the call that brings the countdown to zero.
    pub fn advance(&mut self, duration: Duration) -> bool {
        if self.fired {
            return false;
        }

        self.elapsed += duration;
        while self.remaining > 0 && self.elapsed >= TICK {
            self.elapsed -= TICK;
            self.remaining -= 1;
        }

        if self.remaining == 0 {
            self.fired = true;
            return true;
        }
        false
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoundPhase {
    Idle,
    PreCountdown {
        count: u32,
        prompt: String,
    },
    Drawing {
        prompt: String,
        /// Advisory; the countdown is what drives auto-submit.
        deadline: Duration,
        countdown: Countdown,
    },
    Awaiting {
        prompt: String,
    },
    Results {
        prompt: String,
    },
}

/// What a claimed submission is for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Claim {
    pub round: u32,
    pub prompt: String,
}

/// Round phases for one room, plus the ticket and scores that belong to
/// the current round.
#[derive(Debug)]
pub struct RoundLifecycle {
    room_code: String,
    round: u32,
    /// Whether `round` has been used by a precountdown or start yet.
    opened: bool,
    phase: RoundPhase,
    ticket: SubmissionTicket,
    scoreboard: Scoreboard,
}

impl RoundLifecycle {
    pub fn new(room_code: &str) -> Self {
        Self {
            room_code: room_code.to_string(),
            round: 1,
            opened: false,
            phase: RoundPhase::Idle,
            ticket: SubmissionTicket::new(room_code, 1),
            scoreboard: Scoreboard::default(),
        }
    }

    /// Starts in `Awaiting`, for a client that lands on the results page
    /// directly.
    pub fn awaiting_results(room_code: &str, prompt: &str) -> Self {
        let mut lifecycle = Self::new(room_code);
        lifecycle.opened = true;
        lifecycle.phase = RoundPhase::Awaiting {
            prompt: display_prompt(prompt),
        };
        lifecycle
    }

    pub fn phase(&self) -> &RoundPhase {
        &self.phase
    }

    pub fn round(&self) -> u32 {
        self.round
    }

    pub fn ticket(&self) -> &SubmissionTicket {
        &self.ticket
    }

    pub fn scoreboard(&self) -> &Scoreboard {
        &self.scoreboard
    }

    /// When the current drawing phase ends, as time since the Unix epoch.
    pub fn deadline(&self) -> Option<Duration> {
        match &self.phase {
            RoundPhase::Drawing { deadline, .. } => Some(*deadline),
            _ => None,
        }
    }

    pub fn prompt(&self) -> Option<&str> {
        match &self.phase {
            RoundPhase::Idle => None,
            RoundPhase::PreCountdown { prompt, .. }
            | RoundPhase::Drawing { prompt, .. }
            | RoundPhase::Awaiting { prompt }
            | RoundPhase::Results { prompt } => Some(prompt),
        }
    }

    /// Counts are taken as sent; a precountdown outside `PreCountdown`
    /// opens a new round.
    pub fn on_precountdown(&mut self, count: u32, prompt: &str) {
        if !matches!(self.phase, RoundPhase::PreCountdown { .. }) {
            self.open_round();
        }
        self.phase = RoundPhase::PreCountdown {
            count,
            prompt: display_prompt(prompt),
        };
    }

    /// Enters `Drawing` with a fresh countdown. Coming from anything but
    /// `PreCountdown` this is a new round, so a repeated start fully resets.
    pub fn on_round_start(&mut self, duration: u32, prompt: &str) {
        if !matches!(self.phase, RoundPhase::PreCountdown { .. }) {
            self.open_round();
        }
        self.phase = RoundPhase::Drawing {
            prompt: display_prompt(prompt),
            deadline: common::time::now() + Duration::from_secs(u64::from(duration)),
            countdown: Countdown::new(duration),
        };
    }

    /// Advances the drawing countdown. Returns true when it just hit zero
    /// and the drawing should be submitted.
    pub fn tick(&mut self, duration: Duration) -> bool {
        match &mut self.phase {
            RoundPhase::Drawing { countdown, .. } => countdown.advance(duration),
            _ => false,
        }
    }

    /// Whether a submission may still be claimed this round.
    pub fn can_submit(&self) -> bool {
        matches!(self.phase, RoundPhase::Drawing { .. }) && !self.ticket.is_sent()
    }

    /// Consumes the ticket and moves to `Awaiting`. Only the first claim in
    /// a round succeeds.
    pub fn claim_submission(&mut self, connection_id: ConnectionId) -> Option<Claim> {
        if !self.can_submit() {
            return None;
        }

        let prompt = self.prompt().unwrap_or_default().to_string();
        self.ticket.mark_sent(connection_id);
        self.phase = RoundPhase::Awaiting {
            prompt: prompt.clone(),
        };

        Some(Claim {
            round: self.round,
            prompt,
        })
    }

    pub fn is_current(&self, round: u32) -> bool {
        round == self.round
    }

    fn enter_results(&mut self) {
        if let RoundPhase::Awaiting { prompt } = &self.phase {
            self.phase = RoundPhase::Results {
                prompt: prompt.clone(),
            };
        }
    }

    /// Scores are kept for the current round whatever the phase; the phase
    /// only moves to `Results` once this client is waiting on them.
    pub fn on_results(&mut self, scores: Vec<ScoreEntry>) {
        self.scoreboard.merge(scores);
        self.enter_results();
    }

    /// The host asked for another round; wait for the server to start it.
    pub fn prepare_next_round(&mut self) {
        self.leave_round();
    }

    /// The server announced the next round. Anything already counting down
    /// or drawing is left alone.
    pub fn on_next_round_started(&mut self) {
        if matches!(
            self.phase,
            RoundPhase::Awaiting { .. } | RoundPhase::Results { .. }
        ) {
            self.leave_round();
        }
    }

    /// Goes back to `Idle` with the next round number already reserved, so
    /// uploads still in flight for the finished round no longer count.
    fn leave_round(&mut self) {
        if self.opened {
            self.begin_round();
            self.opened = false;
        }
        self.phase = RoundPhase::Idle;
    }

    fn open_round(&mut self) {
        if self.opened {
            self.begin_round();
        }
        self.opened = true;
    }

    fn begin_round(&mut self) {
        self.round += 1;
        self.ticket = SubmissionTicket::new(&self.room_code, self.round);
        self.scoreboard.clear();
        debug!(room = %self.room_code, round = self.round, "new round");
    }
}
