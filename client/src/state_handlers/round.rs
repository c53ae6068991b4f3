use std::time::Duration;

use tracing::{debug, info, trace, warn};

use super::{Navigation, room_closed, room_data_result};
use crate::{
    error::{EventError, UploadError},
    net::EventChannel,
    results::can_advance,
    room::RoomStore,
    round::{RoundLifecycle, RoundPhase},
    session::ClientSession,
    state::{RoundPage, RoundView},
    submission::{UploadOutcome, prepare_request},
    ui::{ClientUi, Route, RoundScreen, UserAction},
};
use common::{
    player::ConnectionId,
    protocol::{ClientMessage, EventKind, ServerMessage},
    room::RoomSnapshot,
};

const ROUND_EVENTS: [EventKind; 6] = [
    EventKind::RoomData,
    EventKind::RoomClosed,
    EventKind::RoundPreCountdown,
    EventKind::RoundStart,
    EventKind::RoundResults,
    EventKind::NextRoundStarted,
];

/// Opens the canvas page. Without a snapshot the room is fetched first.
pub fn mount_canvas(
    code: String,
    room: Option<RoomSnapshot>,
    channel: &mut EventChannel,
) -> RoundView {
    let events = channel.on(&ROUND_EVENTS);
    let store = RoomStore::with_snapshot(code, room);
    if store.state().is_none() {
        store.request_room_data(channel);
    }

    RoundView {
        lifecycle: RoundLifecycle::new(store.code()),
        store,
        page: RoundPage::Canvas,
        upload_error: None,
        _events: events,
    }
}

/// Opens the results page directly. The roster is always fetched fresh.
pub fn mount_results(code: String, prompt: &str, channel: &mut EventChannel) -> RoundView {
    let events = channel.on(&ROUND_EVENTS);
    let store = RoomStore::new(code);
    store.request_room_data(channel);

    RoundView {
        lifecycle: RoundLifecycle::awaiting_results(store.code(), prompt),
        store,
        page: RoundPage::Results,
        upload_error: None,
        _events: events,
    }
}

pub fn handle_event(
    view: &mut RoundView,
    session: &mut ClientSession,
    ui: &mut dyn ClientUi,
    _channel: &mut EventChannel,
    message: ServerMessage,
) -> Option<Navigation> {
    match message {
        ServerMessage::RoomData(data) => room_data_result(view.store.apply(data)),
        ServerMessage::RoomClosed { room_code } => room_closed(view.store.code(), &room_code),
        ServerMessage::RoundPreCountdown { count, prompt } => {
            view.lifecycle.on_precountdown(count, &prompt);
            show_canvas(view, ui);
            None
        }
        ServerMessage::RoundStart { duration, prompt } => {
            view.lifecycle.on_round_start(duration, &prompt);
            session.pipeline.surface.clear();
            view.upload_error = None;
            show_canvas(view, ui);
            info!(
                room = %view.store.code(),
                round = view.lifecycle.round(),
                duration,
                deadline = view.lifecycle.deadline().map(|d| d.as_secs()),
                "round started"
            );
            None
        }
        ServerMessage::RoundResults { scores } => {
            debug!(count = scores.len(), "scores received");
            view.lifecycle.on_results(scores);
            None
        }
        ServerMessage::NextRoundStarted { room_code, room } => {
            if room_code != view.store.code() {
                let error = EventError::missing(
                    EventKind::NextRoundStarted,
                    format!("next round in room {} while in {}", room_code, view.store.code()),
                );
                warn!("{}", error);
                return None;
            }
            if room.is_some() {
                if let Err(e) = view.store.apply(room) {
                    warn!("{}", e);
                }
            }
            view.lifecycle.on_next_round_started();
            show_canvas(view, ui);
            None
        }
        other => {
            trace!(event = %other.kind(), "round view ignores event");
            None
        }
    }
}

pub fn handle_action(
    view: &mut RoundView,
    session: &mut ClientSession,
    ui: &mut dyn ClientUi,
    channel: &mut EventChannel,
    action: UserAction,
) -> Option<Navigation> {
    match action {
        UserAction::SubmitDrawing => {
            submit(view, session, ui, channel);
            None
        }
        UserAction::NextRound => {
            next_round(view, ui, channel);
            None
        }
        UserAction::QuitRoom => {
            channel.emit(ClientMessage::QuitRoom {
                room_code: view.store.code().to_string(),
            });
            Some(Navigation::to(Route::Lobby))
        }
        _ => {
            ui.show_error("Not available during a round. `submit`, `next` or `quit`.");
            None
        }
    }
}

/// Advances the drawing countdown; at zero the drawing is submitted the
/// same way the submit command does it.
pub fn tick(
    view: &mut RoundView,
    session: &mut ClientSession,
    ui: &mut dyn ClientUi,
    channel: &mut EventChannel,
    duration: Duration,
) {
    if view.lifecycle.tick(duration) {
        info!(round = view.lifecycle.round(), "time is up, submitting drawing");
        submit(view, session, ui, channel);
    }
}

/// Sends this round's drawing, at most once per round.
pub fn submit(
    view: &mut RoundView,
    session: &mut ClientSession,
    ui: &mut dyn ClientUi,
    channel: &mut EventChannel,
) {
    if view.lifecycle.ticket().is_sent() {
        debug!(round = view.lifecycle.round(), "drawing already submitted");
        return;
    }
    if !view.lifecycle.can_submit() {
        report(
            view,
            ui,
            UploadError::InvalidState("no drawing round in progress".to_string()),
        );
        return;
    }

    let request = match prepare_request(
        view.lifecycle.ticket(),
        session.identity.connection_id(channel),
        session.identity.token(),
        session.identity.nickname(),
        session.pipeline.surface.as_ref(),
    ) {
        Ok(request) => request,
        Err(e) => {
            report(view, ui, e);
            return;
        }
    };

    let Some(claim) = view.lifecycle.claim_submission(request.socket_id) else {
        return;
    };

    info!(round = claim.round, prompt = %claim.prompt, "submitting drawing");
    view.upload_error = None;
    session.pipeline.uploader.start(request);
}

/// Applies a finished upload, unless it belongs to an earlier round.
pub fn finish_upload(
    view: &mut RoundView,
    ui: &mut dyn ClientUi,
    channel: &mut EventChannel,
    outcome: UploadOutcome,
) {
    if !view.lifecycle.is_current(outcome.round) {
        info!(
            round = outcome.round,
            current = view.lifecycle.round(),
            "dropping upload result from an earlier round"
        );
        return;
    }

    match outcome.result {
        Ok(ack) => {
            debug!(ack = %ack.0, "upload acknowledged");
            let prompt = view.lifecycle.prompt().unwrap_or_default().to_string();
            view.page = RoundPage::Results;
            ui.navigate(&Route::Results {
                code: view.store.code().to_string(),
                prompt,
            });
            view.store.request_room_data(channel);
        }
        Err(e) => report(view, ui, e),
    }
}

fn next_round(view: &mut RoundView, ui: &mut dyn ClientUi, channel: &mut EventChannel) {
    if view.page != RoundPage::Results {
        ui.show_error("The next round can start once results are in.");
        return;
    }

    let me = channel.connection_id();
    if !view.store.state().is_some_and(|room| can_advance(room, me)) {
        ui.show_error("Only the host can start the next round.");
        return;
    }

    channel.emit(ClientMessage::NextRound {
        room_code: view.store.code().to_string(),
    });
    view.lifecycle.prepare_next_round();
    show_canvas(view, ui);
}

fn show_canvas(view: &mut RoundView, ui: &mut dyn ClientUi) {
    if view.page != RoundPage::Canvas {
        view.page = RoundPage::Canvas;
        ui.navigate(&Route::Canvas {
            code: view.store.code().to_string(),
        });
    }
}

fn report(view: &mut RoundView, ui: &mut dyn ClientUi, error: UploadError) {
    warn!("{}", error);
    let message = error.to_string();
    ui.show_sanitized_error(&message);
    view.upload_error = Some(message);
}

/// What the round view shows this frame.
pub fn screen(view: &RoundView, me: Option<ConnectionId>) -> RoundScreen<'_> {
    let code = view.store.code();
    match (view.page, view.lifecycle.phase()) {
        (_, RoundPhase::Idle) => match view.store.state() {
            Some(_) => RoundScreen::Waiting {
                prompt: view.lifecycle.prompt(),
            },
            None => RoundScreen::Loading { code },
        },
        (_, RoundPhase::PreCountdown { count, prompt }) => RoundScreen::PreCountdown {
            count: *count,
            prompt,
        },
        (_, RoundPhase::Drawing {
            prompt, countdown, ..
        }) => RoundScreen::Drawing {
            prompt,
            remaining: countdown.remaining(),
        },
        (RoundPage::Canvas, RoundPhase::Awaiting { prompt }) => RoundScreen::Submitting {
            prompt,
            error: view.upload_error.as_deref(),
        },
        (RoundPage::Results, RoundPhase::Awaiting { prompt }) | (_, RoundPhase::Results { prompt }) => {
            match view.store.state() {
                Some(room) => RoundScreen::Results {
                    prompt,
                    rows: view.lifecycle.scoreboard().rows(room),
                    can_advance: can_advance(room, me),
                },
                None => RoundScreen::Loading { code },
            }
        }
    }
}
