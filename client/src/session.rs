use crate::{
    identity::Identity, room::LobbyRooms, state::ClientState, submission::SubmissionPipeline,
};

pub struct ClientSession {
    pub identity: Identity,
    pub state: ClientState,
    pub lobby_rooms: LobbyRooms,
    pub pipeline: SubmissionPipeline,
}

impl ClientSession {
    pub fn new(identity: Identity, pipeline: SubmissionPipeline) -> Self {
        Self {
            identity,
            state: ClientState::Connecting,
            lobby_rooms: LobbyRooms::default(),
            pipeline,
        }
    }

    pub fn state(&self) -> &ClientState {
        &self.state
    }

    pub fn transition(&mut self, new_state: ClientState) {
        self.state = new_state;
    }
}
