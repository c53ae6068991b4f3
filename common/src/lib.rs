pub mod constants;
pub mod net;
pub mod player;
pub mod protocol;
pub mod room;
pub mod text;
pub mod time;
