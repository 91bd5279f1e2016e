mod machine;
mod runner;
mod state;

#[cfg(test)]
mod tests;

pub use machine::{
    handle, Effect, Event, MSG_ALREADY_LOGGED_IN, MSG_EMPTY_KEY, MSG_EMPTY_TOPIC, MSG_INVALID_KEY,
    MSG_LOGGED_IN, MSG_LOGIN_FIRST, MSG_NOTHING_SAVED, MSG_NO_SELECTION,
};
pub use runner::{Outcome, Session};
pub use state::{Notice, NoticeLevel, SessionState, Workspace};
