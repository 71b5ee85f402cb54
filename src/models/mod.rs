pub mod calendar_event;
pub mod context;
pub mod credential;
pub mod email;
pub mod prompt;
pub mod weather;
