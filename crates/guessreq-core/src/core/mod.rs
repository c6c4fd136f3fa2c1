//! Internal implementation modules for `guessreq-core`.

pub mod config;
pub mod effects;
pub mod guess;
pub mod history;
pub mod mapping;
pub mod net;
pub mod prompt;
pub mod registry;
pub mod tooling;
