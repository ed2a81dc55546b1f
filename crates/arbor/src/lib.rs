pub mod cli;
pub mod commands;
pub mod error;

pub use arbor_core::{context, conversation, preferences, session, store, utils};
