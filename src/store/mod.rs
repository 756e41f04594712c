//! Persistence collaborators

pub mod journal;

pub use journal::{JournalEntry, JournalHandle};
