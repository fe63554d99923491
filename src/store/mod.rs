//! Durable state is organized through [json_store::JsonStore].
//! The basic idea is:
//!  - There is a state directory with one JSON file per slot.
//!  - Each slot is read and written as a whole unit, there is no partial
//!    persistence and no coupling between slots.
//!  - A slot that can't be read falls back to its default value: the store
//!    prefers availability over strict durability.

pub mod entities;
pub mod json_store;
pub mod watch;

pub use json_store::{JsonStore, StateStore};

/// One of the four durable slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Slot {
    Sessions,
    CurrentSession,
    Intentions,
    Settings,
}

impl Slot {
    pub const ALL: [Slot; 4] = [
        Slot::Sessions,
        Slot::CurrentSession,
        Slot::Intentions,
        Slot::Settings,
    ];

    pub fn file_name(self) -> &'static str {
        match self {
            Slot::Sessions => "sessions.json",
            Slot::CurrentSession => "current-session.json",
            Slot::Intentions => "intentions.json",
            Slot::Settings => "settings.json",
        }
    }

    pub(crate) fn from_file_name(name: &str) -> Option<Slot> {
        Slot::ALL.into_iter().find(|slot| slot.file_name() == name)
    }
}
