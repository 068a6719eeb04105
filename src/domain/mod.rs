//! Domain types and rules. Nothing in here performs I/O; collaborators are
//! reached through the traits in [`ports`].

pub mod conversation;
pub mod directory;
pub mod event;
pub mod message;
pub mod ports;
pub mod record;
