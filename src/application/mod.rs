//! Application layer: the approval ledger and the workflow that routes chat
//! events into conversations, directory commands and decisions.
//!
//! All collaborators are passed in explicitly as trait objects; nothing here is
//! global.

pub mod broadcast;
pub mod lanes;
pub mod ledger;
pub mod workflow;
