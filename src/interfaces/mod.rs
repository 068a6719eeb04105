//! Outer adapters that talk to the chat network.

pub mod telegram;
