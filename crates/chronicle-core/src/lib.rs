//! Chronicle Core: event-sourcing abstractions.
//!
//! This crate defines events, the event codec, the aggregate root trait, the
//! event store contract and the generic aggregate repository. It contains no
//! storage engine code; backends live in `chronicle-event-store`.

pub mod aggregate;
pub mod bus;
pub mod clock;
pub mod codec;
pub mod error;
pub mod event;
pub mod repository;
