//! Chronicle Todo: a sample bounded context.
//!
//! To-do items are event-sourced aggregates persisted through the generic
//! `AggregateRepository`. The application layer holds the command and query
//! handlers the HTTP surface calls.

pub mod application;
pub mod domain;
