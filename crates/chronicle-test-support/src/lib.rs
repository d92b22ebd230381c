//! Shared test doubles, fixtures and a sample aggregate for Chronicle.

mod bus;
mod clock;
pub mod counter;
pub mod fixtures;
mod store;

pub use bus::{FailingEventBus, RecordingEventBus};
pub use clock::{FixedClock, fixed_time};
pub use counter::{Counter, CounterEvent, counter_codec};
pub use store::{FailingEventStore, RecordingEventStore};
