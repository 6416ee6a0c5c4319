//! Engine events.
//!
//! Payment outcomes are published to registered hooks. Operator alerts are the channel through which situations that
//! need a human (a payment against a closed group order, a failed consistency check) are surfaced.
mod channel;
mod event_types;
mod hooks;

pub use channel::{EventHandler, EventProducer, Handler};
pub use event_types::*;
pub use hooks::{EventHandlers, EventHooks, EventProducers, HookFuture};
