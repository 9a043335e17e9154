//! Marketplace events.
//!
//! The engine APIs publish an event whenever something a user should hear about happens (an order is placed,
//! confirmed or shipped, or a payment changes). Subscribers register async hooks via [`EventHooks`]; see
//! [`crate::notifier`] for the hooks that turn events into notifications and emails.
mod channel;
mod event_types;
mod hooks;

pub use channel::{EventHandler, EventProducer, Handler};
pub use event_types::*;
pub use hooks::{EventHandlers, EventHooks, EventProducers};
