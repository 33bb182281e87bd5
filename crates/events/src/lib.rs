//! In-process session event bus.
//!
//! The network layer publishes here when it classifies a response as an
//! authentication failure; the session store subscribes and tears the
//! session down. This replaces the global ambient "unauthorized" signal of
//! a browser client with an explicit publish/subscribe channel.

pub mod bus;

pub use bus::{SessionBus, SessionEvent};
