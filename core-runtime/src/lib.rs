//! # Core Runtime Module
//!
//! Foundational runtime infrastructure for the player core:
//! - Synchronous event bus with an async mirror stream
//! - Logging and tracing setup
//!
//! ## Overview
//!
//! Nothing in here knows about tracks or transports. The playback crate
//! defines its own event vocabulary and plugs it into [`events::EventBus`].

pub mod error;
pub mod events;
pub mod logging;

pub use error::{Error, Result};
pub use events::{BusEvent, DispatchPolicy, EventBus, EventStream, Handler, SubscriptionId};
