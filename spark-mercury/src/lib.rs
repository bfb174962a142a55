//! Client for the Mercury real-time event service.
//!
//! Events are delivered over channels: call [`MercuryClient::subscribe`] with
//! an event name and read from the returned [`Subscription`].

mod client;
mod config;
mod envelope;
mod error;
mod event;
mod router;

pub use client::*;
pub use config::*;
pub use error::*;
pub use event::*;
pub use router::*;
