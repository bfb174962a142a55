mod avatar_url;
mod batcher;
mod client;
mod config;
mod error;
mod models;
mod size;
pub mod transport;

pub(crate) use avatar_url::*;

pub use client::*;
pub use config::*;
pub use error::*;
pub use models::*;
pub use size::resolve_nearest;
pub use transport::{AvatarTransport, HttpAvatarTransport};
