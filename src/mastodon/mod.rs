// Mastodon API module.
// Provides the client and types used to publish the map.

pub mod client;
pub mod endpoints;
pub mod types;

pub use client::MastodonClient;
pub use types::{ClientCredentials, Media};
