pub mod config;
pub mod logging;

pub mod browser;
pub mod cache;
pub mod error;
pub mod network;
pub mod pipeline;
pub mod playback;
pub mod resolver;

pub use error::ResolveError;
pub use resolver::{ChromeTokenResolver, MediaResolver, TokenResolution, TokenResolver};
