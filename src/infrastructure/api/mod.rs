mod client;
mod fetchers;

pub use client::*;
pub use fetchers::*;
