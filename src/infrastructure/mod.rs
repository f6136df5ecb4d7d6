pub mod api;
pub mod transport;
