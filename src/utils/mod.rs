// Utils module - Utility functions

pub mod duration;
pub mod network;

pub use duration::{format_duration, parse_duration};
pub use network::Endpoint;
