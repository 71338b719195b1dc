//! HTTP surface of the agent

mod handler;
mod listener;

pub use handler::router;
pub use listener::PingerServer;
