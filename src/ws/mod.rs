//! WebSocket endpoints: session relay and hosted matches

pub mod handler;
pub mod protocol;
pub mod relay;
pub mod solo;
