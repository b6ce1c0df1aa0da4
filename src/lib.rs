//! Pixel Royale backend: top-down battle royale simulation, session service and realtime relay

pub mod app;
pub mod config;
pub mod game;
pub mod gateway;
pub mod http;
pub mod store;
pub mod util;
pub mod ws;
