//! Shared utilities

pub mod names;
pub mod rate_limit;
pub mod time;
