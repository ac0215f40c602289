//! CLI command implementations

pub mod rate;
pub mod serve;
pub mod setup;
