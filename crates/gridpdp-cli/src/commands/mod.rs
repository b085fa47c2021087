//! CLI command implementations.

pub mod check;
pub mod config;
pub mod evaluate;
pub mod version;
