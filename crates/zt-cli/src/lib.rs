//! CLI library components for the schema playground.

#![warn(clippy::all)]

pub mod logging;
pub mod settings;
