//! Utility functions and types.
//!
//! This module provides logging and configuration utilities used throughout
//! the system.

pub mod config;
pub mod logging;

pub use config::{WardenConfig, WorldConfig};
pub use logging::LogLevel;
