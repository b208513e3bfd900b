//! HTTP control of a single GPIO-driven LED, with an optional public tunnel.

pub mod api;
pub mod config;
pub mod error;
pub mod gpio;
pub mod state;
pub mod tunnel;
