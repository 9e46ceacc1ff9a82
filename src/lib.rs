//! Stabler: moves a BlueOS deployment onto known-good stable releases.
//!
//! - [`release`]: catalog, compatibility filter and install workflow
//! - [`server`]: HTTP routes and background catalog refresh
//! - [`config`]: service configuration
//! - [`logging`]: tracing subscriber setup

pub mod config;
pub mod logging;
pub mod release;
pub mod server;
