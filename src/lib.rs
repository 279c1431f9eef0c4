//! Gatehouse coordinates whitelist checks and human-reviewed membership
//! applications for a community directory.

pub mod config;
pub mod error;
pub mod telemetry;
pub mod workflows;
