//! Error types for Notch Capsule.
//!
//! This module provides the crate-wide error type returned by CLI commands and
//! platform commands. Component-level errors (`PlatformError`, `ActorError`,
//! `ConfigError`) live next to the code that produces them and convert into
//! [`CapsuleError`] at the outer surfaces.

use serde::Serialize;
use thiserror::Error;

use crate::capsule::ActorError;
use crate::config::ConfigError;
use crate::platform::PlatformError;

/// Errors that can occur during application execution.
///
/// Serialized with a `kind` tag so the frontend receives structured error
/// information instead of a bare string.
#[derive(Debug, Error, Serialize)]
#[serde(tag = "kind", content = "message")]
pub enum CapsuleError {
    /// Invalid command arguments.
    #[error("{0}")]
    InvalidArguments(String),
    /// Configuration error.
    #[error("Configuration error: {0}")]
    ConfigError(String),
    /// A window or native-layer call failed.
    #[error("Platform error: {0}")]
    PlatformError(String),
    /// The expansion controller is not reachable.
    #[error("Controller error: {0}")]
    ActorError(String),
    /// IO error.
    #[error("IO error: {0}")]
    IoError(String),
    /// Generic command error.
    #[error("{0}")]
    CommandError(String),
}

impl From<std::io::Error> for CapsuleError {
    fn from(err: std::io::Error) -> Self { Self::IoError(err.to_string()) }
}

impl From<serde_json::Error> for CapsuleError {
    fn from(err: serde_json::Error) -> Self { Self::CommandError(err.to_string()) }
}

impl From<ConfigError> for CapsuleError {
    fn from(err: ConfigError) -> Self { Self::ConfigError(err.to_string()) }
}

impl From<PlatformError> for CapsuleError {
    fn from(err: PlatformError) -> Self { Self::PlatformError(err.to_string()) }
}

impl From<ActorError> for CapsuleError {
    fn from(err: ActorError) -> Self { Self::ActorError(err.to_string()) }
}

impl From<String> for CapsuleError {
    fn from(msg: String) -> Self { Self::CommandError(msg) }
}

impl From<&str> for CapsuleError {
    fn from(msg: &str) -> Self { Self::CommandError(msg.to_string()) }
}
