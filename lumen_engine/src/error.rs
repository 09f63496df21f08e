//! Error types for the Lumen engine
//!
//! Every GPU, asset and lifecycle failure is funneled into [`Error`].
//! Recoverable per-frame conditions (out-of-date swapchain, unresolved mesh)
//! are modeled as outcomes instead and never surface here.

use std::fmt;

/// Result type for Lumen engine operations
pub type Result<T> = std::result::Result<T, Error>;

/// Lumen engine errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Backend-specific error (carries the API result code in the message)
    BackendError(String),

    /// Out of GPU memory
    OutOfMemory,

    /// Invalid resource (buffer, texture, shader, mesh association, etc.)
    InvalidResource(String),

    /// Initialization failed (instance, device, swapchain, subsystems)
    InitializationFailed(String),

    /// No physical device satisfied the hard requirements
    NoSuitableDevice(String),

    /// A required shader or texture asset was not provided
    AssetMissing(String),

    /// The device was lost or a fence wait did not complete
    DeviceLost(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::BackendError(msg) => write!(f, "Backend error: {}", msg),
            Error::OutOfMemory => write!(f, "Out of GPU memory"),
            Error::InvalidResource(msg) => write!(f, "Invalid resource: {}", msg),
            Error::InitializationFailed(msg) => write!(f, "Initialization failed: {}", msg),
            Error::NoSuitableDevice(msg) => write!(f, "No suitable device: {}", msg),
            Error::AssetMissing(name) => write!(f, "Required asset missing: {}", name),
            Error::DeviceLost(msg) => write!(f, "Device lost: {}", msg),
        }
    }
}

impl std::error::Error for Error {}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
