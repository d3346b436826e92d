//! Error types for host operations

use thiserror::Error;

/// Errors reported by the host integration layer.
///
/// None of these are fatal to the automator: every caller logs the failure
/// and degrades the operation to a no-op.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HostError {
    /// A device name did not resolve (renamed, removed, or never existed)
    #[error("device not found: {name}")]
    DeviceNotFound { name: String },

    /// The host has no active scene to report
    #[error("host has no current scene")]
    NoCurrentScene,
}

impl HostError {
    pub fn device_not_found(name: impl Into<String>) -> Self {
        Self::DeviceNotFound { name: name.into() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = HostError::device_not_found("Mic/Aux");
        assert_eq!(err.to_string(), "device not found: Mic/Aux");
    }
}
