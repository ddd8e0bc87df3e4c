//! Error types for GPU setup and cross-context import.

use thiserror::Error;

use tandem_core::ShareHandle;

use crate::context::DeviceId;

/// Startup failures. The caller aborts; nothing here is retried.
#[derive(Error, Debug)]
pub enum GpuError {
    #[error("No suitable GPU adapter found")]
    NoAdapter,
    #[error("Failed to request device: {0}")]
    RequestDevice(#[from] wgpu::RequestDeviceError),
    #[error("Surface error: {0}")]
    Surface(String),
    #[error("Failed to create resource: {0}")]
    ResourceCreation(String),
}

/// A consumer could not resolve a share handle into its own context.
///
/// Per-frame only: the frame is dropped and the handle retried next time.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ImportError {
    #[error("No exported surface for handle {0}")]
    UnknownHandle(ShareHandle),
    #[error("Surface {handle} is owned by device {owner}, not {requester}")]
    ForeignDevice {
        handle: ShareHandle,
        owner: DeviceId,
        requester: DeviceId,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = GpuError::ResourceCreation("pool texture 4096x4096".into());
        assert_eq!(err.to_string(), "Failed to create resource: pool texture 4096x4096");
        assert_eq!(GpuError::NoAdapter.to_string(), "No suitable GPU adapter found");
    }

    #[test]
    fn test_import_error_names_handle() {
        let handle = ShareHandle::new();
        let err = ImportError::UnknownHandle(handle);
        assert!(err.to_string().contains(&handle.to_string()));
    }
}
