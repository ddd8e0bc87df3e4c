//! Share registry — maps a [`ShareHandle`] to the exported resource.
//!
//! The owning context exports each pool texture under its handle; the
//! other context opens it by handle. A handle can only be opened from the
//! device that exported it: wgpu resources are device-bound, so a request
//! from any other device fails with [`ImportError::ForeignDevice`].
//!
//! ```text
//!  FrameBuffer ──export(h, tex)──► ShareRegistry ◄──open(h, dev)── ImportCache
//!       │                                                              │
//!       └──────────── revoke(h) on drop                                │
//!                                                       bind group per h
//! ```

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use tandem_core::ShareHandle;

use crate::context::DeviceId;
use crate::error::ImportError;

/// Registry of GPU textures shared between the two scenes.
pub type SharedTextures = Arc<ShareRegistry<Arc<wgpu::Texture>>>;

struct Export<R> {
    owner: DeviceId,
    resource: R,
}

/// Thread-safe handle → resource table.
pub struct ShareRegistry<R> {
    exports: Mutex<HashMap<ShareHandle, Export<R>>>,
}

impl<R: Clone> ShareRegistry<R> {
    pub fn new() -> Self {
        Self {
            exports: Mutex::new(HashMap::new()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<ShareHandle, Export<R>>> {
        self.exports.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Publish `resource` under `handle`.
    ///
    /// Returns `false` and keeps the existing export if `handle` is taken.
    pub fn export(&self, handle: ShareHandle, owner: DeviceId, resource: R) -> bool {
        let mut exports = self.lock();
        if let Some(existing) = exports.get(&handle) {
            log::warn!(
                "Share handle {handle} already exported by device {}; ignoring export from {owner}",
                existing.owner
            );
            return false;
        }
        exports.insert(handle, Export { owner, resource });
        log::debug!("Exported {handle} from device {owner}");
        true
    }

    /// Resolve `handle` for a context on `requester`.
    pub fn open(&self, handle: ShareHandle, requester: DeviceId) -> Result<R, ImportError> {
        let exports = self.lock();
        let export = exports
            .get(&handle)
            .ok_or(ImportError::UnknownHandle(handle))?;
        if export.owner != requester {
            return Err(ImportError::ForeignDevice {
                handle,
                owner: export.owner,
                requester,
            });
        }
        Ok(export.resource.clone())
    }

    /// Withdraw `handle`. Contexts that already opened it keep their copy.
    pub fn revoke(&self, handle: ShareHandle) -> Option<R> {
        let removed = self.lock().remove(&handle).map(|e| e.resource);
        if removed.is_some() {
            log::debug!("Revoked {handle}");
        }
        removed
    }

    pub fn contains(&self, handle: ShareHandle) -> bool {
        self.lock().contains_key(&handle)
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<R: Clone> Default for ShareRegistry<R> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn devices() -> (DeviceId, DeviceId) {
        (DeviceId::next(), DeviceId::next())
    }

    #[test]
    fn test_export_then_open() {
        let (dev, _) = devices();
        let reg = ShareRegistry::new();
        let h = ShareHandle::new();
        assert!(reg.export(h, dev, "texture-0"));
        assert_eq!(reg.open(h, dev), Ok("texture-0"));
        assert_eq!(reg.len(), 1);
    }

    #[test]
    fn test_open_unknown_handle() {
        let (dev, _) = devices();
        let reg: ShareRegistry<u32> = ShareRegistry::new();
        let h = ShareHandle::new();
        assert_eq!(reg.open(h, dev), Err(ImportError::UnknownHandle(h)));
    }

    #[test]
    fn test_open_from_foreign_device() {
        let (owner, other) = devices();
        let reg = ShareRegistry::new();
        let h = ShareHandle::new();
        reg.export(h, owner, 7u32);
        assert_eq!(
            reg.open(h, other),
            Err(ImportError::ForeignDevice {
                handle: h,
                owner,
                requester: other,
            })
        );
    }

    #[test]
    fn test_double_export_keeps_first() {
        let (dev, other) = devices();
        let reg = ShareRegistry::new();
        let h = ShareHandle::new();
        assert!(reg.export(h, dev, 1u32));
        assert!(!reg.export(h, other, 2u32));
        assert_eq!(reg.open(h, dev), Ok(1));
    }

    #[test]
    fn test_revoke() {
        let (dev, _) = devices();
        let reg = ShareRegistry::new();
        let h = ShareHandle::new();
        reg.export(h, dev, 1u32);
        assert_eq!(reg.revoke(h), Some(1));
        assert_eq!(reg.revoke(h), None);
        assert!(reg.is_empty());
        assert!(!reg.contains(h));
        assert_eq!(reg.open(h, dev), Err(ImportError::UnknownHandle(h)));
    }
}
