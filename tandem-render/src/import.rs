//! Consumer-side import cache.
//!
//! The first time a consumer sees a share handle it imports the surface
//! into its own context and keeps the resulting binding; every later frame
//! reuses it. Failed imports are not cached, so a handle exported late is
//! picked up on the next frame, but each failing handle is logged once.

use std::collections::{HashMap, HashSet};

use tandem_core::ShareHandle;

use crate::error::ImportError;

/// Lazily populated `ShareHandle → binding` map.
#[derive(Debug)]
pub struct ImportCache<B> {
    bindings: HashMap<ShareHandle, B>,
    reported: HashSet<ShareHandle>,
    imports: u64,
}

impl<B> ImportCache<B> {
    pub fn new() -> Self {
        Self {
            bindings: HashMap::new(),
            reported: HashSet::new(),
            imports: 0,
        }
    }

    /// Cached binding for `handle`, importing it with `import` on a miss.
    ///
    /// `None` means the import failed; the caller drops the frame.
    pub fn resolve_with<F>(&mut self, handle: ShareHandle, import: F) -> Option<&B>
    where
        F: FnOnce(ShareHandle) -> Result<B, ImportError>,
    {
        if !self.bindings.contains_key(&handle) {
            match import(handle) {
                Ok(binding) => {
                    self.imports += 1;
                    self.reported.remove(&handle);
                    log::debug!("Imported {handle}");
                    self.bindings.insert(handle, binding);
                }
                Err(e) => {
                    if self.reported.insert(handle) {
                        log::warn!("Import failed, dropping frame: {e}");
                    }
                    return None;
                }
            }
        }
        self.bindings.get(&handle)
    }

    /// Cached binding without importing.
    pub fn get(&self, handle: ShareHandle) -> Option<&B> {
        self.bindings.get(&handle)
    }

    /// Forget one binding, e.g. after its surface was revoked.
    pub fn evict(&mut self, handle: ShareHandle) -> Option<B> {
        self.bindings.remove(&handle)
    }

    /// Number of successful imports since creation.
    pub fn import_count(&self) -> u64 {
        self.imports
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    pub fn clear(&mut self) {
        self.bindings.clear();
        self.reported.clear();
    }
}

impl<B> Default for ImportCache<B> {
    fn default() -> Self {
        Self::new()
    }
}
