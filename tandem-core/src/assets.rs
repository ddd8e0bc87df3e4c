//! Asset provider contract.
//!
//! Asset generation (meters, checkerboards, font atlases) happens outside
//! this crate. Scenes only locate named assets and load decoded images.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// A decoded image: premultiplied BGRA, `stride` bytes per row.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Image {
    pub width: u32,
    pub height: u32,
    pub stride: u32,
    pub data: Arc<[u8]>,
}

impl Image {
    /// Tightly packed image (`stride = width * 4`).
    ///
    /// Returns `None` when `data` does not hold exactly `width * height`
    /// pixels.
    pub fn packed(width: u32, height: u32, data: Vec<u8>) -> Option<Self> {
        let stride = width.checked_mul(4)?;
        let expected = (stride as usize).checked_mul(height as usize)?;
        if data.len() != expected {
            return None;
        }
        Some(Self {
            width,
            height,
            stride,
            data: data.into(),
        })
    }

    /// Bytes of row `y`, excluding stride padding.
    pub fn row(&self, y: u32) -> Option<&[u8]> {
        if y >= self.height {
            return None;
        }
        let start = y as usize * self.stride as usize;
        self.data.get(start..start + self.width as usize * 4)
    }
}

/// Source of named assets.
pub trait AssetProvider: Send + Sync {
    fn locate(&self, name: &str) -> Option<PathBuf>;
    fn load_image(&self, path: &Path) -> Option<Image>;
}

/// Assets held in memory under a virtual root.
#[derive(Debug, Default)]
pub struct MemoryAssets {
    root: PathBuf,
    images: HashMap<PathBuf, Image>,
}

impl MemoryAssets {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            images: HashMap::new(),
        }
    }

    pub fn insert(&mut self, name: &str, image: Image) {
        self.images.insert(self.root.join(name), image);
    }
}

impl AssetProvider for MemoryAssets {
    fn locate(&self, name: &str) -> Option<PathBuf> {
        let path = self.root.join(name);
        self.images.contains_key(&path).then_some(path)
    }

    fn load_image(&self, path: &Path) -> Option<Image> {
        self.images.get(path).cloned()
    }
}
