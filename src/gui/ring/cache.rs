use crate::config::{Ring, SizeClass};
use crate::gui::ring::model::{AvatarId, AvatarItem};
use crate::gui::ring::CACHE_CAPACITY;
use gdk_pixbuf::{Colorspace, Pixbuf};
use log::{debug, warn};
use lru::LruCache;
use std::num::NonZeroUsize;
use std::path::Path;

/// Composite cache key. Keying on size class and ring alongside the item
/// identity means a reconfigured item selects a fresh slot instead of being
/// served an image scaled for its old placement.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub id: AvatarId,
    pub size: SizeClass,
    pub ring: Ring,
}

impl CacheKey {
    fn for_item(item: &AvatarItem) -> Self {
        Self {
            id: item.id.clone(),
            size: item.size,
            ring: item.ring,
        }
    }
}

/// Bounded cache of pre-scaled avatar images, least-recently-used eviction.
///
/// Entries are `Pixbuf` handles, so the clone handed to an in-flight draw
/// keeps the pixel storage alive even if the entry is evicted before the
/// frame finishes; dropping the last handle releases it.
pub struct AvatarCache {
    entries: LruCache<CacheKey, Pixbuf>,
}

impl AvatarCache {
    pub fn new() -> Self {
        Self {
            entries: LruCache::new(NonZeroUsize::new(CACHE_CAPACITY).unwrap_or(NonZeroUsize::MIN)),
        }
    }

    /// Returns the pre-scaled image for `item`, loading it on first use.
    /// `diameter` is the item's steady diameter in pixels; non-positive
    /// diameters never reach the scaler. A source that fails to load is
    /// cached as a placeholder disc so it is not re-read every frame.
    pub fn get(&mut self, item: &AvatarItem, diameter: f64) -> Option<Pixbuf> {
        if diameter < 1.0 {
            return None;
        }

        let key = CacheKey::for_item(item);
        if let Some(pixbuf) = self.entries.get(&key) {
            return Some(pixbuf.clone());
        }

        let px = diameter.round() as i32;
        let pixbuf = load_scaled(&item.source, px).or_else(|| placeholder(px))?;

        if let Some((evicted, _)) = self.entries.push(key, pixbuf.clone()) {
            debug!("Evicted cached avatar image for '{}'", evicted.id);
        }

        Some(pixbuf)
    }

    pub fn contains(&self, item: &AvatarItem) -> bool {
        self.entries.peek(&CacheKey::for_item(item)).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

impl Default for AvatarCache {
    fn default() -> Self {
        Self::new()
    }
}

fn load_scaled(source: &Path, px: i32) -> Option<Pixbuf> {
    Pixbuf::from_file_at_scale(source, px, px, true)
        .map_err(|e| warn!("Failed to load avatar image {}: {}", source.display(), e))
        .ok()
}

/// Flat disc stand-in for an image that could not be loaded. Drawn through
/// the same circular clip as real avatars.
fn placeholder(px: i32) -> Option<Pixbuf> {
    let pixbuf = Pixbuf::new(Colorspace::Rgb, true, 8, px, px)?;
    pixbuf.fill(0x9aa0a6ff);
    Some(pixbuf)
}
