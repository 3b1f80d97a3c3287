use crate::config::{AvatarConfig, Config, Ring, SizeClass, Tuning, Visibility};
use crate::gui::ring::anim::{AnimationState, ScaleTargets};
use crate::gui::ring::cache::AvatarCache;
use crate::gui::ring::CENTER_AVATAR_DIVISOR;
use derive_more::{AsRef, Deref, Display, From, Into};
use gdk_pixbuf::Pixbuf;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(
    Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Display, Deref, From, Into, AsRef,
)]
#[serde(transparent)]
pub struct AvatarId(String);

impl AvatarId {
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Clone)]
pub struct AvatarItem {
    pub id: AvatarId,
    pub source: PathBuf,
    pub ring: Ring,
    pub size: SizeClass,
    pub visibility: Visibility,
    /// Angular position on the ring before the global rotation angle is
    /// added. Always normalized to [0, 360).
    pub offset_deg: f64,
}

impl AvatarItem {
    pub fn from_config(cfg: &AvatarConfig) -> Self {
        Self {
            id: cfg.id.clone(),
            source: cfg.source.clone(),
            ring: cfg.ring,
            size: cfg.size,
            visibility: cfg.visibility,
            offset_deg: cfg.offset_angle.rem_euclid(360.0),
        }
    }
}

/// All radii and diameters derived from the widget's square side length.
/// Recomputed on every draw, never cached across resizes.
#[derive(Debug, Clone, Copy)]
pub struct RingGeometry {
    pub side: f64,
    pub stroke_width: f64,
    large_ratio: f64,
    small_ratio: f64,
}

impl RingGeometry {
    pub fn new(side: f64, tuning: &Tuning) -> Self {
        Self {
            side,
            stroke_width: tuning.stroke_width,
            large_ratio: tuning.large_ratio,
            small_ratio: tuning.small_ratio,
        }
    }

    pub fn center(&self) -> Point {
        Point::new(self.side / 2.0, self.side / 2.0)
    }

    pub fn outer_radius(&self) -> f64 {
        self.side / 2.0 - self.stroke_width
    }

    pub fn inner_radius(&self) -> f64 {
        self.outer_radius() - self.stroke_width - self.large_diameter()
    }

    pub fn large_diameter(&self) -> f64 {
        self.side * self.large_ratio
    }

    pub fn small_diameter(&self) -> f64 {
        self.side * self.small_ratio
    }

    pub fn center_avatar_radius(&self) -> f64 {
        (self.side - self.large_diameter()) / CENTER_AVATAR_DIVISOR
    }

    pub fn ring_radius(&self, ring: Ring) -> f64 {
        match ring {
            Ring::Inner => self.inner_radius(),
            Ring::Outer => self.outer_radius(),
        }
    }

    pub fn steady_diameter(&self, size: SizeClass) -> f64 {
        match size {
            SizeClass::Large => self.large_diameter(),
            SizeClass::Small => self.small_diameter(),
        }
    }

    pub fn scale_targets(&self) -> ScaleTargets {
        ScaleTargets {
            large: self.large_diameter(),
            small: self.small_diameter(),
        }
    }

    /// A degenerate geometry draws nothing. Covers non-positive sides and
    /// sides too small to fit both rings.
    pub fn is_degenerate(&self) -> bool {
        self.side <= 0.0 || self.inner_radius() <= self.stroke_width
    }

    pub fn item_center(&self, item: &AvatarItem, rotation_deg: f64) -> Point {
        let theta = (item.offset_deg + rotation_deg).to_radians();
        let radius = self.ring_radius(item.ring) - self.stroke_width;
        let c = self.center();
        Point::new(c.x + radius * theta.cos(), c.y + radius * theta.sin())
    }
}

pub enum OwnerSlot {
    Unset,
    Loading,
    Ready(Pixbuf),
    Failed,
}

pub struct State {
    pub items: Vec<AvatarItem>,
    pub tuning: Tuning,
    pub anim: AnimationState,
    pub cache: AvatarCache,
    pub owner: OwnerSlot,
    /// Frame-clock time of the latest tick, in microseconds. The draw
    /// routine samples animations at this instant.
    pub frame_time_us: i64,
    owner_generation: u64,
}

impl State {
    pub fn new(items: Vec<AvatarItem>, tuning: Tuning) -> Self {
        Self {
            items,
            anim: AnimationState::new(&tuning),
            tuning,
            cache: AvatarCache::new(),
            owner: OwnerSlot::Unset,
            frame_time_us: 0,
            owner_generation: 0,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.avatars.iter().map(AvatarItem::from_config).collect(),
            config.tuning,
        )
    }

    /// Replaces the item list and tuning. The image cache is kept; entries
    /// for removed items age out through normal LRU eviction.
    pub fn apply_config(&mut self, config: &Config) {
        self.items = config.avatars.iter().map(AvatarItem::from_config).collect();
        self.tuning = config.tuning;
        self.anim.retune(&config.tuning);
    }

    /// Marks the owner slot as loading and returns the generation the
    /// eventual completion must carry to be applied.
    pub fn begin_owner_load(&mut self) -> u64 {
        self.owner_generation += 1;
        self.owner = OwnerSlot::Loading;
        self.owner_generation
    }

    /// Releases any held owner image. Also invalidates in-flight loads.
    pub fn clear_owner(&mut self) {
        self.owner_generation += 1;
        self.owner = OwnerSlot::Unset;
    }

    /// Applies a finished owner load. Returns false when the result is
    /// stale, i.e. a newer source was set after this load started.
    pub fn complete_owner_load(&mut self, generation: u64, pixbuf: Option<Pixbuf>) -> bool {
        if generation != self.owner_generation {
            return false;
        }
        self.owner = match pixbuf {
            Some(p) => OwnerSlot::Ready(p),
            None => OwnerSlot::Failed,
        };
        true
    }

    pub fn release_images(&mut self) {
        self.cache.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn geometry(side: f64) -> RingGeometry {
        RingGeometry::new(side, &Tuning::default())
    }

    fn item(ring: Ring, offset_deg: f64) -> AvatarItem {
        AvatarItem {
            id: AvatarId::new("test"),
            source: PathBuf::from("/nonexistent/test.png"),
            ring,
            size: SizeClass::Large,
            visibility: Visibility::Animatable,
            offset_deg,
        }
    }

    #[test]
    fn test_radii_for_side_300() {
        let geom = geometry(300.0);
        assert!((geom.large_diameter() - 50.0).abs() < 1e-9);
        assert!((geom.small_diameter() - 37.5).abs() < 1e-9);
        assert!((geom.outer_radius() - 146.0).abs() < 1e-9);
        assert!((geom.inner_radius() - 92.0).abs() < 1e-9);
        assert!(geom.outer_radius() > geom.inner_radius());
        assert!(geom.inner_radius() > 0.0);
    }

    #[test]
    fn test_outer_item_position() {
        let geom = geometry(300.0);
        let item = item(Ring::Outer, 50.0);

        let pos = geom.item_center(&item, 0.0);
        let theta = 50.0_f64.to_radians();
        assert!((pos.x - (150.0 + 142.0 * theta.cos())).abs() < 1e-9);
        assert!((pos.y - (150.0 + 142.0 * theta.sin())).abs() < 1e-9);
    }

    #[test]
    fn test_inner_item_stays_on_circle() {
        let geom = geometry(300.0);
        let c = geom.center();

        for offset in [0.0, 45.0, 123.0, 359.0] {
            for rotation in [0.0, 17.0, 275.5] {
                let pos = geom.item_center(&item(Ring::Inner, offset), rotation);
                let dist = (pos.x - c.x).hypot(pos.y - c.y);
                assert!((dist - (geom.inner_radius() - geom.stroke_width)).abs() < 1e-9);
            }
        }
    }

    #[test]
    fn test_rotation_shifts_angle() {
        let geom = geometry(300.0);
        let pos = geom.item_center(&item(Ring::Outer, 0.0), 90.0);
        assert!((pos.x - 150.0).abs() < 1e-9);
        assert!((pos.y - 292.0).abs() < 1e-9);
    }

    #[test]
    fn test_degenerate_geometries() {
        assert!(geometry(0.0).is_degenerate());
        assert!(geometry(-5.0).is_degenerate());
        // Too small for both rings to fit inside the stroke.
        assert!(geometry(20.0).is_degenerate());
        assert!(!geometry(64.0).is_degenerate());
    }

    #[test]
    fn test_offset_angle_is_normalized() {
        let cfg = AvatarConfig {
            id: AvatarId::new("n"),
            source: PathBuf::from("/x.png"),
            ring: Ring::Outer,
            size: SizeClass::Small,
            visibility: Visibility::Animatable,
            offset_angle: -30.0,
        };
        assert!((AvatarItem::from_config(&cfg).offset_deg - 330.0).abs() < 1e-9);

        let wrapped = AvatarConfig {
            offset_angle: 725.0,
            ..cfg
        };
        assert!((AvatarItem::from_config(&wrapped).offset_deg - 5.0).abs() < 1e-9);
    }

    #[test]
    fn test_apply_config_keeps_cache() {
        let mut state = State::new(vec![item(Ring::Outer, 0.0)], Tuning::default());
        let steady = geometry(300.0).steady_diameter(SizeClass::Large);
        assert!(state.cache.get(&state.items[0].clone(), steady).is_some());
        assert_eq!(state.cache.len(), 1);

        state.apply_config(&Config::default());
        assert!(state.items.is_empty());
        assert_eq!(state.cache.len(), 1);
    }

    #[test]
    fn test_stale_owner_load_is_dropped() {
        let mut state = State::new(Vec::new(), Tuning::default());

        let first = state.begin_owner_load();
        let second = state.begin_owner_load();
        assert!(first < second);

        assert!(!state.complete_owner_load(first, None));
        assert!(matches!(state.owner, OwnerSlot::Loading));

        assert!(state.complete_owner_load(second, None));
        assert!(matches!(state.owner, OwnerSlot::Failed));
    }

    #[test]
    fn test_clear_owner_invalidates_inflight_load() {
        let mut state = State::new(Vec::new(), Tuning::default());

        let generation = state.begin_owner_load();
        state.clear_owner();

        assert!(!state.complete_owner_load(generation, None));
        assert!(matches!(state.owner, OwnerSlot::Unset));
    }
}
