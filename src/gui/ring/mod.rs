pub mod anim;
pub mod cache;
pub mod model;
pub mod view;

pub use anim::{AnimationState, Sample, ScaleTargets};
pub use cache::AvatarCache;
pub use model::{AvatarItem, Point, RingGeometry, State};
pub use view::draw;

pub const CACHE_CAPACITY: usize = 8;
/// Diameter of a fully collapsed animatable item. Items at or below this
/// bound are not drawn.
pub const COLLAPSED_DIAMETER: f64 = 1.0;
pub const CENTER_AVATAR_DIVISOR: f64 = 6.0;
pub const STARTUP_SHOW_DELAY_MS: u64 = 300;
