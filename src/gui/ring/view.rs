use crate::config::{SizeClass, Visibility};
use crate::gui::ring::anim::Sample;
use crate::gui::ring::cache::AvatarCache;
use crate::gui::ring::model::{AvatarItem, OwnerSlot, Point, RingGeometry, State};
use crate::gui::ring::COLLAPSED_DIAMETER;
use crate::gui::theme::ThemeColors;
use cairo::Context;
use gdk4::prelude::*;
use gdk_pixbuf::Pixbuf;
use std::f64::consts::PI;

/// Paints the whole widget into the given allocation. The drawing region is
/// the centered square of side `min(width, height)`; degenerate regions
/// paint nothing at all.
pub fn draw(
    cr: &Context,
    state: &mut State,
    width: i32,
    height: i32,
    colors: &ThemeColors,
) -> Result<(), cairo::Error> {
    let side = f64::from(width.min(height));
    let geom = RingGeometry::new(side, &state.tuning);
    if geom.is_degenerate() {
        return Ok(());
    }

    let sample = state.anim.sample(state.frame_time_us, geom.scale_targets());

    cr.save()?;
    cr.translate(
        (f64::from(width) - side) / 2.0,
        (f64::from(height) - side) / 2.0,
    );

    draw_rings(cr, &geom, colors)?;
    draw_owner(cr, &geom, &state.owner, colors)?;
    draw_items(cr, &geom, &state.items, &mut state.cache, &sample)?;

    cr.restore()
}

fn draw_rings(cr: &Context, geom: &RingGeometry, colors: &ThemeColors) -> Result<(), cairo::Error> {
    let (r, g, b, a) = colors.ring_stroke.into_components();
    cr.set_source_rgba(r, g, b, a);
    cr.set_line_width(geom.stroke_width);

    let c = geom.center();
    cr.arc(c.x, c.y, geom.outer_radius(), 0.0, 2.0 * PI);
    cr.stroke()?;
    cr.arc(c.x, c.y, geom.inner_radius(), 0.0, 2.0 * PI);
    cr.stroke()
}

fn draw_owner(
    cr: &Context,
    geom: &RingGeometry,
    owner: &OwnerSlot,
    colors: &ThemeColors,
) -> Result<(), cairo::Error> {
    let diameter = geom.center_avatar_radius() * 2.0;
    let center = geom.center();

    match owner {
        OwnerSlot::Ready(pixbuf) => draw_round_image(cr, pixbuf, center, diameter),
        OwnerSlot::Failed => {
            let (r, g, b, a) = colors.placeholder.into_components();
            cr.set_source_rgba(r, g, b, a);
            cr.arc(center.x, center.y, diameter / 2.0, 0.0, 2.0 * PI);
            cr.fill()
        }
        OwnerSlot::Unset | OwnerSlot::Loading => Ok(()),
    }
}

fn draw_items(
    cr: &Context,
    geom: &RingGeometry,
    items: &[AvatarItem],
    cache: &mut AvatarCache,
    sample: &Sample,
) -> Result<(), cairo::Error> {
    for item in items {
        let diameter = match item.visibility {
            Visibility::Pinned => geom.steady_diameter(item.size),
            Visibility::Animatable => match item.size {
                SizeClass::Large => sample.large,
                SizeClass::Small => sample.small,
            },
        };
        if diameter <= COLLAPSED_DIAMETER {
            continue;
        }

        let Some(pixbuf) = cache.get(item, geom.steady_diameter(item.size)) else {
            continue;
        };

        let center = geom.item_center(item, sample.rotation_deg);
        draw_round_image(cr, &pixbuf, center, diameter)?;
    }
    Ok(())
}

/// Paints a pixbuf clipped to a circle, scaled into the bounding box
/// centered on `center` with the given diameter.
fn draw_round_image(
    cr: &Context,
    pixbuf: &Pixbuf,
    center: Point,
    diameter: f64,
) -> Result<(), cairo::Error> {
    let largest_dim = pixbuf.width().max(pixbuf.height()).max(1);
    let scale = diameter / f64::from(largest_dim);

    cr.save()?;
    cr.arc(center.x, center.y, diameter / 2.0, 0.0, 2.0 * PI);
    cr.clip();
    cr.translate(center.x - diameter / 2.0, center.y - diameter / 2.0);
    cr.scale(scale, scale);
    cr.set_source_pixbuf(pixbuf, 0.0, 0.0);
    cr.paint()?;
    cr.restore()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Ring, SizeClass, Tuning};
    use crate::gui::ring::model::AvatarId;
    use cairo::{Format, ImageSurface};
    use palette::Srgba;
    use std::path::PathBuf;

    fn colors() -> ThemeColors {
        ThemeColors {
            ring_stroke: Srgba::new(0.2, 0.2, 0.2, 1.0),
            placeholder: Srgba::new(0.5, 0.5, 0.5, 1.0),
        }
    }

    fn state_with_items() -> State {
        let items = vec![
            AvatarItem {
                id: AvatarId::new("pinned"),
                source: PathBuf::from("/nonexistent/pinned.png"),
                ring: Ring::Inner,
                size: SizeClass::Small,
                visibility: Visibility::Pinned,
                offset_deg: 10.0,
            },
            AvatarItem {
                id: AvatarId::new("animated"),
                source: PathBuf::from("/nonexistent/animated.png"),
                ring: Ring::Outer,
                size: SizeClass::Large,
                visibility: Visibility::Animatable,
                offset_deg: 200.0,
            },
        ];
        State::new(items, Tuning::default())
    }

    fn rendered_bytes(state: &mut State, width: i32, height: i32) -> Vec<u8> {
        let surface = ImageSurface::create(Format::ARgb32, 128, 128).unwrap();
        {
            let cr = Context::new(&surface).unwrap();
            draw(&cr, state, width, height, &colors()).unwrap();
        }
        let mut surface = surface;
        surface.data().unwrap().to_vec()
    }

    #[test]
    fn test_degenerate_allocation_paints_nothing() {
        let mut state = state_with_items();

        for (w, h) in [(0, 128), (128, 0), (-4, 128), (10, 10)] {
            let bytes = rendered_bytes(&mut state, w, h);
            assert!(bytes.iter().all(|b| *b == 0), "painted at {w}x{h}");
        }
        // Nothing was loaded into the cache either.
        assert!(state.cache.is_empty());
    }

    #[test]
    fn test_valid_allocation_paints_rings() {
        let mut state = state_with_items();
        let bytes = rendered_bytes(&mut state, 128, 128);
        assert!(bytes.iter().any(|b| *b != 0));
        // The pinned item was rendered and cached; the collapsed animatable
        // one was skipped.
        assert_eq!(state.cache.len(), 1);
    }

    #[test]
    fn test_shown_items_enter_the_cache() {
        let mut state = state_with_items();
        state.anim.play_show(0);
        state.frame_time_us = 400_000;

        let _ = rendered_bytes(&mut state, 128, 128);
        assert_eq!(state.cache.len(), 2);
    }
}
