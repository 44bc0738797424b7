use eframe::egui::{Color32, Painter, Pos2, Rect, Stroke};

use crate::geo::WorldPos;

pub(super) fn blend_color(base: Color32, overlay: Color32, amount: f32) -> Color32 {
    let amount = amount.clamp(0.0, 1.0);
    let inverse = 1.0 - amount;

    Color32::from_rgba_unmultiplied(
        ((base.r() as f32 * inverse) + (overlay.r() as f32 * amount)) as u8,
        ((base.g() as f32 * inverse) + (overlay.g() as f32 * amount)) as u8,
        ((base.b() as f32 * inverse) + (overlay.b() as f32 * amount)) as u8,
        ((base.a() as f32 * inverse) + (overlay.a() as f32 * amount)) as u8,
    )
}

pub(super) fn dim_color(color: Color32, factor: f32) -> Color32 {
    let factor = factor.clamp(0.0, 1.0);
    Color32::from_rgba_unmultiplied(
        (color.r() as f32 * factor) as u8,
        (color.g() as f32 * factor) as u8,
        (color.b() as f32 * factor) as u8,
        (color.a() as f32 * (0.45 + (factor * 0.55))) as u8,
    )
}

/// Dark canvas plus a graticule aligned to round projected-meter steps, so
/// the grid pans and zooms with the map instead of floating over it.
pub(super) fn draw_background(painter: &Painter, rect: Rect, center: WorldPos, resolution: f64) {
    painter.rect_filled(rect, 0.0, Color32::from_rgb(19, 23, 29));

    let step_m = grid_step_meters(resolution);
    let stroke = Stroke::new(1.0, Color32::from_rgba_unmultiplied(60, 70, 80, 70));

    // First gridline at or left of the view's west edge.
    let west = center.x - ((rect.width() as f64 / 2.0) * resolution);
    let mut line_x = (west / step_m).floor() * step_m;
    loop {
        let screen_x = rect.center().x + ((line_x - center.x) / resolution) as f32;
        if screen_x > rect.right() {
            break;
        }
        if screen_x >= rect.left() {
            painter.line_segment(
                [
                    Pos2::new(screen_x, rect.top()),
                    Pos2::new(screen_x, rect.bottom()),
                ],
                stroke,
            );
        }
        line_x += step_m;
    }

    let north = center.y + ((rect.height() as f64 / 2.0) * resolution);
    let mut line_y = (north / step_m).ceil() * step_m;
    loop {
        let screen_y = rect.center().y + ((center.y - line_y) / resolution) as f32;
        if screen_y > rect.bottom() {
            break;
        }
        if screen_y >= rect.top() {
            painter.line_segment(
                [
                    Pos2::new(rect.left(), screen_y),
                    Pos2::new(rect.right(), screen_y),
                ],
                stroke,
            );
        }
        line_y -= step_m;
    }
}

/// Picks a 1-2-5 grid step that lands near 120 px on screen.
fn grid_step_meters(resolution: f64) -> f64 {
    let target = 120.0 * resolution;
    let base = 10f64.powf(target.log10().floor());
    [1.0, 2.0, 5.0, 10.0]
        .iter()
        .map(|multiplier| base * multiplier)
        .find(|step| *step >= target)
        .unwrap_or(base * 10.0)
}

pub(super) fn circle_visible(rect: Rect, position: Pos2, radius: f32) -> bool {
    !(position.x + radius < rect.left()
        || position.x - radius > rect.right()
        || position.y + radius < rect.top()
        || position.y - radius > rect.bottom())
}

pub(super) fn world_to_screen(rect: Rect, center: WorldPos, resolution: f64, world: WorldPos) -> Pos2 {
    // Projected y grows northward, screen y grows downward.
    Pos2::new(
        rect.center().x + ((world.x - center.x) / resolution) as f32,
        rect.center().y + ((center.y - world.y) / resolution) as f32,
    )
}

pub(super) fn screen_to_world(rect: Rect, center: WorldPos, resolution: f64, screen: Pos2) -> WorldPos {
    WorldPos {
        x: center.x + ((screen.x - rect.center().x) as f64 * resolution),
        y: center.y - ((screen.y - rect.center().y) as f64 * resolution),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use eframe::egui::pos2;

    #[test]
    fn screen_world_roundtrip() {
        let rect = Rect::from_min_max(pos2(0.0, 0.0), pos2(800.0, 600.0));
        let center = WorldPos {
            x: 2_153_000.0,
            y: 6_840_000.0,
        };
        let resolution = 38.2;

        let screen = pos2(613.0, 142.0);
        let world = screen_to_world(rect, center, resolution, screen);
        let back = world_to_screen(rect, center, resolution, world);
        assert!((back.x - screen.x).abs() < 0.01);
        assert!((back.y - screen.y).abs() < 0.01);
    }

    #[test]
    fn view_center_maps_to_rect_center() {
        let rect = Rect::from_min_max(pos2(0.0, 0.0), pos2(400.0, 400.0));
        let center = WorldPos { x: 100.0, y: -50.0 };
        let screen = world_to_screen(rect, center, 2.0, center);
        assert_eq!(screen, rect.center());
    }

    #[test]
    fn north_is_up() {
        let rect = Rect::from_min_max(pos2(0.0, 0.0), pos2(400.0, 400.0));
        let center = WorldPos { x: 0.0, y: 0.0 };
        let north = WorldPos { x: 0.0, y: 100.0 };
        let screen = world_to_screen(rect, center, 1.0, north);
        assert!(screen.y < rect.center().y);
    }

    #[test]
    fn grid_steps_follow_1_2_5_ladder() {
        for resolution in [0.3, 1.0, 9.0, 152.0, 611.0] {
            let step = grid_step_meters(resolution);
            let mantissa = step / 10f64.powf(step.log10().floor());
            assert!(
                [1.0, 2.0, 5.0]
                    .iter()
                    .any(|allowed| (mantissa - allowed).abs() < 1e-9),
                "step {step} at resolution {resolution}"
            );
            assert!(step >= 120.0 * resolution);
        }
    }
}
