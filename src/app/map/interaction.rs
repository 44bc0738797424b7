use eframe::egui::{self, Context, Pos2, Rect, Ui};

use crate::geo::WorldPos;

use super::super::render_utils::{circle_visible, screen_to_world};
use super::super::{ViewAnimation, ViewModel};

/// Outcome of a primary click on the map canvas.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(in crate::app) enum SelectionAction {
    /// Open the detail popup for this cluster (index into the cluster list).
    OpenPopup(usize),
    ClosePopup,
    Noop,
}

/// Resolves a click against the hovered cluster, if any. A single-member hit
/// opens its popup; a multi-member hit only dismisses whatever popup is open,
/// matching a map where dense clusters are explored by zooming, not clicking.
/// Empty-space clicks dismiss too, but stay a no-op when nothing is open.
pub(in crate::app) fn resolve_click(
    hit: Option<(usize, usize)>,
    popup_open: bool,
) -> SelectionAction {
    match hit {
        Some((index, size)) if size == 1 => SelectionAction::OpenPopup(index),
        Some(_) => SelectionAction::ClosePopup,
        None if popup_open => SelectionAction::ClosePopup,
        None => SelectionAction::Noop,
    }
}

impl ViewModel {
    pub(in crate::app) fn handle_map_zoom(
        &mut self,
        ui: &Ui,
        rect: Rect,
        response: &egui::Response,
    ) {
        if !response.hovered() {
            return;
        }

        let scroll = ui.input(|input| input.raw_scroll_delta.y);
        if scroll.abs() <= f32::EPSILON {
            return;
        }

        let zoom = self.view.clamp_zoom(self.view.zoom + (scroll as f64 * 0.0035));
        if (zoom - self.view.zoom).abs() <= f64::EPSILON {
            return;
        }

        // Any view movement dismisses the popup before the new frame renders.
        self.animation = None;
        self.popup.close();

        let pointer = ui
            .input(|input| input.pointer.hover_pos())
            .unwrap_or_else(|| rect.center());
        let world_before = screen_to_world(rect, self.view.center, self.view.resolution(), pointer);

        self.view.zoom = zoom;

        // Keep the world point under the cursor fixed through the zoom.
        let resolution = self.view.resolution();
        let offset = pointer - rect.center();
        self.view.center = WorldPos {
            x: world_before.x - (offset.x as f64 * resolution),
            y: world_before.y + (offset.y as f64 * resolution),
        };
    }

    pub(in crate::app) fn handle_map_pan(&mut self, response: &egui::Response) {
        if response.drag_started() {
            self.animation = None;
            self.popup.close();
        }

        if response.dragged() {
            let delta = response.drag_delta();
            let resolution = self.view.resolution();
            self.view.center.x -= delta.x as f64 * resolution;
            self.view.center.y += delta.y as f64 * resolution;
        }
    }

    pub(in crate::app) fn hovered_cluster(
        ui: &Ui,
        visible_indices: &[usize],
        screen_positions: &[Pos2],
        screen_radii: &[f32],
    ) -> Option<(usize, f32)> {
        let pointer_pos = ui.input(|input| input.pointer.hover_pos());
        pointer_pos.and_then(|pointer| {
            visible_indices
                .iter()
                .filter_map(|index| {
                    let distance = screen_positions[*index].distance(pointer);
                    if distance <= screen_radii[*index] {
                        Some((*index, distance))
                    } else {
                        None
                    }
                })
                .min_by(|a, b| a.1.total_cmp(&b.1))
        })
    }

    pub(in crate::app) fn visible_indices(
        rect: Rect,
        screen_positions: &[Pos2],
        screen_radii: &[f32],
    ) -> Vec<usize> {
        (0..screen_positions.len())
            .filter(|&index| {
                circle_visible(rect, screen_positions[index], screen_radii[index] + 4.0)
            })
            .collect()
    }

    /// Starts an eased flight to `center` at `zoom`. The popup never survives
    /// a re-center.
    pub(in crate::app) fn animate_to(&mut self, ctx: &Context, center: WorldPos, zoom: f64) {
        self.popup.close();
        self.animation = Some(ViewAnimation {
            from_center: self.view.center,
            to_center: center,
            from_zoom: self.view.zoom,
            to_zoom: self.view.clamp_zoom(zoom),
            start_time: ctx.input(|input| input.time),
            duration: 0.45,
        });
        ctx.request_repaint();
    }

    pub(in crate::app) fn step_animation(&mut self, ctx: &Context) {
        let Some(animation) = &self.animation else {
            return;
        };

        let elapsed = ctx.input(|input| input.time) - animation.start_time;
        let t = (elapsed / animation.duration).clamp(0.0, 1.0);
        // Smoothstep easing.
        let eased = t * t * (3.0 - (2.0 * t));

        self.view.center = WorldPos {
            x: animation.from_center.x + ((animation.to_center.x - animation.from_center.x) * eased),
            y: animation.from_center.y + ((animation.to_center.y - animation.from_center.y) * eased),
        };
        self.view.zoom = animation.from_zoom + ((animation.to_zoom - animation.from_zoom) * eased);

        if t >= 1.0 {
            self.animation = None;
        } else {
            ctx.request_repaint();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_click_with_open_popup_dismisses() {
        assert_eq!(resolve_click(None, true), SelectionAction::ClosePopup);
    }

    #[test]
    fn empty_click_without_popup_is_a_noop() {
        assert_eq!(resolve_click(None, false), SelectionAction::Noop);
    }

    #[test]
    fn single_marker_click_opens_its_popup() {
        assert_eq!(
            resolve_click(Some((4, 1)), false),
            SelectionAction::OpenPopup(4)
        );
    }

    #[test]
    fn single_marker_click_replaces_an_open_popup() {
        assert_eq!(
            resolve_click(Some((2, 1)), true),
            SelectionAction::OpenPopup(2)
        );
    }

    #[test]
    fn multi_marker_click_only_dismisses() {
        assert_eq!(resolve_click(Some((0, 7)), true), SelectionAction::ClosePopup);
        assert_eq!(
            resolve_click(Some((0, 7)), false),
            SelectionAction::ClosePopup
        );
    }
}
