use std::collections::HashSet;
use std::sync::Arc;

use eframe::egui::{
    self, Align2, Color32, FontId, Painter, Pos2, Rect, Sense, Shape, Stroke, StrokeKind, Ui, vec2,
};
use fuzzy_matcher::FuzzyMatcher;
use fuzzy_matcher::skim::SkimMatcherV2;

use crate::geo::WorldPos;

use super::super::cluster::cluster_points;
use super::super::render_utils::{
    blend_color, dim_color, draw_background, screen_to_world, world_to_screen,
};
use super::super::style::ClusterStyle;
use super::super::{CLUSTER_PIXEL_DISTANCE, ClusterCache, FilterMatchCache, ViewModel};
use super::interaction::{SelectionAction, resolve_click};

fn fuzzy_match_score(matcher: &SkimMatcherV2, text: &str, query: &str) -> Option<i64> {
    matcher
        .fuzzy_match(text, query)
        .or_else(|| matcher.fuzzy_match(&text.to_ascii_lowercase(), &query.to_ascii_lowercase()))
}

impl ViewModel {
    fn cached_filter_matches(&mut self) -> Option<Arc<HashSet<usize>>> {
        let query = self.marker_filter.trim();
        if query.is_empty() {
            return None;
        }

        if let Some(cached) = &self.filter_match_cache
            && cached.query == query
        {
            return Some(Arc::clone(&cached.matches));
        }

        let matcher = SkimMatcherV2::default();
        let matches = self
            .points
            .iter()
            .enumerate()
            .filter_map(|(index, point)| {
                let name = point.label.lines().next().unwrap_or("");
                fuzzy_match_score(&matcher, name, query).map(|_| index)
            })
            .collect::<HashSet<_>>();
        let matches = Arc::new(matches);

        self.filter_match_cache = Some(FilterMatchCache {
            query: query.to_owned(),
            matches: Arc::clone(&matches),
        });

        Some(matches)
    }

    /// Clusters are a pure function of the point set and the view resolution,
    /// so the cache is rebuilt wholesale whenever the resolution moves.
    fn ensure_clusters(&mut self) {
        let resolution = self.view.resolution();
        let stale = self
            .cluster_cache
            .as_ref()
            .is_none_or(|cache| cache.resolution != resolution);

        if stale {
            self.cluster_cache = Some(ClusterCache {
                resolution,
                clusters: cluster_points(&self.points, CLUSTER_PIXEL_DISTANCE, resolution),
            });
        }
    }

    pub(in crate::app) fn draw_map(&mut self, ui: &mut Ui) {
        let (rect, response) = ui.allocate_exact_size(ui.available_size(), Sense::click_and_drag());
        let painter = ui.painter_at(rect);

        // View movement runs before click resolution so a pan or zoom in the
        // same frame dismisses the popup first.
        self.step_animation(ui.ctx());
        self.handle_map_zoom(ui, rect, &response);
        self.handle_map_pan(&response);

        draw_background(&painter, rect, self.view.center, self.view.resolution());

        if self.points.is_empty() {
            self.visible_cluster_count = 0;
            painter.text(
                rect.center(),
                Align2::CENTER_CENTER,
                "No markers to display",
                FontId::proportional(15.0),
                Color32::from_gray(150),
            );
            return;
        }

        let filter_matches = self.cached_filter_matches();
        self.ensure_clusters();

        let center = self.view.center;
        let resolution = self.view.resolution();

        let (screen_positions, screen_radii, styles, sizes, match_flags) = {
            let Some(cache) = self.cluster_cache.as_ref() else {
                return;
            };

            let mut screen_positions = Vec::with_capacity(cache.clusters.len());
            let mut screen_radii = Vec::with_capacity(cache.clusters.len());
            let mut styles: Vec<ClusterStyle> = Vec::with_capacity(cache.clusters.len());
            let mut sizes = Vec::with_capacity(cache.clusters.len());
            let mut match_flags = Vec::with_capacity(cache.clusters.len());

            for cluster in &cache.clusters {
                let style = self.styler.style_for(cluster.size());
                screen_positions.push(world_to_screen(rect, center, resolution, cluster.world));
                screen_radii.push(style.tier.radius());
                sizes.push(cluster.size());
                match_flags.push(filter_matches.as_ref().is_some_and(|matches| {
                    cluster.members.iter().any(|member| matches.contains(member))
                }));
                styles.push(style);
            }

            (screen_positions, screen_radii, styles, sizes, match_flags)
        };

        let visible_indices = Self::visible_indices(rect, &screen_positions, &screen_radii);
        self.visible_cluster_count = visible_indices.len();

        let hovered = Self::hovered_cluster(ui, &visible_indices, &screen_positions, &screen_radii);
        if hovered.is_some() {
            ui.output_mut(|output| {
                output.cursor_icon = egui::CursorIcon::PointingHand;
            });
        }
        let hovered_index = hovered.map(|(index, _)| index);

        if response.clicked_by(egui::PointerButton::Primary) {
            // Any map click dismisses the geocoder result list.
            self.search.clear_results();

            let hit = hovered_index.map(|index| (index, sizes[index]));
            match resolve_click(hit, self.popup.is_open()) {
                SelectionAction::OpenPopup(index) => {
                    if let Some(pointer) = response.interact_pointer_pos() {
                        let label = self.cluster_cache.as_ref().and_then(|cache| {
                            cache.clusters[index]
                                .members
                                .first()
                                .map(|&member| self.points[member].label.clone())
                        });
                        if let Some(label) = label {
                            let anchor = screen_to_world(rect, center, resolution, pointer);
                            self.popup.open(anchor, label);
                        }
                    }
                }
                SelectionAction::ClosePopup => self.popup.close(),
                SelectionAction::Noop => {}
            }
        }

        let filter_active = filter_matches
            .as_ref()
            .is_some_and(|matches| !matches.is_empty());

        for &index in &visible_indices {
            let position = screen_positions[index];
            let radius = screen_radii[index];
            let style = &styles[index];

            let base = self.styler.fill(style.tier);
            let fill = if hovered_index == Some(index) {
                blend_color(base, Color32::from_rgb(255, 200, 120), 0.35)
            } else if match_flags[index] {
                blend_color(base, Color32::from_rgb(103, 196, 255), 0.55)
            } else if filter_active {
                dim_color(base, 0.45)
            } else {
                base
            };

            painter.circle_filled(position, radius, fill);
            painter.circle_stroke(
                position,
                radius,
                Stroke::new(1.0, Color32::from_rgba_unmultiplied(15, 15, 15, 190)),
            );

            if let Some(badge) = &style.badge {
                painter.text(
                    position,
                    Align2::CENTER_CENTER,
                    badge,
                    FontId::proportional(12.0),
                    self.styler.badge_color(),
                );
            } else {
                painter.circle_filled(position, radius * 0.35, self.styler.badge_color());
            }
        }

        if let Some(index) = hovered_index {
            let status = if sizes[index] == 1 {
                self.cluster_cache
                    .as_ref()
                    .and_then(|cache| cache.clusters[index].members.first().copied())
                    .map(|member| {
                        self.points[member]
                            .label
                            .lines()
                            .next()
                            .unwrap_or("")
                            .to_owned()
                    })
            } else {
                Some(format!("{} markers in cluster", sizes[index]))
            };

            if let Some(status) = status {
                painter.text(
                    rect.left_top() + vec2(10.0, 10.0),
                    Align2::LEFT_TOP,
                    status,
                    FontId::proportional(13.0),
                    Color32::from_gray(240),
                );
            }
        }

        self.draw_popup(&painter, rect, center, resolution);
    }

    /// Speech-bubble overlay anchored at the click position, tip pointing at
    /// the clicked spot. The first label line is the marker name; the rest
    /// are address lines.
    fn draw_popup(&self, painter: &Painter, rect: Rect, center: WorldPos, resolution: f64) {
        let Some(content) = self.popup.current() else {
            return;
        };

        let anchor = world_to_screen(rect, center, resolution, content.anchor);

        let mut galleys = Vec::new();
        for (line_index, line) in content.label.lines().enumerate() {
            let (font, color) = if line_index == 0 {
                (FontId::proportional(14.0), Color32::from_gray(20))
            } else {
                (FontId::proportional(12.5), Color32::from_gray(60))
            };
            galleys.push(painter.layout_no_wrap(line.to_owned(), font, color));
        }
        if galleys.is_empty() {
            return;
        }

        let line_gap = 2.0;
        let padding = 8.0;
        let tip = 8.0;
        let width = galleys
            .iter()
            .map(|galley| galley.size().x)
            .fold(0.0f32, f32::max);
        let height = galleys.iter().map(|galley| galley.size().y).sum::<f32>()
            + (galleys.len().saturating_sub(1) as f32 * line_gap);

        let bubble = Rect::from_min_size(
            anchor + vec2(-(width / 2.0) - padding, -height - (padding * 2.0) - tip),
            vec2(width + (padding * 2.0), height + (padding * 2.0)),
        );

        let background = Color32::from_rgb(248, 248, 246);
        painter.rect_filled(bubble, 6.0, background);
        painter.rect_stroke(
            bubble,
            6.0,
            Stroke::new(1.0, Color32::from_rgba_unmultiplied(15, 15, 15, 160)),
            StrokeKind::Outside,
        );
        painter.add(Shape::convex_polygon(
            vec![anchor, anchor + vec2(-tip, -tip), anchor + vec2(tip, -tip)],
            background,
            Stroke::NONE,
        ));

        let mut line_top = bubble.top() + padding;
        for galley in galleys {
            let galley_height = galley.size().y;
            painter.galley(
                Pos2::new(bubble.left() + padding, line_top),
                galley,
                Color32::PLACEHOLDER,
            );
            line_top += galley_height + line_gap;
        }
    }
}
