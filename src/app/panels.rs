use eframe::egui::{self, Align, Context, Layout, ScrollArea, Ui};

use crate::geo::{build_points, from_lon_lat, to_lon_lat};
use crate::util::format_lon_lat;

use super::style::ClusterStyler;
use super::{
    DEFAULT_CENTER_LON_LAT, DEFAULT_ZOOM, LoadResult, MAX_ZOOM, MIN_ZOOM, PopupController,
    SearchController, TARGET_ZOOM, ViewState, ViewerConfig, ViewModel,
};

impl ViewModel {
    pub(in crate::app) fn new(config: &ViewerConfig, load: LoadResult) -> Self {
        let (points, dropped_records, data_warning) = match load {
            Ok(records) => {
                let (points, dropped) = build_points(&records);
                (points, dropped, None)
            }
            Err(message) => {
                tracing::warn!(%message, "marker load failed");
                (Vec::new(), 0, Some(message))
            }
        };

        let (center_lon, center_lat) = DEFAULT_CENTER_LON_LAT;

        Self {
            brand: config.brand,
            styler: ClusterStyler::new(config.brand),
            points,
            dropped_records,
            data_warning,
            view: ViewState {
                center: from_lon_lat(center_lon, center_lat),
                zoom: DEFAULT_ZOOM,
                min_zoom: MIN_ZOOM,
                max_zoom: MAX_ZOOM,
            },
            animation: None,
            popup: PopupController::default(),
            search: SearchController::new(config.geocoder_url.clone()),
            marker_filter: String::new(),
            filter_match_cache: None,
            cluster_cache: None,
            visible_cluster_count: 0,
        }
    }

    pub(in crate::app) fn show(
        &mut self,
        ctx: &Context,
        reload_requested: &mut bool,
        is_loading: bool,
    ) {
        // A submit that resolved this frame flies the view to the hit.
        if let Some(target) = self.search.poll() {
            let center = from_lon_lat(target.lon, target.lat);
            self.animate_to(ctx, center, TARGET_ZOOM);
        }

        egui::TopBottomPanel::top("top_bar")
            .resizable(false)
            .show(ctx, |ui| {
                ui.horizontal(|ui| {
                    ui.heading("mapa marek");
                    ui.separator();
                    ui.label(format!("brand: {}", self.brand.name()));
                    ui.label(format!("markers: {}", self.points.len()));
                    if self.dropped_records > 0 {
                        ui.label(format!("skipped: {}", self.dropped_records));
                    }
                    let reload_button =
                        ui.add_enabled(!is_loading, egui::Button::new("Reload markers"));
                    if reload_button.clicked() {
                        *reload_requested = true;
                    }
                    ui.with_layout(Layout::right_to_left(Align::Center), |ui| {
                        if let Some(warning) = &self.data_warning {
                            ui.colored_label(
                                egui::Color32::from_rgb(235, 170, 80),
                                warning.as_str(),
                            );
                        }
                        ui.label(format!("clusters: {}", self.visible_cluster_count));
                        ui.label(format!("zoom: {:.1}", self.view.zoom));
                        let (lon, lat) = to_lon_lat(self.view.center);
                        ui.label(format_lon_lat(lon, lat));
                    });
                });
            });

        egui::SidePanel::left("search")
            .resizable(true)
            .default_width(320.0)
            .show(ctx, |ui| self.draw_side_panel(ui));

        egui::CentralPanel::default().show(ctx, |ui| self.draw_map(ui));
    }

    fn draw_side_panel(&mut self, ui: &mut Ui) {
        ui.heading("Place search");
        if let Some(target) = self.search.draw(ui) {
            let center = from_lon_lat(target.lon, target.lat);
            self.animate_to(ui.ctx(), center, TARGET_ZOOM);
        }

        ui.separator();

        ui.heading("Highlight markers");
        if ui.text_edit_singleline(&mut self.marker_filter).changed() {
            self.filter_match_cache = None;
        }

        ui.separator();

        ui.heading("Dataset");
        ui.label(format!("{} markers loaded", self.points.len()));
        if self.dropped_records > 0 {
            ui.label(format!(
                "{} records skipped (bad coordinates)",
                self.dropped_records
            ));
        }
        if let Some(warning) = &self.data_warning {
            ui.colored_label(egui::Color32::from_rgb(235, 170, 80), warning.as_str());
        }

        ui.separator();

        let mut goto = None;
        egui::CollapsingHeader::new("Markers")
            .default_open(false)
            .show(ui, |ui| {
                let row_height = ui.text_style_height(&egui::TextStyle::Body);
                ScrollArea::vertical()
                    .id_salt("marker_list_scroll")
                    .show_rows(ui, row_height, self.points.len(), |ui, rows| {
                        for index in rows {
                            let point = &self.points[index];
                            let name = point.label.lines().next().unwrap_or("(unnamed)");
                            if ui.link(name).clicked() {
                                goto = Some(point.world);
                            }
                        }
                    });
            });

        if let Some(world) = goto {
            self.animate_to(ui.ctx(), world, TARGET_ZOOM);
        }
    }
}
