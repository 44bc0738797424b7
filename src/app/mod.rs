use std::collections::HashSet;
use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::thread;

use eframe::egui::{self, Context};

use crate::geo::{
    Brand, MarkerRecord, MarkersSource, PointEntity, WorldPos, fetch_markers, resolution_at_zoom,
};

mod cluster;
mod map;
mod panels;
mod popup;
mod render_utils;
mod search;
mod style;

use cluster::Cluster;
use popup::PopupController;
use search::SearchController;
use style::ClusterStyler;

/// Clustering distance in screen pixels (the original map clustered at 50).
const CLUSTER_PIXEL_DISTANCE: f64 = 50.0;

/// Initial view: roughly the center of Poland at country-wide zoom.
const DEFAULT_CENTER_LON_LAT: (f64, f64) = (19.346032, 52.230791);
const DEFAULT_ZOOM: f64 = 7.0;
const MIN_ZOOM: f64 = 7.0;
const MAX_ZOOM: f64 = 19.0;

/// Zoom applied when re-centering on a search result or marker.
const TARGET_ZOOM: f64 = 15.0;

#[derive(Clone, Debug)]
pub struct ViewerConfig {
    pub brand: Brand,
    pub source: MarkersSource,
    pub geocoder_url: String,
}

pub struct MapApp {
    config: ViewerConfig,
    state: AppState,
    reload_rx: Option<Receiver<LoadResult>>,
}

type LoadResult = Result<Vec<MarkerRecord>, String>;

enum AppState {
    Loading { rx: Receiver<LoadResult> },
    Ready(Box<ViewModel>),
}

struct ViewModel {
    brand: Brand,
    styler: ClusterStyler,
    points: Vec<PointEntity>,
    dropped_records: usize,
    data_warning: Option<String>,
    view: ViewState,
    animation: Option<ViewAnimation>,
    popup: PopupController,
    search: SearchController,
    marker_filter: String,
    filter_match_cache: Option<FilterMatchCache>,
    cluster_cache: Option<ClusterCache>,
    visible_cluster_count: usize,
}

struct ViewState {
    center: WorldPos,
    zoom: f64,
    min_zoom: f64,
    max_zoom: f64,
}

impl ViewState {
    fn resolution(&self) -> f64 {
        resolution_at_zoom(self.zoom)
    }

    fn clamp_zoom(&self, zoom: f64) -> f64 {
        zoom.clamp(self.min_zoom, self.max_zoom)
    }
}

/// An eased center/zoom transition, used by search re-centering.
struct ViewAnimation {
    from_center: WorldPos,
    to_center: WorldPos,
    from_zoom: f64,
    to_zoom: f64,
    start_time: f64,
    duration: f64,
}

/// Clusters derived for one exact view resolution; rebuilt wholesale, never
/// patched, when the resolution changes.
struct ClusterCache {
    resolution: f64,
    clusters: Vec<Cluster>,
}

struct FilterMatchCache {
    query: String,
    matches: Arc<HashSet<usize>>,
}

impl MapApp {
    pub fn new(_cc: &eframe::CreationContext<'_>, config: ViewerConfig) -> Self {
        let state = Self::start_load(&config);
        Self {
            config,
            state,
            reload_rx: None,
        }
    }

    fn spawn_load(config: &ViewerConfig) -> Receiver<LoadResult> {
        let (tx, rx) = mpsc::channel();
        let source = config.source.clone();

        thread::spawn(move || {
            let result = fetch_markers(&source).map_err(|error| error.to_string());
            let _ = tx.send(result);
        });

        rx
    }

    fn start_load(config: &ViewerConfig) -> AppState {
        AppState::Loading {
            rx: Self::spawn_load(config),
        }
    }
}

impl eframe::App for MapApp {
    fn update(&mut self, ctx: &Context, _frame: &mut eframe::Frame) {
        let mut transition = None;

        match &mut self.state {
            AppState::Loading { rx } => {
                if let Ok(result) = rx.try_recv() {
                    transition = Some(AppState::Ready(Box::new(ViewModel::new(
                        &self.config,
                        result,
                    ))));
                }

                egui::CentralPanel::default().show(ctx, |ui| {
                    ui.vertical_centered(|ui| {
                        ui.add_space(120.0);
                        ui.heading("Loading markers...");
                        ui.add_space(8.0);
                        ui.spinner();
                    });
                });
            }
            AppState::Ready(model) => {
                let mut reload_requested = false;
                let is_reloading = self.reload_rx.is_some();
                model.show(ctx, &mut reload_requested, is_reloading);

                if reload_requested && self.reload_rx.is_none() {
                    self.reload_rx = Some(Self::spawn_load(&self.config));
                }

                if let Some(rx) = self.reload_rx.take() {
                    match rx.try_recv() {
                        Ok(result) => {
                            transition = Some(AppState::Ready(Box::new(ViewModel::new(
                                &self.config,
                                result,
                            ))));
                        }
                        Err(TryRecvError::Empty) => {
                            self.reload_rx = Some(rx);
                        }
                        Err(TryRecvError::Disconnected) => {
                            model.data_warning =
                                Some("Background marker loader disconnected".to_owned());
                        }
                    }
                }
            }
        }

        if let Some(next_state) = transition {
            self.reload_rx = None;
            self.state = next_state;
        }
    }
}
