use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;

use eframe::egui::{self, ScrollArea, Ui};

use crate::geo::{SearchResult, search_place};

/// Queries shorter than this (after trimming) never reach the geocoder.
const MIN_QUERY_LEN: usize = 4;
/// Result list size for as-you-type lookups; submits request a single hit.
const LIST_LIMIT: usize = 10;

/// Debounced place search over a Nominatim-compatible geocoder.
///
/// Requests run on throwaway threads and report back over a channel; each
/// request carries a sequence number and anything not matching the latest
/// issued number is discarded, so a slow early response can never overwrite
/// a newer one. `clear_results` bumps the number to invalidate in-flight
/// requests as well.
pub(in crate::app) struct SearchController {
    geocoder_url: String,
    pub query: String,
    results: Vec<SearchResult>,
    issued_seq: u64,
    tx: Sender<SearchResponse>,
    rx: Receiver<SearchResponse>,
    pending_target: Option<SearchResult>,
}

struct SearchResponse {
    seq: u64,
    limit: usize,
    outcome: Result<Vec<SearchResult>, String>,
}

fn should_search(raw: &str) -> bool {
    raw.trim().chars().count() >= MIN_QUERY_LEN
}

/// True when a pointer press landed outside every rect that keeps the result
/// list alive.
fn press_outside(press: Option<egui::Pos2>, keep_alive: &[egui::Rect]) -> bool {
    press.is_some_and(|pos| keep_alive.iter().all(|rect| !rect.contains(pos)))
}

impl SearchController {
    pub fn new(geocoder_url: String) -> Self {
        let (tx, rx) = mpsc::channel();
        Self {
            geocoder_url,
            query: String::new(),
            results: Vec::new(),
            issued_seq: 0,
            tx,
            rx,
            pending_target: None,
        }
    }

    /// Drains finished requests and returns a re-center target when a submit
    /// resolved. Call once per frame before drawing.
    pub fn poll(&mut self) -> Option<SearchResult> {
        while let Ok(response) = self.rx.try_recv() {
            if response.seq != self.issued_seq {
                continue;
            }

            match response.outcome {
                Ok(hits) if response.limit == 1 => {
                    self.results.clear();
                    self.pending_target = hits.into_iter().next();
                }
                Ok(mut hits) => {
                    hits.truncate(response.limit);
                    self.results = hits;
                }
                Err(message) => {
                    tracing::warn!(%message, "geocoder request failed");
                    self.results.clear();
                }
            }
        }

        self.pending_target.take()
    }

    fn issue(&mut self, limit: usize) {
        self.issued_seq += 1;
        let seq = self.issued_seq;
        let url = self.geocoder_url.clone();
        let query = self.query.trim().to_owned();
        let tx = self.tx.clone();

        thread::spawn(move || {
            let outcome = search_place(&url, &query, limit).map_err(|error| format!("{error:#}"));
            let _ = tx.send(SearchResponse {
                seq,
                limit,
                outcome,
            });
        });
    }

    fn request(&mut self, limit: usize) {
        if should_search(&self.query) {
            self.issue(limit);
        } else {
            self.clear_results();
        }
    }

    pub fn clear_results(&mut self) {
        self.results.clear();
        // Invalidate anything still in flight.
        self.issued_seq += 1;
    }

    /// Renders the query box and result list. Returns the result the user
    /// picked from the list, if any.
    pub fn draw(&mut self, ui: &mut Ui) -> Option<SearchResult> {
        let mut picked = None;

        let edit = ui.text_edit_singleline(&mut self.query);
        if edit.changed() {
            self.request(LIST_LIMIT);
        }

        let search_button = ui.button("Search");
        let submitted = (edit.lost_focus() && ui.input(|input| input.key_pressed(egui::Key::Enter)))
            || search_button.clicked();
        if submitted {
            self.request(1);
        }

        if !self.results.is_empty() {
            let list = ScrollArea::vertical()
                .id_salt("search_results_scroll")
                .max_height(220.0)
                .show(ui, |ui| {
                    for result in &self.results {
                        if ui.link(&result.display_name).clicked() {
                            picked = Some(result.clone());
                        }
                    }
                });

            // A press anywhere else in the window dismisses the list. The
            // query box, the button and the list itself stay live so typing
            // and selecting keep working.
            let press = ui.ctx().input(|input| {
                input
                    .pointer
                    .any_pressed()
                    .then(|| input.pointer.interact_pos())
                    .flatten()
            });
            if picked.is_none()
                && !submitted
                && press_outside(press, &[list.inner_rect, edit.rect, search_button.rect])
            {
                self.clear_results();
            }
        }

        if picked.is_some() {
            self.clear_results();
        }
        picked
    }

    #[cfg(test)]
    fn respond(&self, seq: u64, limit: usize, outcome: Result<Vec<SearchResult>, String>) {
        let _ = self.tx.send(SearchResponse {
            seq,
            limit,
            outcome,
        });
    }

    #[cfg(test)]
    fn results(&self) -> &[SearchResult] {
        &self.results
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hit(name: &str) -> SearchResult {
        SearchResult {
            display_name: name.to_owned(),
            lon: 21.0,
            lat: 52.0,
        }
    }

    #[test]
    fn short_queries_never_search() {
        assert!(!should_search(""));
        assert!(!should_search("War"));
        assert!(!should_search("  War  "));
        assert!(should_search("Wars"));
        assert!(should_search("  Warszawa "));
    }

    #[test]
    fn stale_responses_are_discarded() {
        let mut search = SearchController::new("http://geocoder.test".into());
        search.issued_seq = 3;

        search.respond(2, LIST_LIMIT, Ok(vec![hit("stale")]));
        search.respond(3, LIST_LIMIT, Ok(vec![hit("fresh")]));

        assert!(search.poll().is_none());
        assert_eq!(search.results().len(), 1);
        assert_eq!(search.results()[0].display_name, "fresh");
    }

    #[test]
    fn submit_response_auto_selects_the_first_hit() {
        let mut search = SearchController::new("http://geocoder.test".into());
        search.issued_seq = 1;
        search.respond(1, 1, Ok(vec![hit("Warszawa"), hit("ignored")]));

        let target = search.poll().unwrap();
        assert_eq!(target.display_name, "Warszawa");
        assert!(search.results().is_empty());

        // Target is consumed once.
        assert!(search.poll().is_none());
    }

    #[test]
    fn failed_requests_clear_the_list() {
        let mut search = SearchController::new("http://geocoder.test".into());
        search.issued_seq = 1;
        search.respond(1, LIST_LIMIT, Ok(vec![hit("old")]));
        assert!(search.poll().is_none());
        assert_eq!(search.results().len(), 1);

        search.issued_seq = 2;
        search.respond(2, LIST_LIMIT, Err("timeout".into()));
        assert!(search.poll().is_none());
        assert!(search.results().is_empty());
    }

    #[test]
    fn clear_results_invalidates_in_flight_requests() {
        let mut search = SearchController::new("http://geocoder.test".into());
        search.issued_seq = 5;
        search.clear_results();

        search.respond(5, LIST_LIMIT, Ok(vec![hit("late")]));
        assert!(search.poll().is_none());
        assert!(search.results().is_empty());
    }

    #[test]
    fn presses_outside_the_list_dismiss_it() {
        use eframe::egui::{Rect, pos2};

        let list = Rect::from_min_max(pos2(0.0, 40.0), pos2(300.0, 260.0));
        let query_box = Rect::from_min_max(pos2(0.0, 0.0), pos2(300.0, 20.0));
        let keep_alive = [list, query_box];

        // Clicks on the map, the top bar or any other widget clear the list.
        assert!(press_outside(Some(pos2(600.0, 150.0)), &keep_alive));
        assert!(press_outside(Some(pos2(150.0, 300.0)), &keep_alive));

        // Clicks on the list or the query box keep it open.
        assert!(!press_outside(Some(pos2(150.0, 100.0)), &keep_alive));
        assert!(!press_outside(Some(pos2(150.0, 10.0)), &keep_alive));

        // No press this frame, nothing to dismiss.
        assert!(!press_outside(None, &keep_alive));
    }

    #[test]
    fn list_responses_are_truncated_to_the_limit() {
        let mut search = SearchController::new("http://geocoder.test".into());
        search.issued_seq = 1;
        let hits = (0..15).map(|i| hit(&format!("hit {i}"))).collect();
        search.respond(1, LIST_LIMIT, Ok(hits));

        assert!(search.poll().is_none());
        assert_eq!(search.results().len(), LIST_LIMIT);
    }
}
