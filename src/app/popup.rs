use crate::geo::WorldPos;

/// Content of the single detail overlay: the clicked map position and the
/// marker's display label.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct PopupContent {
    pub anchor: WorldPos,
    pub label: String,
}

/// Owns the lifecycle of at most one open detail popup.
///
/// `open` disposes the previous popup before installing the new one, so two
/// popups can never be alive at once. `close` on an already-closed controller
/// is a no-op. The map view closes the popup whenever the view starts moving.
#[derive(Debug, Default)]
pub(crate) struct PopupController {
    current: Option<PopupContent>,
}

impl PopupController {
    pub fn open(&mut self, anchor: WorldPos, label: String) {
        self.close();
        self.current = Some(PopupContent { anchor, label });
    }

    pub fn close(&mut self) {
        self.current = None;
    }

    pub fn current(&self) -> Option<&PopupContent> {
        self.current.as_ref()
    }

    pub fn is_open(&self) -> bool {
        self.current.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn anchor(x: f64) -> WorldPos {
        WorldPos { x, y: 0.0 }
    }

    #[test]
    fn open_replaces_any_previous_popup() {
        let mut popup = PopupController::default();
        popup.open(anchor(1.0), "first".into());
        popup.open(anchor(2.0), "second".into());

        let current = popup.current().unwrap();
        assert_eq!(current.label, "second");
        assert_eq!(current.anchor, anchor(2.0));
    }

    #[test]
    fn close_is_idempotent() {
        let mut popup = PopupController::default();
        popup.open(anchor(0.0), "open".into());

        popup.close();
        popup.close();
        assert!(!popup.is_open());
        assert!(popup.current().is_none());
    }

    #[test]
    fn starts_closed() {
        let popup = PopupController::default();
        assert!(!popup.is_open());
    }
}
