#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowAction {
    Show,
    Hide,
}

impl WindowAction {
    pub fn visible(self) -> bool {
        matches!(self, Self::Show)
    }
}

/// Last known visibility of the launcher surface. The host owns the window;
/// this only decides which way a toggle request should go.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OverlayState {
    visible: bool,
}

impl Default for OverlayState {
    fn default() -> Self {
        Self { visible: true }
    }
}

impl OverlayState {
    pub fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn on_toggle(&mut self) -> WindowAction {
        self.visible = !self.visible;
        if self.visible {
            WindowAction::Show
        } else {
            WindowAction::Hide
        }
    }
}
