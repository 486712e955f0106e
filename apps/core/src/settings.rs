use crate::config::Config;

/// Settings mode. Orthogonal to the session: opening it leaves results or a
/// streamed answer in place, and it never sees navigation keys.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SettingsPanel {
    draft: Option<Config>,
}

impl SettingsPanel {
    pub fn is_open(&self) -> bool {
        self.draft.is_some()
    }

    /// Returns false when the panel was already open.
    pub fn open(&mut self, current: Option<&Config>) -> bool {
        if self.is_open() {
            return false;
        }
        self.draft = Some(current.cloned().unwrap_or_default());
        true
    }

    pub fn close(&mut self) -> bool {
        self.draft.take().is_some()
    }

    pub fn draft(&self) -> Option<&Config> {
        self.draft.as_ref()
    }

    /// Replaces the draft verbatim. Ignored while closed.
    pub fn edit(&mut self, draft: Config) -> bool {
        match self.draft.as_mut() {
            Some(slot) => {
                *slot = draft;
                true
            }
            None => false,
        }
    }
}
