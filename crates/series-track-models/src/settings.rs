use serde::{Deserialize, Serialize};

/// Per-user display settings. Storage is sparse: only fields that deviate
/// from these defaults are persisted, so adding a field here never requires a
/// data migration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserSettings {
    pub language: String,
    pub episodes_per_show: u32,
}

impl Default for UserSettings {
    fn default() -> Self {
        Self {
            language: "auto".to_string(),
            episodes_per_show: 4,
        }
    }
}

impl UserSettings {
    pub fn language_is_default(&self) -> bool {
        self.language == Self::default().language
    }

    pub fn episodes_per_show_is_default(&self) -> bool {
        self.episodes_per_show == Self::default().episodes_per_show
    }
}
