//! Phone line status

use serde::{Deserialize, Serialize};

/// Snapshot of one phone line
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhoneStatus {
    #[serde(default)]
    pub id: u32,

    /// Line technology as reported by the router (`fxs`, `dect`, ...)
    #[serde(rename = "type", default)]
    pub line_type: String,

    #[serde(default)]
    pub on_hook: bool,

    #[serde(default)]
    pub is_ringing: bool,

    #[serde(default)]
    pub hardware_defect: bool,

    #[serde(default)]
    pub vendor: String,
}

impl PhoneStatus {
    pub fn new(on_hook: bool, is_ringing: bool) -> Self {
        Self {
            on_hook,
            is_ringing,
            ..Default::default()
        }
    }
}
