use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Macro storage configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Directory holding macro documents (None = `<data_dir>/macros`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub macro_dir: Option<PathBuf>,
}
