use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::{debug, info};

/// Per-run options shared by every input file in a batch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Options {
    /// Keep the staged copy of each input file after a successful run.
    #[serde(default)]
    pub preserve_backup: bool,
    /// Output base name used instead of the input file's stem.
    #[serde(default)]
    pub prefix: Option<String>,
    /// Output location; defaults to the input file's directory.
    #[serde(default)]
    pub out_dir: Option<PathBuf>,
    /// Stage in a dedicated directory under the system temp dir.
    #[serde(default)]
    pub use_tmp_dir: bool,
}

impl Options {
    pub fn trace_loaded(&self) {
        info!(
            preserve_backup = self.preserve_backup,
            use_tmp_dir = self.use_tmp_dir,
            prefix = self.prefix.as_deref().unwrap_or("<input stem>"),
            out_dir = %self
                .out_dir
                .as_ref()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| "<input dir>".to_string()),
            "Loaded Options"
        );
        debug!(?self, "Options loaded (full debug)");
    }
}
