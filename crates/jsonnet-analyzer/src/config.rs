use serde::{Deserialize, Serialize};
use url::Url;

/// Analyzer configuration, deserialized from the editor's settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AnalyzerConfig {
    /// Ordered library search paths for imports, as absolute URLs ending in
    /// a slash. Tried after resolution relative to the importing file.
    pub jpaths: Vec<Url>,
}
