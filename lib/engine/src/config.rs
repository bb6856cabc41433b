use cropwise_core::{Error, Result, DEFAULT_TOP_K};
use cropwise_schema::CatalogOptions;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Locations of the training artifacts
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ArtifactPaths {
    /// Reference dataset (CSV)
    pub dataset: PathBuf,
    /// Trained model (JSON MLP)
    pub model: PathBuf,
    /// Feature columns and classes (JSON)
    pub metadata: PathBuf,
}

impl Default for ArtifactPaths {
    fn default() -> Self {
        Self::in_dir(".")
    }
}

impl ArtifactPaths {
    /// Default artifact file names inside `dir`
    pub fn in_dir<P: AsRef<Path>>(dir: P) -> Self {
        let dir = dir.as_ref();
        Self {
            dataset: dir.join("apcrop_dataset.csv"),
            model: dir.join("croprecommender_mlp.json"),
            metadata: dir.join("croprecommender_meta.json"),
        }
    }
}

/// Engine configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct EngineConfig {
    pub artifacts: ArtifactPaths,
    #[serde(flatten)]
    pub catalog: CatalogOptions,
    /// Recommendations returned per prediction
    pub top_k: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            artifacts: ArtifactPaths::default(),
            catalog: CatalogOptions::default(),
            top_k: DEFAULT_TOP_K,
        }
    }
}

impl EngineConfig {
    /// Read a JSON config file; omitted keys keep their defaults
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| Error::from_artifact_io(path, e))?;
        serde_json::from_str(&content)
            .map_err(|e| Error::SchemaInvalid(format!("config {}: {}", path.display(), e)))
    }
}
