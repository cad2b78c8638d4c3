//! Model description files for the `overlay` command

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use suitgis_algorithms::membership::TransformationSpec;
use suitgis_algorithms::overlay::OverlayConfig;

/// A whole suitability model: overlay settings plus one entry per criterion.
///
/// ```json
/// {
///   "weightMethod": "percentage",
///   "fromScale": 1,
///   "toScale": 10,
///   "criteria": [
///     { "name": "elevation", "path": "dem.tif", "weight": 60,
///       "transform": { "kind": "continuous", "name": "small" } }
///   ]
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    #[serde(flatten)]
    pub overlay: OverlayConfig,
    pub criteria: Vec<CriterionConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CriterionConfig {
    pub name: String,
    /// Raster path, relative to the model file
    pub path: PathBuf,
    #[serde(default = "default_weight")]
    pub weight: f64,
    pub transform: TransformationSpec,
}

fn default_weight() -> f64 {
    1.0
}

impl ModelConfig {
    /// Read a model file, resolving criterion paths against its directory
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read model file {}", path.display()))?;
        let mut config = Self::from_json(&text)
            .with_context(|| format!("Invalid model file {}", path.display()))?;
        if let Some(base) = path.parent() {
            for criterion in &mut config.criteria {
                if criterion.path.is_relative() {
                    criterion.path = base.join(&criterion.path);
                }
            }
        }
        Ok(config)
    }

    pub fn from_json(text: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(text)?;
        if config.criteria.is_empty() {
            anyhow::bail!("model has no criteria");
        }
        Ok(config)
    }
}

/// A transformation spec given inline as JSON or as a path to a JSON file
pub fn parse_spec(arg: &str) -> Result<TransformationSpec> {
    let text = if arg.trim_start().starts_with('{') {
        arg.to_string()
    } else {
        std::fs::read_to_string(arg).with_context(|| format!("Failed to read spec file {}", arg))?
    };
    serde_json::from_str(&text).context("Invalid transformation spec")
}
