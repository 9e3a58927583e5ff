use std::path::Path;

use serde::{Serialize, Deserialize};

use crate::gan::builder::ModelSpec;
use crate::train::{Evaluator, TrainConfig};
use crate::Result;

/// Complete description of a run: models, training schedule and evaluation.
///
/// Every section has a default, so a JSON file only needs the fields it
/// changes, e.g. `{"training": {"generator_steps": 5}}`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GanConfig {
    pub model: ModelSpec,
    pub training: TrainConfig,
    pub evaluation: Evaluator,
}

impl GanConfig {
    /// Serializes the config to a pretty-printed JSON file.
    pub fn save_json(&self, path: &Path) -> Result<()> {
        let file = std::fs::File::create(path)?;
        let writer = std::io::BufWriter::new(file);
        serde_json::to_writer_pretty(writer, self)?;
        Ok(())
    }

    /// Deserializes a `GanConfig` from a JSON file.
    pub fn load_json(path: &Path) -> Result<GanConfig> {
        let file = std::fs::File::open(path)?;
        let reader = std::io::BufReader::new(file);
        Ok(serde_json::from_reader(reader)?)
    }
}
