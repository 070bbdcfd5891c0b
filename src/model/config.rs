use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::model::dataset::TrialProperties;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Multiprocessing {
    Enabled(bool),
    Workers(u32),
    Keyword(String),
}

impl Multiprocessing {
    pub fn is_enabled(&self) -> bool {
        match self {
            Multiprocessing::Enabled(on) => *on,
            Multiprocessing::Workers(n) => *n > 0,
            Multiprocessing::Keyword(k) => !k.is_empty() && !k.eq_ignore_ascii_case("false"),
        }
    }
}

impl Default for Multiprocessing {
    fn default() -> Self {
        Multiprocessing::Enabled(false)
    }
}

/// Search-model run configuration (`<config_dir>/<name>.json`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchConfig {
    pub search_model: String,
    pub target_similarity: String,
    pub prior: String,
    pub max_saccades: u32,
    pub cell_size: u32,
    pub scale_factor: f64,
    pub additive_shift: f64,
    pub seed: u64,
    #[serde(default)]
    pub multiprocessing: Multiprocessing,
    #[serde(default)]
    pub save_probability_maps: bool,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Resumable run state: the configuration and trials it started with plus
/// whatever progress the search model stored alongside them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Checkpoint {
    pub configuration: SearchConfig,
    pub trials_properties: Vec<TrialProperties>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}
