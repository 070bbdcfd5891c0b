use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetInfo {
    pub max_scanpath_length: usize,
    pub number_of_images: usize,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrialProperties {
    pub image: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TargetPosition {
    pub image: String,
    pub template: String,
    pub dataset: String,
    pub matched_row: u32,
    pub matched_column: u32,
    pub target_side_length: u32,
    pub target_columns: u32,
    pub image_height: u32,
    pub image_width: u32,
}
