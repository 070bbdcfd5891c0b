#[derive(Debug, Clone)]
pub struct ConversionProfile {
    pub dataset_name: String,
    pub mat_variable: String,
    pub receptive_height: u32,
    pub receptive_width: u32,
    pub max_scanpath_length: usize,
    pub target_object: String,
}

impl ConversionProfile {
    pub fn cibs_v1() -> Self {
        Self {
            dataset_name: "cIBS Dataset".to_string(),
            mat_variable: "info_per_subj".to_string(),
            receptive_height: 32,
            receptive_width: 32,
            max_scanpath_length: 13,
            target_object: "TBD".to_string(),
        }
    }
}
