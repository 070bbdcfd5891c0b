use std::collections::BTreeMap;

use serde::Serialize;

use crate::metrics::SubjectScanpaths;
use crate::metrics::multimatch::{MultimatchParams, MultimatchScores, compare_records};
use crate::model::scanpath::{ScanpathMap, ScanpathRecord};
use crate::report::{mean, pearson};

/// Per-image Multimatch of a model against human subjects, alongside the
/// human-vs-human baseline computed at the model's image size.
#[derive(Debug, Clone)]
pub struct MultimatchEvaluator {
    pub dataset_name: String,
    humans: Vec<SubjectScanpaths>,
    human_mean: BTreeMap<String, BTreeMap<String, MultimatchScores>>,
    model_vs_humans: BTreeMap<String, BTreeMap<String, MultimatchScores>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ImageAgreement {
    pub image: String,
    pub humans: Option<MultimatchScores>,
    pub model_vs_humans: Option<MultimatchScores>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ModelAgreement {
    pub model: String,
    pub images_compared: usize,
    pub human_shape_mean: Option<f64>,
    pub model_shape_mean: Option<f64>,
    pub shape_correlation: Option<f64>,
    pub per_image: Vec<ImageAgreement>,
}

fn eligible(record: &ScanpathRecord) -> bool {
    record.target_found && record.len() >= 2
}

impl MultimatchEvaluator {
    pub fn new(dataset_name: &str, humans: Vec<SubjectScanpaths>) -> Self {
        Self {
            dataset_name: dataset_name.to_string(),
            humans,
            human_mean: BTreeMap::new(),
            model_vs_humans: BTreeMap::new(),
        }
    }

    fn humans_for_image(&self, image: &str, height: u32, width: u32) -> Vec<ScanpathRecord> {
        self.humans
            .iter()
            .filter_map(|s| s.scanpaths.get(image))
            .filter(|r| eligible(r))
            .map(|r| r.rescaled(height, width))
            .collect()
    }

    /// Human scores depend on the model because human scanpaths are rescaled
    /// to the model's image size first.
    pub fn load_human_mean_per_image(&mut self, model_name: &str, model_scanpaths: &ScanpathMap) {
        let mut per_image = BTreeMap::new();
        for (image, model_record) in model_scanpaths {
            let height = model_record.image_height;
            let width = model_record.image_width;
            let params = MultimatchParams::for_screen(width, height);
            let humans = self.humans_for_image(image, height, width);

            let mut scores = Vec::new();
            for i in 0..humans.len() {
                for j in (i + 1)..humans.len() {
                    if let Some(s) = compare_records(&humans[i], &humans[j], &params) {
                        scores.push(s);
                    }
                }
            }
            if let Some(m) = MultimatchScores::mean_of(&scores) {
                per_image.insert(image.clone(), m);
            }
        }
        tracing::debug!(
            model = model_name,
            images = per_image.len(),
            "human multimatch baseline computed"
        );
        self.human_mean.insert(model_name.to_string(), per_image);
    }

    pub fn add_model_vs_humans_mean_per_image(
        &mut self,
        model_name: &str,
        model_scanpaths: &ScanpathMap,
    ) {
        let mut per_image = BTreeMap::new();
        for (image, model_record) in model_scanpaths {
            if !eligible(model_record) {
                continue;
            }
            let height = model_record.image_height;
            let width = model_record.image_width;
            let params = MultimatchParams::for_screen(width, height);
            let scores: Vec<MultimatchScores> = self
                .humans_for_image(image, height, width)
                .iter()
                .filter_map(|h| compare_records(model_record, h, &params))
                .collect();
            if let Some(m) = MultimatchScores::mean_of(&scores) {
                per_image.insert(image.clone(), m);
            }
        }
        tracing::debug!(
            model = model_name,
            images = per_image.len(),
            "model vs humans multimatch computed"
        );
        self.model_vs_humans.insert(model_name.to_string(), per_image);
    }

    pub fn models(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .human_mean
            .keys()
            .chain(self.model_vs_humans.keys())
            .cloned()
            .collect();
        names.sort();
        names.dedup();
        names
    }

    pub fn model_agreement(&self, model_name: &str) -> ModelAgreement {
        let empty = BTreeMap::new();
        let humans = self.human_mean.get(model_name).unwrap_or(&empty);
        let models = self.model_vs_humans.get(model_name).unwrap_or(&empty);

        let mut images: Vec<&String> = humans.keys().chain(models.keys()).collect();
        images.sort();
        images.dedup();

        let per_image: Vec<ImageAgreement> = images
            .into_iter()
            .map(|image| ImageAgreement {
                image: image.clone(),
                humans: humans.get(image).copied(),
                model_vs_humans: models.get(image).copied(),
            })
            .collect();

        let mut paired_human = Vec::new();
        let mut paired_model = Vec::new();
        for row in &per_image {
            if let (Some(h), Some(m)) = (row.humans, row.model_vs_humans) {
                paired_human.push(h.shape());
                paired_model.push(m.shape());
            }
        }
        let human_shapes: Vec<f64> = humans.values().map(|s| s.shape()).collect();
        let model_shapes: Vec<f64> = models.values().map(|s| s.shape()).collect();

        ModelAgreement {
            model: model_name.to_string(),
            images_compared: paired_model.len(),
            human_shape_mean: mean(&human_shapes),
            model_shape_mean: mean(&model_shapes),
            shape_correlation: pearson(&paired_human, &paired_model),
            per_image,
        }
    }

    pub fn all_agreements(&self) -> Vec<ModelAgreement> {
        self.models()
            .iter()
            .map(|m| self.model_agreement(m))
            .collect()
    }
}
