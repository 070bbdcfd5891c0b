use std::collections::BTreeMap;

use serde::Serialize;

use crate::metrics::SubjectScanpaths;
use crate::model::scanpath::ScanpathMap;
use crate::report::mean;

/// Entry `k` is the fraction of trials whose target was found within `k + 1`
/// fixations, over `denominator` trials.
pub fn performance_curve(scanpaths: &ScanpathMap, denominator: usize, max_len: usize) -> Vec<f64> {
    let mut counts = vec![0usize; max_len];
    for record in scanpaths.values() {
        if !record.target_found || record.is_empty() {
            continue;
        }
        let first = record.len() - 1;
        for slot in counts.iter_mut().skip(first) {
            *slot += 1;
        }
    }
    if denominator == 0 {
        return vec![0.0; max_len];
    }
    counts
        .into_iter()
        .map(|c| c as f64 / denominator as f64)
        .collect()
}

#[derive(Debug, Clone, Serialize)]
pub struct ModelCurve {
    pub model: String,
    pub curve: Vec<f64>,
    pub area: f64,
    pub mean_abs_diff_to_humans: Option<f64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CumulativePerformance {
    pub dataset_name: String,
    pub number_of_images: usize,
    pub max_scanpath_length: usize,
    pub subjects: BTreeMap<String, Vec<f64>>,
    pub human_mean: Option<Vec<f64>>,
    pub models: Vec<ModelCurve>,
}

impl CumulativePerformance {
    pub fn new(dataset_name: &str, number_of_images: usize, max_scanpath_length: usize) -> Self {
        Self {
            dataset_name: dataset_name.to_string(),
            number_of_images,
            max_scanpath_length,
            subjects: BTreeMap::new(),
            human_mean: None,
            models: Vec::new(),
        }
    }

    /// Each subject is measured over the trials they actually performed.
    pub fn add_human_mean(&mut self, humans: &[SubjectScanpaths]) {
        for subject in humans {
            let curve = performance_curve(
                &subject.scanpaths,
                subject.scanpaths.len(),
                self.max_scanpath_length,
            );
            self.subjects.insert(subject.subject.clone(), curve);
        }
        if self.subjects.is_empty() {
            self.human_mean = None;
            return;
        }
        let n = self.subjects.len() as f64;
        let mut acc = vec![0.0; self.max_scanpath_length];
        for curve in self.subjects.values() {
            for (slot, v) in acc.iter_mut().zip(curve) {
                *slot += v;
            }
        }
        self.human_mean = Some(acc.into_iter().map(|v| v / n).collect());
    }

    pub fn add_model(&mut self, model_name: &str, model_scanpaths: &ScanpathMap) {
        if model_scanpaths.len() < self.number_of_images {
            tracing::warn!(
                model = model_name,
                "model has scanpaths for {} of {} images; missing images count as not found",
                model_scanpaths.len(),
                self.number_of_images
            );
        }
        let curve = performance_curve(
            model_scanpaths,
            self.number_of_images,
            self.max_scanpath_length,
        );
        let area = mean(&curve).unwrap_or(0.0);
        let mean_abs_diff_to_humans = self.human_mean.as_ref().and_then(|h| {
            let diffs: Vec<f64> = h.iter().zip(&curve).map(|(a, b)| (a - b).abs()).collect();
            mean(&diffs)
        });
        self.models.push(ModelCurve {
            model: model_name.to_string(),
            curve,
            area,
            mean_abs_diff_to_humans,
        });
    }

    pub fn human_area(&self) -> Option<f64> {
        self.human_mean.as_deref().and_then(mean)
    }
}
