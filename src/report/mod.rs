use serde::Serialize;

use crate::metrics::agreement::ModelAgreement;
use crate::metrics::cumulative::CumulativePerformance;

pub mod json;
pub mod text;

#[derive(Debug, Clone, Serialize)]
pub struct CumulativeStat {
    pub model: String,
    pub area: f64,
    pub mean_abs_diff_to_humans: Option<f64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct MultimatchStat {
    pub model: String,
    pub images_compared: usize,
    pub human_shape_mean: Option<f64>,
    pub model_shape_mean: Option<f64>,
    pub shape_correlation: Option<f64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct EvaluationSummary {
    pub tool: String,
    pub version: String,
    pub dataset: String,
    pub results_dir: String,
    pub number_of_images: usize,
    pub max_scanpath_length: usize,
    pub human_subjects: usize,
    pub human_area: Option<f64>,
    pub cumulative: Vec<CumulativeStat>,
    pub multimatch: Vec<MultimatchStat>,
}

pub fn build_summary(
    results_dir: &str,
    cumulative: &CumulativePerformance,
    agreements: &[ModelAgreement],
) -> EvaluationSummary {
    EvaluationSummary {
        tool: env!("CARGO_PKG_NAME").to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        dataset: cumulative.dataset_name.clone(),
        results_dir: results_dir.to_string(),
        number_of_images: cumulative.number_of_images,
        max_scanpath_length: cumulative.max_scanpath_length,
        human_subjects: cumulative.subjects.len(),
        human_area: cumulative.human_area(),
        cumulative: cumulative
            .models
            .iter()
            .map(|m| CumulativeStat {
                model: m.model.clone(),
                area: m.area,
                mean_abs_diff_to_humans: m.mean_abs_diff_to_humans,
            })
            .collect(),
        multimatch: agreements
            .iter()
            .map(|a| MultimatchStat {
                model: a.model.clone(),
                images_compared: a.images_compared,
                human_shape_mean: a.human_shape_mean,
                model_shape_mean: a.model_shape_mean,
                shape_correlation: a.shape_correlation,
            })
            .collect(),
    }
}

pub fn format_f64_6(v: f64) -> String {
    format!("{:.6}", v)
}

pub fn format_opt(v: Option<f64>) -> String {
    match v {
        Some(v) => format_f64_6(v),
        None => "NA".to_string(),
    }
}

pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Pearson correlation; `None` for fewer than two pairs or zero variance.
pub fn pearson(a: &[f64], b: &[f64]) -> Option<f64> {
    let n = a.len().min(b.len());
    if n < 2 {
        return None;
    }
    let ma = mean(&a[..n])?;
    let mb = mean(&b[..n])?;
    let mut cov = 0.0;
    let mut va = 0.0;
    let mut vb = 0.0;
    for i in 0..n {
        let da = a[i] - ma;
        let db = b[i] - mb;
        cov += da * db;
        va += da * da;
        vb += db * db;
    }
    if va <= 0.0 || vb <= 0.0 {
        return None;
    }
    Some(cov / (va.sqrt() * vb.sqrt()))
}

#[cfg(test)]
#[path = "../../tests/src_inline/report/mod.rs"]
mod tests;
