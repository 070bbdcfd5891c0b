use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::input::setup::load_dataset_info;
use crate::input::{InputError, file_name_string, read_json, sorted_dir_entries, write_json_pretty};
use crate::irl::trajectories::SCANPATHS_FILE;
use crate::metrics::agreement::{ModelAgreement, MultimatchEvaluator};
use crate::metrics::cumulative::CumulativePerformance;
use crate::metrics::load_human_scanpaths;
use crate::metrics::multimatch::MultimatchScores;
use crate::model::scanpath::ScanpathMap;
use crate::report::json::render_summary_json;
use crate::report::text::render_report_text;
use crate::report::{EvaluationSummary, build_summary, format_f64_6, format_opt};

pub const HUMAN_SCANPATHS_DIR: &str = "human_scanpaths";
pub const DATASET_INFO_FILE: &str = "dataset_info.json";

#[derive(Debug, Clone)]
pub struct DatasetEvaluation {
    pub results_dir: PathBuf,
    pub summary: EvaluationSummary,
}

/// `cIBS_dataset` -> `cIBS`
pub fn dataset_name_from_results_dir(dir_name: &str) -> &str {
    dir_name.split('_').next().unwrap_or(dir_name)
}

/// Evaluates every dataset under `results_dir` against the human data in
/// `datasets_dir`, writing reports next to the model results.
pub fn evaluate_all(
    results_dir: &Path,
    datasets_dir: &Path,
    only_dataset: Option<&str>,
) -> Result<Vec<DatasetEvaluation>, InputError> {
    let mut out = Vec::new();
    for dataset_results_dir in sorted_dir_entries(results_dir)? {
        if !dataset_results_dir.is_dir() {
            continue;
        }
        let dir_name = file_name_string(&dataset_results_dir);
        let dataset_name = dataset_name_from_results_dir(&dir_name).to_string();
        if only_dataset.is_some_and(|d| d != dataset_name) {
            continue;
        }
        let summary = evaluate_dataset(&dataset_name, &datasets_dir.join(&dataset_name), &dataset_results_dir)?;
        out.push(DatasetEvaluation {
            results_dir: dataset_results_dir,
            summary,
        });
    }
    Ok(out)
}

pub fn evaluate_dataset(
    dataset_name: &str,
    dataset_path: &Path,
    dataset_results_dir: &Path,
) -> Result<EvaluationSummary, InputError> {
    tracing::info!("evaluating {} ({})", dataset_name, dataset_results_dir.display());
    let dataset_info = load_dataset_info(&dataset_path.join(DATASET_INFO_FILE))?;
    let humans = load_human_scanpaths(&dataset_path.join(HUMAN_SCANPATHS_DIR))?;

    let mut cumulative = CumulativePerformance::new(
        dataset_name,
        dataset_info.number_of_images,
        dataset_info.max_scanpath_length,
    );
    cumulative.add_human_mean(&humans);
    let mut multimatch = MultimatchEvaluator::new(dataset_name, humans);

    for model_dir in sorted_dir_entries(dataset_results_dir)? {
        if !model_dir.is_dir() {
            continue;
        }
        let model_name = file_name_string(&model_dir);
        let scanpaths_file = model_dir.join(SCANPATHS_FILE);
        if !scanpaths_file.exists() {
            tracing::warn!("{}: no {}; skipping", model_name, SCANPATHS_FILE);
            continue;
        }
        let model_scanpaths: ScanpathMap = read_json(&scanpaths_file)?;
        tracing::info!("model {}: {} scanpaths", model_name, model_scanpaths.len());

        cumulative.add_model(&model_name, &model_scanpaths);
        multimatch.load_human_mean_per_image(&model_name, &model_scanpaths);
        multimatch.add_model_vs_humans_mean_per_image(&model_name, &model_scanpaths);
    }

    let agreements = multimatch.all_agreements();
    let summary = build_summary(
        &dataset_results_dir.display().to_string(),
        &cumulative,
        &agreements,
    );
    write_reports(dataset_results_dir, &cumulative, &agreements, &summary)?;
    Ok(summary)
}

pub fn write_reports(
    out_dir: &Path,
    cumulative: &CumulativePerformance,
    agreements: &[ModelAgreement],
    summary: &EvaluationSummary,
) -> Result<(), InputError> {
    fs::create_dir_all(out_dir)?;

    write_json_pretty(&out_dir.join("cumulative_performance.json"), cumulative)?;
    write_cumulative_tsv(cumulative, &out_dir.join("cumulative_performance.tsv"))?;
    write_json_pretty(&out_dir.join("multimatch.json"), &agreements)?;
    write_multimatch_tsv(agreements, &out_dir.join("multimatch.tsv"))?;

    let json = render_summary_json(summary)?;
    fs::write(out_dir.join("summary.json"), json)?;
    fs::write(out_dir.join("report.txt"), render_report_text(summary))?;
    Ok(())
}

fn write_cumulative_tsv(cumulative: &CumulativePerformance, path: &Path) -> std::io::Result<()> {
    let mut w = BufWriter::new(File::create(path)?);
    let mut header = vec!["fixations".to_string(), "humans_mean".to_string()];
    header.extend(cumulative.subjects.keys().map(|s| format!("subj{s}")));
    header.extend(cumulative.models.iter().map(|m| m.model.clone()));
    writeln!(w, "{}", header.join("\t"))?;

    for k in 0..cumulative.max_scanpath_length {
        let mut row = vec![
            (k + 1).to_string(),
            format_opt(cumulative.human_mean.as_ref().and_then(|h| h.get(k).copied())),
        ];
        row.extend(
            cumulative
                .subjects
                .values()
                .map(|c| format_opt(c.get(k).copied())),
        );
        row.extend(
            cumulative
                .models
                .iter()
                .map(|m| format_opt(m.curve.get(k).copied())),
        );
        writeln!(w, "{}", row.join("\t"))?;
    }
    w.flush()
}

fn push_scores(row: &mut Vec<String>, scores: Option<MultimatchScores>) {
    match scores {
        Some(s) => {
            row.push(format_f64_6(s.vector));
            row.push(format_f64_6(s.direction));
            row.push(format_f64_6(s.length));
            row.push(format_f64_6(s.position));
            row.push(format_opt(s.duration));
            row.push(format_f64_6(s.shape()));
        }
        None => row.extend(std::iter::repeat_n("NA".to_string(), 6)),
    }
}

fn write_multimatch_tsv(agreements: &[ModelAgreement], path: &Path) -> std::io::Result<()> {
    let mut w = BufWriter::new(File::create(path)?);
    let mut header = vec!["model".to_string(), "image".to_string()];
    for side in ["humans", "model"] {
        for measure in ["vector", "direction", "length", "position", "duration", "shape"] {
            header.push(format!("{side}_{measure}"));
        }
    }
    writeln!(w, "{}", header.join("\t"))?;

    for agreement in agreements {
        for image in &agreement.per_image {
            let mut row = vec![agreement.model.clone(), image.image.clone()];
            push_scores(&mut row, image.humans);
            push_scores(&mut row, image.model_vs_humans);
            writeln!(w, "{}", row.join("\t"))?;
        }
    }
    w.flush()
}

#[cfg(test)]
#[path = "../../tests/src_inline/pipeline/evaluate.rs"]
mod tests;
