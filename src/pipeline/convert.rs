use std::path::Path;

use crate::input::subjects::{SubjectTrial, read_subject_trials, subject_id_from_filename};
use crate::input::{InputError, file_name_string, sorted_dir_entries, write_json_pretty};
use crate::model::profile::ConversionProfile;
use crate::model::scanpath::{ScanpathMap, ScanpathRecord};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConversionStats {
    pub subjects: usize,
    pub trials_written: usize,
    pub targets_found: usize,
    pub wrong_targets_found: usize,
    pub truncated: usize,
    pub empty: usize,
}

pub fn subject_output_name(subject_id: &str) -> String {
    format!("subj{subject_id}_scanpaths.json")
}

/// Converts every `.mat` subject file in `subjects_dir` into
/// `save_dir/subj<id>_scanpaths.json`.
pub fn convert_subjects(
    subjects_dir: &Path,
    save_dir: &Path,
    profile: &ConversionProfile,
) -> Result<ConversionStats, InputError> {
    let mut stats = ConversionStats::default();
    for path in sorted_dir_entries(subjects_dir)? {
        if path.extension().is_none_or(|ext| ext != "mat") {
            continue;
        }
        let file_name = file_name_string(&path);
        tracing::info!("processing {}", file_name);

        let subject_id = subject_id_from_filename(&file_name)?;
        let trials = read_subject_trials(&path, &profile.mat_variable)?;
        let scanpaths = convert_trials(&subject_id, &trials, profile, &mut stats);

        write_json_pretty(&save_dir.join(subject_output_name(&subject_id)), &scanpaths)?;
        stats.subjects += 1;
    }

    tracing::info!(
        "targets found: {}. wrong targets found: {}",
        stats.targets_found,
        stats.wrong_targets_found
    );
    tracing::info!("truncated scanpaths: {}", stats.truncated);
    Ok(stats)
}

pub fn convert_trials(
    subject_id: &str,
    trials: &[SubjectTrial],
    profile: &ConversionProfile,
    stats: &mut ConversionStats,
) -> ScanpathMap {
    let mut out = ScanpathMap::new();
    for (idx, trial) in trials.iter().enumerate() {
        if let Some(record) = convert_trial(subject_id, idx + 1, trial, profile, stats) {
            out.insert(trial.image_name.clone(), record);
            stats.trials_written += 1;
        }
    }
    out
}

fn convert_trial(
    subject_id: &str,
    trial_no: usize,
    trial: &SubjectTrial,
    profile: &ConversionProfile,
    stats: &mut ConversionStats,
) -> Option<ScanpathRecord> {
    let r = trial.target_rect;
    // [lower_row, lower_column, upper_row, upper_column], 0-based
    let target_bbox = [r[1] - 1.0, r[0] - 1.0, r[3] - 1.0, r[2] - 1.0];
    let mut target_found = trial.target_found;
    let mut max_fixations = trial.nsaccades_allowed as usize + 1;

    let x: Vec<f64> = trial.x.iter().map(|&v| (v - 1.0).max(0.0)).collect();
    let y: Vec<f64> = trial.y.iter().map(|&v| (v - 1.0).max(0.0)).collect();

    if x.is_empty() || y.is_empty() {
        tracing::warn!(
            "subject: {}; stimuli: {}; trial: {}. empty scanpath",
            subject_id,
            trial.image_name,
            trial_no
        );
        stats.empty += 1;
        return None;
    }

    let mut record = ScanpathRecord {
        subject: subject_id.to_string(),
        dataset: profile.dataset_name.clone(),
        image_height: trial.image_size.0,
        image_width: trial.image_size.1,
        screen_height: Some(trial.screen_size.0),
        screen_width: Some(trial.screen_size.1),
        receptive_height: profile.receptive_height,
        receptive_width: profile.receptive_width,
        target_found,
        target_bbox,
        x,
        y,
        t: trial.dur.clone(),
        target_object: profile.target_object.clone(),
        max_fixations: 0,
    };

    let max_len = profile.max_scanpath_length;
    if max_fixations > max_len {
        max_fixations = max_len;
        stats.truncated += 1;
        if record.len() > max_len {
            record.truncate(max_len);
            target_found = false;
        }
    }

    if target_found {
        if let Some((last_x, last_y)) = record.last_fixation() {
            if within_receptive_bounds(&target_bbox, last_x, last_y, profile) {
                stats.targets_found += 1;
            } else {
                tracing::warn!(
                    "subject: {}; stimuli: {}; trial: {}. last fixation doesn't match target's bounds",
                    subject_id,
                    trial.image_name,
                    trial_no
                );
                tracing::warn!(
                    "target's bounds: {:?}. last fixation: ({}, {})",
                    target_bbox,
                    last_y,
                    last_x
                );
                stats.wrong_targets_found += 1;
                target_found = false;
            }
        }
    }

    record.target_found = target_found;
    record.max_fixations = max_fixations as u32;
    Some(record)
}

/// Whether `(x, y)` lies inside `bbox` (`[y0, x0, y1, x1]`) grown by the
/// receptive size on every side, borders included.
pub fn within_receptive_bounds(bbox: &[f64; 4], x: f64, y: f64, profile: &ConversionProfile) -> bool {
    let rh = profile.receptive_height as f64;
    let rw = profile.receptive_width as f64;
    bbox[0] - rh <= y && bbox[2] + rh >= y && bbox[1] - rw <= x && bbox[3] + rw >= x
}

#[cfg(test)]
#[path = "../../tests/src_inline/pipeline/convert.rs"]
mod tests;
