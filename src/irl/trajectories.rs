use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::input::{InputError, write_json_pretty};
use crate::irl::patches::{BoxXywh, PatchGrid};
use crate::model::scanpath::{ScanpathMap, ScanpathRecord};

pub const MODEL_SUBJECT: &str = "IRL Model";
pub const SCANPATHS_FILE: &str = "Scanpaths.json";

/// Target boxes keyed by `<task>_<image>`.
pub type TargetAnnotations = HashMap<String, BoxXywh>;

pub fn annotation_key(task: &str, image: &str) -> String {
    format!("{task}_{image}")
}

/// Fixations of one search episode, in image pixels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trajectory {
    pub task: String,
    pub name: String,
    #[serde(rename = "X")]
    pub x: Vec<f64>,
    #[serde(rename = "Y")]
    pub y: Vec<f64>,
}

/// Actions taken by the policy for one image. `initial_fix` is `(x, y)`
/// normalized to `[0, 1]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionTrajectory {
    pub task: String,
    pub image: String,
    pub initial_fix: (f64, f64),
    #[serde(default)]
    pub condition: String,
    pub actions: Vec<usize>,
}

/// 1-based index of the first fixation strictly inside `bbox`.
pub fn steps_to_target(xs: &[f64], ys: &[f64], bbox: &BoxXywh) -> Option<usize> {
    xs.iter()
        .zip(ys)
        .position(|(&x, &y)| {
            x > bbox[0] && x < bbox[0] + bbox[2] && y > bbox[1] && y < bbox[1] + bbox[3]
        })
        .map(|idx| idx + 1)
}

/// Truncates every scanpath at its first fixation on target and records the
/// target box as `[y0, x0, y1, x1]`.
pub fn cut_fixations_on_target(
    scanpaths: &mut ScanpathMap,
    annotations: &TargetAnnotations,
) -> Result<(), InputError> {
    for (image_name, record) in scanpaths.iter_mut() {
        let key = annotation_key(&record.target_object, image_name);
        let bbox = annotations
            .get(&key)
            .ok_or_else(|| InputError::MissingInput(format!("target annotation for {key}")))?;
        if let Some(steps) = steps_to_target(&record.x, &record.y, bbox) {
            record.target_found = true;
            record.truncate(steps);
        }
        record.target_bbox = [bbox[1], bbox[0], bbox[1] + bbox[3], bbox[0] + bbox[2]];
    }
    Ok(())
}

/// Steps to target of every trajectory, grouped by task. Trajectories that
/// reach the target are truncated there; `None` marks a miss.
pub fn steps_per_task(
    trajectories: &mut [Trajectory],
    annotations: &TargetAnnotations,
    tasks: &[String],
) -> Result<BTreeMap<String, Vec<Option<usize>>>, InputError> {
    let mut out = BTreeMap::new();
    for task in tasks {
        let mut steps = Vec::new();
        for traj in trajectories.iter_mut().filter(|t| &t.task == task) {
            let key = annotation_key(&traj.task, &traj.name);
            let bbox = annotations
                .get(&key)
                .ok_or_else(|| InputError::MissingInput(format!("target annotation for {key}")))?;
            let step = steps_to_target(&traj.x, &traj.y, bbox);
            if let Some(n) = step {
                traj.x.truncate(n);
                traj.y.truncate(n);
            }
            steps.push(step);
        }
        out.insert(task.clone(), steps);
    }
    Ok(out)
}

/// Fields shared by every scanpath a model writes for one dataset.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ModelRecordInfo<'a> {
    pub model_name: &'a str,
    pub dataset_name: &'a str,
    /// `(height, width)`
    pub image_size: (u32, u32),
    /// `(height, width)`
    pub receptive_size: (u32, u32),
    pub max_saccades: u32,
}

pub fn model_scanpath_record(
    info: &ModelRecordInfo<'_>,
    target_object: &str,
    xs: &[f64],
    ys: &[f64],
) -> ScanpathRecord {
    ScanpathRecord {
        subject: info.model_name.to_string(),
        dataset: info.dataset_name.to_string(),
        image_height: info.image_size.0,
        image_width: info.image_size.1,
        screen_height: None,
        screen_width: None,
        receptive_height: info.receptive_size.0,
        receptive_width: info.receptive_size.1,
        target_found: false,
        target_bbox: [0.0; 4],
        x: xs.iter().map(|v| v.trunc()).collect(),
        y: ys.iter().map(|v| v.trunc()).collect(),
        t: Vec::new(),
        target_object: target_object.to_string(),
        max_fixations: info.max_saccades + 1,
    }
}

pub fn actions_to_scanpaths(
    trajectories: &[ActionTrajectory],
    grid: &PatchGrid,
    image_width: u32,
    image_height: u32,
    dataset_name: &str,
    max_saccades: u32,
) -> ScanpathMap {
    let cols = grid.patch_num.0 as f64;
    let rows = grid.patch_num.1 as f64;
    let info = ModelRecordInfo {
        model_name: MODEL_SUBJECT,
        dataset_name,
        image_size: (image_height, image_width),
        receptive_size: (grid.patch_size.1, grid.patch_size.0),
        max_saccades,
    };
    let mut scanpaths = ScanpathMap::new();
    for traj in trajectories {
        let mut xs = Vec::with_capacity(traj.actions.len() + 1);
        let mut ys = Vec::with_capacity(traj.actions.len() + 1);
        xs.push(traj.initial_fix.0 * image_width as f64);
        ys.push(traj.initial_fix.1 * image_height as f64);
        for &a in &traj.actions {
            let px = (a % grid.patch_num.0 as usize) as f64 / cols;
            let py = (a / grid.patch_num.0 as usize) as f64 / rows;
            xs.push(px * image_width as f64);
            ys.push(py * image_height as f64);
        }
        let record = model_scanpath_record(&info, &traj.task, &xs, &ys);
        scanpaths.insert(traj.image.clone(), record);
    }
    scanpaths
}

/// Writes `Scanpaths.json`. Model coordinates are whole pixels and are
/// written as integers.
pub fn save_scanpaths(output_path: &Path, scanpaths: &ScanpathMap) -> Result<(), InputError> {
    let mut value = serde_json::to_value(scanpaths)?;
    if let Some(records) = value.as_object_mut() {
        for record in records.values_mut() {
            for key in ["X", "Y"] {
                if let Some(Value::Array(coords)) = record.get_mut(key) {
                    for c in coords.iter_mut() {
                        if let Some(v) = c.as_f64() {
                            *c = Value::from(v.trunc() as i64);
                        }
                    }
                }
            }
        }
    }
    write_json_pretty(&output_path.join(SCANPATHS_FILE), &value)
}

#[cfg(test)]
#[path = "../../tests/src_inline/irl/trajectories.rs"]
mod tests;
