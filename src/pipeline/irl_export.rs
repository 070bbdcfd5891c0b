use std::path::{Path, PathBuf};

use crate::input::{InputError, read_json};
use crate::irl::patches::PatchGrid;
use crate::irl::trajectories::{
    ActionTrajectory, SCANPATHS_FILE, TargetAnnotations, actions_to_scanpaths,
    cut_fixations_on_target, save_scanpaths,
};
use crate::model::scanpath::ScanpathMap;

#[derive(Debug, Clone)]
pub struct IrlExportParams {
    pub grid: PatchGrid,
    pub image_width: u32,
    pub image_height: u32,
    pub dataset_name: String,
    pub max_saccades: u32,
}

pub fn export_scanpaths(
    trajectories_path: &Path,
    annotations_path: Option<&Path>,
    output_dir: &Path,
    params: &IrlExportParams,
) -> Result<ScanpathMap, InputError> {
    let trajectories: Vec<ActionTrajectory> = read_json(trajectories_path)?;
    tracing::info!(
        "{} action trajectories read from {}",
        trajectories.len(),
        trajectories_path.display()
    );

    let mut scanpaths = actions_to_scanpaths(
        &trajectories,
        &params.grid,
        params.image_width,
        params.image_height,
        &params.dataset_name,
        params.max_saccades,
    );

    if let Some(path) = annotations_path {
        let annotations: TargetAnnotations = read_json(path)?;
        cut_fixations_on_target(&mut scanpaths, &annotations)?;
        let found = scanpaths.values().filter(|r| r.target_found).count();
        tracing::info!("target reached in {} of {} scanpaths", found, scanpaths.len());
    }

    save_scanpaths(output_dir, &scanpaths)?;
    Ok(scanpaths)
}

pub fn scanpaths_output_path(output_dir: &Path) -> PathBuf {
    output_dir.join(SCANPATHS_FILE)
}

#[cfg(test)]
#[path = "../../tests/src_inline/pipeline/irl_export.rs"]
mod tests;
