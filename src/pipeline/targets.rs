use std::collections::VecDeque;
use std::path::Path;

use crate::input::masks::{Mask, load_mask, sort_natural};
use crate::input::{InputError, file_name_string, sorted_dir_entries, write_json_pretty};
use crate::model::dataset::TargetPosition;

pub const TARGETS_FILE: &str = "targets_positions.json";
pub const TARGETS_DATASET: &str = "VisualSearchZeroShot Natural Design Dataset";

/// `(start_row, start_col, end_row, end_col)`, end exclusive.
pub type RegionBox = (usize, usize, usize, usize);

/// Bounding box of the first 8-connected foreground region met in raster
/// order.
pub fn first_region_bbox(mask: &Mask) -> Option<RegionBox> {
    let seed = mask.pixels.iter().position(|&p| p)?;
    let (h, w) = (mask.height, mask.width);
    let mut visited = vec![false; h * w];
    let mut queue = VecDeque::new();
    visited[seed] = true;
    queue.push_back((seed / w, seed % w));

    let (mut min_r, mut min_c, mut max_r, mut max_c) = (usize::MAX, usize::MAX, 0, 0);
    while let Some((r, c)) = queue.pop_front() {
        min_r = min_r.min(r);
        min_c = min_c.min(c);
        max_r = max_r.max(r);
        max_c = max_c.max(c);
        for dr in -1i64..=1 {
            for dc in -1i64..=1 {
                if dr == 0 && dc == 0 {
                    continue;
                }
                let nr = r as i64 + dr;
                let nc = c as i64 + dc;
                if nr < 0 || nc < 0 || nr >= h as i64 || nc >= w as i64 {
                    continue;
                }
                let idx = nr as usize * w + nc as usize;
                if mask.pixels[idx] && !visited[idx] {
                    visited[idx] = true;
                    queue.push_back((nr as usize, nc as usize));
                }
            }
        }
    }
    Some((min_r, min_c, max_r + 1, max_c + 1))
}

/// `img007.jpg` / `t007.jpg`
pub fn stimulus_name(image_id: u32, template: bool) -> String {
    if template {
        format!("t{image_id:03}.jpg")
    } else {
        format!("img{image_id:03}.jpg")
    }
}

/// `gt12.png` -> 12
pub fn mask_image_id(file_name: &str) -> Result<u32, InputError> {
    let id = file_name
        .get(2..file_name.len().saturating_sub(4))
        .unwrap_or("");
    id.parse().map_err(|_| {
        InputError::InvalidInput(format!("cannot read an image id from '{file_name}'"))
    })
}

pub fn target_position(image_id: u32, mask: &Mask, dataset_name: &str) -> Option<TargetPosition> {
    let (start_row, start_col, end_row, end_col) = first_region_bbox(mask)?;
    Some(TargetPosition {
        image: stimulus_name(image_id, false),
        template: stimulus_name(image_id, true),
        dataset: dataset_name.to_string(),
        matched_row: start_row as u32,
        matched_column: start_col as u32,
        target_side_length: (end_row - start_row) as u32,
        target_columns: (end_col - start_col) as u32,
        image_height: mask.height as u32,
        image_width: mask.width as u32,
    })
}

pub fn build_target_positions(
    gt_dir: &Path,
    dataset_name: &str,
) -> Result<Vec<TargetPosition>, InputError> {
    let mut names: Vec<String> = sorted_dir_entries(gt_dir)?
        .iter()
        .filter(|p| p.is_file())
        .map(|p| file_name_string(p))
        .collect();
    sort_natural(&mut names);

    let mut out = Vec::with_capacity(names.len());
    for name in names {
        let image_id = mask_image_id(&name)?;
        let mask = load_mask(&gt_dir.join(&name))?;
        match target_position(image_id, &mask, dataset_name) {
            Some(pos) => out.push(pos),
            None => tracing::warn!("{}: mask has no foreground; skipping", name),
        }
    }
    Ok(out)
}

pub fn write_target_positions(
    gt_dir: &Path,
    out_path: &Path,
    dataset_name: &str,
) -> Result<usize, InputError> {
    let positions = build_target_positions(gt_dir, dataset_name)?;
    write_json_pretty(out_path, &positions)?;
    tracing::info!(
        "wrote {} target positions to {}",
        positions.len(),
        out_path.display()
    );
    Ok(positions.len())
}

#[cfg(test)]
#[path = "../../tests/src_inline/pipeline/targets.rs"]
mod tests;
