use std::collections::BTreeMap;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Command;

use image::imageops::FilterType;
use serde::{Deserialize, Serialize};

use crate::input::{InputError, write_json_pretty};

pub const SEGMENT_WIDTH: u32 = 512;
pub const SEGMENT_HEIGHT: u32 = 320;
pub const RESIZED_FILE: &str = "resized.png";
pub const SEGMENTS_FILE: &str = "segments_info.json";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SegmentInfo {
    pub id: u32,
    pub category_id: u32,
    pub isthing: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub area: Option<u64>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

/// External panoptic predictor: `program [args..] <resized image>`, JSON
/// array of segments on stdout.
#[derive(Debug, Clone)]
pub struct Predictor {
    pub program: OsString,
    pub args: Vec<OsString>,
}

impl Predictor {
    pub fn run(&self, image_path: &Path) -> Result<Vec<SegmentInfo>, InputError> {
        tracing::debug!(
            "running predictor {} on {}",
            self.program.to_string_lossy(),
            image_path.display()
        );
        let output = Command::new(&self.program)
            .args(&self.args)
            .arg(image_path)
            .output()?;
        if !output.status.success() {
            return Err(InputError::External(format!(
                "{} exited with {}: {}",
                self.program.to_string_lossy(),
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }
        Ok(serde_json::from_slice(&output.stdout)?)
    }
}

#[derive(Debug, Clone)]
pub struct SegmentOutput {
    pub resized_path: PathBuf,
    pub segments_path: PathBuf,
    pub segments: Vec<SegmentInfo>,
}

pub fn resize_for_segmentation(image_path: &Path, out_path: &Path) -> Result<(), InputError> {
    let img = image::open(image_path)?;
    let resized = img.resize_exact(SEGMENT_WIDTH, SEGMENT_HEIGHT, FilterType::Triangle);
    resized.save(out_path)?;
    Ok(())
}

pub fn segment_image(
    image_path: &Path,
    out_dir: &Path,
    predictor: &Predictor,
) -> Result<SegmentOutput, InputError> {
    if !image_path.is_file() {
        return Err(InputError::MissingInput(format!(
            "image {} does not exist",
            image_path.display()
        )));
    }
    std::fs::create_dir_all(out_dir)?;

    let resized_path = out_dir.join(RESIZED_FILE);
    resize_for_segmentation(image_path, &resized_path)?;

    let segments = predictor.run(&resized_path)?;
    let segments_path = out_dir.join(SEGMENTS_FILE);
    write_json_pretty(&segments_path, &segments)?;
    tracing::info!(
        "{} segments written to {}",
        segments.len(),
        segments_path.display()
    );

    Ok(SegmentOutput {
        resized_path,
        segments_path,
        segments,
    })
}

#[cfg(test)]
#[path = "../../tests/src_inline/pipeline/segment.rs"]
mod tests;
