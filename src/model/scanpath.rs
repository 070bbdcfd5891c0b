use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Scanpaths of one subject or model, keyed by image name.
pub type ScanpathMap = BTreeMap<String, ScanpathRecord>;

/// One viewing trial in the shared JSON scanpath schema.
///
/// `target_bbox` is `[y0, x0, y1, x1]` in image pixels. `X`/`Y` are fixation
/// columns/rows; `T` (durations) is absent for model scanpaths.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanpathRecord {
    pub subject: String,
    pub dataset: String,
    pub image_height: u32,
    pub image_width: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub screen_height: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub screen_width: Option<u32>,
    pub receptive_height: u32,
    pub receptive_width: u32,
    pub target_found: bool,
    #[serde(default)]
    pub target_bbox: [f64; 4],
    #[serde(rename = "X")]
    pub x: Vec<f64>,
    #[serde(rename = "Y")]
    pub y: Vec<f64>,
    #[serde(rename = "T", default, skip_serializing_if = "Vec::is_empty")]
    pub t: Vec<f64>,
    #[serde(default)]
    pub target_object: String,
    pub max_fixations: u32,
}

impl ScanpathRecord {
    pub fn len(&self) -> usize {
        self.x.len().min(self.y.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn has_durations(&self) -> bool {
        !self.t.is_empty() && self.t.len() >= self.len()
    }

    pub fn truncate(&mut self, max_len: usize) {
        self.x.truncate(max_len);
        self.y.truncate(max_len);
        self.t.truncate(max_len);
    }

    pub fn last_fixation(&self) -> Option<(f64, f64)> {
        let n = self.len();
        if n == 0 {
            None
        } else {
            Some((self.x[n - 1], self.y[n - 1]))
        }
    }

    /// Copy of this record with every fixation mapped into an image of
    /// `height` x `width` pixels.
    pub fn rescaled(&self, height: u32, width: u32) -> ScanpathRecord {
        let mut out = self.clone();
        out.x = self
            .x
            .iter()
            .map(|&v| rescale_coordinate(v, self.image_width as f64, width as f64))
            .collect();
        out.y = self
            .y
            .iter()
            .map(|&v| rescale_coordinate(v, self.image_height as f64, height as f64))
            .collect();
        out.image_height = height;
        out.image_width = width;
        out
    }
}

pub fn rescale_coordinate(value: f64, old_size: f64, new_size: f64) -> f64 {
    if old_size <= 0.0 {
        return value;
    }
    ((value / old_size) * new_size).floor()
}
