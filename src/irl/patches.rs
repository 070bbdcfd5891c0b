/// Regular grid of patches over an image. `patch_size` is `(width, height)`
/// in pixels and `patch_num` is `(columns, rows)`. Actions index patches in
/// row-major order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PatchGrid {
    pub patch_size: (u32, u32),
    pub patch_num: (u32, u32),
}

/// Target box as `[x, y, width, height]`.
pub type BoxXywh = [f64; 4];

impl PatchGrid {
    pub fn new(patch_size: (u32, u32), patch_num: (u32, u32)) -> Self {
        Self {
            patch_size,
            patch_num,
        }
    }

    pub fn n_actions(&self) -> usize {
        (self.patch_num.0 * self.patch_num.1) as usize
    }

    pub fn pos_to_action(&self, center_x: f64, center_y: f64) -> usize {
        let x = (center_x / self.patch_size.0 as f64).floor() as usize;
        let y = (center_y / self.patch_size.1 as f64).floor() as usize;
        self.patch_num.0 as usize * y + x
    }

    /// Pixel centre of the patch an action points at.
    pub fn action_to_pos(&self, action: usize) -> (f64, f64) {
        let cols = self.patch_num.0 as usize;
        let patch_x = (action % cols) as f64;
        let patch_y = (action / cols) as f64;
        let (w, h) = (self.patch_size.0 as f64, self.patch_size.1 as f64);
        (patch_x * w + w / 2.0, patch_y * h + h / 2.0)
    }

    /// Fraction of each patch covered by `bbox`, row-major `rows x cols`.
    pub fn overlap_ratio(&self, bbox: &BoxXywh) -> Vec<f32> {
        let cols = self.patch_num.0 as usize;
        let rows = self.patch_num.1 as usize;
        let (pw, ph) = (self.patch_size.0 as f64, self.patch_size.1 as f64);
        let patch_area = pw * ph;
        let mut ratio = vec![0.0f32; rows * cols];
        if cols == 0 || rows == 0 {
            return ratio;
        }

        let (tl_x, tl_y) = (bbox[0], bbox[1]);
        let (br_x, br_y) = (bbox[0] + bbox[2], bbox[1] + bbox[3]);
        let lx = (tl_x / pw).floor().max(0.0) as usize;
        let ly = (tl_y / ph).floor().max(0.0) as usize;
        let ux = ((br_x / pw).floor().max(0.0) as usize).min(cols - 1);
        let uy = ((br_y / ph).floor().max(0.0) as usize).min(rows - 1);

        for x in lx..=ux {
            for y in ly..=uy {
                let patch_tlx = x as f64 * pw;
                let patch_tly = y as f64 * ph;
                let patch_brx = patch_tlx + pw;
                let patch_bry = patch_tly + ph;

                let aoi_w = (br_x.min(patch_brx) - tl_x.max(patch_tlx)).max(0.0);
                let aoi_h = (br_y.min(patch_bry) - tl_y.max(patch_tly)).max(0.0);
                ratio[y * cols + x] = (aoi_w * aoi_h / patch_area) as f32;
            }
        }
        ratio
    }

    /// 1.0 on every patch the box overlaps. A box overlapping no patch marks
    /// the patch holding its centre, clamped to the grid.
    pub fn multi_hot(&self, bbox: &BoxXywh) -> Vec<f32> {
        let ratio = self.overlap_ratio(bbox);
        let mut hot: Vec<f32> = ratio
            .iter()
            .map(|&r| if r > 0.0 { 1.0 } else { 0.0 })
            .collect();
        if !hot.is_empty() && hot.iter().all(|&v| v == 0.0) {
            let cols = self.patch_num.0 as usize;
            let rows = self.patch_num.1 as usize;
            let cx = bbox[0] + bbox[2] / 2.0;
            let cy = bbox[1] + bbox[3] / 2.0;
            let col = ((cx / self.patch_size.0 as f64).floor().max(0.0) as usize).min(cols - 1);
            let row = ((cy / self.patch_size.1 as f64).floor().max(0.0) as usize).min(rows - 1);
            hot[row * cols + col] = 1.0;
        }
        hot
    }
}

/// Row-major `h x w` mask, 1.0 within distance `r` of `(x, y)`.
pub fn foveal_mask(x: f64, y: f64, r: f64, h: usize, w: usize) -> Vec<f32> {
    let mut mask = vec![0.0f32; h * w];
    for row in 0..h {
        for col in 0..w {
            let dist = (col as f64 - x).hypot(row as f64 - y);
            if dist <= r {
                mask[row * w + col] = 1.0;
            }
        }
    }
    mask
}

#[cfg(test)]
#[path = "../../tests/src_inline/irl/patches.rs"]
mod tests;
