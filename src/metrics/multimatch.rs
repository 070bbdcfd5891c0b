use std::f64::consts::PI;

use serde::Serialize;

use crate::model::scanpath::ScanpathRecord;

/// A saccade between two consecutive fixations. `x`/`y` is the fixation the
/// saccade starts from and `duration` that fixation's duration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Saccade {
    pub x: f64,
    pub y: f64,
    pub len_x: f64,
    pub len_y: f64,
    pub rho: f64,
    pub theta: f64,
    pub duration: Option<f64>,
}

impl Saccade {
    fn new(x: f64, y: f64, len_x: f64, len_y: f64, duration: Option<f64>) -> Self {
        Self {
            x,
            y,
            len_x,
            len_y,
            rho: len_x.hypot(len_y),
            theta: len_y.atan2(len_x),
            duration,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MultimatchScores {
    pub vector: f64,
    pub direction: f64,
    pub length: f64,
    pub position: f64,
    pub duration: Option<f64>,
}

impl MultimatchScores {
    /// Mean of the four spatial measures.
    pub fn shape(&self) -> f64 {
        (self.vector + self.direction + self.length + self.position) / 4.0
    }

    pub fn mean_of(scores: &[MultimatchScores]) -> Option<MultimatchScores> {
        if scores.is_empty() {
            return None;
        }
        let n = scores.len() as f64;
        let durations: Vec<f64> = scores.iter().filter_map(|s| s.duration).collect();
        Some(MultimatchScores {
            vector: scores.iter().map(|s| s.vector).sum::<f64>() / n,
            direction: scores.iter().map(|s| s.direction).sum::<f64>() / n,
            length: scores.iter().map(|s| s.length).sum::<f64>() / n,
            position: scores.iter().map(|s| s.position).sum::<f64>() / n,
            duration: if durations.len() == scores.len() {
                Some(durations.iter().sum::<f64>() / n)
            } else {
                None
            },
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimplifyThresholds {
    /// Saccades shorter than this (pixels) are merged with their neighbour.
    pub amplitude: f64,
    /// Consecutive saccades closer than this (degrees) are merged.
    pub direction_deg: f64,
    /// Only fixations shorter than this may be merged away.
    pub duration: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MultimatchParams {
    pub screen_width: f64,
    pub screen_height: f64,
    pub simplify: Option<SimplifyThresholds>,
}

impl MultimatchParams {
    pub fn for_screen(width: u32, height: u32) -> Self {
        Self {
            screen_width: width as f64,
            screen_height: height as f64,
            simplify: None,
        }
    }

    fn diagonal(&self) -> f64 {
        self.screen_width.hypot(self.screen_height)
    }
}

pub fn saccades_from_record(record: &ScanpathRecord) -> Vec<Saccade> {
    let durations = if record.has_durations() {
        Some(&record.t[..])
    } else {
        None
    };
    saccade_vectors(&record.x[..record.len()], &record.y[..record.len()], durations)
}

pub fn saccade_vectors(xs: &[f64], ys: &[f64], durations: Option<&[f64]>) -> Vec<Saccade> {
    let n = xs.len().min(ys.len());
    let mut out = Vec::with_capacity(n.saturating_sub(1));
    for i in 1..n {
        let duration = durations.and_then(|d| d.get(i - 1).copied());
        out.push(Saccade::new(
            xs[i - 1],
            ys[i - 1],
            xs[i] - xs[i - 1],
            ys[i] - ys[i - 1],
            duration,
        ));
    }
    out
}

/// Merges short saccades and saccades with similar direction until nothing
/// changes. A merge only removes a fixation shorter than the duration
/// threshold; missing durations count as zero.
pub fn simplify(saccades: &[Saccade], th: &SimplifyThresholds) -> Vec<Saccade> {
    let mut current = saccades.to_vec();
    loop {
        let by_direction = merge_pass(&current, |a, b| {
            angle_difference(a.theta, b.theta).to_degrees() <= th.direction_deg
                && b.duration.unwrap_or(0.0) < th.duration
        });
        let by_amplitude = merge_pass(&by_direction, |a, b| {
            a.rho < th.amplitude && b.rho < th.amplitude && b.duration.unwrap_or(0.0) < th.duration
        });
        if by_amplitude.len() == current.len() {
            return by_amplitude;
        }
        current = by_amplitude;
    }
}

fn merge_pass(saccades: &[Saccade], should_merge: impl Fn(&Saccade, &Saccade) -> bool) -> Vec<Saccade> {
    let mut out = Vec::with_capacity(saccades.len());
    let mut i = 0;
    while i < saccades.len() {
        let a = saccades[i];
        if i + 1 < saccades.len() && should_merge(&a, &saccades[i + 1]) {
            let b = saccades[i + 1];
            let duration = match (a.duration, b.duration) {
                (Some(da), Some(db)) => Some(da + db),
                (da, db) => da.or(db),
            };
            out.push(Saccade::new(
                a.x,
                a.y,
                a.len_x + b.len_x,
                a.len_y + b.len_y,
                duration,
            ));
            i += 2;
        } else {
            out.push(a);
            i += 1;
        }
    }
    out
}

fn angle_difference(a: f64, b: f64) -> f64 {
    let d = (a - b).abs() % (2.0 * PI);
    if d > PI { 2.0 * PI - d } else { d }
}

fn vector_difference(a: &Saccade, b: &Saccade) -> f64 {
    (a.len_x - b.len_x).hypot(a.len_y - b.len_y)
}

/// Cheapest monotone path through the vector-difference matrix, from the
/// first pair of saccades to the last, moving right, down or diagonally.
pub fn align(a: &[Saccade], b: &[Saccade]) -> Vec<(usize, usize)> {
    let (n, m) = (a.len(), b.len());
    if n == 0 || m == 0 {
        return Vec::new();
    }
    let cost = |i: usize, j: usize| vector_difference(&a[i], &b[j]);
    let mut acc = vec![vec![f64::INFINITY; m]; n];
    for i in 0..n {
        for j in 0..m {
            let here = cost(i, j);
            if i == 0 && j == 0 {
                acc[i][j] = here;
                continue;
            }
            let mut best = f64::INFINITY;
            if i > 0 && j > 0 {
                best = best.min(acc[i - 1][j - 1]);
            }
            if i > 0 {
                best = best.min(acc[i - 1][j]);
            }
            if j > 0 {
                best = best.min(acc[i][j - 1]);
            }
            acc[i][j] = here + best;
        }
    }

    let mut path = vec![(n - 1, m - 1)];
    let (mut i, mut j) = (n - 1, m - 1);
    while i > 0 || j > 0 {
        let (ni, nj) = if i > 0 && j > 0 {
            let diag = acc[i - 1][j - 1];
            let up = acc[i - 1][j];
            let left = acc[i][j - 1];
            if diag <= up && diag <= left {
                (i - 1, j - 1)
            } else if up <= left {
                (i - 1, j)
            } else {
                (i, j - 1)
            }
        } else if i > 0 {
            (i - 1, j)
        } else {
            (i, j - 1)
        };
        path.push((ni, nj));
        i = ni;
        j = nj;
    }
    path.reverse();
    path
}

pub fn compare_saccades(
    a: &[Saccade],
    b: &[Saccade],
    params: &MultimatchParams,
) -> Option<MultimatchScores> {
    let (a, b) = match &params.simplify {
        Some(th) => (simplify(a, th), simplify(b, th)),
        None => (a.to_vec(), b.to_vec()),
    };
    let path = align(&a, &b);
    if path.is_empty() {
        return None;
    }

    let mut vector = Vec::with_capacity(path.len());
    let mut direction = Vec::with_capacity(path.len());
    let mut length = Vec::with_capacity(path.len());
    let mut position = Vec::with_capacity(path.len());
    let mut duration = Vec::with_capacity(path.len());
    let mut has_durations = true;

    for &(i, j) in &path {
        let (u, v) = (&a[i], &b[j]);
        vector.push(vector_difference(u, v));
        direction.push(angle_difference(u.theta, v.theta));
        length.push((u.rho - v.rho).abs());
        position.push((u.x - v.x).hypot(u.y - v.y));
        match (u.duration, v.duration) {
            (Some(du), Some(dv)) => {
                let longest = du.max(dv);
                duration.push(if longest > 0.0 {
                    (du - dv).abs() / longest
                } else {
                    0.0
                });
            }
            _ => has_durations = false,
        }
    }

    let diag = params.diagonal();
    Some(MultimatchScores {
        vector: 1.0 - median(&vector) / (2.0 * diag),
        direction: 1.0 - median(&direction) / PI,
        length: 1.0 - median(&length) / diag,
        position: 1.0 - median(&position) / diag,
        duration: if has_durations {
            Some(1.0 - median(&duration))
        } else {
            None
        },
    })
}

/// Multimatch between two scanpaths; `None` when either has fewer than two
/// fixations.
pub fn compare_records(
    a: &ScanpathRecord,
    b: &ScanpathRecord,
    params: &MultimatchParams,
) -> Option<MultimatchScores> {
    let sa = saccades_from_record(a);
    let sb = saccades_from_record(b);
    compare_saccades(&sa, &sb, params)
}

fn median(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    }
}

#[cfg(test)]
#[path = "../../tests/src_inline/metrics/multimatch.rs"]
mod tests;
