use std::path::{Path, PathBuf};
use std::str::FromStr;

use rand::Rng;

pub const DEFAULT_EPS: f64 = 1e-12;

/// Batched policy head: one probability row and one value per episode.
#[derive(Debug, Clone, PartialEq)]
pub struct PolicyOutput {
    pub probs: Vec<Vec<f64>>,
    pub values: Vec<f64>,
}

pub trait Policy<O> {
    fn forward(&mut self, obs: &O) -> PolicyOutput;
}

#[derive(Debug, Clone, PartialEq)]
pub enum ActionMask {
    /// `true` marks an action that must not be taken again.
    Hard(Vec<Vec<bool>>),
    /// Multiplicative weights applied to the probabilities.
    Soft(Vec<Vec<f64>>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Selection {
    pub actions: Vec<usize>,
    pub log_probs: Option<Vec<f64>>,
    pub values: Option<Vec<f64>>,
    pub probs: Option<Vec<Vec<f64>>>,
}

pub trait SearchEnv {
    type Obs;

    fn observe(&self) -> Self::Obs;
    fn step(&mut self, actions: &[usize]) -> (Self::Obs, Vec<u8>);
    fn status(&self) -> Vec<u8>;
    fn action_mask(&self) -> Option<ActionMask>;
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Trajectories {
    pub status: Vec<Vec<u8>>,
    pub actions: Vec<Vec<usize>>,
    pub log_probs: Vec<Vec<f64>>,
    pub values: Vec<Vec<f64>>,
}

fn masked_row(row: &[f64], mask: Option<&ActionMask>, episode: usize, masked_value: f64) -> Vec<f64> {
    match mask {
        None => row.to_vec(),
        Some(ActionMask::Hard(m)) => row
            .iter()
            .enumerate()
            .map(|(i, &p)| {
                let hit = m
                    .get(episode)
                    .and_then(|r| r.get(i))
                    .copied()
                    .unwrap_or(false);
                if hit { masked_value } else { p }
            })
            .collect(),
        Some(ActionMask::Soft(w)) => row
            .iter()
            .enumerate()
            .map(|(i, &p)| p * w.get(episode).and_then(|r| r.get(i)).copied().unwrap_or(1.0))
            .collect(),
    }
}

fn sample_categorical<R: Rng + ?Sized>(weights: &[f64], rng: &mut R) -> usize {
    let total: f64 = weights.iter().sum();
    if weights.is_empty() {
        return 0;
    }
    if total <= 0.0 || !total.is_finite() {
        return rng.random_range(0..weights.len());
    }
    let mut u = rng.random::<f64>() * total;
    let mut last_positive = 0;
    for (i, &w) in weights.iter().enumerate() {
        if w > 0.0 {
            last_positive = i;
            if u < w {
                return i;
            }
            u -= w;
        }
    }
    last_positive
}

fn argmax(row: &[f64]) -> usize {
    let mut best = 0;
    for (i, &p) in row.iter().enumerate() {
        if p > row[best] {
            best = i;
        }
    }
    best
}

/// Picks one action per episode. Sampling re-normalizes after masking but
/// reports log-probabilities under the unmasked distribution; greedy
/// selection zeroes masked actions and takes the most likely one.
pub fn select_action<R: Rng + ?Sized>(
    output: PolicyOutput,
    sample: bool,
    mask: Option<&ActionMask>,
    eps: f64,
    rng: &mut R,
) -> Selection {
    if sample {
        let mut actions = Vec::with_capacity(output.probs.len());
        let mut log_probs = Vec::with_capacity(output.probs.len());
        for (episode, row) in output.probs.iter().enumerate() {
            let weights = masked_row(row, mask, episode, eps);
            let action = sample_categorical(&weights, rng);
            let total: f64 = row.iter().sum();
            let p = if total > 0.0 { row[action] / total } else { 0.0 };
            actions.push(action);
            log_probs.push(p.ln());
        }
        Selection {
            actions,
            log_probs: Some(log_probs),
            values: Some(output.values),
            probs: Some(output.probs),
        }
    } else {
        let actions = output
            .probs
            .iter()
            .enumerate()
            .map(|(episode, row)| argmax(&masked_row(row, mask, episode, 0.0)))
            .collect();
        Selection {
            actions,
            log_probs: None,
            values: None,
            probs: None,
        }
    }
}

pub fn collect_trajectories<E, P, R>(
    env: &mut E,
    policy: &mut P,
    max_traj_length: usize,
    is_eval: bool,
    sample: bool,
    rng: &mut R,
) -> Trajectories
where
    E: SearchEnv,
    P: Policy<E::Obs>,
    R: Rng + ?Sized,
{
    let obs = env.observe();
    let mask = env.action_mask();
    let mut selection = select_action(policy.forward(&obs), sample, mask.as_ref(), DEFAULT_EPS, rng);

    let mut out = Trajectories {
        status: vec![env.status()],
        ..Trajectories::default()
    };

    for _ in 0..max_traj_length {
        if !is_eval {
            if let Some(lp) = &selection.log_probs {
                out.log_probs.push(lp.clone());
            }
            if let Some(v) = &selection.values {
                out.values.push(v.clone());
            }
        }
        let (next_obs, status) = env.step(&selection.actions);
        out.status.push(status);
        out.actions.push(selection.actions.clone());

        let mask = env.action_mask();
        selection = select_action(
            policy.forward(&next_obs),
            sample,
            mask.as_ref(),
            DEFAULT_EPS,
            rng,
        );
    }

    out
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckpointRef {
    Step(u64),
    Best,
    File(String),
}

impl FromStr for CheckpointRef {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == "best" {
            Ok(CheckpointRef::Best)
        } else if let Ok(step) = s.parse() {
            Ok(CheckpointRef::Step(step))
        } else {
            Ok(CheckpointRef::File(s.to_string()))
        }
    }
}

pub fn checkpoint_file_name(reference: &CheckpointRef, name: &str) -> String {
    match reference {
        CheckpointRef::Step(step) => format!("save_{}_{}k{}.pkg", name, step / 1000, step % 1000),
        CheckpointRef::Best => format!("trained_{name}.pkg"),
        CheckpointRef::File(path) => path.clone(),
    }
}

/// Resolves a saved model package; `None` (with a warning) when the file
/// does not exist.
pub fn checkpoint_path(
    reference: &CheckpointRef,
    name: &str,
    pkg_dir: Option<&Path>,
) -> Option<PathBuf> {
    let file = checkpoint_file_name(reference, name);
    let path = match pkg_dir {
        Some(dir) => dir.join(file),
        None => PathBuf::from(file),
    };
    if !path.exists() {
        tracing::warn!("[checkpoint] failed to find {}", path.display());
        return None;
    }
    Some(path)
}

#[cfg(test)]
#[path = "../../tests/src_inline/irl/policy.rs"]
mod tests;
