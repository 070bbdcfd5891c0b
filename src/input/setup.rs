use std::fs;
use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};

use crate::input::{InputError, read_json, write_json_pretty};
use crate::model::config::{Checkpoint, SearchConfig};
use crate::model::dataset::{DatasetInfo, TrialProperties};

pub const CHECKPOINT_FILE: &str = "checkpoint.json";

/// Asks on `prompt` whether to resume from `output_path/checkpoint.json`,
/// reading answers line by line from `answers` until one is `Y` or `N`.
/// Declining deletes the checkpoint.
pub fn load_checkpoint<R: BufRead, W: Write>(
    output_path: &Path,
    answers: &mut R,
    prompt: &mut W,
) -> Result<Option<Checkpoint>, InputError> {
    let checkpoint_file = output_path.join(CHECKPOINT_FILE);
    if !checkpoint_file.exists() {
        return Ok(None);
    }

    let mut line = String::new();
    loop {
        write!(prompt, "Checkpoint found! Resume execution? (Y/N): ")?;
        prompt.flush()?;
        line.clear();
        if answers.read_line(&mut line)? == 0 {
            return Err(InputError::InvalidInput(
                "no answer given to the checkpoint prompt".to_string(),
            ));
        }
        match line.trim().to_uppercase().as_str() {
            "Y" => {
                let checkpoint: Checkpoint = read_json(&checkpoint_file)?;
                writeln!(prompt, "Checkpoint loaded. Resuming execution...\n")?;
                return Ok(Some(checkpoint));
            }
            "N" => {
                fs::remove_file(&checkpoint_file)?;
                writeln!(prompt, "Checkpoint deleted\n")?;
                return Ok(None);
            }
            _ => writeln!(prompt, "Invalid answer. Please try again")?,
        }
    }
}

pub fn save_checkpoint(output_path: &Path, checkpoint: &Checkpoint) -> Result<(), InputError> {
    write_json_pretty(&output_path.join(CHECKPOINT_FILE), checkpoint)
}

pub fn load_config(
    config_dir: &Path,
    config_name: &str,
    checkpoint: Option<&Checkpoint>,
) -> Result<SearchConfig, InputError> {
    let config = match checkpoint {
        Some(cp) => {
            tracing::info!("successfully loaded previously used configuration");
            cp.configuration.clone()
        }
        None => {
            let config: SearchConfig =
                read_json(&config_dir.join(format!("{config_name}.json")))?;
            tracing::info!("successfully loaded {}.json", config_name);
            config
        }
    };

    tracing::info!("search model: {}", config.search_model);
    tracing::info!("target similarity: {}", config.target_similarity);
    tracing::info!("prior: {}", config.prior);
    tracing::info!("max. saccades: {}", config.max_saccades);
    tracing::info!("cell size: {}", config.cell_size);
    tracing::info!("scale factor: {}", config.scale_factor);
    tracing::info!("additive shift: {}", config.additive_shift);
    tracing::info!("random seed: {}", config.seed);
    if config.multiprocessing.is_enabled() {
        tracing::info!("multiprocessing is ENABLED");
    } else {
        tracing::info!("multiprocessing is DISABLED");
    }
    if config.save_probability_maps {
        tracing::info!("probability maps will be saved for each saccade");
    }

    Ok(config)
}

pub fn load_dataset_info(dataset_info_file: &Path) -> Result<DatasetInfo, InputError> {
    read_json(dataset_info_file)
}

pub fn load_trials_properties(
    trials_properties_file: &Path,
    image_name: Option<&str>,
    image_range: Option<(usize, usize)>,
    checkpoint: Option<&Checkpoint>,
) -> Result<Vec<TrialProperties>, InputError> {
    if let Some(cp) = checkpoint {
        return Ok(cp.trials_properties.clone());
    }
    let trials: Vec<TrialProperties> = read_json(trials_properties_file)?;
    if let Some(name) = image_name {
        return trial_properties_for_image(&trials, name);
    }
    if let Some(range) = image_range {
        return trial_properties_in_range(&trials, range);
    }
    Ok(trials)
}

pub fn trial_properties_for_image(
    trials: &[TrialProperties],
    image_name: &str,
) -> Result<Vec<TrialProperties>, InputError> {
    trials
        .iter()
        .find(|t| t.image == image_name)
        .map(|t| vec![t.clone()])
        .ok_or_else(|| InputError::ImageNotInDataset(image_name.to_string()))
}

/// Trials whose 1-based position lies in `[start, end]`.
pub fn trial_properties_in_range(
    trials: &[TrialProperties],
    (start, end): (usize, usize),
) -> Result<Vec<TrialProperties>, InputError> {
    let selected: Vec<TrialProperties> = trials
        .iter()
        .enumerate()
        .filter(|(idx, _)| idx + 1 >= start && idx + 1 <= end)
        .map(|(_, t)| t.clone())
        .collect();
    if selected.is_empty() {
        return Err(InputError::RangeOutOfScope { start, end });
    }
    Ok(selected)
}

pub fn create_output_folders(
    save_path: &Path,
    config_name: &str,
    image_name: Option<&str>,
    image_range: Option<(usize, usize)>,
) -> Result<PathBuf, InputError> {
    let mut output_path = save_path.join(config_name);
    if let Some(name) = image_name {
        let stem = Path::new(name)
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| name.to_string());
        output_path.push(stem);
    }
    if let Some((start, end)) = image_range {
        output_path.push(format!("range_{start}-{end}"));
    }
    fs::create_dir_all(&output_path)?;
    Ok(output_path)
}

#[cfg(test)]
#[path = "../../tests/src_inline/input/setup.rs"]
mod tests;
