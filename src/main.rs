use std::ffi::OsString;
use std::io::{self, BufReader};
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use scanpath_bench::input::setup::{
    create_output_folders, load_checkpoint, load_config, load_dataset_info,
    load_trials_properties, save_checkpoint,
};
use scanpath_bench::irl::patches::PatchGrid;
use scanpath_bench::logging;
use scanpath_bench::model::config::Checkpoint;
use scanpath_bench::model::profile::ConversionProfile;
use scanpath_bench::pipeline::convert::convert_subjects;
use scanpath_bench::pipeline::evaluate::evaluate_all;
use scanpath_bench::pipeline::irl_export::{IrlExportParams, export_scanpaths, scanpaths_output_path};
use scanpath_bench::pipeline::segment::{Predictor, segment_image};
use scanpath_bench::pipeline::targets::{TARGETS_DATASET, TARGETS_FILE, write_target_positions};

#[derive(Debug, Parser)]
#[command(name = "scanpath-bench", version, about)]
struct Cli {
    /// Debug-level logging (overridden by RUST_LOG).
    #[arg(long, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Convert per-subject MAT files into JSON scanpaths.
    Convert(ConvertArgs),
    /// Extract target positions from ground-truth masks.
    Targets(TargetsArgs),
    /// Evaluate model scanpaths against human data.
    Evaluate(EvaluateArgs),
    /// Set up a search-model run: output folders, checkpoint, config, trials.
    Prepare(PrepareArgs),
    /// Turn IRL action trajectories into scanpaths.
    IrlExport(IrlExportArgs),
    /// Resize an image and run a panoptic segmentation predictor on it.
    Segment(SegmentArgs),
}

#[derive(Debug, Args)]
struct ConvertArgs {
    #[arg(long)]
    subjects_dir: PathBuf,
    #[arg(long)]
    save_dir: PathBuf,
    #[arg(long)]
    dataset_name: Option<String>,
    #[arg(long)]
    mat_variable: Option<String>,
    #[arg(long)]
    max_scanpath_length: Option<usize>,
}

#[derive(Debug, Args)]
struct TargetsArgs {
    #[arg(long)]
    gt_dir: PathBuf,
    #[arg(long, default_value = TARGETS_FILE)]
    out: PathBuf,
    #[arg(long, default_value = TARGETS_DATASET)]
    dataset_name: String,
}

#[derive(Debug, Args)]
struct EvaluateArgs {
    #[arg(long)]
    results_dir: PathBuf,
    #[arg(long)]
    datasets_dir: PathBuf,
    /// Only evaluate this dataset.
    #[arg(long)]
    dataset: Option<String>,
}

#[derive(Debug, Args)]
struct PrepareArgs {
    #[arg(long)]
    config_dir: PathBuf,
    #[arg(long)]
    config: String,
    #[arg(long)]
    dataset_info: PathBuf,
    #[arg(long)]
    trials: PathBuf,
    #[arg(long)]
    save_path: PathBuf,
    #[arg(long, conflicts_with = "range")]
    image: Option<String>,
    #[arg(long, num_args = 2, value_names = ["START", "END"])]
    range: Option<Vec<usize>>,
}

#[derive(Debug, Args)]
struct IrlExportArgs {
    #[arg(long)]
    trajectories: PathBuf,
    #[arg(long)]
    annotations: Option<PathBuf>,
    #[arg(long)]
    out: PathBuf,
    #[arg(long, num_args = 2, value_names = ["WIDTH", "HEIGHT"], default_values_t = [16u32, 16])]
    patch_size: Vec<u32>,
    #[arg(long, num_args = 2, value_names = ["COLS", "ROWS"], default_values_t = [32u32, 20])]
    patch_num: Vec<u32>,
    #[arg(long, default_value_t = 512)]
    image_width: u32,
    #[arg(long, default_value_t = 320)]
    image_height: u32,
    #[arg(long, default_value = "COCOSearch18")]
    dataset_name: String,
    #[arg(long, default_value_t = 6)]
    max_saccades: u32,
}

#[derive(Debug, Args)]
struct SegmentArgs {
    #[arg(long)]
    image: PathBuf,
    #[arg(long)]
    out: PathBuf,
    #[arg(long)]
    predictor: OsString,
    /// Extra arguments passed to the predictor before the image path.
    #[arg(last = true)]
    predictor_args: Vec<OsString>,
}

fn main() {
    let cli = Cli::parse();
    logging::init(cli.verbose);
    if let Err(err) = run(cli.command) {
        eprintln!("{err}");
        std::process::exit(1);
    }
}

fn run(command: Command) -> Result<(), String> {
    match command {
        Command::Convert(args) => run_convert(args),
        Command::Targets(args) => {
            let n = write_target_positions(&args.gt_dir, &args.out, &args.dataset_name)
                .map_err(|e| e.to_string())?;
            println!("targets: {n} -> {}", args.out.display());
            Ok(())
        }
        Command::Evaluate(args) => run_evaluate(args),
        Command::Prepare(args) => run_prepare(args),
        Command::IrlExport(args) => run_irl_export(args),
        Command::Segment(args) => {
            let predictor = Predictor {
                program: args.predictor,
                args: args.predictor_args,
            };
            let out = segment_image(&args.image, &args.out, &predictor).map_err(|e| e.to_string())?;
            println!(
                "segments: {} -> {}",
                out.segments.len(),
                out.segments_path.display()
            );
            Ok(())
        }
    }
}

fn conversion_profile(args: &ConvertArgs) -> ConversionProfile {
    let mut profile = ConversionProfile::cibs_v1();
    if let Some(name) = &args.dataset_name {
        profile.dataset_name = name.clone();
    }
    if let Some(var) = &args.mat_variable {
        profile.mat_variable = var.clone();
    }
    if let Some(len) = args.max_scanpath_length {
        profile.max_scanpath_length = len;
    }
    profile
}

fn run_convert(args: ConvertArgs) -> Result<(), String> {
    let profile = conversion_profile(&args);
    let stats =
        convert_subjects(&args.subjects_dir, &args.save_dir, &profile).map_err(|e| e.to_string())?;
    println!(
        "subjects: {}; trials written: {}; targets found: {}; wrong targets found: {}; truncated: {}; empty: {}",
        stats.subjects,
        stats.trials_written,
        stats.targets_found,
        stats.wrong_targets_found,
        stats.truncated,
        stats.empty
    );
    Ok(())
}

fn run_evaluate(args: EvaluateArgs) -> Result<(), String> {
    let evaluations = evaluate_all(&args.results_dir, &args.datasets_dir, args.dataset.as_deref())
        .map_err(|e| e.to_string())?;
    if evaluations.is_empty() {
        tracing::warn!("no dataset results found in {}", args.results_dir.display());
    }
    for evaluation in &evaluations {
        println!(
            "{}: {} models -> {}",
            evaluation.summary.dataset,
            evaluation.summary.cumulative.len(),
            evaluation.results_dir.display()
        );
    }
    Ok(())
}

fn image_range(range: Option<&[usize]>) -> Option<(usize, usize)> {
    match range {
        Some([start, end]) => Some((*start, *end)),
        _ => None,
    }
}

fn run_prepare(args: PrepareArgs) -> Result<(), String> {
    let range = image_range(args.range.as_deref());
    let output_path =
        create_output_folders(&args.save_path, &args.config, args.image.as_deref(), range)
            .map_err(|e| e.to_string())?;

    let mut answers = BufReader::new(io::stdin());
    let mut prompt = io::stderr();
    let checkpoint =
        load_checkpoint(&output_path, &mut answers, &mut prompt).map_err(|e| e.to_string())?;

    let configuration = load_config(&args.config_dir, &args.config, checkpoint.as_ref())
        .map_err(|e| e.to_string())?;
    let dataset_info = load_dataset_info(&args.dataset_info).map_err(|e| e.to_string())?;
    let trials_properties = load_trials_properties(
        &args.trials,
        args.image.as_deref(),
        range,
        checkpoint.as_ref(),
    )
    .map_err(|e| e.to_string())?;
    tracing::info!(
        "{} trials selected; max scanpath length {}",
        trials_properties.len(),
        dataset_info.max_scanpath_length
    );

    let checkpoint = match checkpoint {
        Some(cp) => cp,
        None => Checkpoint {
            configuration,
            trials_properties,
            extra: Default::default(),
        },
    };
    save_checkpoint(&output_path, &checkpoint).map_err(|e| e.to_string())?;
    println!("run prepared in {}", output_path.display());
    Ok(())
}

fn run_irl_export(args: IrlExportArgs) -> Result<(), String> {
    let params = IrlExportParams {
        grid: PatchGrid::new(
            (args.patch_size[0], args.patch_size[1]),
            (args.patch_num[0], args.patch_num[1]),
        ),
        image_width: args.image_width,
        image_height: args.image_height,
        dataset_name: args.dataset_name,
        max_saccades: args.max_saccades,
    };
    let scanpaths = export_scanpaths(
        &args.trajectories,
        args.annotations.as_deref(),
        &args.out,
        &params,
    )
    .map_err(|e| e.to_string())?;
    println!(
        "scanpaths: {} -> {}",
        scanpaths.len(),
        scanpaths_output_path(&args.out).display()
    );
    Ok(())
}

#[cfg(test)]
#[path = "../tests/src_inline/main_inline.rs"]
mod tests;
