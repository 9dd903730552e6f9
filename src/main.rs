// External crates
use anyhow::{Context, Result};
use log::info;
use std::env;
use std::path::{Path, PathBuf};

// Local modules
use hourly_energy_rnn::backend::{select_device, TrainingBackend};
use hourly_energy_rnn::built_info;
use hourly_energy_rnn::config::ExperimentConfig;
use hourly_energy_rnn::constants::DEFAULT_DATA_DIR;
use hourly_energy_rnn::hourly::step_1_tensor_preparation::prepare_datasets;
use hourly_energy_rnn::hourly::step_2_sequence_model::ModelKind;
use hourly_energy_rnn::hourly::step_6_experiment::{run_experiment, ExperimentOutcome};
use hourly_energy_rnn::util::file_utils::list_source_files;
use hourly_energy_rnn::util::model_logger::create_experiment_dir;

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    info!(
        "{} v{} built with {} for {}",
        built_info::PKG_NAME,
        built_info::PKG_VERSION,
        built_info::RUSTC_VERSION,
        built_info::TARGET
    );

    // Accept data directory and optional JSON config as command-line arguments
    let args: Vec<String> = env::args().collect();
    let data_dir = PathBuf::from(args.get(1).map(|s| s.as_str()).unwrap_or(DEFAULT_DATA_DIR));
    let mut config = match args.get(2) {
        Some(path) => ExperimentConfig::from_json_file(Path::new(path))
            .with_context(|| format!("Failed to load config {}", path))?,
        None => ExperimentConfig::default(),
    };
    config.validate().context("Invalid configuration")?;

    if let Some(base) = &config.experiment_dir {
        let run_dir = create_experiment_dir(base)
            .with_context(|| format!("Failed to create experiment directory under {}", base.display()))?;
        info!("Writing experiment records to {}", run_dir.display());
        config.experiment_dir = Some(run_dir);
    }

    info!("Using data directory: {}", data_dir.display());
    let device = select_device();

    let files = list_source_files(&data_dir, &config.excluded_files)
        .context("Failed to list input files")?;
    info!("Found {} input files", files.len());

    let data = prepare_datasets(&files, &config).context("Failed to prepare datasets")?;

    let mut outcomes: Vec<ExperimentOutcome<TrainingBackend>> = Vec::new();
    for kind in ModelKind::ALL {
        let outcome = run_experiment::<TrainingBackend>(kind, &data, &config, &device)
            .with_context(|| format!("{} experiment failed", kind))?;
        outcomes.push(outcome);
    }

    info!("===== Summary =====");
    for outcome in &outcomes {
        info!(
            "{}: final loss {}, sMAPE {:.4}%, training {:.2}s",
            outcome.training.model_kind,
            outcome
                .training
                .final_loss()
                .map(|loss| format!("{:.6}", loss))
                .unwrap_or_else(|| "n/a".to_string()),
            outcome.evaluation.smape_percent(),
            outcome.training.total_secs
        );
    }

    Ok(())
}
