// External imports
use burn::tensor::backend::AutodiffBackend;
use log::info;

// Internal imports
use super::step_1_tensor_preparation::PreparedData;
use super::step_2_sequence_model::ModelKind;
use super::step_4_train_model::{train, TrainedModel, TrainingConfig, TrainingReport};
use super::step_5_evaluation::{evaluate, EvaluationReport};
use crate::config::ExperimentConfig;
use crate::error::Result;
use crate::util::model_logger::ExperimentRecord;

/// Trained model plus what its training and evaluation reported
#[derive(Debug)]
pub struct ExperimentOutcome<B: AutodiffBackend> {
    pub model: TrainedModel<B>,
    pub training: TrainingReport,
    pub evaluation: EvaluationReport,
}

/// Trains one model kind on the merged pool and scores it on every file
///
/// When `config.experiment_dir` is set, a JSON record of the run is written
/// there as well.
pub fn run_experiment<B: AutodiffBackend>(
    model_kind: ModelKind,
    data: &PreparedData,
    config: &ExperimentConfig,
    device: &B::Device,
) -> Result<ExperimentOutcome<B>> {
    info!("===== {} =====", model_kind);

    let training_config = TrainingConfig::from(config);
    let (model, training) = train::<B>(&data.train, model_kind, &training_config, device)?;
    let evaluation = evaluate(&model, data, device)?;

    if let Some(dir) = &config.experiment_dir {
        let mut record = ExperimentRecord::new(model_kind, config);
        record.set_training(&training);
        record.set_evaluation(&evaluation);
        let path = record.save(dir)?;
        info!("Experiment record saved to {}", path.display());
    }

    Ok(ExperimentOutcome {
        model,
        training,
        evaluation,
    })
}
