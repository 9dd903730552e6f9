// External imports
use burn::module::AutodiffModule;
use burn::tensor::backend::{AutodiffBackend, Backend};
use burn::tensor::Tensor;
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Instant;

// Internal imports
use super::step_1_tensor_preparation::{PreparedData, WindowSet};
use super::step_2_sequence_model::SequenceModel;
use super::step_4_train_model::TrainedModel;
use crate::constants::SMAPE_EPSILON;
use crate::error::{ForecastError, Result};
use crate::util::pre_processor::FileScalers;

/// Held-out predictions and targets of one file, in physical units
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct FileForecast {
    pub predictions: Vec<f64>,
    pub targets: Vec<f64>,
    /// sMAPE of this file as a fraction
    pub smape: f64,
}

/// Result of scoring a model on every file's held-out windows
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct EvaluationReport {
    pub files: BTreeMap<String, FileForecast>,
    /// Unweighted mean of the per-file sMAPE, as a fraction
    pub smape: f64,
    /// Terms whose denominator was clamped to `SMAPE_EPSILON`
    pub guarded_terms: usize,
    pub duration_secs: f64,
}

impl EvaluationReport {
    pub fn smape_percent(&self) -> f64 {
        self.smape * 100.0
    }
}

/// Symmetric mean absolute percentage error of one file, as a fraction
///
/// Each term is `|p - t| / ((t + p) / 2)`. When `t + p` is zero the term is
/// undefined; the denominator's magnitude is then clamped to
/// `SMAPE_EPSILON` and the term is counted in the second return value.
pub fn smape(predictions: &[f64], targets: &[f64]) -> (f64, usize) {
    if predictions.is_empty() {
        return (0.0, 0);
    }

    let mut guarded = 0;
    let total: f64 = predictions
        .iter()
        .zip(targets.iter())
        .map(|(&p, &t)| {
            let denominator = (t + p) / 2.0;
            let denominator = if denominator.abs() < SMAPE_EPSILON {
                guarded += 1;
                SMAPE_EPSILON
            } else {
                denominator
            };
            (p - t).abs() / denominator
        })
        .sum();

    (total / predictions.len() as f64, guarded)
}

fn tensor_to_vec<B: Backend>(tensor: Tensor<B, 2>) -> Result<Vec<f64>> {
    tensor
        .into_data()
        .convert::<f64>()
        .to_vec::<f64>()
        .map_err(|e| ForecastError::TensorData(format!("{:?}", e)))
}

/// Scores a model on each file's held-out windows
///
/// Every file is run as one batch with a freshly zeroed hidden state sized to
/// its pool. Predictions and labels are mapped back to physical units with
/// that file's label scaler before scoring.
pub fn evaluate_model<B, M>(
    model: &M,
    test_pools: &BTreeMap<String, WindowSet>,
    scalers: &BTreeMap<String, FileScalers>,
    device: &B::Device,
) -> Result<EvaluationReport>
where
    B: Backend,
    M: SequenceModel<B>,
{
    if test_pools.is_empty() {
        return Err(ForecastError::NoHeldOutWindows);
    }

    let start_time = Instant::now();
    let mut files = BTreeMap::new();
    let mut guarded_terms = 0;

    for (name, pool) in test_pools {
        let scaler = scalers
            .get(name)
            .ok_or_else(|| ForecastError::MissingScaler(name.clone()))?;

        let hidden = model.init_hidden(pool.len(), device);
        let (features, _) = pool.to_tensors::<B>(device);
        let (output, _) = model.step(features, hidden);

        let scaled_predictions = tensor_to_vec(output)?;
        let scaled_targets: Vec<f64> = pool.labels().iter().map(|&v| v as f64).collect();

        let predictions = scaler.label.inverse_transform(&scaled_predictions);
        let targets = scaler.label.inverse_transform(&scaled_targets);

        let (file_smape, guarded) = smape(&predictions, &targets);
        guarded_terms += guarded;

        files.insert(
            name.clone(),
            FileForecast {
                predictions,
                targets,
                smape: file_smape,
            },
        );
    }

    if guarded_terms > 0 {
        warn!(
            "{} sMAPE terms had a zero prediction + target sum; their denominator was clamped to {}",
            guarded_terms, SMAPE_EPSILON
        );
    }

    let smape = files.values().map(|file| file.smape).sum::<f64>() / files.len() as f64;
    let duration_secs = start_time.elapsed().as_secs_f64();

    info!("Evaluation Time: {:.2} seconds", duration_secs);
    info!("sMAPE: {:.4}%", smape * 100.0);

    Ok(EvaluationReport {
        files,
        smape,
        guarded_terms,
        duration_secs,
    })
}

/// Evaluates a trained model on the inference backend, with dropout off
pub fn evaluate<B: AutodiffBackend>(
    model: &TrainedModel<B>,
    data: &PreparedData,
    device: &B::Device,
) -> Result<EvaluationReport> {
    match model {
        TrainedModel::Gru(gru) => {
            evaluate_model(&gru.valid(), &data.test_pools, &data.scalers, device)
        }
        TrainedModel::Lstm(lstm) => {
            evaluate_model(&lstm.valid(), &data.test_pools, &data.scalers, device)
        }
    }
}
