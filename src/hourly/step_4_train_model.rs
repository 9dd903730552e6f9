// External imports
use burn::module::AutodiffModule;
use burn::nn::loss::{MseLoss, Reduction};
use burn::optim::{AdamConfig, GradientsParams, Optimizer};
use burn::tensor::backend::AutodiffBackend;
use burn::tensor::cast::ToElement;
use log::info;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use std::time::Instant;

// Internal imports
use super::step_1_tensor_preparation::{select_rows, shuffled_batches, WindowSet};
use super::step_2_sequence_model::{ModelKind, SequenceModel, SequenceModelConfig};
use super::step_3_gru_model_arch::GruForecaster;
use super::step_3_lstm_model_arch::LstmForecaster;
use crate::config::{ExperimentConfig, HiddenCarry};
use crate::constants::{
    BATCH_SIZE, DEFAULT_DROPOUT, DEFAULT_SEED, EPOCHS, HIDDEN_SIZE, LEARNING_RATE, LOG_INTERVAL,
    NUM_LAYERS,
};
use crate::error::{ForecastError, Result};

/// Struct for configuring forecaster training
#[derive(Clone, Debug, PartialEq)]
pub struct TrainingConfig {
    pub learning_rate: f64,
    pub batch_size: usize,
    pub epochs: usize,
    pub hidden_size: usize,
    pub num_layers: usize,
    pub dropout: f64,
    pub log_interval: usize,
    pub seed: u64,
    pub hidden_carry: HiddenCarry,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            learning_rate: LEARNING_RATE,
            batch_size: BATCH_SIZE,
            epochs: EPOCHS,
            hidden_size: HIDDEN_SIZE,
            num_layers: NUM_LAYERS,
            dropout: DEFAULT_DROPOUT,
            log_interval: LOG_INTERVAL,
            seed: DEFAULT_SEED,
            hidden_carry: HiddenCarry::Epoch,
        }
    }
}

impl From<&ExperimentConfig> for TrainingConfig {
    fn from(config: &ExperimentConfig) -> Self {
        Self {
            learning_rate: config.learning_rate,
            batch_size: config.batch_size,
            epochs: config.epochs,
            hidden_size: config.hidden_size,
            num_layers: config.num_layers,
            dropout: config.dropout,
            log_interval: config.log_interval,
            seed: config.seed,
            hidden_carry: config.hidden_carry,
        }
    }
}

impl TrainingConfig {
    /// Rejects settings the training loop cannot run with
    pub fn validate(&self) -> Result<()> {
        let invalid = |msg: &str| Err(ForecastError::InvalidConfig(msg.to_string()));

        if self.batch_size == 0 {
            return invalid("batch_size must be at least 1");
        }
        if self.hidden_size == 0 {
            return invalid("hidden_size must be at least 1");
        }
        if self.num_layers == 0 {
            return invalid("num_layers must be at least 1");
        }
        if !(0.0..1.0).contains(&self.dropout) {
            return invalid("dropout must be in [0, 1)");
        }
        if !(self.learning_rate > 0.0) {
            return invalid("learning_rate must be positive");
        }
        if self.log_interval == 0 {
            return invalid("log_interval must be at least 1");
        }
        Ok(())
    }
}

/// Loss and timing of one epoch
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct EpochSummary {
    pub epoch: usize,
    pub average_loss: f64,
    pub duration_secs: f64,
}

/// What a training run reports besides the model itself
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct TrainingReport {
    pub model_kind: ModelKind,
    pub epochs: Vec<EpochSummary>,
    pub total_secs: f64,
}

impl TrainingReport {
    /// Average loss of the last epoch, if any epoch ran
    pub fn final_loss(&self) -> Option<f64> {
        self.epochs.last().map(|summary| summary.average_loss)
    }
}

/// A trained forecaster of either kind
#[derive(Debug, Clone)]
pub enum TrainedModel<B: AutodiffBackend> {
    Gru(GruForecaster<B>),
    Lstm(LstmForecaster<B>),
}

impl<B: AutodiffBackend> TrainedModel<B> {
    pub fn kind(&self) -> ModelKind {
        match self {
            TrainedModel::Gru(_) => ModelKind::Gru,
            TrainedModel::Lstm(_) => ModelKind::Lstm,
        }
    }
}

/// Builds a forecaster of the requested kind and trains it on `pool`
///
/// The backend RNG is seeded from `config.seed` before the parameters are
/// initialised, so equal configurations give equal runs.
pub fn train<B: AutodiffBackend>(
    pool: &WindowSet,
    model_kind: ModelKind,
    config: &TrainingConfig,
    device: &B::Device,
) -> Result<(TrainedModel<B>, TrainingReport)> {
    config.validate()?;
    B::seed(config.seed);

    let model_config = SequenceModelConfig::new(
        pool.width(),
        config.hidden_size,
        config.num_layers,
        config.dropout,
    );

    match model_kind {
        ModelKind::Gru => {
            let model = GruForecaster::<B>::new(&model_config, device);
            let (model, report) = train_model(model, pool, model_kind, config, device)?;
            Ok((TrainedModel::Gru(model), report))
        }
        ModelKind::Lstm => {
            let model = LstmForecaster::<B>::new(&model_config, device);
            let (model, report) = train_model(model, pool, model_kind, config, device)?;
            Ok((TrainedModel::Lstm(model), report))
        }
    }
}

/// Runs the mini-batch training loop for any [`SequenceModel`]
///
/// Each epoch draws freshly shuffled full batches from the pool, runs one
/// step per batch, and applies one Adam update on the batch's MSE. How the
/// hidden state moves between batches is set by `config.hidden_carry`.
pub fn train_model<B, M>(
    mut model: M,
    pool: &WindowSet,
    model_kind: ModelKind,
    config: &TrainingConfig,
    device: &B::Device,
) -> Result<(M, TrainingReport)>
where
    B: AutodiffBackend,
    M: SequenceModel<B> + AutodiffModule<B>,
{
    config.validate()?;

    if model.input_size() != pool.width() {
        return Err(ForecastError::InvalidConfig(format!(
            "model expects {} features per timestep, pool has {}",
            model.input_size(),
            pool.width()
        )));
    }

    let mut report = TrainingReport {
        model_kind,
        epochs: Vec::with_capacity(config.epochs),
        total_secs: 0.0,
    };

    if config.epochs == 0 {
        info!("{}: 0 epochs requested, returning the initialised model", model_kind);
        return Ok((model, report));
    }

    if pool.len() < config.batch_size {
        return Err(ForecastError::InsufficientTrainingData {
            available: pool.len(),
            batch_size: config.batch_size,
        });
    }

    let (features, targets) = pool.to_tensors::<B>(device);
    let total_steps = pool.len() / config.batch_size;

    let mut optimizer = AdamConfig::new().init();
    let mut rng = StdRng::seed_from_u64(config.seed);
    let loss_fn = MseLoss::new();

    info!(
        "Starting training of {} model: {} windows, {} steps per epoch",
        model_kind,
        pool.len(),
        total_steps
    );
    let start_time = Instant::now();

    for epoch in 1..=config.epochs {
        let epoch_start = Instant::now();
        let mut hidden = model.init_hidden(config.batch_size, device);
        let mut epoch_loss = 0.0;
        let mut counter = 0;

        for indices in shuffled_batches(pool.len(), config.batch_size, &mut rng) {
            counter += 1;

            hidden = match config.hidden_carry {
                HiddenCarry::Epoch => M::detach_hidden(hidden),
                HiddenCarry::Batch => model.init_hidden(config.batch_size, device),
            };

            let batch_features = select_rows(&features, &indices, device);
            let batch_targets = select_rows(&targets, &indices, device);

            let (predictions, next_hidden) = model.step(batch_features, hidden);
            hidden = next_hidden;

            let loss = loss_fn.forward(predictions, batch_targets, Reduction::Mean);
            epoch_loss += loss.clone().into_scalar().to_f64();

            // Backward pass and optimizer step
            let grads = GradientsParams::from_grads(loss.backward(), &model);
            model = optimizer.step(config.learning_rate, model, grads);

            if counter % config.log_interval == 0 {
                info!(
                    "Epoch {}......Step: {}/{}....... Average Loss for Epoch: {:.6}",
                    epoch,
                    counter,
                    total_steps,
                    epoch_loss / counter as f64
                );
            }
        }

        let average_loss = epoch_loss / counter as f64;
        let duration_secs = epoch_start.elapsed().as_secs_f64();
        info!(
            "Epoch {}/{} Done, Total Loss: {:.6}",
            epoch, config.epochs, average_loss
        );
        info!("Time Elapsed for Epoch: {:.2} seconds", duration_secs);

        report.epochs.push(EpochSummary {
            epoch,
            average_loss,
            duration_secs,
        });
    }

    report.total_secs = start_time.elapsed().as_secs_f64();
    info!("Total Training Time: {:.2} seconds", report.total_secs);

    Ok((model, report))
}
