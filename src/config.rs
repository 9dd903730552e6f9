// External crates
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

// Local modules
use crate::constants::{
    BATCH_SIZE, DEFAULT_DROPOUT, DEFAULT_SEED, EPOCHS, EXCLUDED_FILES, HIDDEN_SIZE, LEARNING_RATE,
    LOG_INTERVAL, NUM_LAYERS, SEQUENCE_LENGTH, TEST_SPLIT_RATIO,
};
use crate::error::{ForecastError, Result};

/// How the recurrent hidden state is handled between mini-batches
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum HiddenCarry {
    /// Zeroed once per epoch, then carried (detached) from batch to batch
    #[default]
    Epoch,
    /// Zeroed before every batch
    Batch,
}

/// Hyperparameters and run settings for one experiment
///
/// Every field has a default, so a JSON file only needs to name the
/// values it overrides.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct ExperimentConfig {
    /// Number of hours in each input window
    pub lookback: usize,
    pub batch_size: usize,
    pub hidden_size: usize,
    pub num_layers: usize,
    pub dropout: f64,
    pub learning_rate: f64,
    pub epochs: usize,
    /// Fraction of each file's windows held out for evaluation
    pub test_split: f64,
    /// Steps between running-loss log lines
    pub log_interval: usize,
    pub seed: u64,
    pub hidden_carry: HiddenCarry,
    pub excluded_files: Vec<String>,
    /// Where experiment records are written; nothing is written when unset
    pub experiment_dir: Option<PathBuf>,
}

impl Default for ExperimentConfig {
    fn default() -> Self {
        Self {
            lookback: SEQUENCE_LENGTH,
            batch_size: BATCH_SIZE,
            hidden_size: HIDDEN_SIZE,
            num_layers: NUM_LAYERS,
            dropout: DEFAULT_DROPOUT,
            learning_rate: LEARNING_RATE,
            epochs: EPOCHS,
            test_split: TEST_SPLIT_RATIO,
            log_interval: LOG_INTERVAL,
            seed: DEFAULT_SEED,
            hidden_carry: HiddenCarry::default(),
            excluded_files: EXCLUDED_FILES.iter().map(|s| s.to_string()).collect(),
            experiment_dir: None,
        }
    }
}

impl ExperimentConfig {
    /// Loads a configuration from a JSON file and validates it
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    /// Rejects settings the pipeline cannot run with
    pub fn validate(&self) -> Result<()> {
        let invalid = |msg: &str| Err(ForecastError::InvalidConfig(msg.to_string()));

        if self.lookback == 0 {
            return invalid("lookback must be at least 1");
        }
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
        if !(0.0..1.0).contains(&self.test_split) {
            return invalid("test_split must be in [0, 1)");
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
