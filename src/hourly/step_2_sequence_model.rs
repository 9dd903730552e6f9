// External imports
use burn::tensor::{backend::Backend, Tensor};
use log::warn;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// Internal imports
use crate::constants::OUTPUT_SIZE;
use crate::error::ForecastError;

/// # Sequence Model
///
/// Shared interface of the recurrent forecasters. A model maps a batch of
/// windows `[batch_size, seq_len, input_size]` plus a carried hidden state
/// to one prediction per window and the next hidden state.
///
/// The hidden state is an associated type: the GRU carries a single tensor
/// while the LSTM carries a cell/hidden pair, and callers never look inside.
pub trait SequenceModel<B: Backend> {
    type Hidden: Clone;

    /// Runs the recurrent stack over `windows` starting from `hidden`
    ///
    /// Returns predictions of shape `[batch_size, 1]` and the state after the
    /// last timestep. The returned state is the one to carry forward.
    fn step(&self, windows: Tensor<B, 3>, hidden: Self::Hidden) -> (Tensor<B, 2>, Self::Hidden);

    /// A zeroed hidden state for `batch_size` windows
    fn init_hidden(&self, batch_size: usize, device: &B::Device) -> Self::Hidden;

    /// Drops gradient history from a carried state
    fn detach_hidden(hidden: Self::Hidden) -> Self::Hidden;

    fn input_size(&self) -> usize;
}

/// Which recurrent cell backs the forecaster
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ModelKind {
    Gru,
    Lstm,
}

impl ModelKind {
    pub const ALL: [ModelKind; 2] = [ModelKind::Gru, ModelKind::Lstm];
}

impl fmt::Display for ModelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModelKind::Gru => write!(f, "GRU"),
            ModelKind::Lstm => write!(f, "LSTM"),
        }
    }
}

impl FromStr for ModelKind {
    type Err = ForecastError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "gru" => Ok(ModelKind::Gru),
            "lstm" => Ok(ModelKind::Lstm),
            other => Err(ForecastError::InvalidConfig(format!(
                "unknown model type '{}', expected 'gru' or 'lstm'",
                other
            ))),
        }
    }
}

/// Construction parameters shared by both forecasters
#[derive(Debug, Clone, PartialEq)]
pub struct SequenceModelConfig {
    pub input_size: usize,
    pub hidden_size: usize,
    pub output_size: usize,
    pub num_layers: usize,
    pub dropout: f64,
}

impl SequenceModelConfig {
    /// Creates a configuration with a single output per window
    pub fn new(input_size: usize, hidden_size: usize, num_layers: usize, dropout: f64) -> Self {
        Self {
            input_size,
            hidden_size,
            output_size: OUTPUT_SIZE,
            num_layers,
            dropout,
        }
    }

    /// Dropout only acts between recurrent layers, so one layer leaves it unused
    pub fn dropout_is_ineffective(&self) -> bool {
        self.num_layers < 2 && self.dropout > 0.0
    }

    /// Logs when dropout is set but there is no second layer for it to act on
    pub(crate) fn warn_ineffective_dropout(&self, model: ModelKind) {
        if self.dropout_is_ineffective() {
            warn!(
                "{}: dropout {} has no effect with {} recurrent layer(s)",
                model, self.dropout, self.num_layers
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_model_kind_parsing() {
        assert_eq!("gru".parse::<ModelKind>().unwrap(), ModelKind::Gru);
        assert_eq!("LSTM".parse::<ModelKind>().unwrap(), ModelKind::Lstm);
        assert!("cnn".parse::<ModelKind>().is_err());
        assert_eq!(ModelKind::Lstm.to_string(), "LSTM");
    }

    #[test]
    fn test_model_kind_serde() {
        let json = serde_json::to_string(&ModelKind::Gru).unwrap();
        assert_eq!(json, "\"gru\"");
        let kind: ModelKind = serde_json::from_str("\"lstm\"").unwrap();
        assert_eq!(kind, ModelKind::Lstm);
    }

    #[test]
    fn test_config_has_single_output() {
        let config = SequenceModelConfig::new(5, 16, 2, 0.2);
        assert_eq!(config.output_size, 1);
    }

    #[test]
    fn test_dropout_is_ineffective_with_one_layer() {
        assert!(SequenceModelConfig::new(5, 16, 1, 0.2).dropout_is_ineffective());
        assert!(!SequenceModelConfig::new(5, 16, 1, 0.0).dropout_is_ineffective());
        assert!(!SequenceModelConfig::new(5, 16, 2, 0.2).dropout_is_ineffective());
    }
}
