// External imports
use burn::module::Module;
use burn::nn::gru::{Gru, GruConfig};
use burn::nn::{Dropout, DropoutConfig, Linear, LinearConfig};
use burn::prelude::Backend;
use burn::tensor::{activation, Tensor};

// Internal imports
use super::step_2_sequence_model::{ModelKind, SequenceModel, SequenceModelConfig};

/// # GruForecaster Architecture
///
/// A stack of GRU layers followed by a ReLU and a linear projection to one
/// value per window.
///
/// ## Architecture Overview
///
/// 1. **Input**: scaled feature windows of shape [batch_size, seq_len, input_size]
/// 2. **GRU Stack**: `num_layers` GRU layers, each seeded from its slice of the hidden state
/// 3. **Dropout**: applied between GRU layers, never after the last one
/// 4. **Output**: ReLU on the last timestep, then Linear(hidden_size -> output_size)
///
/// The hidden state has shape [num_layers, batch_size, hidden_size].
#[derive(Module, Debug)]
pub struct GruForecaster<B: Backend> {
    input_size: usize,
    hidden_size: usize,
    layers: Vec<Gru<B>>,
    dropout: Dropout,
    output: Linear<B>,
}

impl<B: Backend> GruForecaster<B> {
    /// Creates a new GruForecaster
    ///
    /// # Arguments
    ///
    /// * `config` - Input width, hidden width, output width, layer count and dropout
    /// * `device` - Device to allocate parameters on
    pub fn new(config: &SequenceModelConfig, device: &B::Device) -> Self {
        config.warn_ineffective_dropout(ModelKind::Gru);

        let layers = (0..config.num_layers)
            .map(|layer| {
                let d_input = if layer == 0 {
                    config.input_size
                } else {
                    config.hidden_size
                };
                GruConfig::new(d_input, config.hidden_size, true).init(device)
            })
            .collect();

        Self {
            input_size: config.input_size,
            hidden_size: config.hidden_size,
            layers,
            dropout: DropoutConfig::new(config.dropout).init(),
            output: LinearConfig::new(config.hidden_size, config.output_size).init(device),
        }
    }

    pub fn num_layers(&self) -> usize {
        self.layers.len()
    }

    pub fn hidden_size(&self) -> usize {
        self.hidden_size
    }
}

impl<B: Backend> SequenceModel<B> for GruForecaster<B> {
    type Hidden = Tensor<B, 3>;

    fn step(&self, windows: Tensor<B, 3>, hidden: Tensor<B, 3>) -> (Tensor<B, 2>, Tensor<B, 3>) {
        let [batch_size, seq_len, _] = windows.dims();
        let last_layer = self.layers.len() - 1;

        let mut layer_input = windows;
        let mut final_states = Vec::with_capacity(self.layers.len());

        for (index, gru) in self.layers.iter().enumerate() {
            let initial = hidden
                .clone()
                .narrow(0, index, 1)
                .reshape([batch_size, self.hidden_size]);

            // [batch_size, seq_len, hidden_size]
            let sequence = gru.forward(layer_input, Some(initial));

            final_states.push(
                sequence
                    .clone()
                    .narrow(1, seq_len - 1, 1)
                    .reshape([batch_size, self.hidden_size]),
            );

            layer_input = if index < last_layer {
                self.dropout.forward(sequence)
            } else {
                sequence
            };
        }

        let last_step = layer_input
            .narrow(1, seq_len - 1, 1)
            .reshape([batch_size, self.hidden_size]);
        let prediction = self.output.forward(activation::relu(last_step));

        let next_hidden: Tensor<B, 3> = Tensor::stack(final_states, 0);
        (prediction, next_hidden)
    }

    fn init_hidden(&self, batch_size: usize, device: &B::Device) -> Tensor<B, 3> {
        Tensor::zeros([self.layers.len(), batch_size, self.hidden_size], device)
    }

    fn detach_hidden(hidden: Tensor<B, 3>) -> Tensor<B, 3> {
        hidden.detach()
    }

    fn input_size(&self) -> usize {
        self.input_size
    }
}
