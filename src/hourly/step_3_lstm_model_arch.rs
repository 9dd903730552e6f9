// External imports
use burn::module::Module;
use burn::nn::{Dropout, DropoutConfig, Linear, LinearConfig, Lstm, LstmConfig, LstmState};
use burn::prelude::Backend;
use burn::tensor::{activation, Tensor};

// Internal imports
use super::step_2_sequence_model::{ModelKind, SequenceModel, SequenceModelConfig};

/// Carried LSTM state: cell and hidden memory, each [num_layers, batch_size, hidden_size]
#[derive(Debug, Clone)]
pub struct LstmHidden<B: Backend> {
    pub cell: Tensor<B, 3>,
    pub hidden: Tensor<B, 3>,
}

/// LstmForecaster architecture for next-hour forecasting
///
/// Same layout as the GRU forecaster: stacked LSTM layers with dropout in
/// between, ReLU on the last timestep, then a linear head.
#[derive(Module, Debug)]
pub struct LstmForecaster<B: Backend> {
    input_size: usize,
    hidden_size: usize,
    layers: Vec<Lstm<B>>,
    dropout: Dropout,
    output: Linear<B>,
}

impl<B: Backend> LstmForecaster<B> {
    /// Create a new LstmForecaster
    pub fn new(config: &SequenceModelConfig, device: &B::Device) -> Self {
        config.warn_ineffective_dropout(ModelKind::Lstm);

        let layers = (0..config.num_layers)
            .map(|layer| {
                let d_input = if layer == 0 {
                    config.input_size
                } else {
                    config.hidden_size
                };
                LstmConfig::new(d_input, config.hidden_size, true).init(device)
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

    fn layer_slice(&self, state: &Tensor<B, 3>, layer: usize, batch_size: usize) -> Tensor<B, 2> {
        state
            .clone()
            .narrow(0, layer, 1)
            .reshape([batch_size, self.hidden_size])
    }
}

impl<B: Backend> SequenceModel<B> for LstmForecaster<B> {
    type Hidden = LstmHidden<B>;

    fn step(&self, windows: Tensor<B, 3>, state: LstmHidden<B>) -> (Tensor<B, 2>, LstmHidden<B>) {
        let [batch_size, seq_len, _] = windows.dims();
        let last_layer = self.layers.len() - 1;

        let mut layer_input = windows;
        let mut cells = Vec::with_capacity(self.layers.len());
        let mut hiddens = Vec::with_capacity(self.layers.len());

        for (index, lstm) in self.layers.iter().enumerate() {
            let initial = LstmState::new(
                self.layer_slice(&state.cell, index, batch_size),
                self.layer_slice(&state.hidden, index, batch_size),
            );

            let (sequence, last) = lstm.forward(layer_input, Some(initial));
            cells.push(last.cell);
            hiddens.push(last.hidden);

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

        let next = LstmHidden {
            cell: Tensor::stack(cells, 0),
            hidden: Tensor::stack(hiddens, 0),
        };
        (prediction, next)
    }

    fn init_hidden(&self, batch_size: usize, device: &B::Device) -> LstmHidden<B> {
        let shape = [self.layers.len(), batch_size, self.hidden_size];
        LstmHidden {
            cell: Tensor::zeros(shape, device),
            hidden: Tensor::zeros(shape, device),
        }
    }

    fn detach_hidden(state: LstmHidden<B>) -> LstmHidden<B> {
        LstmHidden {
            cell: state.cell.detach(),
            hidden: state.hidden.detach(),
        }
    }

    fn input_size(&self) -> usize {
        self.input_size
    }
}
