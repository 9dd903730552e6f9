/// Test modules for the hourly forecasting package
///
/// This module contains test suites that cut across the pipeline stages:
///
/// * `test_helpers` - Synthetic hourly series and CSV fixtures shared by the suites
/// * `data_pipeline_tests` - CSV loading, file listing, windowing and the chronological split
/// * `model_tests` - GRU and LSTM forecaster shapes and hidden state handling
/// * `training_tests` - Training loop, evaluation and experiment records end to end
///
/// Everything runs on the CPU NdArray backend with small models so the suites
/// stay fast.
pub mod data_pipeline_tests;
pub mod test_helpers;
