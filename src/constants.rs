// Feature columns, in the order they are fed to the recurrent models
pub const FEATURE_COLUMNS: [&str; 5] = ["value", "hour", "day_of_week", "month", "day_of_year"];

// Column holding the raw measurement
pub const VALUE_COLUMN: &str = "value";

// Accepted timestamp layouts, tried in order
pub const TIMESTAMP_FORMATS: [&str; 3] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M"];

// Model parameters
pub const SEQUENCE_LENGTH: usize = 10; // Number of hours to look back
pub const HIDDEN_SIZE: usize = 256;
pub const NUM_LAYERS: usize = 2;
pub const OUTPUT_SIZE: usize = 1;
pub const DEFAULT_DROPOUT: f64 = 0.2;

// Training parameters
pub const BATCH_SIZE: usize = 1024;
pub const LEARNING_RATE: f64 = 0.001;
pub const EPOCHS: usize = 5;
pub const LOG_INTERVAL: usize = 200;
pub const DEFAULT_SEED: u64 = 42;

// Data preprocessing
pub const TEST_SPLIT_RATIO: f64 = 0.1; // 10% of each file's windows held out

// Files in the data directory that are not a single-region series
pub const EXCLUDED_FILES: [&str; 1] = ["pjm_hourly_est.csv"];

pub const DEFAULT_DATA_DIR: &str = "data";

// Floor for the sMAPE denominator
pub const SMAPE_EPSILON: f64 = 1e-8;

// Environment variable consulted when picking the compute device
pub const DEVICE_ENV_VAR: &str = "FORECAST_DEVICE";
