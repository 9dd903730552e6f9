pub mod backend;
pub mod config;
pub mod constants;
pub mod error;
pub mod hourly;
#[cfg(test)]
pub mod test;
pub mod util {
    pub mod feature_engineering;
    pub mod file_utils;
    pub mod model_logger;
    pub mod pre_processor;
}

/// Build metadata generated by `build.rs`
pub mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}
