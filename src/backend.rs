// External crates
use burn::tensor::backend::Backend;
use log::info;

// Local modules
use crate::constants::DEVICE_ENV_VAR;

#[cfg(not(feature = "tch"))]
pub type ComputeBackend = burn_ndarray::NdArray<f32>;

#[cfg(feature = "tch")]
pub type ComputeBackend = burn::backend::LibTorch<f32>;

/// Backend used for training; evaluation runs on the inner `ComputeBackend`
pub type TrainingBackend = burn_autodiff::Autodiff<ComputeBackend>;

pub type Device = <ComputeBackend as Backend>::Device;

fn cuda_requested() -> bool {
    std::env::var(DEVICE_ENV_VAR)
        .map(|value| value.eq_ignore_ascii_case("cuda"))
        .unwrap_or(false)
}

/// Picks the compute device.
///
/// CUDA is used only when `FORECAST_DEVICE=cuda` and the crate was built with
/// the `tch` feature. Any other combination runs on the CPU.
#[cfg(feature = "tch")]
pub fn select_device() -> Device {
    use burn::backend::libtorch::LibTorchDevice;

    if cuda_requested() {
        info!("Using device: LibTorch CUDA:0");
        LibTorchDevice::Cuda(0)
    } else {
        info!("Using device: LibTorch CPU");
        LibTorchDevice::Cpu
    }
}

#[cfg(not(feature = "tch"))]
pub fn select_device() -> Device {
    if cuda_requested() {
        log::warn!(
            "{}=cuda requested but the crate was built without the `tch` feature; falling back to CPU",
            DEVICE_ENV_VAR
        );
    }
    info!("Using device: CPU NdArray");
    burn_ndarray::NdArrayDevice::Cpu
}
