use crate::backend::{BufferId, Kernel};

/// Rejected parameter or grid values. Raised at the settings/UI boundary,
/// never from inside a frame.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("grid must be at least 1x1 cells, got {width}x{height}")]
    EmptyGrid { width: u32, height: u32 },
    #[error("grid scale must lie in [{min}, {max}], got {scale}")]
    ScaleOutOfRange { scale: f32, min: f32, max: f32 },
    #[error("advect timestep must be positive, got {0}")]
    NonPositiveTimestep(f32),
    #[error("dissipation must lie in (0, 1], got {0}")]
    DissipationOutOfRange(f32),
    #[error("at most {max} jacobi iterations, got {iterations}")]
    TooManyIterations { iterations: u32, max: u32 },
    #[error("splat radius must be positive, got {0}")]
    NonPositiveRadius(f32),
    #[error("ink component {index} must be finite, got {value}")]
    InvalidInk { index: usize, value: f32 },
}

#[derive(Debug, thiserror::Error)]
pub enum FluidError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("buffer {0:?} does not belong to this backend")]
    UnknownBuffer(BufferId),
    #[error("{kernel} dispatch writes {output:?}, which it also reads")]
    AliasedDispatch { kernel: Kernel, output: BufferId },
    #[error("{kernel} expects {expected} input buffer(s), got {got}")]
    InputCount {
        kernel: Kernel,
        expected: usize,
        got: usize,
    },
    #[error("{kernel} dispatch mixes buffer sizes {a:?} and {b:?}")]
    SizeMismatch {
        kernel: Kernel,
        a: (u32, u32),
        b: (u32, u32),
    },

    #[error("upload of {got} texels into a buffer of {expected}")]
    UploadSize { expected: usize, got: usize },

    #[error("kernel program `{0}` is missing")]
    MissingKernel(String),
    #[error("failed to read kernel program `{name}`: {source}")]
    ShaderIo {
        name: String,
        #[source]
        source: std::io::Error,
    },

    #[error("kernel program `{name}` failed to compile: {message}")]
    ShaderCompile { name: String, message: String },

    #[error("no compatible GPU adapter found")]
    AdapterUnavailable,
    #[cfg(feature = "gpu")]
    #[error("GPU device request failed: {0}")]
    Device(#[from] wgpu::RequestDeviceError),
    #[error("buffer readback failed: {0}")]
    Readback(String),

    #[error("settings I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("settings JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("image export failed: {0}")]
    Image(#[from] image::ImageError),
}
