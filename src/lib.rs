//! Interactive 2D stable-fluids simulation.
//!
//! A [`Solver`] advances velocity and ink density once per frame by
//! dispatching operator kernels against a compute backend: the rayon CPU
//! reference backend, or a wgpu backend with the `gpu` feature.

pub mod analysis;
pub mod app;
pub mod backend;
pub mod config;
pub mod display;
pub mod error;
pub mod export;
pub mod grid;
pub mod mouse;
pub mod operators;
pub mod shaders;
pub mod slab;
pub mod solver;

// Feature-based backend selection
#[cfg(feature = "cpu")]
pub type DefaultBackend = backend::cpu::CpuBackend;

#[cfg(all(feature = "gpu", not(feature = "cpu")))]
pub type DefaultBackend = backend::gpu::GpuBackend;

pub use analysis::{AnalysisRecorder, FieldMetrics};
pub use app::InkflowApp;
pub use backend::cpu::CpuBackend;
pub use backend::{BufferId, CommandSink, ComputeBackend, Dispatch, Field, FieldFormat, Kernel, KernelParams};
pub use config::{PressureInit, Settings, SolverConfig};
pub use display::{Display, DisplayField};
pub use error::{ConfigError, FluidError};
pub use export::ImageExporter;
pub use grid::Grid;
pub use mouse::{Motion, Mouse, PointerTracker};
pub use operators::Operators;
pub use shaders::{EmbeddedShaders, ShaderDirectory, ShaderSource};
pub use slab::Slab;
pub use solver::Solver;

#[cfg(feature = "gpu")]
pub use backend::gpu::GpuBackend;
