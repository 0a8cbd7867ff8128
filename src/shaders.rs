//! Kernel program sources.
//!
//! Backends that compile programs (the wgpu backend) resolve all five
//! operator kernels through a [`ShaderSource`] before anything else is
//! built, so a missing program fails start-up instead of a frame.

use std::collections::HashMap;
use std::path::PathBuf;

use crate::backend::Kernel;
use crate::error::FluidError;

pub trait ShaderSource {
    /// WGSL text of the program called `name`.
    fn load(&self, name: &str) -> Result<String, FluidError>;
}

/// Programs compiled into the binary.
#[derive(Debug, Default, Clone, Copy)]
pub struct EmbeddedShaders;

impl ShaderSource for EmbeddedShaders {
    fn load(&self, name: &str) -> Result<String, FluidError> {
        let text = match name {
            "advect" => include_str!("../shaders/advect.wgsl"),
            "divergence" => include_str!("../shaders/divergence.wgsl"),
            "jacobi" => include_str!("../shaders/jacobi.wgsl"),
            "gradient" => include_str!("../shaders/gradient.wgsl"),
            "splat" => include_str!("../shaders/splat.wgsl"),
            _ => return Err(FluidError::MissingKernel(name.to_owned())),
        };
        Ok(text.to_owned())
    }
}

/// Programs read from `<dir>/<name>.wgsl` at load time.
#[derive(Debug, Clone)]
pub struct ShaderDirectory {
    dir: PathBuf,
}

impl ShaderDirectory {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path_of(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{name}.wgsl"))
    }
}

impl ShaderSource for ShaderDirectory {
    fn load(&self, name: &str) -> Result<String, FluidError> {
        let path = self.path_of(name);
        match std::fs::read_to_string(&path) {
            Ok(text) => Ok(text),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(FluidError::MissingKernel(name.to_owned()))
            }
            Err(source) => Err(FluidError::ShaderIo {
                name: name.to_owned(),
                source,
            }),
        }
    }
}

/// The source of every operator kernel, resolved up front.
#[derive(Debug, Clone)]
pub struct KernelSources {
    sources: HashMap<Kernel, String>,
}

impl KernelSources {
    pub fn load<S: ShaderSource + ?Sized>(provider: &S) -> Result<Self, FluidError> {
        let mut sources = HashMap::with_capacity(Kernel::ALL.len());
        for kernel in Kernel::ALL {
            let text = provider.load(kernel.name())?;
            if text.trim().is_empty() {
                return Err(FluidError::MissingKernel(kernel.name().to_owned()));
            }
            sources.insert(kernel, text);
        }
        log::info!("loaded {} kernel programs", sources.len());
        Ok(Self { sources })
    }

    pub fn get(&self, kernel: Kernel) -> &str {
        // `load` inserts every kernel or fails.
        &self.sources[&kernel]
    }
}
