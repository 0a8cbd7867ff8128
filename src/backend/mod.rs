//! Compute backends: the command sink the solver dispatches kernels against.
//!
//! A backend owns every field buffer. The solver only ever sees opaque
//! [`BufferId`] handles and enqueues [`Dispatch`] commands; backends must
//! execute those commands in enqueue order.

use std::fmt;

use bytemuck::{Pod, Zeroable};
use glam::{UVec2, Vec4};

use crate::error::FluidError;

pub mod cpu;

#[cfg(feature = "gpu")]
pub mod gpu;

/// Handle to one field buffer owned by a backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BufferId(pub(crate) u32);

impl BufferId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Number of meaningful components per cell. Storage is always four lanes;
/// lanes beyond the format are kept at zero by every kernel that writes
/// fresh values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldFormat {
    Scalar,
    Vector2,
    Vector3,
}

impl FieldFormat {
    pub fn components(self) -> usize {
        match self {
            FieldFormat::Scalar => 1,
            FieldFormat::Vector2 => 2,
            FieldFormat::Vector3 => 3,
        }
    }
}

/// The five operator kernels every backend must provide.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Kernel {
    Advect,
    Divergence,
    Jacobi,
    Gradient,
    Splat,
}

impl Kernel {
    pub const ALL: [Kernel; 5] = [
        Kernel::Advect,
        Kernel::Divergence,
        Kernel::Jacobi,
        Kernel::Gradient,
        Kernel::Splat,
    ];

    /// Program name used by kernel source providers.
    pub fn name(self) -> &'static str {
        match self {
            Kernel::Advect => "advect",
            Kernel::Divergence => "divergence",
            Kernel::Jacobi => "jacobi",
            Kernel::Gradient => "gradient",
            Kernel::Splat => "splat",
        }
    }

    /// Input order: advect (transport, source), divergence (vector),
    /// jacobi (pressure, rhs), gradient (pressure, vector), splat (base).
    pub fn input_count(self) -> usize {
        match self {
            Kernel::Divergence | Kernel::Splat => 1,
            Kernel::Advect | Kernel::Jacobi | Kernel::Gradient => 2,
        }
    }
}

impl fmt::Display for Kernel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Uniform block shared by all kernels. Layout matches `struct Params` in
/// the WGSL programs (48 bytes, `value` 16-byte aligned).
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct KernelParams {
    pub width: u32,
    pub height: u32,
    pub timestep: f32,
    pub dissipation: f32,
    pub point: [f32; 2],
    pub radius: f32,
    pub _padding: f32,
    pub value: [f32; 4],
}

impl KernelParams {
    pub fn for_grid(size: UVec2) -> Self {
        Self {
            width: size.x,
            height: size.y,
            dissipation: 1.0,
            ..Self::default()
        }
    }
}

/// One ordered kernel invocation.
#[derive(Debug, Clone, Copy)]
pub struct Dispatch<'a> {
    pub kernel: Kernel,
    pub inputs: &'a [BufferId],
    pub output: BufferId,
    pub params: KernelParams,
}

impl Dispatch<'_> {
    /// Checks the shape rules every backend enforces before executing.
    pub fn validate(&self) -> Result<(), FluidError> {
        let expected = self.kernel.input_count();
        if self.inputs.len() != expected {
            return Err(FluidError::InputCount {
                kernel: self.kernel,
                expected,
                got: self.inputs.len(),
            });
        }
        if self.inputs.contains(&self.output) {
            return Err(FluidError::AliasedDispatch {
                kernel: self.kernel,
                output: self.output,
            });
        }
        Ok(())
    }
}

/// Ordered command queue the solver issues work against.
pub trait CommandSink {
    fn dispatch(&mut self, dispatch: &Dispatch<'_>) -> Result<(), FluidError>;

    /// Zero every cell of `buffer`.
    fn clear(&mut self, buffer: BufferId) -> Result<(), FluidError>;
}

/// A command sink that also owns field storage.
pub trait ComputeBackend: CommandSink {
    fn name(&self) -> &'static str;

    fn create_field(&mut self, size: UVec2, format: FieldFormat) -> Result<BufferId, FluidError>;

    /// Copies a buffer back to host memory. Hosts use this for display and
    /// analysis; the solver never reads back.
    fn read_field(&mut self, buffer: BufferId) -> Result<Field, FluidError>;

    /// Overwrites a buffer's contents, e.g. to seed initial conditions.
    fn upload(&mut self, buffer: BufferId, texels: &[Vec4]) -> Result<(), FluidError>;
}

/// Host-side copy of one field buffer, row-major with row 0 at the bottom
/// of the grid.
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub width: u32,
    pub height: u32,
    pub format: FieldFormat,
    pub texels: Vec<Vec4>,
}

impl Field {
    pub fn zeroed(size: UVec2, format: FieldFormat) -> Self {
        Self {
            width: size.x,
            height: size.y,
            format,
            texels: vec![Vec4::ZERO; size.x as usize * size.y as usize],
        }
    }

    pub fn size(&self) -> UVec2 {
        UVec2::new(self.width, self.height)
    }

    pub fn get(&self, x: u32, y: u32) -> Vec4 {
        self.texels[(y * self.width + x) as usize]
    }

    pub fn set(&mut self, x: u32, y: u32, value: Vec4) {
        self.texels[(y * self.width + x) as usize] = value;
    }

    /// Clamp-to-edge texel fetch.
    pub fn fetch(&self, x: i32, y: i32) -> Vec4 {
        let cx = x.clamp(0, self.width as i32 - 1) as u32;
        let cy = y.clamp(0, self.height as i32 - 1) as u32;
        self.get(cx, cy)
    }

    /// Bilinear sample at a grid-space position, where cell `(i, j)` is
    /// centred on `(i + 0.5, j + 0.5)`.
    pub fn sample(&self, x: f32, y: f32) -> Vec4 {
        let px = (x - 0.5).clamp(0.0, (self.width - 1) as f32);
        let py = (y - 0.5).clamp(0.0, (self.height - 1) as f32);
        let x0 = px.floor() as i32;
        let y0 = py.floor() as i32;
        let tx = px - x0 as f32;
        let ty = py - y0 as f32;

        let bottom = self.fetch(x0, y0).lerp(self.fetch(x0 + 1, y0), tx);
        let top = self.fetch(x0, y0 + 1).lerp(self.fetch(x0 + 1, y0 + 1), tx);
        bottom.lerp(top, ty)
    }

    /// Component-wise sum over all cells.
    pub fn sum(&self) -> Vec4 {
        self.texels.iter().copied().sum()
    }

    /// Euclidean length of the meaningful components at a cell.
    pub fn magnitude(&self, x: u32, y: u32) -> f32 {
        let v = self.get(x, y);
        match self.format {
            FieldFormat::Scalar => v.x.abs(),
            FieldFormat::Vector2 => v.truncate().truncate().length(),
            FieldFormat::Vector3 => v.truncate().length(),
        }
    }

    pub fn is_zero(&self) -> bool {
        self.texels.iter().all(|t| *t == Vec4::ZERO)
    }
}
