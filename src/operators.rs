//! The five slab operators.
//!
//! Each operator is a small parameter block tagged with the [`Kernel`] it
//! runs. `compute` builds the uniform block and hands the dispatch to the
//! target slab, which pairs it with a swap. Operators hold no field data.

use glam::{UVec2, Vec2, Vec3};

use crate::backend::{BufferId, CommandSink, Kernel, KernelParams};
use crate::config::{AdvectConfig, JacobiConfig, SolverConfig, SplatConfig};
use crate::error::FluidError;
use crate::slab::Slab;

pub trait Operator {
    const KERNEL: Kernel;

    fn params(&self) -> KernelParams;
}

/// Semi-Lagrangian transport of `source` through `velocity`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Advect {
    grid_size: UVec2,
    pub timestep: f32,
    pub dissipation: f32,
}

impl Advect {
    pub fn new(grid_size: UVec2) -> Self {
        let defaults = AdvectConfig::default();
        Self {
            grid_size,
            timestep: defaults.timestep,
            dissipation: defaults.dissipation,
        }
    }

    pub fn configure(&mut self, config: &AdvectConfig) {
        self.timestep = config.timestep;
        self.dissipation = config.dissipation;
    }

    pub fn compute<S: CommandSink + ?Sized>(
        &self,
        sink: &mut S,
        velocity: BufferId,
        source: BufferId,
        target: &mut Slab,
    ) -> Result<(), FluidError> {
        target.apply(sink, Self::KERNEL, &[velocity, source], self.params())
    }
}

impl Operator for Advect {
    const KERNEL: Kernel = Kernel::Advect;

    fn params(&self) -> KernelParams {
        KernelParams {
            timestep: self.timestep,
            dissipation: self.dissipation,
            ..KernelParams::for_grid(self.grid_size)
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Divergence {
    grid_size: UVec2,
}

impl Divergence {
    pub fn new(grid_size: UVec2) -> Self {
        Self { grid_size }
    }

    pub fn compute<S: CommandSink + ?Sized>(
        &self,
        sink: &mut S,
        vector: BufferId,
        target: &mut Slab,
    ) -> Result<(), FluidError> {
        target.apply(sink, Self::KERNEL, &[vector], self.params())
    }
}

impl Operator for Divergence {
    const KERNEL: Kernel = Kernel::Divergence;

    fn params(&self) -> KernelParams {
        KernelParams::for_grid(self.grid_size)
    }
}

/// Iterative relaxation of `∇²p = rhs`. One dispatch and swap per iteration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Jacobi {
    grid_size: UVec2,
    pub iterations: u32,
}

impl Jacobi {
    pub fn new(grid_size: UVec2) -> Self {
        Self {
            grid_size,
            iterations: JacobiConfig::default().iterations,
        }
    }

    pub fn configure(&mut self, config: &JacobiConfig) {
        self.iterations = config.iterations;
    }

    pub fn compute<S: CommandSink + ?Sized>(
        &self,
        sink: &mut S,
        rhs: BufferId,
        pressure: &mut Slab,
    ) -> Result<(), FluidError> {
        for _ in 0..self.iterations {
            let estimate = pressure.read();
            pressure.apply(sink, Self::KERNEL, &[estimate, rhs], self.params())?;
        }
        Ok(())
    }
}

impl Operator for Jacobi {
    const KERNEL: Kernel = Kernel::Jacobi;

    fn params(&self) -> KernelParams {
        KernelParams::for_grid(self.grid_size)
    }
}

/// Subtracts the gradient of a scalar field from a vector field.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Gradient {
    grid_size: UVec2,
}

impl Gradient {
    pub fn new(grid_size: UVec2) -> Self {
        Self { grid_size }
    }

    pub fn compute<S: CommandSink + ?Sized>(
        &self,
        sink: &mut S,
        pressure: BufferId,
        vector: BufferId,
        target: &mut Slab,
    ) -> Result<(), FluidError> {
        target.apply(sink, Self::KERNEL, &[pressure, vector], self.params())
    }
}

impl Operator for Gradient {
    const KERNEL: Kernel = Kernel::Gradient;

    fn params(&self) -> KernelParams {
        KernelParams::for_grid(self.grid_size)
    }
}

/// Additive Gaussian injection of a value around a point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Splat {
    grid_size: UVec2,
    pub radius: f32,
}

impl Splat {
    pub fn new(grid_size: UVec2) -> Self {
        Self {
            grid_size,
            radius: SplatConfig::default().radius,
        }
    }

    pub fn configure(&mut self, config: &SplatConfig) {
        self.radius = config.radius;
    }

    /// Adds `value` (weighted by distance from `point`, in grid space) to
    /// the target in place.
    pub fn compute<S: CommandSink + ?Sized>(
        &self,
        sink: &mut S,
        target: &mut Slab,
        value: Vec3,
        point: Vec2,
    ) -> Result<(), FluidError> {
        let params = KernelParams {
            point: point.to_array(),
            value: value.extend(0.0).to_array(),
            ..self.params()
        };
        let base = target.read();
        target.apply(sink, Self::KERNEL, &[base], params)
    }
}

impl Operator for Splat {
    const KERNEL: Kernel = Kernel::Splat;

    fn params(&self) -> KernelParams {
        KernelParams {
            radius: self.radius,
            ..KernelParams::for_grid(self.grid_size)
        }
    }
}

/// The complete operator set a solver runs.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Operators {
    pub advect: Advect,
    pub divergence: Divergence,
    pub jacobi: Jacobi,
    pub gradient: Gradient,
    pub splat: Splat,
}

impl Operators {
    pub fn new(grid_size: UVec2) -> Self {
        Self {
            advect: Advect::new(grid_size),
            divergence: Divergence::new(grid_size),
            jacobi: Jacobi::new(grid_size),
            gradient: Gradient::new(grid_size),
            splat: Splat::new(grid_size),
        }
    }

    /// Copies the live parameters out of `config`.
    pub fn configure(&mut self, config: &SolverConfig) {
        self.advect.configure(&config.advect);
        self.jacobi.configure(&config.jacobi);
        self.splat.configure(&config.splat);
    }
}
