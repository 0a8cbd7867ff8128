//! Per-frame stable-fluids algorithm.

use glam::{Vec2, Vec3};

use crate::backend::{CommandSink, ComputeBackend, FieldFormat};
use crate::config::{PressureInit, SolverConfig};
use crate::display::DisplayField;
use crate::error::FluidError;
use crate::grid::Grid;
use crate::mouse::Mouse;
use crate::operators::Operators;
use crate::slab::Slab;

pub struct Solver {
    grid: Grid,
    window_size: Vec2,

    velocity: Slab,
    density: Slab,
    velocity_divergence: Slab,
    pressure: Slab,

    operators: Operators,
    frame: u64,
}

impl Solver {
    /// Allocates the four slabs on `backend`. Nothing is allocated after this.
    pub fn new<B: ComputeBackend + ?Sized>(
        backend: &mut B,
        grid: Grid,
        window_size: Vec2,
    ) -> Result<Self, FluidError> {
        let size = grid.size;
        let mut solver = Self {
            grid,
            window_size: Vec2::ONE,
            velocity: Slab::new(backend, size, FieldFormat::Vector2)?,
            density: Slab::new(backend, size, FieldFormat::Vector3)?,
            velocity_divergence: Slab::new(backend, size, FieldFormat::Scalar)?,
            pressure: Slab::new(backend, size, FieldFormat::Scalar)?,
            operators: Operators::new(size),
            frame: 0,
        };
        solver.set_window_size(window_size);

        log::info!(
            "solver ready: {}x{} grid on the {} backend",
            size.x,
            size.y,
            backend.name()
        );
        Ok(solver)
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    /// Display magnification only. Clamped to the valid scale range.
    pub fn set_scale(&mut self, scale: f32) {
        self.grid.scale = Grid::clamp_scale(scale);
    }

    pub fn window_size(&self) -> Vec2 {
        self.window_size
    }

    /// Updates the window size motions are normalised against. Degenerate
    /// sizes (a minimised window) are ignored.
    pub fn set_window_size(&mut self, window_size: Vec2) {
        if window_size.x > 0.0 && window_size.y > 0.0 {
            self.window_size = window_size;
        } else {
            log::debug!("ignoring degenerate window size {window_size}");
        }
    }

    pub fn frame(&self) -> u64 {
        self.frame
    }

    pub fn operators(&self) -> &Operators {
        &self.operators
    }

    pub fn velocity(&self) -> &Slab {
        &self.velocity
    }

    pub fn density(&self) -> &Slab {
        &self.density
    }

    pub fn velocity_divergence(&self) -> &Slab {
        &self.velocity_divergence
    }

    pub fn pressure(&self) -> &Slab {
        &self.pressure
    }

    pub fn slab(&self, field: DisplayField) -> &Slab {
        match field {
            DisplayField::Density => &self.density,
            DisplayField::Velocity => &self.velocity,
            DisplayField::Divergence => &self.velocity_divergence,
            DisplayField::Pressure => &self.pressure,
        }
    }

    /// Copies live parameters into the operators. `step` does this itself.
    pub fn configure(&mut self, config: &SolverConfig) {
        self.operators.configure(config);
    }

    /// Zeroes both buffers of every slab and restarts the frame count.
    pub fn reset<S: CommandSink + ?Sized>(&mut self, sink: &mut S) -> Result<(), FluidError> {
        for slab in [
            &mut self.velocity,
            &mut self.density,
            &mut self.velocity_divergence,
            &mut self.pressure,
        ] {
            slab.clear(sink)?;
            slab.clear(sink)?;
        }
        self.frame = 0;
        log::info!("solver reset");
        Ok(())
    }

    /// Advect, inject forces, project. The order is fixed.
    pub fn step<S: CommandSink + ?Sized>(
        &mut self,
        sink: &mut S,
        mouse: &Mouse,
        config: &SolverConfig,
    ) -> Result<(), FluidError> {
        self.configure(config);

        // Only the carried quantity dissipates, never momentum.
        let mut advect = self.operators.advect;
        advect.dissipation = 1.0;
        advect.compute(sink, self.velocity.read(), self.velocity.read(), &mut self.velocity)?;

        self.operators
            .advect
            .compute(sink, self.velocity.read(), self.density.read(), &mut self.density)?;

        self.add_forces(sink, mouse, Vec3::from(config.ink))?;
        self.project(sink, config.jacobi.pressure_init)?;

        self.frame += 1;
        Ok(())
    }

    /// Splats every queued motion, in arrival order, then leaves the queue
    /// empty. Left button pushes velocity, right button drops ink.
    pub fn add_forces<S: CommandSink + ?Sized>(
        &mut self,
        sink: &mut S,
        mouse: &Mouse,
        ink: Vec3,
    ) -> Result<(), FluidError> {
        let motions = mouse.drain();
        if !motions.is_empty() {
            log::debug!("frame {}: applying {} motion(s)", self.frame, motions.len());
        }

        let splat = self.operators.splat;
        for motion in motions {
            let point = self.grid.window_to_grid(motion.position, self.window_size);

            if motion.left {
                let force = Vec3::new(motion.drag.x, -motion.drag.y, 0.0);
                splat.compute(sink, &mut self.velocity, force, point)?;
            }
            if motion.right {
                splat.compute(sink, &mut self.density, ink, point)?;
            }
        }
        Ok(())
    }

    /// Removes the divergent part of the velocity field.
    pub fn project<S: CommandSink + ?Sized>(
        &mut self,
        sink: &mut S,
        pressure_init: PressureInit,
    ) -> Result<(), FluidError> {
        let ops = self.operators;

        ops.divergence
            .compute(sink, self.velocity.read(), &mut self.velocity_divergence)?;

        if pressure_init == PressureInit::Zero {
            self.pressure.clear(sink)?;
        }
        ops.jacobi
            .compute(sink, self.velocity_divergence.read(), &mut self.pressure)?;

        ops.gradient
            .compute(sink, self.pressure.read(), self.velocity.read(), &mut self.velocity)
    }
}
