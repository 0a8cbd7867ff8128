use std::path::Path;

use crate::backend::ComputeBackend;
use crate::display::DisplayField;
use crate::error::FluidError;
use crate::solver::Solver;

/// Writes solver fields to PNG files.
pub struct ImageExporter {
    magnification: f32,
}

impl ImageExporter {
    pub fn new(magnification: f32) -> Self {
        Self { magnification }
    }

    pub fn export_field_png<B: ComputeBackend + ?Sized>(
        &self,
        backend: &mut B,
        solver: &Solver,
        field: DisplayField,
        path: &Path,
    ) -> Result<(), FluidError> {
        let data = backend.read_field(solver.slab(field).read())?;
        let img = field.display().render(&data, self.magnification);
        img.save(path)?;
        log::debug!("exported {} to {}", field.label(), path.display());
        Ok(())
    }

    pub fn export_density_png<B: ComputeBackend + ?Sized>(
        &self,
        backend: &mut B,
        solver: &Solver,
        path: &Path,
    ) -> Result<(), FluidError> {
        self.export_field_png(backend, solver, DisplayField::Density, path)
    }

    pub fn export_velocity_png<B: ComputeBackend + ?Sized>(
        &self,
        backend: &mut B,
        solver: &Solver,
        path: &Path,
    ) -> Result<(), FluidError> {
        self.export_field_png(backend, solver, DisplayField::Velocity, path)
    }
}
