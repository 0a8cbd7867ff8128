use crate::backend::{ComputeBackend, Field};
use crate::error::FluidError;
use crate::solver::Solver;

#[derive(Debug, Clone, PartialEq)]
pub struct FieldMetrics {
    /// Sum of all density components over the grid.
    pub total_density: f32,
    pub max_density: f32,
    pub total_kinetic_energy: f32,
    pub max_speed: f32,
    pub avg_speed: f32,
    /// Mean |∇·v| of the velocity field as it stands after projection.
    pub mean_divergence: f32,
    pub max_pressure: f32,
    pub frame: u64,
}

impl FieldMetrics {
    pub fn analyze<B: ComputeBackend + ?Sized>(backend: &mut B, solver: &Solver) -> Result<Self, FluidError> {
        let velocity = backend.read_field(solver.velocity().read())?;
        let density = backend.read_field(solver.density().read())?;
        let pressure = backend.read_field(solver.pressure().read())?;
        Ok(Self::from_fields(&velocity, &density, &pressure, solver.frame()))
    }

    pub fn from_fields(velocity: &Field, density: &Field, pressure: &Field, frame: u64) -> Self {
        let cells = velocity.texels.len().max(1) as f32;

        let mut total_density = 0.0f32;
        let mut max_density = 0.0f32;
        for texel in &density.texels {
            let d = texel.x + texel.y + texel.z;
            total_density += d;
            max_density = max_density.max(d);
        }

        let mut total_kinetic_energy = 0.0f32;
        let mut max_speed = 0.0f32;
        let mut speed_sum = 0.0f32;
        let mut divergence_sum = 0.0f32;
        for y in 0..velocity.height {
            for x in 0..velocity.width {
                let speed = velocity.magnitude(x, y);
                total_kinetic_energy += 0.5 * speed * speed;
                max_speed = max_speed.max(speed);
                speed_sum += speed;

                let (xi, yi) = (x as i32, y as i32);
                let div = 0.5
                    * (velocity.fetch(xi + 1, yi).x - velocity.fetch(xi - 1, yi).x
                        + velocity.fetch(xi, yi + 1).y
                        - velocity.fetch(xi, yi - 1).y);
                divergence_sum += div.abs();
            }
        }

        let max_pressure = pressure.texels.iter().fold(0.0f32, |m, t| m.max(t.x.abs()));

        Self {
            total_density,
            max_density,
            total_kinetic_energy,
            max_speed,
            avg_speed: speed_sum / cells,
            mean_divergence: divergence_sum / cells,
            max_pressure,
            frame,
        }
    }

    pub fn print_summary(&self) {
        println!("Frame {} Metrics:", self.frame);
        println!("  Total Density: {:.6}", self.total_density);
        println!("  Max Density: {:.6}", self.max_density);
        println!("  Kinetic Energy: {:.6}", self.total_kinetic_energy);
        println!("  Max Speed: {:.6}", self.max_speed);
        println!("  Avg Speed: {:.6}", self.avg_speed);
        println!("  Mean |Divergence|: {:.6}", self.mean_divergence);
        println!("  Max |Pressure|: {:.6}", self.max_pressure);
        println!();
    }
}

#[derive(Debug, Default)]
pub struct AnalysisRecorder {
    pub metrics_history: Vec<FieldMetrics>,
}

impl AnalysisRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_frame<B: ComputeBackend + ?Sized>(
        &mut self,
        backend: &mut B,
        solver: &Solver,
    ) -> Result<&FieldMetrics, FluidError> {
        let metrics = FieldMetrics::analyze(backend, solver)?;
        self.metrics_history.push(metrics);
        Ok(&self.metrics_history[self.metrics_history.len() - 1])
    }

    pub fn print_trends(&self) {
        let (Some(first), Some(last)) = (self.metrics_history.first(), self.metrics_history.last()) else {
            return;
        };
        if self.metrics_history.len() < 2 {
            return;
        }

        println!("=== TREND ANALYSIS ===");
        println!(
            "Density change: {:.6} -> {:.6} ({:+.3}%)",
            first.total_density,
            last.total_density,
            (last.total_density - first.total_density) / first.total_density.max(0.001) * 100.0
        );
        println!(
            "Kinetic Energy change: {:.6} -> {:.6} ({:+.3}%)",
            first.total_kinetic_energy,
            last.total_kinetic_energy,
            (last.total_kinetic_energy - first.total_kinetic_energy) / first.total_kinetic_energy.max(0.001)
                * 100.0
        );
        println!(
            "Mean |Divergence| change: {:.6} -> {:.6}",
            first.mean_divergence, last.mean_divergence
        );
    }
}
