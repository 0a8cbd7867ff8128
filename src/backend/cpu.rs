//! Reference backend that runs every kernel on the CPU.
//!
//! Commands execute immediately, which trivially satisfies the in-order
//! guarantee. Rows are processed in parallel with rayon.

use glam::{UVec2, Vec2, Vec4};
use rayon::prelude::*;

use super::{BufferId, CommandSink, ComputeBackend, Dispatch, Field, FieldFormat, Kernel, KernelParams};
use crate::error::{ConfigError, FluidError};

#[derive(Debug, Default)]
pub struct CpuBackend {
    fields: Vec<Field>,
    dispatches: u64,
}

impl CpuBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of kernel dispatches executed so far (clears excluded).
    pub fn dispatch_count(&self) -> u64 {
        self.dispatches
    }

    pub fn field(&self, buffer: BufferId) -> Result<&Field, FluidError> {
        self.fields
            .get(buffer.index())
            .ok_or(FluidError::UnknownBuffer(buffer))
    }

    fn field_mut(&mut self, buffer: BufferId) -> Result<&mut Field, FluidError> {
        self.fields
            .get_mut(buffer.index())
            .ok_or(FluidError::UnknownBuffer(buffer))
    }
}

impl CommandSink for CpuBackend {
    fn dispatch(&mut self, dispatch: &Dispatch<'_>) -> Result<(), FluidError> {
        dispatch.validate()?;

        // Take the output out of the arena so inputs can be borrowed alongside it.
        let mut output = std::mem::replace(
            self.field_mut(dispatch.output)?,
            Field::zeroed(UVec2::ZERO, FieldFormat::Scalar),
        );
        let result = run_kernel(&self.fields, dispatch, &mut output);
        self.fields[dispatch.output.index()] = output;
        result?;

        self.dispatches += 1;
        Ok(())
    }

    fn clear(&mut self, buffer: BufferId) -> Result<(), FluidError> {
        self.field_mut(buffer)?.texels.fill(Vec4::ZERO);
        Ok(())
    }
}

impl ComputeBackend for CpuBackend {
    fn name(&self) -> &'static str {
        "cpu"
    }

    fn create_field(&mut self, size: UVec2, format: FieldFormat) -> Result<BufferId, FluidError> {
        if size.x == 0 || size.y == 0 {
            return Err(ConfigError::EmptyGrid {
                width: size.x,
                height: size.y,
            }
            .into());
        }
        let id = BufferId(self.fields.len() as u32);
        self.fields.push(Field::zeroed(size, format));
        Ok(id)
    }

    fn read_field(&mut self, buffer: BufferId) -> Result<Field, FluidError> {
        self.field(buffer).cloned()
    }

    fn upload(&mut self, buffer: BufferId, texels: &[Vec4]) -> Result<(), FluidError> {
        let field = self.field_mut(buffer)?;
        if texels.len() != field.texels.len() {
            return Err(FluidError::UploadSize {
                expected: field.texels.len(),
                got: texels.len(),
            });
        }
        field.texels.copy_from_slice(texels);
        Ok(())
    }
}

fn run_kernel(fields: &[Field], dispatch: &Dispatch<'_>, output: &mut Field) -> Result<(), FluidError> {
    let inputs = dispatch
        .inputs
        .iter()
        .map(|id| fields.get(id.index()).ok_or(FluidError::UnknownBuffer(*id)))
        .collect::<Result<Vec<_>, _>>()?;

    for input in &inputs {
        if input.size() != output.size() {
            return Err(FluidError::SizeMismatch {
                kernel: dispatch.kernel,
                a: (input.width, input.height),
                b: (output.width, output.height),
            });
        }
    }

    let params = &dispatch.params;
    match dispatch.kernel {
        Kernel::Advect => for_each_cell(output, |x, y| advect(inputs[0], inputs[1], params, x, y)),
        Kernel::Divergence => for_each_cell(output, |x, y| divergence(inputs[0], x, y)),
        Kernel::Jacobi => for_each_cell(output, |x, y| jacobi(inputs[0], inputs[1], x, y)),
        Kernel::Gradient => for_each_cell(output, |x, y| gradient(inputs[0], inputs[1], x, y)),
        Kernel::Splat => for_each_cell(output, |x, y| splat(inputs[0], params, x, y)),
    }
    Ok(())
}

fn for_each_cell<F>(output: &mut Field, kernel: F)
where
    F: Fn(i32, i32) -> Vec4 + Sync,
{
    let width = output.width as usize;
    output
        .texels
        .par_chunks_mut(width)
        .enumerate()
        .for_each(|(y, row)| {
            for (x, texel) in row.iter_mut().enumerate() {
                *texel = kernel(x as i32, y as i32);
            }
        });
}

fn cell_centre(x: i32, y: i32) -> Vec2 {
    Vec2::new(x as f32 + 0.5, y as f32 + 0.5)
}

fn advect(transport: &Field, source: &Field, params: &KernelParams, x: i32, y: i32) -> Vec4 {
    let velocity = transport.fetch(x, y).truncate().truncate();
    let back = cell_centre(x, y) - params.timestep * velocity;
    source.sample(back.x, back.y) * params.dissipation
}

fn divergence(vector: &Field, x: i32, y: i32) -> Vec4 {
    let left = vector.fetch(x - 1, y).x;
    let right = vector.fetch(x + 1, y).x;
    let bottom = vector.fetch(x, y - 1).y;
    let top = vector.fetch(x, y + 1).y;
    Vec4::new(0.5 * ((right - left) + (top - bottom)), 0.0, 0.0, 0.0)
}

fn jacobi(pressure: &Field, rhs: &Field, x: i32, y: i32) -> Vec4 {
    let left = pressure.fetch(x - 1, y).x;
    let right = pressure.fetch(x + 1, y).x;
    let bottom = pressure.fetch(x, y - 1).x;
    let top = pressure.fetch(x, y + 1).x;
    let b = rhs.fetch(x, y).x;
    Vec4::new((left + right + bottom + top - b) * 0.25, 0.0, 0.0, 0.0)
}

fn gradient(pressure: &Field, vector: &Field, x: i32, y: i32) -> Vec4 {
    let left = pressure.fetch(x - 1, y).x;
    let right = pressure.fetch(x + 1, y).x;
    let bottom = pressure.fetch(x, y - 1).x;
    let top = pressure.fetch(x, y + 1).x;
    let grad = Vec4::new(right - left, top - bottom, 0.0, 0.0) * 0.5;
    vector.fetch(x, y) - grad
}

fn splat(base: &Field, params: &KernelParams, x: i32, y: i32) -> Vec4 {
    let offset = cell_centre(x, y) - Vec2::from(params.point);
    base.fetch(x, y) + Vec4::from(params.value) * splat_weight(offset, params.radius)
}

/// Gaussian falloff that is ~0.018 at `radius` and negligible beyond.
pub fn splat_weight(offset: Vec2, radius: f32) -> f32 {
    (-4.0 * offset.length_squared() / (radius * radius)).exp()
}
