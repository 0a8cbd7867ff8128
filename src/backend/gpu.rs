//! wgpu compute backend.
//!
//! Fields live in storage buffers of `vec4<f32>` texels. Every kernel shares
//! one bind group layout: binding 0 is the parameter block, bindings 1 and 2
//! are read-only inputs and binding 3 is the output. Commands are submitted
//! to a single queue, so they execute in the order the solver issued them.

use std::collections::HashMap;

use glam::{UVec2, Vec4};
use tokio::sync::oneshot;
use wgpu::util::DeviceExt;
use wgpu::{BindGroupLayout, Buffer, ComputePipeline, Device, Queue};

use super::{BufferId, CommandSink, ComputeBackend, Dispatch, Field, FieldFormat, Kernel, KernelParams};
use crate::error::{ConfigError, FluidError};
use crate::shaders::{KernelSources, ShaderSource};

const WORKGROUP_SIZE: u32 = 8;
const TEXEL_BYTES: u64 = std::mem::size_of::<[f32; 4]>() as u64;

struct GpuField {
    buffer: Buffer,
    size: UVec2,
    format: FieldFormat,
}

impl GpuField {
    fn byte_len(&self) -> u64 {
        self.size.x as u64 * self.size.y as u64 * TEXEL_BYTES
    }
}

pub struct GpuBackend {
    device: Device,
    queue: Queue,
    layout: BindGroupLayout,
    pipelines: HashMap<Kernel, ComputePipeline>,
    params_buffer: Buffer,
    fields: Vec<GpuField>,
}

impl GpuBackend {
    /// Resolves all kernel programs, then opens the default adapter.
    pub async fn new<S: ShaderSource + ?Sized>(shaders: &S) -> Result<Self, FluidError> {
        let sources = KernelSources::load(shaders)?;

        let instance = wgpu::Instance::default();
        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: None,
                force_fallback_adapter: false,
            })
            .await
            .ok_or(FluidError::AdapterUnavailable)?;
        log::info!("gpu backend using adapter {:?}", adapter.get_info().name);

        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: Some("inkflow device"),
                    required_features: wgpu::Features::empty(),
                    required_limits: wgpu::Limits::downlevel_defaults(),
                },
                None,
            )
            .await?;

        Self::with_device(device, queue, &sources).await
    }

    /// Builds the pipelines on an existing device. Compilation errors are
    /// captured and returned instead of reaching the device's error handler.
    pub async fn with_device(device: Device, queue: Queue, sources: &KernelSources) -> Result<Self, FluidError> {
        let params_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("kernel params"),
            contents: bytemuck::bytes_of(&KernelParams::default()),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("kernel layout"),
            entries: &[
                layout_entry(0, wgpu::BufferBindingType::Uniform),
                layout_entry(1, wgpu::BufferBindingType::Storage { read_only: true }),
                layout_entry(2, wgpu::BufferBindingType::Storage { read_only: true }),
                layout_entry(3, wgpu::BufferBindingType::Storage { read_only: false }),
            ],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("kernel pipeline layout"),
            bind_group_layouts: &[&layout],
            push_constant_ranges: &[],
        });

        let mut pipelines = HashMap::with_capacity(Kernel::ALL.len());
        for kernel in Kernel::ALL {
            device.push_error_scope(wgpu::ErrorFilter::Validation);
            let module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
                label: Some(kernel.name()),
                source: wgpu::ShaderSource::Wgsl(sources.get(kernel).into()),
            });
            let pipeline = device.create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
                label: Some(kernel.name()),
                layout: Some(&pipeline_layout),
                module: &module,
                entry_point: "main",
                compilation_options: Default::default(),
            });
            if let Some(error) = device.pop_error_scope().await {
                return Err(FluidError::ShaderCompile {
                    name: kernel.name().to_owned(),
                    message: error.to_string(),
                });
            }
            pipelines.insert(kernel, pipeline);
        }

        Ok(Self {
            device,
            queue,
            layout,
            pipelines,
            params_buffer,
            fields: Vec::new(),
        })
    }

    fn field(&self, buffer: BufferId) -> Result<&GpuField, FluidError> {
        self.fields
            .get(buffer.index())
            .ok_or(FluidError::UnknownBuffer(buffer))
    }

    fn encoder(&self, label: &str) -> wgpu::CommandEncoder {
        self.device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor { label: Some(label) })
    }
}

fn layout_entry(binding: u32, ty: wgpu::BufferBindingType) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::COMPUTE,
        ty: wgpu::BindingType::Buffer {
            ty,
            has_dynamic_offset: false,
            min_binding_size: None,
        },
        count: None,
    }
}

impl CommandSink for GpuBackend {
    fn dispatch(&mut self, dispatch: &Dispatch<'_>) -> Result<(), FluidError> {
        dispatch.validate()?;

        let output = self.field(dispatch.output)?;
        let mut inputs = Vec::with_capacity(dispatch.inputs.len());
        for id in dispatch.inputs {
            let input = self.field(*id)?;
            if input.size != output.size {
                return Err(FluidError::SizeMismatch {
                    kernel: dispatch.kernel,
                    a: (input.size.x, input.size.y),
                    b: (output.size.x, output.size.y),
                });
            }
            inputs.push(input);
        }
        // Single-input kernels never read binding 2.
        let first = inputs[0];
        let second = inputs.get(1).copied().unwrap_or(first);

        // Staged writes land at the start of the next submit, ahead of this pass.
        self.queue
            .write_buffer(&self.params_buffer, 0, bytemuck::bytes_of(&dispatch.params));

        let bind_group = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some(dispatch.kernel.name()),
            layout: &self.layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: self.params_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: first.buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: second.buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 3,
                    resource: output.buffer.as_entire_binding(),
                },
            ],
        });

        let mut encoder = self.encoder(dispatch.kernel.name());
        {
            let mut pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
                label: Some(dispatch.kernel.name()),
                timestamp_writes: None,
            });
            pass.set_pipeline(&self.pipelines[&dispatch.kernel]);
            pass.set_bind_group(0, &bind_group, &[]);
            pass.dispatch_workgroups(
                output.size.x.div_ceil(WORKGROUP_SIZE),
                output.size.y.div_ceil(WORKGROUP_SIZE),
                1,
            );
        }
        self.queue.submit(std::iter::once(encoder.finish()));
        Ok(())
    }

    fn clear(&mut self, buffer: BufferId) -> Result<(), FluidError> {
        let field = self.field(buffer)?;
        let mut encoder = self.encoder("clear");
        encoder.clear_buffer(&field.buffer, 0, None);
        self.queue.submit(std::iter::once(encoder.finish()));
        Ok(())
    }
}

impl ComputeBackend for GpuBackend {
    fn name(&self) -> &'static str {
        "gpu"
    }

    fn create_field(&mut self, size: UVec2, format: FieldFormat) -> Result<BufferId, FluidError> {
        if size.x == 0 || size.y == 0 {
            return Err(ConfigError::EmptyGrid {
                width: size.x,
                height: size.y,
            }
            .into());
        }
        // New buffers are zero-initialised by wgpu.
        let buffer = self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("field"),
            size: size.x as u64 * size.y as u64 * TEXEL_BYTES,
            usage: wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_SRC | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let id = BufferId(self.fields.len() as u32);
        self.fields.push(GpuField { buffer, size, format });
        Ok(id)
    }

    fn read_field(&mut self, buffer: BufferId) -> Result<Field, FluidError> {
        let field = self.field(buffer)?;
        let len = field.byte_len();

        let staging = self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("readback"),
            size: len,
            usage: wgpu::BufferUsages::MAP_READ | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let mut encoder = self.encoder("readback");
        encoder.copy_buffer_to_buffer(&field.buffer, 0, &staging, 0, len);
        self.queue.submit(std::iter::once(encoder.finish()));

        let slice = staging.slice(..);
        let (sender, mut receiver) = oneshot::channel();
        slice.map_async(wgpu::MapMode::Read, move |result| {
            let _ = sender.send(result);
        });
        self.device.poll(wgpu::Maintain::Wait);

        match receiver.try_recv() {
            Ok(Ok(())) => {}
            Ok(Err(e)) => return Err(FluidError::Readback(e.to_string())),
            Err(e) => return Err(FluidError::Readback(e.to_string())),
        }

        let texels = {
            let data = slice.get_mapped_range();
            bytemuck::cast_slice::<u8, [f32; 4]>(&data)
                .iter()
                .map(|t| Vec4::from_array(*t))
                .collect()
        };
        staging.unmap();

        Ok(Field {
            width: field.size.x,
            height: field.size.y,
            format: field.format,
            texels,
        })
    }

    fn upload(&mut self, buffer: BufferId, texels: &[Vec4]) -> Result<(), FluidError> {
        let field = self.field(buffer)?;
        let expected = (field.size.x * field.size.y) as usize;
        if texels.len() != expected {
            return Err(FluidError::UploadSize {
                expected,
                got: texels.len(),
            });
        }
        let raw: Vec<[f32; 4]> = texels.iter().map(|t| t.to_array()).collect();
        self.queue
            .write_buffer(&field.buffer, 0, bytemuck::cast_slice(&raw));
        Ok(())
    }
}
