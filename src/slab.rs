use glam::UVec2;

use crate::backend::{BufferId, CommandSink, ComputeBackend, Dispatch, FieldFormat, Kernel, KernelParams};
use crate::error::FluidError;

/// A double-buffered field: `read` is authoritative, `write` is scratch.
///
/// Kernels cannot read and write one buffer in a single dispatch, so every
/// in-place update goes through [`Slab::apply`], which writes into `write`
/// and then swaps.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Slab {
    read: BufferId,
    write: BufferId,
    size: UVec2,
    format: FieldFormat,
}

impl Slab {
    pub fn new<B: ComputeBackend + ?Sized>(
        backend: &mut B,
        size: UVec2,
        format: FieldFormat,
    ) -> Result<Self, FluidError> {
        let read = backend.create_field(size, format)?;
        let write = backend.create_field(size, format)?;
        Ok(Self::from_buffers(read, write, size, format))
    }

    pub fn from_buffers(read: BufferId, write: BufferId, size: UVec2, format: FieldFormat) -> Self {
        Self {
            read,
            write,
            size,
            format,
        }
    }

    pub fn read(&self) -> BufferId {
        self.read
    }

    pub fn write(&self) -> BufferId {
        self.write
    }

    pub fn size(&self) -> UVec2 {
        self.size
    }

    pub fn format(&self) -> FieldFormat {
        self.format
    }

    pub fn swap(&mut self) {
        std::mem::swap(&mut self.read, &mut self.write);
    }

    /// Dispatches `kernel` into this slab's write buffer, then swaps. On a
    /// failed dispatch the slab is left untouched.
    pub fn apply<S: CommandSink + ?Sized>(
        &mut self,
        sink: &mut S,
        kernel: Kernel,
        inputs: &[BufferId],
        params: KernelParams,
    ) -> Result<(), FluidError> {
        sink.dispatch(&Dispatch {
            kernel,
            inputs,
            output: self.write,
            params,
        })?;
        self.swap();
        Ok(())
    }

    /// Zeroes the field: clears the write buffer, then swaps.
    pub fn clear<S: CommandSink + ?Sized>(&mut self, sink: &mut S) -> Result<(), FluidError> {
        sink.clear(self.write)?;
        self.swap();
        Ok(())
    }
}
