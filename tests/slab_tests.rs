use glam::{UVec2, Vec4};
use inkflow::{CommandSink, ComputeBackend, CpuBackend, FieldFormat, FluidError, Kernel, KernelParams, Slab};

fn small_slab(backend: &mut CpuBackend, format: FieldFormat) -> Slab {
    Slab::new(backend, UVec2::new(4, 4), format).expect("slab allocation")
}

#[test]
fn test_swap_exchanges_buffers() {
    let mut backend = CpuBackend::new();
    let mut slab = small_slab(&mut backend, FieldFormat::Scalar);
    let (read, write) = (slab.read(), slab.write());
    assert_ne!(read, write);

    slab.swap();
    assert_eq!(slab.read(), write);
    assert_eq!(slab.write(), read);

    slab.swap();
    assert_eq!(slab.read(), read, "two swaps restore the original assignment");
    assert_eq!(slab.write(), write);
}

#[test]
fn test_apply_writes_then_swaps() {
    let mut backend = CpuBackend::new();
    let mut slab = small_slab(&mut backend, FieldFormat::Vector3);
    let original_read = slab.read();

    let params = KernelParams {
        point: [2.0, 2.0],
        radius: 1.0,
        value: [1.0, 0.0, 0.0, 0.0],
        ..KernelParams::for_grid(slab.size())
    };
    let base = slab.read();
    slab.apply(&mut backend, Kernel::Splat, &[base], params).unwrap();

    assert_eq!(slab.write(), original_read, "old read becomes scratch");
    let result = backend.read_field(slab.read()).unwrap();
    assert!(result.sum().x > 0.0, "splat result is visible through read()");
    assert!(backend.read_field(slab.write()).unwrap().is_zero());
}

#[test]
fn test_failed_apply_does_not_swap() {
    let mut backend = CpuBackend::new();
    let mut slab = small_slab(&mut backend, FieldFormat::Scalar);
    let (read, write) = (slab.read(), slab.write());

    // Reading the write buffer is an aliased dispatch.
    let result = slab.apply(
        &mut backend,
        Kernel::Divergence,
        &[write],
        KernelParams::for_grid(slab.size()),
    );
    assert!(matches!(result, Err(FluidError::AliasedDispatch { .. })));
    assert_eq!(slab.read(), read);
    assert_eq!(slab.write(), write);
}

#[test]
fn test_clear_zeroes_read() {
    let mut backend = CpuBackend::new();
    let mut slab = small_slab(&mut backend, FieldFormat::Scalar);
    backend
        .upload(slab.read(), &vec![Vec4::splat(3.0); 16])
        .unwrap();

    slab.clear(&mut backend).unwrap();
    assert!(backend.read_field(slab.read()).unwrap().is_zero());
}

#[test]
fn test_slab_buffers_share_size_and_format() {
    let mut backend = CpuBackend::new();
    let slab = Slab::new(&mut backend, UVec2::new(7, 3), FieldFormat::Vector2).unwrap();

    for buffer in [slab.read(), slab.write()] {
        let field = backend.read_field(buffer).unwrap();
        assert_eq!(field.size(), UVec2::new(7, 3));
        assert_eq!(field.format, FieldFormat::Vector2);
    }
}

#[test]
fn test_empty_slab_rejected() {
    let mut backend = CpuBackend::new();
    let result = Slab::new(&mut backend, UVec2::new(0, 4), FieldFormat::Scalar);
    assert!(matches!(result, Err(FluidError::Config(_))));
}

struct CountingSink(usize);

impl CommandSink for CountingSink {
    fn dispatch(&mut self, _dispatch: &inkflow::Dispatch<'_>) -> Result<(), FluidError> {
        self.0 += 1;
        Ok(())
    }

    fn clear(&mut self, _buffer: inkflow::BufferId) -> Result<(), FluidError> {
        self.0 += 1;
        Ok(())
    }
}

#[test]
fn test_every_apply_pairs_with_one_swap() {
    let mut backend = CpuBackend::new();
    let mut slab = small_slab(&mut backend, FieldFormat::Scalar);
    let start = slab.read();
    let mut sink = CountingSink(0);

    for _ in 0..3 {
        let base = slab.read();
        slab.apply(&mut sink, Kernel::Splat, &[base], KernelParams::for_grid(slab.size()))
            .unwrap();
    }
    assert_eq!(sink.0, 3);
    assert_ne!(slab.read(), start, "odd number of applies leaves buffers swapped");
}
