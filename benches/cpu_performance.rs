use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use glam::{UVec2, Vec2, Vec3};
use inkflow::{CpuBackend, FieldFormat, Grid, Motion, Mouse, Slab, Solver, SolverConfig, operators::Operators};

fn drag_at(position: Vec2) -> Motion {
    Motion {
        position,
        drag: Vec2::new(4.0, 1.0),
        left: true,
        right: true,
    }
}

fn benchmark_step(c: &mut Criterion) {
    let mut group = c.benchmark_group("solver_step");
    group.sample_size(20);

    for size in [64u32, 128, 256].iter() {
        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, &size| {
            let mut backend = CpuBackend::new();
            let grid = Grid::new(size, size).unwrap();
            let window = grid.size.as_vec2();
            let mut solver = Solver::new(&mut backend, grid, window).unwrap();
            let mouse = Mouse::new();
            let config = SolverConfig::default();

            b.iter(|| {
                mouse.push(drag_at(window * 0.5));
                black_box(solver.step(&mut backend, &mouse, &config).unwrap());
            });
        });
    }
    group.finish();
}

fn benchmark_jacobi_iterations(c: &mut Criterion) {
    let mut group = c.benchmark_group("jacobi_iterations");
    let size = 128;

    for iterations in [0u32, 20, 50, 200].iter() {
        group.bench_with_input(BenchmarkId::from_parameter(iterations), iterations, |b, &iterations| {
            let mut backend = CpuBackend::new();
            let grid = Grid::new(size, size).unwrap();
            let mut solver = Solver::new(&mut backend, grid, grid.size.as_vec2()).unwrap();
            let mouse = Mouse::new();
            let mut config = SolverConfig::default();
            config.jacobi.iterations = iterations;

            b.iter(|| black_box(solver.step(&mut backend, &mouse, &config).unwrap()));
        });
    }
    group.finish();
}

fn benchmark_operators(c: &mut Criterion) {
    let mut group = c.benchmark_group("operators");
    let size = UVec2::new(128, 128);

    let mut backend = CpuBackend::new();
    let mut velocity = Slab::new(&mut backend, size, FieldFormat::Vector2).unwrap();
    let mut density = Slab::new(&mut backend, size, FieldFormat::Vector3).unwrap();
    let mut divergence = Slab::new(&mut backend, size, FieldFormat::Scalar).unwrap();
    let mut pressure = Slab::new(&mut backend, size, FieldFormat::Scalar).unwrap();
    let mut ops = Operators::new(size);
    ops.jacobi.iterations = 1;

    let centre = size.as_vec2() * 0.5;
    ops.splat
        .compute(&mut backend, &mut velocity, Vec3::new(5.0, 2.0, 0.0), centre)
        .unwrap();

    group.bench_function("advect", |b| {
        b.iter(|| {
            ops.advect
                .compute(&mut backend, velocity.read(), density.read(), &mut density)
                .unwrap()
        })
    });
    group.bench_function("splat", |b| {
        b.iter(|| {
            ops.splat
                .compute(&mut backend, &mut density, Vec3::new(0.0, 0.06, 0.19), centre)
                .unwrap()
        })
    });
    group.bench_function("divergence", |b| {
        b.iter(|| {
            ops.divergence
                .compute(&mut backend, velocity.read(), &mut divergence)
                .unwrap()
        })
    });
    group.bench_function("jacobi_iteration", |b| {
        b.iter(|| {
            ops.jacobi
                .compute(&mut backend, divergence.read(), &mut pressure)
                .unwrap()
        })
    });
    group.bench_function("gradient", |b| {
        b.iter(|| {
            ops.gradient
                .compute(&mut backend, pressure.read(), velocity.read(), &mut velocity)
                .unwrap()
        })
    });
    group.finish();
}

criterion_group!(benches, benchmark_step, benchmark_jacobi_iterations, benchmark_operators);
criterion_main!(benches);
