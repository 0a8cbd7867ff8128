use glam::{UVec2, Vec2, Vec4};
use inkflow::{
    AnalysisRecorder, ComputeBackend, CpuBackend, Display, DisplayField, Field, FieldFormat, FieldMetrics, Grid,
    ImageExporter, Motion, Mouse, Solver, SolverConfig,
};

#[test]
fn test_field_scale_and_bias() {
    assert_eq!(DisplayField::Density.display(), Display { scale: 1.0, bias: 0.0 });
    for field in [DisplayField::Velocity, DisplayField::Divergence, DisplayField::Pressure] {
        assert_eq!(field.display(), Display { scale: 0.5, bias: 0.5 });
    }
}

#[test]
fn test_colour_mapping() {
    let density = DisplayField::Density.display();
    assert_eq!(density.colour(FieldFormat::Vector3, Vec4::new(1.0, 0.0, 2.0, 0.0)), [255, 0, 255]);

    let signed = DisplayField::Pressure.display();
    assert_eq!(signed.colour(FieldFormat::Scalar, Vec4::ZERO), [127, 127, 127]);
    assert_eq!(signed.colour(FieldFormat::Scalar, Vec4::splat(-1.0)), [0, 0, 0]);
    assert_eq!(signed.colour(FieldFormat::Vector2, Vec4::new(1.0, -1.0, 5.0, 0.0)), [255, 0, 127]);
}

#[test]
fn test_render_flips_rows_and_magnifies() {
    let mut field = Field::zeroed(UVec2::new(2, 2), FieldFormat::Vector3);
    field.set(0, 0, Vec4::new(1.0, 0.0, 0.0, 0.0));

    let img = DisplayField::Density.display().render(&field, 2.0);
    assert_eq!(img.dimensions(), (4, 4));
    // Grid cell (0, 0) is bottom-left on screen.
    assert_eq!(img.get_pixel(0, 3).0, [255, 0, 0]);
    assert_eq!(img.get_pixel(1, 2).0, [255, 0, 0]);
    assert_eq!(img.get_pixel(0, 0).0, [0, 0, 0]);

    let colour = DisplayField::Density.display().color_image(&field);
    assert_eq!(colour.size, [2, 2]);
}

#[test]
fn test_metrics_from_fields() {
    let size = UVec2::new(3, 1);
    let mut velocity = Field::zeroed(size, FieldFormat::Vector2);
    velocity.set(1, 0, Vec4::new(3.0, 4.0, 0.0, 0.0));
    let mut density = Field::zeroed(size, FieldFormat::Vector3);
    density.set(2, 0, Vec4::new(0.5, 0.25, 0.25, 0.0));
    let mut pressure = Field::zeroed(size, FieldFormat::Scalar);
    pressure.set(0, 0, Vec4::new(-2.0, 0.0, 0.0, 0.0));

    let metrics = FieldMetrics::from_fields(&velocity, &density, &pressure, 7);
    assert_eq!(metrics.frame, 7);
    assert_eq!(metrics.total_density, 1.0);
    assert_eq!(metrics.max_density, 1.0);
    assert_eq!(metrics.max_speed, 5.0);
    assert_eq!(metrics.total_kinetic_energy, 12.5);
    assert!((metrics.avg_speed - 5.0 / 3.0).abs() < 1e-6);
    assert_eq!(metrics.max_pressure, 2.0);
}

#[test]
fn test_recorder_and_exporter_on_a_running_solver() {
    let mut backend = CpuBackend::new();
    let grid = Grid::new(16, 8).unwrap();
    let mut solver = Solver::new(&mut backend, grid, Vec2::new(160.0, 80.0)).unwrap();
    let mouse = Mouse::new();
    let config = SolverConfig::default();
    let mut recorder = AnalysisRecorder::new();

    recorder.record_frame(&mut backend, &solver).unwrap();
    mouse.push(Motion {
        position: Vec2::new(80.0, 40.0),
        drag: Vec2::new(10.0, 0.0),
        left: true,
        right: true,
    });
    solver.step(&mut backend, &mouse, &config).unwrap();
    let metrics = recorder.record_frame(&mut backend, &solver).unwrap();

    assert_eq!(metrics.frame, 1);
    assert!(metrics.total_density > 0.0);
    assert!(metrics.max_speed > 0.0);
    assert_eq!(recorder.metrics_history.len(), 2);
    assert_eq!(recorder.metrics_history[0].total_density, 0.0);

    let dir = std::env::temp_dir().join(format!("inkflow_export_{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    let exporter = ImageExporter::new(3.0);
    let density_path = dir.join("density.png");
    let velocity_path = dir.join("velocity.png");
    exporter.export_density_png(&mut backend, &solver, &density_path).unwrap();
    exporter.export_velocity_png(&mut backend, &solver, &velocity_path).unwrap();

    let img = image::open(&density_path).unwrap();
    assert_eq!((img.width(), img.height()), (48, 24));
    assert!(velocity_path.exists());
    std::fs::remove_dir_all(&dir).ok();

    // Readback must not disturb the solver.
    assert!(!backend.read_field(solver.density().read()).unwrap().is_zero());
}
