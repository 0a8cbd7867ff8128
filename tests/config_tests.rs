use glam::{UVec2, Vec2};
use inkflow::config::{DissipationPreset, JacobiConfig};
use inkflow::display::DisplayField;
use inkflow::{ConfigError, FluidError, Grid, PressureInit, Settings, SolverConfig};

#[test]
fn test_default_parameters() {
    let config = SolverConfig::default();
    assert_eq!(config.advect.timestep, 1.0);
    assert_eq!(config.advect.dissipation, 0.998);
    assert_eq!(config.jacobi.iterations, 50);
    assert_eq!(config.jacobi.pressure_init, PressureInit::Zero);
    assert_eq!(config.splat.radius, 6.0);
    assert_eq!(config.ink, [0.0, 0.06, 0.19]);
    assert!(config.validate().is_ok());

    let grid = Grid::default();
    assert_eq!(grid.size, UVec2::new(512, 256));
    assert_eq!(grid.scale, 1.0);
}

#[test]
fn test_validate_rejects_bad_values() {
    let mut config = SolverConfig::default();
    config.advect.timestep = 0.0;
    assert_eq!(config.validate(), Err(ConfigError::NonPositiveTimestep(0.0)));

    let mut config = SolverConfig::default();
    config.splat.radius = -1.0;
    assert_eq!(config.validate(), Err(ConfigError::NonPositiveRadius(-1.0)));

    let mut config = SolverConfig::default();
    config.advect.dissipation = 1.5;
    assert_eq!(config.validate(), Err(ConfigError::DissipationOutOfRange(1.5)));

    let mut config = SolverConfig::default();
    config.jacobi.iterations = 501;
    assert!(matches!(config.validate(), Err(ConfigError::TooManyIterations { .. })));
}

#[test]
fn test_clamp_repairs_values() {
    let mut config = SolverConfig::default();
    assert!(!config.clamp(), "defaults are already in range");

    config.advect.timestep = -2.0;
    config.splat.radius = f32::NAN;
    config.jacobi.iterations = 10_000;
    assert!(config.clamp());
    assert_eq!(config.advect.timestep, SolverConfig::MIN_TIMESTEP);
    assert_eq!(config.splat.radius, 6.0);
    assert_eq!(config.jacobi.iterations, JacobiConfig::MAX_ITERATIONS);
    assert!(config.validate().is_ok());
}

#[test]
fn test_dissipation_presets() {
    let values: Vec<f32> = DissipationPreset::ALL.iter().map(|p| p.value()).collect();
    assert_eq!(values, [1.0, 0.998, 0.992, 0.9]);
    assert_eq!(DissipationPreset::matching(0.992), Some(DissipationPreset::Fast));
    assert_eq!(DissipationPreset::matching(0.5), None);
}

#[test]
fn test_partial_settings_json_uses_defaults() {
    let settings = Settings::from_json(
        r#"{ "solver": { "jacobi": { "iterations": 10, "pressure_init": "warm_start" } },
             "display": { "field": "pressure" } }"#,
    )
    .unwrap();

    assert_eq!(settings.solver.jacobi.iterations, 10);
    assert_eq!(settings.solver.jacobi.pressure_init, PressureInit::WarmStart);
    assert_eq!(settings.solver.advect, SolverConfig::default().advect);
    assert_eq!(settings.display.field, DisplayField::Pressure);
    assert_eq!(settings.grid().unwrap(), Grid::default());
}

#[test]
fn test_invalid_settings_rejected() {
    let negative = Settings::from_json(r#"{ "solver": { "jacobi": { "iterations": -1 } } }"#);
    assert!(matches!(negative, Err(FluidError::Json(_))));

    let empty = Settings::from_json(r#"{ "grid": { "width": 0 } }"#);
    assert!(matches!(
        empty,
        Err(FluidError::Config(ConfigError::EmptyGrid { width: 0, .. }))
    ));

    let timestep = Settings::from_json(r#"{ "solver": { "advect": { "timestep": 0.0 } } }"#);
    assert!(matches!(timestep, Err(FluidError::Config(ConfigError::NonPositiveTimestep(_)))));

    let huge = Settings::from_json(r#"{ "grid": { "width": 4, "height": 4, "scale": 1e30 } }"#);
    assert!(matches!(
        huge,
        Err(FluidError::Config(ConfigError::ScaleOutOfRange { max, .. })) if max == Grid::MAX_SCALE
    ));
}

#[test]
fn test_scale_clamped_to_bounds() {
    assert_eq!(Grid::clamp_scale(1e30), Grid::MAX_SCALE);
    assert_eq!(Grid::clamp_scale(0.0), Grid::MIN_SCALE);
    assert_eq!(Grid::clamp_scale(f32::NAN), 1.0);
    assert_eq!(Grid::clamp_scale(2.0), 2.0);

    let grid = Grid::new(4, 4).unwrap();
    assert!(grid.with_scale(Grid::MAX_SCALE).is_ok());
    assert!(grid.with_scale(f32::INFINITY).is_err());
    assert!(grid.with_scale(f32::NAN).is_err());
}

#[test]
fn test_settings_file_round_trip() {
    let path = std::env::temp_dir().join(format!("inkflow_settings_{}.json", std::process::id()));
    let mut settings = Settings::default();
    settings.grid.width = 64;
    settings.solver.ink = [1.0, 0.5, 0.0];

    settings.save(&path).unwrap();
    let loaded = Settings::load(&path).unwrap();
    std::fs::remove_file(&path).ok();

    assert_eq!(loaded, settings);
}

#[test]
fn test_window_to_grid_corners() {
    let grid = Grid::new(512, 256).unwrap();
    let window = Vec2::new(800.0, 600.0);

    assert_eq!(grid.window_to_grid(Vec2::new(0.0, 600.0), window), Vec2::ZERO);
    assert_eq!(grid.window_to_grid(Vec2::new(800.0, 0.0), window), Vec2::new(512.0, 256.0));
    assert_eq!(grid.window_to_grid(Vec2::new(400.0, 300.0), window), Vec2::new(256.0, 128.0));
}

#[test]
fn test_grid_rejects_empty_and_bad_scale() {
    assert_eq!(
        Grid::new(0, 10),
        Err(ConfigError::EmptyGrid { width: 0, height: 10 })
    );
    let grid = Grid::new(4, 4).unwrap();
    assert!(matches!(grid.with_scale(0.0), Err(ConfigError::ScaleOutOfRange { .. })));
    assert_eq!(grid.with_scale(2.0).unwrap().scale, 2.0);
    assert_eq!(grid.cells(), 16);
}
