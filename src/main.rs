use std::path::Path;

use glam::Vec2;
use inkflow::{
    AnalysisRecorder, ComputeBackend, DefaultBackend, FluidError, ImageExporter, InkflowApp, Motion, Mouse,
    Settings, Solver,
};
use rand::Rng;

const HEADLESS_FRAMES: u64 = 20;
const SCRIPTED_FRAMES: u64 = 10;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let args: Vec<String> = std::env::args().collect();

    if args.len() > 1 && args[1] == "test" {
        let settings = load_settings(args.get(2))?;
        run_headless_test(default_backend()?, settings)?;
    } else {
        let settings = load_settings(args.get(1))?;
        run_gui_app(default_backend()?, settings)?;
    }

    Ok(())
}

fn load_settings(path: Option<&String>) -> Result<Settings, FluidError> {
    match path {
        Some(path) => Settings::load(Path::new(path)),
        None => Ok(Settings::default()),
    }
}

#[cfg(feature = "cpu")]
fn default_backend() -> Result<DefaultBackend, FluidError> {
    Ok(DefaultBackend::new())
}

#[cfg(all(feature = "gpu", not(feature = "cpu")))]
fn default_backend() -> Result<DefaultBackend, FluidError> {
    let runtime = tokio::runtime::Runtime::new()?;
    // INKFLOW_SHADER_DIR swaps in kernel programs from disk.
    match std::env::var_os("INKFLOW_SHADER_DIR") {
        Some(dir) => runtime.block_on(DefaultBackend::new(&inkflow::ShaderDirectory::new(dir))),
        None => runtime.block_on(DefaultBackend::new(&inkflow::EmbeddedShaders)),
    }
}

/// Drags a jittered circle through the middle of the grid for the first
/// frames, then lets the fluid settle.
fn run_headless_test<B: ComputeBackend>(mut backend: B, settings: Settings) -> Result<(), Box<dyn std::error::Error>> {
    println!("Running headless fluid simulation test on the {} backend...", backend.name());

    let grid = settings.grid()?;
    let window = grid.size.as_vec2() * grid.scale;
    let mut solver = Solver::new(&mut backend, grid, window)?;
    let mouse = Mouse::new();
    let exporter = ImageExporter::new(grid.scale);
    let mut recorder = AnalysisRecorder::new();
    let mut rng = rand::thread_rng();

    recorder.record_frame(&mut backend, &solver)?.print_summary();
    exporter.export_density_png(&mut backend, &solver, Path::new("test_frame_0000.png"))?;
    exporter.export_velocity_png(&mut backend, &solver, Path::new("test_velocity_0000.png"))?;

    let centre = window * 0.5;
    let orbit = window.min_element() * 0.2;
    let mut previous = centre + Vec2::new(orbit, 0.0);

    for frame in 1..=HEADLESS_FRAMES {
        if frame <= SCRIPTED_FRAMES {
            let angle = frame as f32 / SCRIPTED_FRAMES as f32 * std::f32::consts::TAU;
            let jitter = Vec2::new(rng.gen_range(-1.0..1.0), rng.gen_range(-1.0..1.0));
            let position = centre + Vec2::from_angle(angle) * orbit + jitter;
            mouse.push(Motion {
                position,
                drag: position - previous,
                left: true,
                right: true,
            });
            previous = position;
        }

        solver.step(&mut backend, &mouse, &settings.solver)?;
        let metrics = recorder.record_frame(&mut backend, &solver)?;
        if frame % 5 == 0 {
            metrics.print_summary();
        }

        let density_path = format!("test_frame_{:04}.png", frame);
        let velocity_path = format!("test_velocity_{:04}.png", frame);
        exporter.export_density_png(&mut backend, &solver, Path::new(&density_path))?;
        exporter.export_velocity_png(&mut backend, &solver, Path::new(&velocity_path))?;
    }

    recorder.print_trends();

    println!(
        "Test completed! Generated {} frames with detailed analysis.",
        HEADLESS_FRAMES + 1
    );
    Ok(())
}

fn run_gui_app<B: ComputeBackend + 'static>(backend: B, settings: Settings) -> Result<(), Box<dyn std::error::Error>> {
    let mut app = InkflowApp::new(backend, settings)?;
    let grid = settings.grid()?;
    let canvas = grid.size.as_vec2() * grid.scale;

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([canvas.x + 260.0, canvas.y.max(480.0) + 32.0])
            .with_title("inkflow - Stable Fluids"),
        ..Default::default()
    };

    eframe::run_native(
        "inkflow",
        options,
        Box::new(move |cc| {
            app.restore(cc.storage);
            Box::new(app)
        }),
    )?;
    Ok(())
}
