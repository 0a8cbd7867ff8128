//! Desktop front end: a control panel beside the simulation canvas.

use std::path::PathBuf;

use eframe::egui;
use glam::Vec2;
use rand::Rng;

use crate::backend::ComputeBackend;
use crate::config::{DissipationPreset, JacobiConfig, PressureInit, Settings, SolverConfig};
use crate::display::DisplayField;
use crate::error::FluidError;
use crate::export::ImageExporter;
use crate::grid::Grid;
use crate::mouse::{Motion, Mouse, PointerTracker};
use crate::solver::Solver;

/// Where the settings button writes to.
pub const SETTINGS_FILE: &str = "inkflow.json";

pub struct InkflowApp<B: ComputeBackend> {
    backend: B,
    solver: Solver,
    mouse: Mouse,
    tracker: PointerTracker,
    settings: Settings,
    paused: bool,
    texture: Option<egui::TextureHandle>,
    /// Set when a frame fails; the simulation stays halted until reset.
    error: Option<String>,
    exports: u32,
}

impl<B: ComputeBackend> InkflowApp<B> {
    pub fn new(mut backend: B, settings: Settings) -> Result<Self, FluidError> {
        settings.validate()?;
        let grid = settings.grid()?;
        let window = grid.size.as_vec2() * grid.scale;
        let solver = Solver::new(&mut backend, grid, window)?;

        Ok(Self {
            backend,
            solver,
            mouse: Mouse::new(),
            tracker: PointerTracker::new(),
            settings,
            paused: false,
            texture: None,
            error: None,
            exports: 0,
        })
    }

    /// Restores settings saved by a previous session, keeping the grid size
    /// the solver was built with.
    pub fn restore(&mut self, storage: Option<&dyn eframe::Storage>) {
        let Some(saved) = storage.and_then(|s| eframe::get_value::<Settings>(s, eframe::APP_KEY)) else {
            return;
        };
        if saved.solver.validate().is_ok() {
            self.settings.solver = saved.solver;
            self.settings.display = saved.display;
            self.settings.grid.scale = Grid::clamp_scale(saved.grid.scale);
            self.solver.set_scale(self.settings.grid.scale);
            log::info!("restored settings from the previous session");
        } else {
            log::warn!("discarding invalid settings from the previous session");
        }
    }

    fn reset(&mut self) {
        self.mouse.drain();
        self.tracker.release();
        match self.solver.reset(&mut self.backend) {
            Ok(()) => self.error = None,
            Err(e) => self.fail(e),
        }
    }

    fn fail(&mut self, error: FluidError) {
        log::error!("simulation halted: {error}");
        self.error = Some(error.to_string());
    }

    /// Queues a drag with both buttons at a random spot on the canvas.
    fn random_splat(&mut self) {
        let mut rng = rand::thread_rng();
        let window = self.solver.window_size();
        let position = Vec2::new(rng.gen_range(0.0..window.x), rng.gen_range(0.0..window.y));
        let angle = rng.gen_range(0.0..std::f32::consts::TAU);
        let drag = Vec2::from_angle(angle) * rng.gen_range(2.0..12.0);
        self.mouse.push(Motion {
            position,
            drag,
            left: true,
            right: true,
        });
    }

    fn export(&mut self) {
        let field = self.settings.display.field;
        let path = PathBuf::from(format!("inkflow_{}_{:04}.png", field.label(), self.exports));
        let exporter = ImageExporter::new(self.solver.grid().scale);
        match exporter.export_field_png(&mut self.backend, &self.solver, field, &path) {
            Ok(()) => {
                self.exports += 1;
                log::info!("exported {}", path.display());
            }
            Err(e) => log::error!("export failed: {e}"),
        }
    }

    fn controls(&mut self, ui: &mut egui::Ui) {
        ui.heading("inkflow");
        ui.label(format!(
            "{}x{} cells, frame {}",
            self.solver.grid().width(),
            self.solver.grid().height(),
            self.solver.frame()
        ));
        ui.separator();

        let display = &mut self.settings.display.field;
        egui::ComboBox::from_label("field")
            .selected_text(display.label())
            .show_ui(ui, |ui| {
                for field in DisplayField::ALL {
                    ui.selectable_value(display, field, field.label());
                }
            });

        let solver = &mut self.settings.solver;
        ui.horizontal(|ui| {
            ui.label("timestep");
            ui.add(
                egui::DragValue::new(&mut solver.advect.timestep)
                    .speed(0.01)
                    .clamp_range(SolverConfig::MIN_TIMESTEP..=10.0),
            );
        });

        let preset = DissipationPreset::matching(solver.advect.dissipation);
        egui::ComboBox::from_label("dissipation")
            .selected_text(preset.map_or("custom", DissipationPreset::label))
            .show_ui(ui, |ui| {
                for preset in DissipationPreset::ALL {
                    ui.selectable_value(&mut solver.advect.dissipation, preset.value(), preset.label());
                }
            });

        ui.add(
            egui::Slider::new(&mut solver.jacobi.iterations, 0..=JacobiConfig::MAX_ITERATIONS)
                .text("jacobi iterations"),
        );
        let mut warm_start = solver.jacobi.pressure_init == PressureInit::WarmStart;
        if ui.checkbox(&mut warm_start, "reuse last pressure").changed() {
            solver.jacobi.pressure_init = if warm_start {
                PressureInit::WarmStart
            } else {
                PressureInit::Zero
            };
        }

        ui.add(egui::Slider::new(&mut solver.splat.radius, SolverConfig::MIN_RADIUS..=50.0).text("splat radius"));
        ui.horizontal(|ui| {
            ui.label("ink");
            ui.color_edit_button_rgb(&mut solver.ink);
        });

        if ui
            .add(egui::Slider::new(&mut self.settings.grid.scale, Grid::MIN_SCALE..=Grid::MAX_SCALE).text("scale"))
            .changed()
        {
            self.solver.set_scale(self.settings.grid.scale);
        }

        ui.separator();
        ui.horizontal(|ui| {
            let label = if self.paused { "Resume" } else { "Pause" };
            if ui.button(label).clicked() {
                self.paused = !self.paused;
            }
            if ui.button("Reset").clicked() {
                self.reset();
            }
        });
        ui.horizontal(|ui| {
            if ui.button("Random splat").clicked() {
                self.random_splat();
            }
            if ui.button("Export PNG").clicked() {
                self.export();
            }
        });
        if ui.button("Save settings").clicked() {
            if let Err(e) = self.settings.save(&PathBuf::from(SETTINGS_FILE)) {
                log::error!("could not save settings: {e}");
            }
        }

        if let Some(error) = &self.error {
            ui.separator();
            ui.colored_label(egui::Color32::RED, error.as_str());
        }

        ui.separator();
        ui.small("Left drag: push fluid. Right drag: drop ink.");
    }

    fn canvas(&mut self, ui: &mut egui::Ui) {
        let grid = *self.solver.grid();
        let size = grid.size.as_vec2() * grid.scale;
        let (rect, response) = ui.allocate_exact_size(egui::vec2(size.x, size.y), egui::Sense::click_and_drag());
        self.solver.set_window_size(Vec2::new(rect.width(), rect.height()));

        let left = response.dragged_by(egui::PointerButton::Primary);
        let right = response.dragged_by(egui::PointerButton::Secondary);
        match response.interact_pointer_pos() {
            Some(pos) if left || right => {
                let local = pos - rect.min;
                if let Some(motion) = self.tracker.sample(Vec2::new(local.x, local.y), left, right) {
                    self.mouse.push(motion);
                }
            }
            _ => self.tracker.release(),
        }

        if let Some(texture) = &self.texture {
            let uv = egui::Rect::from_min_max(egui::pos2(0.0, 0.0), egui::pos2(1.0, 1.0));
            ui.painter().image(texture.id(), rect, uv, egui::Color32::WHITE);
        }
    }

    fn refresh_texture(&mut self, ctx: &egui::Context) {
        let field = self.settings.display.field;
        let data = match self.backend.read_field(self.solver.slab(field).read()) {
            Ok(data) => data,
            Err(e) => return self.fail(e),
        };
        let image = field.display().color_image(&data);
        match &mut self.texture {
            Some(texture) => texture.set(image, egui::TextureOptions::NEAREST),
            None => self.texture = Some(ctx.load_texture("field", image, egui::TextureOptions::NEAREST)),
        }
    }
}

impl<B: ComputeBackend> eframe::App for InkflowApp<B> {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        egui::SidePanel::left("controls").show(ctx, |ui| self.controls(ui));
        egui::CentralPanel::default().show(ctx, |ui| self.canvas(ui));

        if self.settings.solver.clamp() {
            log::debug!("control values clamped to the valid range");
        }

        if !self.paused && self.error.is_none() {
            if let Err(e) = self
                .solver
                .step(&mut self.backend, &self.mouse, &self.settings.solver)
            {
                self.fail(e);
            }
        }
        if self.error.is_none() {
            self.refresh_texture(ctx);
        }

        ctx.request_repaint();
    }

    fn save(&mut self, storage: &mut dyn eframe::Storage) {
        eframe::set_value(storage, eframe::APP_KEY, &self.settings);
    }
}
