//! Tunable parameters and settings files.
//!
//! The control surface edits a [`SolverConfig`] in place and the solver reads
//! it by reference at the start of every step. Values are validated (or
//! clamped) here, at the boundary, so the frame loop can assume they are sane.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::display::DisplayField;
use crate::error::{ConfigError, FluidError};
use crate::grid::Grid;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdvectConfig {
    pub timestep: f32,
    /// Multiplicative decay of the carried quantity per step. 1 disables it.
    pub dissipation: f32,
}

impl Default for AdvectConfig {
    fn default() -> Self {
        Self {
            timestep: 1.0,
            dissipation: DissipationPreset::Slow.value(),
        }
    }
}

/// Initial guess for the pressure solve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PressureInit {
    /// Start every frame from zero, discarding last frame's pressure.
    #[default]
    Zero,
    /// Start from the previous frame's solution.
    WarmStart,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct JacobiConfig {
    pub iterations: u32,
    pub pressure_init: PressureInit,
}

impl Default for JacobiConfig {
    fn default() -> Self {
        Self {
            iterations: 50,
            pressure_init: PressureInit::Zero,
        }
    }
}

impl JacobiConfig {
    pub const MAX_ITERATIONS: u32 = 500;
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SplatConfig {
    /// In grid cells.
    pub radius: f32,
}

impl Default for SplatConfig {
    fn default() -> Self {
        Self { radius: 6.0 }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverConfig {
    pub advect: AdvectConfig,
    pub jacobi: JacobiConfig,
    pub splat: SplatConfig,
    /// Colour injected into density on right-button motions.
    pub ink: [f32; 3],
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            advect: AdvectConfig::default(),
            jacobi: JacobiConfig::default(),
            splat: SplatConfig::default(),
            ink: [0.0, 0.06, 0.19],
        }
    }
}

impl SolverConfig {
    pub const MIN_TIMESTEP: f32 = 0.001;
    pub const MIN_RADIUS: f32 = 0.1;

    pub fn validate(&self) -> Result<(), ConfigError> {
        let AdvectConfig {
            timestep,
            dissipation,
        } = self.advect;
        if !(timestep > 0.0 && timestep.is_finite()) {
            return Err(ConfigError::NonPositiveTimestep(timestep));
        }
        if !(dissipation > 0.0 && dissipation <= 1.0) {
            return Err(ConfigError::DissipationOutOfRange(dissipation));
        }
        if self.jacobi.iterations > JacobiConfig::MAX_ITERATIONS {
            return Err(ConfigError::TooManyIterations {
                iterations: self.jacobi.iterations,
                max: JacobiConfig::MAX_ITERATIONS,
            });
        }
        if !(self.splat.radius > 0.0 && self.splat.radius.is_finite()) {
            return Err(ConfigError::NonPositiveRadius(self.splat.radius));
        }
        if let Some((index, &value)) = self.ink.iter().enumerate().find(|(_, c)| !c.is_finite()) {
            return Err(ConfigError::InvalidInk { index, value });
        }
        Ok(())
    }

    /// Coerces every parameter into its valid range. Returns true if
    /// anything changed.
    pub fn clamp(&mut self) -> bool {
        let before = *self;

        self.advect.timestep = finite_or(self.advect.timestep, AdvectConfig::default().timestep)
            .max(Self::MIN_TIMESTEP);
        self.advect.dissipation = finite_or(self.advect.dissipation, 1.0).clamp(f32::EPSILON, 1.0);
        self.jacobi.iterations = self.jacobi.iterations.min(JacobiConfig::MAX_ITERATIONS);
        self.splat.radius = finite_or(self.splat.radius, SplatConfig::default().radius).max(Self::MIN_RADIUS);
        for c in &mut self.ink {
            *c = finite_or(*c, 0.0);
        }

        let changed = *self != before;
        if changed {
            log::warn!("solver parameters clamped into range: {:?}", self);
        }
        changed
    }
}

fn finite_or(value: f32, fallback: f32) -> f32 {
    if value.is_finite() { value } else { fallback }
}

/// Named dissipation rates offered by the control surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DissipationPreset {
    None,
    Slow,
    Fast,
    VeryFast,
}

impl DissipationPreset {
    pub const ALL: [DissipationPreset; 4] = [
        DissipationPreset::None,
        DissipationPreset::Slow,
        DissipationPreset::Fast,
        DissipationPreset::VeryFast,
    ];

    pub fn value(self) -> f32 {
        match self {
            DissipationPreset::None => 1.0,
            DissipationPreset::Slow => 0.998,
            DissipationPreset::Fast => 0.992,
            DissipationPreset::VeryFast => 0.9,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            DissipationPreset::None => "none",
            DissipationPreset::Slow => "slow",
            DissipationPreset::Fast => "fast",
            DissipationPreset::VeryFast => "very fast",
        }
    }

    /// The preset matching `dissipation`, if any.
    pub fn matching(dissipation: f32) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|p| (p.value() - dissipation).abs() < 1e-6)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridSettings {
    pub width: u32,
    pub height: u32,
    pub scale: f32,
}

impl Default for GridSettings {
    fn default() -> Self {
        let grid = Grid::default();
        Self {
            width: grid.width(),
            height: grid.height(),
            scale: grid.scale,
        }
    }
}

impl TryFrom<GridSettings> for Grid {
    type Error = ConfigError;

    fn try_from(settings: GridSettings) -> Result<Self, Self::Error> {
        Grid::new(settings.width, settings.height)?.with_scale(settings.scale)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplaySettings {
    pub field: DisplayField,
}

/// Everything a run needs, as stored in a settings file.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub grid: GridSettings,
    pub solver: SolverConfig,
    pub display: DisplaySettings,
}

impl Settings {
    pub fn load(path: &Path) -> Result<Self, FluidError> {
        let text = std::fs::read_to_string(path)?;
        let settings = Self::from_json(&text)?;
        log::info!("loaded settings from {}", path.display());
        Ok(settings)
    }

    pub fn from_json(text: &str) -> Result<Self, FluidError> {
        let settings: Settings = serde_json::from_str(text)?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn save(&self, path: &Path) -> Result<(), FluidError> {
        std::fs::write(path, serde_json::to_string_pretty(self)?)?;
        log::info!("saved settings to {}", path.display());
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        Grid::try_from(self.grid)?;
        self.solver.validate()
    }

    pub fn grid(&self) -> Result<Grid, ConfigError> {
        Grid::try_from(self.grid)
    }
}
