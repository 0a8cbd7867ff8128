use glam::{UVec2, Vec2};

use crate::error::ConfigError;

/// Simulation resolution plus a display-only magnification.
///
/// `size` is fixed for the lifetime of a solver; `scale` may change at any
/// time and never touches simulation math.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Grid {
    pub size: UVec2,
    pub scale: f32,
}

impl Grid {
    pub const MIN_SCALE: f32 = 0.25;
    pub const MAX_SCALE: f32 = 4.0;

    pub fn new(width: u32, height: u32) -> Result<Self, ConfigError> {
        if width == 0 || height == 0 {
            return Err(ConfigError::EmptyGrid { width, height });
        }
        Ok(Self {
            size: UVec2::new(width, height),
            scale: 1.0,
        })
    }

    pub fn with_scale(mut self, scale: f32) -> Result<Self, ConfigError> {
        if !(Self::MIN_SCALE..=Self::MAX_SCALE).contains(&scale) {
            return Err(ConfigError::ScaleOutOfRange {
                scale,
                min: Self::MIN_SCALE,
                max: Self::MAX_SCALE,
            });
        }
        self.scale = scale;
        Ok(self)
    }

    pub fn width(&self) -> u32 {
        self.size.x
    }

    pub fn height(&self) -> u32 {
        self.size.y
    }

    /// Nearest valid display scale. Non-finite input falls back to 1.
    pub fn clamp_scale(scale: f32) -> f32 {
        if scale.is_finite() {
            scale.clamp(Self::MIN_SCALE, Self::MAX_SCALE)
        } else {
            1.0
        }
    }

    pub fn cells(&self) -> usize {
        self.size.x as usize * self.size.y as usize
    }

    /// Maps a window-space position (origin top-left, y down) into grid
    /// space (origin bottom-left, y up), normalising by the window size.
    pub fn window_to_grid(&self, position: Vec2, window: Vec2) -> Vec2 {
        let flipped = Vec2::new(position.x, window.y - position.y);
        flipped / window * self.size.as_vec2()
    }
}

impl Default for Grid {
    fn default() -> Self {
        Self {
            size: UVec2::new(512, 256),
            scale: 1.0,
        }
    }
}
