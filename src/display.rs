//! Colour mapping of a field's read buffer to pixels.

use glam::Vec4;
use image::{ImageBuffer, Rgb, RgbImage};
use serde::{Deserialize, Serialize};

use crate::backend::{Field, FieldFormat};

/// Which solver field to show.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DisplayField {
    #[default]
    Density,
    Velocity,
    Divergence,
    Pressure,
}

impl DisplayField {
    pub const ALL: [DisplayField; 4] = [
        DisplayField::Density,
        DisplayField::Velocity,
        DisplayField::Divergence,
        DisplayField::Pressure,
    ];

    pub fn label(self) -> &'static str {
        match self {
            DisplayField::Density => "density",
            DisplayField::Velocity => "velocity",
            DisplayField::Divergence => "divergence",
            DisplayField::Pressure => "pressure",
        }
    }

    /// Density is shown as-is; signed fields are centred on mid grey.
    pub fn display(self) -> Display {
        match self {
            DisplayField::Density => Display { scale: 1.0, bias: 0.0 },
            _ => Display { scale: 0.5, bias: 0.5 },
        }
    }
}

/// `colour = value * scale + bias`, clamped to [0, 1].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Display {
    pub scale: f32,
    pub bias: f32,
}

impl Display {
    /// Colour of one texel. Scalars are grey; vectors map their components
    /// to red, green, blue (missing components read as zero).
    pub fn colour(&self, format: FieldFormat, texel: Vec4) -> [u8; 3] {
        let rgb = match format {
            FieldFormat::Scalar => [texel.x; 3],
            FieldFormat::Vector2 => [texel.x, texel.y, 0.0],
            FieldFormat::Vector3 => [texel.x, texel.y, texel.z],
        };
        rgb.map(|v| ((v * self.scale + self.bias).clamp(0.0, 1.0) * 255.0) as u8)
    }

    /// Renders at `magnification` pixels per cell with nearest sampling.
    /// Grid row 0 is the bottom of the image.
    pub fn render(&self, field: &Field, magnification: f32) -> RgbImage {
        let magnification = magnification.max(f32::MIN_POSITIVE);
        let width = ((field.width as f32 * magnification).round() as u32).max(1);
        let height = ((field.height as f32 * magnification).round() as u32).max(1);

        let mut img = ImageBuffer::new(width, height);
        for (x, y, pixel) in img.enumerate_pixels_mut() {
            let cell_x = ((x as f32 / magnification) as u32).min(field.width - 1);
            let cell_y = ((y as f32 / magnification) as u32).min(field.height - 1);
            let texel = field.get(cell_x, field.height - 1 - cell_y);
            *pixel = Rgb(self.colour(field.format, texel));
        }
        img
    }

    /// One pixel per cell, for upload as a GUI texture.
    pub fn color_image(&self, field: &Field) -> egui::ColorImage {
        let img = self.render(field, 1.0);
        egui::ColorImage::from_rgb([img.width() as usize, img.height() as usize], img.as_raw())
    }
}
