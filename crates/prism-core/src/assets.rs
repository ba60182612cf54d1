//! Synthetic test images.
//!
//! Six small PNGs with flat shapes and a gradient, enough to exercise every
//! transform without shipping binary fixtures.

use image::{Rgb, RgbImage};
use std::path::{Path, PathBuf};

use crate::error::{PrismError, Result};
use crate::pipeline::prepare_output_dir;

/// Width of every generated image.
pub const WIDTH: u32 = 300;
/// Height of every generated image.
pub const HEIGHT: u32 = 200;

const WHITE: Rgb<u8> = Rgb([255, 255, 255]);
const BLACK: Rgb<u8> = Rgb([0, 0, 0]);
const RED: Rgb<u8> = Rgb([255, 0, 0]);
const ORANGE: Rgb<u8> = Rgb([255, 165, 0]);
const YELLOW: Rgb<u8> = Rgb([255, 255, 0]);
const GREEN: Rgb<u8> = Rgb([0, 128, 0]);
const BLUE: Rgb<u8> = Rgb([0, 0, 255]);
const PURPLE: Rgb<u8> = Rgb([128, 0, 128]);

const STRIPES: [Rgb<u8>; 6] = [RED, ORANGE, YELLOW, GREEN, BLUE, PURPLE];
const STRIPE_HEIGHT: u32 = 23;
const FRAME_WIDTH: u32 = 3;

/// One synthetic image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pattern {
    Rectangle,
    Ellipse,
    Triangle,
    Stripes,
    FramedRectangle,
    Gradient,
}

impl Pattern {
    /// Every pattern, in file order.
    pub const ALL: [Pattern; 6] = [
        Self::Rectangle,
        Self::Ellipse,
        Self::Triangle,
        Self::Stripes,
        Self::FramedRectangle,
        Self::Gradient,
    ];

    /// `test_<n>.png`, numbered from 1.
    pub fn file_name(&self) -> String {
        let index = Self::ALL.iter().position(|p| p == self).unwrap_or(0) + 1;
        format!("test_{index}.png")
    }

    pub fn description(&self) -> &'static str {
        match self {
            Self::Rectangle => "red rectangle",
            Self::Ellipse => "blue ellipse",
            Self::Triangle => "green triangle",
            Self::Stripes => "colour stripes",
            Self::FramedRectangle => "yellow rectangle with black frame",
            Self::Gradient => "grey gradient",
        }
    }

    /// Render the pattern on a white canvas.
    ///
    /// Shapes only: no "Image N" caption is drawn, so each shape's interior
    /// is a single flat colour.
    pub fn render(&self) -> RgbImage {
        RgbImage::from_fn(WIDTH, HEIGHT, |x, y| self.pixel(x, y))
    }

    fn pixel(&self, x: u32, y: u32) -> Rgb<u8> {
        match self {
            Self::Rectangle => {
                if in_rect(x, y, (50, 30, 250, 170)) {
                    RED
                } else {
                    WHITE
                }
            }
            Self::Ellipse => {
                let dx = (x as f32 - 150.0) / 100.0;
                let dy = (y as f32 - 100.0) / 70.0;
                if dx * dx + dy * dy <= 1.0 {
                    BLUE
                } else {
                    WHITE
                }
            }
            Self::Triangle => {
                // Apex at (150, 30), base from (50, 170) to (250, 170)
                let inside = (30..=170).contains(&y)
                    && (x as f32 - 150.0).abs() <= (y - 30) as f32 * 100.0 / 140.0;
                if inside {
                    GREEN
                } else {
                    WHITE
                }
            }
            Self::Stripes => {
                // Later stripes paint over the shared boundary row
                STRIPES
                    .iter()
                    .enumerate()
                    .rev()
                    .find(|(j, _)| {
                        let top = 30 + *j as u32 * STRIPE_HEIGHT;
                        in_rect(x, y, (50, top, 250, top + STRIPE_HEIGHT))
                    })
                    .map(|(_, color)| *color)
                    .unwrap_or(WHITE)
            }
            Self::FramedRectangle => {
                let (x0, y0, x1, y1) = (40, 20, 260, 180);
                if !in_rect(x, y, (x0, y0, x1, y1)) {
                    WHITE
                } else if x < x0 + FRAME_WIDTH
                    || x > x1 - FRAME_WIDTH
                    || y < y0 + FRAME_WIDTH
                    || y > y1 - FRAME_WIDTH
                {
                    BLACK
                } else {
                    YELLOW
                }
            }
            Self::Gradient => {
                let t = (x as f32 / WIDTH as f32 + y as f32 / HEIGHT as f32) / 2.0;
                let gray = (t * 255.0) as u8;
                Rgb([gray, gray, gray])
            }
        }
    }
}

/// Inclusive bounds check: `(x0, y0, x1, y1)`.
fn in_rect(x: u32, y: u32, (x0, y0, x1, y1): (u32, u32, u32, u32)) -> bool {
    (x0..=x1).contains(&x) && (y0..=y1).contains(&y)
}

/// Write every pattern into `dir`, creating it if needed.
///
/// Existing files with the same names are overwritten. Returns the written
/// paths in pattern order.
pub fn generate(dir: &Path) -> Result<Vec<PathBuf>> {
    prepare_output_dir(dir)?;

    Pattern::ALL
        .iter()
        .map(|pattern| -> Result<PathBuf> {
            let path = dir.join(pattern.file_name());
            pattern
                .render()
                .save(&path)
                .map_err(|e| PrismError::Io(std::io::Error::other(e)))?;
            tracing::debug!("Created {:?} ({})", path, pattern.description());
            Ok(path)
        })
        .collect()
}
