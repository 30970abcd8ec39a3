//! Tiling generated samples into a single grid image

use image::{Rgb, RgbImage};
use ndarray::{Array4, Axis};

use crate::error::{Error, Result};

/// Appearance of the sample grid
#[derive(Debug, Clone)]
pub struct GridStyle {
    /// Pixels between cells and around the border
    pub padding: u32,
    /// Color shown between cells
    pub background: Rgb<u8>,
}

impl Default for GridStyle {
    fn default() -> Self {
        Self {
            padding: 2,
            background: Rgb([255, 255, 255]),
        }
    }
}

/// Rows and columns used to lay out `n` images.
///
/// Up to five images go on a single row. Larger counts use
/// `floor(sqrt(n))` rows and as many columns as needed to fit them all.
pub fn grid_shape(n: usize) -> (usize, usize) {
    if n <= 5 {
        return (1, n);
    }
    let rows = (n as f64).sqrt().floor() as usize;
    (rows, (n + rows - 1) / rows)
}

fn to_u8(v: f32) -> u8 {
    (v.clamp(0.0, 1.0) * 255.0).round() as u8
}

/// Tile a batch of images into one RGB image.
///
/// # Arguments
///
/// * `images` - Array of shape (n, height, width, 3) with values in [0, 1]
/// * `style` - Padding and background color
pub fn tile(images: &Array4<f32>, style: &GridStyle) -> Result<RgbImage> {
    let (n, height, width, channels) = images.dim();
    if n == 0 {
        return Err(Error::InvalidInput("cannot tile an empty batch".into()));
    }
    if channels != 3 {
        return Err(Error::ShapeMismatch {
            expected: "(n, height, width, 3)".into(),
            actual: vec![n as i64, height as i64, width as i64, channels as i64],
        });
    }

    let (rows, cols) = grid_shape(n);
    let pad = style.padding;
    let (cell_w, cell_h) = (width as u32, height as u32);
    let mut canvas = RgbImage::from_pixel(
        cols as u32 * cell_w + (cols as u32 + 1) * pad,
        rows as u32 * cell_h + (rows as u32 + 1) * pad,
        style.background,
    );

    for (i, sample) in images.axis_iter(Axis(0)).enumerate() {
        let x0 = pad + (i % cols) as u32 * (cell_w + pad);
        let y0 = pad + (i / cols) as u32 * (cell_h + pad);

        for ((y, x, c), &v) in sample.indexed_iter() {
            canvas.get_pixel_mut(x0 + x as u32, y0 + y as u32).0[c] = to_u8(v);
        }
    }

    Ok(canvas)
}
