//! Image module for turning generator output into raster files
//!
//! Provides grid layout, tensor/array conversion and image loading.

mod convert;
mod grid;

pub use convert::{load_image, nchw_to_nhwc, tensor_to_array4, to_unit_range};
pub use grid::{grid_shape, tile, GridStyle};
