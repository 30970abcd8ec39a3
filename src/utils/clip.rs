//! Clamp values into [-1, 1]

use ndarray::{Array, Dimension};
use tch::Tensor;

/// Clamp a single value into [-1, 1]. NaN passes through unchanged.
pub fn clip_value(x: f32) -> f32 {
    if x < -1.0 {
        -1.0
    } else if x > 1.0 {
        1.0
    } else {
        x
    }
}

/// Elementwise [`clip_value`] over an array of any dimension.
pub fn clip<D: Dimension>(x: &Array<f32, D>) -> Array<f32, D> {
    x.mapv(clip_value)
}

/// Elementwise clamp of a tensor into [-1, 1] on its own device.
pub fn clip_tensor(x: &Tensor) -> Tensor {
    x.clamp(-1.0, 1.0)
}
