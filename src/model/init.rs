//! Weight initialization
//!
//! Layers are initialized from a zero-mean Gaussian whose deviation is derived
//! from a per-layer `wscale`, the same way the reference checkpoints were
//! trained: `std = sqrt(wscale / fan_in)`. Each layer picks
//! `wscale = 0.02 * sqrt(k)`, with `k` the latent size for the projection and
//! `4 * 4 * in_channels` for convolutions.

use tch::nn::Init;

/// Fan-in of a weight tensor: every dimension except the leading one.
///
/// Works for Linear `(out, in)`, Conv2D `(out, in, kh, kw)` and
/// ConvTranspose2D `(in, out, kh, kw)` layouts alike.
pub fn fan_in(weight_shape: &[i64]) -> i64 {
    match weight_shape {
        [] | [_] => 1,
        [_, rest @ ..] => rest.iter().product(),
    }
}

/// Gaussian initializer for a weight of the given shape and `wscale`.
pub fn wscale_normal(wscale: f64, weight_shape: &[i64]) -> Init {
    let fan_in = fan_in(weight_shape).max(1) as f64;
    Init::Randn {
        mean: 0.0,
        stdev: (wscale / fan_in).sqrt(),
    }
}

/// `wscale` used for a layer whose fan-related constant is `k`.
pub(crate) fn wscale(k: i64) -> f64 {
    0.02 * (k as f64).sqrt()
}
