//! Exponential Linear Unit
//!
//! `elu(x) = x` for `x >= 0` and `alpha * (exp(x) - 1)` otherwise.
//!
//! The tensor path uses libtorch's own ELU kernels, so it runs on whichever
//! device holds the input and autograd differentiates it. The gradient rule is
//! also exposed directly, and a portable `ndarray` implementation of both
//! directions gives the same numbers on the CPU. At `x = 0` the gradient is
//! `alpha`, as in libtorch.

use ndarray::{Array, Dimension, Zip};
use tch::{Kind, Tensor};

use crate::error::{Error, Result};

/// Reject tensors that are not single precision floats.
pub fn check_float(xs: &Tensor) -> Result<()> {
    match xs.kind() {
        Kind::Float => Ok(()),
        other => Err(Error::DTypeMismatch(other)),
    }
}

/// ELU activation with a fixed `alpha` coefficient
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Elu {
    alpha: f64,
}

impl Default for Elu {
    fn default() -> Self {
        Self { alpha: 1.0 }
    }
}

impl Elu {
    pub fn new(alpha: f64) -> Self {
        Self { alpha }
    }

    pub fn alpha(&self) -> f64 {
        self.alpha
    }

    /// Forward pass on a float32 tensor.
    pub fn forward(&self, xs: &Tensor) -> Result<Tensor> {
        check_float(xs)?;
        Ok(self.apply(xs))
    }

    /// Gradient of the forward pass with respect to `xs`, given the gradient
    /// flowing back from the output.
    pub fn backward(&self, xs: &Tensor, grad_output: &Tensor) -> Result<Tensor> {
        check_float(xs)?;
        check_float(grad_output)?;
        if xs.size() != grad_output.size() {
            return Err(Error::ShapeMismatch {
                expected: format!("{:?}", xs.size()),
                actual: grad_output.size(),
            });
        }

        Ok(Tensor::elu_backward(grad_output, self.alpha, 1.0, 1.0, false, xs))
    }

    /// Forward pass for callers that already validated the element type.
    pub(crate) fn apply(&self, xs: &Tensor) -> Tensor {
        xs.elu(self.alpha, 1.0, 1.0)
    }

    /// Forward pass on the CPU.
    pub fn forward_cpu<D: Dimension>(&self, x: &Array<f32, D>) -> Array<f32, D> {
        let alpha = self.alpha as f32;
        x.mapv(|v| if v >= 0.0 { v } else { alpha * (v.exp() - 1.0) })
    }

    /// Backward pass on the CPU.
    pub fn backward_cpu<D: Dimension>(
        &self,
        x: &Array<f32, D>,
        grad_output: &Array<f32, D>,
    ) -> Result<Array<f32, D>> {
        if x.shape() != grad_output.shape() {
            return Err(Error::ShapeMismatch {
                expected: format!("{:?}", x.shape()),
                actual: grad_output.shape().iter().map(|&d| d as i64).collect(),
            });
        }

        let alpha = self.alpha as f32;
        Ok(Zip::from(x)
            .and(grad_output)
            .map_collect(|&v, &gy| if v > 0.0 { gy } else { gy * alpha * v.exp() }))
    }
}
