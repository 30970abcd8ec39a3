//! Conversions between tensors, arrays and raster images

use image::imageops::FilterType;
use ndarray::Array4;
use std::path::Path;
use tch::{Device, Tensor};

use crate::error::{Error, Result};
use crate::model::{check_float, IMAGE_CHANNELS, IMAGE_SIZE};
use crate::utils::clip;

/// Copy a 4-D float tensor into an `ndarray` array with the same layout.
pub fn tensor_to_array4(t: &Tensor) -> Result<Array4<f32>> {
    check_float(t)?;
    let shape = match t.size().as_slice() {
        &[n, c, h, w] => (n as usize, c as usize, h as usize, w as usize),
        _ => {
            return Err(Error::ShapeMismatch {
                expected: "4-D tensor".into(),
                actual: t.size(),
            })
        }
    };

    let data = Vec::<f32>::try_from(t.to_device(Device::Cpu).contiguous().flatten(0, -1))?;
    Ok(Array4::from_shape_vec(shape, data)?)
}

/// Map raw generator output to [0, 1]: `(clip(x) + 1) / 2`.
pub fn to_unit_range(x: &Array4<f32>) -> Array4<f32> {
    clip(x).mapv(|v| (v + 1.0) / 2.0)
}

/// Reorder (n, channels, height, width) into (n, height, width, channels).
pub fn nchw_to_nhwc(x: Array4<f32>) -> Array4<f32> {
    x.permuted_axes([0, 2, 3, 1]).as_standard_layout().into_owned()
}

/// Read an image file as a (1, 3, 96, 96) tensor scaled to [-1, 1].
///
/// Images of any other size are resized first.
pub fn load_image<P: AsRef<Path>>(path: P, device: Device) -> Result<Tensor> {
    let size = IMAGE_SIZE as u32;
    let mut img = image::open(path)?.to_rgb8();
    if img.dimensions() != (size, size) {
        img = image::imageops::resize(&img, size, size, FilterType::Triangle);
    }

    let plane = (size * size) as usize;
    let mut data = vec![0f32; IMAGE_CHANNELS as usize * plane];
    for (x, y, pixel) in img.enumerate_pixels() {
        let offset = (y * size + x) as usize;
        for c in 0..IMAGE_CHANNELS as usize {
            data[c * plane + offset] = pixel.0[c] as f32 / 255.0 * 2.0 - 1.0;
        }
    }

    Ok(Tensor::from_slice(&data)
        .view([1, IMAGE_CHANNELS, IMAGE_SIZE, IMAGE_SIZE])
        .to_device(device))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};
    use tch::Kind;

    #[test]
    fn test_tensor_to_array4_keeps_layout() {
        let t = Tensor::arange(24, (Kind::Float, Device::Cpu)).view([1, 2, 3, 4]);
        let a = tensor_to_array4(&t).unwrap();

        assert_eq!(a.dim(), (1, 2, 3, 4));
        assert_eq!(a[[0, 1, 2, 3]], 23.0);
        assert_eq!(a[[0, 0, 1, 0]], 4.0);
    }

    #[test]
    fn test_tensor_to_array4_rejects_other_ranks() {
        let t = Tensor::zeros([2, 3], (Kind::Float, Device::Cpu));
        assert!(matches!(tensor_to_array4(&t), Err(Error::ShapeMismatch { .. })));
    }

    #[test]
    fn test_unit_range_and_channel_order() {
        let mut x = Array4::<f32>::zeros((1, 3, 1, 2));
        x[[0, 0, 0, 0]] = -5.0;
        x[[0, 1, 0, 0]] = 1.0;
        x[[0, 2, 0, 1]] = 0.5;

        let y = nchw_to_nhwc(to_unit_range(&x));

        assert_eq!(y.dim(), (1, 1, 2, 3));
        assert_eq!(y[[0, 0, 0, 0]], 0.0);
        assert_eq!(y[[0, 0, 0, 1]], 1.0);
        assert_eq!(y[[0, 0, 1, 2]], 0.75);
        assert_eq!(y[[0, 0, 1, 0]], 0.5);
    }

    #[test]
    fn test_load_image_resizes_and_scales() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("magenta.png");
        RgbImage::from_pixel(48, 48, Rgb([255, 0, 255])).save(&path).unwrap();

        let t = load_image(&path, Device::Cpu).unwrap();
        assert_eq!(t.size(), vec![1, 3, 96, 96]);

        let red = t.get(0).get(0).mean(Kind::Float).double_value(&[]);
        let green = t.get(0).get(1).mean(Kind::Float).double_value(&[]);
        assert!((red - 1.0).abs() < 1e-6);
        assert!((green + 1.0).abs() < 1e-6);
    }
}
