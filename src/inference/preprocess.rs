//! Image decoding and tensor preparation for classification models

use crate::error::Result;
use image::DynamicImage;
use tract_onnx::prelude::*;

/// Input size expected by the classification models (ResNet/MobileNet family)
pub const INPUT_SIZE: (u32, u32) = (224, 224);

/// Per-channel normalization constants (ImageNet statistics)
const MEAN: [f32; 3] = [0.485, 0.456, 0.406];
const STD: [f32; 3] = [0.229, 0.224, 0.225];

/// Decode raw image bytes. Format is detected from content, not file
/// extension.
pub fn decode_image(data: &[u8]) -> Result<DynamicImage> {
    Ok(image::load_from_memory(data)?)
}

/// Resize to the model input and convert to a normalized NCHW float tensor.
pub fn to_input_tensor(image: &DynamicImage) -> Tensor {
    let (width, height) = INPUT_SIZE;
    let resized = image
        .resize_exact(width, height, image::imageops::FilterType::Triangle)
        .to_rgb8();

    tract_ndarray::Array4::from_shape_fn(
        (1, 3, height as usize, width as usize),
        |(_, channel, y, x)| {
            let value = resized.get_pixel(x as u32, y as u32)[channel] as f32 / 255.0;
            (value - MEAN[channel]) / STD[channel]
        },
    )
    .into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageBuffer, Rgb};

    fn solid_image(r: u8, g: u8, b: u8, width: u32, height: u32) -> DynamicImage {
        DynamicImage::ImageRgb8(ImageBuffer::from_pixel(width, height, Rgb([r, g, b])))
    }

    #[test]
    fn test_tensor_has_nchw_shape() {
        let tensor = to_input_tensor(&solid_image(10, 20, 30, 64, 48));
        assert_eq!(tensor.shape(), &[1, 3, 224, 224]);
    }

    #[test]
    fn test_normalization_applies_imagenet_stats() {
        // A white image maps every channel to (1.0 - mean) / std.
        let tensor = to_input_tensor(&solid_image(255, 255, 255, 8, 8));
        let view = tensor.to_array_view::<f32>().unwrap();

        for channel in 0..3 {
            let expected = (1.0 - MEAN[channel]) / STD[channel];
            let actual = view[[0, channel, 0, 0]];
            assert!((actual - expected).abs() < 1e-5);
        }
    }

    #[test]
    fn test_garbage_bytes_fail_to_decode() {
        assert!(decode_image(b"definitely not an image").is_err());
    }
}
