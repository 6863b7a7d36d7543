//! Aspect-preserving resize with zero padding, and tensor conversion of the result.

use crate::core::batch::Tensor2D;
use image::{GrayImage, imageops::FilterType};

/// Placement of a resized image inside the padded canvas.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PadPlacement {
    pub resized_width: u32,
    pub resized_height: u32,
    pub offset_x: u32,
    pub offset_y: u32,
}

/// Computes how an image of `width`×`height` fits a `target_width`×`target_height`
/// canvas: scaled by the larger of the two ratios, then centred.
pub fn pad_placement(width: u32, height: u32, target_width: u32, target_height: u32) -> PadPlacement {
    let ratio = f64::max(
        width as f64 / target_width as f64,
        height as f64 / target_height as f64,
    );
    let resized_width = ((width as f64 / ratio).floor() as u32).clamp(1, target_width);
    let resized_height = ((height as f64 / ratio).floor() as u32).clamp(1, target_height);
    PadPlacement {
        resized_width,
        resized_height,
        offset_x: (target_width - resized_width) / 2,
        offset_y: (target_height - resized_height) / 2,
    }
}

/// Resizes `image` to fit the target size without distortion and pads the
/// remainder with black.
pub fn resize_with_pad(image: &GrayImage, target_width: u32, target_height: u32) -> GrayImage {
    let mut canvas = GrayImage::new(target_width, target_height);
    let (width, height) = image.dimensions();
    if width == 0 || height == 0 || target_width == 0 || target_height == 0 {
        return canvas;
    }
    let placement = pad_placement(width, height, target_width, target_height);
    let resized = image::imageops::resize(
        image,
        placement.resized_width,
        placement.resized_height,
        FilterType::Triangle,
    );
    image::imageops::replace(
        &mut canvas,
        &resized,
        i64::from(placement.offset_x),
        i64::from(placement.offset_y),
    );
    canvas
}

/// Scales pixels to `[0, 1]` and lays them out as `[width, height]`, so the
/// width becomes the time axis of a sequence model.
pub fn to_time_major(image: &GrayImage) -> Tensor2D {
    let (width, height) = image.dimensions();
    Tensor2D::from_shape_fn((width as usize, height as usize), |(x, y)| {
        image.get_pixel(x as u32, y as u32)[0] as f32 / 255.0
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wide_image_fills_width() {
        let placement = pad_placement(4000, 100, 2000, 80);
        assert_eq!(placement.resized_width, 2000);
        assert_eq!(placement.resized_height, 50);
        assert_eq!(placement.offset_x, 0);
        assert_eq!(placement.offset_y, 15);
    }

    #[test]
    fn test_tall_image_fills_height() {
        let placement = pad_placement(100, 160, 2000, 80);
        assert_eq!(placement.resized_height, 80);
        assert_eq!(placement.resized_width, 50);
        assert_eq!(placement.offset_x, 975);
    }

    #[test]
    fn test_resize_with_pad_keeps_content_centred() {
        let image = GrayImage::from_pixel(200, 10, image::Luma([255]));
        let out = resize_with_pad(&image, 100, 20);
        assert_eq!(out.dimensions(), (100, 20));
        // 200x10 scales to 100x5 at rows 7..12
        assert_eq!(out.get_pixel(50, 0)[0], 0);
        assert!(out.get_pixel(50, 9)[0] > 250);
        assert_eq!(out.get_pixel(50, 19)[0], 0);
    }

    #[test]
    fn test_to_time_major_transposes_and_scales() {
        let mut image = GrayImage::new(3, 2);
        image.put_pixel(2, 1, image::Luma([255]));
        let tensor = to_time_major(&image);
        assert_eq!(tensor.shape(), &[3, 2]);
        assert_eq!(tensor[[2, 1]], 1.0);
        assert_eq!(tensor[[1, 1]], 0.0);
    }
}
