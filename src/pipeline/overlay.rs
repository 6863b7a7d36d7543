//! Control images: the line mask blended over the page for visual checks.

use image::{GrayImage, Rgb, RgbImage};

/// Blends `mask` (as white) over `image`: `alpha * mask + (1 - alpha) * image`.
/// Pixels outside the mask are taken as zero mask.
pub fn overlay_mask(image: &RgbImage, mask: &GrayImage, alpha: f32) -> RgbImage {
    let alpha = alpha.clamp(0.0, 1.0);
    RgbImage::from_fn(image.width(), image.height(), |x, y| {
        let m = if x < mask.width() && y < mask.height() {
            f32::from(mask.get_pixel(x, y)[0])
        } else {
            0.0
        };
        let p = image.get_pixel(x, y);
        let blend = |c: u8| (alpha * m + (1.0 - alpha) * f32::from(c)).round().clamp(0.0, 255.0) as u8;
        Rgb([blend(p[0]), blend(p[1]), blend(p[2])])
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;

    #[test]
    fn test_overlay_blends_mask_pixels() {
        let image = RgbImage::from_pixel(2, 1, Rgb([100, 0, 200]));
        let mut mask = GrayImage::new(2, 1);
        mask.put_pixel(1, 0, Luma([255]));
        let out = overlay_mask(&image, &mask, 0.6);
        assert_eq!(out.get_pixel(0, 0), &Rgb([40, 0, 80]));
        assert_eq!(out.get_pixel(1, 0), &Rgb([193, 153, 233]));
    }
}
