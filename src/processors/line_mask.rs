//! Turns a binary line mask into ordered line contours and tight line crops.
//!
//! Each surviving contour is rasterised into its own mask, dilated with a
//! square structuring element to win back ink the contour clipped, applied to
//! the page image and then trimmed of empty rows and columns.

use crate::core::constants::{
    DEFAULT_DILATION_ITERATIONS, DEFAULT_DILATION_KERNEL, DEFAULT_MIN_CONTOUR_AREA,
};
use crate::processors::contours::{
    BoundingRect, LineContour, filter_by_area, find_line_contours, mask_bounding_box,
    sort_by_vertical_center,
};
use image::{GrayImage, Luma, Rgb, RgbImage};
use imageproc::drawing::draw_polygon_mut;
use imageproc::morphology::{self, Mask};
use imageproc::point::Point;

/// Output of [`LineExtractor::extract`].
#[derive(Debug, Clone)]
pub struct ExtractedLines {
    pub line_images: Vec<RgbImage>,
    pub page_bbox: BoundingRect,
    pub contours: Vec<LineContour>,
}

impl ExtractedLines {
    pub fn is_empty(&self) -> bool {
        self.contours.is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct LineExtractor {
    min_contour_area: f64,
    kernel_size: u32,
    iterations: u32,
}

impl Default for LineExtractor {
    fn default() -> Self {
        Self::new(
            DEFAULT_MIN_CONTOUR_AREA,
            DEFAULT_DILATION_KERNEL,
            DEFAULT_DILATION_ITERATIONS,
        )
    }
}

impl LineExtractor {
    pub fn new(min_contour_area: f64, kernel_size: u32, iterations: u32) -> Self {
        Self {
            min_contour_area,
            kernel_size: kernel_size.clamp(1, 255),
            iterations,
        }
    }

    /// Pixels a foreground pixel spreads (before, after) along each axis once
    /// all iterations ran. The anchor sits at `kernel / 2`, as in OpenCV.
    pub fn dilation_reach(&self) -> (u32, u32) {
        let anchor = self.kernel_size / 2;
        let before = (self.kernel_size - 1 - anchor) * self.iterations;
        let after = anchor * self.iterations;
        (before, after)
    }

    /// Finds, filters and orders the line contours of `mask`, then cuts a
    /// line image out of `image` for each. `mask` must match the image size.
    pub fn extract(&self, image: &RgbImage, mask: &GrayImage) -> ExtractedLines {
        let page_bbox = mask_bounding_box(mask);
        let mut contours = filter_by_area(find_line_contours(mask), self.min_contour_area);
        sort_by_vertical_center(&mut contours);

        let line_images = contours
            .iter()
            .map(|contour| self.crop_line(image, contour))
            .collect();

        ExtractedLines {
            line_images,
            page_bbox,
            contours,
        }
    }

    /// Masks `image` with the dilated contour and trims the empty border.
    pub fn crop_line(&self, image: &RgbImage, contour: &LineContour) -> RgbImage {
        let (width, height) = image.dimensions();
        let (before, after) = self.dilation_reach();
        let bbox = contour.bbox;

        let x0 = bbox.x.saturating_sub(before);
        let y0 = bbox.y.saturating_sub(before);
        let x1 = (bbox.x + bbox.width + after).min(width);
        let y1 = (bbox.y + bbox.height + after).min(height);
        if x1 <= x0 || y1 <= y0 {
            return RgbImage::new(0, 0);
        }

        let local = self.local_mask(contour, x0, y0, x1 - x0, y1 - y0);
        let dilated = dilate(&local, self.kernel_size, self.iterations);

        let mut masked = RgbImage::new(x1 - x0, y1 - y0);
        for (x, y, value) in dilated.enumerate_pixels() {
            if value[0] > 0 {
                masked.put_pixel(x, y, *image.get_pixel(x + x0, y + y0));
            }
        }
        trim_zero_border(&masked).unwrap_or(masked)
    }

    fn local_mask(&self, contour: &LineContour, x0: u32, y0: u32, w: u32, h: u32) -> GrayImage {
        let mut mask = GrayImage::new(w, h);
        let mut polygon: Vec<Point<i32>> = contour
            .points
            .iter()
            .map(|p| Point::new(p.x - x0 as i32, p.y - y0 as i32))
            .collect();
        if polygon.len() > 1 && polygon.first() == polygon.last() {
            polygon.pop();
        }
        if polygon.len() >= 3 {
            draw_polygon_mut(&mut mask, &polygon, Luma([255]));
        }
        for p in &polygon {
            if p.x >= 0 && p.y >= 0 && (p.x as u32) < w && (p.y as u32) < h {
                mask.put_pixel(p.x as u32, p.y as u32, Luma([255]));
            }
        }
        mask
    }
}

/// Grayscale dilation with a `kernel`×`kernel` square element anchored at
/// `kernel / 2`, applied `iterations` times. The side is capped at 255.
pub fn dilate(mask: &GrayImage, kernel: u32, iterations: u32) -> GrayImage {
    let side = kernel.clamp(1, 255);
    if iterations == 0 || side == 1 {
        return mask.clone();
    }
    let anchor = (side / 2) as u8;
    let element = Mask::from_image(&GrayImage::from_pixel(side, side, Luma([255])), anchor, anchor);

    let mut out = morphology::grayscale_dilate(mask, &element);
    for _ in 1..iterations {
        out = morphology::grayscale_dilate(&out, &element);
    }
    out
}

/// Removes rows and columns whose pixels are all zero. Returns `None` when
/// nothing non-zero remains.
pub fn trim_zero_border(image: &RgbImage) -> Option<RgbImage> {
    let (width, height) = image.dimensions();
    let is_zero = |p: &Rgb<u8>| p.0 == [0, 0, 0];

    let rows: Vec<u32> = (0..height)
        .filter(|&y| (0..width).any(|x| !is_zero(image.get_pixel(x, y))))
        .collect();
    let cols: Vec<u32> = (0..width)
        .filter(|&x| (0..height).any(|y| !is_zero(image.get_pixel(x, y))))
        .collect();
    if rows.is_empty() || cols.is_empty() {
        return None;
    }

    let mut out = RgbImage::new(cols.len() as u32, rows.len() as u32);
    for (oy, &y) in rows.iter().enumerate() {
        for (ox, &x) in cols.iter().enumerate() {
            out.put_pixel(ox as u32, oy as u32, *image.get_pixel(x, y));
        }
    }
    Some(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filled_mask(width: u32, height: u32, rects: &[(u32, u32, u32, u32)]) -> GrayImage {
        let mut mask = GrayImage::new(width, height);
        for &(x, y, w, h) in rects {
            for yy in y..y + h {
                for xx in x..x + w {
                    mask.put_pixel(xx, yy, Luma([255]));
                }
            }
        }
        mask
    }

    #[test]
    fn test_dilation_reach_matches_default_kernel() {
        let extractor = LineExtractor::default();
        assert_eq!(extractor.dilation_reach(), (18, 24));
    }

    #[test]
    fn test_default_dilation_spreads_by_reach() {
        let mut mask = GrayImage::new(64, 64);
        mask.put_pixel(25, 30, Luma([255]));
        let out = dilate(&mask, DEFAULT_DILATION_KERNEL, DEFAULT_DILATION_ITERATIONS);
        let (before, after) = LineExtractor::default().dilation_reach();
        for y in 0..64 {
            for x in 0..64 {
                let covered = (25 - before..=25 + after).contains(&x)
                    && (30 - before..=30 + after).contains(&y);
                assert_eq!(out.get_pixel(x, y)[0] > 0, covered, "pixel {x},{y}");
            }
        }
    }

    #[test]
    fn test_dilate_without_iterations_is_identity() {
        let mask = filled_mask(20, 20, &[(5, 5, 3, 2)]);
        assert_eq!(dilate(&mask, 8, 0), mask);
    }

    #[test]
    fn test_dilate_single_pixel() {
        let mut mask = GrayImage::new(9, 9);
        mask.put_pixel(4, 4, Luma([255]));
        let out = dilate(&mask, 3, 1);
        for y in 0..9 {
            for x in 0..9 {
                let expected = (3..=5).contains(&x) && (3..=5).contains(&y);
                assert_eq!(out.get_pixel(x, y)[0] > 0, expected, "pixel {x},{y}");
            }
        }
    }

    #[test]
    fn test_small_blobs_yield_no_lines() {
        let mask = filled_mask(200, 200, &[(10, 10, 20, 20), (100, 100, 30, 30)]);
        let image = RgbImage::from_pixel(200, 200, Rgb([200, 200, 200]));
        let lines = LineExtractor::default().extract(&image, &mask);
        assert!(lines.is_empty());
        assert!(lines.line_images.is_empty());
        assert_eq!(lines.page_bbox, BoundingRect::new(10, 10, 120, 120));
    }

    #[test]
    fn test_single_rectangle_yields_one_line() {
        let mask = filled_mask(300, 200, &[(50, 80, 100, 40)]);
        let image = RgbImage::from_pixel(300, 200, Rgb([120, 130, 140]));
        let lines = LineExtractor::default().extract(&image, &mask);
        assert_eq!(lines.contours.len(), 1);
        assert_eq!(lines.line_images.len(), 1);
        let crop = &lines.line_images[0];
        assert!(crop.width() >= 100 && crop.height() >= 40);
        assert!(crop.width() <= 100 + 42 && crop.height() <= 40 + 42);
        assert_eq!(crop.get_pixel(crop.width() / 2, crop.height() / 2), &Rgb([120, 130, 140]));
    }

    #[test]
    fn test_lines_are_ordered_top_to_bottom() {
        let mask = filled_mask(400, 400, &[(20, 300, 300, 30), (20, 40, 300, 30), (20, 170, 300, 30)]);
        let image = RgbImage::from_pixel(400, 400, Rgb([255, 255, 255]));
        let lines = LineExtractor::default().extract(&image, &mask);
        let centers: Vec<u32> = lines.contours.iter().map(|c| c.center_y).collect();
        assert_eq!(centers.len(), 3);
        assert!(centers.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn test_trim_zero_border() {
        let mut image = RgbImage::new(10, 10);
        image.put_pixel(3, 4, Rgb([1, 0, 0]));
        image.put_pixel(6, 5, Rgb([0, 0, 9]));
        let trimmed = trim_zero_border(&image).unwrap();
        assert_eq!(trimmed.dimensions(), (2, 2));
        assert!(trim_zero_border(&RgbImage::new(4, 4)).is_none());
    }
}
