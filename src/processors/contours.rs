//! Contour extraction and reading-order sorting for binary line masks.

use image::GrayImage;
use imageproc::contours::find_contours;
use imageproc::point::Point;
use itertools::Itertools;
use serde::{Deserialize, Serialize};

/// Axis-aligned rectangle with inclusive pixel extent, the way OpenCV's
/// `boundingRect` reports it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BoundingRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl BoundingRect {
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// The four corners, clockwise from the top-left.
    pub fn corners(&self) -> [(u32, u32); 4] {
        let (x, y, w, h) = (self.x, self.y, self.width, self.height);
        [(x, y), (x + w, y), (x + w, y + h), (x, y + h)]
    }

    /// Corners rendered as `"x,y x,y x,y x,y"`.
    pub fn points_string(&self) -> String {
        self.corners()
            .iter()
            .map(|(x, y)| format!("{x},{y}"))
            .join(" ")
    }

    /// Integer vertical centre, truncated.
    pub fn center_y(&self) -> u32 {
        self.y + self.height / 2
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

/// A line region detected on the page mask.
#[derive(Debug, Clone, PartialEq)]
pub struct LineContour {
    pub points: Vec<Point<i32>>,
    pub bbox: BoundingRect,
    pub center_y: u32,
    pub area: f64,
}

impl LineContour {
    pub fn from_points(points: Vec<Point<i32>>) -> Self {
        let bbox = bounding_rect(&points);
        let area = polygon_area(&points);
        Self {
            center_y: bbox.center_y(),
            points,
            bbox,
            area,
        }
    }

    /// Contour polygon rendered as `"x,y x,y ..."`.
    pub fn points_string(&self) -> String {
        self.points
            .iter()
            .map(|p| format!("{},{}", p.x, p.y))
            .join(" ")
    }
}

/// Polygon area by the shoelace formula.
pub fn polygon_area(points: &[Point<i32>]) -> f64 {
    if points.len() < 3 {
        return 0.0;
    }
    let twice: i64 = points
        .iter()
        .zip(points.iter().cycle().skip(1))
        .map(|(a, b)| i64::from(a.x) * i64::from(b.y) - i64::from(b.x) * i64::from(a.y))
        .sum();
    (twice as f64 / 2.0).abs()
}

/// Bounding rectangle of a point set; an empty set yields an empty rectangle.
pub fn bounding_rect(points: &[Point<i32>]) -> BoundingRect {
    let Some(first) = points.first() else {
        return BoundingRect::default();
    };
    let (mut min_x, mut min_y, mut max_x, mut max_y) = (first.x, first.y, first.x, first.y);
    for p in points.iter().skip(1) {
        min_x = min_x.min(p.x);
        min_y = min_y.min(p.y);
        max_x = max_x.max(p.x);
        max_y = max_y.max(p.y);
    }
    let min_x = min_x.max(0);
    let min_y = min_y.max(0);
    BoundingRect::new(
        min_x as u32,
        min_y as u32,
        (max_x - min_x + 1).max(0) as u32,
        (max_y - min_y + 1).max(0) as u32,
    )
}

/// Bounding rectangle of all non-zero pixels in `mask`.
pub fn mask_bounding_box(mask: &GrayImage) -> BoundingRect {
    let mut bounds: Option<(u32, u32, u32, u32)> = None;
    for (x, y, pixel) in mask.enumerate_pixels() {
        if pixel[0] == 0 {
            continue;
        }
        bounds = Some(match bounds {
            None => (x, y, x, y),
            Some((x0, y0, x1, y1)) => (x0.min(x), y0.min(y), x1.max(x), y1.max(y)),
        });
    }
    match bounds {
        Some((x0, y0, x1, y1)) => BoundingRect::new(x0, y0, x1 - x0 + 1, y1 - y0 + 1),
        None => BoundingRect::default(),
    }
}

/// Traces every border in `mask`, outer and hole alike.
pub fn find_line_contours(mask: &GrayImage) -> Vec<LineContour> {
    find_contours::<i32>(mask)
        .into_iter()
        .map(|contour| LineContour::from_points(contour.points))
        .collect()
}

/// Keeps contours whose area is strictly greater than `min_area`.
pub fn filter_by_area(contours: Vec<LineContour>, min_area: f64) -> Vec<LineContour> {
    contours.into_iter().filter(|c| c.area > min_area).collect()
}

/// Orders contours top to bottom. Equal centres keep their trace order.
pub fn sort_by_vertical_center(contours: &mut [LineContour]) {
    contours.sort_by_key(|c| c.center_y);
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;

    fn rect_points(x: i32, y: i32, w: i32, h: i32) -> Vec<Point<i32>> {
        vec![
            Point::new(x, y),
            Point::new(x + w, y),
            Point::new(x + w, y + h),
            Point::new(x, y + h),
        ]
    }

    #[test]
    fn test_polygon_area_rectangle() {
        assert_eq!(polygon_area(&rect_points(0, 0, 40, 50)), 2000.0);
        assert_eq!(polygon_area(&rect_points(0, 0, 1, 1)[..2]), 0.0);
    }

    #[test]
    fn test_area_filter_is_strict() {
        let exact = LineContour::from_points(rect_points(0, 0, 40, 50));
        let larger = LineContour::from_points(rect_points(0, 0, 41, 50));
        let kept = filter_by_area(vec![exact, larger.clone()], 2000.0);
        assert_eq!(kept, vec![larger]);
    }

    #[test]
    fn test_sort_by_vertical_center() {
        let mut contours: Vec<LineContour> = [300, 50, 175]
            .iter()
            .map(|&c| LineContour::from_points(rect_points(10, c - 5, 100, 10)))
            .collect();
        sort_by_vertical_center(&mut contours);
        let centers: Vec<u32> = contours.iter().map(|c| c.center_y).collect();
        assert_eq!(centers, vec![50, 175, 300]);
    }

    #[test]
    fn test_sort_is_stable_on_ties() {
        let a = LineContour::from_points(rect_points(0, 10, 50, 10));
        let b = LineContour::from_points(rect_points(200, 10, 50, 10));
        let mut contours = vec![a.clone(), b.clone()];
        sort_by_vertical_center(&mut contours);
        assert_eq!(contours, vec![a, b]);
    }

    #[test]
    fn test_bounding_rect_inclusive() {
        let rect = bounding_rect(&rect_points(2, 3, 10, 4));
        assert_eq!(rect, BoundingRect::new(2, 3, 11, 5));
        assert_eq!(rect.center_y(), 5);
    }

    #[test]
    fn test_points_string() {
        let rect = BoundingRect::new(1, 2, 3, 4);
        assert_eq!(rect.points_string(), "1,2 4,2 4,6 1,6");
    }

    #[test]
    fn test_mask_bounding_box() {
        let mut mask = GrayImage::new(20, 20);
        assert!(mask_bounding_box(&mask).is_empty());
        mask.put_pixel(3, 4, Luma([255]));
        mask.put_pixel(10, 12, Luma([255]));
        assert_eq!(mask_bounding_box(&mask), BoundingRect::new(3, 4, 8, 9));
    }

    #[test]
    fn test_find_line_contours_single_block() {
        let mut mask = GrayImage::new(60, 30);
        for y in 5..25 {
            for x in 10..50 {
                mask.put_pixel(x, y, Luma([255]));
            }
        }
        let contours = find_line_contours(&mask);
        assert_eq!(contours.len(), 1);
        assert_eq!(contours[0].bbox, BoundingRect::new(10, 5, 40, 20));
    }
}
