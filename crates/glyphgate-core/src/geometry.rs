// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Geometry utilities — normalise whatever bounding representation a
// recognition engine emits (four-point quad, polygon, two-point rect, single
// point, garbage) into an axis-aligned pixel rectangle that is never empty or
// inverted.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Ratio between a text box height and the glyph size it most likely holds.
pub const FONT_SIZE_RATIO: f32 = 0.7;

/// Coordinates beyond this are treated as garbage and clamped. Keeps the
/// `+ 1` widening below free of overflow.
const MAX_COORD: f32 = 1_048_576.0;

/// Bounding geometry as reported by an engine, before normalisation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BoundingShape {
    /// Four corner points, usually clockwise from top-left.
    Quad { points: [[f32; 2]; 4] },
    /// Any other point list with at least three vertices.
    Polygon { points: Vec<[f32; 2]> },
    /// Two opposite corners.
    Rect { x1: f32, y1: f32, x2: f32, y2: f32 },
    /// A single anchor point with no extent.
    Point { x: f32, y: f32 },
    /// Nothing usable could be parsed.
    Malformed,
}

impl BoundingShape {
    /// Parse the loosely-typed bbox value of one engine record.
    ///
    /// Accepted forms:
    /// - `[[x, y], [x, y], [x, y], [x, y]]` (quad), longer point lists (polygon),
    ///   two points (rect) or one point;
    /// - flat `[x1, y1, x2, y2]`, flat eight-number quads, flat even-length
    ///   polygons, and `[x, y]` points;
    /// - objects with `x_min/y_min/x_max/y_max`, `x/y/w/h`, `x/y/width/height`
    ///   or only `x/y`.
    ///
    /// Anything else yields [`BoundingShape::Malformed`].
    pub fn from_value(value: &Value) -> Self {
        match value {
            Value::Array(items) => Self::from_array(items),
            Value::Object(map) => {
                let get = |key: &str| map.get(key).and_then(finite_number);
                if let (Some(x1), Some(y1), Some(x2), Some(y2)) =
                    (get("x_min"), get("y_min"), get("x_max"), get("y_max"))
                {
                    return Self::Rect { x1, y1, x2, y2 };
                }
                match (get("x"), get("y")) {
                    (Some(x), Some(y)) => {
                        let w = get("w").or_else(|| get("width"));
                        let h = get("h").or_else(|| get("height"));
                        match (w, h) {
                            (Some(w), Some(h)) => Self::Rect {
                                x1: x,
                                y1: y,
                                x2: x + w,
                                y2: y + h,
                            },
                            _ => Self::Point { x, y },
                        }
                    }
                    _ => Self::Malformed,
                }
            }
            _ => Self::Malformed,
        }
    }

    fn from_array(items: &[Value]) -> Self {
        if items.is_empty() {
            return Self::Malformed;
        }

        // Nested point list.
        if items.iter().all(Value::is_array) {
            let points: Option<Vec<[f32; 2]>> = items.iter().map(parse_point).collect();
            return match points {
                Some(points) => Self::from_points(points),
                None => Self::Malformed,
            };
        }

        // Flat number list.
        let numbers: Option<Vec<f32>> = items.iter().map(finite_number).collect();
        let Some(numbers) = numbers else {
            return Self::Malformed;
        };
        match numbers.len() {
            2 => Self::Point {
                x: numbers[0],
                y: numbers[1],
            },
            4 => Self::Rect {
                x1: numbers[0],
                y1: numbers[1],
                x2: numbers[2],
                y2: numbers[3],
            },
            n if n >= 6 && n % 2 == 0 => {
                let points = numbers.chunks_exact(2).map(|c| [c[0], c[1]]).collect();
                Self::from_points(points)
            }
            _ => Self::Malformed,
        }
    }

    fn from_points(points: Vec<[f32; 2]>) -> Self {
        match points.len() {
            0 => Self::Malformed,
            1 => Self::Point {
                x: points[0][0],
                y: points[0][1],
            },
            2 => Self::Rect {
                x1: points[0][0],
                y1: points[0][1],
                x2: points[1][0],
                y2: points[1][1],
            },
            4 => Self::Quad {
                points: [points[0], points[1], points[2], points[3]],
            },
            _ => Self::Polygon { points },
        }
    }

    /// Whether parsing found anything usable.
    pub fn is_malformed(&self) -> bool {
        matches!(self, Self::Malformed)
    }

    /// Axis-aligned rectangle enclosing this shape.
    ///
    /// Always returns a box with `x_min < x_max` and `y_min < y_max`: points
    /// become 1×1 boxes and malformed input becomes a 1×1 box at the origin.
    pub fn to_rect(&self) -> PixelRect {
        match self {
            Self::Quad { points } => rect_from_points(points),
            Self::Polygon { points } => rect_from_points(points),
            Self::Rect { x1, y1, x2, y2 } => PixelRect::from_corners(*x1, *y1, *x2, *y2),
            Self::Point { x, y } => PixelRect::from_corners(*x, *y, *x, *y),
            Self::Malformed => PixelRect::UNIT,
        }
    }

    /// Map a shape found on an image scaled by `(scale_x, scale_y)` back
    /// into the coordinate space of the unscaled source.
    ///
    /// Non-positive or non-finite scales leave the shape unchanged.
    pub fn unscale(&self, scale_x: f32, scale_y: f32) -> Self {
        if !(scale_x.is_finite() && scale_y.is_finite() && scale_x > 0.0 && scale_y > 0.0) {
            return self.clone();
        }
        let map = |[x, y]: [f32; 2]| [x / scale_x, y / scale_y];
        match self {
            Self::Quad { points } => Self::Quad {
                points: points.map(map),
            },
            Self::Polygon { points } => Self::Polygon {
                points: points.iter().copied().map(map).collect(),
            },
            Self::Rect { x1, y1, x2, y2 } => Self::Rect {
                x1: x1 / scale_x,
                y1: y1 / scale_y,
                x2: x2 / scale_x,
                y2: y2 / scale_y,
            },
            Self::Point { x, y } => Self::Point {
                x: x / scale_x,
                y: y / scale_y,
            },
            Self::Malformed => Self::Malformed,
        }
    }
}

/// Axis-aligned pixel rectangle, half-open: `[x_min, x_max) × [y_min, y_max)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PixelRect {
    pub x_min: u32,
    pub y_min: u32,
    pub x_max: u32,
    pub y_max: u32,
}

impl PixelRect {
    /// The smallest legal rectangle.
    pub const UNIT: PixelRect = PixelRect {
        x_min: 0,
        y_min: 0,
        x_max: 1,
        y_max: 1,
    };

    /// Build a rectangle from two arbitrary corners.
    ///
    /// Corners may be swapped, negative or fractional; minimums are floored,
    /// maximums are ceiled, and a zero-extent axis is widened to one pixel.
    pub fn from_corners(x1: f32, y1: f32, x2: f32, y2: f32) -> Self {
        let (x_lo, x_hi) = ordered(x1, x2);
        let (y_lo, y_hi) = ordered(y1, y2);
        let x_min = floor_px(x_lo);
        let y_min = floor_px(y_lo);
        let x_max = ceil_px(x_hi).max(x_min + 1);
        let y_max = ceil_px(y_hi).max(y_min + 1);
        Self {
            x_min,
            y_min,
            x_max,
            y_max,
        }
    }

    pub fn width(&self) -> u32 {
        self.x_max - self.x_min
    }

    pub fn height(&self) -> u32 {
        self.y_max - self.y_min
    }

    pub fn area(&self) -> u64 {
        self.width() as u64 * self.height() as u64
    }

    /// Estimated glyph size in pixels for text filling this box.
    pub fn font_size_estimate(&self) -> f32 {
        self.height() as f32 * FONT_SIZE_RATIO
    }

    /// Clamp into an image of `width × height`, keeping at least 1×1.
    ///
    /// An empty image leaves the rectangle unchanged.
    pub fn clamp_to(&self, width: u32, height: u32) -> Self {
        if width == 0 || height == 0 {
            return *self;
        }
        let x_min = self.x_min.min(width - 1);
        let y_min = self.y_min.min(height - 1);
        let x_max = self.x_max.min(width).max(x_min + 1);
        let y_max = self.y_max.min(height).max(y_min + 1);
        Self {
            x_min,
            y_min,
            x_max,
            y_max,
        }
    }
}

fn rect_from_points(points: &[[f32; 2]]) -> PixelRect {
    if points.is_empty() {
        return PixelRect::UNIT;
    }
    let (mut x_lo, mut y_lo) = (f32::MAX, f32::MAX);
    let (mut x_hi, mut y_hi) = (f32::MIN, f32::MIN);
    for [x, y] in points {
        x_lo = x_lo.min(*x);
        y_lo = y_lo.min(*y);
        x_hi = x_hi.max(*x);
        y_hi = y_hi.max(*y);
    }
    PixelRect::from_corners(x_lo, y_lo, x_hi, y_hi)
}

fn ordered(a: f32, b: f32) -> (f32, f32) {
    if a <= b { (a, b) } else { (b, a) }
}

fn floor_px(v: f32) -> u32 {
    v.clamp(0.0, MAX_COORD).floor() as u32
}

fn ceil_px(v: f32) -> u32 {
    v.clamp(0.0, MAX_COORD).ceil() as u32
}

fn finite_number(value: &Value) -> Option<f32> {
    value
        .as_f64()
        .map(|v| v as f32)
        .filter(|v| v.is_finite())
}

fn parse_point(value: &Value) -> Option<[f32; 2]> {
    let items = value.as_array()?;
    if items.len() < 2 {
        return None;
    }
    Some([finite_number(&items[0])?, finite_number(&items[1])?])
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn assert_proper(rect: PixelRect) {
        assert!(rect.x_min < rect.x_max, "x inverted or empty: {rect:?}");
        assert!(rect.y_min < rect.y_max, "y inverted or empty: {rect:?}");
    }

    #[test]
    fn quad_points_become_enclosing_rect() {
        let shape = BoundingShape::from_value(&json!([[10, 20], [110, 22], [108, 62], [9, 60]]));
        assert!(matches!(shape, BoundingShape::Quad { .. }));
        let rect = shape.to_rect();
        assert_eq!(rect, PixelRect { x_min: 9, y_min: 20, x_max: 110, y_max: 62 });
        assert_eq!(rect.width(), 101);
        assert_eq!(rect.height(), 42);
        assert_eq!(rect.area(), 101 * 42);
    }

    #[test]
    fn flat_rect_with_swapped_corners_is_reordered() {
        let rect = BoundingShape::from_value(&json!([50.5, 40.0, 10.2, 5.0])).to_rect();
        assert_eq!(rect, PixelRect { x_min: 10, y_min: 5, x_max: 51, y_max: 40 });
    }

    #[test]
    fn two_point_list_is_a_rect() {
        let shape = BoundingShape::from_value(&json!([[0, 0], [30, 12]]));
        assert!(matches!(shape, BoundingShape::Rect { .. }));
        assert_eq!(shape.to_rect().height(), 12);
    }

    #[test]
    fn single_point_synthesises_unit_box() {
        let shape = BoundingShape::from_value(&json!([42, 17]));
        assert_eq!(shape, BoundingShape::Point { x: 42.0, y: 17.0 });
        let rect = shape.to_rect();
        assert_proper(rect);
        assert_eq!(rect, PixelRect { x_min: 42, y_min: 17, x_max: 43, y_max: 18 });
    }

    #[test]
    fn flat_eight_numbers_parse_as_quad() {
        let shape = BoundingShape::from_value(&json!([0, 0, 10, 0, 10, 5, 0, 5]));
        assert!(matches!(shape, BoundingShape::Quad { .. }));
        assert_eq!(shape.to_rect().width(), 10);
    }

    #[test]
    fn object_forms_are_understood() {
        let xywh = BoundingShape::from_value(&json!({"x": 4, "y": 6, "w": 20, "h": 10}));
        assert_eq!(xywh.to_rect(), PixelRect { x_min: 4, y_min: 6, x_max: 24, y_max: 16 });

        let minmax = BoundingShape::from_value(
            &json!({"x_min": 1, "y_min": 2, "x_max": 3, "y_max": 4}),
        );
        assert_eq!(minmax.to_rect(), PixelRect { x_min: 1, y_min: 2, x_max: 3, y_max: 4 });
    }

    #[test]
    fn malformed_inputs_still_yield_proper_rects() {
        let garbage = [
            json!(null),
            json!("box"),
            json!([]),
            json!([1, 2, 3]),
            json!([[1], [2]]),
            json!([["a", "b"], [1, 2]]),
            json!({"left": 3}),
        ];
        for value in &garbage {
            let shape = BoundingShape::from_value(value);
            assert!(shape.is_malformed(), "expected malformed for {value}");
            assert_proper(shape.to_rect());
        }
    }

    #[test]
    fn degenerate_and_negative_boxes_are_corrected() {
        let flat_line = PixelRect::from_corners(5.0, 9.0, 25.0, 9.0);
        assert_proper(flat_line);
        assert_eq!(flat_line.height(), 1);

        let negative = PixelRect::from_corners(-30.0, -4.0, -10.0, -1.0);
        assert_proper(negative);
        assert_eq!((negative.x_min, negative.y_min), (0, 0));

        let huge = PixelRect::from_corners(f32::MAX, 0.0, f32::MAX, 1.0);
        assert_proper(huge);
    }

    #[test]
    fn unscale_maps_back_to_source_space() {
        let upscaled = BoundingShape::Quad {
            points: [[40.0, 20.0], [120.0, 20.0], [120.0, 60.0], [40.0, 60.0]],
        };
        let source = upscaled.unscale(4.0, 4.0);
        assert_eq!(
            source.to_rect(),
            PixelRect { x_min: 10, y_min: 5, x_max: 30, y_max: 15 }
        );
        assert_eq!(
            BoundingShape::Point { x: 9.0, y: 3.0 }.unscale(3.0, 1.5),
            BoundingShape::Point { x: 3.0, y: 2.0 }
        );
        assert_eq!(upscaled.unscale(0.0, 2.0), upscaled);
        assert!(BoundingShape::Malformed.unscale(2.0, 2.0).is_malformed());
    }

    #[test]
    fn clamp_keeps_box_inside_and_non_empty() {
        let outside = PixelRect { x_min: 500, y_min: 10, x_max: 600, y_max: 20 };
        let clamped = outside.clamp_to(100, 100);
        assert_proper(clamped);
        assert!(clamped.x_max <= 100);
        assert_eq!(clamped.x_min, 99);
    }

    #[test]
    fn font_size_estimate_tracks_height() {
        let rect = PixelRect { x_min: 0, y_min: 0, x_max: 10, y_max: 40 };
        assert!((rect.font_size_estimate() - 28.0).abs() < 1e-4);
    }
}
