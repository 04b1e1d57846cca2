use fieldline_core::geometry::{Bounds2D, Point2, Vector2};
use fieldline_core::primitive::{Primitive, ResolvedPrimitive, bounds_of};
use tracing::debug;

use crate::builder::ensure_dimension;
use crate::errors::GeometryError;

/// 米制图元到像素图元的变换参数。
///
/// 变换顺序固定：先按 `scale` 缩放，再绕缩放后的场地中心顺时针旋转，最后平移到 `origin`。
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Projection {
    /// 每米对应的像素数。
    pub scale: f64,
    pub rotation_degrees: f64,
    pub field_width_m: f64,
    pub field_length_m: f64,
    pub origin: Point2,
}

impl Projection {
    pub fn new(scale: f64, rotation_degrees: f64, field_width_m: f64, field_length_m: f64) -> Self {
        Self {
            scale,
            rotation_degrees,
            field_width_m,
            field_length_m,
            origin: Point2::new(0.0, 0.0),
        }
    }

    pub fn with_origin(mut self, x: f64, y: f64) -> Self {
        self.origin = Point2::new(x, y);
        self
    }

    pub fn validate(&self) -> Result<(), GeometryError> {
        ensure_dimension("scale", self.scale)?;
        ensure_dimension("field_width", self.field_width_m)?;
        ensure_dimension("field_length", self.field_length_m)?;
        ensure_rotation(self.rotation_degrees)?;
        if !self.origin.x().is_finite() || !self.origin.y().is_finite() {
            return Err(GeometryError::InvalidDimensions {
                name: "origin",
                value: if self.origin.x().is_finite() {
                    self.origin.y()
                } else {
                    self.origin.x()
                },
            });
        }
        Ok(())
    }

    /// 旋转中心：缩放后、旋转前的场地中心。
    #[inline]
    pub fn pivot(&self) -> Point2 {
        Point2::new(
            self.field_width_m * self.scale / 2.0,
            self.field_length_m * self.scale / 2.0,
        )
    }

    #[inline]
    pub fn normalized_rotation(&self) -> f64 {
        self.rotation_degrees.rem_euclid(360.0)
    }

    pub fn apply_point(&self, point: Point2) -> Point2 {
        let scaled = point.scale(self.scale);
        let rotation = self.normalized_rotation();
        let rotated = if rotation == 0.0 {
            scaled
        } else {
            scaled.rotate_about(self.pivot(), rotation)
        };
        rotated.translate(Vector2::from_points(Point2::new(0.0, 0.0), self.origin))
    }

    /// 角度随旋转平移，结果归一化到 `[0, 360)`。
    #[inline]
    pub fn apply_angle(&self, degrees: f64) -> f64 {
        (degrees + self.normalized_rotation()).rem_euclid(360.0)
    }

    pub fn apply(&self, primitive: &Primitive) -> Primitive {
        match primitive {
            Primitive::Rect {
                origin,
                width,
                height,
                angle,
            } => Primitive::Rect {
                origin: self.apply_point(*origin),
                width: width * self.scale,
                height: height * self.scale,
                angle: self.apply_angle(*angle),
            },
            Primitive::Line { start, end } => Primitive::Line {
                start: self.apply_point(*start),
                end: self.apply_point(*end),
            },
            Primitive::Circle { center, radius } => Primitive::Circle {
                center: self.apply_point(*center),
                radius: radius * self.scale,
            },
            Primitive::Point { center, radius } => Primitive::Point {
                center: self.apply_point(*center),
                radius: radius * self.scale,
            },
            Primitive::Arc {
                center,
                radius,
                start_angle,
                end_angle,
            } => {
                let start = self.apply_angle(*start_angle);
                Primitive::Arc {
                    center: self.apply_point(*center),
                    radius: radius * self.scale,
                    start_angle: start,
                    end_angle: start + (end_angle - start_angle),
                }
            }
        }
    }
}

fn ensure_rotation(degrees: f64) -> Result<(), GeometryError> {
    if degrees.is_finite() {
        Ok(())
    } else {
        Err(GeometryError::InvalidDimensions {
            name: "rotation",
            value: degrees,
        })
    }
}

/// 将米制图元投影到像素空间，保持元素顺序与 ID。
pub fn project(
    primitives: &[ResolvedPrimitive],
    projection: &Projection,
) -> Result<Vec<ResolvedPrimitive>, GeometryError> {
    projection.validate()?;
    let projected: Vec<_> = primitives
        .iter()
        .map(|resolved| {
            ResolvedPrimitive::new(
                resolved.element_id.clone(),
                projection.apply(&resolved.primitive),
            )
        })
        .collect();
    debug!(
        count = projected.len(),
        scale = projection.scale,
        rotation = projection.normalized_rotation(),
        "图元已投影到像素空间"
    );
    Ok(projected)
}

/// 投影结果的整体包围盒，供调用方确定画布尺寸。
pub fn projected_bounds(primitives: &[ResolvedPrimitive]) -> Option<Bounds2D> {
    bounds_of(primitives)
}

/// 计算使旋转后的场地完整放入画布（扣除四周 `padding`）的最大像素/米比例。
pub fn fit_scale(
    field_width_m: f64,
    field_length_m: f64,
    rotation_degrees: f64,
    canvas_width: f64,
    canvas_height: f64,
    padding: f64,
) -> Result<f64, GeometryError> {
    ensure_dimension("field_width", field_width_m)?;
    ensure_dimension("field_length", field_length_m)?;
    ensure_rotation(rotation_degrees)?;
    let available_width = canvas_width - 2.0 * padding;
    let available_height = canvas_height - 2.0 * padding;
    ensure_dimension("canvas_width", available_width)?;
    ensure_dimension("canvas_height", available_height)?;

    let (sin, cos) = rotation_degrees.to_radians().sin_cos();
    let (sin, cos) = (sin.abs(), cos.abs());
    let extent_x = field_width_m * cos + field_length_m * sin;
    let extent_y = field_width_m * sin + field_length_m * cos;
    Ok((available_width / extent_x).min(available_height / extent_y))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Vec<ResolvedPrimitive> {
        vec![
            ResolvedPrimitive::new(
                "boundary",
                Primitive::Rect {
                    origin: Point2::new(0.0, 0.0),
                    width: 64.0,
                    height: 100.0,
                    angle: 0.0,
                },
            ),
            ResolvedPrimitive::new(
                "halfway",
                Primitive::Line {
                    start: Point2::new(0.0, 50.0),
                    end: Point2::new(64.0, 50.0),
                },
            ),
            ResolvedPrimitive::new(
                "center_circle",
                Primitive::Circle {
                    center: Point2::new(32.0, 50.0),
                    radius: 9.15,
                },
            ),
            ResolvedPrimitive::new(
                "corner",
                Primitive::Arc {
                    center: Point2::new(0.0, 0.0),
                    radius: 1.0,
                    start_angle: 0.0,
                    end_angle: 90.0,
                },
            ),
        ]
    }

    fn assert_point_close(actual: Point2, expected: Point2) {
        assert!(
            actual.distance(expected) < 1e-9,
            "expected {expected:?}, got {actual:?}"
        );
    }

    #[test]
    fn zero_rotation_only_scales_and_translates() {
        let projection = Projection::new(5.0, 0.0, 64.0, 100.0).with_origin(10.0, 20.0);
        let projected = project(&sample(), &projection).unwrap();
        assert_eq!(
            projected[0].primitive,
            Primitive::Rect {
                origin: Point2::new(10.0, 20.0),
                width: 320.0,
                height: 500.0,
                angle: 0.0,
            }
        );
        match projected[2].primitive {
            Primitive::Circle { center, radius } => {
                assert_point_close(center, Point2::new(170.0, 270.0));
                assert!((radius - 45.75).abs() < 1e-9);
            }
            ref other => panic!("unexpected primitive {other:?}"),
        }
    }

    #[test]
    fn half_turn_swaps_opposite_corners() {
        let projection = Projection::new(2.0, 180.0, 64.0, 100.0);
        let projected = project(&sample(), &projection).unwrap();
        match projected[0].primitive {
            Primitive::Rect { origin, angle, .. } => {
                assert_point_close(origin, Point2::new(128.0, 200.0));
                assert!((angle - 180.0).abs() < 1e-9);
            }
            ref other => panic!("unexpected primitive {other:?}"),
        }
        match projected[3].primitive {
            Primitive::Arc {
                center,
                start_angle,
                end_angle,
                ..
            } => {
                assert_point_close(center, Point2::new(128.0, 200.0));
                assert!((start_angle - 180.0).abs() < 1e-9);
                assert!((end_angle - 270.0).abs() < 1e-9);
            }
            ref other => panic!("unexpected primitive {other:?}"),
        }
    }

    #[test]
    fn quarter_turn_is_clockwise_about_pivot() {
        let projection = Projection::new(1.0, 90.0, 64.0, 100.0);
        let projected = project(&sample(), &projection).unwrap();
        match projected[1].primitive {
            Primitive::Line { start, end } => {
                // 中线绕中心 (32, 50) 旋转 90° 后变为竖线
                assert_point_close(start, Point2::new(32.0, 18.0));
                assert_point_close(end, Point2::new(32.0, 82.0));
            }
            ref other => panic!("unexpected primitive {other:?}"),
        }
    }

    #[test]
    fn invalid_projection_parameters_are_rejected() {
        let err = project(&sample(), &Projection::new(0.0, 0.0, 64.0, 100.0)).unwrap_err();
        assert!(matches!(
            err,
            GeometryError::InvalidDimensions { name: "scale", .. }
        ));
        let err = project(&sample(), &Projection::new(1.0, f64::INFINITY, 64.0, 100.0)).unwrap_err();
        assert!(matches!(
            err,
            GeometryError::InvalidDimensions {
                name: "rotation",
                ..
            }
        ));
        let err = project(&sample(), &Projection::new(1.0, 0.0, -64.0, 100.0)).unwrap_err();
        assert!(matches!(
            err,
            GeometryError::InvalidDimensions {
                name: "field_width",
                ..
            }
        ));
    }

    #[test]
    fn projected_bounds_cover_rotated_field() {
        let projection = Projection::new(1.0, 90.0, 64.0, 100.0);
        let projected = project(&sample(), &projection).unwrap();
        let bounds = projected_bounds(&projected).expect("bounds");
        assert!((bounds.width() - 100.0).abs() < 1e-9);
        assert!((bounds.height() - 64.0).abs() < 1e-9);
        assert_point_close(bounds.center(), Point2::new(32.0, 50.0));
    }

    #[test]
    fn fit_scale_accounts_for_rotation_and_padding() {
        let upright = fit_scale(64.0, 100.0, 0.0, 740.0, 1020.0, 10.0).unwrap();
        assert!((upright - 10.0).abs() < 1e-9);

        let sideways = fit_scale(64.0, 100.0, 90.0, 1020.0, 660.0, 10.0).unwrap();
        assert!((sideways - 10.0).abs() < 1e-9);

        assert!(fit_scale(64.0, 100.0, 0.0, 10.0, 10.0, 10.0).is_err());
    }

    #[test]
    fn fit_scale_rejects_non_finite_rotation() {
        for rotation in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
            assert!(matches!(
                fit_scale(64.0, 100.0, rotation, 740.0, 1020.0, 10.0),
                Err(GeometryError::InvalidDimensions {
                    name: "rotation",
                    ..
                })
            ));
        }
    }
}
