use fieldline_core::field::FieldConfiguration;
use fieldline_core::geometry::{Bounds2D, Point2};
use fieldline_core::primitive::ResolvedPrimitive;
use fieldline_core::template::TemplateDefinition;
use tracing::debug;

use crate::builder::build;
use crate::errors::{FieldBoundsError, RenderError};
use crate::projection::{Projection, project, projected_bounds};

const SIZE_TOLERANCE: f64 = 1e-9;

/// 协作方边界上的检查：场地尺寸须在模板允许范围内，比例须为正。
pub fn ensure_within_bounds(
    template: &TemplateDefinition,
    configuration: &FieldConfiguration,
) -> Result<(), FieldBoundsError> {
    if !template.accepts_length(configuration.length_meters) {
        return Err(FieldBoundsError::OutOfBounds {
            sport: template.sport.clone(),
            dimension: "length",
            value: configuration.length_meters,
            min: template.min_length,
            max: template.max_length,
        });
    }
    if !template.accepts_width(configuration.width_meters) {
        return Err(FieldBoundsError::OutOfBounds {
            sport: template.sport.clone(),
            dimension: "width",
            value: configuration.width_meters,
            min: template.min_width,
            max: template.max_width,
        });
    }
    let scale = configuration.scale_pixels_per_meter;
    if !(scale.is_finite() && scale > 0.0) {
        return Err(FieldBoundsError::NonPositiveScale(scale));
    }
    Ok(())
}

pub fn projection_for(configuration: &FieldConfiguration, origin: Point2) -> Projection {
    Projection::new(
        configuration.scale_pixels_per_meter,
        configuration.normalized_rotation(),
        configuration.width_meters,
        configuration.length_meters,
    )
    .with_origin(origin.x(), origin.y())
}

/// 交给渲染适配器的像素空间结果。
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedField {
    pub primitives: Vec<ResolvedPrimitive>,
    pub line_color: String,
    pub bounds: Option<Bounds2D>,
}

/// 完整流水线：范围检查 → 构建 → 投影。
pub fn render_field(
    template: &TemplateDefinition,
    configuration: &FieldConfiguration,
    origin: Point2,
) -> Result<RenderedField, RenderError> {
    ensure_within_bounds(template, configuration)?;
    let meters = build(
        template,
        configuration.width_meters,
        configuration.length_meters,
    )?;
    let primitives = project(&meters, &projection_for(configuration, origin))?;
    let bounds = projected_bounds(&primitives);
    debug!(sport = %template.sport, count = primitives.len(), "场地渲染数据已生成");
    Ok(RenderedField {
        primitives,
        line_color: configuration.line_color.clone(),
        bounds,
    })
}

/// 当场地尺寸偏离模板默认尺寸时，列出不会随之缩放的固定元素 ID。
pub fn fixed_element_warnings<'a>(
    template: &'a TemplateDefinition,
    width: f64,
    length: f64,
) -> Vec<&'a str> {
    let resized = (width - template.default_width).abs() > SIZE_TOLERANCE
        || (length - template.default_length).abs() > SIZE_TOLERANCE;
    if !resized {
        return Vec::new();
    }
    template
        .elements
        .iter()
        .filter(|element| template.is_fixed(&element.id))
        .map(|element| element.id.as_str())
        .collect()
}

#[cfg(test)]
mod tests {
    use std::collections::{BTreeMap, BTreeSet};

    use fieldline_core::primitive::Primitive;
    use fieldline_core::template::{Element, PointSpec, Shape, SizeSpec};

    use super::*;

    fn template() -> TemplateDefinition {
        TemplateDefinition {
            sport: "test".to_string(),
            name: None,
            min_length: 90.0,
            max_length: 120.0,
            min_width: 45.0,
            max_width: 90.0,
            default_length: 105.0,
            default_width: 68.0,
            elements: vec![
                Element::new(
                    "boundary",
                    Shape::Rectangle {
                        position: PointSpec::new(0.0, 0.0),
                        size: SizeSpec::new("field_width", "field_length"),
                    },
                ),
                Element::new(
                    "center_circle",
                    Shape::Circle {
                        center: PointSpec::new("field_width / 2", "field_length / 2"),
                        radius: 9.15.into(),
                    },
                ),
            ],
            fixed_elements: BTreeSet::from(["center_circle".to_string()]),
            specifications: BTreeMap::new(),
        }
    }

    #[test]
    fn length_outside_bounds_is_rejected_before_build() {
        let cfg = FieldConfiguration::new(64.0, 130.0, 5.0);
        let err = ensure_within_bounds(&template(), &cfg).unwrap_err();
        assert_eq!(
            err,
            FieldBoundsError::OutOfBounds {
                sport: "test".to_string(),
                dimension: "length",
                value: 130.0,
                min: 90.0,
                max: 120.0,
            }
        );
        assert!(matches!(
            render_field(&template(), &cfg, Point2::new(0.0, 0.0)),
            Err(RenderError::Bounds(_))
        ));
    }

    #[test]
    fn width_and_scale_are_checked() {
        let narrow = FieldConfiguration::new(40.0, 100.0, 5.0);
        assert!(matches!(
            ensure_within_bounds(&template(), &narrow),
            Err(FieldBoundsError::OutOfBounds {
                dimension: "width",
                ..
            })
        ));
        let flat = FieldConfiguration::new(64.0, 100.0, 0.0);
        assert_eq!(
            ensure_within_bounds(&template(), &flat),
            Err(FieldBoundsError::NonPositiveScale(0.0))
        );
        let edge = FieldConfiguration::new(90.0, 90.0, 1.0);
        assert!(ensure_within_bounds(&template(), &edge).is_ok());
    }

    #[test]
    fn render_field_runs_whole_pipeline() {
        let cfg = FieldConfiguration::new(64.0, 100.0, 10.0).with_rotation(360.0);
        let rendered = render_field(&template(), &cfg, Point2::new(5.0, 5.0)).unwrap();
        assert_eq!(rendered.line_color, "#ffffff");
        assert_eq!(
            rendered.primitives[0].primitive,
            Primitive::Rect {
                origin: Point2::new(5.0, 5.0),
                width: 640.0,
                height: 1000.0,
                angle: 0.0,
            }
        );
        let bounds = rendered.bounds.expect("bounds");
        assert!(bounds.max().distance(Point2::new(645.0, 1005.0)) < 1e-9);
        assert!(bounds.min().distance(Point2::new(5.0, 5.0)) < 1e-9);
    }

    #[test]
    fn fixed_elements_are_reported_only_when_resized() {
        let t = template();
        assert!(fixed_element_warnings(&t, 68.0, 105.0).is_empty());
        assert_eq!(fixed_element_warnings(&t, 64.0, 100.0), ["center_circle"]);
    }
}
