use fieldline_core::geometry::Point2;
use fieldline_core::primitive::{Primitive, ResolvedPrimitive};
use fieldline_core::template::{ArcSweep, Element, FormulaOrNumber, PointSpec, Shape, TemplateDefinition};
use tracing::debug;

use crate::errors::GeometryError;
use crate::formula::{FormulaVars, evaluate};

/// 按给定场地尺寸（米）解析模板中的全部元素，输出场地局部坐标下的图元。
///
/// 不检查模板的尺寸上下限，预览时可以使用任意正尺寸。任一元素解析失败即中止并返回该元素 ID。
pub fn build(
    template: &TemplateDefinition,
    width: f64,
    length: f64,
) -> Result<Vec<ResolvedPrimitive>, GeometryError> {
    ensure_dimension("width", width)?;
    ensure_dimension("length", length)?;

    let vars = FormulaVars::new(width, length);
    let primitives = template
        .elements
        .iter()
        .map(|element| resolve_element(element, &vars))
        .collect::<Result<Vec<_>, _>>()?;

    debug!(
        sport = %template.sport,
        width,
        length,
        count = primitives.len(),
        "模板几何已解析"
    );
    Ok(primitives)
}

/// 解析单个元素，错误统一包装为 `UnresolvedElement`。
pub fn resolve_element(
    element: &Element,
    vars: &FormulaVars,
) -> Result<ResolvedPrimitive, GeometryError> {
    resolve_shape(&element.shape, vars)
        .map(|primitive| ResolvedPrimitive::new(element.id.clone(), primitive))
        .map_err(|source| GeometryError::UnresolvedElement {
            element_id: element.id.clone(),
            source: Box::new(source),
        })
}

fn resolve_shape(shape: &Shape, vars: &FormulaVars) -> Result<Primitive, GeometryError> {
    match shape {
        Shape::Rectangle { position, size } => Ok(Primitive::Rect {
            origin: resolve_point(position, vars)?,
            width: resolve_extent("size.width", &size.width, vars)?,
            height: resolve_extent("size.height", &size.height, vars)?,
            angle: 0.0,
        }),
        Shape::Line { start, end } => Ok(Primitive::Line {
            start: resolve_point(start, vars)?,
            end: resolve_point(end, vars)?,
        }),
        Shape::Circle { center, radius } => Ok(Primitive::Circle {
            center: resolve_point(center, vars)?,
            radius: resolve_extent("radius", radius, vars)?,
        }),
        Shape::Point { position, radius } => Ok(Primitive::Point {
            center: resolve_point(position, vars)?,
            radius: resolve_extent("radius", radius, vars)?,
        }),
        Shape::Arc(arc) => {
            let center = resolve_point(&arc.center, vars)?;
            let radius = resolve_extent("radius", &arc.radius, vars)?;
            let (start_angle, end_angle) = match &arc.sweep {
                ArcSweep::Angles {
                    start_angle,
                    end_angle,
                } => (evaluate(start_angle, vars)?, evaluate(end_angle, vars)?),
                ArcSweep::Quadrant { quadrant } => quadrant.angles(),
            };
            Ok(Primitive::Arc {
                center,
                radius,
                start_angle,
                end_angle,
            })
        }
    }
}

fn resolve_point(point: &PointSpec, vars: &FormulaVars) -> Result<Point2, GeometryError> {
    Ok(Point2::new(evaluate(&point.x, vars)?, evaluate(&point.y, vars)?))
}

// 尺寸/半径为负属于模板编写错误，不做截断。
fn resolve_extent(
    field: &'static str,
    value: &FormulaOrNumber,
    vars: &FormulaVars,
) -> Result<f64, GeometryError> {
    let resolved = evaluate(value, vars)?;
    if resolved < 0.0 {
        return Err(GeometryError::NegativeExtent {
            field,
            value: resolved,
        });
    }
    Ok(resolved)
}

pub(crate) fn ensure_dimension(name: &'static str, value: f64) -> Result<(), GeometryError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(GeometryError::InvalidDimensions { name, value })
    }
}
