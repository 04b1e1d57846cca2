pub mod geometry {
    use glam::DVec2;
    use serde::{Deserialize, Serialize};

    /// 二维点，内部以 `glam::DVec2` 表示。场地坐标系原点位于场地一角，y 轴向下。
    #[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
    pub struct Point2(pub DVec2);

    impl Point2 {
        #[inline]
        pub fn new(x: f64, y: f64) -> Self {
            Self(DVec2::new(x, y))
        }

        #[inline]
        pub fn from_vec(vec: DVec2) -> Self {
            Self(vec)
        }

        #[inline]
        pub fn x(self) -> f64 {
            self.0.x
        }

        #[inline]
        pub fn y(self) -> f64 {
            self.0.y
        }

        #[inline]
        pub fn translate(self, offset: Vector2) -> Self {
            Self(self.0 + offset.0)
        }

        #[inline]
        pub fn vector_to(self, other: Point2) -> Vector2 {
            Vector2(other.0 - self.0)
        }

        #[inline]
        pub fn scale(self, factor: f64) -> Self {
            Self(self.0 * factor)
        }

        /// 绕 `pivot` 旋转，角度单位为度。在 y 轴向下的坐标系中正角度表现为顺时针。
        pub fn rotate_about(self, pivot: Point2, degrees: f64) -> Self {
            let (sin, cos) = degrees.to_radians().sin_cos();
            let d = pivot.vector_to(self).0;
            let rotated = DVec2::new(d.x * cos - d.y * sin, d.x * sin + d.y * cos);
            Self(pivot.0 + rotated)
        }

        #[inline]
        pub fn distance(self, other: Point2) -> f64 {
            self.0.distance(other.0)
        }

        #[inline]
        pub fn as_vec2(self) -> DVec2 {
            self.0
        }
    }

    /// 二维向量。
    #[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
    pub struct Vector2(pub DVec2);

    impl Vector2 {
        #[inline]
        pub fn from_points(start: Point2, end: Point2) -> Self {
            Self(end.0 - start.0)
        }

        /// 以度为单位的极坐标向量，0° 指向 x 轴正方向，角度沿顺时针（y 向下）增加。
        #[inline]
        pub fn from_polar(length: f64, degrees: f64) -> Self {
            let (sin, cos) = degrees.to_radians().sin_cos();
            Self(DVec2::new(length * cos, length * sin))
        }
    }

    /// 轴对齐边界框，用于估算画布所需范围。
    #[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
    pub struct Bounds2D {
        min: Point2,
        max: Point2,
    }

    impl Bounds2D {
        #[inline]
        pub fn empty() -> Self {
            Self {
                min: Point2::new(f64::INFINITY, f64::INFINITY),
                max: Point2::new(f64::NEG_INFINITY, f64::NEG_INFINITY),
            }
        }

        #[inline]
        pub fn is_empty(&self) -> bool {
            self.min.x() > self.max.x() || self.min.y() > self.max.y()
        }

        #[inline]
        pub fn min(&self) -> Point2 {
            self.min
        }

        #[inline]
        pub fn max(&self) -> Point2 {
            self.max
        }

        #[inline]
        pub fn width(&self) -> f64 {
            if self.is_empty() {
                0.0
            } else {
                self.max.x() - self.min.x()
            }
        }

        #[inline]
        pub fn height(&self) -> f64 {
            if self.is_empty() {
                0.0
            } else {
                self.max.y() - self.min.y()
            }
        }

        pub fn include_point(&mut self, point: Point2) {
            if self.is_empty() {
                self.min = point;
                self.max = point;
                return;
            }
            let min_vec = self.min.as_vec2().min(point.as_vec2());
            let max_vec = self.max.as_vec2().max(point.as_vec2());
            self.min = Point2::from_vec(min_vec);
            self.max = Point2::from_vec(max_vec);
        }

        pub fn include_bounds(&mut self, other: &Bounds2D) {
            if other.is_empty() {
                return;
            }
            self.include_point(other.min);
            self.include_point(other.max);
        }

        #[inline]
        pub fn center(&self) -> Point2 {
            debug_assert!(!self.is_empty());
            let center = (self.min.as_vec2() + self.max.as_vec2()) * 0.5;
            Point2::from_vec(center)
        }
    }

}

pub mod template {
    use std::collections::{BTreeMap, BTreeSet};

    use serde::{Deserialize, Serialize};

    /// 模板中的数值：要么是以米为单位的字面量，要么是引用 `field_width` / `field_length` 的公式。
    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    #[serde(untagged)]
    pub enum FormulaOrNumber {
        Number(f64),
        Formula(String),
    }

    impl From<f64> for FormulaOrNumber {
        fn from(value: f64) -> Self {
            FormulaOrNumber::Number(value)
        }
    }

    impl From<&str> for FormulaOrNumber {
        fn from(value: &str) -> Self {
            FormulaOrNumber::Formula(value.to_string())
        }
    }

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    pub struct PointSpec {
        pub x: FormulaOrNumber,
        pub y: FormulaOrNumber,
    }

    impl PointSpec {
        pub fn new(x: impl Into<FormulaOrNumber>, y: impl Into<FormulaOrNumber>) -> Self {
            Self {
                x: x.into(),
                y: y.into(),
            }
        }
    }

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    pub struct SizeSpec {
        pub width: FormulaOrNumber,
        pub height: FormulaOrNumber,
    }

    impl SizeSpec {
        pub fn new(width: impl Into<FormulaOrNumber>, height: impl Into<FormulaOrNumber>) -> Self {
            Self {
                width: width.into(),
                height: height.into(),
            }
        }
    }

    /// 角弧的象限简写，名称表示 90° 扫掠相对角点展开的方向。
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    #[serde(rename_all = "kebab-case")]
    pub enum Quadrant {
        TopLeft,
        TopRight,
        BottomLeft,
        BottomRight,
    }

    impl Quadrant {
        /// 展开为 `(start_angle, end_angle)`，单位为度，自 x 轴正方向顺时针计。
        pub fn angles(self) -> (f64, f64) {
            match self {
                Quadrant::BottomRight => (0.0, 90.0),
                Quadrant::BottomLeft => (90.0, 180.0),
                Quadrant::TopLeft => (180.0, 270.0),
                Quadrant::TopRight => (270.0, 360.0),
            }
        }

        pub fn as_str(self) -> &'static str {
            match self {
                Quadrant::TopLeft => "top-left",
                Quadrant::TopRight => "top-right",
                Quadrant::BottomLeft => "bottom-left",
                Quadrant::BottomRight => "bottom-right",
            }
        }
    }

    /// 圆弧的扫掠范围：显式角度或象限简写，二者只能取其一。
    #[derive(Debug, Clone, PartialEq, Serialize)]
    #[serde(untagged)]
    pub enum ArcSweep {
        Angles {
            #[serde(rename = "startAngle")]
            start_angle: FormulaOrNumber,
            #[serde(rename = "endAngle")]
            end_angle: FormulaOrNumber,
        },
        Quadrant {
            quadrant: Quadrant,
        },
    }

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    #[serde(try_from = "RawArcShape")]
    pub struct ArcShape {
        pub center: PointSpec,
        pub radius: FormulaOrNumber,
        #[serde(flatten)]
        pub sweep: ArcSweep,
    }

    #[derive(Deserialize)]
    #[serde(rename_all = "camelCase")]
    struct RawArcShape {
        center: PointSpec,
        radius: FormulaOrNumber,
        start_angle: Option<FormulaOrNumber>,
        end_angle: Option<FormulaOrNumber>,
        quadrant: Option<Quadrant>,
    }

    impl TryFrom<RawArcShape> for ArcShape {
        type Error = String;

        fn try_from(raw: RawArcShape) -> Result<Self, Self::Error> {
            let sweep = match (raw.start_angle, raw.end_angle, raw.quadrant) {
                (Some(start_angle), Some(end_angle), None) => ArcSweep::Angles {
                    start_angle,
                    end_angle,
                },
                (None, None, Some(quadrant)) => ArcSweep::Quadrant { quadrant },
                (None, None, None) => {
                    return Err("arc needs either `startAngle`/`endAngle` or `quadrant`".to_string());
                }
                (_, _, Some(quadrant)) => {
                    return Err(format!(
                        "arc cannot combine `quadrant: {}` with `startAngle`/`endAngle`",
                        quadrant.as_str()
                    ));
                }
                (Some(_), None, None) => return Err("arc has `startAngle` without `endAngle`".to_string()),
                (None, Some(_), None) => return Err("arc has `endAngle` without `startAngle`".to_string()),
            };
            Ok(Self {
                center: raw.center,
                radius: raw.radius,
                sweep,
            })
        }
    }

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    #[serde(tag = "type", rename_all = "lowercase")]
    pub enum Shape {
        Rectangle {
            position: PointSpec,
            size: SizeSpec,
        },
        Line {
            start: PointSpec,
            end: PointSpec,
        },
        Circle {
            center: PointSpec,
            radius: FormulaOrNumber,
        },
        /// 实心圆点，例如中点或罚球点。
        Point {
            position: PointSpec,
            radius: FormulaOrNumber,
        },
        Arc(ArcShape),
    }

    impl Shape {
        pub fn kind(&self) -> &'static str {
            match self {
                Shape::Rectangle { .. } => "rectangle",
                Shape::Line { .. } => "line",
                Shape::Circle { .. } => "circle",
                Shape::Point { .. } => "point",
                Shape::Arc(_) => "arc",
            }
        }

        /// 按声明顺序列出元素内的全部数值字段及其路径名。
        pub fn values(&self) -> Vec<(&'static str, &FormulaOrNumber)> {
            match self {
                Shape::Rectangle { position, size } => vec![
                    ("position.x", &position.x),
                    ("position.y", &position.y),
                    ("size.width", &size.width),
                    ("size.height", &size.height),
                ],
                Shape::Line { start, end } => vec![
                    ("start.x", &start.x),
                    ("start.y", &start.y),
                    ("end.x", &end.x),
                    ("end.y", &end.y),
                ],
                Shape::Circle { center, radius } => vec![
                    ("center.x", &center.x),
                    ("center.y", &center.y),
                    ("radius", radius),
                ],
                Shape::Point { position, radius } => vec![
                    ("position.x", &position.x),
                    ("position.y", &position.y),
                    ("radius", radius),
                ],
                Shape::Arc(arc) => {
                    let mut values = vec![
                        ("center.x", &arc.center.x),
                        ("center.y", &arc.center.y),
                        ("radius", &arc.radius),
                    ];
                    if let ArcSweep::Angles {
                        start_angle,
                        end_angle,
                    } = &arc.sweep
                    {
                        values.push(("startAngle", start_angle));
                        values.push(("endAngle", end_angle));
                    }
                    values
                }
            }
        }
    }

    /// 模板中的单个可绘制元素，`id` 用于追踪解析结果的来源。
    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    pub struct Element {
        pub id: String,
        #[serde(flatten)]
        pub shape: Shape,
    }

    impl Element {
        pub fn new(id: impl Into<String>, shape: Shape) -> Self {
            Self {
                id: id.into(),
                shape,
            }
        }
    }

    /// 某项运动的规则场地模板。元素顺序即渲染层级。
    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct TemplateDefinition {
        pub sport: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pub name: Option<String>,
        pub min_length: f64,
        pub max_length: f64,
        pub min_width: f64,
        pub max_width: f64,
        pub default_length: f64,
        pub default_width: f64,
        pub elements: Vec<Element>,
        /// 尺寸不随场地缩放的元素 ID，仅作提示用途，不影响公式求值。
        #[serde(default)]
        pub fixed_elements: BTreeSet<String>,
        #[serde(default)]
        pub specifications: BTreeMap<String, f64>,
    }

    impl TemplateDefinition {
        pub fn element(&self, id: &str) -> Option<&Element> {
            self.elements.iter().find(|element| element.id == id)
        }

        #[inline]
        pub fn is_fixed(&self, id: &str) -> bool {
            self.fixed_elements.contains(id)
        }

        #[inline]
        pub fn accepts_length(&self, length: f64) -> bool {
            length >= self.min_length && length <= self.max_length
        }

        #[inline]
        pub fn accepts_width(&self, width: f64) -> bool {
            width >= self.min_width && width <= self.max_width
        }

        /// 展示名称，缺省时退化为运动标识。
        pub fn display_name(&self) -> &str {
            self.name.as_deref().unwrap_or(&self.sport)
        }
    }
}

pub mod primitive {
    use serde::{Deserialize, Serialize};

    use crate::geometry::{Bounds2D, Point2, Vector2};

    /// 解析后的具体图元。坐标单位取决于所处阶段：构建阶段为米，投影后为像素。
    /// 所有角度单位为度，自 x 轴正方向顺时针计。
    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    #[serde(tag = "kind", rename_all = "snake_case")]
    pub enum Primitive {
        /// `origin` 为矩形未旋转时的左上角，`angle` 为绕该角点的旋转量。
        Rect {
            origin: Point2,
            width: f64,
            height: f64,
            angle: f64,
        },
        Line {
            start: Point2,
            end: Point2,
        },
        Circle {
            center: Point2,
            radius: f64,
        },
        Point {
            center: Point2,
            radius: f64,
        },
        Arc {
            center: Point2,
            radius: f64,
            start_angle: f64,
            end_angle: f64,
        },
    }

    impl Primitive {
        pub fn kind(&self) -> &'static str {
            match self {
                Primitive::Rect { .. } => "rect",
                Primitive::Line { .. } => "line",
                Primitive::Circle { .. } => "circle",
                Primitive::Point { .. } => "point",
                Primitive::Arc { .. } => "arc",
            }
        }

        /// 矩形的四个角点，按 origin、沿宽度、对角、沿高度的顺序。
        pub fn rect_corners(origin: Point2, width: f64, height: f64, angle: f64) -> [Point2; 4] {
            let along_width = Vector2::from_polar(width, angle);
            let along_height = Vector2::from_polar(height, angle + 90.0);
            let far = origin.translate(along_width).translate(along_height);
            [
                origin,
                origin.translate(along_width),
                far,
                origin.translate(along_height),
            ]
        }

        pub fn bounds(&self) -> Bounds2D {
            let mut bounds = Bounds2D::empty();
            match self {
                Primitive::Rect {
                    origin,
                    width,
                    height,
                    angle,
                } => {
                    for corner in Self::rect_corners(*origin, *width, *height, *angle) {
                        bounds.include_point(corner);
                    }
                }
                Primitive::Line { start, end } => {
                    bounds.include_point(*start);
                    bounds.include_point(*end);
                }
                Primitive::Circle { center, radius } | Primitive::Point { center, radius } => {
                    let radius = radius.abs();
                    bounds.include_point(Point2::new(center.x() - radius, center.y() - radius));
                    bounds.include_point(Point2::new(center.x() + radius, center.y() + radius));
                }
                Primitive::Arc {
                    center,
                    radius,
                    start_angle,
                    end_angle,
                } => arc_bounds(*center, *radius, *start_angle, *end_angle, &mut bounds),
            }
            bounds
        }
    }

    /// 构建结果：一个图元及其来源元素 ID。
    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    pub struct ResolvedPrimitive {
        pub element_id: String,
        #[serde(flatten)]
        pub primitive: Primitive,
    }

    impl ResolvedPrimitive {
        pub fn new(element_id: impl Into<String>, primitive: Primitive) -> Self {
            Self {
                element_id: element_id.into(),
                primitive,
            }
        }
    }

    /// 图元列表整体的包围盒，空列表返回 `None`。
    pub fn bounds_of<'a>(primitives: impl IntoIterator<Item = &'a ResolvedPrimitive>) -> Option<Bounds2D> {
        let mut bounds = Bounds2D::empty();
        for resolved in primitives {
            bounds.include_bounds(&resolved.primitive.bounds());
        }
        if bounds.is_empty() { None } else { Some(bounds) }
    }

    fn canonical_interval(start: f64, end: f64) -> (f64, f64) {
        if (end - start).abs() >= 360.0 {
            return (0.0, 360.0);
        }
        let start = start.rem_euclid(360.0);
        let mut end = end.rem_euclid(360.0);
        if (end - start).abs() < 1e-9 {
            end = start + 360.0;
        } else if end < start {
            end += 360.0;
        }
        (start, end)
    }

    fn arc_bounds(center: Point2, radius: f64, start: f64, end: f64, bounds: &mut Bounds2D) {
        let radius = radius.abs();
        if radius <= f64::EPSILON {
            bounds.include_point(center);
            return;
        }

        let (start, end) = canonical_interval(start, end);
        bounds.include_point(center.translate(Vector2::from_polar(radius, start)));
        bounds.include_point(center.translate(Vector2::from_polar(radius, end)));

        const AXES: [f64; 4] = [0.0, 90.0, 180.0, 270.0];
        for base in AXES {
            let mut candidate = base;
            while candidate < start {
                candidate += 360.0;
            }
            if candidate <= end {
                bounds.include_point(center.translate(Vector2::from_polar(radius, candidate)));
            }
        }
    }

}

pub mod field {
    use serde::{Deserialize, Serialize};

    /// 某次预订/设计的场地参数，由外部协作方创建，引擎只读取。
    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct FieldConfiguration {
        pub length_meters: f64,
        pub width_meters: f64,
        #[serde(default)]
        pub rotation_degrees: f64,
        pub scale_pixels_per_meter: f64,
        #[serde(default = "FieldConfiguration::default_line_color")]
        pub line_color: String,
    }

    impl FieldConfiguration {
        pub fn new(width_meters: f64, length_meters: f64, scale_pixels_per_meter: f64) -> Self {
            Self {
                length_meters,
                width_meters,
                rotation_degrees: 0.0,
                scale_pixels_per_meter,
                line_color: Self::default_line_color(),
            }
        }

        pub fn with_rotation(mut self, degrees: f64) -> Self {
            self.rotation_degrees = degrees;
            self
        }

        fn default_line_color() -> String {
            "#ffffff".to_string()
        }

        /// 旋转角归一化到 `[0, 360)`。
        #[inline]
        pub fn normalized_rotation(&self) -> f64 {
            self.rotation_degrees.rem_euclid(360.0)
        }
    }
}
