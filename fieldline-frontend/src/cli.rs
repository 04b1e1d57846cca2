use std::fmt::Write as _;
use std::path::PathBuf;

use fieldline_config::{AppConfig, OutputFormat};
use fieldline_core::field::FieldConfiguration;
use fieldline_core::geometry::{Bounds2D, Point2};
use fieldline_core::primitive::{Primitive, ResolvedPrimitive};
use fieldline_core::template::TemplateDefinition;
use fieldline_engine::field::{RenderedField, fixed_element_warnings, render_field};
use fieldline_engine::validation::{has_errors, validate_template};
use serde::Serialize;
use tracing::{info, warn};

use crate::errors::FrontendError;
use crate::loader::{TemplateSource, load_template};

/// 一次命令行预览请求，未指定的参数取自配置或模板默认值。
#[derive(Debug, Clone, Default)]
pub struct PreviewRequest {
    pub template_path: Option<PathBuf>,
    pub sport: Option<String>,
    pub width: Option<f64>,
    pub length: Option<f64>,
    pub rotation: Option<f64>,
    pub scale: Option<f64>,
    pub origin_x: Option<f64>,
    pub origin_y: Option<f64>,
    pub format: Option<OutputFormat>,
    pub validate_only: bool,
}

#[derive(Debug, Clone)]
pub struct PreviewResponse {
    pub success: bool,
    pub output: String,
}

/// 供外部渲染器消费的 JSON 文档。
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RenderDocument<'a> {
    sport: &'a str,
    line_color: &'a str,
    width_meters: f64,
    length_meters: f64,
    rotation_degrees: f64,
    scale_pixels_per_meter: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    bounds: Option<Bounds2D>,
    fixed_element_warnings: Vec<&'a str>,
    primitives: &'a [ResolvedPrimitive],
}

/// 执行预览或校验，返回待打印的文本。
pub fn run_preview(
    config: &AppConfig,
    request: &PreviewRequest,
) -> Result<PreviewResponse, FrontendError> {
    let loaded = load_template(
        config,
        request.template_path.clone(),
        request.sport.as_deref(),
    )?;
    let template = &loaded.template;

    if request.validate_only {
        return Ok(validation_report(template, &loaded.source));
    }

    let configuration = FieldConfiguration {
        length_meters: request.length.unwrap_or(template.default_length),
        width_meters: request.width.unwrap_or(template.default_width),
        rotation_degrees: request.rotation.unwrap_or(0.0),
        scale_pixels_per_meter: request.scale.unwrap_or(config.render.scale_pixels_per_meter),
        line_color: config.render.line_color.clone(),
    };
    let origin = Point2::new(
        request.origin_x.unwrap_or(config.render.origin_x),
        request.origin_y.unwrap_or(config.render.origin_y),
    );

    let rendered = render_field(template, &configuration, origin)?;
    let warnings = fixed_element_warnings(
        template,
        configuration.width_meters,
        configuration.length_meters,
    );
    if !warnings.is_empty() {
        warn!(count = warnings.len(), "场地尺寸偏离默认值，固定尺寸标线不会随之缩放");
    }
    info!(
        sport = %template.sport,
        primitive_count = rendered.primitives.len(),
        "预览渲染完成"
    );

    let output = match request.format.unwrap_or(config.render.output_format) {
        OutputFormat::Json => {
            let document = RenderDocument {
                sport: &template.sport,
                line_color: &rendered.line_color,
                width_meters: configuration.width_meters,
                length_meters: configuration.length_meters,
                rotation_degrees: configuration.normalized_rotation(),
                scale_pixels_per_meter: configuration.scale_pixels_per_meter,
                bounds: rendered.bounds,
                fixed_element_warnings: warnings,
                primitives: &rendered.primitives,
            };
            serde_json::to_string_pretty(&document)?
        }
        OutputFormat::Text => text_listing(
            template,
            &loaded.source,
            &configuration,
            &rendered,
            &warnings,
        ),
    };

    Ok(PreviewResponse {
        success: true,
        output,
    })
}

fn validation_report(template: &TemplateDefinition, source: &TemplateSource) -> PreviewResponse {
    let issues = validate_template(template);
    let mut out = String::new();
    let _ = writeln!(out, "模板校验：{}（{}）", template.display_name(), describe_source(source));
    if issues.is_empty() {
        let _ = writeln!(out, "未发现问题。");
    }
    for issue in &issues {
        let _ = writeln!(out, "  - {issue}");
    }
    PreviewResponse {
        success: !has_errors(&issues),
        output: out,
    }
}

fn describe_source(source: &TemplateSource) -> String {
    match source {
        TemplateSource::File(path) => format!("文件 {}", path.display()),
        TemplateSource::Library(sport) => format!("模板库 {sport}"),
    }
}

fn text_listing(
    template: &TemplateDefinition,
    source: &TemplateSource,
    configuration: &FieldConfiguration,
    rendered: &RenderedField,
    warnings: &[&str],
) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "场地模板：{}（{}）",
        template.display_name(),
        describe_source(source)
    );
    let _ = writeln!(
        out,
        "场地尺寸：宽 {:.2} m × 长 {:.2} m，旋转 {:.2}°，比例 {:.2} px/m，线色 {}",
        configuration.width_meters,
        configuration.length_meters,
        configuration.normalized_rotation(),
        configuration.scale_pixels_per_meter,
        rendered.line_color
    );
    if let Some(bounds) = rendered.bounds {
        let _ = writeln!(
            out,
            "画布范围：({:.2}, {:.2}) - ({:.2}, {:.2})",
            bounds.min().x(),
            bounds.min().y(),
            bounds.max().x(),
            bounds.max().y()
        );
    }
    if !warnings.is_empty() {
        let _ = writeln!(out, "注意：以下固定尺寸元素不随场地缩放：{}", warnings.join(", "));
    }
    let _ = writeln!(out, "图元列表：");
    for resolved in &rendered.primitives {
        let _ = writeln!(out, "  - {}", describe_primitive(resolved));
    }
    out
}

fn describe_primitive(resolved: &ResolvedPrimitive) -> String {
    let id = &resolved.element_id;
    match &resolved.primitive {
        Primitive::Rect {
            origin,
            width,
            height,
            angle,
        } => format!(
            "矩形 #{id}, 角点=({:.2}, {:.2}), 宽={width:.2}, 高={height:.2}, 角度={angle:.2}",
            origin.x(),
            origin.y()
        ),
        Primitive::Line { start, end } => format!(
            "线段 #{id}, 起点=({:.2}, {:.2}), 终点=({:.2}, {:.2})",
            start.x(),
            start.y(),
            end.x(),
            end.y()
        ),
        Primitive::Circle { center, radius } => format!(
            "圆 #{id}, 圆心=({:.2}, {:.2}), 半径={radius:.2}",
            center.x(),
            center.y()
        ),
        Primitive::Point { center, radius } => format!(
            "圆点 #{id}, 位置=({:.2}, {:.2}), 半径={radius:.2}",
            center.x(),
            center.y()
        ),
        Primitive::Arc {
            center,
            radius,
            start_angle,
            end_angle,
        } => format!(
            "圆弧 #{id}, 圆心=({:.2}, {:.2}), 半径={radius:.2}, 角度={start_angle:.2}°→{end_angle:.2}°",
            center.x(),
            center.y()
        ),
    }
}
