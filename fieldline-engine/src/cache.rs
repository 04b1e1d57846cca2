use std::collections::HashMap;
use std::sync::Arc;

use fieldline_core::field::FieldConfiguration;
use fieldline_core::geometry::Point2;
use fieldline_core::primitive::ResolvedPrimitive;
use fieldline_core::template::TemplateDefinition;
use tracing::debug;

use crate::errors::RenderError;
use crate::field::render_field;

/// 渲染结果缓存键。浮点参数按位比较，`-0.0` 与 `0.0` 视为相同。
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RenderKey {
    template_id: String,
    width: u64,
    length: u64,
    scale: u64,
    rotation: u64,
    origin_x: u64,
    origin_y: u64,
}

impl RenderKey {
    pub fn new(
        template_id: impl Into<String>,
        width: f64,
        length: f64,
        scale: f64,
        rotation_degrees: f64,
        origin: Point2,
    ) -> Self {
        Self {
            template_id: template_id.into(),
            width: bits(width),
            length: bits(length),
            scale: bits(scale),
            rotation: bits(rotation_degrees.rem_euclid(360.0)),
            origin_x: bits(origin.x()),
            origin_y: bits(origin.y()),
        }
    }

    pub fn for_configuration(
        template: &TemplateDefinition,
        configuration: &FieldConfiguration,
        origin: Point2,
    ) -> Self {
        Self::new(
            template.sport.clone(),
            configuration.width_meters,
            configuration.length_meters,
            configuration.scale_pixels_per_meter,
            configuration.rotation_degrees,
            origin,
        )
    }

    #[inline]
    pub fn template_id(&self) -> &str {
        &self.template_id
    }
}

#[inline]
fn bits(value: f64) -> u64 {
    (value + 0.0).to_bits()
}

/// 由调用方持有的渲染缓存。引擎只在未命中时写入，失效策略完全由调用方决定。
#[derive(Debug, Default)]
pub struct RenderCache {
    entries: HashMap<RenderKey, Arc<[ResolvedPrimitive]>>,
}

impl RenderCache {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn get(&self, key: &RenderKey) -> Option<Arc<[ResolvedPrimitive]>> {
        self.entries.get(key).cloned()
    }

    pub fn insert(
        &mut self,
        key: RenderKey,
        primitives: Vec<ResolvedPrimitive>,
    ) -> Arc<[ResolvedPrimitive]> {
        let shared: Arc<[ResolvedPrimitive]> = primitives.into();
        self.entries.insert(key, Arc::clone(&shared));
        shared
    }

    /// 移除某个模板的全部缓存项，返回移除数量。
    pub fn invalidate_template(&mut self, template_id: &str) -> usize {
        let before = self.entries.len();
        self.entries.retain(|key, _| key.template_id != template_id);
        before - self.entries.len()
    }

    #[inline]
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// 经由缓存执行 `render_field`，命中时直接返回共享结果。
pub fn render_cached(
    cache: &mut RenderCache,
    template: &TemplateDefinition,
    configuration: &FieldConfiguration,
    origin: Point2,
) -> Result<Arc<[ResolvedPrimitive]>, RenderError> {
    let key = RenderKey::for_configuration(template, configuration, origin);
    if let Some(hit) = cache.get(&key) {
        debug!(sport = %template.sport, "渲染缓存命中");
        return Ok(hit);
    }
    let rendered = render_field(template, configuration, origin)?;
    Ok(cache.insert(key, rendered.primitives))
}
