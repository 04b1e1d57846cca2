use std::env;
use std::path::PathBuf;

use fieldline_config::AppConfig;
use fieldline_core::template::TemplateDefinition;
use fieldline_io::{JsonTemplateFacade, TemplateLibrary, TemplateLoader};
use tracing::{info, warn};

use crate::errors::FrontendError;

/// 模板来源，便于前端呈现加载信息。
#[derive(Debug, Clone, PartialEq)]
pub enum TemplateSource {
    File(PathBuf),
    Library(String),
}

#[derive(Debug)]
pub struct LoadedTemplate {
    pub template: TemplateDefinition,
    pub source: TemplateSource,
}

/// 按优先级解析模板：显式路径 → 环境变量 `FIELDLINE_TEMPLATE_PATH` → 模板库（内置 + 配置的搜索目录）。
pub fn load_template(
    config: &AppConfig,
    explicit_path: Option<PathBuf>,
    sport: Option<&str>,
) -> Result<LoadedTemplate, FrontendError> {
    let path = explicit_path.or_else(|| env::var_os("FIELDLINE_TEMPLATE_PATH").map(PathBuf::from));
    if let Some(path) = path {
        let template = JsonTemplateFacade::new().load(&path)?;
        info!(path = %path.display(), sport = %template.sport, "从文件加载模板成功");
        return Ok(LoadedTemplate {
            template,
            source: TemplateSource::File(path),
        });
    }

    let library = build_library(config)?;
    let sport = sport.unwrap_or(config.templates.default_sport.as_str());
    let template = library.get(sport)?.clone();
    info!(sport, "从模板库加载模板");
    Ok(LoadedTemplate {
        template,
        source: TemplateSource::Library(sport.to_string()),
    })
}

/// 内置模板加上配置中的搜索目录；不可读的目录仅记录警告。
pub fn build_library(config: &AppConfig) -> Result<TemplateLibrary, FrontendError> {
    let mut library = TemplateLibrary::with_builtins()?;
    for root in &config.templates.search_roots {
        match library.add_search_root(root) {
            Ok(count) => info!(root = %root.display(), count, "已加载模板目录"),
            Err(err) => warn!(root = %root.display(), error = %err, "模板目录不可用，已跳过"),
        }
    }
    Ok(library)
}
