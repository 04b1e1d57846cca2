use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use fieldline_core::template::TemplateDefinition;
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Debug, Error)]
pub enum IoError {
    #[error("failed to read file {path:?}: {source}")]
    ReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to write file {path:?}: {source}")]
    WriteError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid template document {origin}: {source}")]
    InvalidTemplate {
        origin: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("unknown template: {0}")]
    UnknownTemplate(String),
}

pub trait TemplateLoader {
    fn load(&self, path: &Path) -> Result<TemplateDefinition, IoError>;
}

pub trait TemplateSaver {
    fn save(&self, template: &TemplateDefinition, path: &Path) -> Result<(), IoError>;
}

/// JSON 模板文档的读写入口，存储形式与模板表或文档库中的 JSON 字段一致。
#[derive(Debug, Default, Clone, Copy)]
pub struct JsonTemplateFacade;

impl JsonTemplateFacade {
    pub fn new() -> Self {
        Self
    }
}

impl TemplateLoader for JsonTemplateFacade {
    fn load(&self, path: &Path) -> Result<TemplateDefinition, IoError> {
        let data = fs::read_to_string(path).map_err(|source| IoError::ReadError {
            path: path.to_path_buf(),
            source,
        })?;
        parse_template_str(&data, &path.display().to_string())
    }
}

impl TemplateSaver for JsonTemplateFacade {
    fn save(&self, template: &TemplateDefinition, path: &Path) -> Result<(), IoError> {
        let data = serde_json::to_string_pretty(template).map_err(|source| {
            IoError::InvalidTemplate {
                origin: path.display().to_string(),
                source,
            }
        })?;
        fs::write(path, data).map_err(|source| IoError::WriteError {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// 解析 JSON 模板文本，`origin` 仅用于错误信息。
pub fn parse_template_str(data: &str, origin: &str) -> Result<TemplateDefinition, IoError> {
    serde_json::from_str(data).map_err(|source| IoError::InvalidTemplate {
        origin: origin.to_string(),
        source,
    })
}

pub mod builtin {
    use fieldline_core::template::TemplateDefinition;

    use crate::{IoError, parse_template_str};

    const SOURCES: [(&str, &str); 2] = [
        (
            "soccer_11v11",
            include_str!("../templates/soccer_11v11.json"),
        ),
        ("soccer_7v7", include_str!("../templates/soccer_7v7.json")),
    ];

    /// 内置模板的运动标识。
    pub fn sports() -> impl Iterator<Item = &'static str> {
        SOURCES.iter().map(|(sport, _)| *sport)
    }

    pub fn template(sport: &str) -> Result<TemplateDefinition, IoError> {
        let (_, source) = SOURCES
            .iter()
            .find(|(name, _)| *name == sport)
            .ok_or_else(|| IoError::UnknownTemplate(sport.to_string()))?;
        parse_template_str(source, &format!("builtin:{sport}"))
    }

    pub fn all() -> Result<Vec<TemplateDefinition>, IoError> {
        sports().map(template).collect()
    }
}

/// 模板集合：内置模板加上搜索目录中的 `*.json`，同一运动后加载者覆盖先加载者。
#[derive(Debug, Default, Clone)]
pub struct TemplateLibrary {
    templates: BTreeMap<String, TemplateDefinition>,
}

impl TemplateLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_builtins() -> Result<Self, IoError> {
        let mut library = Self::new();
        for template in builtin::all()? {
            library.insert(template);
        }
        Ok(library)
    }

    /// 插入模板，返回被覆盖的旧定义。
    pub fn insert(&mut self, template: TemplateDefinition) -> Option<TemplateDefinition> {
        self.templates.insert(template.sport.clone(), template)
    }

    /// 加载目录下全部 JSON 模板（不递归），返回成功加载的数量。
    /// 单个文件解析失败会被记录并跳过，目录本身不可读则返回错误。
    pub fn add_search_root(&mut self, root: &Path) -> Result<usize, IoError> {
        let entries = fs::read_dir(root).map_err(|source| IoError::ReadError {
            path: root.to_path_buf(),
            source,
        })?;
        let mut paths: Vec<PathBuf> = entries
            .filter_map(|entry| entry.ok().map(|entry| entry.path()))
            .filter(|path| path.extension().is_some_and(|ext| ext == "json"))
            .collect();
        paths.sort();

        let loader = JsonTemplateFacade::new();
        let mut loaded = 0;
        for path in paths {
            match loader.load(&path) {
                Ok(template) => {
                    debug!(path = %path.display(), sport = %template.sport, "已加载模板");
                    if self.insert(template).is_some() {
                        info!(path = %path.display(), "模板覆盖了同名定义");
                    }
                    loaded += 1;
                }
                Err(err) => {
                    warn!(path = %path.display(), error = %err, "跳过无法解析的模板文件");
                }
            }
        }
        Ok(loaded)
    }

    pub fn get(&self, sport: &str) -> Result<&TemplateDefinition, IoError> {
        self.templates
            .get(sport)
            .ok_or_else(|| IoError::UnknownTemplate(sport.to_string()))
    }

    pub fn sports(&self) -> impl Iterator<Item = &str> {
        self.templates.keys().map(String::as_str)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.templates.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }
}
