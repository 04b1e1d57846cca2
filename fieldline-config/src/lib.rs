use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

/// 应用配置的根结构。
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub render: RenderConfig,
    #[serde(default)]
    pub templates: TemplateConfig,
}

impl AppConfig {
    /// 从显式路径加载配置。
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// 自动发现配置文件：优先读取环境变量 `FIELDLINE_CONFIG`，否则寻找 `./config/default.toml`。
    /// 若文件缺失，则返回默认配置。
    pub fn discover() -> Result<Self, ConfigError> {
        if let Some(path) = env::var_os("FIELDLINE_CONFIG") {
            return Self::from_file(PathBuf::from(path));
        }

        let default_path = env::current_dir()
            .map(|dir| dir.join("config").join("default.toml"))
            .map_err(|source| ConfigError::Context {
                message: "获取当前工作目录失败".to_string(),
                source,
            })?;

        if default_path.exists() {
            Self::from_file(default_path)
        } else {
            Ok(Self::default())
        }
    }
}

/// 日志配置，支持设置默认等级。
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "LoggingConfig::default_level")]
    pub level: String,
}

impl LoggingConfig {
    fn default_level() -> String {
        "info".to_string()
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: Self::default_level(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// 渲染默认参数，命令行未指定时使用。
#[derive(Debug, Clone, Deserialize)]
pub struct RenderConfig {
    #[serde(default = "RenderConfig::default_scale")]
    pub scale_pixels_per_meter: f64,
    #[serde(default)]
    pub origin_x: f64,
    #[serde(default)]
    pub origin_y: f64,
    #[serde(default = "RenderConfig::default_line_color")]
    pub line_color: String,
    #[serde(default)]
    pub output_format: OutputFormat,
}

impl RenderConfig {
    fn default_scale() -> f64 {
        10.0
    }

    fn default_line_color() -> String {
        "#ffffff".to_string()
    }
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            scale_pixels_per_meter: Self::default_scale(),
            origin_x: 0.0,
            origin_y: 0.0,
            line_color: Self::default_line_color(),
            output_format: OutputFormat::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct TemplateConfig {
    #[serde(default)]
    pub search_roots: Vec<PathBuf>,
    #[serde(default = "TemplateConfig::default_sport")]
    pub default_sport: String,
}

impl TemplateConfig {
    fn default_sport() -> String {
        "soccer_11v11".to_string()
    }
}

impl Default for TemplateConfig {
    fn default() -> Self {
        Self {
            search_roots: Vec::new(),
            default_sport: Self::default_sport(),
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("读取配置文件 {path:?} 失败: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("解析配置文件 {path:?} 失败: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("{message}")]
    Context {
        message: String,
        #[source]
        source: std::io::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_are_used_for_missing_sections() {
        let cfg: AppConfig = toml::from_str("").expect("empty config parses");
        assert_eq!(cfg.logging.level, "info");
        assert_eq!(cfg.render.output_format, OutputFormat::Text);
        assert!((cfg.render.scale_pixels_per_meter - 10.0).abs() < f64::EPSILON);
        assert_eq!(cfg.render.line_color, "#ffffff");
        assert!(cfg.templates.search_roots.is_empty());
        assert_eq!(cfg.templates.default_sport, "soccer_11v11");
    }

    #[test]
    fn load_from_temp_file() {
        let mut file = tempfile::NamedTempFile::new().expect("create temp file");
        writeln!(
            file,
            r##"
            [logging]
            level = "debug"

            [render]
            scale_pixels_per_meter = 4.5
            origin_x = 20.0
            line_color = "#f0f0f0"
            output_format = "json"

            [templates]
            search_roots = ["./templates", "/srv/fieldline/templates"]
            default_sport = "soccer_7v7"
            "##
        )
        .unwrap();

        let cfg = AppConfig::from_file(file.path()).expect("load config");
        assert_eq!(cfg.logging.level, "debug");
        assert!((cfg.render.scale_pixels_per_meter - 4.5).abs() < f64::EPSILON);
        assert!((cfg.render.origin_x - 20.0).abs() < f64::EPSILON);
        assert!(cfg.render.origin_y.abs() < f64::EPSILON);
        assert_eq!(cfg.render.line_color, "#f0f0f0");
        assert_eq!(cfg.render.output_format, OutputFormat::Json);
        assert_eq!(cfg.templates.search_roots.len(), 2);
        assert_eq!(cfg.templates.default_sport, "soccer_7v7");
    }

    #[test]
    fn parse_errors_carry_the_path() {
        let mut file = tempfile::NamedTempFile::new().expect("create temp file");
        writeln!(file, "[render]\nscale_pixels_per_meter = \"wide\"").unwrap();
        let err = AppConfig::from_file(file.path()).unwrap_err();
        match err {
            ConfigError::Parse { path, .. } => assert_eq!(path, file.path()),
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let err = AppConfig::from_file(dir.path().join("absent.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
