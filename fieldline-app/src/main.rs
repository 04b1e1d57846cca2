use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::Context;
use clap::{Parser, ValueEnum};
use fieldline_config::{AppConfig, ConfigError, OutputFormat};
use fieldline_frontend::cli::PreviewRequest;
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, fmt};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum FormatArg {
    Text,
    Json,
}

impl From<FormatArg> for OutputFormat {
    fn from(value: FormatArg) -> Self {
        match value {
            FormatArg::Text => OutputFormat::Text,
            FormatArg::Json => OutputFormat::Json,
        }
    }
}

/// 运动场地标线预览工具。
#[derive(Debug, Parser)]
#[command(name = "fieldline", version, about = "按模板生成运动场地标线几何")]
struct Cli {
    /// 配置文件路径，缺省时读取 FIELDLINE_CONFIG 或 ./config/default.toml
    #[arg(long)]
    config: Option<PathBuf>,
    /// 模板库中的运动标识
    #[arg(long)]
    sport: Option<String>,
    /// 直接读取的 JSON 模板文件
    #[arg(long)]
    template: Option<PathBuf>,
    /// 场地宽度（米）
    #[arg(long)]
    width: Option<f64>,
    /// 场地长度（米）
    #[arg(long)]
    length: Option<f64>,
    /// 旋转角度（度，顺时针）
    #[arg(long, allow_negative_numbers = true)]
    rotation: Option<f64>,
    /// 像素/米
    #[arg(long)]
    scale: Option<f64>,
    #[arg(long, allow_negative_numbers = true)]
    origin_x: Option<f64>,
    #[arg(long, allow_negative_numbers = true)]
    origin_y: Option<f64>,
    #[arg(long, value_enum)]
    format: Option<FormatArg>,
    /// 仅校验模板，不生成几何
    #[arg(long)]
    validate: bool,
}

impl Cli {
    fn preview_request(&self) -> PreviewRequest {
        PreviewRequest {
            template_path: self.template.clone(),
            sport: self.sport.clone(),
            width: self.width,
            length: self.length,
            rotation: self.rotation,
            scale: self.scale,
            origin_x: self.origin_x,
            origin_y: self.origin_y,
            format: self.format.map(OutputFormat::from),
            validate_only: self.validate,
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    // 配置告警在订阅器就绪后输出
    let (config, fallback) = match load_configuration(cli.config.as_deref()) {
        Ok(config) => (config, None),
        Err(err) => (AppConfig::default(), Some(err)),
    };
    init_logging(&config);
    if let Some(err) = fallback {
        report_config_fallback(cli.config.is_some(), &err);
    }

    match run(&cli, &config) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(err) => {
            error!(error = %err, "预览失败");
            eprintln!("错误：{err:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli, config: &AppConfig) -> anyhow::Result<bool> {
    let response = fieldline_frontend::run(config, &cli.preview_request())
        .context("无法生成场地预览")?;
    print!("{}", response.output);
    if !response.success {
        warn!("模板校验未通过");
    }
    info!(success = response.success, "预览结束");
    Ok(response.success)
}

fn load_configuration(override_path: Option<&Path>) -> Result<AppConfig, ConfigError> {
    match override_path {
        Some(path) => AppConfig::from_file(path),
        None => AppConfig::discover(),
    }
}

fn report_config_fallback(explicit: bool, err: &ConfigError) {
    let message = if explicit {
        "加载指定配置失败，使用默认配置"
    } else {
        "加载默认配置失败，使用内建默认值"
    };
    match err {
        ConfigError::Io { path, .. } | ConfigError::Parse { path, .. } => {
            warn!(path = %path.display(), error = %err, "{message}");
        }
        ConfigError::Context { .. } => {
            warn!(error = %err, "{message}");
        }
    }
}

fn init_logging(config: &AppConfig) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.logging.level.clone()))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    // 日志写入 stderr，stdout 只留给预览输出
    let subscriber = fmt().with_env_filter(filter).with_writer(std::io::stderr);
    if subscriber.try_init().is_err() {
        // 已初始化，忽略
    }
}
