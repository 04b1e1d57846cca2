pub mod cli;
pub mod errors;
pub mod loader;

use cli::{PreviewRequest, PreviewResponse};
use errors::FrontendError;
use fieldline_config::AppConfig;
use tracing::info;

/// 执行一次命令行预览。
pub fn run(config: &AppConfig, request: &PreviewRequest) -> Result<PreviewResponse, FrontendError> {
    info!(
        sport = request.sport.as_deref().unwrap_or(config.templates.default_sport.as_str()),
        validate_only = request.validate_only,
        "启动场地预览"
    );
    cli::run_preview(config, request)
}
