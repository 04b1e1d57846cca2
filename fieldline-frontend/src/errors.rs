use fieldline_engine::errors::RenderError;
use fieldline_io::IoError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FrontendError {
    #[error(transparent)]
    Template(#[from] IoError),
    #[error(transparent)]
    Render(#[from] RenderError),
    #[error("无法编码渲染结果: {0}")]
    Encode(#[from] serde_json::Error),
}
