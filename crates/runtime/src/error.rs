use crate::model::ModelError;
use crate::tools::McpError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Model(#[from] ModelError),

    #[error("tool host: {0}")]
    ToolHost(McpError),
}

pub type Result<T> = std::result::Result<T, Error>;
