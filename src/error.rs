use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Browser connection failed: {0}")]
    Connect(String),

    #[error("Element not found: {0}")]
    ElementNotFound(String),

    #[error("Timeout waiting for: {0}")]
    Timeout(String),

    #[error("JavaScript error: {0}")]
    JsError(String),

    #[error("Input dispatch failed: {0}")]
    Input(String),

    #[error("Workbook error: {0}")]
    Workbook(String),

    #[error("CDP error: {0}")]
    CdpError(#[from] chromiumoxide::error::CdpError),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
