use thiserror::Error;

/// Main error type for mlconvert
#[derive(Error, Debug)]
pub enum ConvertError {
    #[error("Network error: {0}\n\nTroubleshooting:\n- Check internet connection\n- Verify the release URL is reachable (github.com)\n- If behind a proxy, set HTTPS_PROXY")]
    Network(String),

    #[error("Archive extraction error: {0}\n\nTroubleshooting:\n- The download may be corrupt or incomplete\n- Delete the model directory and re-run to fetch a fresh copy")]
    Extraction(String),

    #[error("Model load error: {0}")]
    Load(String),

    #[error("Schema validation error: {0}")]
    SchemaValidation(String),

    #[error("Unsupported operator '{op}' in node '{node}' - no CoreML equivalent")]
    UnsupportedOperator { op: String, node: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ConvertError>;
