//! ONNX model loading and schema validation.

pub mod check;
pub mod proto;

pub use check::check_model;
pub use proto::{GraphProto, ModelProto, NodeProto, TensorProto, ValueInfoProto};

use crate::error::{ConvertError, Result};
use prost::Message;
use std::fs;
use std::path::Path;

/// Load an ONNX model from disk.
///
/// Fails with `ConvertError::Load` if the file is missing or is not a
/// decodable ONNX protobuf. Structural validity is a separate concern,
/// see [`check_model`].
pub fn load(path: &Path) -> Result<ModelProto> {
    let bytes = fs::read(path)
        .map_err(|e| ConvertError::Load(format!("Failed to read {}: {e}", path.display())))?;

    let model = ModelProto::decode(bytes.as_slice())
        .map_err(|e| ConvertError::Load(format!("Failed to parse {}: {e}", path.display())))?;

    tracing::info!(
        "Loaded ONNX model from {} (ir_version {}, producer '{}')",
        path.display(),
        model.ir_version,
        model.producer_name
    );

    Ok(model)
}
