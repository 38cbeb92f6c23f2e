pub mod coreml;
pub mod error;
pub mod fetch;
pub mod onnx;

pub use error::{ConvertError, Result};
