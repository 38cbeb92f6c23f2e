//! CoreML target format: conversion from a validated ONNX graph and
//! serialization to a `.mlmodel` file.

pub mod convert;
pub mod proto;

pub use convert::convert;
pub use proto::Model;

use crate::error::Result;
use prost::Message;
use std::fs;
use std::path::Path;

impl Model {
    /// Serialize the model to disk, overwriting any existing file.
    pub fn save(&self, path: &Path) -> Result<()> {
        let bytes = self.encode_to_vec();
        fs::write(path, &bytes)?;

        tracing::info!("Wrote {} bytes to {}", bytes.len(), path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coreml::proto::*;
    use tempfile::TempDir;

    fn sample_model(description: &str) -> Model {
        Model {
            specification_version: 1,
            description: Some(ModelDescription {
                input: vec![],
                output: vec![],
                metadata: Some(Metadata {
                    short_description: description.to_string(),
                    ..Default::default()
                }),
            }),
            is_updatable: false,
            r#type: Some(model::Type::NeuralNetwork(NeuralNetwork::default())),
        }
    }

    #[test]
    fn test_save_writes_decodable_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("model.mlmodel");

        let model = sample_model("test");
        model.save(&path).unwrap();

        let bytes = fs::read(&path).unwrap();
        let decoded = Model::decode(bytes.as_slice()).unwrap();
        assert_eq!(decoded, model);
    }

    #[test]
    fn test_save_overwrites_existing_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("model.mlmodel");

        sample_model("first version, deliberately longer text")
            .save(&path)
            .unwrap();
        let first_len = fs::metadata(&path).unwrap().len();

        sample_model("second").save(&path).unwrap();
        let second_len = fs::metadata(&path).unwrap().len();

        assert_ne!(first_len, second_len);
        let decoded = Model::decode(fs::read(&path).unwrap().as_slice()).unwrap();
        assert_eq!(
            decoded
                .description
                .unwrap()
                .metadata
                .unwrap()
                .short_description,
            "second"
        );
    }

    #[test]
    fn test_save_to_missing_directory_fails() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("no_such_dir").join("model.mlmodel");

        let result = sample_model("x").save(&path);
        assert!(matches!(result, Err(crate::error::ConvertError::Io(_))));
    }
}
