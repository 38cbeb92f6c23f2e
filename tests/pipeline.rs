//! End-to-end pipeline test: a synthetic single-operator ONNX model goes
//! through fetch (cache hit), validation, conversion, and persistence,
//! and the written .mlmodel decodes back with the same feature names and
//! shapes.

use mlconvert::coreml;
use mlconvert::fetch;
use mlconvert::onnx::proto::{
    tensor_shape_proto, type_proto, AttributeProto, DataType, GraphProto, ModelProto, NodeProto,
    OperatorSetIdProto, TensorProto, TensorShapeProto, TypeProto, ValueInfoProto,
};
use mlconvert::onnx::{self, check_model};
use prost::Message;
use std::fs;
use tempfile::TempDir;

fn tensor_value_info(name: &str, dims: &[i64]) -> ValueInfoProto {
    ValueInfoProto {
        name: name.to_string(),
        r#type: Some(TypeProto {
            value: Some(type_proto::Value::TensorType(type_proto::Tensor {
                elem_type: DataType::Float as i32,
                shape: Some(TensorShapeProto {
                    dim: dims
                        .iter()
                        .map(|&d| tensor_shape_proto::Dimension {
                            value: Some(tensor_shape_proto::dimension::Value::DimValue(d)),
                        })
                        .collect(),
                }),
            })),
        }),
        doc_string: String::new(),
    }
}

/// Minimal valid graph: one input, one Gemm, one output. Stands in for
/// the real w600k_r50 recognition model.
fn synthetic_model() -> ModelProto {
    ModelProto {
        ir_version: 7,
        producer_name: "pipeline-test".to_string(),
        opset_import: vec![OperatorSetIdProto {
            domain: String::new(),
            version: 13,
        }],
        graph: Some(GraphProto {
            name: "w600k_r50_stub".to_string(),
            input: vec![tensor_value_info("data", &[1, 4])],
            output: vec![tensor_value_info("embedding", &[1, 3])],
            initializer: vec![TensorProto {
                dims: vec![3, 4],
                data_type: DataType::Float as i32,
                float_data: (0..12).map(|v| v as f32 * 0.1).collect(),
                name: "fc_weight".to_string(),
                ..Default::default()
            }],
            node: vec![NodeProto {
                name: "fc".to_string(),
                op_type: "Gemm".to_string(),
                input: vec!["data".to_string(), "fc_weight".to_string()],
                output: vec!["embedding".to_string()],
                attribute: vec![AttributeProto {
                    name: "transB".to_string(),
                    i: 1,
                    ..Default::default()
                }],
                ..Default::default()
            }],
            ..Default::default()
        }),
        ..Default::default()
    }
}

fn feature_shape(f: &coreml::proto::FeatureDescription) -> Vec<i64> {
    match f.r#type.as_ref().unwrap().r#type.as_ref().unwrap() {
        coreml::proto::feature_type::Type::MultiArrayType(arr) => arr.shape.clone(),
    }
}

#[test]
fn test_full_pipeline_roundtrip() {
    let temp_dir = TempDir::new().unwrap();
    let model_dir = temp_dir.path().join("buffalo_l");
    let onnx_path = model_dir.join("w600k_r50.onnx");
    let output_path = temp_dir.path().join("BuffaloL.mlmodel");

    // Seed the "already fetched" state
    fs::create_dir_all(&model_dir).unwrap();
    fs::write(&onnx_path, synthetic_model().encode_to_vec()).unwrap();

    // Step 1: directory exists, so this must not touch the network
    fetch::ensure_model(
        "https://model.invalid/buffalo_l.zip",
        &model_dir,
        &temp_dir.path().join("buffalo_l.zip"),
    )
    .unwrap();

    // Step 2
    let onnx_model = onnx::load(&onnx_path).unwrap();
    check_model(&onnx_model).unwrap();

    // Step 3
    let mlmodel = coreml::convert(&onnx_model).unwrap();

    // Step 4
    mlmodel.save(&output_path).unwrap();
    assert!(output_path.exists());

    // Loaded back, the output reports the same feature names and shapes
    let bytes = fs::read(&output_path).unwrap();
    let decoded = coreml::Model::decode(bytes.as_slice()).unwrap();
    let desc = decoded.description.unwrap();

    assert_eq!(desc.input.len(), 1);
    assert_eq!(desc.input[0].name, "data");
    assert_eq!(feature_shape(&desc.input[0]), vec![1, 4]);

    assert_eq!(desc.output.len(), 1);
    assert_eq!(desc.output[0].name, "embedding");
    assert_eq!(feature_shape(&desc.output[0]), vec![1, 3]);
}

#[test]
fn test_pipeline_repeated_run_overwrites_output() {
    let temp_dir = TempDir::new().unwrap();
    let output_path = temp_dir.path().join("BuffaloL.mlmodel");

    let mlmodel = coreml::convert(&synthetic_model()).unwrap();

    mlmodel.save(&output_path).unwrap();
    let first = fs::read(&output_path).unwrap();

    mlmodel.save(&output_path).unwrap();
    let second = fs::read(&output_path).unwrap();

    // Same content, freshly written (truncate semantics, no append)
    assert_eq!(first, second);
}

#[test]
fn test_pipeline_rejects_malformed_model_file() {
    let temp_dir = TempDir::new().unwrap();
    let onnx_path = temp_dir.path().join("truncated.onnx");

    // Valid model, truncated mid-message
    let mut bytes = synthetic_model().encode_to_vec();
    bytes.truncate(bytes.len() / 2);
    fs::write(&onnx_path, &bytes).unwrap();

    assert!(onnx::load(&onnx_path).is_err());
}

#[test]
fn test_pipeline_rejects_invalid_schema_before_conversion() {
    let mut model = synthetic_model();
    model.graph.as_mut().unwrap().node[0].input[0] = "no_such_value".to_string();

    // Validation must fail so conversion never runs on this model
    assert!(check_model(&model).is_err());
}
