//! Operator-by-operator translation of a validated ONNX graph into a
//! CoreML neural network.
//!
//! The supported operator set covers the buffalo_l recognition graph
//! (ResNet-style ArcFace: Conv / BatchNormalization / PRelu / Add /
//! Flatten / Gemm) plus the common adjacent ops. Anything else is a fatal
//! `UnsupportedOperator` - extending the mapping table is the only fix.

use crate::coreml::proto::*;
use crate::error::{ConvertError, Result};
use crate::onnx::proto as onnx;
use std::collections::HashMap;

type InitMap<'a> = HashMap<&'a str, &'a onnx::TensorProto>;

/// Convert a validated ONNX model into an in-memory CoreML model.
///
/// Input/output tensor names and shapes carry over unchanged; a symbolic
/// batch dimension becomes 1.
pub fn convert(model: &onnx::ModelProto) -> Result<Model> {
    let graph = model
        .graph
        .as_ref()
        .ok_or_else(|| ConvertError::SchemaValidation("model has no graph".to_string()))?;

    let initializers: InitMap = graph
        .initializer
        .iter()
        .map(|t| (t.name.as_str(), t))
        .collect();

    let mut layers = Vec::with_capacity(graph.node.len());
    for (idx, node) in graph.node.iter().enumerate() {
        layers.push(convert_node(node, idx, &initializers)?);
    }

    tracing::info!(
        "Converted {} nodes from graph '{}' to CoreML layers",
        layers.len(),
        graph.name
    );

    Ok(Model {
        // Version 4 (iOS 13 era): the earliest that honors
        // arrayInputShapeMapping, and what coremltools emits for this
        // kind of network
        specification_version: 4,
        description: Some(build_description(graph, &initializers)),
        is_updatable: false,
        r#type: Some(model::Type::NeuralNetwork(NeuralNetwork {
            layers,
            array_input_shape_mapping: NeuralNetworkMultiArrayShapeMapping::ExactArrayMapping
                as i32,
        })),
    })
}

fn build_description(graph: &onnx::GraphProto, initializers: &InitMap) -> ModelDescription {
    // Pre-IR4 graphs list initializers among the inputs; those are weights,
    // not feed-able features.
    let input = graph
        .input
        .iter()
        .filter(|vi| !initializers.contains_key(vi.name.as_str()))
        .map(feature_from_value_info)
        .collect();
    let output = graph.output.iter().map(feature_from_value_info).collect();

    ModelDescription {
        input,
        output,
        metadata: Some(Metadata {
            short_description: format!("Converted from ONNX graph '{}'", graph.name),
            version_string: "1.0".to_string(),
            author: "mlconvert".to_string(),
            license: String::new(),
        }),
    }
}

fn feature_from_value_info(vi: &onnx::ValueInfoProto) -> FeatureDescription {
    let shape = vi
        .r#type
        .as_ref()
        .and_then(|t| t.value.as_ref())
        .map(|onnx::type_proto::Value::TensorType(t)| t)
        .and_then(|t| t.shape.as_ref())
        .map(|s| s.dim.iter().map(|d| d.size_or(1)).collect())
        .unwrap_or_default();

    FeatureDescription {
        name: vi.name.clone(),
        short_description: String::new(),
        r#type: Some(FeatureType {
            r#type: Some(feature_type::Type::MultiArrayType(ArrayFeatureType {
                shape,
                data_type: ArrayDataType::Float32 as i32,
            })),
            is_optional: false,
        }),
    }
}

fn convert_node(
    node: &onnx::NodeProto,
    idx: usize,
    initializers: &InitMap,
) -> Result<NeuralNetworkLayer> {
    let params = match node.op_type.as_str() {
        "Conv" => convert_conv(node, initializers)?,
        "Gemm" => convert_gemm(node, initializers)?,
        "MatMul" => convert_matmul(node, initializers)?,
        "BatchNormalization" => convert_batchnorm(node, initializers)?,
        "Relu" => activation(activation_params::NonlinearityType::ReLu(ActivationReLu {})),
        "Sigmoid" => activation(activation_params::NonlinearityType::Sigmoid(
            ActivationSigmoid {},
        )),
        "Tanh" => activation(activation_params::NonlinearityType::Tanh(ActivationTanh {})),
        "LeakyRelu" => activation(activation_params::NonlinearityType::LeakyReLu(
            ActivationLeakyReLu {
                alpha: node.attr_f("alpha", 0.01),
            },
        )),
        "PRelu" => convert_prelu(node, initializers)?,
        "MaxPool" => convert_pool(node, pooling_layer_params::PoolingType::Max, false),
        "AveragePool" => convert_pool(node, pooling_layer_params::PoolingType::Average, false),
        "GlobalAveragePool" => {
            convert_pool(node, pooling_layer_params::PoolingType::Average, true)
        }
        "Softmax" => neural_network_layer::Layer::Softmax(SoftmaxLayerParams {}),
        "Flatten" => neural_network_layer::Layer::Flatten(FlattenLayerParams {
            mode: flatten_layer_params::FlattenOrder::ChannelFirst as i32,
        }),
        "Reshape" => convert_reshape(node, initializers)?,
        "Add" => neural_network_layer::Layer::Add(AddLayerParams { alpha: 0.0 }),
        op => {
            return Err(ConvertError::UnsupportedOperator {
                op: op.to_string(),
                node: layer_name(node, idx),
            })
        }
    };

    Ok(NeuralNetworkLayer {
        name: layer_name(node, idx),
        // Data edges only: weight inputs live inside the layer params
        input: node
            .input
            .iter()
            .filter(|i| !i.is_empty() && !initializers.contains_key(i.as_str()))
            .cloned()
            .collect(),
        output: node.output.clone(),
        layer: Some(params),
    })
}

fn layer_name(node: &onnx::NodeProto, idx: usize) -> String {
    if node.name.is_empty() {
        format!("{}_{idx}", node.op_type.to_lowercase())
    } else {
        node.name.clone()
    }
}

fn activation(nl: activation_params::NonlinearityType) -> neural_network_layer::Layer {
    neural_network_layer::Layer::Activation(ActivationParams {
        nonlinearity_type: Some(nl),
    })
}

/// Fetch a weight initializer a node references. The schema checker has
/// already verified every node input resolves, so a miss here means the
/// value is a runtime tensor where a constant is required.
fn weight_tensor<'a>(
    node: &onnx::NodeProto,
    slot: usize,
    initializers: &InitMap<'a>,
) -> Result<&'a onnx::TensorProto> {
    let name = node.input.get(slot).map(String::as_str).unwrap_or("");
    initializers.get(name).copied().ok_or_else(|| {
        ConvertError::SchemaValidation(format!(
            "node '{}' ({}) needs a constant initializer for input #{slot} ('{name}')",
            node.name, node.op_type
        ))
    })
}

fn weight_values(node: &onnx::NodeProto, slot: usize, initializers: &InitMap) -> Result<Vec<f32>> {
    let tensor = weight_tensor(node, slot, initializers)?;
    tensor.float_values().ok_or_else(|| {
        ConvertError::SchemaValidation(format!(
            "initializer '{}' has undecodable float payload",
            tensor.name
        ))
    })
}

/// Positive tensor dims, cast for indexing. Callers normally sit behind
/// the schema checker, but a malformed tensor must still come back as an
/// error rather than a wrapped cast.
fn checked_dims(tensor: &onnx::TensorProto) -> Result<Vec<usize>> {
    tensor
        .dims
        .iter()
        .map(|&d| {
            if d <= 0 {
                Err(ConvertError::SchemaValidation(format!(
                    "initializer '{}' has non-positive dim {d}",
                    tensor.name
                )))
            } else {
                Ok(d as usize)
            }
        })
        .collect()
}

fn check_payload_len(name: &str, values: &[f32], dims: &[usize]) -> Result<()> {
    let expected: usize = dims.iter().product();
    if values.len() != expected {
        return Err(ConvertError::SchemaValidation(format!(
            "initializer '{name}' payload length {} does not match dims {dims:?}",
            values.len()
        )));
    }
    Ok(())
}

fn transpose_2d(values: &[f32], rows: usize, cols: usize) -> Vec<f32> {
    let mut out = vec![0.0; values.len()];
    for r in 0..rows {
        for c in 0..cols {
            out[c * rows + r] = values[r * cols + c];
        }
    }
    out
}

fn convert_gemm(
    node: &onnx::NodeProto,
    initializers: &InitMap,
) -> Result<neural_network_layer::Layer> {
    if node.attr_i("transA", 0) != 0 {
        return Err(ConvertError::UnsupportedOperator {
            op: "Gemm(transA=1)".to_string(),
            node: node.name.clone(),
        });
    }

    let b = weight_tensor(node, 1, initializers)?;
    let dims = checked_dims(b)?;
    if dims.len() != 2 {
        return Err(ConvertError::SchemaValidation(format!(
            "Gemm weight '{}' must be rank 2, got dims {:?}",
            b.name, b.dims
        )));
    }
    let mut values = weight_values(node, 1, initializers)?;
    check_payload_len(&b.name, &values, &dims)?;

    // CoreML inner product weights are laid out [output x input]; ONNX
    // Gemm B is [K x N] unless transB flips it to [N x K].
    let (input_channels, output_channels) = if node.attr_i("transB", 0) != 0 {
        (dims[1] as u64, dims[0] as u64)
    } else {
        values = transpose_2d(&values, dims[0], dims[1]);
        (dims[0] as u64, dims[1] as u64)
    };

    let alpha = node.attr_f("alpha", 1.0);
    if alpha != 1.0 {
        for v in &mut values {
            *v *= alpha;
        }
    }

    let bias = match node.input.get(2).filter(|n| !n.is_empty()) {
        Some(_) => {
            let beta = node.attr_f("beta", 1.0);
            let mut bias = weight_values(node, 2, initializers)?;
            if beta != 1.0 {
                for v in &mut bias {
                    *v *= beta;
                }
            }
            Some(bias)
        }
        None => None,
    };

    Ok(neural_network_layer::Layer::InnerProduct(
        InnerProductLayerParams {
            input_channels,
            output_channels,
            has_bias: bias.is_some(),
            weights: Some(WeightParams { float_value: values }),
            bias: bias.map(|b| WeightParams { float_value: b }),
        },
    ))
}

fn convert_matmul(
    node: &onnx::NodeProto,
    initializers: &InitMap,
) -> Result<neural_network_layer::Layer> {
    let b = weight_tensor(node, 1, initializers)?;
    let dims = checked_dims(b)?;
    if dims.len() != 2 {
        return Err(ConvertError::UnsupportedOperator {
            op: format!("MatMul(rank-{} weights)", b.dims.len()),
            node: node.name.clone(),
        });
    }

    let values = weight_values(node, 1, initializers)?;
    check_payload_len(&b.name, &values, &dims)?;
    let (k, n) = (dims[0], dims[1]);

    Ok(neural_network_layer::Layer::InnerProduct(
        InnerProductLayerParams {
            input_channels: k as u64,
            output_channels: n as u64,
            has_bias: false,
            weights: Some(WeightParams {
                float_value: transpose_2d(&values, k, n),
            }),
            bias: None,
        },
    ))
}

fn convert_conv(
    node: &onnx::NodeProto,
    initializers: &InitMap,
) -> Result<neural_network_layer::Layer> {
    let w = weight_tensor(node, 1, initializers)?;
    let dims = checked_dims(w)?;
    if dims.len() != 4 {
        return Err(ConvertError::UnsupportedOperator {
            op: format!("Conv({}D weights)", w.dims.len()),
            node: node.name.clone(),
        });
    }

    let groups = node.attr_i("group", 1).max(1) as u64;
    let kernel_shape = node.attr_ints("kernel_shape");
    let kernel_size: Vec<u64> = if kernel_shape.is_empty() {
        vec![dims[2] as u64, dims[3] as u64]
    } else {
        kernel_shape.iter().map(|&k| k as u64).collect()
    };

    let stride = dims_or(node.attr_ints("strides"), &[1, 1]);
    let dilation = dims_or(node.attr_ints("dilations"), &[1, 1]);

    let bias = match node.input.get(2).filter(|n| !n.is_empty()) {
        Some(_) => Some(weight_values(node, 2, initializers)?),
        None => None,
    };

    Ok(neural_network_layer::Layer::Convolution(
        ConvolutionLayerParams {
            output_channels: dims[0] as u64,
            kernel_channels: dims[1] as u64,
            n_groups: groups,
            kernel_size,
            stride,
            dilation_factor: dilation,
            convolution_padding_type: Some(conv_padding(node)),
            has_bias: bias.is_some(),
            weights: Some(WeightParams {
                float_value: weight_values(node, 1, initializers)?,
            }),
            bias: bias.map(|b| WeightParams { float_value: b }),
        },
    ))
}

fn dims_or(attr: &[i64], default: &[u64]) -> Vec<u64> {
    if attr.is_empty() {
        default.to_vec()
    } else {
        attr.iter().map(|&v| v as u64).collect()
    }
}

fn conv_padding(node: &onnx::NodeProto) -> convolution_layer_params::ConvolutionPaddingType {
    let auto_pad = node
        .attr("auto_pad")
        .map(|a| String::from_utf8_lossy(&a.s).into_owned())
        .unwrap_or_default();

    if auto_pad.starts_with("SAME") {
        return convolution_layer_params::ConvolutionPaddingType::Same(SamePadding {});
    }

    // ONNX 2D pads: [top, left, bottom, right]
    let pads = node.attr_ints("pads");
    let edge = |start: usize, end: usize| EdgeSizes {
        start_edge_size: pads.get(start).copied().unwrap_or(0) as u64,
        end_edge_size: pads.get(end).copied().unwrap_or(0) as u64,
    };

    convolution_layer_params::ConvolutionPaddingType::Valid(ValidPadding {
        padding_amounts: Some(BorderAmounts {
            border_amounts: vec![edge(0, 2), edge(1, 3)],
        }),
    })
}

fn convert_pool(
    node: &onnx::NodeProto,
    pool_type: pooling_layer_params::PoolingType,
    global: bool,
) -> neural_network_layer::Layer {
    let pads = node.attr_ints("pads");
    let edge = |start: usize, end: usize| EdgeSizes {
        start_edge_size: pads.get(start).copied().unwrap_or(0) as u64,
        end_edge_size: pads.get(end).copied().unwrap_or(0) as u64,
    };

    neural_network_layer::Layer::Pooling(PoolingLayerParams {
        r#type: pool_type as i32,
        kernel_size: dims_or(node.attr_ints("kernel_shape"), &[]),
        stride: dims_or(node.attr_ints("strides"), &[1, 1]),
        pooling_padding_type: Some(pooling_layer_params::PoolingPaddingType::Valid(
            ValidPadding {
                padding_amounts: Some(BorderAmounts {
                    border_amounts: vec![edge(0, 2), edge(1, 3)],
                }),
            },
        )),
        avg_pool_exclude_padding: node.attr_i("count_include_pad", 0) == 0,
        global_pooling: global,
    })
}

fn convert_prelu(
    node: &onnx::NodeProto,
    initializers: &InitMap,
) -> Result<neural_network_layer::Layer> {
    let slope = weight_values(node, 1, initializers)?;
    Ok(activation(activation_params::NonlinearityType::PReLu(
        ActivationPReLu {
            alpha: Some(WeightParams { float_value: slope }),
        },
    )))
}

fn convert_batchnorm(
    node: &onnx::NodeProto,
    initializers: &InitMap,
) -> Result<neural_network_layer::Layer> {
    let scale = weight_values(node, 1, initializers)?;
    let channels = scale.len() as u64;

    Ok(neural_network_layer::Layer::Batchnorm(
        BatchnormLayerParams {
            channels,
            compute_mean_var: false,
            instance_normalization: false,
            epsilon: node.attr_f("epsilon", 1e-5),
            gamma: Some(WeightParams { float_value: scale }),
            beta: Some(WeightParams {
                float_value: weight_values(node, 2, initializers)?,
            }),
            mean: Some(WeightParams {
                float_value: weight_values(node, 3, initializers)?,
            }),
            variance: Some(WeightParams {
                float_value: weight_values(node, 4, initializers)?,
            }),
        },
    ))
}

fn convert_reshape(
    node: &onnx::NodeProto,
    initializers: &InitMap,
) -> Result<neural_network_layer::Layer> {
    let shape = weight_tensor(node, 1, initializers)?;
    let target_shape = int64_values(shape).ok_or_else(|| {
        ConvertError::SchemaValidation(format!(
            "Reshape target '{}' is not an int64 tensor",
            shape.name
        ))
    })?;

    Ok(neural_network_layer::Layer::Reshape(ReshapeLayerParams {
        target_shape,
    }))
}

fn int64_values(tensor: &onnx::TensorProto) -> Option<Vec<i64>> {
    if tensor.data_type != onnx::DataType::Int64 as i32 {
        return None;
    }
    if !tensor.int64_data.is_empty() {
        return Some(tensor.int64_data.clone());
    }
    if tensor.raw_data.len() % 8 != 0 {
        return None;
    }
    Some(
        tensor
            .raw_data
            .chunks_exact(8)
            .map(|c| i64::from_le_bytes(c.try_into().expect("chunks_exact(8)")))
            .collect(),
    )
}
