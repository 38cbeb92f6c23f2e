//! Structural schema checker for loaded ONNX models.
//!
//! Mirrors the checks `onnx.checker.check_model` performs at the graph
//! level: well-formed model header, typed graph boundary, unique value
//! names, and topologically resolvable node inputs. A model that passes
//! here is safe to hand to the converter.

use crate::error::{ConvertError, Result};
use crate::onnx::proto::{type_proto, GraphProto, ModelProto, ValueInfoProto};
use std::collections::HashSet;

fn fail(msg: impl Into<String>) -> ConvertError {
    ConvertError::SchemaValidation(msg.into())
}

/// Validate a loaded model against the ONNX structural schema.
pub fn check_model(model: &ModelProto) -> Result<()> {
    if model.ir_version <= 0 {
        return Err(fail("model has no ir_version"));
    }
    if model.opset_import.is_empty() {
        return Err(fail("model declares no opset_import"));
    }

    let graph = model
        .graph
        .as_ref()
        .ok_or_else(|| fail("model has no graph"))?;

    check_graph(graph)?;

    tracing::info!(
        "Model '{}' passed schema validation ({} nodes, {} initializers)",
        graph.name,
        graph.node.len(),
        graph.initializer.len()
    );

    Ok(())
}

fn check_graph(graph: &GraphProto) -> Result<()> {
    if graph.input.is_empty() {
        return Err(fail("graph has no inputs"));
    }
    if graph.output.is_empty() {
        return Err(fail("graph has no outputs"));
    }

    for vi in graph.input.iter().chain(graph.output.iter()) {
        check_value_info(vi)?;
    }

    // Known value names in topological order: graph inputs, then
    // initializers, then each node's outputs as nodes are visited.
    let mut known: HashSet<&str> = HashSet::new();

    for vi in &graph.input {
        if !known.insert(vi.name.as_str()) {
            return Err(fail(format!("duplicate graph input '{}'", vi.name)));
        }
    }

    let mut initializer_names: HashSet<&str> = HashSet::new();

    for init in &graph.initializer {
        if init.name.is_empty() {
            return Err(fail("initializer without a name"));
        }
        // Graph inputs may legally shadow initializers (pre-IR4 style),
        // but two initializers must not share a name.
        if !initializer_names.insert(init.name.as_str()) {
            return Err(fail(format!("duplicate initializer '{}'", init.name)));
        }
        known.insert(init.name.as_str());

        if let Some(&dim) = init.dims.iter().find(|&&d| d <= 0) {
            return Err(fail(format!(
                "initializer '{}' has non-positive dim {dim}",
                init.name
            )));
        }

        if init.data_type == crate::onnx::proto::DataType::Float as i32 {
            let values = init
                .float_values()
                .ok_or_else(|| fail(format!("initializer '{}' has undecodable float payload", init.name)))?;
            if !init.dims.is_empty() && values.len() != init.element_count() {
                return Err(fail(format!(
                    "initializer '{}' payload length {} does not match dims {:?}",
                    init.name,
                    values.len(),
                    init.dims
                )));
            }
        }
    }

    for (idx, node) in graph.node.iter().enumerate() {
        if node.op_type.is_empty() {
            return Err(fail(format!("node #{idx} has no op_type")));
        }
        if node.output.is_empty() {
            return Err(fail(format!(
                "node '{}' ({}) has no outputs",
                node.name, node.op_type
            )));
        }

        // Empty-string inputs mark omitted optional inputs
        for input in node.input.iter().filter(|i| !i.is_empty()) {
            if !known.contains(input.as_str()) {
                return Err(fail(format!(
                    "node '{}' ({}) consumes unknown value '{input}'",
                    node.name, node.op_type
                )));
            }
        }

        for output in &node.output {
            if output.is_empty() {
                return Err(fail(format!(
                    "node '{}' ({}) has an unnamed output",
                    node.name, node.op_type
                )));
            }
            if !known.insert(output.as_str()) {
                return Err(fail(format!(
                    "value '{output}' is produced more than once"
                )));
            }
        }
    }

    for vi in &graph.output {
        if !known.contains(vi.name.as_str()) {
            return Err(fail(format!(
                "graph output '{}' is never produced",
                vi.name
            )));
        }
    }

    Ok(())
}

fn check_value_info(vi: &ValueInfoProto) -> Result<()> {
    if vi.name.is_empty() {
        return Err(fail("graph boundary value without a name"));
    }

    let ty = vi
        .r#type
        .as_ref()
        .and_then(|t| t.value.as_ref())
        .ok_or_else(|| fail(format!("value '{}' has no type", vi.name)))?;

    let type_proto::Value::TensorType(tensor) = ty;

    if tensor.elem_type == 0 {
        return Err(fail(format!(
            "value '{}' has undefined element type",
            vi.name
        )));
    }
    if tensor.shape.is_none() {
        return Err(fail(format!("value '{}' has no shape", vi.name)));
    }

    Ok(())
}
