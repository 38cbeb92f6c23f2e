//! Hand-derived prost messages for the subset of Apple's CoreML model
//! schema this tool emits (Model.proto / NeuralNetwork.proto /
//! FeatureTypes.proto). Field numbers and enum values follow the published
//! coremltools specification so the output decodes as a `.mlmodel`.

/// Top-level CoreML model container.
#[derive(Clone, PartialEq, prost::Message)]
pub struct Model {
    #[prost(int32, tag = "1")]
    pub specification_version: i32,
    #[prost(message, optional, tag = "2")]
    pub description: Option<ModelDescription>,
    #[prost(bool, tag = "10")]
    pub is_updatable: bool,
    #[prost(oneof = "model::Type", tags = "500")]
    pub r#type: Option<model::Type>,
}

pub mod model {
    #[derive(Clone, PartialEq, prost::Oneof)]
    pub enum Type {
        #[prost(message, tag = "500")]
        NeuralNetwork(super::NeuralNetwork),
    }
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct ModelDescription {
    #[prost(message, repeated, tag = "1")]
    pub input: Vec<FeatureDescription>,
    #[prost(message, repeated, tag = "10")]
    pub output: Vec<FeatureDescription>,
    #[prost(message, optional, tag = "100")]
    pub metadata: Option<Metadata>,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct Metadata {
    #[prost(string, tag = "1")]
    pub short_description: String,
    #[prost(string, tag = "2")]
    pub version_string: String,
    #[prost(string, tag = "3")]
    pub author: String,
    #[prost(string, tag = "4")]
    pub license: String,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct FeatureDescription {
    #[prost(string, tag = "1")]
    pub name: String,
    #[prost(string, tag = "2")]
    pub short_description: String,
    #[prost(message, optional, tag = "3")]
    pub r#type: Option<FeatureType>,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct FeatureType {
    #[prost(oneof = "feature_type::Type", tags = "5")]
    pub r#type: Option<feature_type::Type>,
    #[prost(bool, tag = "1000")]
    pub is_optional: bool,
}

pub mod feature_type {
    #[derive(Clone, PartialEq, prost::Oneof)]
    pub enum Type {
        #[prost(message, tag = "5")]
        MultiArrayType(super::ArrayFeatureType),
    }
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct ArrayFeatureType {
    #[prost(int64, repeated, tag = "1")]
    pub shape: Vec<i64>,
    #[prost(enumeration = "ArrayDataType", tag = "2")]
    pub data_type: i32,
}

/// CoreML multi-array element types; the values encode bit width in the
/// low half-word.
#[derive(Clone, Copy, Debug, PartialEq, Eq, prost::Enumeration)]
#[repr(i32)]
pub enum ArrayDataType {
    InvalidArrayDataType = 0,
    Float32 = 65568,
    Double = 65600,
    Int32 = 131_104,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct NeuralNetwork {
    #[prost(message, repeated, tag = "1")]
    pub layers: Vec<NeuralNetworkLayer>,
    #[prost(enumeration = "NeuralNetworkMultiArrayShapeMapping", tag = "5")]
    pub array_input_shape_mapping: i32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, prost::Enumeration)]
#[repr(i32)]
pub enum NeuralNetworkMultiArrayShapeMapping {
    Rank5ArrayMapping = 0,
    ExactArrayMapping = 1,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct NeuralNetworkLayer {
    #[prost(string, tag = "1")]
    pub name: String,
    #[prost(string, repeated, tag = "2")]
    pub input: Vec<String>,
    #[prost(string, repeated, tag = "3")]
    pub output: Vec<String>,
    #[prost(
        oneof = "neural_network_layer::Layer",
        tags = "100, 120, 130, 140, 160, 175, 200, 210, 230"
    )]
    pub layer: Option<neural_network_layer::Layer>,
}

pub mod neural_network_layer {
    #[derive(Clone, PartialEq, prost::Oneof)]
    pub enum Layer {
        #[prost(message, tag = "100")]
        Convolution(super::ConvolutionLayerParams),
        #[prost(message, tag = "120")]
        Pooling(super::PoolingLayerParams),
        #[prost(message, tag = "130")]
        Activation(super::ActivationParams),
        #[prost(message, tag = "140")]
        InnerProduct(super::InnerProductLayerParams),
        #[prost(message, tag = "160")]
        Batchnorm(super::BatchnormLayerParams),
        #[prost(message, tag = "175")]
        Softmax(super::SoftmaxLayerParams),
        #[prost(message, tag = "200")]
        Flatten(super::FlattenLayerParams),
        #[prost(message, tag = "210")]
        Reshape(super::ReshapeLayerParams),
        #[prost(message, tag = "230")]
        Add(super::AddLayerParams),
    }
}

/// Weight payload. Only 32-bit float weights are emitted; quantized
/// variants are out of scope.
#[derive(Clone, PartialEq, prost::Message)]
pub struct WeightParams {
    #[prost(float, repeated, tag = "1")]
    pub float_value: Vec<f32>,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct ConvolutionLayerParams {
    #[prost(uint64, tag = "1")]
    pub output_channels: u64,
    #[prost(uint64, tag = "2")]
    pub kernel_channels: u64,
    #[prost(uint64, tag = "10")]
    pub n_groups: u64,
    #[prost(uint64, repeated, tag = "20")]
    pub kernel_size: Vec<u64>,
    #[prost(uint64, repeated, tag = "30")]
    pub stride: Vec<u64>,
    #[prost(uint64, repeated, tag = "40")]
    pub dilation_factor: Vec<u64>,
    #[prost(oneof = "convolution_layer_params::ConvolutionPaddingType", tags = "50, 51")]
    pub convolution_padding_type: Option<convolution_layer_params::ConvolutionPaddingType>,
    #[prost(bool, tag = "70")]
    pub has_bias: bool,
    #[prost(message, optional, tag = "90")]
    pub weights: Option<WeightParams>,
    #[prost(message, optional, tag = "91")]
    pub bias: Option<WeightParams>,
}

pub mod convolution_layer_params {
    #[derive(Clone, PartialEq, prost::Oneof)]
    pub enum ConvolutionPaddingType {
        #[prost(message, tag = "50")]
        Valid(super::ValidPadding),
        #[prost(message, tag = "51")]
        Same(super::SamePadding),
    }
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct ValidPadding {
    #[prost(message, optional, tag = "1")]
    pub padding_amounts: Option<BorderAmounts>,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct SamePadding {}

#[derive(Clone, PartialEq, prost::Message)]
pub struct BorderAmounts {
    #[prost(message, repeated, tag = "10")]
    pub border_amounts: Vec<EdgeSizes>,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct EdgeSizes {
    #[prost(uint64, tag = "1")]
    pub start_edge_size: u64,
    #[prost(uint64, tag = "2")]
    pub end_edge_size: u64,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct InnerProductLayerParams {
    #[prost(uint64, tag = "1")]
    pub input_channels: u64,
    #[prost(uint64, tag = "2")]
    pub output_channels: u64,
    #[prost(bool, tag = "10")]
    pub has_bias: bool,
    #[prost(message, optional, tag = "20")]
    pub weights: Option<WeightParams>,
    #[prost(message, optional, tag = "21")]
    pub bias: Option<WeightParams>,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct PoolingLayerParams {
    #[prost(enumeration = "pooling_layer_params::PoolingType", tag = "1")]
    pub r#type: i32,
    #[prost(uint64, repeated, tag = "10")]
    pub kernel_size: Vec<u64>,
    #[prost(uint64, repeated, tag = "20")]
    pub stride: Vec<u64>,
    #[prost(oneof = "pooling_layer_params::PoolingPaddingType", tags = "30, 31")]
    pub pooling_padding_type: Option<pooling_layer_params::PoolingPaddingType>,
    #[prost(bool, tag = "50")]
    pub avg_pool_exclude_padding: bool,
    #[prost(bool, tag = "60")]
    pub global_pooling: bool,
}

pub mod pooling_layer_params {
    #[derive(Clone, Copy, Debug, PartialEq, Eq, prost::Enumeration)]
    #[repr(i32)]
    pub enum PoolingType {
        Max = 0,
        Average = 1,
        L2 = 2,
    }

    #[derive(Clone, PartialEq, prost::Oneof)]
    pub enum PoolingPaddingType {
        #[prost(message, tag = "30")]
        Valid(super::ValidPadding),
        #[prost(message, tag = "31")]
        Same(super::SamePadding),
    }
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct ActivationParams {
    #[prost(oneof = "activation_params::NonlinearityType", tags = "10, 15, 25, 30, 40")]
    pub nonlinearity_type: Option<activation_params::NonlinearityType>,
}

pub mod activation_params {
    #[derive(Clone, PartialEq, prost::Oneof)]
    pub enum NonlinearityType {
        #[prost(message, tag = "10")]
        ReLu(super::ActivationReLu),
        #[prost(message, tag = "15")]
        LeakyReLu(super::ActivationLeakyReLu),
        #[prost(message, tag = "25")]
        PReLu(super::ActivationPReLu),
        #[prost(message, tag = "30")]
        Tanh(super::ActivationTanh),
        #[prost(message, tag = "40")]
        Sigmoid(super::ActivationSigmoid),
    }
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct ActivationReLu {}

#[derive(Clone, PartialEq, prost::Message)]
pub struct ActivationLeakyReLu {
    #[prost(float, tag = "1")]
    pub alpha: f32,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct ActivationPReLu {
    #[prost(message, optional, tag = "1")]
    pub alpha: Option<WeightParams>,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct ActivationTanh {}

#[derive(Clone, PartialEq, prost::Message)]
pub struct ActivationSigmoid {}

#[derive(Clone, PartialEq, prost::Message)]
pub struct BatchnormLayerParams {
    #[prost(uint64, tag = "1")]
    pub channels: u64,
    #[prost(bool, tag = "5")]
    pub compute_mean_var: bool,
    #[prost(bool, tag = "6")]
    pub instance_normalization: bool,
    #[prost(float, tag = "10")]
    pub epsilon: f32,
    #[prost(message, optional, tag = "15")]
    pub gamma: Option<WeightParams>,
    #[prost(message, optional, tag = "16")]
    pub beta: Option<WeightParams>,
    #[prost(message, optional, tag = "17")]
    pub mean: Option<WeightParams>,
    #[prost(message, optional, tag = "18")]
    pub variance: Option<WeightParams>,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct SoftmaxLayerParams {}

#[derive(Clone, PartialEq, prost::Message)]
pub struct FlattenLayerParams {
    #[prost(enumeration = "flatten_layer_params::FlattenOrder", tag = "1")]
    pub mode: i32,
}

pub mod flatten_layer_params {
    #[derive(Clone, Copy, Debug, PartialEq, Eq, prost::Enumeration)]
    #[repr(i32)]
    pub enum FlattenOrder {
        ChannelFirst = 0,
        ChannelLast = 1,
    }
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct ReshapeLayerParams {
    #[prost(int64, repeated, tag = "1")]
    pub target_shape: Vec<i64>,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct AddLayerParams {
    #[prost(float, tag = "1")]
    pub alpha: f32,
}
