//! The pNext chain model.
//!
//! Spec §9 Design Notes: "prefer a table of `(sType, size, copy-fn, hash-fn,
//! json-fn)` entries or a sum type over recognized chain members" in place
//! of the macro-driven copy/hash/serialize the original relies on. Since
//! the set of chain members this implementation recognizes is closed, a
//! sum type is the simpler and more idiomatic choice in Rust: exhaustive
//! matches in the hasher, deep-copier and serializer all fail to compile if
//! a new variant is added without being handled everywhere.
//!
//! [`PNextLink`] is the chain attached to ordinary create-info structs
//! (samplers, descriptor set layouts, pipelines, render passes). A
//! completely different set of rules applies to the chain hanging off
//! `VkPhysicalDeviceFeatures2` (spec §4.3: "A separate walker exists ...
//! which *whitelists* sTypes"): unrecognized links there are silently
//! ignored rather than a hard failure, which is why [`FeaturePNextLink`]
//! carries its own `Unrecognized` variant instead of erroring.

use crate::common::{BlendOverlap, DescriptorBindingFlags, DescriptorType, LineRasterizationMode};
use crate::shader_module::ShaderModuleCreateInfo;
use crate::Handle;

/// One link in an ordinary create-info's pNext chain.
#[derive(Clone, Debug)]
pub enum PNextLink {
    SamplerYcbcrConversionInfo(SamplerYcbcrConversionCreateInfo),
    SamplerReductionModeCreateInfo {
        reduction_mode: crate::common::ReductionMode,
    },
    DescriptorSetLayoutBindingFlags(Vec<DescriptorBindingFlags>),
    MutableDescriptorTypeCreateInfo(Vec<Vec<DescriptorType>>),
    RenderPassMultiviewCreateInfo {
        view_masks: Vec<u32>,
        view_offsets: Vec<i32>,
        correlation_masks: Vec<u32>,
    },
    PipelineRasterizationLineStateCreateInfo {
        line_rasterization_mode: LineRasterizationMode,
        stippled_line_enable: bool,
        line_stipple_factor: u32,
        line_stipple_pattern: u16,
    },
    PipelineRasterizationDepthClipStateCreateInfo {
        depth_clip_enable: bool,
    },
    PipelineColorBlendAdvancedStateCreateInfo {
        src_premultiplied: bool,
        dst_premultiplied: bool,
        blend_overlap: BlendOverlap,
    },
    /// `VkPipelineCreateFlags2CreateInfo`. When present, spec §4.3 item 1
    /// says the legacy `flags` field hashes as zero because this subsumes
    /// it.
    PipelineFlags2CreateInfo {
        flags: u64,
    },
    /// An inline `VkShaderModuleCreateInfo` hanging off a shader stage,
    /// used when the application didn't create a separate shader module
    /// object (spec §4.3 item 7).
    ShaderModuleCreateInfo(Box<ShaderModuleCreateInfo>),
    /// `VkShaderModuleCreateInfo`'s driver-stable identifier
    /// counterpart, spliced in by the deep-copier (spec §4.4 "Identifier
    /// injection") or present directly on a recorded stage.
    ShaderModuleIdentifierCreateInfo {
        identifier: Vec<u8>,
    },
    PipelineLibraryCreateInfo {
        libraries: Vec<Handle>,
    },
    /// Recognized, but spec §4.3 "pNext chain walker" says these are
    /// skipped as "known-ignorable": creation feedback, tool info, debug
    /// object name, validation features, pipeline binary info.
    Ignorable(IgnorableLink),
    /// An sType this implementation does not recognize at all. Spec §7:
    /// "Unknown pNext sType ... is a hard failure for the affected
    /// entity."
    Unknown(u32),
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum IgnorableLink {
    PipelineCreationFeedback,
    ToolInfo,
    DebugUtilsObjectName,
    ValidationFeatures,
    PipelineBinaryInfo,
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct SamplerYcbcrConversionCreateInfo {
    pub format: crate::common::Format,
    pub ycbcr_model: i32,
    pub ycbcr_range: i32,
    pub components_r: i32,
    pub components_g: i32,
    pub components_b: i32,
    pub components_a: i32,
    pub x_chroma_offset: i32,
    pub y_chroma_offset: i32,
    pub chroma_filter: crate::common::Filter,
    pub force_explicit_reconstruction: bool,
}

/// One link in a `VkPhysicalDeviceFeatures2` chain. Spec §4.3: the feature
/// walker "whitelists sTypes that are known to affect compilation".
#[derive(Clone, Debug)]
pub enum FeaturePNextLink {
    Robustness2 {
        robust_buffer_access2: bool,
        robust_image_access2: bool,
        null_descriptor: bool,
    },
    FragmentShadingRate {
        pipeline_fragment_shading_rate: bool,
        primitive_fragment_shading_rate: bool,
        attachment_fragment_shading_rate: bool,
    },
    MeshShader {
        task_shader: bool,
        mesh_shader: bool,
    },
    DescriptorBuffer {
        descriptor_buffer: bool,
    },
    ShaderObject {
        shader_object: bool,
    },
    PrimitivesGeneratedQuery {
        primitives_generated_query: bool,
    },
    ImageViewOfRenderTargetSubset3d {
        image2_d_view_of3_d: bool,
    },
    BufferDeviceAddress {
        buffer_device_address: bool,
    },
    DescriptorIndexing {
        shader_sampled_image_array_non_uniform_indexing: bool,
        descriptor_binding_partially_bound: bool,
        runtime_descriptor_array: bool,
    },
    DynamicRendering {
        dynamic_rendering: bool,
    },
    MutableDescriptorType {
        mutable_descriptor_type: bool,
    },
    /// Not in the whitelist: contributes nothing and is not an error
    /// (unlike [`PNextLink::Unknown`]).
    Unrecognized(u32),
}
