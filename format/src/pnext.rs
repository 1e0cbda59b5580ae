//! JSON encoding for [`PNextLink`] and [`FeaturePNextLink`] chains.
//!
//! Every recognized chain member gets a `"type"` discriminator string plus
//! its fields; [`PNextLink::Unknown`] can't legally reach the serializer
//! (the deep-copier already refuses to copy it, spec §4.4), so encoding one
//! is an internal-consistency bug rather than a normal failure path.

use fossilize_types::common::{BlendOverlap, DescriptorBindingFlags, DescriptorType, Filter, LineRasterizationMode, ReductionMode};
use fossilize_types::pnext::{FeaturePNextLink, IgnorableLink, PNextLink, SamplerYcbcrConversionCreateInfo};
use fossilize_types::shader_module::{ShaderModuleCreateFlags, ShaderModuleCreateInfo};
use fossilize_types::{FossilizeError, Handle, Result};
use serde_json::{json, Value};

fn ignorable_name(link: IgnorableLink) -> &'static str {
    match link {
        IgnorableLink::PipelineCreationFeedback => "pipelineCreationFeedback",
        IgnorableLink::ToolInfo => "toolInfo",
        IgnorableLink::DebugUtilsObjectName => "debugUtilsObjectName",
        IgnorableLink::ValidationFeatures => "validationFeatures",
        IgnorableLink::PipelineBinaryInfo => "pipelineBinaryInfo",
    }
}

fn ignorable_from_name(name: &str) -> Option<IgnorableLink> {
    Some(match name {
        "pipelineCreationFeedback" => IgnorableLink::PipelineCreationFeedback,
        "toolInfo" => IgnorableLink::ToolInfo,
        "debugUtilsObjectName" => IgnorableLink::DebugUtilsObjectName,
        "validationFeatures" => IgnorableLink::ValidationFeatures,
        "pipelineBinaryInfo" => IgnorableLink::PipelineBinaryInfo,
        _ => return None,
    })
}

pub fn pnext_chain_to_value(links: &[PNextLink], entity: &'static str) -> Result<Value> {
    let mut out = Vec::with_capacity(links.len());
    for link in links {
        out.push(pnext_link_to_value(link, entity)?);
    }
    Ok(Value::Array(out))
}

fn pnext_link_to_value(link: &PNextLink, entity: &'static str) -> Result<Value> {
    Ok(match link {
        PNextLink::SamplerYcbcrConversionInfo(info) => json!({
            "type": "samplerYcbcrConversionInfo",
            "format": info.format.0,
            "ycbcrModel": info.ycbcr_model,
            "ycbcrRange": info.ycbcr_range,
            "componentsR": info.components_r,
            "componentsG": info.components_g,
            "componentsB": info.components_b,
            "componentsA": info.components_a,
            "xChromaOffset": info.x_chroma_offset,
            "yChromaOffset": info.y_chroma_offset,
            "chromaFilter": info.chroma_filter.0,
            "forceExplicitReconstruction": info.force_explicit_reconstruction,
        }),
        PNextLink::SamplerReductionModeCreateInfo { reduction_mode } => json!({
            "type": "samplerReductionMode",
            "reductionMode": reduction_mode.0,
        }),
        PNextLink::DescriptorSetLayoutBindingFlags(flags) => json!({
            "type": "descriptorSetLayoutBindingFlags",
            "bindingFlags": flags.iter().map(|f| f.bits()).collect::<Vec<_>>(),
        }),
        PNextLink::MutableDescriptorTypeCreateInfo(lists) => json!({
            "type": "mutableDescriptorType",
            "mutableDescriptorTypeLists": lists
                .iter()
                .map(|list| list.iter().map(|t| t.0).collect::<Vec<_>>())
                .collect::<Vec<_>>(),
        }),
        PNextLink::RenderPassMultiviewCreateInfo {
            view_masks,
            view_offsets,
            correlation_masks,
        } => json!({
            "type": "renderPassMultiview",
            "viewMasks": view_masks,
            "viewOffsets": view_offsets,
            "correlationMasks": correlation_masks,
        }),
        PNextLink::PipelineRasterizationLineStateCreateInfo {
            line_rasterization_mode,
            stippled_line_enable,
            line_stipple_factor,
            line_stipple_pattern,
        } => json!({
            "type": "rasterizationLineState",
            "lineRasterizationMode": line_rasterization_mode.0,
            "stippledLineEnable": stippled_line_enable,
            "lineStippleFactor": line_stipple_factor,
            "lineStipplePattern": line_stipple_pattern,
        }),
        PNextLink::PipelineRasterizationDepthClipStateCreateInfo { depth_clip_enable } => json!({
            "type": "rasterizationDepthClipState",
            "depthClipEnable": depth_clip_enable,
        }),
        PNextLink::PipelineColorBlendAdvancedStateCreateInfo {
            src_premultiplied,
            dst_premultiplied,
            blend_overlap,
        } => json!({
            "type": "colorBlendAdvancedState",
            "srcPremultiplied": src_premultiplied,
            "dstPremultiplied": dst_premultiplied,
            "blendOverlap": blend_overlap.0,
        }),
        PNextLink::PipelineFlags2CreateInfo { flags } => json!({
            "type": "pipelineFlags2",
            "flags": format!("{:016x}", flags),
        }),
        PNextLink::ShaderModuleCreateInfo(info) => json!({
            "type": "shaderModuleCreateInfo",
            "flags": info.flags.bits(),
            "code": info.code,
        }),
        PNextLink::ShaderModuleIdentifierCreateInfo { identifier } => json!({
            "type": "shaderModuleIdentifier",
            "identifier": identifier,
        }),
        PNextLink::PipelineLibraryCreateInfo { libraries } => json!({
            "type": "pipelineLibraryCreateInfo",
            "libraries": libraries.iter().map(|h| format!("{:016x}", h)).collect::<Vec<_>>(),
        }),
        PNextLink::Ignorable(link) => json!({ "type": ignorable_name(*link) }),
        PNextLink::Unknown(stype) => {
            return Err(FossilizeError::UnknownPNext { entity, stype: *stype });
        }
    })
}

pub fn pnext_chain_from_value(value: &Value, entity: &'static str) -> Result<Vec<PNextLink>> {
    let array = value
        .as_array()
        .ok_or_else(|| FossilizeError::Corruption(format!("{} pNext chain is not an array", entity)))?;
    array.iter().map(|v| pnext_link_from_value(v, entity)).collect()
}

fn field_str<'a>(value: &'a Value, key: &str, entity: &'static str) -> Result<&'a str> {
    value
        .get(key)
        .and_then(Value::as_str)
        .ok_or_else(|| FossilizeError::Corruption(format!("{} pNext link missing string field {:?}", entity, key)))
}

fn field_i64(value: &Value, key: &str, entity: &'static str) -> Result<i64> {
    value
        .get(key)
        .and_then(Value::as_i64)
        .ok_or_else(|| FossilizeError::Corruption(format!("{} pNext link missing integer field {:?}", entity, key)))
}

fn field_u64(value: &Value, key: &str, entity: &'static str) -> Result<u64> {
    value
        .get(key)
        .and_then(Value::as_u64)
        .ok_or_else(|| FossilizeError::Corruption(format!("{} pNext link missing integer field {:?}", entity, key)))
}

fn field_bool(value: &Value, key: &str, entity: &'static str) -> Result<bool> {
    value
        .get(key)
        .and_then(Value::as_bool)
        .ok_or_else(|| FossilizeError::Corruption(format!("{} pNext link missing bool field {:?}", entity, key)))
}

fn field_u32_array(value: &Value, key: &str, entity: &'static str) -> Result<Vec<u32>> {
    value
        .get(key)
        .and_then(Value::as_array)
        .ok_or_else(|| FossilizeError::Corruption(format!("{} pNext link missing array field {:?}", entity, key)))?
        .iter()
        .map(|v| v.as_u64().map(|v| v as u32))
        .collect::<Option<Vec<_>>>()
        .ok_or_else(|| FossilizeError::Corruption(format!("{} pNext link array {:?} has non-integer element", entity, key)))
}

fn field_i32_array(value: &Value, key: &str, entity: &'static str) -> Result<Vec<i32>> {
    value
        .get(key)
        .and_then(Value::as_array)
        .ok_or_else(|| FossilizeError::Corruption(format!("{} pNext link missing array field {:?}", entity, key)))?
        .iter()
        .map(|v| v.as_i64().map(|v| v as i32))
        .collect::<Option<Vec<_>>>()
        .ok_or_else(|| FossilizeError::Corruption(format!("{} pNext link array {:?} has non-integer element", entity, key)))
}

fn field_bytes(value: &Value, key: &str, entity: &'static str) -> Result<Vec<u8>> {
    field_u32_array(value, key, entity).map(|v| v.into_iter().map(|b| b as u8).collect())
}

fn parse_handle_hex(s: &str, entity: &'static str) -> Result<Handle> {
    u64::from_str_radix(s, 16)
        .map_err(|_| FossilizeError::Corruption(format!("{} pNext link has invalid hash string {:?}", entity, s)))
}

fn pnext_link_from_value(value: &Value, entity: &'static str) -> Result<PNextLink> {
    let ty = field_str(value, "type", entity)?;
    Ok(match ty {
        "samplerYcbcrConversionInfo" => PNextLink::SamplerYcbcrConversionInfo(SamplerYcbcrConversionCreateInfo {
            format: fossilize_types::common::Format(field_u64(value, "format", entity)? as u32),
            ycbcr_model: field_i64(value, "ycbcrModel", entity)? as i32,
            ycbcr_range: field_i64(value, "ycbcrRange", entity)? as i32,
            components_r: field_i64(value, "componentsR", entity)? as i32,
            components_g: field_i64(value, "componentsG", entity)? as i32,
            components_b: field_i64(value, "componentsB", entity)? as i32,
            components_a: field_i64(value, "componentsA", entity)? as i32,
            x_chroma_offset: field_i64(value, "xChromaOffset", entity)? as i32,
            y_chroma_offset: field_i64(value, "yChromaOffset", entity)? as i32,
            chroma_filter: Filter(field_i64(value, "chromaFilter", entity)? as i32),
            force_explicit_reconstruction: field_bool(value, "forceExplicitReconstruction", entity)?,
        }),
        "samplerReductionMode" => PNextLink::SamplerReductionModeCreateInfo {
            reduction_mode: ReductionMode(field_i64(value, "reductionMode", entity)? as i32),
        },
        "descriptorSetLayoutBindingFlags" => PNextLink::DescriptorSetLayoutBindingFlags(
            field_u32_array(value, "bindingFlags", entity)?
                .into_iter()
                .map(DescriptorBindingFlags::from_bits_truncate)
                .collect(),
        ),
        "mutableDescriptorType" => {
            let lists = value
                .get("mutableDescriptorTypeLists")
                .and_then(Value::as_array)
                .ok_or_else(|| FossilizeError::Corruption(format!("{} missing mutableDescriptorTypeLists", entity)))?;
            let mut out = Vec::with_capacity(lists.len());
            for list in lists {
                let types = list
                    .as_array()
                    .ok_or_else(|| FossilizeError::Corruption(format!("{} mutable descriptor type list malformed", entity)))?
                    .iter()
                    .map(|v| v.as_i64().map(|v| DescriptorType(v as i32)))
                    .collect::<Option<Vec<_>>>()
                    .ok_or_else(|| FossilizeError::Corruption(format!("{} mutable descriptor type entry malformed", entity)))?;
                out.push(types);
            }
            PNextLink::MutableDescriptorTypeCreateInfo(out)
        }
        "renderPassMultiview" => PNextLink::RenderPassMultiviewCreateInfo {
            view_masks: field_u32_array(value, "viewMasks", entity)?,
            view_offsets: field_i32_array(value, "viewOffsets", entity)?,
            correlation_masks: field_u32_array(value, "correlationMasks", entity)?,
        },
        "rasterizationLineState" => PNextLink::PipelineRasterizationLineStateCreateInfo {
            line_rasterization_mode: LineRasterizationMode(field_i64(value, "lineRasterizationMode", entity)? as i32),
            stippled_line_enable: field_bool(value, "stippledLineEnable", entity)?,
            line_stipple_factor: field_u64(value, "lineStippleFactor", entity)? as u32,
            line_stipple_pattern: field_u64(value, "lineStipplePattern", entity)? as u16,
        },
        "rasterizationDepthClipState" => PNextLink::PipelineRasterizationDepthClipStateCreateInfo {
            depth_clip_enable: field_bool(value, "depthClipEnable", entity)?,
        },
        "colorBlendAdvancedState" => PNextLink::PipelineColorBlendAdvancedStateCreateInfo {
            src_premultiplied: field_bool(value, "srcPremultiplied", entity)?,
            dst_premultiplied: field_bool(value, "dstPremultiplied", entity)?,
            blend_overlap: BlendOverlap(field_i64(value, "blendOverlap", entity)? as i32),
        },
        "pipelineFlags2" => PNextLink::PipelineFlags2CreateInfo {
            flags: u64::from_str_radix(field_str(value, "flags", entity)?, 16)
                .map_err(|_| FossilizeError::Corruption(format!("{} has invalid flags2 hex", entity)))?,
        },
        "shaderModuleCreateInfo" => PNextLink::ShaderModuleCreateInfo(Box::new(ShaderModuleCreateInfo {
            flags: ShaderModuleCreateFlags::from_bits_truncate(field_u64(value, "flags", entity)? as u32),
            code: field_u32_array(value, "code", entity)?,
        })),
        "shaderModuleIdentifier" => PNextLink::ShaderModuleIdentifierCreateInfo {
            identifier: field_bytes(value, "identifier", entity)?,
        },
        "pipelineLibraryCreateInfo" => {
            let libraries = value
                .get("libraries")
                .and_then(Value::as_array)
                .ok_or_else(|| FossilizeError::Corruption(format!("{} missing libraries", entity)))?
                .iter()
                .map(|v| v.as_str().ok_or_else(|| FossilizeError::Corruption(format!("{} library entry not a string", entity))))
                .collect::<Result<Vec<_>>>()?
                .into_iter()
                .map(|s| parse_handle_hex(s, entity))
                .collect::<Result<Vec<_>>>()?;
            PNextLink::PipelineLibraryCreateInfo { libraries }
        }
        other => match ignorable_from_name(other) {
            Some(link) => PNextLink::Ignorable(link),
            None => {
                return Err(FossilizeError::Corruption(format!(
                    "{} has unrecognized pNext link type {:?} in archive",
                    entity, other
                )))
            }
        },
    })
}

pub fn feature_chain_to_value(links: &[FeaturePNextLink]) -> Value {
    Value::Array(links.iter().map(feature_link_to_value).collect())
}

fn feature_link_to_value(link: &FeaturePNextLink) -> Value {
    match link {
        FeaturePNextLink::Robustness2 {
            robust_buffer_access2,
            robust_image_access2,
            null_descriptor,
        } => json!({
            "type": "robustness2",
            "robustBufferAccess2": robust_buffer_access2,
            "robustImageAccess2": robust_image_access2,
            "nullDescriptor": null_descriptor,
        }),
        FeaturePNextLink::FragmentShadingRate {
            pipeline_fragment_shading_rate,
            primitive_fragment_shading_rate,
            attachment_fragment_shading_rate,
        } => json!({
            "type": "fragmentShadingRate",
            "pipelineFragmentShadingRate": pipeline_fragment_shading_rate,
            "primitiveFragmentShadingRate": primitive_fragment_shading_rate,
            "attachmentFragmentShadingRate": attachment_fragment_shading_rate,
        }),
        FeaturePNextLink::MeshShader { task_shader, mesh_shader } => json!({
            "type": "meshShader",
            "taskShader": task_shader,
            "meshShader": mesh_shader,
        }),
        FeaturePNextLink::DescriptorBuffer { descriptor_buffer } => json!({
            "type": "descriptorBuffer",
            "descriptorBuffer": descriptor_buffer,
        }),
        FeaturePNextLink::ShaderObject { shader_object } => json!({
            "type": "shaderObject",
            "shaderObject": shader_object,
        }),
        FeaturePNextLink::PrimitivesGeneratedQuery {
            primitives_generated_query,
        } => json!({
            "type": "primitivesGeneratedQuery",
            "primitivesGeneratedQuery": primitives_generated_query,
        }),
        FeaturePNextLink::ImageViewOfRenderTargetSubset3d { image2_d_view_of3_d } => json!({
            "type": "image2DViewOf3D",
            "image2DViewOf3D": image2_d_view_of3_d,
        }),
        FeaturePNextLink::BufferDeviceAddress { buffer_device_address } => json!({
            "type": "bufferDeviceAddress",
            "bufferDeviceAddress": buffer_device_address,
        }),
        FeaturePNextLink::DescriptorIndexing {
            shader_sampled_image_array_non_uniform_indexing,
            descriptor_binding_partially_bound,
            runtime_descriptor_array,
        } => json!({
            "type": "descriptorIndexing",
            "shaderSampledImageArrayNonUniformIndexing": shader_sampled_image_array_non_uniform_indexing,
            "descriptorBindingPartiallyBound": descriptor_binding_partially_bound,
            "runtimeDescriptorArray": runtime_descriptor_array,
        }),
        FeaturePNextLink::DynamicRendering { dynamic_rendering } => json!({
            "type": "dynamicRendering",
            "dynamicRendering": dynamic_rendering,
        }),
        FeaturePNextLink::MutableDescriptorType { mutable_descriptor_type } => json!({
            "type": "mutableDescriptorType",
            "mutableDescriptorType": mutable_descriptor_type,
        }),
        FeaturePNextLink::Unrecognized(stype) => json!({
            "type": "unrecognized",
            "sType": stype,
        }),
    }
}

pub fn feature_chain_from_value(value: &Value) -> Result<Vec<FeaturePNextLink>> {
    let array = value
        .as_array()
        .ok_or_else(|| FossilizeError::Corruption("feature chain is not an array".into()))?;
    array.iter().map(feature_link_from_value).collect()
}

fn feature_link_from_value(value: &Value) -> Result<FeaturePNextLink> {
    let entity = "feature chain";
    let ty = field_str(value, "type", entity)?;
    Ok(match ty {
        "robustness2" => FeaturePNextLink::Robustness2 {
            robust_buffer_access2: field_bool(value, "robustBufferAccess2", entity)?,
            robust_image_access2: field_bool(value, "robustImageAccess2", entity)?,
            null_descriptor: field_bool(value, "nullDescriptor", entity)?,
        },
        "fragmentShadingRate" => FeaturePNextLink::FragmentShadingRate {
            pipeline_fragment_shading_rate: field_bool(value, "pipelineFragmentShadingRate", entity)?,
            primitive_fragment_shading_rate: field_bool(value, "primitiveFragmentShadingRate", entity)?,
            attachment_fragment_shading_rate: field_bool(value, "attachmentFragmentShadingRate", entity)?,
        },
        "meshShader" => FeaturePNextLink::MeshShader {
            task_shader: field_bool(value, "taskShader", entity)?,
            mesh_shader: field_bool(value, "meshShader", entity)?,
        },
        "descriptorBuffer" => FeaturePNextLink::DescriptorBuffer {
            descriptor_buffer: field_bool(value, "descriptorBuffer", entity)?,
        },
        "shaderObject" => FeaturePNextLink::ShaderObject {
            shader_object: field_bool(value, "shaderObject", entity)?,
        },
        "primitivesGeneratedQuery" => FeaturePNextLink::PrimitivesGeneratedQuery {
            primitives_generated_query: field_bool(value, "primitivesGeneratedQuery", entity)?,
        },
        "image2DViewOf3D" => FeaturePNextLink::ImageViewOfRenderTargetSubset3d {
            image2_d_view_of3_d: field_bool(value, "image2DViewOf3D", entity)?,
        },
        "bufferDeviceAddress" => FeaturePNextLink::BufferDeviceAddress {
            buffer_device_address: field_bool(value, "bufferDeviceAddress", entity)?,
        },
        "descriptorIndexing" => FeaturePNextLink::DescriptorIndexing {
            shader_sampled_image_array_non_uniform_indexing: field_bool(
                value,
                "shaderSampledImageArrayNonUniformIndexing",
                entity,
            )?,
            descriptor_binding_partially_bound: field_bool(value, "descriptorBindingPartiallyBound", entity)?,
            runtime_descriptor_array: field_bool(value, "runtimeDescriptorArray", entity)?,
        },
        "dynamicRendering" => FeaturePNextLink::DynamicRendering {
            dynamic_rendering: field_bool(value, "dynamicRendering", entity)?,
        },
        "mutableDescriptorType" => FeaturePNextLink::MutableDescriptorType {
            mutable_descriptor_type: field_bool(value, "mutableDescriptorType", entity)?,
        },
        _ => FeaturePNextLink::Unrecognized(field_u64(value, "sType", entity).unwrap_or(0) as u32),
    })
}
