//! JSON encoding for shader stages and the three pipeline kinds.

use crate::enums::*;
use crate::pnext::{pnext_chain_from_value, pnext_chain_to_value};
use fossilize_canonical::HandleResolver;
use fossilize_types::common::*;
use fossilize_types::pipeline::compute::ComputePipelineCreateInfo;
use fossilize_types::pipeline::graphics::*;
use fossilize_types::pipeline::raytracing::{
    RaytracingPipelineCreateInfo, RaytracingPipelineInterfaceInfo, RaytracingShaderGroup, RaytracingShaderGroupType, SHADER_UNUSED,
};
use fossilize_types::pipeline::stage::{PipelineShaderStageCreateInfo, ShaderModuleRef, SpecializationInfo, SpecializationMapEntry};
use fossilize_types::pipeline::{LibraryFlags, PipelineCreateFlags};
use fossilize_types::{FossilizeError, Handle, ResourceTag, Result};
use ordered_float::NotNan;
use serde_json::{json, Value};

fn hex(v: u64) -> String {
    format!("{:016x}", v)
}

fn parse_hex(s: &str, what: &'static str) -> Result<u64> {
    u64::from_str_radix(s, 16).map_err(|_| FossilizeError::Corruption(format!("{} is not a valid hash string: {:?}", what, s)))
}

fn req<'a>(value: &'a Value, key: &str, entity: &'static str) -> Result<&'a Value> {
    value
        .get(key)
        .ok_or_else(|| FossilizeError::Corruption(format!("{} missing field {:?}", entity, key)))
}

fn req_u64(value: &Value, key: &str, entity: &'static str) -> Result<u64> {
    req(value, key, entity)?
        .as_u64()
        .ok_or_else(|| FossilizeError::Corruption(format!("{} field {:?} is not an integer", entity, key)))
}

fn req_i64(value: &Value, key: &str, entity: &'static str) -> Result<i64> {
    req(value, key, entity)?
        .as_i64()
        .ok_or_else(|| FossilizeError::Corruption(format!("{} field {:?} is not an integer", entity, key)))
}

fn req_bool(value: &Value, key: &str, entity: &'static str) -> Result<bool> {
    req(value, key, entity)?
        .as_bool()
        .ok_or_else(|| FossilizeError::Corruption(format!("{} field {:?} is not a bool", entity, key)))
}

fn req_f32(value: &Value, key: &str, entity: &'static str) -> Result<NotNan<f32>> {
    let f = req(value, key, entity)?
        .as_f64()
        .ok_or_else(|| FossilizeError::Corruption(format!("{} field {:?} is not a float", entity, key)))? as f32;
    NotNan::new(f).map_err(|_| FossilizeError::Corruption(format!("{} field {:?} is NaN", entity, key)))
}

fn req_array<'a>(value: &'a Value, key: &str, entity: &'static str) -> Result<&'a Vec<Value>> {
    req(value, key, entity)?
        .as_array()
        .ok_or_else(|| FossilizeError::Corruption(format!("{} field {:?} is not an array", entity, key)))
}

fn opt_handle_to_value(handle: Option<Handle>, tag: ResourceTag, resolver: &dyn HandleResolver) -> Result<Value> {
    match handle {
        Some(h) => Ok(Value::String(hex(resolver.resolve(tag, h)?))),
        None => Ok(Value::Null),
    }
}

fn opt_handle_from_value(value: &Value, entity: &'static str) -> Result<Option<Handle>> {
    match value {
        Value::Null => Ok(None),
        Value::String(s) => Ok(Some(parse_hex(s, entity)?)),
        _ => Err(FossilizeError::Corruption(format!("{} handle field malformed", entity))),
    }
}

// ---------------------------------------------------------------------
// Specialization info / shader stages
// ---------------------------------------------------------------------

fn specialization_info_to_value(info: &SpecializationInfo) -> Value {
    let entries: Vec<Value> = info
        .map_entries
        .iter()
        .map(|e| json!({ "constantId": e.constant_id, "offset": e.offset, "size": e.size }))
        .collect();
    json!({ "mapEntries": entries, "data": info.data })
}

fn specialization_info_from_value(value: &Value) -> Result<SpecializationInfo> {
    let e = "specialization info";
    let mut map_entries = Vec::new();
    for entry in req_array(value, "mapEntries", e)? {
        map_entries.push(SpecializationMapEntry {
            constant_id: req_u64(entry, "constantId", e)? as u32,
            offset: req_u64(entry, "offset", e)? as u32,
            size: req_u64(entry, "size", e)? as usize,
        });
    }
    let data = req_array(value, "data", e)?
        .iter()
        .map(|v| v.as_u64().map(|v| v as u8))
        .collect::<Option<Vec<_>>>()
        .ok_or_else(|| FossilizeError::Corruption(format!("{} data malformed", e)))?;
    Ok(SpecializationInfo { map_entries, data })
}

fn module_ref_to_value(module: &ShaderModuleRef, resolver: &dyn HandleResolver) -> Result<Value> {
    Ok(match module {
        ShaderModuleRef::Handle(handle) => json!({
            "type": "handle",
            "hash": hex(resolver.resolve(ResourceTag::ShaderModule, *handle)?),
        }),
        ShaderModuleRef::Inline(info) => json!({
            "type": "inline",
            "flags": info.flags.bits(),
            "code": info.code,
        }),
        ShaderModuleRef::Identifier(identifier) => json!({
            "type": "identifier",
            "identifier": identifier,
        }),
    })
}

fn module_ref_from_value(value: &Value, entity: &'static str) -> Result<ShaderModuleRef> {
    let ty = req(value, "type", entity)?
        .as_str()
        .ok_or_else(|| FossilizeError::Corruption(format!("{} module ref type not a string", entity)))?;
    Ok(match ty {
        "handle" => {
            let hash = req(value, "hash", entity)?
                .as_str()
                .ok_or_else(|| FossilizeError::Corruption(format!("{} module ref hash not a string", entity)))?;
            ShaderModuleRef::Handle(parse_hex(hash, "shader module hash")?)
        }
        "inline" => {
            use fossilize_types::shader_module::{ShaderModuleCreateFlags, ShaderModuleCreateInfo};
            let code = req_array(value, "code", entity)?
                .iter()
                .map(|v| v.as_u64().map(|v| v as u32))
                .collect::<Option<Vec<_>>>()
                .ok_or_else(|| FossilizeError::Corruption(format!("{} inline module code malformed", entity)))?;
            ShaderModuleRef::Inline(Box::new(ShaderModuleCreateInfo {
                flags: ShaderModuleCreateFlags::from_bits_truncate(req_u64(value, "flags", entity)? as u32),
                code,
            }))
        }
        "identifier" => {
            let identifier = req_array(value, "identifier", entity)?
                .iter()
                .map(|v| v.as_u64().map(|v| v as u8))
                .collect::<Option<Vec<_>>>()
                .ok_or_else(|| FossilizeError::Corruption(format!("{} identifier malformed", entity)))?;
            ShaderModuleRef::Identifier(identifier)
        }
        other => return Err(FossilizeError::Corruption(format!("{} unrecognized module ref type {:?}", entity, other))),
    })
}

fn stage_to_value(stage: &PipelineShaderStageCreateInfo, resolver: &dyn HandleResolver) -> Result<Value> {
    Ok(json!({
        "flags": stage.flags,
        "stage": stage.stage.bits(),
        "module": module_ref_to_value(&stage.module, resolver)?,
        "name": stage.entry_point,
        "specializationInfo": stage.specialization_info.as_ref().map(specialization_info_to_value),
        "pNext": pnext_chain_to_value(&stage.pnext, "shader stage")?,
    }))
}

fn stage_from_value(value: &Value) -> Result<PipelineShaderStageCreateInfo> {
    let e = "shader stage";
    let specialization_info = match value.get("specializationInfo") {
        Some(Value::Null) | None => None,
        Some(v) => Some(specialization_info_from_value(v)?),
    };
    Ok(PipelineShaderStageCreateInfo {
        flags: req_u64(value, "flags", e)? as u32,
        stage: ShaderStageFlags::from_bits_truncate(req_u64(value, "stage", e)? as u32),
        module: module_ref_from_value(req(value, "module", e)?, e)?,
        entry_point: req(value, "name", e)?
            .as_str()
            .ok_or_else(|| FossilizeError::Corruption(format!("{} name not a string", e)))?
            .to_string(),
        specialization_info,
        pnext: pnext_chain_from_value(req(value, "pNext", e)?, e)?,
    })
}

fn stages_to_value(stages: &[PipelineShaderStageCreateInfo], resolver: &dyn HandleResolver) -> Result<Value> {
    let mut out = Vec::with_capacity(stages.len());
    for s in stages {
        out.push(stage_to_value(s, resolver)?);
    }
    Ok(Value::Array(out))
}

fn stages_from_value(value: &Value, entity: &'static str) -> Result<Vec<PipelineShaderStageCreateInfo>> {
    req_array(value, "stages", entity)?.iter().map(stage_from_value).collect()
}

// ---------------------------------------------------------------------
// Compute
// ---------------------------------------------------------------------

pub fn compute_pipeline_to_value(info: &ComputePipelineCreateInfo, resolver: &dyn HandleResolver) -> Result<Value> {
    Ok(json!({
        "flags": info.flags.normalized().bits(),
        "stage": stage_to_value(&info.stage, resolver)?,
        "layout": opt_handle_to_value(info.layout, ResourceTag::PipelineLayout, resolver)?,
        "basePipeline": opt_handle_to_value(info.base_pipeline, ResourceTag::ComputePipeline, resolver)?,
        "basePipelineIndex": info.base_pipeline_index,
        "pNext": pnext_chain_to_value(&info.pnext, "compute pipeline")?,
    }))
}

pub fn compute_pipeline_from_value(value: &Value) -> Result<ComputePipelineCreateInfo> {
    let e = "compute pipeline";
    Ok(ComputePipelineCreateInfo {
        flags: PipelineCreateFlags::from_bits_truncate(req_u64(value, "flags", e)? as u32),
        stage: stage_from_value(req(value, "stage", e)?)?,
        layout: opt_handle_from_value(req(value, "layout", e)?, "pipeline layout hash")?,
        base_pipeline: opt_handle_from_value(req(value, "basePipeline", e)?, "base pipeline hash")?,
        base_pipeline_index: req_i64(value, "basePipelineIndex", e)? as i32,
        pnext: pnext_chain_from_value(req(value, "pNext", e)?, e)?,
    })
}

// ---------------------------------------------------------------------
// Raytracing
// ---------------------------------------------------------------------

fn group_type_to_raw(ty: RaytracingShaderGroupType) -> u32 {
    match ty {
        RaytracingShaderGroupType::General => 0,
        RaytracingShaderGroupType::TrianglesHitGroup => 1,
        RaytracingShaderGroupType::ProceduralHitGroup => 2,
    }
}

fn group_type_from_raw(v: u32) -> RaytracingShaderGroupType {
    match v {
        1 => RaytracingShaderGroupType::TrianglesHitGroup,
        2 => RaytracingShaderGroupType::ProceduralHitGroup,
        _ => RaytracingShaderGroupType::General,
    }
}

fn group_to_value(group: &RaytracingShaderGroup) -> Value {
    json!({
        "type": group_type_to_raw(group.ty),
        "generalShader": group.general_shader,
        "closestHitShader": group.closest_hit_shader,
        "anyHitShader": group.any_hit_shader,
        "intersectionShader": group.intersection_shader,
    })
}

fn group_from_value(value: &Value) -> Result<RaytracingShaderGroup> {
    let e = "raytracing shader group";
    Ok(RaytracingShaderGroup {
        ty: group_type_from_raw(req_u64(value, "type", e)? as u32),
        general_shader: value.get("generalShader").and_then(Value::as_u64).unwrap_or(SHADER_UNUSED as u64) as u32,
        closest_hit_shader: value.get("closestHitShader").and_then(Value::as_u64).unwrap_or(SHADER_UNUSED as u64) as u32,
        any_hit_shader: value.get("anyHitShader").and_then(Value::as_u64).unwrap_or(SHADER_UNUSED as u64) as u32,
        intersection_shader: value.get("intersectionShader").and_then(Value::as_u64).unwrap_or(SHADER_UNUSED as u64) as u32,
    })
}

pub fn raytracing_pipeline_to_value(info: &RaytracingPipelineCreateInfo, resolver: &dyn HandleResolver) -> Result<Value> {
    let mut libraries = Vec::with_capacity(info.libraries.len());
    for &lib in &info.libraries {
        libraries.push(hex(resolver.resolve(ResourceTag::RaytracingPipeline, lib)?));
    }
    Ok(json!({
        "flags": info.flags.normalized().bits(),
        "stages": stages_to_value(&info.stages, resolver)?,
        "groups": info.groups.iter().map(group_to_value).collect::<Vec<_>>(),
        "maxPipelineRayRecursionDepth": info.max_pipeline_ray_recursion_depth,
        "libraries": libraries,
        "libraryInterface": info.library_interface.map(|iface| json!({
            "maxPipelineRayPayloadSize": iface.max_pipeline_ray_payload_size,
            "maxPipelineRayHitAttributeSize": iface.max_pipeline_ray_hit_attribute_size,
        })),
        "dynamicStackSize": info.dynamic_stack_size,
        "layout": opt_handle_to_value(info.layout, ResourceTag::PipelineLayout, resolver)?,
        "basePipeline": opt_handle_to_value(info.base_pipeline, ResourceTag::RaytracingPipeline, resolver)?,
        "basePipelineIndex": info.base_pipeline_index,
        "pNext": pnext_chain_to_value(&info.pnext, "raytracing pipeline")?,
    }))
}

pub fn raytracing_pipeline_from_value(value: &Value) -> Result<RaytracingPipelineCreateInfo> {
    let e = "raytracing pipeline";
    let groups = req_array(value, "groups", e)?.iter().map(group_from_value).collect::<Result<Vec<_>>>()?;
    let libraries = req_array(value, "libraries", e)?
        .iter()
        .map(|v| v.as_str().ok_or_else(|| FossilizeError::Corruption(format!("{} library entry not a string", e))))
        .collect::<Result<Vec<_>>>()?
        .into_iter()
        .map(|s| parse_hex(s, "raytracing library hash"))
        .collect::<Result<Vec<_>>>()?;
    let library_interface = match value.get("libraryInterface") {
        Some(Value::Null) | None => None,
        Some(v) => Some(RaytracingPipelineInterfaceInfo {
            max_pipeline_ray_payload_size: req_u64(v, "maxPipelineRayPayloadSize", e)? as u32,
            max_pipeline_ray_hit_attribute_size: req_u64(v, "maxPipelineRayHitAttributeSize", e)? as u32,
        }),
    };
    Ok(RaytracingPipelineCreateInfo {
        flags: PipelineCreateFlags::from_bits_truncate(req_u64(value, "flags", e)? as u32),
        stages: stages_from_value(value, e)?,
        groups,
        max_pipeline_ray_recursion_depth: req_u64(value, "maxPipelineRayRecursionDepth", e)? as u32,
        libraries,
        library_interface,
        dynamic_stack_size: req_bool(value, "dynamicStackSize", e)?,
        layout: opt_handle_from_value(req(value, "layout", e)?, "pipeline layout hash")?,
        base_pipeline: opt_handle_from_value(req(value, "basePipeline", e)?, "base pipeline hash")?,
        base_pipeline_index: req_i64(value, "basePipelineIndex", e)? as i32,
        pnext: pnext_chain_from_value(req(value, "pNext", e)?, e)?,
    })
}

// ---------------------------------------------------------------------
// Graphics
// ---------------------------------------------------------------------

fn dynamic_state_list_to_value(info: &PipelineDynamicStateCreateInfo) -> Value {
    Value::Array(info.dynamic_states.iter().map(|s| json!(s.to_raw())).collect())
}

fn dynamic_state_list_from_value(value: &Value, entity: &'static str) -> Result<PipelineDynamicStateCreateInfo> {
    let dynamic_states = req_array(value, "dynamicState", entity)?
        .iter()
        .map(|v| v.as_i64().map(|v| DynamicState::from_raw(v as i32)))
        .collect::<Option<Vec<_>>>()
        .ok_or_else(|| FossilizeError::Corruption(format!("{} dynamicState malformed", entity)))?;
    Ok(PipelineDynamicStateCreateInfo { dynamic_states })
}

fn vertex_input_to_value(state: &VertexInputState) -> Value {
    let bindings: Vec<Value> = state
        .bindings
        .iter()
        .map(|b| {
            json!({
                "binding": b.binding,
                "stride": b.stride,
                "inputRate": matches!(b.input_rate, VertexInputRate::Instance) as u32,
            })
        })
        .collect();
    let attributes: Vec<Value> = state
        .attributes
        .iter()
        .map(|a| json!({ "location": a.location, "binding": a.binding, "format": a.format.0, "offset": a.offset }))
        .collect();
    json!({ "bindings": bindings, "attributes": attributes })
}

fn vertex_input_from_value(value: &Value) -> Result<VertexInputState> {
    let e = "vertex input state";
    let mut bindings = Vec::new();
    for b in req_array(value, "bindings", e)? {
        bindings.push(VertexInputBindingDescription {
            binding: req_u64(b, "binding", e)? as u32,
            stride: req_u64(b, "stride", e)? as u32,
            input_rate: if req_u64(b, "inputRate", e)? != 0 {
                VertexInputRate::Instance
            } else {
                VertexInputRate::Vertex
            },
        });
    }
    let mut attributes = Vec::new();
    for a in req_array(value, "attributes", e)? {
        attributes.push(VertexInputAttributeDescription {
            location: req_u64(a, "location", e)? as u32,
            binding: req_u64(a, "binding", e)? as u32,
            format: Format(req_u64(a, "format", e)? as u32),
            offset: req_u64(a, "offset", e)? as u32,
        });
    }
    Ok(VertexInputState { bindings, attributes })
}

fn viewport_to_value(v: &Viewport) -> Value {
    json!({
        "x": v.x.into_inner(), "y": v.y.into_inner(),
        "width": v.width.into_inner(), "height": v.height.into_inner(),
        "minDepth": v.min_depth.into_inner(), "maxDepth": v.max_depth.into_inner(),
    })
}

fn viewport_from_value(value: &Value, e: &'static str) -> Result<Viewport> {
    Ok(Viewport {
        x: req_f32(value, "x", e)?,
        y: req_f32(value, "y", e)?,
        width: req_f32(value, "width", e)?,
        height: req_f32(value, "height", e)?,
        min_depth: req_f32(value, "minDepth", e)?,
        max_depth: req_f32(value, "maxDepth", e)?,
    })
}

fn scissor_to_value(s: &ScissorRect) -> Value {
    json!({ "x": s.x, "y": s.y, "width": s.width, "height": s.height })
}

fn scissor_from_value(value: &Value, e: &'static str) -> Result<ScissorRect> {
    Ok(ScissorRect {
        x: req_i64(value, "x", e)? as i32,
        y: req_i64(value, "y", e)? as i32,
        width: req_u64(value, "width", e)? as u32,
        height: req_u64(value, "height", e)? as u32,
    })
}

fn viewport_state_to_value(state: &ViewportState) -> Value {
    json!({
        "viewportCount": state.viewport_count,
        "viewports": state.viewports.iter().map(viewport_to_value).collect::<Vec<_>>(),
        "scissorCount": state.scissor_count,
        "scissors": state.scissors.iter().map(scissor_to_value).collect::<Vec<_>>(),
    })
}

fn viewport_state_from_value(value: &Value) -> Result<ViewportState> {
    let e = "viewport state";
    let viewports = req_array(value, "viewports", e)?.iter().map(|v| viewport_from_value(v, e)).collect::<Result<Vec<_>>>()?;
    let scissors = req_array(value, "scissors", e)?.iter().map(|v| scissor_from_value(v, e)).collect::<Result<Vec<_>>>()?;
    Ok(ViewportState {
        viewport_count: req_u64(value, "viewportCount", e)? as u32,
        viewports,
        scissor_count: req_u64(value, "scissorCount", e)? as u32,
        scissors,
    })
}

fn rasterization_state_to_value(state: &RasterizationState) -> Result<Value> {
    Ok(json!({
        "depthClampEnable": state.depth_clamp_enable,
        "rasterizerDiscardEnable": state.rasterizer_discard_enable,
        "polygonMode": state.polygon_mode.0,
        "cullMode": state.cull_mode.bits(),
        "frontFace": state.front_face.0,
        "depthBiasEnable": state.depth_bias_enable,
        "depthBiasConstantFactor": state.depth_bias_constant_factor.into_inner(),
        "depthBiasClamp": state.depth_bias_clamp.into_inner(),
        "depthBiasSlopeFactor": state.depth_bias_slope_factor.into_inner(),
        "lineWidth": state.line_width.into_inner(),
        "pNext": pnext_chain_to_value(&state.pnext, "rasterization state")?,
    }))
}

fn rasterization_state_from_value(value: &Value) -> Result<RasterizationState> {
    let e = "rasterization state";
    Ok(RasterizationState {
        depth_clamp_enable: req_bool(value, "depthClampEnable", e)?,
        rasterizer_discard_enable: req_bool(value, "rasterizerDiscardEnable", e)?,
        polygon_mode: PolygonMode(req_i64(value, "polygonMode", e)? as i32),
        cull_mode: CullModeFlags::from_bits_truncate(req_u64(value, "cullMode", e)? as u32),
        front_face: FrontFace(req_i64(value, "frontFace", e)? as i32),
        depth_bias_enable: req_bool(value, "depthBiasEnable", e)?,
        depth_bias_constant_factor: req_f32(value, "depthBiasConstantFactor", e)?,
        depth_bias_clamp: req_f32(value, "depthBiasClamp", e)?,
        depth_bias_slope_factor: req_f32(value, "depthBiasSlopeFactor", e)?,
        line_width: req_f32(value, "lineWidth", e)?,
        pnext: pnext_chain_from_value(req(value, "pNext", e)?, e)?,
    })
}

fn multisample_state_to_value(state: &MultisampleState) -> Value {
    json!({
        "rasterizationSamples": state.rasterization_samples.bits(),
        "sampleShadingEnable": state.sample_shading_enable,
        "minSampleShading": state.min_sample_shading.into_inner(),
        "sampleMask": state.sample_mask,
        "alphaToCoverageEnable": state.alpha_to_coverage_enable,
        "alphaToOneEnable": state.alpha_to_one_enable,
    })
}

fn multisample_state_from_value(value: &Value) -> Result<MultisampleState> {
    let e = "multisample state";
    let sample_mask = match value.get("sampleMask") {
        Some(Value::Null) | None => None,
        Some(v) => Some(
            v.as_array()
                .ok_or_else(|| FossilizeError::Corruption(format!("{} sampleMask malformed", e)))?
                .iter()
                .map(|v| v.as_u64().map(|v| v as u32))
                .collect::<Option<Vec<_>>>()
                .ok_or_else(|| FossilizeError::Corruption(format!("{} sampleMask malformed", e)))?,
        ),
    };
    Ok(MultisampleState {
        rasterization_samples: SampleCountFlags::from_bits_truncate(req_u64(value, "rasterizationSamples", e)? as u32),
        sample_shading_enable: req_bool(value, "sampleShadingEnable", e)?,
        min_sample_shading: req_f32(value, "minSampleShading", e)?,
        sample_mask,
        alpha_to_coverage_enable: req_bool(value, "alphaToCoverageEnable", e)?,
        alpha_to_one_enable: req_bool(value, "alphaToOneEnable", e)?,
    })
}

fn stencil_op_state_to_value(s: &StencilOpState) -> Value {
    json!({
        "failOp": stencil_op_to_raw(s.fail_op.0),
        "passOp": stencil_op_to_raw(s.pass_op.0),
        "depthFailOp": stencil_op_to_raw(s.depth_fail_op.0),
        "compareOp": compare_op_to_raw(s.compare_op.0),
        "compareMask": s.compare_mask,
        "writeMask": s.write_mask,
        "reference": s.reference,
    })
}

fn stencil_op_state_from_value(value: &Value, e: &'static str) -> Result<StencilOpState> {
    Ok(StencilOpState {
        fail_op: StencilOpValue(stencil_op_from_raw(req_u64(value, "failOp", e)? as u32)),
        pass_op: StencilOpValue(stencil_op_from_raw(req_u64(value, "passOp", e)? as u32)),
        depth_fail_op: StencilOpValue(stencil_op_from_raw(req_u64(value, "depthFailOp", e)? as u32)),
        compare_op: CompareOpValue(compare_op_from_raw(req_u64(value, "compareOp", e)? as u32)),
        compare_mask: req_u64(value, "compareMask", e)? as u32,
        write_mask: req_u64(value, "writeMask", e)? as u32,
        reference: req_u64(value, "reference", e)? as u32,
    })
}

fn depth_stencil_state_to_value(state: &DepthStencilState) -> Value {
    json!({
        "depthTestEnable": state.depth_test_enable,
        "depthWriteEnable": state.depth_write_enable,
        "depthCompareOp": compare_op_to_raw(state.depth_compare_op),
        "depthBoundsTestEnable": state.depth_bounds_test_enable,
        "minDepthBounds": state.min_depth_bounds.into_inner(),
        "maxDepthBounds": state.max_depth_bounds.into_inner(),
        "stencilTestEnable": state.stencil_test_enable,
        "front": stencil_op_state_to_value(&state.front),
        "back": stencil_op_state_to_value(&state.back),
    })
}

fn depth_stencil_state_from_value(value: &Value) -> Result<DepthStencilState> {
    let e = "depth stencil state";
    Ok(DepthStencilState {
        depth_test_enable: req_bool(value, "depthTestEnable", e)?,
        depth_write_enable: req_bool(value, "depthWriteEnable", e)?,
        depth_compare_op: compare_op_from_raw(req_u64(value, "depthCompareOp", e)? as u32),
        depth_bounds_test_enable: req_bool(value, "depthBoundsTestEnable", e)?,
        min_depth_bounds: req_f32(value, "minDepthBounds", e)?,
        max_depth_bounds: req_f32(value, "maxDepthBounds", e)?,
        stencil_test_enable: req_bool(value, "stencilTestEnable", e)?,
        front: stencil_op_state_from_value(req(value, "front", e)?, e)?,
        back: stencil_op_state_from_value(req(value, "back", e)?, e)?,
    })
}

fn color_blend_attachment_to_value(a: &ColorBlendAttachmentState) -> Value {
    json!({
        "blendEnable": a.blend_enable,
        "srcColorBlendFactor": blend_factor_to_raw(a.src_color_blend_factor),
        "dstColorBlendFactor": blend_factor_to_raw(a.dst_color_blend_factor),
        "colorBlendOp": blend_op_to_raw(a.color_blend_op),
        "srcAlphaBlendFactor": blend_factor_to_raw(a.src_alpha_blend_factor),
        "dstAlphaBlendFactor": blend_factor_to_raw(a.dst_alpha_blend_factor),
        "alphaBlendOp": blend_op_to_raw(a.alpha_blend_op),
        "colorWriteMask": a.color_write_mask.bits(),
    })
}

fn color_blend_attachment_from_value(value: &Value) -> Result<ColorBlendAttachmentState> {
    let e = "color blend attachment";
    Ok(ColorBlendAttachmentState {
        blend_enable: req_bool(value, "blendEnable", e)?,
        src_color_blend_factor: blend_factor_from_raw(req_u64(value, "srcColorBlendFactor", e)? as u32),
        dst_color_blend_factor: blend_factor_from_raw(req_u64(value, "dstColorBlendFactor", e)? as u32),
        color_blend_op: blend_op_from_raw(req_u64(value, "colorBlendOp", e)? as u32),
        src_alpha_blend_factor: blend_factor_from_raw(req_u64(value, "srcAlphaBlendFactor", e)? as u32),
        dst_alpha_blend_factor: blend_factor_from_raw(req_u64(value, "dstAlphaBlendFactor", e)? as u32),
        alpha_blend_op: blend_op_from_raw(req_u64(value, "alphaBlendOp", e)? as u32),
        color_write_mask: ColorComponentFlags::from_bits_truncate(req_u64(value, "colorWriteMask", e)? as u32),
    })
}

fn color_blend_state_to_value(state: &ColorBlendState) -> Value {
    json!({
        "logicOpEnable": state.logic_op_enable,
        "logicOp": state.logic_op.map(logic_op_to_raw),
        "attachments": state.attachments.iter().map(color_blend_attachment_to_value).collect::<Vec<_>>(),
        "blendConstants": state.blend_constants.iter().map(|c| c.into_inner()).collect::<Vec<_>>(),
    })
}

fn color_blend_state_from_value(value: &Value) -> Result<ColorBlendState> {
    let e = "color blend state";
    let logic_op = match value.get("logicOp") {
        Some(Value::Null) | None => None,
        Some(v) => Some(logic_op_from_raw(
            v.as_u64().ok_or_else(|| FossilizeError::Corruption(format!("{} logicOp malformed", e)))? as u32,
        )),
    };
    let attachments = req_array(value, "attachments", e)?
        .iter()
        .map(color_blend_attachment_from_value)
        .collect::<Result<Vec<_>>>()?;
    let constants = req_array(value, "blendConstants", e)?;
    if constants.len() != 4 {
        return Err(FossilizeError::Corruption(format!("{} blendConstants must have 4 entries", e)));
    }
    let mut blend_constants = [NotNan::new(0.0f32).unwrap(); 4];
    for (i, c) in constants.iter().enumerate() {
        let f = c.as_f64().ok_or_else(|| FossilizeError::Corruption(format!("{} blendConstants malformed", e)))? as f32;
        blend_constants[i] = NotNan::new(f).map_err(|_| FossilizeError::Corruption(format!("{} blendConstants is NaN", e)))?;
    }
    Ok(ColorBlendState {
        logic_op_enable: req_bool(value, "logicOpEnable", e)?,
        logic_op,
        attachments,
        blend_constants,
    })
}

pub fn graphics_pipeline_to_value(info: &GraphicsPipelineCreateInfo, resolver: &dyn HandleResolver) -> Result<Value> {
    let mut libraries = Vec::with_capacity(info.libraries.len());
    for &lib in &info.libraries {
        libraries.push(hex(resolver.resolve(ResourceTag::GraphicsPipeline, lib)?));
    }
    Ok(json!({
        "flags": info.flags.normalized().bits(),
        "libraryFlags": info.library_flags.bits(),
        "libraries": libraries,
        "stages": stages_to_value(&info.stages, resolver)?,
        "vertexInputState": info.vertex_input_state.as_ref().map(vertex_input_to_value),
        "inputAssemblyState": info.input_assembly_state.as_ref().map(|s| json!({
            "topology": s.topology.0, "primitiveRestartEnable": s.primitive_restart_enable,
        })),
        "tessellationState": info.tessellation_state.as_ref().map(|s| json!({ "patchControlPoints": s.patch_control_points })),
        "viewportState": info.viewport_state.as_ref().map(viewport_state_to_value),
        "rasterizationState": info.rasterization_state.as_ref().map(rasterization_state_to_value).transpose()?,
        "multisampleState": info.multisample_state.as_ref().map(multisample_state_to_value),
        "depthStencilState": info.depth_stencil_state.as_ref().map(depth_stencil_state_to_value),
        "colorBlendState": info.color_blend_state.as_ref().map(color_blend_state_to_value),
        "dynamicState": dynamic_state_list_to_value(&info.dynamic_state),
        "layout": opt_handle_to_value(info.layout, ResourceTag::PipelineLayout, resolver)?,
        "renderPass": opt_handle_to_value(info.render_pass, ResourceTag::RenderPass, resolver)?,
        "subpass": info.subpass,
        "basePipeline": opt_handle_to_value(info.base_pipeline, ResourceTag::GraphicsPipeline, resolver)?,
        "basePipelineIndex": info.base_pipeline_index,
        "pNext": pnext_chain_to_value(&info.pnext, "graphics pipeline")?,
    }))
}

pub fn graphics_pipeline_from_value(value: &Value) -> Result<GraphicsPipelineCreateInfo> {
    let e = "graphics pipeline";
    let libraries = req_array(value, "libraries", e)?
        .iter()
        .map(|v| v.as_str().ok_or_else(|| FossilizeError::Corruption(format!("{} library entry not a string", e))))
        .collect::<Result<Vec<_>>>()?
        .into_iter()
        .map(|s| parse_hex(s, "graphics library hash"))
        .collect::<Result<Vec<_>>>()?;

    let vertex_input_state = match value.get("vertexInputState") {
        Some(Value::Null) | None => None,
        Some(v) => Some(vertex_input_from_value(v)?),
    };
    let input_assembly_state = match value.get("inputAssemblyState") {
        Some(Value::Null) | None => None,
        Some(v) => Some(InputAssemblyState {
            topology: PrimitiveTopology(req_i64(v, "topology", e)? as i32),
            primitive_restart_enable: req_bool(v, "primitiveRestartEnable", e)?,
        }),
    };
    let tessellation_state = match value.get("tessellationState") {
        Some(Value::Null) | None => None,
        Some(v) => Some(TessellationState {
            patch_control_points: req_u64(v, "patchControlPoints", e)? as u32,
        }),
    };
    let viewport_state = match value.get("viewportState") {
        Some(Value::Null) | None => None,
        Some(v) => Some(viewport_state_from_value(v)?),
    };
    let rasterization_state = match value.get("rasterizationState") {
        Some(Value::Null) | None => None,
        Some(v) => Some(rasterization_state_from_value(v)?),
    };
    let multisample_state = match value.get("multisampleState") {
        Some(Value::Null) | None => None,
        Some(v) => Some(multisample_state_from_value(v)?),
    };
    let depth_stencil_state = match value.get("depthStencilState") {
        Some(Value::Null) | None => None,
        Some(v) => Some(depth_stencil_state_from_value(v)?),
    };
    let color_blend_state = match value.get("colorBlendState") {
        Some(Value::Null) | None => None,
        Some(v) => Some(color_blend_state_from_value(v)?),
    };

    Ok(GraphicsPipelineCreateInfo {
        flags: PipelineCreateFlags::from_bits_truncate(req_u64(value, "flags", e)? as u32),
        stages: stages_from_value(value, e)?,
        vertex_input_state,
        input_assembly_state,
        tessellation_state,
        viewport_state,
        rasterization_state,
        multisample_state,
        depth_stencil_state,
        color_blend_state,
        dynamic_state: dynamic_state_list_from_value(value, e)?,
        layout: opt_handle_from_value(req(value, "layout", e)?, "pipeline layout hash")?,
        render_pass: opt_handle_from_value(req(value, "renderPass", e)?, "render pass hash")?,
        subpass: req_u64(value, "subpass", e)? as u32,
        base_pipeline: opt_handle_from_value(req(value, "basePipeline", e)?, "base pipeline hash")?,
        base_pipeline_index: req_i64(value, "basePipelineIndex", e)? as i32,
        library_flags: LibraryFlags::from_bits_truncate(req_u64(value, "libraryFlags", e)? as u32),
        libraries,
        pnext: pnext_chain_from_value(req(value, "pNext", e)?, e)?,
    })
}
