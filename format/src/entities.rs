//! JSON encoding for the non-pipeline, non-shader-module entities: samplers,
//! descriptor set layouts, pipeline layouts, render passes (v1/v2) and the
//! application-info/application-blob-link pair.
//!
//! Cross-entity references are resolved to content hashes at encode time
//! (spec §4.5: "Handles in fields referencing other entities are encoded
//! as 16-digit lowercase hex strings of their content hash") via a
//! [`HandleResolver`]; on decode they come back as plain `Handle` values
//! that happen to numerically equal the referenced hash, which is exactly
//! the reinterpretation spec §3 describes.

use crate::enums::{compare_op_from_raw, compare_op_to_raw};
use crate::pnext::{pnext_chain_from_value, pnext_chain_to_value};
use fossilize_canonical::HandleResolver;
use fossilize_types::application::{ApplicationBlobLink, ApplicationInfo};
use fossilize_types::common::*;
use fossilize_types::descriptor_set_layout::{DescriptorSetLayoutBinding, DescriptorSetLayoutCreateInfo};
use fossilize_types::pipeline_layout::{PipelineLayoutCreateInfo, PushConstantRange};
use fossilize_types::render_pass::*;
use fossilize_types::sampler::SamplerCreateInfo;
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

fn req_f64(value: &Value, key: &str, entity: &'static str) -> Result<f64> {
    req(value, key, entity)?
        .as_f64()
        .ok_or_else(|| FossilizeError::Corruption(format!("{} field {:?} is not a float", entity, key)))
}

fn notnan(value: &Value, key: &str, entity: &'static str) -> Result<NotNan<f32>> {
    let v = req_f64(value, key, entity)? as f32;
    NotNan::new(v).map_err(|_| FossilizeError::Corruption(format!("{} field {:?} is NaN", entity, key)))
}

fn req_array<'a>(value: &'a Value, key: &str, entity: &'static str) -> Result<&'a Vec<Value>> {
    req(value, key, entity)?
        .as_array()
        .ok_or_else(|| FossilizeError::Corruption(format!("{} field {:?} is not an array", entity, key)))
}

// ---------------------------------------------------------------------
// Sampler
// ---------------------------------------------------------------------

pub fn sampler_to_value(info: &SamplerCreateInfo) -> Result<Value> {
    Ok(json!({
        "flags": info.flags.bits(),
        "magFilter": info.mag_filter.0,
        "minFilter": info.min_filter.0,
        "mipmapMode": info.mipmap_mode.0,
        "addressModeU": info.address_mode_u.0,
        "addressModeV": info.address_mode_v.0,
        "addressModeW": info.address_mode_w.0,
        "mipLodBias": info.mip_lod_bias.into_inner(),
        "anisotropyEnable": info.anisotropy_enable,
        "maxAnisotropy": info.max_anisotropy.into_inner(),
        "compareEnable": info.compare_enable,
        "compareOp": compare_op_to_raw(info.compare_op),
        "minLod": info.min_lod.into_inner(),
        "maxLod": info.max_lod.into_inner(),
        "borderColor": info.border_color.0,
        "unnormalizedCoordinates": info.unnormalized_coordinates,
        "pNext": pnext_chain_to_value(&info.pnext, "sampler")?,
    }))
}

pub fn sampler_from_value(value: &Value) -> Result<SamplerCreateInfo> {
    let e = "sampler";
    Ok(SamplerCreateInfo {
        flags: SamplerCreateFlags::from_bits_truncate(req_u64(value, "flags", e)? as u32),
        mag_filter: Filter(req_i64(value, "magFilter", e)? as i32),
        min_filter: Filter(req_i64(value, "minFilter", e)? as i32),
        mipmap_mode: SamplerMipmapMode(req_i64(value, "mipmapMode", e)? as i32),
        address_mode_u: SamplerAddressMode(req_i64(value, "addressModeU", e)? as i32),
        address_mode_v: SamplerAddressMode(req_i64(value, "addressModeV", e)? as i32),
        address_mode_w: SamplerAddressMode(req_i64(value, "addressModeW", e)? as i32),
        mip_lod_bias: notnan(value, "mipLodBias", e)?,
        anisotropy_enable: req_bool(value, "anisotropyEnable", e)?,
        max_anisotropy: notnan(value, "maxAnisotropy", e)?,
        compare_enable: req_bool(value, "compareEnable", e)?,
        compare_op: compare_op_from_raw(req_u64(value, "compareOp", e)? as u32),
        min_lod: notnan(value, "minLod", e)?,
        max_lod: notnan(value, "maxLod", e)?,
        border_color: BorderColor(req_i64(value, "borderColor", e)? as i32),
        unnormalized_coordinates: req_bool(value, "unnormalizedCoordinates", e)?,
        pnext: pnext_chain_from_value(req(value, "pNext", e)?, e)?,
    })
}

// ---------------------------------------------------------------------
// Descriptor set layout
// ---------------------------------------------------------------------

pub fn descriptor_set_layout_to_value(info: &DescriptorSetLayoutCreateInfo, resolver: &dyn HandleResolver) -> Result<Value> {
    let mut bindings = Vec::with_capacity(info.bindings.len());
    for b in &info.bindings {
        let mut samplers = Vec::with_capacity(b.immutable_samplers.len());
        for &s in &b.immutable_samplers {
            samplers.push(hex(resolver.resolve(ResourceTag::Sampler, s)?));
        }
        bindings.push(json!({
            "binding": b.binding,
            "descriptorType": b.descriptor_type.0,
            "descriptorCount": b.descriptor_count,
            "stageFlags": b.stage_flags.bits(),
            "immutableSamplers": samplers,
        }));
    }
    Ok(json!({
        "flags": info.flags.bits(),
        "bindings": bindings,
        "pNext": pnext_chain_to_value(&info.pnext, "descriptor set layout")?,
    }))
}

pub fn descriptor_set_layout_from_value(value: &Value) -> Result<DescriptorSetLayoutCreateInfo> {
    let e = "descriptor set layout";
    let mut bindings = Vec::new();
    for b in req_array(value, "bindings", e)? {
        let samplers = req_array(b, "immutableSamplers", e)?
            .iter()
            .map(|v| v.as_str().ok_or_else(|| FossilizeError::Corruption(format!("{} immutable sampler not a string", e))))
            .collect::<Result<Vec<_>>>()?
            .into_iter()
            .map(|s| parse_hex(s, "immutable sampler hash"))
            .collect::<Result<Vec<Handle>>>()?;
        bindings.push(DescriptorSetLayoutBinding {
            binding: req_u64(b, "binding", e)? as u32,
            descriptor_type: DescriptorType(req_i64(b, "descriptorType", e)? as i32),
            descriptor_count: req_u64(b, "descriptorCount", e)? as u32,
            stage_flags: ShaderStageFlags::from_bits_truncate(req_u64(b, "stageFlags", e)? as u32),
            immutable_samplers: samplers,
        });
    }
    Ok(DescriptorSetLayoutCreateInfo {
        flags: DescriptorSetLayoutCreateFlags::from_bits_truncate(req_u64(value, "flags", e)? as u32),
        bindings,
        pnext: pnext_chain_from_value(req(value, "pNext", e)?, e)?,
    })
}

// ---------------------------------------------------------------------
// Pipeline layout
// ---------------------------------------------------------------------

pub fn pipeline_layout_to_value(info: &PipelineLayoutCreateInfo, resolver: &dyn HandleResolver) -> Result<Value> {
    let mut set_layouts = Vec::with_capacity(info.set_layouts.len());
    for sl in &info.set_layouts {
        set_layouts.push(match sl {
            Some(handle) => Value::String(hex(resolver.resolve(ResourceTag::DescriptorSetLayout, *handle)?)),
            None => Value::Null,
        });
    }
    let ranges: Vec<Value> = info
        .push_constant_ranges
        .iter()
        .map(|r| json!({ "stageFlags": r.stage_flags.bits(), "offset": r.offset, "size": r.size }))
        .collect();
    Ok(json!({
        "flags": info.flags.bits(),
        "setLayouts": set_layouts,
        "pushConstantRanges": ranges,
        "pNext": pnext_chain_to_value(&info.pnext, "pipeline layout")?,
    }))
}

pub fn pipeline_layout_from_value(value: &Value) -> Result<PipelineLayoutCreateInfo> {
    let e = "pipeline layout";
    let mut set_layouts = Vec::new();
    for sl in req_array(value, "setLayouts", e)? {
        set_layouts.push(match sl {
            Value::Null => None,
            Value::String(s) => Some(parse_hex(s, "set layout hash")?),
            _ => return Err(FossilizeError::Corruption(format!("{} set layout entry malformed", e))),
        });
    }
    let mut ranges = Vec::new();
    for r in req_array(value, "pushConstantRanges", e)? {
        ranges.push(PushConstantRange {
            stage_flags: ShaderStageFlags::from_bits_truncate(req_u64(r, "stageFlags", e)? as u32),
            offset: req_u64(r, "offset", e)? as u32,
            size: req_u64(r, "size", e)? as u32,
        });
    }
    Ok(PipelineLayoutCreateInfo {
        flags: PipelineLayoutCreateFlags::from_bits_truncate(req_u64(value, "flags", e)? as u32),
        set_layouts,
        push_constant_ranges: ranges,
        pnext: pnext_chain_from_value(req(value, "pNext", e)?, e)?,
    })
}

// ---------------------------------------------------------------------
// Render pass v1 / v2
// ---------------------------------------------------------------------

fn attachment_ref_to_value(r: &AttachmentReference) -> Value {
    json!({ "attachment": r.attachment, "layout": r.layout.0 })
}

fn attachment_ref_from_value(v: &Value, e: &'static str) -> Result<AttachmentReference> {
    Ok(AttachmentReference {
        attachment: req_u64(v, "attachment", e)? as u32,
        layout: ImageLayout(req_i64(v, "layout", e)? as i32),
    })
}

pub fn render_pass_to_value(info: &RenderPassCreateInfo) -> Result<Value> {
    let attachments: Vec<Value> = info
        .attachments
        .iter()
        .map(|a| {
            json!({
                "format": a.format.0, "samples": a.samples.bits(),
                "loadOp": a.load_op.0, "storeOp": a.store_op.0,
                "stencilLoadOp": a.stencil_load_op.0, "stencilStoreOp": a.stencil_store_op.0,
                "initialLayout": a.initial_layout.0, "finalLayout": a.final_layout.0,
            })
        })
        .collect();
    let subpasses: Vec<Value> = info
        .subpasses
        .iter()
        .map(|s| {
            json!({
                "flags": s.flags,
                "pipelineBindPoint": s.pipeline_bind_point.0,
                "inputAttachments": s.input_attachments.iter().map(attachment_ref_to_value).collect::<Vec<_>>(),
                "colorAttachments": s.color_attachments.iter().map(attachment_ref_to_value).collect::<Vec<_>>(),
                "resolveAttachments": s.resolve_attachments.iter().map(attachment_ref_to_value).collect::<Vec<_>>(),
                "depthStencilAttachment": s.depth_stencil_attachment.as_ref().map(attachment_ref_to_value),
                "preserveAttachments": s.preserve_attachments,
            })
        })
        .collect();
    let dependencies: Vec<Value> = info
        .dependencies
        .iter()
        .map(|d| {
            json!({
                "srcSubpass": d.src_subpass, "dstSubpass": d.dst_subpass,
                "srcStageMask": d.src_stage_mask, "dstStageMask": d.dst_stage_mask,
                "srcAccessMask": d.src_access_mask, "dstAccessMask": d.dst_access_mask,
                "dependencyFlags": d.dependency_flags.bits(),
            })
        })
        .collect();
    Ok(json!({
        "version": 1,
        "flags": info.flags,
        "attachments": attachments,
        "subpasses": subpasses,
        "dependencies": dependencies,
        "pNext": pnext_chain_to_value(&info.pnext, "render pass")?,
    }))
}

pub fn render_pass_from_value(value: &Value) -> Result<RenderPassCreateInfo> {
    let e = "render pass";
    let mut attachments = Vec::new();
    for a in req_array(value, "attachments", e)? {
        attachments.push(AttachmentDescription {
            flags: 0,
            format: Format(req_u64(a, "format", e)? as u32),
            samples: SampleCountFlags::from_bits_truncate(req_u64(a, "samples", e)? as u32),
            load_op: AttachmentLoadOp(req_i64(a, "loadOp", e)? as i32),
            store_op: AttachmentStoreOp(req_i64(a, "storeOp", e)? as i32),
            stencil_load_op: AttachmentLoadOp(req_i64(a, "stencilLoadOp", e)? as i32),
            stencil_store_op: AttachmentStoreOp(req_i64(a, "stencilStoreOp", e)? as i32),
            initial_layout: ImageLayout(req_i64(a, "initialLayout", e)? as i32),
            final_layout: ImageLayout(req_i64(a, "finalLayout", e)? as i32),
        });
    }
    let mut subpasses = Vec::new();
    for s in req_array(value, "subpasses", e)? {
        let input = req_array(s, "inputAttachments", e)?
            .iter()
            .map(|v| attachment_ref_from_value(v, e))
            .collect::<Result<Vec<_>>>()?;
        let color = req_array(s, "colorAttachments", e)?
            .iter()
            .map(|v| attachment_ref_from_value(v, e))
            .collect::<Result<Vec<_>>>()?;
        let resolve = req_array(s, "resolveAttachments", e)?
            .iter()
            .map(|v| attachment_ref_from_value(v, e))
            .collect::<Result<Vec<_>>>()?;
        let ds = match s.get("depthStencilAttachment") {
            Some(Value::Null) | None => None,
            Some(v) => Some(attachment_ref_from_value(v, e)?),
        };
        let preserve = req_array(s, "preserveAttachments", e)?
            .iter()
            .map(|v| v.as_u64().map(|v| v as u32))
            .collect::<Option<Vec<_>>>()
            .ok_or_else(|| FossilizeError::Corruption(format!("{} preserve attachments malformed", e)))?;
        subpasses.push(SubpassDescription {
            flags: req_u64(s, "flags", e)? as u32,
            pipeline_bind_point: PipelineBindPoint(req_i64(s, "pipelineBindPoint", e)? as i32),
            input_attachments: input,
            color_attachments: color,
            resolve_attachments: resolve,
            depth_stencil_attachment: ds,
            preserve_attachments: preserve,
        });
    }
    let mut dependencies = Vec::new();
    for d in req_array(value, "dependencies", e)? {
        dependencies.push(SubpassDependency {
            src_subpass: req_u64(d, "srcSubpass", e)? as u32,
            dst_subpass: req_u64(d, "dstSubpass", e)? as u32,
            src_stage_mask: req_u64(d, "srcStageMask", e)?,
            dst_stage_mask: req_u64(d, "dstStageMask", e)?,
            src_access_mask: req_u64(d, "srcAccessMask", e)?,
            dst_access_mask: req_u64(d, "dstAccessMask", e)?,
            dependency_flags: DependencyFlags::from_bits_truncate(req_u64(d, "dependencyFlags", e)? as u32),
        });
    }
    Ok(RenderPassCreateInfo {
        flags: req_u64(value, "flags", e)? as u32,
        attachments,
        subpasses,
        dependencies,
        pnext: pnext_chain_from_value(req(value, "pNext", e)?, e)?,
    })
}

fn attachment_ref2_to_value(r: &AttachmentReference2) -> Value {
    json!({ "attachment": r.attachment, "layout": r.layout.0, "aspectMask": r.aspect_mask })
}

fn attachment_ref2_from_value(v: &Value, e: &'static str) -> Result<AttachmentReference2> {
    Ok(AttachmentReference2 {
        attachment: req_u64(v, "attachment", e)? as u32,
        layout: ImageLayout(req_i64(v, "layout", e)? as i32),
        aspect_mask: req_u64(v, "aspectMask", e)? as u32,
    })
}

pub fn render_pass2_to_value(info: &RenderPassCreateInfo2) -> Result<Value> {
    let attachments: Vec<Value> = info
        .attachments
        .iter()
        .map(|a| {
            json!({
                "format": a.format.0, "samples": a.samples.bits(),
                "loadOp": a.load_op.0, "storeOp": a.store_op.0,
                "stencilLoadOp": a.stencil_load_op.0, "stencilStoreOp": a.stencil_store_op.0,
                "initialLayout": a.initial_layout.0, "finalLayout": a.final_layout.0,
            })
        })
        .collect();
    let mut subpasses = Vec::with_capacity(info.subpasses.len());
    for s in &info.subpasses {
        subpasses.push(json!({
            "flags": s.flags,
            "pipelineBindPoint": s.pipeline_bind_point.0,
            "viewMask": s.view_mask,
            "inputAttachments": s.input_attachments.iter().map(attachment_ref2_to_value).collect::<Vec<_>>(),
            "colorAttachments": s.color_attachments.iter().map(attachment_ref2_to_value).collect::<Vec<_>>(),
            "resolveAttachments": s.resolve_attachments.iter().map(attachment_ref2_to_value).collect::<Vec<_>>(),
            "depthStencilAttachment": s.depth_stencil_attachment.as_ref().map(attachment_ref2_to_value),
            "preserveAttachments": s.preserve_attachments,
            "pNext": pnext_chain_to_value(&s.pnext, "render pass subpass")?,
        }));
    }
    let dependencies: Vec<Value> = info
        .dependencies
        .iter()
        .map(|d| {
            json!({
                "srcSubpass": d.src_subpass, "dstSubpass": d.dst_subpass,
                "srcStageMask": d.src_stage_mask, "dstStageMask": d.dst_stage_mask,
                "srcAccessMask": d.src_access_mask, "dstAccessMask": d.dst_access_mask,
                "dependencyFlags": d.dependency_flags.bits(),
                "viewOffset": d.view_offset,
            })
        })
        .collect();
    Ok(json!({
        "version": 2,
        "flags": info.flags,
        "attachments": attachments,
        "subpasses": subpasses,
        "dependencies": dependencies,
        "correlatedViewMasks": info.correlated_view_masks,
        "pNext": pnext_chain_to_value(&info.pnext, "render pass")?,
    }))
}

pub fn render_pass2_from_value(value: &Value) -> Result<RenderPassCreateInfo2> {
    let e = "render pass v2";
    let mut attachments = Vec::new();
    for a in req_array(value, "attachments", e)? {
        attachments.push(AttachmentDescription2 {
            flags: 0,
            format: Format(req_u64(a, "format", e)? as u32),
            samples: SampleCountFlags::from_bits_truncate(req_u64(a, "samples", e)? as u32),
            load_op: AttachmentLoadOp(req_i64(a, "loadOp", e)? as i32),
            store_op: AttachmentStoreOp(req_i64(a, "storeOp", e)? as i32),
            stencil_load_op: AttachmentLoadOp(req_i64(a, "stencilLoadOp", e)? as i32),
            stencil_store_op: AttachmentStoreOp(req_i64(a, "stencilStoreOp", e)? as i32),
            initial_layout: ImageLayout(req_i64(a, "initialLayout", e)? as i32),
            final_layout: ImageLayout(req_i64(a, "finalLayout", e)? as i32),
        });
    }
    let mut subpasses = Vec::new();
    for s in req_array(value, "subpasses", e)? {
        let input = req_array(s, "inputAttachments", e)?
            .iter()
            .map(|v| attachment_ref2_from_value(v, e))
            .collect::<Result<Vec<_>>>()?;
        let color = req_array(s, "colorAttachments", e)?
            .iter()
            .map(|v| attachment_ref2_from_value(v, e))
            .collect::<Result<Vec<_>>>()?;
        let resolve = req_array(s, "resolveAttachments", e)?
            .iter()
            .map(|v| attachment_ref2_from_value(v, e))
            .collect::<Result<Vec<_>>>()?;
        let ds = match s.get("depthStencilAttachment") {
            Some(Value::Null) | None => None,
            Some(v) => Some(attachment_ref2_from_value(v, e)?),
        };
        let preserve = req_array(s, "preserveAttachments", e)?
            .iter()
            .map(|v| v.as_u64().map(|v| v as u32))
            .collect::<Option<Vec<_>>>()
            .ok_or_else(|| FossilizeError::Corruption(format!("{} preserve attachments malformed", e)))?;
        subpasses.push(SubpassDescription2 {
            flags: req_u64(s, "flags", e)? as u32,
            pipeline_bind_point: PipelineBindPoint(req_i64(s, "pipelineBindPoint", e)? as i32),
            view_mask: req_u64(s, "viewMask", e)? as u32,
            input_attachments: input,
            color_attachments: color,
            resolve_attachments: resolve,
            depth_stencil_attachment: ds,
            preserve_attachments: preserve,
            pnext: pnext_chain_from_value(req(s, "pNext", e)?, e)?,
        });
    }
    let mut dependencies = Vec::new();
    for d in req_array(value, "dependencies", e)? {
        dependencies.push(SubpassDependency2 {
            src_subpass: req_u64(d, "srcSubpass", e)? as u32,
            dst_subpass: req_u64(d, "dstSubpass", e)? as u32,
            src_stage_mask: req_u64(d, "srcStageMask", e)?,
            dst_stage_mask: req_u64(d, "dstStageMask", e)?,
            src_access_mask: req_u64(d, "srcAccessMask", e)?,
            dst_access_mask: req_u64(d, "dstAccessMask", e)?,
            dependency_flags: DependencyFlags::from_bits_truncate(req_u64(d, "dependencyFlags", e)? as u32),
            view_offset: req_i64(d, "viewOffset", e)? as i32,
        });
    }
    let correlated_view_masks = req_array(value, "correlatedViewMasks", e)?
        .iter()
        .map(|v| v.as_u64().map(|v| v as u32))
        .collect::<Option<Vec<_>>>()
        .ok_or_else(|| FossilizeError::Corruption(format!("{} correlatedViewMasks malformed", e)))?;
    Ok(RenderPassCreateInfo2 {
        flags: req_u64(value, "flags", e)? as u32,
        attachments,
        subpasses,
        dependencies,
        correlated_view_masks,
        pnext: pnext_chain_from_value(req(value, "pNext", e)?, e)?,
    })
}

// ---------------------------------------------------------------------
// Application info / blob link
// ---------------------------------------------------------------------

pub fn application_info_to_value(info: &ApplicationInfo) -> Value {
    json!({
        "applicationName": info.application_name,
        "applicationVersion": info.application_version,
        "engineName": info.engine_name,
        "engineVersion": info.engine_version,
        "apiVersion": info.api_version,
    })
}

pub fn application_info_from_value(value: &Value) -> Result<ApplicationInfo> {
    let e = "application info";
    Ok(ApplicationInfo {
        application_name: value.get("applicationName").and_then(Value::as_str).map(String::from),
        application_version: req_u64(value, "applicationVersion", e)? as u32,
        engine_name: value.get("engineName").and_then(Value::as_str).map(String::from),
        engine_version: req_u64(value, "engineVersion", e)? as u32,
        api_version: req_u64(value, "apiVersion", e)? as u32,
    })
}

pub fn application_blob_link_to_value(link: &ApplicationBlobLink) -> Value {
    json!({
        "applicationInfoHash": hex(link.application_info_hash),
        "blob": link.blob,
    })
}

pub fn application_blob_link_from_value(value: &Value) -> Result<ApplicationBlobLink> {
    let e = "application blob link";
    let hash_str = req(value, "applicationInfoHash", e)?
        .as_str()
        .ok_or_else(|| FossilizeError::Corruption(format!("{} applicationInfoHash not a string", e)))?;
    let blob = req_array(value, "blob", e)?
        .iter()
        .map(|v| v.as_u64().map(|v| v as u8))
        .collect::<Option<Vec<_>>>()
        .ok_or_else(|| FossilizeError::Corruption(format!("{} blob malformed", e)))?;
    Ok(ApplicationBlobLink {
        application_info_hash: parse_hex(hash_str, "application info hash")?,
        blob,
    })
}
