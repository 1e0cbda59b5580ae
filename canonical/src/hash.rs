//! Per-entity canonical hash functions.
//!
//! Each `hash_*` function is a pure function of a live (or deep-copied)
//! create-info graph plus a [`HandleResolver`] for cross-references: given
//! the same descriptor and the same `handle -> hash` mapping, it always
//! produces the same 64-bit digest, regardless of allocation order, pointer
//! values, or anything else not explicitly fed through [`Hasher64`].

use crate::{HandleResolver, Result};
use fossilize_hash::Hasher64;
use fossilize_types::application::{ApplicationFeatureInfo, ApplicationInfo};
use fossilize_types::common::*;
use fossilize_types::descriptor_set_layout::DescriptorSetLayoutCreateInfo;
use fossilize_types::pipeline::compute::ComputePipelineCreateInfo;
use fossilize_types::pipeline::graphics::{
    ColorBlendState, GraphicsPipelineCreateInfo, RasterizationState,
};
use fossilize_types::pipeline::raytracing::RaytracingPipelineCreateInfo;
use fossilize_types::pipeline::stage::{PipelineShaderStageCreateInfo, ShaderModuleRef};
use fossilize_types::pipeline::LibraryFlags;
use fossilize_types::pipeline_layout::PipelineLayoutCreateInfo;
use fossilize_types::pnext::{FeaturePNextLink, PNextLink};
use fossilize_types::render_pass::{RenderPassCreateInfo, RenderPassCreateInfo2, SubpassMeta};
use fossilize_types::sampler::SamplerCreateInfo;
use fossilize_types::shader_module::ShaderModuleCreateInfo;
use fossilize_types::{FossilizeError, Hash, ResourceTag};
use ordered_float::NotNan;

trait HasherExt {
    fn bool_(&mut self, v: bool) -> &mut Self;
    fn notnan(&mut self, v: NotNan<f32>) -> &mut Self;
}

impl HasherExt for Hasher64 {
    fn bool_(&mut self, v: bool) -> &mut Self {
        self.u32(v as u32)
    }

    fn notnan(&mut self, v: NotNan<f32>) -> &mut Self {
        self.f32(v.into_inner())
    }
}

/// Shader module: exact SPIR-V bytes and `flags`, nothing else.
pub fn hash_shader_module(info: &ShaderModuleCreateInfo) -> Hash {
    Hasher64::new()
        .u32(info.flags.bits())
        .u32(info.code.len() as u32)
        .bytes(&info.code_bytes())
        .finish()
}

/// Resolves and hashes a stage's shader module, by handle, by an inline
/// `SHADER_MODULE_CREATE_INFO` (recursively hashed), or by a driver-stable
/// identifier (looked up in the recorder's identifier table).
fn hash_module_ref(module: &ShaderModuleRef, resolver: &dyn HandleResolver) -> Result<Hash> {
    match module {
        ShaderModuleRef::Handle(handle) => resolver.resolve(ResourceTag::ShaderModule, *handle),
        ShaderModuleRef::Inline(info) => Ok(hash_shader_module(info)),
        ShaderModuleRef::Identifier(id) => resolver.resolve_identifier(id),
    }
}

fn hash_stage(h: &mut Hasher64, stage: &PipelineShaderStageCreateInfo, resolver: &dyn HandleResolver) -> Result<()> {
    h.u32(stage.flags).u32(stage.stage.bits());
    h.u64(hash_module_ref(&stage.module, resolver)?);
    h.string(&stage.entry_point);
    match &stage.specialization_info {
        Some(spec) => {
            h.bool_(true);
            h.u32(spec.map_entries.len() as u32);
            for entry in &spec.map_entries {
                h.u32(entry.constant_id).u32(entry.offset).u32(entry.size as u32);
            }
            h.u32(spec.data.len() as u32).bytes(&spec.data);
        }
        None => {
            h.bool_(false);
        }
    }
    hash_pnext(h, &stage.pnext, "shader stage")?;
    Ok(())
}

/// Walks a main-chain pNext list, applying each recognized sType's
/// hash contribution. Known-ignorable sTypes are walked but contribute
/// nothing; an unrecognized sType is a hard failure.
pub fn hash_pnext(h: &mut Hasher64, links: &[PNextLink], entity: &'static str) -> Result<()> {
    h.u32(links.len() as u32);
    for link in links {
        match link {
            PNextLink::SamplerYcbcrConversionInfo(info) => {
                h.u32(1);
                h.u32(info.format.0)
                    .s32(info.ycbcr_model)
                    .s32(info.ycbcr_range)
                    .s32(info.components_r)
                    .s32(info.components_g)
                    .s32(info.components_b)
                    .s32(info.components_a)
                    .s32(info.x_chroma_offset)
                    .s32(info.y_chroma_offset)
                    .u32(info.chroma_filter.0 as u32)
                    .bool_(info.force_explicit_reconstruction);
            }
            PNextLink::SamplerReductionModeCreateInfo { reduction_mode } => {
                h.u32(2).u32(reduction_mode.0 as u32);
            }
            PNextLink::DescriptorSetLayoutBindingFlags(flags) => {
                h.u32(3).u32(flags.len() as u32);
                for f in flags {
                    h.u32(f.bits());
                }
            }
            PNextLink::MutableDescriptorTypeCreateInfo(lists) => {
                h.u32(4).u32(lists.len() as u32);
                for list in lists {
                    h.u32(list.len() as u32);
                    for ty in list {
                        h.u32(ty.0 as u32);
                    }
                }
            }
            PNextLink::RenderPassMultiviewCreateInfo {
                view_masks,
                view_offsets,
                correlation_masks,
            } => {
                h.u32(5).u32(view_masks.len() as u32);
                for v in view_masks {
                    h.u32(*v);
                }
                h.u32(view_offsets.len() as u32);
                for v in view_offsets {
                    h.s32(*v);
                }
                h.u32(correlation_masks.len() as u32);
                for v in correlation_masks {
                    h.u32(*v);
                }
            }
            PNextLink::PipelineRasterizationLineStateCreateInfo {
                line_rasterization_mode,
                stippled_line_enable,
                line_stipple_factor,
                line_stipple_pattern,
            } => {
                h.u32(6)
                    .u32(line_rasterization_mode.0 as u32)
                    .bool_(*stippled_line_enable)
                    .u32(*line_stipple_factor)
                    .u32(*line_stipple_pattern as u32);
            }
            PNextLink::PipelineRasterizationDepthClipStateCreateInfo { depth_clip_enable } => {
                h.u32(7).bool_(*depth_clip_enable);
            }
            PNextLink::PipelineColorBlendAdvancedStateCreateInfo {
                src_premultiplied,
                dst_premultiplied,
                blend_overlap,
            } => {
                h.u32(8)
                    .bool_(*src_premultiplied)
                    .bool_(*dst_premultiplied)
                    .u32(blend_overlap.0 as u32);
            }
            PNextLink::PipelineFlags2CreateInfo { flags } => {
                h.u32(9).u64(*flags);
            }
            PNextLink::ShaderModuleCreateInfo(info) => {
                h.u32(10).u64(hash_shader_module(info));
            }
            PNextLink::ShaderModuleIdentifierCreateInfo { identifier } => {
                h.u32(11).u32(identifier.len() as u32).bytes(identifier);
            }
            PNextLink::PipelineLibraryCreateInfo { libraries } => {
                h.u32(12).u32(libraries.len() as u32);
                for lib in libraries {
                    h.u64(*lib);
                }
            }
            PNextLink::Ignorable(_) => {
                // Walked, but contributes nothing: creation feedback, tool
                // info, debug object name, validation features, pipeline
                // binary info are all driver/tooling annotations that
                // don't affect the compiled result.
                h.u32(0);
            }
            PNextLink::Unknown(stype) => {
                return Err(FossilizeError::UnknownPNext {
                    entity,
                    stype: *stype,
                });
            }
        }
    }
    Ok(())
}

fn hash_feature_chain(h: &mut Hasher64, links: &[FeaturePNextLink]) {
    h.u32(links.len() as u32);
    for link in links {
        match link {
            FeaturePNextLink::Robustness2 {
                robust_buffer_access2,
                robust_image_access2,
                null_descriptor,
            } => {
                h.u32(1)
                    .bool_(*robust_buffer_access2)
                    .bool_(*robust_image_access2)
                    .bool_(*null_descriptor);
            }
            FeaturePNextLink::FragmentShadingRate {
                pipeline_fragment_shading_rate,
                primitive_fragment_shading_rate,
                attachment_fragment_shading_rate,
            } => {
                h.u32(2)
                    .bool_(*pipeline_fragment_shading_rate)
                    .bool_(*primitive_fragment_shading_rate)
                    .bool_(*attachment_fragment_shading_rate);
            }
            FeaturePNextLink::MeshShader { task_shader, mesh_shader } => {
                h.u32(3).bool_(*task_shader).bool_(*mesh_shader);
            }
            FeaturePNextLink::DescriptorBuffer { descriptor_buffer } => {
                h.u32(4).bool_(*descriptor_buffer);
            }
            FeaturePNextLink::ShaderObject { shader_object } => {
                h.u32(5).bool_(*shader_object);
            }
            FeaturePNextLink::PrimitivesGeneratedQuery {
                primitives_generated_query,
            } => {
                h.u32(6).bool_(*primitives_generated_query);
            }
            FeaturePNextLink::ImageViewOfRenderTargetSubset3d { image2_d_view_of3_d } => {
                h.u32(7).bool_(*image2_d_view_of3_d);
            }
            FeaturePNextLink::BufferDeviceAddress { buffer_device_address } => {
                h.u32(8).bool_(*buffer_device_address);
            }
            FeaturePNextLink::DescriptorIndexing {
                shader_sampled_image_array_non_uniform_indexing,
                descriptor_binding_partially_bound,
                runtime_descriptor_array,
            } => {
                h.u32(9)
                    .bool_(*shader_sampled_image_array_non_uniform_indexing)
                    .bool_(*descriptor_binding_partially_bound)
                    .bool_(*runtime_descriptor_array);
            }
            FeaturePNextLink::DynamicRendering { dynamic_rendering } => {
                h.u32(10).bool_(*dynamic_rendering);
            }
            FeaturePNextLink::MutableDescriptorType { mutable_descriptor_type } => {
                h.u32(11).bool_(*mutable_descriptor_type);
            }
            FeaturePNextLink::Unrecognized(_) => {
                // Not in the whitelist: ignored entirely, not even a
                // length-preserving placeholder, since it contributes
                // nothing to compilation.
            }
        }
    }
}

pub fn hash_sampler(info: &SamplerCreateInfo) -> Result<Hash> {
    let mut h = Hasher64::new();
    let flags = info.flags & !SamplerCreateFlags::CAPTURE_REPLAY_MASK;
    h.u32(flags.bits())
        .u32(info.mag_filter.0 as u32)
        .u32(info.min_filter.0 as u32)
        .u32(info.mipmap_mode.0 as u32)
        .u32(info.address_mode_u.0 as u32)
        .u32(info.address_mode_v.0 as u32)
        .u32(info.address_mode_w.0 as u32)
        .notnan(info.mip_lod_bias)
        .bool_(info.anisotropy_enable)
        .notnan(info.max_anisotropy)
        .bool_(info.compare_enable)
        .u32(info.compare_op as u32)
        .notnan(info.min_lod)
        .notnan(info.max_lod)
        .u32(info.border_color.0 as u32)
        .bool_(info.unnormalized_coordinates);
    hash_pnext(&mut h, &info.pnext, "sampler")?;
    Ok(h.finish())
}

pub fn hash_descriptor_set_layout(
    info: &DescriptorSetLayoutCreateInfo,
    resolver: &dyn HandleResolver,
) -> Result<Hash> {
    let mut h = Hasher64::new();
    h.u32(info.bindings.len() as u32).u32(info.flags.bits());
    for binding in &info.bindings {
        h.u32(binding.binding)
            .u32(binding.descriptor_count)
            .u32(binding.descriptor_type.0 as u32)
            .u32(binding.stage_flags.bits());
        h.u32(binding.immutable_samplers.len() as u32);
        for &sampler in &binding.immutable_samplers {
            h.u64(resolver.resolve(ResourceTag::Sampler, sampler)?);
        }
    }
    hash_pnext(&mut h, &info.pnext, "descriptor set layout")?;
    Ok(h.finish())
}

pub fn hash_pipeline_layout(info: &PipelineLayoutCreateInfo, resolver: &dyn HandleResolver) -> Result<Hash> {
    let mut h = Hasher64::new();
    h.u32(info.flags.bits()).u32(info.set_layouts.len() as u32);
    for set_layout in &info.set_layouts {
        match set_layout {
            Some(handle) => h.u64(resolver.resolve(ResourceTag::DescriptorSetLayout, *handle)?),
            None => h.u64(0),
        };
    }
    h.u32(info.push_constant_ranges.len() as u32);
    for range in &info.push_constant_ranges {
        h.u32(range.stage_flags.bits()).u32(range.offset).u32(range.size);
    }
    hash_pnext(&mut h, &info.pnext, "pipeline layout")?;
    Ok(h.finish())
}

fn hash_render_pass_common(
    h: &mut Hasher64,
    flags: u32,
    attachment_count: usize,
    subpass_count: usize,
    dependency_count: usize,
) {
    h.u32(flags)
        .u32(attachment_count as u32)
        .u32(subpass_count as u32)
        .u32(dependency_count as u32);
}

pub fn hash_render_pass(info: &RenderPassCreateInfo) -> Result<Hash> {
    let mut h = Hasher64::new();
    h.u32(0); // version discriminator: v1
    hash_render_pass_common(
        &mut h,
        info.flags,
        info.attachments.len(),
        info.subpasses.len(),
        info.dependencies.len(),
    );
    for a in &info.attachments {
        h.u32(a.format.0)
            .u32(a.samples.bits())
            .u32(a.load_op.0 as u32)
            .u32(a.store_op.0 as u32)
            .u32(a.stencil_load_op.0 as u32)
            .u32(a.stencil_store_op.0 as u32)
            .s32(a.initial_layout.0)
            .s32(a.final_layout.0);
    }
    for s in &info.subpasses {
        h.u32(s.flags).u32(s.pipeline_bind_point.0 as u32);
        h.u32(s.input_attachments.len() as u32);
        for r in &s.input_attachments {
            h.u32(r.attachment).s32(r.layout.0);
        }
        h.u32(s.color_attachments.len() as u32);
        for r in &s.color_attachments {
            h.u32(r.attachment).s32(r.layout.0);
        }
        h.u32(s.resolve_attachments.len() as u32);
        for r in &s.resolve_attachments {
            h.u32(r.attachment).s32(r.layout.0);
        }
        match &s.depth_stencil_attachment {
            Some(r) => h.bool_(true).u32(r.attachment).s32(r.layout.0),
            None => h.bool_(false),
        };
        h.u32(s.preserve_attachments.len() as u32);
        for &p in &s.preserve_attachments {
            h.u32(p);
        }
    }
    for d in &info.dependencies {
        h.u32(d.src_subpass)
            .u32(d.dst_subpass)
            .u64(d.src_stage_mask)
            .u64(d.dst_stage_mask)
            .u64(d.src_access_mask)
            .u64(d.dst_access_mask)
            .u32(d.dependency_flags.bits());
    }
    hash_pnext(&mut h, &info.pnext, "render pass")?;
    Ok(h.finish())
}

pub fn hash_render_pass2(info: &RenderPassCreateInfo2) -> Result<Hash> {
    let mut h = Hasher64::new();
    h.u32(1); // version discriminator: v2
    hash_render_pass_common(
        &mut h,
        info.flags,
        info.attachments.len(),
        info.subpasses.len(),
        info.dependencies.len(),
    );
    for a in &info.attachments {
        h.u32(a.format.0)
            .u32(a.samples.bits())
            .u32(a.load_op.0 as u32)
            .u32(a.store_op.0 as u32)
            .u32(a.stencil_load_op.0 as u32)
            .u32(a.stencil_store_op.0 as u32)
            .s32(a.initial_layout.0)
            .s32(a.final_layout.0);
    }
    for s in &info.subpasses {
        h.u32(s.flags).u32(s.pipeline_bind_point.0 as u32).u32(s.view_mask);
        h.u32(s.input_attachments.len() as u32);
        for r in &s.input_attachments {
            h.u32(r.attachment).s32(r.layout.0).u32(r.aspect_mask);
        }
        h.u32(s.color_attachments.len() as u32);
        for r in &s.color_attachments {
            h.u32(r.attachment).s32(r.layout.0).u32(r.aspect_mask);
        }
        h.u32(s.resolve_attachments.len() as u32);
        for r in &s.resolve_attachments {
            h.u32(r.attachment).s32(r.layout.0).u32(r.aspect_mask);
        }
        match &s.depth_stencil_attachment {
            Some(r) => h.bool_(true).u32(r.attachment).s32(r.layout.0).u32(r.aspect_mask),
            None => h.bool_(false),
        };
        h.u32(s.preserve_attachments.len() as u32);
        for &p in &s.preserve_attachments {
            h.u32(p);
        }
        hash_pnext(&mut h, &s.pnext, "render pass subpass")?;
    }
    for d in &info.dependencies {
        h.u32(d.src_subpass)
            .u32(d.dst_subpass)
            .u64(d.src_stage_mask)
            .u64(d.dst_stage_mask)
            .u64(d.src_access_mask)
            .u64(d.dst_access_mask)
            .u32(d.dependency_flags.bits())
            .s32(d.view_offset);
    }
    h.u32(info.correlated_view_masks.len() as u32);
    for &m in &info.correlated_view_masks {
        h.u32(m);
    }
    hash_pnext(&mut h, &info.pnext, "render pass")?;
    Ok(h.finish())
}

fn hash_rasterization_state(h: &mut Hasher64, state: &RasterizationState, dyn_: &[DynamicState]) -> Result<()> {
    let contains = |s: DynamicState| dyn_.contains(&s);
    h.bool_(state.depth_clamp_enable);
    h.bool_(if contains(DynamicState::RasterizerDiscardEnable) {
        false
    } else {
        state.rasterizer_discard_enable
    });
    h.u32(state.polygon_mode.0 as u32);
    h.u32(if contains(DynamicState::CullMode) {
        0
    } else {
        state.cull_mode.bits()
    });
    h.u32(if contains(DynamicState::FrontFace) {
        0
    } else {
        state.front_face.0 as u32
    });
    let depth_bias_enable = if contains(DynamicState::DepthBiasEnable) {
        false
    } else {
        state.depth_bias_enable
    };
    h.bool_(depth_bias_enable);
    if contains(DynamicState::DepthBias) || !depth_bias_enable {
        h.notnan(NotNan::new(0.0).unwrap())
            .notnan(NotNan::new(0.0).unwrap())
            .notnan(NotNan::new(0.0).unwrap());
    } else {
        h.notnan(state.depth_bias_constant_factor)
            .notnan(state.depth_bias_clamp)
            .notnan(state.depth_bias_slope_factor);
    }
    h.notnan(if contains(DynamicState::LineWidth) {
        NotNan::new(0.0).unwrap()
    } else {
        state.line_width
    });
    hash_pnext(h, &state.pnext, "rasterization state")?;
    Ok(())
}

fn hash_color_blend_state(h: &mut Hasher64, state: &ColorBlendState, dyn_: &[DynamicState]) {
    let contains = |s: DynamicState| dyn_.contains(&s);
    h.bool_(state.logic_op_enable);
    h.u32(state.logic_op.map_or(0, |op| op as u32));
    h.u32(state.attachments.len() as u32);
    let mut any_uses_blend_constants = false;
    for a in &state.attachments {
        let blend_enable = if contains(DynamicState::ColorBlendEnable) {
            false
        } else {
            a.blend_enable
        };
        h.bool_(blend_enable);
        if contains(DynamicState::ColorBlendEquation) {
            h.u32(0).u32(0).u32(0).u32(0).u32(0);
        } else {
            h.u32(a.src_color_blend_factor as u32)
                .u32(a.dst_color_blend_factor as u32)
                .u32(a.color_blend_op as u32)
                .u32(a.src_alpha_blend_factor as u32)
                .u32(a.dst_alpha_blend_factor as u32);
            h.u32(a.alpha_blend_op as u32);
            if blend_enable && a.uses_blend_constants() {
                any_uses_blend_constants = true;
            }
        }
        h.u32(if contains(DynamicState::ColorWriteMask) {
            0
        } else {
            a.color_write_mask.bits()
        });
    }
    if contains(DynamicState::ColorBlendEquation) {
        // A dynamic blend equation means any attachment could legally use
        // constants at draw time; the constants must be hashed.
        any_uses_blend_constants = true;
    }
    if contains(DynamicState::BlendConstants) || any_uses_blend_constants {
        for c in &state.blend_constants {
            h.notnan(*c);
        }
    } else {
        for _ in 0..4 {
            h.notnan(NotNan::new(0.0).unwrap());
        }
    }
}

pub fn hash_graphics_pipeline(
    info: &GraphicsPipelineCreateInfo,
    resolver: &dyn HandleResolver,
    subpass_meta: Option<SubpassMeta>,
) -> Result<Hash> {
    let mut h = Hasher64::new();

    let flags = info.flags.normalized();
    let flags2 = info.pnext.iter().find_map(|l| match l {
        PNextLink::PipelineFlags2CreateInfo { flags } => Some(*flags),
        _ => None,
    });
    h.u64(flags2.unwrap_or(flags.bits() as u64));

    if info.is_derivative() {
        match info.base_pipeline {
            Some(handle) => h.u64(resolver.resolve(ResourceTag::GraphicsPipeline, handle)?),
            None => h.u64(0),
        };
        h.s32(info.base_pipeline_index);
    } else {
        h.u64(0).s32(0);
    }

    match info.layout {
        Some(handle) => h.u64(resolver.resolve(ResourceTag::PipelineLayout, handle)?),
        None => h.u64(0),
    };
    match info.render_pass {
        Some(handle) => h.u64(resolver.resolve(ResourceTag::RenderPass, handle)?),
        None => h.u64(0),
    };
    h.u32(info.subpass);

    let meta = subpass_meta.unwrap_or(SubpassMeta {
        uses_color: true,
        uses_depth_stencil: true,
    });

    let has_library = !info.library_flags.is_empty();
    let live = |iface: LibraryFlags| !has_library || info.library_flags.contains(iface);

    h.u32(info.stages.len() as u32);
    for stage in &info.stages {
        hash_stage(&mut h, stage, resolver)?;
    }

    if live(LibraryFlags::VERTEX_INPUT_INTERFACE) {
        match &info.vertex_input_state {
            Some(vi) => {
                h.bool_(true);
                h.u32(vi.bindings.len() as u32);
                for b in &vi.bindings {
                    h.u32(b.binding).u32(b.stride).u32(b.input_rate as u32);
                }
                h.u32(vi.attributes.len() as u32);
                for a in &vi.attributes {
                    h.u32(a.location).u32(a.binding).u32(a.format.0).u32(a.offset);
                }
            }
            None => {
                h.bool_(false);
            }
        };
        match &info.input_assembly_state {
            Some(ia) => h.bool_(true).u32(ia.topology.0 as u32).bool_(ia.primitive_restart_enable),
            None => h.bool_(false),
        };
    } else {
        h.bool_(false).bool_(false);
    }

    match &info.tessellation_state {
        Some(ts) if live(LibraryFlags::PRE_RASTERIZATION_SHADERS) => {
            h.bool_(true).u32(ts.patch_control_points)
        }
        _ => h.bool_(false),
    };

    if live(LibraryFlags::PRE_RASTERIZATION_SHADERS) {
        match &info.viewport_state {
            Some(vp) => {
                h.bool_(true);
                h.u32(vp.viewport_count).u32(vp.viewports.len() as u32);
                for v in &vp.viewports {
                    h.notnan(v.x)
                        .notnan(v.y)
                        .notnan(v.width)
                        .notnan(v.height)
                        .notnan(v.min_depth)
                        .notnan(v.max_depth);
                }
                h.u32(vp.scissor_count).u32(vp.scissors.len() as u32);
                for s in &vp.scissors {
                    h.s32(s.x).s32(s.y).u32(s.width).u32(s.height);
                }
            }
            None => {
                h.bool_(false);
            }
        };
        match &info.rasterization_state {
            Some(rs) => {
                h.bool_(true);
                hash_rasterization_state(&mut h, rs, &info.dynamic_state.dynamic_states)?;
            }
            None => {
                h.bool_(false);
            }
        };
    } else {
        h.bool_(false).bool_(false);
    }

    if live(LibraryFlags::FRAGMENT_SHADER) && meta.uses_depth_stencil {
        match &info.depth_stencil_state {
            Some(ds) => {
                h.bool_(true);
                let dyn_ = &info.dynamic_state.dynamic_states;
                let contains = |s: DynamicState| dyn_.contains(&s);
                h.bool_(if contains(DynamicState::DepthTestEnable) {
                    false
                } else {
                    ds.depth_test_enable
                });
                h.bool_(if contains(DynamicState::DepthWriteEnable) {
                    false
                } else {
                    ds.depth_write_enable
                });
                h.u32(if contains(DynamicState::DepthCompareOp) {
                    0
                } else {
                    ds.depth_compare_op as u32
                });
                let bounds_enable = if contains(DynamicState::DepthBoundsTestEnable) {
                    false
                } else {
                    ds.depth_bounds_test_enable
                };
                h.bool_(bounds_enable);
                if bounds_enable && !contains(DynamicState::DepthBounds) {
                    h.notnan(ds.min_depth_bounds).notnan(ds.max_depth_bounds);
                } else {
                    h.notnan(NotNan::new(0.0).unwrap()).notnan(NotNan::new(0.0).unwrap());
                }
                let stencil_enable = if contains(DynamicState::StencilTestEnable) {
                    false
                } else {
                    ds.stencil_test_enable
                };
                h.bool_(stencil_enable);
                for op_state in [&ds.front, &ds.back] {
                    if !stencil_enable {
                        h.u32(0).u32(0).u32(0).u32(0);
                    } else if contains(DynamicState::StencilOp) {
                        h.u32(0).u32(0).u32(0).u32(op_state.compare_op.0 as u32);
                    } else {
                        h.u32(op_state.fail_op.0 as u32)
                            .u32(op_state.pass_op.0 as u32)
                            .u32(op_state.depth_fail_op.0 as u32)
                            .u32(op_state.compare_op.0 as u32);
                    }
                    let (compare_mask, write_mask, reference) = if !stencil_enable {
                        (0, 0, 0)
                    } else {
                        (
                            if contains(DynamicState::StencilCompareMask) {
                                0
                            } else {
                                op_state.compare_mask
                            },
                            if contains(DynamicState::StencilWriteMask) {
                                0
                            } else {
                                op_state.write_mask
                            },
                            if contains(DynamicState::StencilReference) {
                                0
                            } else {
                                op_state.reference
                            },
                        )
                    };
                    h.u32(compare_mask).u32(write_mask).u32(reference);
                }
            }
            None => {
                h.bool_(false);
            }
        };
    } else {
        h.bool_(false);
    }

    match &info.multisample_state {
        Some(ms) => {
            h.bool_(true);
            h.u32(ms.rasterization_samples.bits())
                .bool_(ms.sample_shading_enable)
                .notnan(ms.min_sample_shading);
            match &ms.sample_mask {
                Some(mask) => {
                    h.bool_(true).u32(mask.len() as u32);
                    for &m in mask {
                        h.u32(m);
                    }
                }
                None => {
                    h.bool_(false);
                }
            };
            h.bool_(ms.alpha_to_coverage_enable).bool_(ms.alpha_to_one_enable);
        }
        None => {
            h.bool_(false);
        }
    };

    if live(LibraryFlags::FRAGMENT_OUTPUT_INTERFACE) && meta.uses_color {
        match &info.color_blend_state {
            Some(cb) => {
                h.bool_(true);
                hash_color_blend_state(&mut h, cb, &info.dynamic_state.dynamic_states);
            }
            None => {
                h.bool_(false);
            }
        };
    } else {
        h.bool_(false);
    }

    h.u32(info.dynamic_state.dynamic_states.len() as u32);
    for ds in &info.dynamic_state.dynamic_states {
        h.s32(ds.to_raw());
    }

    h.u32(info.library_flags.bits());
    h.u32(info.libraries.len() as u32);
    for &lib in &info.libraries {
        h.u64(resolver.resolve(ResourceTag::GraphicsPipeline, lib)?);
    }

    hash_pnext(&mut h, &info.pnext, "graphics pipeline")?;
    Ok(h.finish())
}

pub fn hash_compute_pipeline(info: &ComputePipelineCreateInfo, resolver: &dyn HandleResolver) -> Result<Hash> {
    let mut h = Hasher64::new();
    match info.layout {
        Some(handle) => h.u64(resolver.resolve(ResourceTag::PipelineLayout, handle)?),
        None => h.u64(0),
    };
    h.u32(info.flags.normalized().bits());
    if info.is_derivative() {
        match info.base_pipeline {
            Some(handle) => h.u64(resolver.resolve(ResourceTag::ComputePipeline, handle)?),
            None => h.u64(0),
        };
        h.s32(info.base_pipeline_index);
    } else {
        h.u64(0).s32(0);
    }
    hash_stage(&mut h, &info.stage, resolver)?;
    hash_pnext(&mut h, &info.pnext, "compute pipeline")?;
    Ok(h.finish())
}

pub fn hash_raytracing_pipeline(
    info: &RaytracingPipelineCreateInfo,
    resolver: &dyn HandleResolver,
) -> Result<Hash> {
    let mut h = Hasher64::new();
    h.u32(info.flags.normalized().bits());
    h.u32(info.max_pipeline_ray_recursion_depth);
    match info.layout {
        Some(handle) => h.u64(resolver.resolve(ResourceTag::PipelineLayout, handle)?),
        None => h.u64(0),
    };
    if info.is_derivative() {
        match info.base_pipeline {
            Some(handle) => h.u64(resolver.resolve(ResourceTag::RaytracingPipeline, handle)?),
            None => h.u64(0),
        };
        h.s32(info.base_pipeline_index);
    } else {
        h.u64(0).s32(0);
    }
    h.u32(info.stages.len() as u32);
    for stage in &info.stages {
        hash_stage(&mut h, stage, resolver)?;
    }
    match &info.library_interface {
        Some(iface) => h
            .bool_(true)
            .u32(iface.max_pipeline_ray_payload_size)
            .u32(iface.max_pipeline_ray_hit_attribute_size),
        None => h.bool_(false),
    };
    h.bool_(info.dynamic_stack_size);
    h.u32(info.groups.len() as u32);
    for g in &info.groups {
        h.u32(g.ty as u32)
            .u32(g.general_shader)
            .u32(g.closest_hit_shader)
            .u32(g.any_hit_shader)
            .u32(g.intersection_shader);
    }
    h.u32(info.libraries.len() as u32);
    for &lib in &info.libraries {
        h.u64(resolver.resolve(ResourceTag::RaytracingPipeline, lib)?);
    }
    hash_pnext(&mut h, &info.pnext, "raytracing pipeline")?;
    Ok(h.finish())
}

pub fn hash_application_info(info: &ApplicationInfo) -> Hash {
    let mut h = Hasher64::new();
    match &info.application_name {
        Some(name) => h.bool_(true).string(name),
        None => h.bool_(false),
    };
    h.u32(info.application_version);
    match &info.engine_name {
        Some(name) => h.bool_(true).string(name),
        None => h.bool_(false),
    };
    h.u32(info.engine_version).u32(info.api_version);
    h.finish()
}

pub fn hash_feature_info(features: &ApplicationFeatureInfo) -> Hash {
    let mut h = Hasher64::new();
    hash_feature_chain(&mut h, &features.links);
    h.finish()
}

/// Combines the application-info hash and feature-chain hash into a single
/// per-application/feature identifier used to tag stored blobs.
pub fn hash_application_feature(app_info_hash: Hash, feature_hash: Hash) -> Hash {
    Hasher64::new().u64(app_info_hash).u64(feature_hash).finish()
}

pub fn hash_application_blob_link(app_feature_hash: Hash, tag: ResourceTag, blob_hash: Hash) -> Hash {
    Hasher64::new()
        .u64(app_feature_hash)
        .u32(tag.to_raw() as u32)
        .u64(blob_hash)
        .finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use fossilize_types::application::ApplicationInfo;

    #[test]
    fn application_info_is_deterministic() {
        let info = ApplicationInfo {
            application_name: Some("demo".into()),
            application_version: 1,
            engine_name: None,
            engine_version: 0,
            api_version: 4206343, // VK_API_VERSION_1_3
        };
        assert_eq!(hash_application_info(&info), hash_application_info(&info));
    }

    #[test]
    fn shader_module_hash_depends_on_code() {
        let a = ShaderModuleCreateInfo {
            flags: Default::default(),
            code: vec![1, 2, 3],
        };
        let b = ShaderModuleCreateInfo {
            flags: Default::default(),
            code: vec![1, 2, 4],
        };
        assert_ne!(hash_shader_module(&a), hash_shader_module(&b));
    }

    #[test]
    fn sampler_hash_ignores_capture_replay_flag() {
        let mut a = sample_sampler();
        let mut b = sample_sampler();
        a.flags = SamplerCreateFlags::empty();
        b.flags = SamplerCreateFlags::DESCRIPTOR_BUFFER_CAPTURE_REPLAY;
        assert_eq!(hash_sampler(&a).unwrap(), hash_sampler(&b).unwrap());
    }

    fn sample_sampler() -> SamplerCreateInfo {
        SamplerCreateInfo {
            flags: SamplerCreateFlags::empty(),
            mag_filter: Filter(0),
            min_filter: Filter(0),
            mipmap_mode: SamplerMipmapMode(0),
            address_mode_u: SamplerAddressMode(0),
            address_mode_v: SamplerAddressMode(0),
            address_mode_w: SamplerAddressMode(0),
            mip_lod_bias: NotNan::new(0.0).unwrap(),
            anisotropy_enable: false,
            max_anisotropy: NotNan::new(1.0).unwrap(),
            compare_enable: false,
            compare_op: CompareOp::Never,
            min_lod: NotNan::new(0.0).unwrap(),
            max_lod: NotNan::new(0.0).unwrap(),
            border_color: BorderColor(0),
            unnormalized_coordinates: false,
            pnext: Vec::new(),
        }
    }
}
