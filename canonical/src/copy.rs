//! Arena-based deep copy (spec §4.4).
//!
//! Turns a live create-info graph into a value the recorder can hand off to
//! the background worker thread after the application's own pointers (and,
//! in the synchronized-replay case, stack frame) go away. Two things happen
//! at once: a structural copy of every array/struct/string the live
//! descriptor references, and *dead-state pruning* — clearing sub-structures
//! and sub-fields that §4.3 would hash as absent anyway, so later hashing
//! and serialization never have to ask "is this live?" again.
//!
//! The top-level entity value is placed in the caller's [`ScratchAllocator`]
//! so repeated `record_*` calls don't pay a heap allocation per entity; the
//! `Vec`/`String`/`Box` fields inside each entity still come from the global
//! allocator; the type graph already owns its own growable storage (see
//! `fossilize-types`), so there is nothing to gain by also threading arena
//! lifetimes through every nested field.

use crate::Result;
use fossilize_arena::ScratchAllocator;
use fossilize_types::application::{ApplicationBlobLink, ApplicationFeatureInfo, ApplicationInfo};
use fossilize_types::common::DynamicState;
use fossilize_types::descriptor_set_layout::DescriptorSetLayoutCreateInfo;
use fossilize_types::pipeline::compute::ComputePipelineCreateInfo;
use fossilize_types::pipeline::graphics::GraphicsPipelineCreateInfo;
use fossilize_types::pipeline::raytracing::RaytracingPipelineCreateInfo;
use fossilize_types::pipeline::stage::{PipelineShaderStageCreateInfo, ShaderModuleRef};
use fossilize_types::pipeline::LibraryFlags;
use fossilize_types::pipeline_layout::PipelineLayoutCreateInfo;
use fossilize_types::pnext::PNextLink;
use fossilize_types::render_pass::{RenderPassCreateInfo, RenderPassCreateInfo2, SubpassMeta};
use fossilize_types::sampler::SamplerCreateInfo;
use fossilize_types::shader_module::ShaderModuleCreateInfo;
use fossilize_types::{FossilizeError, Handle};

/// Resolves an inline shader module's driver-stable identifier at record
/// time, so it can be spliced into the stage's pNext chain (spec §4.4
/// "Identifier injection"). Left unimplemented (returning `None`) on
/// platforms/drivers without `VK_EXT_shader_module_identifier`.
pub trait ModuleIdentifierSource {
    fn identifier_for(&self, module: &ShaderModuleCreateInfo) -> Option<Vec<u8>>;
}

/// No identifier support: every inline module copies through unchanged.
pub struct NoModuleIdentifiers;

impl ModuleIdentifierSource for NoModuleIdentifiers {
    fn identifier_for(&self, _module: &ShaderModuleCreateInfo) -> Option<Vec<u8>> {
        None
    }
}

fn copy_pnext(links: &[PNextLink], entity: &'static str) -> Result<Vec<PNextLink>> {
    for link in links {
        if let PNextLink::Unknown(stype) = link {
            return Err(FossilizeError::UnknownPNext { entity, stype: *stype });
        }
    }
    Ok(links.to_vec())
}

pub fn copy_shader_module<'a>(
    arena: &'a mut ScratchAllocator,
    info: &ShaderModuleCreateInfo,
) -> &'a mut ShaderModuleCreateInfo {
    arena.alloc(info.clone())
}

pub fn copy_sampler<'a>(arena: &'a mut ScratchAllocator, info: &SamplerCreateInfo) -> Result<&'a mut SamplerCreateInfo> {
    let mut copy = info.clone();
    copy.pnext = copy_pnext(&info.pnext, "sampler")?;
    Ok(arena.alloc(copy))
}

pub fn copy_descriptor_set_layout<'a>(
    arena: &'a mut ScratchAllocator,
    info: &DescriptorSetLayoutCreateInfo,
) -> Result<&'a mut DescriptorSetLayoutCreateInfo> {
    let mut copy = info.clone();
    copy.pnext = copy_pnext(&info.pnext, "descriptor set layout")?;
    Ok(arena.alloc(copy))
}

pub fn copy_pipeline_layout<'a>(
    arena: &'a mut ScratchAllocator,
    info: &PipelineLayoutCreateInfo,
) -> Result<&'a mut PipelineLayoutCreateInfo> {
    let mut copy = info.clone();
    copy.pnext = copy_pnext(&info.pnext, "pipeline layout")?;
    Ok(arena.alloc(copy))
}

pub fn copy_render_pass<'a>(
    arena: &'a mut ScratchAllocator,
    info: &RenderPassCreateInfo,
) -> Result<&'a mut RenderPassCreateInfo> {
    let mut copy = info.clone();
    copy.pnext = copy_pnext(&info.pnext, "render pass")?;
    Ok(arena.alloc(copy))
}

pub fn copy_render_pass2<'a>(
    arena: &'a mut ScratchAllocator,
    info: &RenderPassCreateInfo2,
) -> Result<&'a mut RenderPassCreateInfo2> {
    let mut copy = info.clone();
    for (src, dst) in info.subpasses.iter().zip(copy.subpasses.iter_mut()) {
        dst.pnext = copy_pnext(&src.pnext, "render pass subpass")?;
    }
    copy.pnext = copy_pnext(&info.pnext, "render pass")?;
    Ok(arena.alloc(copy))
}

fn copy_stage(
    stage: &PipelineShaderStageCreateInfo,
    identifiers: &dyn ModuleIdentifierSource,
) -> Result<PipelineShaderStageCreateInfo> {
    let mut copy = stage.clone();
    copy.pnext = copy_pnext(&stage.pnext, "shader stage")?;

    if let ShaderModuleRef::Inline(module) = &stage.module {
        if let Some(identifier) = identifiers.identifier_for(module) {
            copy.pnext.push(PNextLink::ShaderModuleIdentifierCreateInfo { identifier });
        }
    }

    Ok(copy)
}

/// Converts `basePipelineIndex` into the sibling handle it names when the
/// application created the pipeline via a batch `vkCreateXPipelines` call
/// with `basePipelineHandle == NULL` (spec §4.4 "Derived-pipeline index
/// fix-up"). Zeroes both fields when the pipeline isn't a derivative at all.
fn fixup_derivative(is_derivative: bool, base_pipeline: &mut Option<Handle>, base_pipeline_index: &mut i32, batch: &[Handle]) {
    if !is_derivative {
        *base_pipeline = None;
        *base_pipeline_index = -1;
        return;
    }
    if base_pipeline.is_none() && *base_pipeline_index >= 0 {
        if let Some(&sibling) = batch.get(*base_pipeline_index as usize) {
            *base_pipeline = Some(sibling);
            *base_pipeline_index = -1;
        }
    }
}

pub fn copy_compute_pipeline<'a>(
    arena: &'a mut ScratchAllocator,
    info: &ComputePipelineCreateInfo,
    identifiers: &dyn ModuleIdentifierSource,
    batch: &[Handle],
) -> Result<&'a mut ComputePipelineCreateInfo> {
    let mut copy = info.clone();
    copy.flags = info.flags.normalized();
    let is_derivative = info.is_derivative();
    fixup_derivative(is_derivative, &mut copy.base_pipeline, &mut copy.base_pipeline_index, batch);
    copy.stage = copy_stage(&info.stage, identifiers)?;
    copy.pnext = copy_pnext(&info.pnext, "compute pipeline")?;
    Ok(arena.alloc(copy))
}

pub fn copy_raytracing_pipeline<'a>(
    arena: &'a mut ScratchAllocator,
    info: &RaytracingPipelineCreateInfo,
    identifiers: &dyn ModuleIdentifierSource,
    batch: &[Handle],
) -> Result<&'a mut RaytracingPipelineCreateInfo> {
    let mut copy = info.clone();
    copy.flags = info.flags.normalized();
    let is_derivative = info.is_derivative();
    fixup_derivative(is_derivative, &mut copy.base_pipeline, &mut copy.base_pipeline_index, batch);
    copy.stages = info
        .stages
        .iter()
        .map(|s| copy_stage(s, identifiers))
        .collect::<Result<Vec<_>>>()?;
    copy.pnext = copy_pnext(&info.pnext, "raytracing pipeline")?;
    Ok(arena.alloc(copy))
}

/// Deep-copies a graphics pipeline, applying every dead-state pruning rule
/// spec §4.4 lists: sub-structures outside the live graphics-pipeline-library
/// interface or outside the render pass's live subpass meta are dropped, and
/// dynamic-state-controlled arrays (viewports, scissors, EDS3 fully-dynamic
/// blend attachments) are emptied.
pub fn copy_graphics_pipeline<'a>(
    arena: &'a mut ScratchAllocator,
    info: &GraphicsPipelineCreateInfo,
    identifiers: &dyn ModuleIdentifierSource,
    subpass_meta: Option<SubpassMeta>,
    batch: &[Handle],
) -> Result<&'a mut GraphicsPipelineCreateInfo> {
    let mut copy = info.clone();
    copy.flags = info.flags.normalized();

    let is_derivative = info.is_derivative();
    fixup_derivative(is_derivative, &mut copy.base_pipeline, &mut copy.base_pipeline_index, batch);

    copy.stages = info
        .stages
        .iter()
        .map(|s| copy_stage(s, identifiers))
        .collect::<Result<Vec<_>>>()?;

    let meta = subpass_meta.unwrap_or(SubpassMeta {
        uses_color: true,
        uses_depth_stencil: true,
    });
    let has_library = !info.library_flags.is_empty();
    let live = |iface: LibraryFlags| !has_library || info.library_flags.contains(iface);
    let dyn_ = &info.dynamic_state.dynamic_states;
    let contains = |s: DynamicState| dyn_.contains(&s);
    let has_tess_stage = info.stages.iter().any(|s| {
        s.stage.contains(fossilize_types::common::ShaderStageFlags::TESSELLATION_CONTROL)
            || s.stage
                .contains(fossilize_types::common::ShaderStageFlags::TESSELLATION_EVALUATION)
    });

    if !live(LibraryFlags::VERTEX_INPUT_INTERFACE) {
        copy.vertex_input_state = None;
        copy.input_assembly_state = None;
    }

    if !has_tess_stage || !live(LibraryFlags::PRE_RASTERIZATION_SHADERS) {
        copy.tessellation_state = None;
    }

    if !live(LibraryFlags::PRE_RASTERIZATION_SHADERS) {
        copy.viewport_state = None;
        copy.rasterization_state = None;
    } else if let Some(vp) = copy.viewport_state.as_mut() {
        if contains(DynamicState::Viewport) || contains(DynamicState::ViewportWithCount) {
            vp.viewports.clear();
        }
        if contains(DynamicState::Scissor) || contains(DynamicState::ScissorWithCount) {
            vp.scissors.clear();
        }
    }

    if !(live(LibraryFlags::FRAGMENT_SHADER) && meta.uses_depth_stencil) {
        copy.depth_stencil_state = None;
    }

    if !(live(LibraryFlags::FRAGMENT_OUTPUT_INTERFACE) && meta.uses_color) {
        copy.color_blend_state = None;
    } else if let Some(cb) = copy.color_blend_state.as_mut() {
        let fully_dynamic_attachments = contains(DynamicState::ColorBlendEnable)
            && contains(DynamicState::ColorWriteMask)
            && contains(DynamicState::ColorBlendEquation);
        if fully_dynamic_attachments {
            cb.attachments.clear();
        }
    }

    copy.pnext = copy_pnext(&info.pnext, "graphics pipeline")?;
    Ok(arena.alloc(copy))
}

pub fn copy_application_info<'a>(arena: &'a mut ScratchAllocator, info: &ApplicationInfo) -> &'a mut ApplicationInfo {
    arena.alloc(info.clone())
}

pub fn copy_application_feature_info<'a>(
    arena: &'a mut ScratchAllocator,
    info: &ApplicationFeatureInfo,
) -> &'a mut ApplicationFeatureInfo {
    arena.alloc(info.clone())
}

pub fn copy_application_blob_link<'a>(
    arena: &'a mut ScratchAllocator,
    link: &ApplicationBlobLink,
) -> &'a mut ApplicationBlobLink {
    arena.alloc(link.clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use fossilize_types::common::*;
    use fossilize_types::pipeline::graphics::*;
    use fossilize_types::pipeline::PipelineCreateFlags;

    fn sample_pipeline() -> GraphicsPipelineCreateInfo {
        GraphicsPipelineCreateInfo {
            flags: PipelineCreateFlags::CAPTURE_STATISTICS,
            stages: Vec::new(),
            vertex_input_state: Some(VertexInputState::default()),
            input_assembly_state: Some(InputAssemblyState {
                topology: PrimitiveTopology(0),
                primitive_restart_enable: false,
            }),
            tessellation_state: None,
            viewport_state: Some(ViewportState {
                viewport_count: 1,
                viewports: vec![Viewport {
                    x: NotNan::new(0.0).unwrap(),
                    y: NotNan::new(0.0).unwrap(),
                    width: NotNan::new(1.0).unwrap(),
                    height: NotNan::new(1.0).unwrap(),
                    min_depth: NotNan::new(0.0).unwrap(),
                    max_depth: NotNan::new(1.0).unwrap(),
                }],
                scissor_count: 1,
                scissors: vec![ScissorRect { x: 0, y: 0, width: 1, height: 1 }],
            }),
            rasterization_state: None,
            multisample_state: None,
            depth_stencil_state: None,
            color_blend_state: None,
            dynamic_state: PipelineDynamicStateCreateInfo {
                dynamic_states: vec![DynamicState::Viewport],
            },
            layout: None,
            render_pass: None,
            subpass: 0,
            base_pipeline: None,
            base_pipeline_index: -1,
            library_flags: LibraryFlags::empty(),
            libraries: Vec::new(),
            pnext: Vec::new(),
        }
    }

    #[test]
    fn dynamic_viewport_drops_viewport_array_but_keeps_count() {
        let mut arena = ScratchAllocator::new();
        let info = sample_pipeline();
        let copied = copy_graphics_pipeline(&mut arena, &info, &NoModuleIdentifiers, None, &[]).unwrap();
        let vp = copied.viewport_state.as_ref().unwrap();
        assert_eq!(vp.viewport_count, 1);
        assert!(vp.viewports.is_empty());
        // Scissor isn't dynamic here, so it survives.
        assert_eq!(vp.scissors.len(), 1);
    }

    #[test]
    fn flags_are_normalized() {
        let mut arena = ScratchAllocator::new();
        let info = sample_pipeline();
        let copied = copy_graphics_pipeline(&mut arena, &info, &NoModuleIdentifiers, None, &[]).unwrap();
        assert!(!copied.flags.contains(PipelineCreateFlags::CAPTURE_STATISTICS));
    }

    #[test]
    fn non_derivative_clears_base_pipeline_fields() {
        let mut arena = ScratchAllocator::new();
        let mut info = sample_pipeline();
        info.base_pipeline = Some(42);
        info.base_pipeline_index = 3;
        let copied = copy_graphics_pipeline(&mut arena, &info, &NoModuleIdentifiers, None, &[]).unwrap();
        assert_eq!(copied.base_pipeline, None);
        assert_eq!(copied.base_pipeline_index, -1);
    }

    #[test]
    fn derivative_index_resolves_against_batch() {
        let mut arena = ScratchAllocator::new();
        let mut info = sample_pipeline();
        info.flags = PipelineCreateFlags::DERIVATIVE;
        info.base_pipeline = None;
        info.base_pipeline_index = 1;
        let batch = [100u64, 200u64, 300u64];
        let copied = copy_graphics_pipeline(&mut arena, &info, &NoModuleIdentifiers, None, &batch).unwrap();
        assert_eq!(copied.base_pipeline, Some(200));
        assert_eq!(copied.base_pipeline_index, -1);
    }
}
