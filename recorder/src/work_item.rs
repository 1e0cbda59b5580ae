//! The unit of work handed from a `record_X` call to the worker thread
//! (spec §4.7: "Pushes a `WorkItem{sType, handle, create_info, custom_hash}`
//! onto the queue").
//!
//! The original encodes "unregister" and "terminate" as sentinel values of
//! one struct (`handle != 0 && create_info == null` / `handle == 0 &&
//! create_info == null`). A closed enum expresses the same three cases
//! without a magic-value convention, and lets the worker loop `match`
//! exhaustively instead of checking two fields by hand.

use fossilize_types::application::{ApplicationBlobLink, ApplicationFeatureInfo, ApplicationInfo};
use fossilize_types::descriptor_set_layout::DescriptorSetLayoutCreateInfo;
use fossilize_types::pipeline::compute::ComputePipelineCreateInfo;
use fossilize_types::pipeline::graphics::GraphicsPipelineCreateInfo;
use fossilize_types::pipeline::raytracing::RaytracingPipelineCreateInfo;
use fossilize_types::pipeline_layout::PipelineLayoutCreateInfo;
use fossilize_types::render_pass::{RenderPassCreateInfo, RenderPassCreateInfo2, SubpassMeta};
use fossilize_types::sampler::SamplerCreateInfo;
use fossilize_types::shader_module::ShaderModuleCreateInfo;
use fossilize_types::{Handle, Hash};

/// A deep-copied, dead-state-pruned descriptor queued for hashing and
/// serialization, tagged by entity kind.
///
/// The graphics pipeline variant carries the [`SubpassMeta`] that was
/// already resolved synchronously in `record_graphics_pipeline` (a render
/// pass's subpass meta is a pure function of its own live descriptor, spec
/// glossary "Subpass meta" — it doesn't need the render pass's hash, only
/// its handle, so it's available well before the worker thread gets here).
/// The shader module variant carries the caller-supplied driver-stable
/// identifier, if any (spec §4.7 "Module identifier database").
pub enum EntityPayload {
    Sampler(SamplerCreateInfo),
    DescriptorSetLayout(DescriptorSetLayoutCreateInfo),
    PipelineLayout(PipelineLayoutCreateInfo),
    ShaderModule(ShaderModuleCreateInfo, Option<Vec<u8>>),
    RenderPass(RenderPassCreateInfo),
    RenderPass2(RenderPassCreateInfo2),
    GraphicsPipeline(Box<GraphicsPipelineCreateInfo>, Option<SubpassMeta>),
    ComputePipeline(ComputePipelineCreateInfo),
    RaytracingPipeline(Box<RaytracingPipelineCreateInfo>),
}

/// One entry in the recorder's work queue (spec §4.7, §5 "single-writer
/// queue with a condvar and a timed-wait for flush coalescing").
pub enum WorkItem {
    /// A freshly recorded entity, already deep-copied and pruned.
    /// `custom_hash`, when set, bypasses the canonical hasher entirely —
    /// used by the `rehash` tool to preserve a caller-supplied hash rather
    /// than recompute it.
    Create {
        handle: Handle,
        payload: EntityPayload,
        custom_hash: Option<Hash>,
    },
    /// `VkApplicationInfo` plus the whitelisted feature chain. Produces no
    /// live handle, so it's recorded as a distinct variant rather than
    /// folded into `Create`.
    ApplicationInfo {
        info: ApplicationInfo,
        features: ApplicationFeatureInfo,
    },
    /// Spec §3 tag 8: ties an arbitrary caller blob to the application
    /// context it was captured under.
    ApplicationBlobLink { link: ApplicationBlobLink },
    /// Creation failed or the object was destroyed: evicts `handle` from
    /// every handle-to-hash map so the slot may be reused (spec §3
    /// "Lifecycle").
    Unregister { handle: Handle },
    /// Drains the queue and terminates the worker loop (spec §4.7
    /// "A sentinel ... terminates the loop").
    Terminate,
}
