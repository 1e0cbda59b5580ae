//! Entity create-info types, resource tags, and the pNext chain model
//! shared by every other crate in the workspace.

pub mod application;
pub mod common;
pub mod descriptor_set_layout;
pub mod error;
pub mod pipeline;
pub mod pipeline_layout;
pub mod pnext;
pub mod render_pass;
pub mod sampler;
pub mod shader_module;

pub use error::{FossilizeError, Result};

/// A live API handle, as captured by the recorder layer. Numerically
/// meaningless outside the process that created it; only ever used as a
/// key into the recorder's handle-to-hash map.
pub type Handle = u64;

/// A 64-bit content hash, as produced by the canonical hasher.
pub type Hash = u64;

/// The fixed, explicitly numbered resource-kind tags (spec §3). The
/// numbering is load-bearing: it appears verbatim in the streaming FOZ
/// entry name and the dumb-directory filename, so it must never be
/// reordered or renumbered, only ever appended to.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Ord, PartialOrd)]
#[repr(u8)]
pub enum ResourceTag {
    ApplicationInfo = 0,
    Sampler = 1,
    DescriptorSetLayout = 2,
    PipelineLayout = 3,
    ShaderModule = 4,
    RenderPass = 5,
    GraphicsPipeline = 6,
    ComputePipeline = 7,
    ApplicationBlobLink = 8,
    RaytracingPipeline = 9,
}

/// Number of distinct [`ResourceTag`] values, i.e. `RaytracingPipeline + 1`.
pub const RESOURCE_TAG_COUNT: usize = 10;

impl ResourceTag {
    pub const ALL: [ResourceTag; RESOURCE_TAG_COUNT] = [
        ResourceTag::ApplicationInfo,
        ResourceTag::Sampler,
        ResourceTag::DescriptorSetLayout,
        ResourceTag::PipelineLayout,
        ResourceTag::ShaderModule,
        ResourceTag::RenderPass,
        ResourceTag::GraphicsPipeline,
        ResourceTag::ComputePipeline,
        ResourceTag::ApplicationBlobLink,
        ResourceTag::RaytracingPipeline,
    ];

    pub fn from_raw(v: u8) -> Option<ResourceTag> {
        Some(match v {
            0 => ResourceTag::ApplicationInfo,
            1 => ResourceTag::Sampler,
            2 => ResourceTag::DescriptorSetLayout,
            3 => ResourceTag::PipelineLayout,
            4 => ResourceTag::ShaderModule,
            5 => ResourceTag::RenderPass,
            6 => ResourceTag::GraphicsPipeline,
            7 => ResourceTag::ComputePipeline,
            8 => ResourceTag::ApplicationBlobLink,
            9 => ResourceTag::RaytracingPipeline,
            _ => return None,
        })
    }

    pub fn to_raw(self) -> u8 {
        self as u8
    }

    /// The JSON document's top-level array key for this tag (spec §4.5,
    /// §6).
    pub fn json_key(self) -> &'static str {
        match self {
            ResourceTag::ApplicationInfo => "applicationInfo",
            ResourceTag::Sampler => "samplers",
            ResourceTag::DescriptorSetLayout => "setLayouts",
            ResourceTag::PipelineLayout => "pipelineLayouts",
            ResourceTag::ShaderModule => "shaderModules",
            ResourceTag::RenderPass => "renderPasses",
            ResourceTag::GraphicsPipeline => "graphicsPipelines",
            ResourceTag::ComputePipeline => "computePipelines",
            ResourceTag::ApplicationBlobLink => "applicationBlobLinks",
            ResourceTag::RaytracingPipeline => "raytracingPipelines",
        }
    }
}

/// A resource's content-addressed identity: which kind of entity it is,
/// and its canonical hash (spec §3: "`(tag, hash)` identity").
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct EntityId {
    pub tag: ResourceTag,
    pub hash: Hash,
}

impl EntityId {
    pub fn new(tag: ResourceTag, hash: Hash) -> EntityId {
        EntityId { tag, hash }
    }
}

/// The on-disk format version this implementation writes, and the oldest
/// version it will still read (spec §6, `original_source/fossilize_types.hpp`:
/// `FOSSILIZE_FORMAT_VERSION = 6`, `FOSSILIZE_FORMAT_MIN_COMPAT_VERSION = 5`).
pub const FORMAT_VERSION: u32 = 6;
pub const FORMAT_MIN_COMPAT_VERSION: u32 = 5;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resource_tag_round_trips_through_raw() {
        for tag in ResourceTag::ALL {
            assert_eq!(ResourceTag::from_raw(tag.to_raw()), Some(tag));
        }
    }

    #[test]
    fn resource_tag_numbering_is_stable() {
        assert_eq!(ResourceTag::ApplicationInfo.to_raw(), 0);
        assert_eq!(ResourceTag::RaytracingPipeline.to_raw(), 9);
    }
}
