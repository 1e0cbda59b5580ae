use crate::common::{DescriptorSetLayoutCreateFlags, DescriptorType, ShaderStageFlags};
use crate::pnext::PNextLink;
use crate::Handle;

/// One binding slot of a `VkDescriptorSetLayoutCreateInfo`. Spec §4.3:
/// "index, count, type, stage mask. For SAMPLER / COMBINED_IMAGE_SAMPLER
/// bindings with immutable samplers, each immutable sampler is replaced by
/// its content hash."
#[derive(Clone, Debug)]
pub struct DescriptorSetLayoutBinding {
    pub binding: u32,
    pub descriptor_type: DescriptorType,
    pub descriptor_count: u32,
    pub stage_flags: ShaderStageFlags,
    /// Live API handles to sampler objects, one per `descriptor_count`, or
    /// empty if this binding has no immutable samplers. Only meaningful
    /// for `SAMPLER` / `COMBINED_IMAGE_SAMPLER` descriptor types.
    pub immutable_samplers: Vec<Handle>,
}

#[derive(Clone, Debug)]
pub struct DescriptorSetLayoutCreateInfo {
    pub flags: DescriptorSetLayoutCreateFlags,
    pub bindings: Vec<DescriptorSetLayoutBinding>,
    pub pnext: Vec<PNextLink>,
}
