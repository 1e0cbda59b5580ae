use super::stage::PipelineShaderStageCreateInfo;
use super::PipelineCreateFlags;
use crate::pnext::PNextLink;
use crate::Handle;

/// `VkComputePipelineCreateInfo`. Spec §4.3 item 8: "flags (normalized) |
/// single shader stage | layout | base pipeline."
#[derive(Clone, Debug)]
pub struct ComputePipelineCreateInfo {
    pub flags: PipelineCreateFlags,
    pub stage: PipelineShaderStageCreateInfo,
    pub layout: Option<Handle>,
    pub base_pipeline: Option<Handle>,
    pub base_pipeline_index: i32,
    pub pnext: Vec<PNextLink>,
}

impl ComputePipelineCreateInfo {
    pub fn is_derivative(&self) -> bool {
        self.flags.contains(PipelineCreateFlags::DERIVATIVE)
    }
}
