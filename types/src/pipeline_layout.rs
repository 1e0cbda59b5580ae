use crate::common::{PipelineLayoutCreateFlags, ShaderStageFlags};
use crate::pnext::PNextLink;
use crate::Handle;

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct PushConstantRange {
    pub stage_flags: ShaderStageFlags,
    pub offset: u32,
    pub size: u32,
}

/// `VkPipelineLayoutCreateInfo`. Spec §4.3: "Set-layout count, then for
/// each slot either the layout's hash or zero (null layout allowed for
/// libraries)."
#[derive(Clone, Debug)]
pub struct PipelineLayoutCreateInfo {
    pub flags: PipelineLayoutCreateFlags,
    /// `None` entries are null descriptor set layouts, permitted when this
    /// pipeline layout is used to build a graphics pipeline library
    /// (spec §4.3 "Pipeline layout").
    pub set_layouts: Vec<Option<Handle>>,
    pub push_constant_ranges: Vec<PushConstantRange>,
    pub pnext: Vec<PNextLink>,
}
