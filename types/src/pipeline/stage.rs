use crate::common::ShaderStageFlags;
use crate::pnext::PNextLink;
use crate::shader_module::ShaderModuleCreateInfo;
use crate::Handle;

/// How a shader stage names its module. Spec §4.3 item 7: "The shader
/// module is resolved either by direct handle, by inline
/// `SHADER_MODULE_CREATE_INFO` in pNext (recursively hashed), or by
/// `MODULE_IDENTIFIER` pNext (looked up in the identifier->module table)."
#[derive(Clone, Debug)]
pub enum ShaderModuleRef {
    Handle(Handle),
    Inline(Box<ShaderModuleCreateInfo>),
    Identifier(Vec<u8>),
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Default)]
pub struct SpecializationMapEntry {
    pub constant_id: u32,
    pub offset: u32,
    pub size: usize,
}

#[derive(Clone, Debug, Default)]
pub struct SpecializationInfo {
    pub map_entries: Vec<SpecializationMapEntry>,
    pub data: Vec<u8>,
}

/// `VkPipelineShaderStageCreateInfo`. Spec §4.3 item 7: "per stage, `flags
/// | pName | stage | module-hash | specialization-info | pNext`."
#[derive(Clone, Debug)]
pub struct PipelineShaderStageCreateInfo {
    pub flags: u32,
    pub stage: ShaderStageFlags,
    pub module: ShaderModuleRef,
    pub entry_point: String,
    pub specialization_info: Option<SpecializationInfo>,
    pub pnext: Vec<PNextLink>,
}
