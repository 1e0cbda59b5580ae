use super::stage::PipelineShaderStageCreateInfo;
use super::PipelineCreateFlags;
use crate::pnext::PNextLink;
use crate::Handle;

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum RaytracingShaderGroupType {
    General,
    TrianglesHitGroup,
    ProceduralHitGroup,
}

pub const SHADER_UNUSED: u32 = u32::MAX;

/// `VkRayTracingShaderGroupCreateInfoKHR`. Index fields are indices into
/// the pipeline's `stages` array, or `SHADER_UNUSED`.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct RaytracingShaderGroup {
    pub ty: RaytracingShaderGroupType,
    pub general_shader: u32,
    pub closest_hit_shader: u32,
    pub any_hit_shader: u32,
    pub intersection_shader: u32,
}

/// `VkRayTracingPipelineInterfaceCreateInfoKHR`, present when this pipeline
/// (or one of its libraries) declares its ray payload/attribute/callable
/// data sizes up front.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct RaytracingPipelineInterfaceInfo {
    pub max_pipeline_ray_payload_size: u32,
    pub max_pipeline_ray_hit_attribute_size: u32,
}

/// `VkRayTracingPipelineCreateInfoKHR`. Spec §4.3 item 9: "stages, shader
/// groups (by stage index, not handle), recursion depth, library info,
/// library interface, dynamic stack size state, layout, base pipeline."
#[derive(Clone, Debug)]
pub struct RaytracingPipelineCreateInfo {
    pub flags: PipelineCreateFlags,
    pub stages: Vec<PipelineShaderStageCreateInfo>,
    pub groups: Vec<RaytracingShaderGroup>,
    pub max_pipeline_ray_recursion_depth: u32,
    pub libraries: Vec<Handle>,
    pub library_interface: Option<RaytracingPipelineInterfaceInfo>,
    /// `true` when `RAY_TRACING_PIPELINE_STACK_SIZE` is listed as a
    /// dynamic state; the pipeline's static stack size is meaningless in
    /// that case and isn't hashed (spec §4.3 item 9, §8 S5 dynamic-state
    /// elision).
    pub dynamic_stack_size: bool,
    pub layout: Option<Handle>,
    pub base_pipeline: Option<Handle>,
    pub base_pipeline_index: i32,
    pub pnext: Vec<PNextLink>,
}

impl RaytracingPipelineCreateInfo {
    pub fn is_derivative(&self) -> bool {
        self.flags.contains(PipelineCreateFlags::DERIVATIVE)
    }
}
