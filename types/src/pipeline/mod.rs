pub mod compute;
pub mod graphics;
pub mod raytracing;
pub mod stage;

pub use compute::ComputePipelineCreateInfo;
pub use graphics::GraphicsPipelineCreateInfo;
pub use raytracing::{RaytracingPipelineCreateInfo, RaytracingShaderGroup};
pub use stage::{PipelineShaderStageCreateInfo, ShaderModuleRef, SpecializationInfo};

bitflags::bitflags! {
    /// `VkPipelineCreateFlags`. Spec §4.3 item 1: "Normalizes `flags` —
    /// strips bits that don't affect compilation (capture statistics,
    /// early-return, fail-on-required, ...)."
    #[derive(Default)]
    pub struct PipelineCreateFlags: u32 {
        const DISABLE_OPTIMIZATION = 1 << 0;
        const ALLOW_DERIVATIVES = 1 << 1;
        const DERIVATIVE = 1 << 2;
        const CREATE_LIBRARY = 1 << 11;
        const CAPTURE_STATISTICS = 1 << 6;
        const CAPTURE_INTERNAL_REPRESENTATIONS = 1 << 7;
        const EARLY_RETURN_ON_FAILURE = 1 << 20;
        const FAIL_ON_PIPELINE_COMPILE_REQUIRED = 1 << 21;
        const LINK_TIME_OPTIMIZATION = 1 << 10;
        /// The mask of bits spec §4.3 item 1 says don't affect compiled
        /// output and so are stripped before hashing.
        const NORMALIZE_MASK = Self::CAPTURE_STATISTICS.bits
            | Self::CAPTURE_INTERNAL_REPRESENTATIONS.bits
            | Self::EARLY_RETURN_ON_FAILURE.bits
            | Self::FAIL_ON_PIPELINE_COMPILE_REQUIRED.bits;
    }
}

impl PipelineCreateFlags {
    pub fn normalized(self) -> PipelineCreateFlags {
        self & !PipelineCreateFlags::NORMALIZE_MASK
    }
}

bitflags::bitflags! {
    /// Graphics-pipeline-library interface selection (spec §4.3 item 6).
    #[derive(Default)]
    pub struct LibraryFlags: u32 {
        const VERTEX_INPUT_INTERFACE = 1 << 0;
        const PRE_RASTERIZATION_SHADERS = 1 << 1;
        const FRAGMENT_SHADER = 1 << 2;
        const FRAGMENT_OUTPUT_INTERFACE = 1 << 3;
    }
}
