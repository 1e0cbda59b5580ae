use super::stage::PipelineShaderStageCreateInfo;
use super::{LibraryFlags, PipelineCreateFlags};
use crate::common::{
    BlendFactor, BlendOp, ColorComponentFlags, CompareOp, CullModeFlags, DynamicState, Format,
    FrontFace, LogicOp, PolygonMode, PrimitiveTopology, SampleCountFlags, StencilOp,
};
use crate::pnext::PNextLink;
use crate::Handle;
use ordered_float::NotNan;

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum VertexInputRate {
    Vertex,
    Instance,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct VertexInputBindingDescription {
    pub binding: u32,
    pub stride: u32,
    pub input_rate: VertexInputRate,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct VertexInputAttributeDescription {
    pub location: u32,
    pub binding: u32,
    pub format: Format,
    pub offset: u32,
}

/// Dropped by the deep-copier when the graphics-pipeline-library interface
/// doesn't include `VERTEX_INPUT_INTERFACE` (spec §4.4 "Dead-state
/// pruning").
#[derive(Clone, Debug, Default)]
pub struct VertexInputState {
    pub bindings: Vec<VertexInputBindingDescription>,
    pub attributes: Vec<VertexInputAttributeDescription>,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct InputAssemblyState {
    pub topology: PrimitiveTopology,
    pub primitive_restart_enable: bool,
}

/// Dropped when no tessellation-control/evaluation stage is present (spec
/// §4.4: "tessellation state dropped when no tessellation stage is
/// present").
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct TessellationState {
    pub patch_control_points: u32,
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Viewport {
    pub x: NotNan<f32>,
    pub y: NotNan<f32>,
    pub width: NotNan<f32>,
    pub height: NotNan<f32>,
    pub min_depth: NotNan<f32>,
    pub max_depth: NotNan<f32>,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct ScissorRect {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

/// Viewport/scissor arrays are dropped by the deep-copier when the
/// corresponding dynamic state is set (spec §4.4), hence `Vec` rather than
/// a fixed-size array: an empty `Vec` with a non-zero `*_count` means
/// "dynamic, count only."
#[derive(Clone, Debug, Default)]
pub struct ViewportState {
    pub viewport_count: u32,
    pub viewports: Vec<Viewport>,
    pub scissor_count: u32,
    pub scissors: Vec<ScissorRect>,
}

#[derive(Clone, Debug)]
pub struct RasterizationState {
    pub depth_clamp_enable: bool,
    pub rasterizer_discard_enable: bool,
    pub polygon_mode: PolygonMode,
    pub cull_mode: CullModeFlags,
    pub front_face: FrontFace,
    pub depth_bias_enable: bool,
    pub depth_bias_constant_factor: NotNan<f32>,
    pub depth_bias_clamp: NotNan<f32>,
    pub depth_bias_slope_factor: NotNan<f32>,
    pub line_width: NotNan<f32>,
    pub pnext: Vec<PNextLink>,
}

#[derive(Clone, Debug)]
pub struct MultisampleState {
    pub rasterization_samples: SampleCountFlags,
    pub sample_shading_enable: bool,
    pub min_sample_shading: NotNan<f32>,
    /// Dropped by the deep-copier when `SAMPLE_MASK` ... note: Vulkan has
    /// no dynamic sample mask state; retained verbatim, one `u32` per 32
    /// samples.
    pub sample_mask: Option<Vec<u32>>,
    pub alpha_to_coverage_enable: bool,
    pub alpha_to_one_enable: bool,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Default)]
pub struct StencilOpState {
    pub fail_op: StencilOpValue,
    pub pass_op: StencilOpValue,
    pub depth_fail_op: StencilOpValue,
    pub compare_op: CompareOpValue,
    pub compare_mask: u32,
    pub write_mask: u32,
    pub reference: u32,
}

// Newtype wrappers with `Default` so `StencilOpState` can derive `Default`
// (the underlying enums intentionally don't implement it, since there's no
// canonically "default" comparison or stencil op in the Vulkan API).
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct StencilOpValue(pub StencilOp);
impl Default for StencilOpValue {
    fn default() -> Self {
        StencilOpValue(StencilOp::Keep)
    }
}
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct CompareOpValue(pub CompareOp);
impl Default for CompareOpValue {
    fn default() -> Self {
        CompareOpValue(CompareOp::Never)
    }
}

#[derive(Clone, Debug)]
pub struct DepthStencilState {
    pub depth_test_enable: bool,
    pub depth_write_enable: bool,
    pub depth_compare_op: CompareOp,
    pub depth_bounds_test_enable: bool,
    pub min_depth_bounds: NotNan<f32>,
    pub max_depth_bounds: NotNan<f32>,
    pub stencil_test_enable: bool,
    pub front: StencilOpState,
    pub back: StencilOpState,
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct ColorBlendAttachmentState {
    pub blend_enable: bool,
    pub src_color_blend_factor: BlendFactor,
    pub dst_color_blend_factor: BlendFactor,
    pub color_blend_op: BlendOp,
    pub src_alpha_blend_factor: BlendFactor,
    pub dst_alpha_blend_factor: BlendFactor,
    pub alpha_blend_op: BlendOp,
    pub color_write_mask: ColorComponentFlags,
}

impl ColorBlendAttachmentState {
    pub fn uses_blend_constants(&self) -> bool {
        self.blend_enable
            && (self.src_color_blend_factor.uses_blend_constants()
                || self.dst_color_blend_factor.uses_blend_constants()
                || self.src_alpha_blend_factor.uses_blend_constants()
                || self.dst_alpha_blend_factor.uses_blend_constants())
    }
}

/// Dropped entirely by the deep-copier when EDS3 fully-dynamic color-blend
/// attachment state is in effect (spec §4.3 item 5, §8 S5): `None` means
/// "no live per-attachment state" rather than "zero attachments."
#[derive(Clone, Debug)]
pub struct ColorBlendState {
    pub logic_op_enable: bool,
    pub logic_op: Option<LogicOp>,
    pub attachments: Vec<ColorBlendAttachmentState>,
    pub blend_constants: [NotNan<f32>; 4],
}

#[derive(Clone, Debug, Default)]
pub struct PipelineDynamicStateCreateInfo {
    pub dynamic_states: Vec<DynamicState>,
}

/// `VkGraphicsPipelineCreateInfo`, plus the library-composition state spec
/// §4.3 item 6 describes. All the optional sub-structures are `Option`
/// rather than always-present so the deep-copier's dead-state pruning
/// (spec §4.4) has somewhere to put "this sub-structure is not live."
#[derive(Clone, Debug)]
pub struct GraphicsPipelineCreateInfo {
    pub flags: PipelineCreateFlags,
    pub stages: Vec<PipelineShaderStageCreateInfo>,
    pub vertex_input_state: Option<VertexInputState>,
    pub input_assembly_state: Option<InputAssemblyState>,
    pub tessellation_state: Option<TessellationState>,
    pub viewport_state: Option<ViewportState>,
    pub rasterization_state: Option<RasterizationState>,
    pub multisample_state: Option<MultisampleState>,
    pub depth_stencil_state: Option<DepthStencilState>,
    pub color_blend_state: Option<ColorBlendState>,
    pub dynamic_state: PipelineDynamicStateCreateInfo,
    pub layout: Option<Handle>,
    pub render_pass: Option<Handle>,
    pub subpass: u32,
    pub base_pipeline: Option<Handle>,
    pub base_pipeline_index: i32,
    /// Which graphics-pipeline-library interfaces this create-info
    /// contributes, resolved from `VkGraphicsPipelineLibraryCreateInfoEXT`
    /// (spec §4.3 item 6). Empty/default means "not a library pipeline."
    pub library_flags: LibraryFlags,
    /// Library parts this pipeline links against
    /// (`VkPipelineLibraryCreateInfoKHR`, spec §3 invariant 4).
    pub libraries: Vec<Handle>,
    pub pnext: Vec<PNextLink>,
}

impl GraphicsPipelineCreateInfo {
    pub fn is_derivative(&self) -> bool {
        self.flags.contains(PipelineCreateFlags::DERIVATIVE)
    }
}
