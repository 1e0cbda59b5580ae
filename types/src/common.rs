//! Scalar enum and flag types shared across entity create-info structs.
//!
//! Most of these mirror how a Vulkan loader binding (e.g. `ash::vk`)
//! represents the real API: a thin `repr(transparent)` integer newtype with
//! associated consts, rather than a closed Rust `enum`. Spec §6 states that
//! "numeric enums are emitted as their integer value (no symbolic names)"
//! in the JSON blob, so carrying the raw integer through is both simpler
//! and more faithful than re-deriving a closed enum we'd just have to
//! convert back to a number at serialization time. A handful of types that
//! the canonical hasher branches on directly (`CompareOp`, `BlendFactor`,
//! dynamic state elision) are instead closed Rust enums, because the
//! hashing and deep-copy logic needs to match on them.

use bitflags::bitflags;

macro_rules! int_newtype {
    ($(#[$meta:meta])* $name:ident($repr:ty)) => {
        $(#[$meta])*
        #[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Ord, PartialOrd)]
        #[repr(transparent)]
        pub struct $name(pub $repr);

        impl From<$repr> for $name {
            fn from(v: $repr) -> Self {
                $name(v)
            }
        }

        impl Default for $name {
            fn default() -> Self {
                $name(0)
            }
        }
    };
}

int_newtype!(
    /// A Vulkan `VkFormat` value. Only hashed by its raw integer.
    Format(u32)
);
impl Format {
    pub const UNDEFINED: Format = Format(0);
}

int_newtype!(
    /// A Vulkan `VkImageLayout` value.
    ImageLayout(i32)
);
impl ImageLayout {
    pub const UNDEFINED: ImageLayout = ImageLayout(0);
}

int_newtype!(AttachmentLoadOp(i32));
impl AttachmentLoadOp {
    pub const LOAD: AttachmentLoadOp = AttachmentLoadOp(0);
    pub const CLEAR: AttachmentLoadOp = AttachmentLoadOp(1);
    pub const DONT_CARE: AttachmentLoadOp = AttachmentLoadOp(2);
}

int_newtype!(AttachmentStoreOp(i32));
impl AttachmentStoreOp {
    pub const STORE: AttachmentStoreOp = AttachmentStoreOp(0);
    pub const DONT_CARE: AttachmentStoreOp = AttachmentStoreOp(1);
}

int_newtype!(PipelineBindPoint(i32));
impl PipelineBindPoint {
    pub const GRAPHICS: PipelineBindPoint = PipelineBindPoint(0);
    pub const COMPUTE: PipelineBindPoint = PipelineBindPoint(1);
    pub const RAY_TRACING: PipelineBindPoint = PipelineBindPoint(1000165000);
}

int_newtype!(Filter(i32));
int_newtype!(SamplerMipmapMode(i32));
int_newtype!(SamplerAddressMode(i32));
int_newtype!(BorderColor(i32));
int_newtype!(DescriptorType(i32));
int_newtype!(ReductionMode(i32));
int_newtype!(LineRasterizationMode(i32));
int_newtype!(BlendOverlap(i32));
int_newtype!(PolygonMode(i32));
int_newtype!(FrontFace(i32));
int_newtype!(PrimitiveTopology(i32));

/// Each 32-bit dynamic state list entry (`VkDynamicState`). Only the
/// subset the canonical hasher branches on for elision (spec §4.3 item 5,
/// §8 S5) is enumerated here; anything else round-trips as
/// [`DynamicState::Other`].
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum DynamicState {
    Viewport,
    Scissor,
    LineWidth,
    DepthBias,
    BlendConstants,
    DepthBounds,
    StencilCompareMask,
    StencilWriteMask,
    StencilReference,
    CullMode,
    FrontFace,
    PrimitiveTopology,
    ViewportWithCount,
    ScissorWithCount,
    DepthTestEnable,
    DepthWriteEnable,
    DepthCompareOp,
    DepthBoundsTestEnable,
    StencilTestEnable,
    StencilOp,
    RasterizerDiscardEnable,
    DepthBiasEnable,
    PrimitiveRestartEnable,
    /// EDS3: `VK_DYNAMIC_STATE_COLOR_BLEND_ENABLE_EXT`.
    ColorBlendEnable,
    /// EDS3: `VK_DYNAMIC_STATE_COLOR_WRITE_MASK_EXT`.
    ColorWriteMask,
    /// EDS3: `VK_DYNAMIC_STATE_COLOR_BLEND_EQUATION_EXT`.
    ColorBlendEquation,
    /// EDS3: `VK_DYNAMIC_STATE_SAMPLE_LOCATIONS_ENABLE_EXT`.
    SampleLocationsEnable,
    /// Any recognized-but-not-elision-relevant dynamic state, carried by
    /// its raw integer so the entity's hash still reflects that it was
    /// present in the list (spec invariant 1 only requires elision for the
    /// specific states named in §4.3; an extra, unrecognized dynamic state
    /// bit is not itself an "unknown sType" failure).
    Other(i32),
}

impl DynamicState {
    pub fn from_raw(v: i32) -> DynamicState {
        match v {
            0 => DynamicState::Viewport,
            1 => DynamicState::Scissor,
            2 => DynamicState::LineWidth,
            3 => DynamicState::DepthBias,
            4 => DynamicState::BlendConstants,
            5 => DynamicState::DepthBounds,
            6 => DynamicState::StencilCompareMask,
            7 => DynamicState::StencilWriteMask,
            8 => DynamicState::StencilReference,
            1000267000 => DynamicState::CullMode,
            1000267001 => DynamicState::FrontFace,
            1000267002 => DynamicState::PrimitiveTopology,
            1000267003 => DynamicState::ViewportWithCount,
            1000267004 => DynamicState::ScissorWithCount,
            1000267006 => DynamicState::DepthTestEnable,
            1000267007 => DynamicState::DepthWriteEnable,
            1000267008 => DynamicState::DepthCompareOp,
            1000267009 => DynamicState::DepthBoundsTestEnable,
            1000267010 => DynamicState::StencilTestEnable,
            1000267011 => DynamicState::StencilOp,
            1000377001 => DynamicState::RasterizerDiscardEnable,
            1000377000 => DynamicState::DepthBiasEnable,
            1000377002 => DynamicState::PrimitiveRestartEnable,
            1000381000 => DynamicState::ColorBlendEnable,
            1000381005 => DynamicState::ColorWriteMask,
            1000381001 => DynamicState::ColorBlendEquation,
            1000143000 => DynamicState::SampleLocationsEnable,
            other => DynamicState::Other(other),
        }
    }

    pub fn to_raw(self) -> i32 {
        match self {
            DynamicState::Viewport => 0,
            DynamicState::Scissor => 1,
            DynamicState::LineWidth => 2,
            DynamicState::DepthBias => 3,
            DynamicState::BlendConstants => 4,
            DynamicState::DepthBounds => 5,
            DynamicState::StencilCompareMask => 6,
            DynamicState::StencilWriteMask => 7,
            DynamicState::StencilReference => 8,
            DynamicState::CullMode => 1000267000,
            DynamicState::FrontFace => 1000267001,
            DynamicState::PrimitiveTopology => 1000267002,
            DynamicState::ViewportWithCount => 1000267003,
            DynamicState::ScissorWithCount => 1000267004,
            DynamicState::DepthTestEnable => 1000267006,
            DynamicState::DepthWriteEnable => 1000267007,
            DynamicState::DepthCompareOp => 1000267008,
            DynamicState::DepthBoundsTestEnable => 1000267009,
            DynamicState::StencilTestEnable => 1000267010,
            DynamicState::StencilOp => 1000267011,
            DynamicState::RasterizerDiscardEnable => 1000377001,
            DynamicState::DepthBiasEnable => 1000377000,
            DynamicState::PrimitiveRestartEnable => 1000377002,
            DynamicState::ColorBlendEnable => 1000381000,
            DynamicState::ColorWriteMask => 1000381005,
            DynamicState::ColorBlendEquation => 1000381001,
            DynamicState::SampleLocationsEnable => 1000143000,
            DynamicState::Other(v) => v,
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Default)]
pub struct DynamicStateList<'a>(pub &'a [DynamicState]);

impl<'a> DynamicStateList<'a> {
    pub fn contains(&self, state: DynamicState) -> bool {
        self.0.contains(&state)
    }
}

/// Closed Rust enum: the hasher and deep-copier branch on these directly
/// (§4.3 rasterization/depth-stencil/blend rules).
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum CompareOp {
    Never = 0,
    Less = 1,
    Equal = 2,
    LessOrEqual = 3,
    Greater = 4,
    NotEqual = 5,
    GreaterOrEqual = 6,
    Always = 7,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum StencilOp {
    Keep = 0,
    Zero = 1,
    Replace = 2,
    IncrementAndClamp = 3,
    DecrementAndClamp = 4,
    Invert = 5,
    IncrementAndWrap = 6,
    DecrementAndWrap = 7,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum BlendFactor {
    Zero = 0,
    One = 1,
    SrcColor = 2,
    OneMinusSrcColor = 3,
    DstColor = 4,
    OneMinusDstColor = 5,
    SrcAlpha = 6,
    OneMinusSrcAlpha = 7,
    DstAlpha = 8,
    OneMinusDstAlpha = 9,
    ConstantColor = 10,
    OneMinusConstantColor = 11,
    ConstantAlpha = 12,
    OneMinusConstantAlpha = 13,
    SrcAlphaSaturate = 14,
    Src1Color = 15,
    OneMinusSrc1Color = 16,
    Src1Alpha = 17,
    OneMinusSrc1Alpha = 18,
}

impl BlendFactor {
    /// Whether this factor reads the pipeline's static blend constants
    /// (spec §4.3 item 5: "blend constants are hashed only when an
    /// attachment uses a CONSTANT blend factor").
    pub fn uses_blend_constants(self) -> bool {
        matches!(
            self,
            BlendFactor::ConstantColor
                | BlendFactor::OneMinusConstantColor
                | BlendFactor::ConstantAlpha
                | BlendFactor::OneMinusConstantAlpha
        )
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum BlendOp {
    Add = 0,
    Subtract = 1,
    ReverseSubtract = 2,
    Min = 3,
    Max = 4,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum LogicOp {
    Clear = 0,
    And = 1,
    AndReverse = 2,
    Copy = 3,
    AndInverted = 4,
    NoOp = 5,
    Xor = 6,
    Or = 7,
    Nor = 8,
    Equivalent = 9,
    Invert = 10,
    OrReverse = 11,
    CopyInverted = 12,
    OrInverted = 13,
    Nand = 14,
    Set = 15,
}

bitflags! {
    #[derive(Default)]
    pub struct ShaderStageFlags: u32 {
        const VERTEX = 1 << 0;
        const TESSELLATION_CONTROL = 1 << 1;
        const TESSELLATION_EVALUATION = 1 << 2;
        const GEOMETRY = 1 << 3;
        const FRAGMENT = 1 << 4;
        const COMPUTE = 1 << 5;
        const RAYGEN = 1 << 8;
        const ANY_HIT = 1 << 9;
        const CLOSEST_HIT = 1 << 10;
        const MISS = 1 << 11;
        const INTERSECTION = 1 << 12;
        const CALLABLE = 1 << 13;
    }
}

bitflags! {
    #[derive(Default)]
    pub struct SampleCountFlags: u32 {
        const TYPE_1 = 1;
        const TYPE_2 = 2;
        const TYPE_4 = 4;
        const TYPE_8 = 8;
        const TYPE_16 = 16;
        const TYPE_32 = 32;
        const TYPE_64 = 64;
    }
}

bitflags! {
    #[derive(Default)]
    pub struct ColorComponentFlags: u32 {
        const R = 0x1;
        const G = 0x2;
        const B = 0x4;
        const A = 0x8;
        const RGBA = Self::R.bits | Self::G.bits | Self::B.bits | Self::A.bits;
    }
}

bitflags! {
    #[derive(Default)]
    pub struct CullModeFlags: u32 {
        const NONE = 0;
        const FRONT = 1;
        const BACK = 2;
        const FRONT_AND_BACK = Self::FRONT.bits | Self::BACK.bits;
    }
}

bitflags! {
    #[derive(Default)]
    pub struct DescriptorSetLayoutCreateFlags: u32 {
        const PUSH_DESCRIPTOR = 1 << 0;
        const UPDATE_AFTER_BIND_POOL = 1 << 1;
        const HOST_ONLY_POOL = 1 << 2;
    }
}

bitflags! {
    #[derive(Default)]
    pub struct PipelineLayoutCreateFlags: u32 {
        const INDEPENDENT_SETS = 1 << 1;
    }
}

bitflags! {
    #[derive(Default)]
    pub struct SamplerCreateFlags: u32 {
        const SUBSAMPLED = 1 << 0;
        const SUBSAMPLED_COARSE_RECONSTRUCTION = 1 << 1;
        /// Capture-replay-only bit; cleared before hashing (spec §4.3).
        const DESCRIPTOR_BUFFER_CAPTURE_REPLAY = 1 << 2;
        /// The full mask of bits that are cleared before hashing a sampler.
        const CAPTURE_REPLAY_MASK = Self::DESCRIPTOR_BUFFER_CAPTURE_REPLAY.bits;
    }
}

bitflags! {
    #[derive(Default)]
    pub struct DescriptorBindingFlags: u32 {
        const UPDATE_AFTER_BIND = 1 << 0;
        const UPDATE_UNUSED_WHILE_PENDING = 1 << 1;
        const PARTIALLY_BOUND = 1 << 2;
        const VARIABLE_DESCRIPTOR_COUNT = 1 << 3;
    }
}
