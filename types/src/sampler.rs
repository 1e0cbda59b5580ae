use crate::common::{BorderColor, CompareOp, Filter, SamplerAddressMode, SamplerCreateFlags, SamplerMipmapMode};
use crate::pnext::PNextLink;
use ordered_float::NotNan;

/// `VkSamplerCreateInfo`. Spec §4.3 "Sampler": "All fields contribute...
/// Capture-replay-only flags are cleared before hashing."
#[derive(Clone, Debug)]
pub struct SamplerCreateInfo {
    pub flags: SamplerCreateFlags,
    pub mag_filter: Filter,
    pub min_filter: Filter,
    pub mipmap_mode: SamplerMipmapMode,
    pub address_mode_u: SamplerAddressMode,
    pub address_mode_v: SamplerAddressMode,
    pub address_mode_w: SamplerAddressMode,
    pub mip_lod_bias: NotNan<f32>,
    pub anisotropy_enable: bool,
    pub max_anisotropy: NotNan<f32>,
    pub compare_enable: bool,
    pub compare_op: CompareOp,
    pub min_lod: NotNan<f32>,
    pub max_lod: NotNan<f32>,
    pub border_color: BorderColor,
    pub unnormalized_coordinates: bool,
    pub pnext: Vec<PNextLink>,
}
