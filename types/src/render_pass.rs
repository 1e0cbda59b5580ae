use crate::common::{AttachmentLoadOp, AttachmentStoreOp, Format, ImageLayout, PipelineBindPoint, SampleCountFlags};
use crate::pnext::PNextLink;

pub const ATTACHMENT_UNUSED: u32 = u32::MAX;

bitflags::bitflags! {
    #[derive(Default)]
    pub struct DependencyFlags: u32 {
        const BY_REGION = 1 << 0;
        const VIEW_LOCAL = 1 << 1;
        const DEVICE_GROUP = 1 << 2;
    }
}

// ---------------------------------------------------------------------
// v1
// ---------------------------------------------------------------------

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct AttachmentDescription {
    pub flags: u32,
    pub format: Format,
    pub samples: SampleCountFlags,
    pub load_op: AttachmentLoadOp,
    pub store_op: AttachmentStoreOp,
    pub stencil_load_op: AttachmentLoadOp,
    pub stencil_store_op: AttachmentStoreOp,
    pub initial_layout: ImageLayout,
    pub final_layout: ImageLayout,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct AttachmentReference {
    pub attachment: u32,
    pub layout: ImageLayout,
}

impl AttachmentReference {
    pub const UNUSED: AttachmentReference = AttachmentReference {
        attachment: ATTACHMENT_UNUSED,
        layout: ImageLayout::UNDEFINED,
    };
}

#[derive(Clone, Debug)]
pub struct SubpassDescription {
    pub flags: u32,
    pub pipeline_bind_point: PipelineBindPoint,
    pub input_attachments: Vec<AttachmentReference>,
    pub color_attachments: Vec<AttachmentReference>,
    /// Parallel to `color_attachments` when non-empty.
    pub resolve_attachments: Vec<AttachmentReference>,
    pub depth_stencil_attachment: Option<AttachmentReference>,
    pub preserve_attachments: Vec<u32>,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct SubpassDependency {
    pub src_subpass: u32,
    pub dst_subpass: u32,
    pub src_stage_mask: u64,
    pub dst_stage_mask: u64,
    pub src_access_mask: u64,
    pub dst_access_mask: u64,
    pub dependency_flags: DependencyFlags,
}

#[derive(Clone, Debug)]
pub struct RenderPassCreateInfo {
    pub flags: u32,
    pub attachments: Vec<AttachmentDescription>,
    pub subpasses: Vec<SubpassDescription>,
    pub dependencies: Vec<SubpassDependency>,
    pub pnext: Vec<PNextLink>,
}

// ---------------------------------------------------------------------
// v2 (spec §4.3 "Render pass (v1 and v2)")
// ---------------------------------------------------------------------

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct AttachmentDescription2 {
    pub flags: u32,
    pub format: Format,
    pub samples: SampleCountFlags,
    pub load_op: AttachmentLoadOp,
    pub store_op: AttachmentStoreOp,
    pub stencil_load_op: AttachmentLoadOp,
    pub stencil_store_op: AttachmentStoreOp,
    pub initial_layout: ImageLayout,
    pub final_layout: ImageLayout,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct AttachmentReference2 {
    pub attachment: u32,
    pub layout: ImageLayout,
    pub aspect_mask: u32,
}

impl AttachmentReference2 {
    pub const UNUSED: AttachmentReference2 = AttachmentReference2 {
        attachment: ATTACHMENT_UNUSED,
        layout: ImageLayout::UNDEFINED,
        aspect_mask: 0,
    };
}

#[derive(Clone, Debug)]
pub struct SubpassDescription2 {
    pub flags: u32,
    pub pipeline_bind_point: PipelineBindPoint,
    pub view_mask: u32,
    pub input_attachments: Vec<AttachmentReference2>,
    pub color_attachments: Vec<AttachmentReference2>,
    pub resolve_attachments: Vec<AttachmentReference2>,
    pub depth_stencil_attachment: Option<AttachmentReference2>,
    pub preserve_attachments: Vec<u32>,
    pub pnext: Vec<PNextLink>,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct SubpassDependency2 {
    pub src_subpass: u32,
    pub dst_subpass: u32,
    pub src_stage_mask: u64,
    pub dst_stage_mask: u64,
    pub src_access_mask: u64,
    pub dst_access_mask: u64,
    pub dependency_flags: DependencyFlags,
    pub view_offset: i32,
}

#[derive(Clone, Debug)]
pub struct RenderPassCreateInfo2 {
    pub flags: u32,
    pub attachments: Vec<AttachmentDescription2>,
    pub subpasses: Vec<SubpassDescription2>,
    pub dependencies: Vec<SubpassDependency2>,
    pub correlated_view_masks: Vec<u32>,
    pub pnext: Vec<PNextLink>,
}

/// Spec glossary: "Subpass meta — a compact per-render-pass record of which
/// subpasses use color and which use depth-stencil." Computed once per
/// render pass and consulted by the graphics pipeline hasher (spec §4.3
/// item 4) to decide which pipeline sub-structures are live.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct SubpassMeta {
    pub uses_color: bool,
    pub uses_depth_stencil: bool,
}

/// Packs up to 16 subpasses' meta into 2 bits each; an overflow vector
/// backs any render pass with more subpasses (spec §4.7 "subpass meta
/// storage").
#[derive(Clone, Debug, Default)]
pub struct SubpassMetaStorage {
    packed: u32,
    overflow: Vec<SubpassMeta>,
}

const INLINE_SUBPASS_CAPACITY: usize = 16;

impl SubpassMetaStorage {
    pub fn from_metas(metas: &[SubpassMeta]) -> SubpassMetaStorage {
        let mut storage = SubpassMetaStorage::default();
        for (i, meta) in metas.iter().enumerate() {
            storage.set(i, *meta);
        }
        storage
    }

    pub fn set(&mut self, subpass: usize, meta: SubpassMeta) {
        if subpass < INLINE_SUBPASS_CAPACITY {
            let bits = (meta.uses_color as u32) | ((meta.uses_depth_stencil as u32) << 1);
            let shift = subpass * 2;
            self.packed = (self.packed & !(0b11 << shift)) | (bits << shift);
        } else {
            let index = subpass - INLINE_SUBPASS_CAPACITY;
            if self.overflow.len() <= index {
                self.overflow.resize(
                    index + 1,
                    SubpassMeta {
                        uses_color: false,
                        uses_depth_stencil: false,
                    },
                );
            }
            self.overflow[index] = meta;
        }
    }

    pub fn get(&self, subpass: usize) -> SubpassMeta {
        if subpass < INLINE_SUBPASS_CAPACITY {
            let shift = subpass * 2;
            let bits = (self.packed >> shift) & 0b11;
            SubpassMeta {
                uses_color: bits & 0b01 != 0,
                uses_depth_stencil: bits & 0b10 != 0,
            }
        } else {
            self.overflow
                .get(subpass - INLINE_SUBPASS_CAPACITY)
                .copied()
                .unwrap_or(SubpassMeta {
                    uses_color: false,
                    uses_depth_stencil: false,
                })
        }
    }
}

pub fn subpass_meta(subpass: &SubpassDescription) -> SubpassMeta {
    SubpassMeta {
        uses_color: !subpass.color_attachments.is_empty(),
        uses_depth_stencil: subpass.depth_stencil_attachment.is_some(),
    }
}

pub fn subpass_meta2(subpass: &SubpassDescription2) -> SubpassMeta {
    SubpassMeta {
        uses_color: !subpass.color_attachments.is_empty(),
        uses_depth_stencil: subpass.depth_stencil_attachment.is_some(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn subpass_meta_storage_inline_and_overflow() {
        let mut storage = SubpassMetaStorage::default();
        storage.set(
            0,
            SubpassMeta {
                uses_color: true,
                uses_depth_stencil: false,
            },
        );
        storage.set(
            20,
            SubpassMeta {
                uses_color: false,
                uses_depth_stencil: true,
            },
        );
        assert_eq!(storage.get(0).uses_color, true);
        assert_eq!(storage.get(0).uses_depth_stencil, false);
        assert_eq!(storage.get(20).uses_color, false);
        assert_eq!(storage.get(20).uses_depth_stencil, true);
        // Unset subpass defaults to all-false.
        assert_eq!(storage.get(5).uses_color, false);
    }
}
