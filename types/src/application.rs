use crate::pnext::FeaturePNextLink;

/// `VkApplicationInfo` plus the subset of `VkPhysicalDeviceFeatures2` that
/// affects pipeline compilation. Spec §3: "Application info — engine/app
/// name, version, API version — hashed once per capture and referenced by
/// every other entity via an `APPLICATION_BLOB_LINK` record."
#[derive(Clone, Debug, Default)]
pub struct ApplicationInfo {
    pub application_name: Option<String>,
    pub application_version: u32,
    pub engine_name: Option<String>,
    pub engine_version: u32,
    pub api_version: u32,
}

/// The whitelisted feature chain captured alongside [`ApplicationInfo`].
/// Spec §4.3: "features relevant to compilation are hashed; everything
/// else on the chain is ignored."
#[derive(Clone, Debug, Default)]
pub struct ApplicationFeatureInfo {
    pub links: Vec<FeaturePNextLink>,
}

/// `RESOURCE_APPLICATION_BLOB_LINK`: a record that exists solely to tie an
/// arbitrary application-supplied blob (e.g. a pipeline cache UUID or
/// driver version string) to the [`ApplicationInfo`] it was captured under
/// (spec §3 tag 8). The entry is itself *keyed* by the composite
/// application-feature hash (spec §4.3 "application-info link"), computed
/// by the recorder from the application-feature context active when the
/// link is recorded, not by this field.
#[derive(Clone, Debug)]
pub struct ApplicationBlobLink {
    pub application_info_hash: u64,
    pub blob: Vec<u8>,
}
