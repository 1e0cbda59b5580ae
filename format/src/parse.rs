//! Parser: walks a parsed JSON document in dependency order, resolving
//! hash cross-references into live handles and invoking caller-supplied
//! `StateCreator` callbacks (spec §4.5).
//!
//! The parser never talks to a concrete database backend directly — if an
//! entity's cross-reference isn't in the document it's currently walking,
//! it asks an [`ArchiveResolver`] (typically backed by `fossilize-db`) for
//! that entity's raw bytes and recurses.

use crate::entities::*;
use crate::pipeline::{compute_pipeline_from_value, graphics_pipeline_from_value, raytracing_pipeline_from_value};
use crate::shader::decode_shader_module_blob;
use fossilize_hash::FxHashMap;
use fossilize_types::application::{ApplicationBlobLink, ApplicationInfo};
use fossilize_types::descriptor_set_layout::DescriptorSetLayoutCreateInfo;
use fossilize_types::pipeline::compute::ComputePipelineCreateInfo;
use fossilize_types::pipeline::graphics::GraphicsPipelineCreateInfo;
use fossilize_types::pipeline::raytracing::RaytracingPipelineCreateInfo;
use fossilize_types::pipeline::stage::ShaderModuleRef;
use fossilize_types::pipeline_layout::PipelineLayoutCreateInfo;
use fossilize_types::render_pass::{RenderPassCreateInfo, RenderPassCreateInfo2};
use fossilize_types::sampler::SamplerCreateInfo;
use fossilize_types::shader_module::ShaderModuleCreateInfo;
use fossilize_types::{FossilizeError, Handle, Hash, ResourceTag, Result, FORMAT_MIN_COMPAT_VERSION, FORMAT_VERSION};
use serde_json::Value;

/// Supplies a single entity's raw persisted bytes when the document being
/// parsed doesn't itself contain the referenced `(tag, hash)`.
///
/// For every tag but [`ResourceTag::ShaderModule`] the bytes are the
/// entity's JSON text (as produced by `serde_json::to_vec` over its
/// `to_value()`); for shader modules they're the framed blob from
/// [`crate::shader::encode_shader_module_blob`].
pub trait ArchiveResolver {
    fn resolve_blob(&self, tag: ResourceTag, hash: Hash) -> Result<Option<Vec<u8>>>;
}

/// Caller-supplied creation callbacks, one per entity kind (spec §4.5:
/// "the parser invokes caller-supplied `StateCreator` callbacks").
///
/// Application info and application-blob-links don't produce a live API
/// object, so they have no `out_handle` parameter.
pub trait StateCreator {
    fn enqueue_create_application_info(&mut self, hash: Hash, info: ApplicationInfo) -> Result<()>;
    fn enqueue_create_application_blob_link(&mut self, hash: Hash, link: ApplicationBlobLink) -> Result<()>;
    fn enqueue_create_shader_module(&mut self, hash: Hash, info: ShaderModuleCreateInfo) -> Result<Handle>;
    fn enqueue_create_sampler(&mut self, hash: Hash, info: SamplerCreateInfo) -> Result<Handle>;
    fn enqueue_create_descriptor_set_layout(&mut self, hash: Hash, info: DescriptorSetLayoutCreateInfo) -> Result<Handle>;
    fn enqueue_create_pipeline_layout(&mut self, hash: Hash, info: PipelineLayoutCreateInfo) -> Result<Handle>;
    fn enqueue_create_render_pass(&mut self, hash: Hash, info: RenderPassCreateInfo) -> Result<Handle>;
    fn enqueue_create_render_pass2(&mut self, hash: Hash, info: RenderPassCreateInfo2) -> Result<Handle>;
    fn enqueue_create_compute_pipeline(&mut self, hash: Hash, info: ComputePipelineCreateInfo) -> Result<Handle>;
    fn enqueue_create_graphics_pipeline(&mut self, hash: Hash, info: GraphicsPipelineCreateInfo) -> Result<Handle>;
    fn enqueue_create_raytracing_pipeline(&mut self, hash: Hash, info: RaytracingPipelineCreateInfo) -> Result<Handle>;

    /// Called once per tag after every entity of that kind in the current
    /// section has been enqueued, so the creator may flush (spec §4.5).
    fn notify_replayed_resources_for_type(&mut self, tag: ResourceTag) -> Result<()>;
}

fn parse_hex(s: &str) -> Result<Hash> {
    u64::from_str_radix(s, 16).map_err(|_| FossilizeError::Corruption(format!("invalid hash key {:?}", s)))
}

/// Evaluates a per-entity `Result`, logging a warning and `continue`-ing the
/// enclosing loop on failure instead of aborting the rest of the section
/// (spec §7: an unknown `pNext` sType or a missing cross-reference fails
/// only the referencing entity; siblings still parse).
macro_rules! try_entity {
    ($tag:expr, $hash:expr, $result:expr) => {
        match $result {
            Ok(v) => v,
            Err(e) => {
                log::warn!("skipping {} entry {:016x}: {}", $tag.json_key(), $hash, e);
                continue;
            }
        }
    };
}

/// Like [`try_entity!`], for the one failure mode that precedes knowing the
/// entity's hash: an unparsable JSON key.
macro_rules! try_key {
    ($tag:expr, $hash_str:expr, $result:expr) => {
        match $result {
            Ok(v) => v,
            Err(e) => {
                log::warn!("skipping {} entry with malformed key {:?}: {}", $tag.json_key(), $hash_str, e);
                continue;
            }
        }
    };
}

/// Drives one or more documents against a [`StateCreator`], remembering
/// the hash -> live-handle mapping for every entity it has replayed.
#[derive(Default)]
pub struct Parser {
    replayed: FxHashMap<(u8, Hash), Handle>,
}

impl Parser {
    pub fn new() -> Parser {
        Parser::default()
    }

    /// Clears every replayed-handle mapping (spec §4.5: "may be cleared via
    /// `forget_handle_references()` at archive boundaries").
    pub fn forget_handle_references(&mut self) {
        self.replayed.clear();
    }

    pub fn parse_document(
        &mut self,
        document: &Value,
        resolver: Option<&dyn ArchiveResolver>,
        creator: &mut dyn StateCreator,
    ) -> Result<()> {
        let version = document
            .get("version")
            .and_then(Value::as_u64)
            .ok_or_else(|| FossilizeError::Corruption("document missing version field".into()))? as u32;
        if version < FORMAT_MIN_COMPAT_VERSION || version > FORMAT_VERSION {
            return Err(FossilizeError::UnsupportedFormatVersion {
                found: version,
                min: FORMAT_MIN_COMPAT_VERSION,
                max: FORMAT_VERSION,
            });
        }

        self.parse_application_info(document, creator)?;
        self.parse_application_blob_links(document, creator)?;
        self.parse_shader_modules(document, creator)?;
        self.parse_samplers(document, creator)?;
        self.parse_descriptor_set_layouts(document, resolver, creator)?;
        self.parse_pipeline_layouts(document, resolver, creator)?;
        self.parse_render_passes(document, creator)?;
        self.parse_compute_pipelines(document, resolver, creator)?;
        self.parse_graphics_pipelines(document, resolver, creator)?;
        self.parse_raytracing_pipelines(document, resolver, creator)?;
        Ok(())
    }

    fn section<'a>(document: &'a Value, tag: ResourceTag) -> Option<&'a serde_json::Map<String, Value>> {
        document.get(tag.json_key()).and_then(Value::as_object)
    }

    fn remember(&mut self, tag: ResourceTag, hash: Hash, handle: Handle) {
        self.replayed.insert((tag.to_raw(), hash), handle);
    }

    /// Resolves `(tag, hash)` to a replayed handle, recursing into
    /// `resolver` (and, transitively, back into this parser) if the
    /// reference hasn't been replayed yet.
    fn resolve(
        &mut self,
        tag: ResourceTag,
        hash: Hash,
        resolver: Option<&dyn ArchiveResolver>,
        creator: &mut dyn StateCreator,
    ) -> Result<Handle> {
        if let Some(&handle) = self.replayed.get(&(tag.to_raw(), hash)) {
            return Ok(handle);
        }
        let Some(resolver) = resolver else {
            return Err(FossilizeError::MissingReference { tag, hash });
        };
        let Some(bytes) = resolver.resolve_blob(tag, hash)? else {
            return Err(FossilizeError::MissingReference { tag, hash });
        };
        let handle = match tag {
            ResourceTag::ShaderModule => {
                let info = decode_shader_module_blob(&bytes)?;
                creator.enqueue_create_shader_module(hash, info)?
            }
            ResourceTag::Sampler => {
                let value: Value = serde_json::from_slice(&bytes)?;
                creator.enqueue_create_sampler(hash, sampler_from_value(&value)?)?
            }
            ResourceTag::DescriptorSetLayout => {
                let value: Value = serde_json::from_slice(&bytes)?;
                let mut info = descriptor_set_layout_from_value(&value)?;
                self.resolve_descriptor_set_layout_refs(&mut info, resolver, creator)?;
                creator.enqueue_create_descriptor_set_layout(hash, info)?
            }
            ResourceTag::PipelineLayout => {
                let value: Value = serde_json::from_slice(&bytes)?;
                let mut info = pipeline_layout_from_value(&value)?;
                self.resolve_pipeline_layout_refs(&mut info, resolver, creator)?;
                creator.enqueue_create_pipeline_layout(hash, info)?
            }
            ResourceTag::RenderPass => {
                let value: Value = serde_json::from_slice(&bytes)?;
                match value.get("version").and_then(Value::as_u64) {
                    Some(2) => creator.enqueue_create_render_pass2(hash, render_pass2_from_value(&value)?)?,
                    _ => creator.enqueue_create_render_pass(hash, render_pass_from_value(&value)?)?,
                }
            }
            ResourceTag::ComputePipeline => {
                let value: Value = serde_json::from_slice(&bytes)?;
                let mut info = compute_pipeline_from_value(&value)?;
                self.resolve_compute_pipeline_refs(&mut info, resolver, creator)?;
                creator.enqueue_create_compute_pipeline(hash, info)?
            }
            ResourceTag::GraphicsPipeline => {
                let value: Value = serde_json::from_slice(&bytes)?;
                let mut info = graphics_pipeline_from_value(&value)?;
                self.resolve_graphics_pipeline_refs(&mut info, resolver, creator)?;
                creator.enqueue_create_graphics_pipeline(hash, info)?
            }
            ResourceTag::RaytracingPipeline => {
                let value: Value = serde_json::from_slice(&bytes)?;
                let mut info = raytracing_pipeline_from_value(&value)?;
                self.resolve_raytracing_pipeline_refs(&mut info, resolver, creator)?;
                creator.enqueue_create_raytracing_pipeline(hash, info)?
            }
            ResourceTag::ApplicationInfo | ResourceTag::ApplicationBlobLink => {
                return Err(FossilizeError::MissingReference { tag, hash });
            }
        };
        self.remember(tag, hash, handle);
        Ok(handle)
    }

    fn parse_application_info(&mut self, document: &Value, creator: &mut dyn StateCreator) -> Result<()> {
        let Some(section) = Self::section(document, ResourceTag::ApplicationInfo) else {
            return Ok(());
        };
        for (hash_str, value) in section {
            let hash = try_key!(ResourceTag::ApplicationInfo, hash_str, parse_hex(hash_str));
            let info = try_entity!(ResourceTag::ApplicationInfo, hash, application_info_from_value(value));
            try_entity!(ResourceTag::ApplicationInfo, hash, creator.enqueue_create_application_info(hash, info));
        }
        creator.notify_replayed_resources_for_type(ResourceTag::ApplicationInfo)
    }

    fn parse_application_blob_links(&mut self, document: &Value, creator: &mut dyn StateCreator) -> Result<()> {
        let Some(section) = Self::section(document, ResourceTag::ApplicationBlobLink) else {
            return Ok(());
        };
        for (hash_str, value) in section {
            let hash = try_key!(ResourceTag::ApplicationBlobLink, hash_str, parse_hex(hash_str));
            let link = try_entity!(ResourceTag::ApplicationBlobLink, hash, application_blob_link_from_value(value));
            try_entity!(ResourceTag::ApplicationBlobLink, hash, creator.enqueue_create_application_blob_link(hash, link));
        }
        creator.notify_replayed_resources_for_type(ResourceTag::ApplicationBlobLink)
    }

    fn parse_shader_modules(&mut self, document: &Value, creator: &mut dyn StateCreator) -> Result<()> {
        let Some(section) = Self::section(document, ResourceTag::ShaderModule) else {
            return Ok(());
        };
        for (hash_str, value) in section {
            let hash = try_key!(ResourceTag::ShaderModule, hash_str, parse_hex(hash_str));
            let bytes = try_entity!(
                ResourceTag::ShaderModule,
                hash,
                value
                    .as_array()
                    .ok_or_else(|| FossilizeError::Corruption("shader module entry is not a byte array".into()))?
                    .iter()
                    .map(|v| v.as_u64().map(|v| v as u8))
                    .collect::<Option<Vec<_>>>()
                    .ok_or_else(|| FossilizeError::Corruption("shader module entry has non-byte element".into()))
            );
            let info = try_entity!(ResourceTag::ShaderModule, hash, decode_shader_module_blob(&bytes));
            let handle = try_entity!(ResourceTag::ShaderModule, hash, creator.enqueue_create_shader_module(hash, info));
            self.remember(ResourceTag::ShaderModule, hash, handle);
        }
        creator.notify_replayed_resources_for_type(ResourceTag::ShaderModule)
    }

    fn parse_samplers(&mut self, document: &Value, creator: &mut dyn StateCreator) -> Result<()> {
        let Some(section) = Self::section(document, ResourceTag::Sampler) else {
            return Ok(());
        };
        for (hash_str, value) in section {
            let hash = try_key!(ResourceTag::Sampler, hash_str, parse_hex(hash_str));
            let info = try_entity!(ResourceTag::Sampler, hash, sampler_from_value(value));
            let handle = try_entity!(ResourceTag::Sampler, hash, creator.enqueue_create_sampler(hash, info));
            self.remember(ResourceTag::Sampler, hash, handle);
        }
        creator.notify_replayed_resources_for_type(ResourceTag::Sampler)
    }

    fn resolve_descriptor_set_layout_refs(
        &mut self,
        info: &mut DescriptorSetLayoutCreateInfo,
        resolver: Option<&dyn ArchiveResolver>,
        creator: &mut dyn StateCreator,
    ) -> Result<()> {
        for binding in &mut info.bindings {
            for sampler in &mut binding.immutable_samplers {
                *sampler = self.resolve(ResourceTag::Sampler, *sampler, resolver, creator)?;
            }
        }
        Ok(())
    }

    fn parse_descriptor_set_layouts(
        &mut self,
        document: &Value,
        resolver: Option<&dyn ArchiveResolver>,
        creator: &mut dyn StateCreator,
    ) -> Result<()> {
        let Some(section) = Self::section(document, ResourceTag::DescriptorSetLayout) else {
            return Ok(());
        };
        let mut entries = Vec::with_capacity(section.len());
        for (hash_str, value) in section {
            let hash = try_key!(ResourceTag::DescriptorSetLayout, hash_str, parse_hex(hash_str));
            entries.push((hash, value.clone()));
        }
        for (hash, value) in entries {
            let mut info = try_entity!(ResourceTag::DescriptorSetLayout, hash, descriptor_set_layout_from_value(&value));
            try_entity!(
                ResourceTag::DescriptorSetLayout,
                hash,
                self.resolve_descriptor_set_layout_refs(&mut info, resolver, creator)
            );
            let handle = try_entity!(ResourceTag::DescriptorSetLayout, hash, creator.enqueue_create_descriptor_set_layout(hash, info));
            self.remember(ResourceTag::DescriptorSetLayout, hash, handle);
        }
        creator.notify_replayed_resources_for_type(ResourceTag::DescriptorSetLayout)
    }

    fn resolve_pipeline_layout_refs(
        &mut self,
        info: &mut PipelineLayoutCreateInfo,
        resolver: Option<&dyn ArchiveResolver>,
        creator: &mut dyn StateCreator,
    ) -> Result<()> {
        for set_layout in &mut info.set_layouts {
            if let Some(hash) = set_layout {
                *hash = self.resolve(ResourceTag::DescriptorSetLayout, *hash, resolver, creator)?;
            }
        }
        Ok(())
    }

    fn parse_pipeline_layouts(
        &mut self,
        document: &Value,
        resolver: Option<&dyn ArchiveResolver>,
        creator: &mut dyn StateCreator,
    ) -> Result<()> {
        let Some(section) = Self::section(document, ResourceTag::PipelineLayout) else {
            return Ok(());
        };
        let mut entries = Vec::with_capacity(section.len());
        for (hash_str, value) in section {
            let hash = try_key!(ResourceTag::PipelineLayout, hash_str, parse_hex(hash_str));
            entries.push((hash, value.clone()));
        }
        for (hash, value) in entries {
            let mut info = try_entity!(ResourceTag::PipelineLayout, hash, pipeline_layout_from_value(&value));
            try_entity!(ResourceTag::PipelineLayout, hash, self.resolve_pipeline_layout_refs(&mut info, resolver, creator));
            let handle = try_entity!(ResourceTag::PipelineLayout, hash, creator.enqueue_create_pipeline_layout(hash, info));
            self.remember(ResourceTag::PipelineLayout, hash, handle);
        }
        creator.notify_replayed_resources_for_type(ResourceTag::PipelineLayout)
    }

    /// Render passes have no cross-entity references of their own, so v1
    /// and v2 entries (distinguished by a `"version"` discriminator) share
    /// one JSON section and are walked "v1 then v2" within it (spec §4.5).
    fn parse_render_passes(&mut self, document: &Value, creator: &mut dyn StateCreator) -> Result<()> {
        let Some(section) = Self::section(document, ResourceTag::RenderPass) else {
            return Ok(());
        };
        let mut v1 = Vec::new();
        let mut v2 = Vec::new();
        for (hash_str, value) in section {
            let hash = try_key!(ResourceTag::RenderPass, hash_str, parse_hex(hash_str));
            match value.get("version").and_then(Value::as_u64) {
                Some(2) => v2.push((hash, value)),
                _ => v1.push((hash, value)),
            }
        }
        for (hash, value) in v1 {
            let info = try_entity!(ResourceTag::RenderPass, hash, render_pass_from_value(value));
            let handle = try_entity!(ResourceTag::RenderPass, hash, creator.enqueue_create_render_pass(hash, info));
            self.remember(ResourceTag::RenderPass, hash, handle);
        }
        for (hash, value) in v2 {
            let info = try_entity!(ResourceTag::RenderPass, hash, render_pass2_from_value(value));
            let handle = try_entity!(ResourceTag::RenderPass, hash, creator.enqueue_create_render_pass2(hash, info));
            self.remember(ResourceTag::RenderPass, hash, handle);
        }
        creator.notify_replayed_resources_for_type(ResourceTag::RenderPass)
    }

    fn resolve_stage_refs(
        &mut self,
        stage: &mut fossilize_types::pipeline::stage::PipelineShaderStageCreateInfo,
        resolver: Option<&dyn ArchiveResolver>,
        creator: &mut dyn StateCreator,
    ) -> Result<()> {
        if let ShaderModuleRef::Handle(hash) = &mut stage.module {
            *hash = self.resolve(ResourceTag::ShaderModule, *hash, resolver, creator)?;
        }
        Ok(())
    }

    fn resolve_compute_pipeline_refs(
        &mut self,
        info: &mut ComputePipelineCreateInfo,
        resolver: Option<&dyn ArchiveResolver>,
        creator: &mut dyn StateCreator,
    ) -> Result<()> {
        self.resolve_stage_refs(&mut info.stage, resolver, creator)?;
        if let Some(layout) = &mut info.layout {
            *layout = self.resolve(ResourceTag::PipelineLayout, *layout, resolver, creator)?;
        }
        if let Some(base) = &mut info.base_pipeline {
            *base = self.resolve(ResourceTag::ComputePipeline, *base, resolver, creator)?;
        }
        Ok(())
    }

    fn parse_compute_pipelines(
        &mut self,
        document: &Value,
        resolver: Option<&dyn ArchiveResolver>,
        creator: &mut dyn StateCreator,
    ) -> Result<()> {
        let Some(section) = Self::section(document, ResourceTag::ComputePipeline) else {
            return Ok(());
        };
        let mut entries = Vec::with_capacity(section.len());
        for (hash_str, value) in section {
            let hash = try_key!(ResourceTag::ComputePipeline, hash_str, parse_hex(hash_str));
            entries.push((hash, value.clone()));
        }
        for (hash, value) in entries {
            let mut info = try_entity!(ResourceTag::ComputePipeline, hash, compute_pipeline_from_value(&value));
            try_entity!(ResourceTag::ComputePipeline, hash, self.resolve_compute_pipeline_refs(&mut info, resolver, creator));
            let handle = try_entity!(ResourceTag::ComputePipeline, hash, creator.enqueue_create_compute_pipeline(hash, info));
            self.remember(ResourceTag::ComputePipeline, hash, handle);
        }
        creator.notify_replayed_resources_for_type(ResourceTag::ComputePipeline)
    }

    fn resolve_graphics_pipeline_refs(
        &mut self,
        info: &mut GraphicsPipelineCreateInfo,
        resolver: Option<&dyn ArchiveResolver>,
        creator: &mut dyn StateCreator,
    ) -> Result<()> {
        for stage in &mut info.stages {
            self.resolve_stage_refs(stage, resolver, creator)?;
        }
        if let Some(layout) = &mut info.layout {
            *layout = self.resolve(ResourceTag::PipelineLayout, *layout, resolver, creator)?;
        }
        if let Some(render_pass) = &mut info.render_pass {
            *render_pass = self.resolve(ResourceTag::RenderPass, *render_pass, resolver, creator)?;
        }
        if let Some(base) = &mut info.base_pipeline {
            *base = self.resolve(ResourceTag::GraphicsPipeline, *base, resolver, creator)?;
        }
        for library in &mut info.libraries {
            *library = self.resolve(ResourceTag::GraphicsPipeline, *library, resolver, creator)?;
        }
        Ok(())
    }

    fn parse_graphics_pipelines(
        &mut self,
        document: &Value,
        resolver: Option<&dyn ArchiveResolver>,
        creator: &mut dyn StateCreator,
    ) -> Result<()> {
        let Some(section) = Self::section(document, ResourceTag::GraphicsPipeline) else {
            return Ok(());
        };
        let mut entries = Vec::with_capacity(section.len());
        for (hash_str, value) in section {
            let hash = try_key!(ResourceTag::GraphicsPipeline, hash_str, parse_hex(hash_str));
            entries.push((hash, value.clone()));
        }
        for (hash, value) in entries {
            let mut info = try_entity!(ResourceTag::GraphicsPipeline, hash, graphics_pipeline_from_value(&value));
            try_entity!(ResourceTag::GraphicsPipeline, hash, self.resolve_graphics_pipeline_refs(&mut info, resolver, creator));
            let handle = try_entity!(ResourceTag::GraphicsPipeline, hash, creator.enqueue_create_graphics_pipeline(hash, info));
            self.remember(ResourceTag::GraphicsPipeline, hash, handle);
        }
        creator.notify_replayed_resources_for_type(ResourceTag::GraphicsPipeline)
    }

    fn resolve_raytracing_pipeline_refs(
        &mut self,
        info: &mut RaytracingPipelineCreateInfo,
        resolver: Option<&dyn ArchiveResolver>,
        creator: &mut dyn StateCreator,
    ) -> Result<()> {
        for stage in &mut info.stages {
            self.resolve_stage_refs(stage, resolver, creator)?;
        }
        if let Some(layout) = &mut info.layout {
            *layout = self.resolve(ResourceTag::PipelineLayout, *layout, resolver, creator)?;
        }
        if let Some(base) = &mut info.base_pipeline {
            *base = self.resolve(ResourceTag::RaytracingPipeline, *base, resolver, creator)?;
        }
        for library in &mut info.libraries {
            *library = self.resolve(ResourceTag::RaytracingPipeline, *library, resolver, creator)?;
        }
        Ok(())
    }

    fn parse_raytracing_pipelines(
        &mut self,
        document: &Value,
        resolver: Option<&dyn ArchiveResolver>,
        creator: &mut dyn StateCreator,
    ) -> Result<()> {
        let Some(section) = Self::section(document, ResourceTag::RaytracingPipeline) else {
            return Ok(());
        };
        let mut entries = Vec::with_capacity(section.len());
        for (hash_str, value) in section {
            let hash = try_key!(ResourceTag::RaytracingPipeline, hash_str, parse_hex(hash_str));
            entries.push((hash, value.clone()));
        }
        for (hash, value) in entries {
            let mut info = try_entity!(ResourceTag::RaytracingPipeline, hash, raytracing_pipeline_from_value(&value));
            try_entity!(ResourceTag::RaytracingPipeline, hash, self.resolve_raytracing_pipeline_refs(&mut info, resolver, creator));
            let handle = try_entity!(ResourceTag::RaytracingPipeline, hash, creator.enqueue_create_raytracing_pipeline(hash, info));
            self.remember(ResourceTag::RaytracingPipeline, hash, handle);
        }
        creator.notify_replayed_resources_for_type(ResourceTag::RaytracingPipeline)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fossilize_types::sampler::SamplerCreateInfo;
    use serde_json::json;
    use std::cell::RefCell;

    struct RecordingCreator {
        next_handle: Handle,
        samplers: RefCell<Vec<(Hash, SamplerCreateInfo)>>,
        notified: RefCell<Vec<ResourceTag>>,
    }

    impl StateCreator for RecordingCreator {
        fn enqueue_create_application_info(&mut self, _hash: Hash, _info: ApplicationInfo) -> Result<()> {
            Ok(())
        }
        fn enqueue_create_application_blob_link(&mut self, _hash: Hash, _link: ApplicationBlobLink) -> Result<()> {
            Ok(())
        }
        fn enqueue_create_shader_module(&mut self, _hash: Hash, _info: ShaderModuleCreateInfo) -> Result<Handle> {
            self.next_handle += 1;
            Ok(self.next_handle)
        }
        fn enqueue_create_sampler(&mut self, hash: Hash, info: SamplerCreateInfo) -> Result<Handle> {
            self.next_handle += 1;
            self.samplers.borrow_mut().push((hash, info));
            Ok(self.next_handle)
        }
        fn enqueue_create_descriptor_set_layout(&mut self, _hash: Hash, _info: DescriptorSetLayoutCreateInfo) -> Result<Handle> {
            self.next_handle += 1;
            Ok(self.next_handle)
        }
        fn enqueue_create_pipeline_layout(&mut self, _hash: Hash, _info: PipelineLayoutCreateInfo) -> Result<Handle> {
            self.next_handle += 1;
            Ok(self.next_handle)
        }
        fn enqueue_create_render_pass(&mut self, _hash: Hash, _info: RenderPassCreateInfo) -> Result<Handle> {
            self.next_handle += 1;
            Ok(self.next_handle)
        }
        fn enqueue_create_render_pass2(&mut self, _hash: Hash, _info: RenderPassCreateInfo2) -> Result<Handle> {
            self.next_handle += 1;
            Ok(self.next_handle)
        }
        fn enqueue_create_compute_pipeline(&mut self, _hash: Hash, _info: ComputePipelineCreateInfo) -> Result<Handle> {
            self.next_handle += 1;
            Ok(self.next_handle)
        }
        fn enqueue_create_graphics_pipeline(&mut self, _hash: Hash, _info: GraphicsPipelineCreateInfo) -> Result<Handle> {
            self.next_handle += 1;
            Ok(self.next_handle)
        }
        fn enqueue_create_raytracing_pipeline(&mut self, _hash: Hash, _info: RaytracingPipelineCreateInfo) -> Result<Handle> {
            self.next_handle += 1;
            Ok(self.next_handle)
        }
        fn notify_replayed_resources_for_type(&mut self, tag: ResourceTag) -> Result<()> {
            self.notified.borrow_mut().push(tag);
            Ok(())
        }
    }

    fn sample_document() -> Value {
        json!({
            "version": FORMAT_VERSION,
            "samplers": {
                "0000000000000001": {
                    "flags": 0, "magFilter": 0, "minFilter": 0, "mipmapMode": 0,
                    "addressModeU": 0, "addressModeV": 0, "addressModeW": 0,
                    "mipLodBias": 0.0, "anisotropyEnable": false, "maxAnisotropy": 0.0,
                    "compareEnable": false, "compareOp": 0, "minLod": 0.0, "maxLod": 0.0,
                    "borderColor": 0, "unnormalizedCoordinates": false, "pNext": [],
                }
            }
        })
    }

    #[test]
    fn parses_a_sampler_section_and_notifies() {
        let mut parser = Parser::new();
        let mut creator = RecordingCreator {
            next_handle: 0,
            samplers: RefCell::new(Vec::new()),
            notified: RefCell::new(Vec::new()),
        };
        parser.parse_document(&sample_document(), None, &mut creator).unwrap();
        assert_eq!(creator.samplers.borrow().len(), 1);
        assert_eq!(creator.samplers.borrow()[0].0, 1);
        assert!(creator.notified.borrow().contains(&ResourceTag::Sampler));
    }

    #[test]
    fn rejects_out_of_range_version() {
        let mut parser = Parser::new();
        let mut creator = RecordingCreator {
            next_handle: 0,
            samplers: RefCell::new(Vec::new()),
            notified: RefCell::new(Vec::new()),
        };
        let doc = json!({ "version": FORMAT_MIN_COMPAT_VERSION - 1 });
        assert!(parser.parse_document(&doc, None, &mut creator).is_err());
    }

    /// A missing cross-reference fails only the referencing entity; the
    /// document as a whole still parses and siblings are unaffected
    /// (spec §7, §8 S4).
    #[test]
    fn missing_cross_reference_skips_only_that_entity() {
        let mut parser = Parser::new();
        let mut creator = RecordingCreator {
            next_handle: 0,
            samplers: RefCell::new(Vec::new()),
            notified: RefCell::new(Vec::new()),
        };
        let doc = json!({
            "version": FORMAT_VERSION,
            "pipelineLayouts": {
                "0000000000000002": {
                    "flags": 0,
                    "setLayouts": ["0000000000000099"],
                    "pushConstantRanges": [],
                    "pNext": [],
                }
            },
            "samplers": {
                "0000000000000001": {
                    "flags": 0, "magFilter": 0, "minFilter": 0, "mipmapMode": 0,
                    "addressModeU": 0, "addressModeV": 0, "addressModeW": 0,
                    "mipLodBias": 0.0, "anisotropyEnable": false, "maxAnisotropy": 0.0,
                    "compareEnable": false, "compareOp": 0, "minLod": 0.0, "maxLod": 0.0,
                    "borderColor": 0, "unnormalizedCoordinates": false, "pNext": [],
                }
            }
        });
        parser.parse_document(&doc, None, &mut creator).unwrap();
        // The pipeline layout's dangling set-layout reference skipped it...
        assert!(creator.notified.borrow().contains(&ResourceTag::PipelineLayout));
        // ...but the sampler, parsed afterwards, still went through.
        assert_eq!(creator.samplers.borrow().len(), 1);
    }
}
