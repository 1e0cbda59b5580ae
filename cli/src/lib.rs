//! Shared plumbing for the six database-maintenance binaries (spec §6).
//!
//! Most of the tools (`convert-db`, `merge-db`, `unmerge-db`, `list`,
//! `prune`) operate directly on [`fossilize_db::Database`]'s `(tag, hash)
//! -> bytes` contract and never need to understand an entity's internal
//! shape. Only `rehash` actually decodes entities back into typed
//! create-info structs and replays them through a [`fossilize_recorder::Recorder`]
//! — see [`rehash_database`].

use fossilize_db::{Database, PayloadReadFlags};
use fossilize_format::parse::{Parser, StateCreator};
use fossilize_format::{entities, shader};
use fossilize_hash::FxHashSet;
use fossilize_recorder::filter::ApplicationFilter;
use fossilize_recorder::Recorder;
use fossilize_types::application::{ApplicationBlobLink, ApplicationFeatureInfo, ApplicationInfo};
use fossilize_types::descriptor_set_layout::DescriptorSetLayoutCreateInfo;
use fossilize_types::pipeline::compute::ComputePipelineCreateInfo;
use fossilize_types::pipeline::graphics::GraphicsPipelineCreateInfo;
use fossilize_types::pipeline::raytracing::RaytracingPipelineCreateInfo;
use fossilize_types::pipeline::stage::ShaderModuleRef;
use fossilize_types::pipeline_layout::PipelineLayoutCreateInfo;
use fossilize_types::render_pass::{RenderPassCreateInfo, RenderPassCreateInfo2};
use fossilize_types::sampler::SamplerCreateInfo;
use fossilize_types::shader_module::ShaderModuleCreateInfo;
use fossilize_types::{FossilizeError, Handle, Hash, ResourceTag, Result, FORMAT_VERSION};
use serde_json::{Map, Value};

/// Copies every entry from `src` into `dst`, tag by tag, with `write_entry`'s
/// at-most-once semantics doing the union (spec §6 `convert-db`/`merge-db`:
/// "enumerate hashes and copy entries").
pub fn copy_all_entries(
    src: &mut dyn Database,
    dst: &mut dyn Database,
    flags: fossilize_db::PayloadWriteFlags,
) -> Result<u64> {
    let mut copied = 0u64;
    for tag in ResourceTag::ALL {
        for hash in src.hash_list_for_tag(tag) {
            let Some(payload) = src.read_entry(tag, hash, PayloadReadFlags::empty())? else {
                continue;
            };
            if dst.has_entry(tag, hash) {
                continue;
            }
            dst.write_entry(tag, hash, &payload, flags)?;
            copied += 1;
        }
    }
    Ok(copied)
}

/// Assembles every entity a database holds into one combined JSON document
/// shaped the way [`Parser::parse_document`] expects: a `version` field plus
/// one object per [`ResourceTag::json_key`], keyed by 16-hex-digit hash
/// (spec §4.5, §6 "JSON blob format").
///
/// Per-entry storage holds each entity's bare value already (no `version`
/// envelope); shader modules are the one exception, stored as the framed
/// binary blob `encode_shader_module_blob` produces rather than a JSON
/// object, so they're re-wrapped here as the byte array `Parser` expects.
pub fn build_document(db: &mut dyn Database) -> Result<Value> {
    let mut doc = Map::new();
    doc.insert("version".to_string(), Value::from(FORMAT_VERSION));
    for tag in ResourceTag::ALL {
        let mut section = Map::new();
        for hash in db.hash_list_for_tag(tag) {
            let Some(bytes) = db.read_entry(tag, hash, PayloadReadFlags::empty())? else {
                continue;
            };
            let value = if tag == ResourceTag::ShaderModule {
                Value::Array(bytes.into_iter().map(Value::from).collect())
            } else {
                serde_json::from_slice(&bytes)?
            };
            section.insert(format!("{:016x}", hash), value);
        }
        if !section.is_empty() {
            doc.insert(tag.json_key().to_string(), Value::Object(section));
        }
    }
    Ok(Value::Object(doc))
}

fn hex_str(value: &Value) -> Option<Hash> {
    value.as_str().and_then(|s| u64::from_str_radix(s, 16).ok())
}

/// The direct `(tag, hash)` edges a stored entity's JSON value references,
/// grounded on the exact field names `fossilize-format`'s `*_to_value`
/// functions emit (spec §6 `list --connectivity`: "optionally resolved
/// dependency edges").
pub fn dependencies_of(tag: ResourceTag, value: &Value) -> Vec<(ResourceTag, Hash)> {
    let mut deps = Vec::new();
    let push_opt = |deps: &mut Vec<(ResourceTag, Hash)>, dep_tag: ResourceTag, field: &str| {
        if let Some(hash) = value.get(field).and_then(hex_str) {
            deps.push((dep_tag, hash));
        }
    };
    let push_array = |deps: &mut Vec<(ResourceTag, Hash)>, dep_tag: ResourceTag, field: &str| {
        if let Some(array) = value.get(field).and_then(Value::as_array) {
            deps.extend(array.iter().filter_map(hex_str).map(|h| (dep_tag, h)));
        }
    };
    let push_stage_modules = |deps: &mut Vec<(ResourceTag, Hash)>, stages_field: &str| {
        if let Some(stages) = value.get(stages_field).and_then(Value::as_array) {
            for stage in stages {
                if let Some(hash) = stage.get("module").and_then(|m| m.get("hash")).and_then(hex_str) {
                    deps.push((ResourceTag::ShaderModule, hash));
                }
            }
        }
    };

    match tag {
        ResourceTag::DescriptorSetLayout => {
            if let Some(bindings) = value.get("bindings").and_then(Value::as_array) {
                for binding in bindings {
                    if let Some(samplers) = binding.get("immutableSamplers").and_then(Value::as_array) {
                        deps.extend(samplers.iter().filter_map(hex_str).map(|h| (ResourceTag::Sampler, h)));
                    }
                }
            }
        }
        ResourceTag::PipelineLayout => push_array(&mut deps, ResourceTag::DescriptorSetLayout, "setLayouts"),
        ResourceTag::ComputePipeline => {
            push_opt(&mut deps, ResourceTag::PipelineLayout, "layout");
            push_opt(&mut deps, ResourceTag::ComputePipeline, "basePipeline");
            if let Some(hash) = value.get("stage").and_then(|s| s.get("module")).and_then(|m| m.get("hash")).and_then(hex_str) {
                deps.push((ResourceTag::ShaderModule, hash));
            }
        }
        ResourceTag::GraphicsPipeline => {
            push_opt(&mut deps, ResourceTag::PipelineLayout, "layout");
            push_opt(&mut deps, ResourceTag::RenderPass, "renderPass");
            push_opt(&mut deps, ResourceTag::GraphicsPipeline, "basePipeline");
            push_array(&mut deps, ResourceTag::GraphicsPipeline, "libraries");
            push_stage_modules(&mut deps, "stages");
        }
        ResourceTag::RaytracingPipeline => {
            push_opt(&mut deps, ResourceTag::PipelineLayout, "layout");
            push_opt(&mut deps, ResourceTag::RaytracingPipeline, "basePipeline");
            push_array(&mut deps, ResourceTag::RaytracingPipeline, "libraries");
            push_stage_modules(&mut deps, "stages");
        }
        ResourceTag::ApplicationBlobLink => push_opt(&mut deps, ResourceTag::ApplicationInfo, "applicationInfoHash"),
        ResourceTag::ApplicationInfo | ResourceTag::Sampler | ResourceTag::ShaderModule | ResourceTag::RenderPass => {}
    }
    deps
}

/// Feeds a fully-assembled [`build_document`] result through a fresh,
/// synchronized [`Recorder`], using the stored hash of each entity as its
/// replay handle — the same trick `original_source/cli/fossilize_rehash.cpp`
/// uses (`fake_handle<T>(hash)`), which works here because a hash a sibling
/// entity already references (e.g. a pipeline layout's `setLayouts` entry)
/// was resolved by [`Parser`] from that same stored hash, so using it again
/// as the handle keeps every cross-reference consistent without the two
/// passes the original's live-handle allocator would otherwise need.
struct RehashCreator<'a> {
    recorder: &'a Recorder,
    application_hash_filter: Option<Hash>,
    seen_application_info: bool,
}

impl<'a> StateCreator for RehashCreator<'a> {
    fn enqueue_create_application_info(&mut self, hash: Hash, info: ApplicationInfo) -> Result<()> {
        if let Some(filter) = self.application_hash_filter {
            if filter != hash {
                return Ok(());
            }
        }
        if self.seen_application_info {
            log::warn!("multiple application infos in input; keeping the first");
            return Ok(());
        }
        self.seen_application_info = true;
        self.recorder.record_application_info(info, ApplicationFeatureInfo { links: Vec::new() });
        Ok(())
    }

    fn enqueue_create_application_blob_link(&mut self, _hash: Hash, link: ApplicationBlobLink) -> Result<()> {
        self.recorder.record_application_blob_link(link);
        Ok(())
    }

    fn enqueue_create_shader_module(&mut self, hash: Hash, info: ShaderModuleCreateInfo) -> Result<Handle> {
        self.recorder.record_shader_module(hash, &info, None)?;
        Ok(hash)
    }

    fn enqueue_create_sampler(&mut self, hash: Hash, info: SamplerCreateInfo) -> Result<Handle> {
        self.recorder.record_sampler(hash, &info)?;
        Ok(hash)
    }

    fn enqueue_create_descriptor_set_layout(&mut self, hash: Hash, info: DescriptorSetLayoutCreateInfo) -> Result<Handle> {
        self.recorder.record_descriptor_set_layout(hash, &info)?;
        Ok(hash)
    }

    fn enqueue_create_pipeline_layout(&mut self, hash: Hash, info: PipelineLayoutCreateInfo) -> Result<Handle> {
        self.recorder.record_pipeline_layout(hash, &info)?;
        Ok(hash)
    }

    fn enqueue_create_render_pass(&mut self, hash: Hash, info: RenderPassCreateInfo) -> Result<Handle> {
        self.recorder.record_render_pass(hash, &info)?;
        Ok(hash)
    }

    fn enqueue_create_render_pass2(&mut self, hash: Hash, info: RenderPassCreateInfo2) -> Result<Handle> {
        self.recorder.record_render_pass2(hash, &info)?;
        Ok(hash)
    }

    fn enqueue_create_compute_pipeline(&mut self, hash: Hash, info: ComputePipelineCreateInfo) -> Result<Handle> {
        self.recorder.record_compute_pipeline(hash, &info, &[])?;
        Ok(hash)
    }

    fn enqueue_create_graphics_pipeline(&mut self, hash: Hash, info: GraphicsPipelineCreateInfo) -> Result<Handle> {
        self.recorder.record_graphics_pipeline(hash, &info, &[])?;
        Ok(hash)
    }

    fn enqueue_create_raytracing_pipeline(&mut self, hash: Hash, info: RaytracingPipelineCreateInfo) -> Result<Handle> {
        self.recorder.record_raytracing_pipeline(hash, &info, &[])?;
        Ok(hash)
    }

    fn notify_replayed_resources_for_type(&mut self, _tag: ResourceTag) -> Result<()> {
        self.recorder.pump_synchronized_recording()
    }
}

/// Re-serializes every entity in `input` through a fresh `Recorder` so every
/// hash is recomputed under the current canonical hashing rules and
/// `FORMAT_VERSION` (spec §6 `rehash`). `application_hash_filter`, when set,
/// keeps only the blobs belonging to that one application (matching
/// `fossilize-rehash --application`).
pub fn rehash_database(
    input: &mut dyn Database,
    output: Box<dyn Database>,
    application_hash_filter: Option<Hash>,
) -> Result<()> {
    let document = build_document(input)?;
    let recorder = Recorder::init_recording_synchronized(
        output,
        ApplicationFilter::permissive(),
        None,
        None,
        fossilize_db::PayloadWriteFlags::COMPUTE_CHECKSUM | fossilize_db::PayloadWriteFlags::COMPRESS,
    );
    let mut creator = RehashCreator {
        recorder: &recorder,
        application_hash_filter,
        seen_application_info: false,
    };
    let mut parser = Parser::new();
    parser.parse_document(&document, None, &mut creator)?;
    recorder.pump_synchronized_recording()?;
    Ok(())
}

/// Walks `doc` (as [`build_document`] assembles it) outward from `roots`
/// over the edges [`dependencies_of`] exposes, returning every `(tag,
/// hash)` pair reachable from them — the closure `prune` keeps (spec §6
/// `prune`: "copy only reachable entities after filters").
///
/// A root with no matching entry in `doc` (e.g. a `--filter-graphics` hash
/// that isn't actually present) is silently dropped rather than treated as
/// an error, matching `convert-db`/`merge-db`'s tolerance of missing
/// entries elsewhere in this module.
pub fn reachable_closure(doc: &Value, roots: impl IntoIterator<Item = (ResourceTag, Hash)>) -> FxHashSet<(ResourceTag, Hash)> {
    let mut seen = FxHashSet::default();
    let mut stack: Vec<(ResourceTag, Hash)> = roots.into_iter().collect();
    while let Some((tag, hash)) = stack.pop() {
        if !seen.insert((tag, hash)) {
            continue;
        }
        let Some(value) = doc.get(tag.json_key()).and_then(|section| section.get(format!("{:016x}", hash))) else {
            continue;
        };
        for dep in dependencies_of(tag, value) {
            if !seen.contains(&dep) {
                stack.push(dep);
            }
        }
    }
    seen
}

/// A generic value used by `prune --filter-timestamp`: entries whose
/// on-use record is older than `now - max_age_seconds` (or altogether
/// absent from the on-use database) are dropped.
pub fn is_stale(last_use: Option<u64>, now: u64, max_age_seconds: u64) -> bool {
    match last_use {
        Some(ts) => ts + max_age_seconds < now,
        None => true,
    }
}

/// Parses a `0x`-prefixed or bare hex hash from a CLI argument.
pub fn parse_hash_arg(s: &str) -> std::result::Result<Hash, String> {
    let s = s.trim_start_matches("0x");
    u64::from_str_radix(s, 16).map_err(|e| format!("invalid hash {:?}: {}", s, e))
}

pub fn exit_on_error<T>(result: Result<T>) -> T {
    match result {
        Ok(v) => v,
        Err(FossilizeError::Io(e)) => {
            log::error!("{}", e);
            std::process::exit(1);
        }
        Err(e) => {
            log::error!("{}", e);
            std::process::exit(1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fossilize_db::{open as open_db, DatabaseMode};
    use fossilize_recorder::filter::ApplicationFilter;
    use fossilize_types::common::*;
    use ordered_float::NotNan;
    use tempfile::tempdir;

    fn sampler() -> SamplerCreateInfo {
        SamplerCreateInfo {
            flags: SamplerCreateFlags::empty(),
            mag_filter: Filter(0),
            min_filter: Filter(0),
            mipmap_mode: SamplerMipmapMode(0),
            address_mode_u: SamplerAddressMode(0),
            address_mode_v: SamplerAddressMode(0),
            address_mode_w: SamplerAddressMode(0),
            mip_lod_bias: NotNan::new(0.0).unwrap(),
            anisotropy_enable: false,
            max_anisotropy: NotNan::new(1.0).unwrap(),
            compare_enable: false,
            compare_op: CompareOp::Never,
            min_lod: NotNan::new(0.0).unwrap(),
            max_lod: NotNan::new(0.0).unwrap(),
            border_color: BorderColor(0),
            unnormalized_coordinates: false,
            pnext: vec![],
        }
    }

    #[test]
    fn copy_all_entries_unions_sources() {
        let dir = tempdir().unwrap();
        let mut src = open_db(&dir.path().join("src.foz"), DatabaseMode::OverWrite).unwrap();
        src.write_entry(ResourceTag::Sampler, 1, b"one", fossilize_db::PayloadWriteFlags::empty()).unwrap();
        let mut dst = open_db(&dir.path().join("dst.foz"), DatabaseMode::OverWrite).unwrap();
        let copied = copy_all_entries(src.as_mut(), dst.as_mut(), fossilize_db::PayloadWriteFlags::empty()).unwrap();
        assert_eq!(copied, 1);
        assert!(dst.has_entry(ResourceTag::Sampler, 1));
    }

    #[test]
    fn build_document_round_trips_a_sampler() {
        let dir = tempdir().unwrap();
        let mut db = open_db(&dir.path().join("db.foz"), DatabaseMode::OverWrite).unwrap();
        let recorder = Recorder::init_recording_synchronized(
            db,
            ApplicationFilter::permissive(),
            None,
            None,
            fossilize_db::PayloadWriteFlags::empty(),
        );
        recorder.record_sampler(1, &sampler()).unwrap();
        recorder.pump_synchronized_recording().unwrap();
        drop(recorder);

        let mut db = open_db(&dir.path().join("db.foz"), DatabaseMode::ReadOnly).unwrap();
        let doc = build_document(db.as_mut()).unwrap();
        assert!(doc.get("samplers").unwrap().as_object().unwrap().len() == 1);
    }

    #[test]
    fn reachable_closure_follows_pipeline_layout_edge() {
        let doc: Value = serde_json::from_str(
            r#"{
                "setLayouts": { "0000000000000001": {} },
                "pipelineLayouts": { "0000000000000002": { "setLayouts": ["0000000000000001"] } },
                "graphicsPipelines": { "0000000000000003": { "layout": "0000000000000002" } }
            }"#,
        )
        .unwrap();
        let closure = reachable_closure(&doc, [(ResourceTag::GraphicsPipeline, 3)]);
        assert_eq!(
            closure,
            [
                (ResourceTag::GraphicsPipeline, 3),
                (ResourceTag::PipelineLayout, 2),
                (ResourceTag::DescriptorSetLayout, 1),
            ]
            .into_iter()
            .collect()
        );
    }

    #[test]
    fn reachable_closure_drops_missing_root() {
        let doc = Value::Object(Map::new());
        assert!(reachable_closure(&doc, [(ResourceTag::Sampler, 0xdead)]).is_empty());
    }

    #[test]
    fn is_stale_treats_missing_as_stale() {
        assert!(is_stale(None, 1000, 10));
        assert!(!is_stale(Some(995), 1000, 10));
        assert!(is_stale(Some(900), 1000, 10));
    }
}
