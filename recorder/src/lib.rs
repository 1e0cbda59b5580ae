//! Recorder runtime (spec §4.7): the background worker thread (or inline
//! "synchronized" drain), the handle -> hash maps, subpass-meta storage,
//! and the two write-only side databases.
//!
//! A `record_X` call (spec §4.7):
//!
//! 1. Takes the recorder mutex.
//! 2. Deep-copies the descriptor (§4.4) into a *temporary* arena.
//! 3. Pushes a [`WorkItem`] onto the queue and signals the worker.
//!
//! The worker pops items, hashes them (§4.3), remaps embedded handles to
//! content hashes via [`RecorderHandles`] (which implements
//! [`fossilize_canonical::HandleResolver`]), serializes them (§4.5), and
//! writes them to the configured [`fossilize_db::Database`] backend with
//! the at-most-once semantics that backend already provides.

pub mod filter;
pub mod identifier_db;
pub mod on_use;
pub mod work_item;

use filter::ApplicationFilter;
use fossilize_arena::ScratchAllocator;
use fossilize_canonical::copy::{self, ModuleIdentifierSource, NoModuleIdentifiers};
use fossilize_canonical::hash;
use fossilize_canonical::HandleResolver;
use fossilize_db::{Database, PayloadWriteFlags};
use fossilize_format::{entities, pipeline as fmt_pipeline, shader};
use fossilize_hash::FxHashMap;
use fossilize_types::application::{ApplicationBlobLink, ApplicationFeatureInfo, ApplicationInfo};
use fossilize_types::descriptor_set_layout::DescriptorSetLayoutCreateInfo;
use fossilize_types::pipeline::compute::ComputePipelineCreateInfo;
use fossilize_types::pipeline::graphics::GraphicsPipelineCreateInfo;
use fossilize_types::pipeline::raytracing::RaytracingPipelineCreateInfo;
use fossilize_types::pipeline_layout::PipelineLayoutCreateInfo;
use fossilize_types::render_pass::{
    subpass_meta, subpass_meta2, RenderPassCreateInfo, RenderPassCreateInfo2, SubpassMeta, SubpassMetaStorage,
};
use fossilize_types::sampler::SamplerCreateInfo;
use fossilize_types::shader_module::ShaderModuleCreateInfo;
use fossilize_types::{FossilizeError, Handle, Hash, ResourceTag, Result, RESOURCE_TAG_COUNT};
use std::sync::{Arc, Condvar, Mutex};
use std::thread::JoinHandle;
use std::time::Duration;
use work_item::{EntityPayload, WorkItem};

/// The handle -> hash maps and subpass-meta storage the Recorder owns
/// (spec §4.7 "The Recorder owns"). Also the [`HandleResolver`] the
/// canonical hasher/serializer consult to turn live handles into content
/// hashes.
#[derive(Default)]
pub struct RecorderHandles {
    handle_to_hash: [FxHashMap<Handle, Hash>; RESOURCE_TAG_COUNT],
    subpass_meta: FxHashMap<Handle, SubpassMetaStorage>,
    identifier_to_hash: FxHashMap<Vec<u8>, Hash>,
}

impl RecorderHandles {
    fn register(&mut self, tag: ResourceTag, handle: Handle, hash: Hash) {
        self.handle_to_hash[tag.to_raw() as usize].insert(handle, hash);
    }

    /// Evicts `handle` from every map, so the slot may be reused (spec §3
    /// "Lifecycle": "a handle may be *unregistered*").
    fn unregister(&mut self, handle: Handle) {
        for map in &mut self.handle_to_hash {
            map.remove(&handle);
        }
        self.subpass_meta.remove(&handle);
    }

    fn set_subpass_meta(&mut self, handle: Handle, metas: &[SubpassMeta]) {
        self.subpass_meta.insert(handle, SubpassMetaStorage::from_metas(metas));
    }

    fn subpass_meta_for(&self, render_pass: Option<Handle>, subpass: u32) -> Option<SubpassMeta> {
        let handle = render_pass?;
        self.subpass_meta.get(&handle).map(|storage| storage.get(subpass as usize))
    }
}

impl HandleResolver for RecorderHandles {
    fn resolve(&self, tag: ResourceTag, handle: Handle) -> Result<u64> {
        self.handle_to_hash[tag.to_raw() as usize]
            .get(&handle)
            .copied()
            .ok_or(FossilizeError::HandleNotRegistered(handle))
    }

    fn resolve_identifier(&self, identifier: &[u8]) -> Result<u64> {
        self.identifier_to_hash.get(identifier).copied().ok_or(FossilizeError::IdentifierNotRegistered)
    }
}

/// Flush coalescing timeout (spec §4.7, §5: "Flush timeout is fixed at one
/// second").
const FLUSH_TIMEOUT: Duration = Duration::from_secs(1);

struct Queue {
    items: std::collections::VecDeque<WorkItem>,
    flush_pending: bool,
}

/// Shared state guarded by the one mutex spec §5 describes: "The Recorder
/// mutex guards all maps and the work queue."
struct Shared {
    handles: Mutex<RecorderHandles>,
    queue: Mutex<Queue>,
    cv: Condvar,
    db: Mutex<Box<dyn Database>>,
    write_flags: PayloadWriteFlags,
    filter: Arc<ApplicationFilter>,
    identifiers: Box<dyn ModuleIdentifierSource + Send + Sync>,
    identifier_db: Option<Mutex<identifier_db::IdentifierDatabase>>,
    on_use_db: Option<Mutex<on_use::OnUseDatabase>>,
    enabled: std::sync::atomic::AtomicBool,
    prepared: std::sync::atomic::AtomicBool,
    /// App-feature hash from the most recently processed
    /// `WorkItem::ApplicationInfo`, threaded into subsequent
    /// `APPLICATION_BLOB_LINK` keys (spec §4.3).
    app_feature_hash: Mutex<Option<Hash>>,
}

/// The Recorder: spawns (or drains, in synchronized mode) one worker that
/// turns queued descriptors into durable archive entries.
pub struct Recorder {
    shared: Arc<Shared>,
    worker: Mutex<Option<JoinHandle<()>>>,
    synchronized: bool,
}

fn env_lookup(name: &str) -> Option<String> {
    std::env::var(name).ok()
}

impl Recorder {
    fn new_shared(
        db: Box<dyn Database>,
        filter: Arc<ApplicationFilter>,
        identifiers: Box<dyn ModuleIdentifierSource + Send + Sync>,
        identifier_db: Option<identifier_db::IdentifierDatabase>,
        on_use_db: Option<on_use::OnUseDatabase>,
        write_flags: PayloadWriteFlags,
    ) -> Arc<Shared> {
        let mut handles = RecorderHandles::default();
        if let Some(idb) = &identifier_db {
            handles.identifier_to_hash = idb.invert();
        }
        Arc::new(Shared {
            handles: Mutex::new(handles),
            queue: Mutex::new(Queue {
                items: std::collections::VecDeque::new(),
                flush_pending: false,
            }),
            cv: Condvar::new(),
            db: Mutex::new(db),
            write_flags,
            filter,
            identifiers,
            identifier_db: identifier_db.map(Mutex::new),
            on_use_db: on_use_db.map(Mutex::new),
            enabled: std::sync::atomic::AtomicBool::new(true),
            prepared: std::sync::atomic::AtomicBool::new(false),
            app_feature_hash: Mutex::new(None),
        })
    }

    /// Spawns the background worker thread (spec §4.7 "Recording thread").
    pub fn init_recording_thread(
        db: Box<dyn Database>,
        filter: Arc<ApplicationFilter>,
        identifier_db: Option<identifier_db::IdentifierDatabase>,
        on_use_db: Option<on_use::OnUseDatabase>,
        write_flags: PayloadWriteFlags,
    ) -> Recorder {
        let shared = Self::new_shared(db, filter, Box::new(NoModuleIdentifiers), identifier_db, on_use_db, write_flags);
        let worker_shared = Arc::clone(&shared);
        let handle = std::thread::spawn(move || worker_loop(worker_shared));
        Recorder {
            shared,
            worker: Mutex::new(Some(handle)),
            synchronized: false,
        }
    }

    /// Omits the background thread; the caller must periodically invoke
    /// [`Recorder::pump_synchronized_recording`] to drain the queue inline
    /// (spec §4.7 "Synchronized mode").
    pub fn init_recording_synchronized(
        db: Box<dyn Database>,
        filter: Arc<ApplicationFilter>,
        identifier_db: Option<identifier_db::IdentifierDatabase>,
        on_use_db: Option<on_use::OnUseDatabase>,
        write_flags: PayloadWriteFlags,
    ) -> Recorder {
        let shared = Self::new_shared(db, filter, Box::new(NoModuleIdentifiers), identifier_db, on_use_db, write_flags);
        Recorder {
            shared,
            worker: Mutex::new(None),
            synchronized: true,
        }
    }

    /// Drains the queue inline, sharing the exact same processing function
    /// the background worker uses (spec §9: "one code path, two
    /// schedulers").
    pub fn pump_synchronized_recording(&self) -> Result<()> {
        debug_assert!(self.synchronized, "pump_synchronized_recording on a threaded recorder");
        loop {
            let item = {
                let mut queue = self.shared.queue.lock().expect("queue mutex poisoned");
                queue.items.pop_front()
            };
            match item {
                Some(WorkItem::Terminate) | None => return Ok(()),
                Some(item) => process_item(&self.shared, item)?,
            }
        }
    }

    fn enqueue(&self, item: WorkItem) {
        let mut queue = self.shared.queue.lock().expect("queue mutex poisoned");
        queue.items.push_back(item);
        queue.flush_pending = true;
        self.shared.cv.notify_all();
    }

    fn is_enabled(&self, info: &ApplicationInfo) -> bool {
        self.shared.filter.test_application_info(info, &env_lookup)
    }

    /// Whether the filter decided (via `record_application_info`) that
    /// this session should persist data at all (spec §4.7).
    fn enabled(&self) -> bool {
        self.shared.enabled.load(std::sync::atomic::Ordering::SeqCst)
    }

    /// Records `VkApplicationInfo` plus the whitelisted feature chain.
    /// Also decides, via the application filter, whether the rest of this
    /// session should actually persist data (spec §4.7: "emits the
    /// `APPLICATION_INFO` blob, optionally tests the application-info
    /// filter ... to decide whether to actually write data").
    pub fn record_application_info(&self, info: ApplicationInfo, features: ApplicationFeatureInfo) {
        let enabled = self.is_enabled(&info);
        self.shared.enabled.store(enabled, std::sync::atomic::Ordering::SeqCst);
        if !enabled {
            return;
        }
        self.enqueue(WorkItem::ApplicationInfo { info, features });
    }

    pub fn record_immutable_samplers_enabled(&self, info: &ApplicationInfo) -> bool {
        self.shared.filter.record_immutable_samplers(info)
    }

    /// Ties an arbitrary caller blob to the application-feature context
    /// active for this session (spec §3 tag 8).
    pub fn record_application_blob_link(&self, link: ApplicationBlobLink) {
        if !self.shared.enabled.load(std::sync::atomic::Ordering::SeqCst) {
            return;
        }
        self.enqueue(WorkItem::ApplicationBlobLink { link });
    }

    pub fn record_sampler(&self, handle: Handle, info: &SamplerCreateInfo) -> Result<()> {
        if !self.enabled() {
            return Ok(());
        }
        let mut arena = ScratchAllocator::new();
        let copied = copy::copy_sampler(&mut arena, info)?.clone();
        self.enqueue(WorkItem::Create {
            handle,
            payload: EntityPayload::Sampler(copied),
            custom_hash: None,
        });
        Ok(())
    }

    pub fn record_descriptor_set_layout(&self, handle: Handle, info: &DescriptorSetLayoutCreateInfo) -> Result<()> {
        if !self.enabled() {
            return Ok(());
        }
        let mut arena = ScratchAllocator::new();
        let copied = copy::copy_descriptor_set_layout(&mut arena, info)?.clone();
        self.enqueue(WorkItem::Create {
            handle,
            payload: EntityPayload::DescriptorSetLayout(copied),
            custom_hash: None,
        });
        Ok(())
    }

    pub fn record_pipeline_layout(&self, handle: Handle, info: &PipelineLayoutCreateInfo) -> Result<()> {
        if !self.enabled() {
            return Ok(());
        }
        let mut arena = ScratchAllocator::new();
        let copied = copy::copy_pipeline_layout(&mut arena, info)?.clone();
        self.enqueue(WorkItem::Create {
            handle,
            payload: EntityPayload::PipelineLayout(copied),
            custom_hash: None,
        });
        Ok(())
    }

    /// `identifier`, when supplied, is the driver-stable module identifier
    /// captured alongside the binary (spec §4.7 "Module identifier
    /// database").
    pub fn record_shader_module(&self, handle: Handle, info: &ShaderModuleCreateInfo, identifier: Option<Vec<u8>>) -> Result<()> {
        if !self.enabled() {
            return Ok(());
        }
        let mut arena = ScratchAllocator::new();
        let copied = copy::copy_shader_module(&mut arena, info).clone();
        self.enqueue(WorkItem::Create {
            handle,
            payload: EntityPayload::ShaderModule(copied, identifier),
            custom_hash: None,
        });
        Ok(())
    }

    pub fn record_render_pass(&self, handle: Handle, info: &RenderPassCreateInfo) -> Result<()> {
        if !self.enabled() {
            return Ok(());
        }
        let metas: Vec<SubpassMeta> = info.subpasses.iter().map(subpass_meta).collect();
        self.shared.handles.lock().expect("handles mutex poisoned").set_subpass_meta(handle, &metas);
        let mut arena = ScratchAllocator::new();
        let copied = copy::copy_render_pass(&mut arena, info)?.clone();
        self.enqueue(WorkItem::Create {
            handle,
            payload: EntityPayload::RenderPass(copied),
            custom_hash: None,
        });
        Ok(())
    }

    pub fn record_render_pass2(&self, handle: Handle, info: &RenderPassCreateInfo2) -> Result<()> {
        if !self.enabled() {
            return Ok(());
        }
        let metas: Vec<SubpassMeta> = info.subpasses.iter().map(subpass_meta2).collect();
        self.shared.handles.lock().expect("handles mutex poisoned").set_subpass_meta(handle, &metas);
        let mut arena = ScratchAllocator::new();
        let copied = copy::copy_render_pass2(&mut arena, info)?.clone();
        self.enqueue(WorkItem::Create {
            handle,
            payload: EntityPayload::RenderPass2(copied),
            custom_hash: None,
        });
        Ok(())
    }

    pub fn record_compute_pipeline(&self, handle: Handle, info: &ComputePipelineCreateInfo, batch: &[Handle]) -> Result<()> {
        if !self.enabled() {
            return Ok(());
        }
        let mut arena = ScratchAllocator::new();
        let copied = copy::copy_compute_pipeline(&mut arena, info, self.shared.identifiers.as_ref(), batch)?.clone();
        self.enqueue(WorkItem::Create {
            handle,
            payload: EntityPayload::ComputePipeline(copied),
            custom_hash: None,
        });
        Ok(())
    }

    /// Looks up the (already-computed) subpass meta for `info.render_pass`
    /// synchronously, on the calling thread, before deep-copying and
    /// queueing — spec §4.7: "already resolved synchronously in
    /// `record_graphics_pipeline`".
    pub fn record_graphics_pipeline(&self, handle: Handle, info: &GraphicsPipelineCreateInfo, batch: &[Handle]) -> Result<()> {
        if !self.enabled() {
            return Ok(());
        }
        let subpass_meta = self
            .shared
            .handles
            .lock()
            .expect("handles mutex poisoned")
            .subpass_meta_for(info.render_pass, info.subpass);
        let mut arena = ScratchAllocator::new();
        let copied =
            copy::copy_graphics_pipeline(&mut arena, info, self.shared.identifiers.as_ref(), subpass_meta, batch)?.clone();
        self.enqueue(WorkItem::Create {
            handle,
            payload: EntityPayload::GraphicsPipeline(Box::new(copied), subpass_meta),
            custom_hash: None,
        });
        Ok(())
    }

    pub fn record_raytracing_pipeline(&self, handle: Handle, info: &RaytracingPipelineCreateInfo, batch: &[Handle]) -> Result<()> {
        if !self.enabled() {
            return Ok(());
        }
        let mut arena = ScratchAllocator::new();
        let copied = copy::copy_raytracing_pipeline(&mut arena, info, self.shared.identifiers.as_ref(), batch)?.clone();
        self.enqueue(WorkItem::Create {
            handle,
            payload: EntityPayload::RaytracingPipeline(Box::new(copied)),
            custom_hash: None,
        });
        Ok(())
    }

    /// Evicts `handle`: creation failed, or the live object was destroyed
    /// (spec §3 "Lifecycle").
    pub fn unregister(&self, handle: Handle) {
        self.enqueue(WorkItem::Unregister { handle });
    }

    /// Posts the terminator sentinel and joins the worker thread (spec §5
    /// "Cancellation & timeouts": "The worker stops only on an explicit
    /// `sync_thread()`/`tear_down_recording_thread()` call").
    pub fn tear_down_recording_thread(&self) {
        self.enqueue(WorkItem::Terminate);
        if let Some(handle) = self.worker.lock().expect("worker mutex poisoned").take() {
            let _ = handle.join();
        }
    }

    /// Blocks until every item currently queued has been processed,
    /// without terminating the worker. Used by tests and by callers that
    /// need a synchronization barrier without tearing the thread down.
    pub fn sync_thread(&self) {
        if self.synchronized {
            let _ = self.pump_synchronized_recording();
            return;
        }
        // A sentinel handle no live API ever produces; once the worker has
        // popped and processed it, everything queued before this call has
        // also been processed (the queue is strict FIFO).
        self.enqueue(WorkItem::Unregister { handle: u64::MAX });
        let mut queue = self.shared.queue.lock().expect("queue mutex poisoned");
        while !queue.items.is_empty() {
            queue = self.shared.cv.wait_timeout(queue, Duration::from_millis(10)).expect("queue mutex poisoned").0;
        }
    }
}

impl Drop for Recorder {
    fn drop(&mut self) {
        if !self.synchronized {
            self.tear_down_recording_thread();
        }
    }
}

fn build_payload(
    handles: &RecorderHandles,
    tag: ResourceTag,
    payload: &EntityPayload,
) -> Result<(Hash, Vec<u8>, Option<Vec<u8>>)> {
    Ok(match payload {
        EntityPayload::Sampler(info) => {
            let hash = hash::hash_sampler(info)?;
            (hash, serde_json::to_vec(&entities::sampler_to_value(info)?)?, None)
        }
        EntityPayload::DescriptorSetLayout(info) => {
            let hash = hash::hash_descriptor_set_layout(info, handles)?;
            (hash, serde_json::to_vec(&entities::descriptor_set_layout_to_value(info, handles)?)?, None)
        }
        EntityPayload::PipelineLayout(info) => {
            let hash = hash::hash_pipeline_layout(info, handles)?;
            (hash, serde_json::to_vec(&entities::pipeline_layout_to_value(info, handles)?)?, None)
        }
        EntityPayload::ShaderModule(info, identifier) => {
            let hash = hash::hash_shader_module(info);
            (hash, shader::encode_shader_module_blob(info), identifier.clone())
        }
        EntityPayload::RenderPass(info) => {
            let hash = hash::hash_render_pass(info)?;
            (hash, serde_json::to_vec(&entities::render_pass_to_value(info)?)?, None)
        }
        EntityPayload::RenderPass2(info) => {
            let hash = hash::hash_render_pass2(info)?;
            (hash, serde_json::to_vec(&entities::render_pass2_to_value(info)?)?, None)
        }
        EntityPayload::ComputePipeline(info) => {
            let hash = hash::hash_compute_pipeline(info, handles)?;
            (hash, serde_json::to_vec(&fmt_pipeline::compute_pipeline_to_value(info, handles)?)?, None)
        }
        EntityPayload::GraphicsPipeline(info, subpass_meta) => {
            let hash = hash::hash_graphics_pipeline(info, handles, *subpass_meta)?;
            (hash, serde_json::to_vec(&fmt_pipeline::graphics_pipeline_to_value(info, handles)?)?, None)
        }
        EntityPayload::RaytracingPipeline(info) => {
            let hash = hash::hash_raytracing_pipeline(info, handles)?;
            (hash, serde_json::to_vec(&fmt_pipeline::raytracing_pipeline_to_value(info, handles)?)?, None)
        }
    })
}

fn entity_tag(payload: &EntityPayload) -> ResourceTag {
    match payload {
        EntityPayload::Sampler(_) => ResourceTag::Sampler,
        EntityPayload::DescriptorSetLayout(_) => ResourceTag::DescriptorSetLayout,
        EntityPayload::PipelineLayout(_) => ResourceTag::PipelineLayout,
        EntityPayload::ShaderModule(..) => ResourceTag::ShaderModule,
        EntityPayload::RenderPass(_) => ResourceTag::RenderPass,
        EntityPayload::RenderPass2(_) => ResourceTag::RenderPass,
        EntityPayload::ComputePipeline(_) => ResourceTag::ComputePipeline,
        EntityPayload::GraphicsPipeline(..) => ResourceTag::GraphicsPipeline,
        EntityPayload::RaytracingPipeline(_) => ResourceTag::RaytracingPipeline,
    }
}

/// Processes exactly one non-terminal [`WorkItem`]: hashes it (or honors a
/// `custom_hash`), remaps handles to hashes, serializes, and writes it to
/// the database. Shared verbatim between the threaded worker loop and
/// [`Recorder::pump_synchronized_recording`] (spec §9: "one code path, two
/// schedulers").
fn process_item(shared: &Shared, item: WorkItem) -> Result<()> {
    match item {
        WorkItem::Terminate => Ok(()),
        WorkItem::Unregister { handle } => {
            shared.handles.lock().expect("handles mutex poisoned").unregister(handle);
            Ok(())
        }
        WorkItem::ApplicationInfo { info, features } => {
            let app_hash = hash::hash_application_info(&info);
            let feature_hash = hash::hash_feature_info(&features);
            let combined = hash::hash_application_feature(app_hash, feature_hash);
            *shared.app_feature_hash.lock().expect("app feature hash mutex poisoned") = Some(combined);
            let value = entities::application_info_to_value(&info);
            let mut db = shared.db.lock().expect("db mutex poisoned");
            write_if_new(&mut db, shared.write_flags, ResourceTag::ApplicationInfo, app_hash, &serde_json::to_vec(&value)?)
        }
        WorkItem::ApplicationBlobLink { link } => {
            let app_feature_hash = shared
                .app_feature_hash
                .lock()
                .expect("app feature hash mutex poisoned")
                .unwrap_or(link.application_info_hash);
            let hash = hash::hash_application_blob_link(app_feature_hash, ResourceTag::ApplicationBlobLink, fossilize_hash::hash_bytes(&link.blob));
            let value = entities::application_blob_link_to_value(&link);
            let mut db = shared.db.lock().expect("db mutex poisoned");
            write_if_new(&mut db, shared.write_flags, ResourceTag::ApplicationBlobLink, hash, &serde_json::to_vec(&value)?)
        }
        WorkItem::Create { handle, payload, custom_hash } => {
            let tag = entity_tag(&payload);
            let (computed_hash, json_bytes, identifier) = {
                let handles = shared.handles.lock().expect("handles mutex poisoned");
                match build_payload(&handles, tag, &payload) {
                    Ok(v) => v,
                    Err(FossilizeError::HandleNotRegistered(h)) => {
                        log::warn!("dropping {:?}: handle {:#x} was never registered", tag, h);
                        return Ok(());
                    }
                    Err(FossilizeError::UnknownPNext { entity, stype }) => {
                        log::error!("dropping {}: unknown pNext sType {:#x}", entity, stype);
                        return Ok(());
                    }
                    Err(e) => return Err(e),
                }
            };
            let hash = custom_hash.unwrap_or(computed_hash);
            shared.handles.lock().expect("handles mutex poisoned").register(tag, handle, hash);

            if let (Some(identifier), Some(idb)) = (&identifier, &shared.identifier_db) {
                let mut idb = idb.lock().expect("identifier db mutex poisoned");
                idb.record(hash, identifier);
                shared.handles.lock().expect("handles mutex poisoned").identifier_to_hash.insert(identifier.clone(), hash);
            }
            if let Some(on_use) = &shared.on_use_db {
                on_use.lock().expect("on-use db mutex poisoned").record(hash, on_use::now());
            }

            let mut db = shared.db.lock().expect("db mutex poisoned");
            let result = write_if_new(&mut db, shared.write_flags, tag, hash, &json_bytes);
            if let Err(e) = &result {
                log::error!("failed to write {:?}/{:016x}: {}", tag, hash, e);
                return Ok(());
            }
            result
        }
    }
}

fn write_if_new(db: &mut Box<dyn Database>, flags: PayloadWriteFlags, tag: ResourceTag, hash: Hash, payload: &[u8]) -> Result<()> {
    if db.has_entry(tag, hash) {
        return Ok(());
    }
    db.write_entry(tag, hash, payload, flags)
}

/// The background worker loop (spec §4.7 "Recording thread"):
///
/// 1. Waits on the queue; after `FLUSH_TIMEOUT` with a pending flush and an
///    empty queue, nothing further to flush is needed for this simplified
///    backend set (writes are immediately durable), so the timeout here
///    only exists to periodically clear `flush_pending` and go back to an
///    indefinite wait, matching the coalescing shape spec §4.7 describes.
/// 2. Pops and [`process_item`]s entries until the terminator sentinel.
fn worker_loop(shared: Arc<Shared>) {
    if !shared.prepared.swap(true, std::sync::atomic::Ordering::SeqCst) {
        if let Err(e) = shared.db.lock().expect("db mutex poisoned").prepare() {
            log::error!("failed to prepare database: {}", e);
        }
    }
    loop {
        let item = {
            let mut queue = shared.queue.lock().expect("queue mutex poisoned");
            loop {
                if let Some(item) = queue.items.pop_front() {
                    break item;
                }
                if queue.flush_pending {
                    let (guard, timeout) = shared.cv.wait_timeout(queue, FLUSH_TIMEOUT).expect("queue mutex poisoned");
                    queue = guard;
                    if timeout.timed_out() && queue.items.is_empty() {
                        queue.flush_pending = false;
                    }
                } else {
                    queue = shared.cv.wait(queue).expect("queue mutex poisoned");
                }
            }
        };
        if matches!(item, WorkItem::Terminate) {
            return;
        }
        if let Err(e) = process_item(&shared, item) {
            log::error!("recording worker: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fossilize_db::{open as open_db, DatabaseMode};
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
    fn record_sampler_round_trips_through_synchronized_recorder() {
        let dir = tempdir().unwrap();
        let db = open_db(&dir.path().join("db.foz"), DatabaseMode::OverWrite).unwrap();
        let recorder = Recorder::init_recording_synchronized(db, ApplicationFilter::permissive(), None, None, PayloadWriteFlags::empty());
        recorder.record_sampler(1, &sampler()).unwrap();
        recorder.pump_synchronized_recording().unwrap();

        let hash = hash::hash_sampler(&sampler()).unwrap();
        let db = open_db(&dir.path().join("db.foz"), DatabaseMode::ReadOnly).unwrap();
        assert!(db.has_entry(ResourceTag::Sampler, hash));
    }

    #[test]
    fn unregister_evicts_handle() {
        let dir = tempdir().unwrap();
        let db = open_db(&dir.path().join("db.foz"), DatabaseMode::OverWrite).unwrap();
        let recorder = Recorder::init_recording_synchronized(db, ApplicationFilter::permissive(), None, None, PayloadWriteFlags::empty());
        recorder.record_sampler(5, &sampler()).unwrap();
        recorder.pump_synchronized_recording().unwrap();
        recorder.unregister(5);
        recorder.pump_synchronized_recording().unwrap();
        let handles = recorder.shared.handles.lock().unwrap();
        assert!(handles.resolve(ResourceTag::Sampler, 5).is_err());
    }

    #[test]
    fn threaded_recorder_tears_down_cleanly() {
        let dir = tempdir().unwrap();
        let db = open_db(&dir.path().join("db.foz"), DatabaseMode::OverWrite).unwrap();
        let recorder = Recorder::init_recording_thread(db, ApplicationFilter::permissive(), None, None, PayloadWriteFlags::empty());
        recorder.record_sampler(1, &sampler()).unwrap();
        recorder.sync_thread();
        recorder.tear_down_recording_thread();

        let hash = hash::hash_sampler(&sampler()).unwrap();
        let db = open_db(&dir.path().join("db.foz"), DatabaseMode::ReadOnly).unwrap();
        assert!(db.has_entry(ResourceTag::Sampler, hash));
    }
}
