//! The working set: pending items, their previews, and in-flight transforms.
//!
//! A [`Workspace`] is the single owner of every [`PendingItem`] for one tool.
//! Transforms run as tokio tasks and report back over a channel; their
//! results are applied on the owner by [`Workspace::next_completion`] or
//! [`Workspace::apply_ready`], so item state is never touched from two
//! places at once.
//!
//! Each item carries a generation number. Starting a transform on an item
//! that is already converting aborts the running task and bumps the
//! generation, so a stale completion that was already queued is discarded
//! when it arrives.
//!
//! Preview references are RAII handles issued by a [`PreviewRegistry`].
//! Removing an item, replacing its output, clearing the set or dropping the
//! workspace releases them; [`PreviewRegistry::live_count`] makes a leak
//! visible.

use crate::config::ConversionParameters;
use crate::convert;
use crate::error::ConvertError;
use crate::output::{Blob, ConversionResult, TransformOutput};
use crate::pipeline::{document, encode, input};
use crate::tool::Tool;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

// ── Previews ─────────────────────────────────────────────────────────────

#[derive(Debug, Default)]
struct RegistryInner {
    next: AtomicU64,
    live: Mutex<BTreeSet<u64>>,
}

impl RegistryInner {
    fn live(&self) -> MutexGuard<'_, BTreeSet<u64>> {
        self.live.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// Issues preview handles and tracks which ones are still alive.
///
/// Cloning shares the same table.
#[derive(Debug, Clone, Default)]
pub struct PreviewRegistry {
    inner: Arc<RegistryInner>,
}

impl PreviewRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Issue a new handle over `data`.
    pub fn issue(&self, mime: &str, data: impl Into<Arc<[u8]>>) -> PreviewHandle {
        let id = self.inner.next.fetch_add(1, Ordering::Relaxed) + 1;
        self.inner.live().insert(id);
        PreviewHandle {
            id,
            mime: mime.to_string(),
            data: data.into(),
            registry: Arc::clone(&self.inner),
        }
    }

    /// Number of handles issued and not yet released.
    pub fn live_count(&self) -> usize {
        self.inner.live().len()
    }

    /// Whether the handle behind `uri` is still alive.
    pub fn is_live(&self, uri: &str) -> bool {
        uri.strip_prefix(PREVIEW_SCHEME)
            .and_then(|n| n.parse::<u64>().ok())
            .is_some_and(|id| self.inner.live().contains(&id))
    }
}

const PREVIEW_SCHEME: &str = "preview://";

/// A displayable reference to some bytes, released when dropped.
#[derive(Debug)]
pub struct PreviewHandle {
    id: u64,
    mime: String,
    data: Arc<[u8]>,
    registry: Arc<RegistryInner>,
}

impl PreviewHandle {
    /// Opaque URI, valid while the handle is alive.
    pub fn uri(&self) -> String {
        format!("{PREVIEW_SCHEME}{}", self.id)
    }

    /// Self-contained `data:` URI for the bytes.
    pub fn data_uri(&self) -> String {
        encode::data_uri(&self.mime, &self.data)
    }

    pub fn mime(&self) -> &str {
        &self.mime
    }

    pub fn bytes(&self) -> &[u8] {
        &self.data
    }
}

impl Drop for PreviewHandle {
    fn drop(&mut self) {
        self.registry.live().remove(&self.id);
    }
}

// ── Items ────────────────────────────────────────────────────────────────

/// Stable identifier of a pending item. Ids increase in insertion order and
/// are never reused within a workspace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ItemId(u64);

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// One selected file and whatever has been derived from it.
#[derive(Debug)]
pub struct PendingItem {
    id: ItemId,
    origin: Blob,
    preview: PreviewHandle,
    output: Option<TransformOutput>,
    output_previews: Vec<PreviewHandle>,
    output_generation: u64,
    converting: bool,
    generation: u64,
}

impl PendingItem {
    pub fn id(&self) -> ItemId {
        self.id
    }

    pub fn origin(&self) -> &Blob {
        &self.origin
    }

    /// Preview of the original file, created once when the item was added.
    pub fn preview(&self) -> &PreviewHandle {
        &self.preview
    }

    pub fn output(&self) -> Option<&TransformOutput> {
        self.output.as_ref()
    }

    /// One preview per artifact of the current output (one per page for
    /// PDF→JPG).
    pub fn output_previews(&self) -> &[PreviewHandle] {
        &self.output_previews
    }

    /// `true` while a transform is in flight.
    pub fn is_converting(&self) -> bool {
        self.converting
    }

    /// `true` when the output was produced by an earlier start than the
    /// latest one: a transform is running, or the last one failed and the
    /// output shown still reflects the previous parameters.
    pub fn is_stale(&self) -> bool {
        self.output.is_some() && self.output_generation != self.generation
    }

    /// Replace the output; previews of the previous one are released.
    fn attach(&mut self, output: TransformOutput, registry: &PreviewRegistry) {
        let previews = match &output {
            TransformOutput::Single(r) => vec![registry.issue(&r.mime, r.data.as_slice())],
            TransformOutput::Pages(pages) => pages
                .iter()
                .map(|p| registry.issue("image/jpeg", p.jpeg.as_slice()))
                .collect(),
        };
        self.output_previews = previews;
        self.output = Some(output);
        self.output_generation = self.generation;
    }
}

// ── Completions ──────────────────────────────────────────────────────────

struct Completion {
    id: ItemId,
    generation: u64,
    result: Result<TransformOutput, ConvertError>,
}

/// A transform that did not produce an output.
#[derive(Debug)]
pub struct ItemFailure {
    pub id: ItemId,
    pub name: String,
    pub error: ConvertError,
}

/// What applying a completion did to the working set.
#[derive(Debug)]
pub enum ItemEvent {
    /// The item now holds a fresh output.
    Completed(ItemId),
    /// The transform failed. The item's previous output, if any, is kept but
    /// belongs to the parameters of an earlier start; see
    /// [`PendingItem::is_stale`].
    Failed(ItemFailure),
}

// ── Workspace ────────────────────────────────────────────────────────────

/// The pending-item list of one tool.
pub struct Workspace {
    tool: Tool,
    registry: PreviewRegistry,
    items: BTreeMap<ItemId, PendingItem>,
    tasks: HashMap<ItemId, JoinHandle<()>>,
    next_id: u64,
    tx: mpsc::UnboundedSender<Completion>,
    rx: mpsc::UnboundedReceiver<Completion>,
}

impl Workspace {
    pub fn new(tool: Tool) -> Self {
        Self::with_registry(tool, PreviewRegistry::new())
    }

    /// Create a workspace that issues previews from an existing registry.
    pub fn with_registry(tool: Tool, registry: PreviewRegistry) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            tool,
            registry,
            items: BTreeMap::new(),
            tasks: HashMap::new(),
            next_id: 0,
            tx,
            rx,
        }
    }

    pub fn tool(&self) -> Tool {
        self.tool
    }

    pub fn registry(&self) -> &PreviewRegistry {
        &self.registry
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get(&self, id: ItemId) -> Option<&PendingItem> {
        self.items.get(&id)
    }

    /// Items in the order they were added.
    pub fn items(&self) -> impl Iterator<Item = &PendingItem> {
        self.items.values()
    }

    /// Number of transforms still in flight.
    pub fn in_flight(&self) -> usize {
        self.tasks.len()
    }

    /// Add the files the tool accepts; the rest are ignored.
    ///
    /// Returns the ids of the new items in input order.
    pub fn add_files(&mut self, files: Vec<Blob>) -> Vec<ItemId> {
        input::accept(self.tool, files)
            .into_iter()
            .map(|origin| {
                self.next_id += 1;
                let id = ItemId(self.next_id);
                let preview = self.registry.issue(&origin.mime, Arc::clone(&origin.data));
                debug!("{}: added {} '{}'", self.tool, id, origin.name);
                self.items.insert(
                    id,
                    PendingItem {
                        id,
                        origin,
                        preview,
                        output: None,
                        output_previews: Vec::new(),
                        output_generation: 0,
                        converting: false,
                        generation: 0,
                    },
                );
                id
            })
            .collect()
    }

    /// Drop one item, aborting its transform. Returns `false` for an
    /// unknown id.
    pub fn remove(&mut self, id: ItemId) -> bool {
        if let Some(task) = self.tasks.remove(&id) {
            task.abort();
        }
        let removed = self.items.remove(&id).is_some();
        if removed {
            debug!("{}: removed {}", self.tool, id);
        }
        removed
    }

    /// Drop every item, aborting all transforms.
    pub fn clear(&mut self) {
        self.abort_all();
        self.items.clear();
        while self.rx.try_recv().is_ok() {}
        debug!("{}: cleared", self.tool);
    }

    /// Start (or restart) the transform of one item with a snapshot of
    /// `params`.
    ///
    /// A transform already running for the item is aborted and its result,
    /// should it still arrive, is ignored.
    pub fn start_transform(&mut self, id: ItemId, params: &ConversionParameters) -> Result<(), ConvertError> {
        params.validate()?;
        if self.tool.is_whole_set() {
            return Err(ConvertError::InvalidConfig(format!(
                "{} converts the whole set at once",
                self.tool
            )));
        }
        let item = self
            .items
            .get_mut(&id)
            .ok_or_else(|| ConvertError::InvalidConfig(format!("No pending item {}", id)))?;

        if let Some(previous) = self.tasks.remove(&id) {
            debug!("{}: superseding transform of {}", self.tool, id);
            previous.abort();
        }

        item.generation += 1;
        item.converting = true;

        let generation = item.generation;
        let tool = self.tool;
        let blob = item.origin.clone();
        let params = params.clone();
        let tx = self.tx.clone();

        let task = tokio::spawn(async move {
            let result = convert::transform(tool, blob, params).await;
            let _ = tx.send(Completion {
                id,
                generation,
                result,
            });
        });
        self.tasks.insert(id, task);
        Ok(())
    }

    /// Start every item. Returns how many transforms were started.
    pub fn convert_all(&mut self, params: &ConversionParameters) -> Result<usize, ConvertError> {
        let ids: Vec<ItemId> = self.items.keys().copied().collect();
        for id in &ids {
            self.start_transform(*id, params)?;
        }
        info!("{}: started {} transforms", self.tool, ids.len());
        Ok(ids.len())
    }

    /// Wait for the next transform to finish and apply it.
    ///
    /// Returns `None` once nothing is in flight.
    pub async fn next_completion(&mut self) -> Option<ItemEvent> {
        while !self.tasks.is_empty() {
            let completion = self.rx.recv().await?;
            if let Some(event) = self.apply(completion) {
                return Some(event);
            }
        }
        None
    }

    /// Apply every completion that has already arrived, without waiting.
    pub fn apply_ready(&mut self) -> Vec<ItemEvent> {
        let mut events = Vec::new();
        while let Ok(completion) = self.rx.try_recv() {
            events.extend(self.apply(completion));
        }
        events
    }

    /// Wait for every in-flight transform.
    pub async fn wait_all(&mut self) -> Vec<ItemEvent> {
        let mut events = Vec::new();
        while let Some(event) = self.next_completion().await {
            events.push(event);
        }
        events
    }

    fn apply(&mut self, completion: Completion) -> Option<ItemEvent> {
        let Completion {
            id,
            generation,
            result,
        } = completion;

        let Some(item) = self.items.get_mut(&id) else {
            debug!("{}: dropping completion for removed {}", self.tool, id);
            return None;
        };
        if item.generation != generation {
            debug!(
                "{}: dropping stale completion for {} (generation {} < {})",
                self.tool, id, generation, item.generation
            );
            return None;
        }

        self.tasks.remove(&id);
        item.converting = false;

        match result {
            Ok(output) => {
                debug!("{}: {} produced {} bytes", self.tool, id, output.size());
                item.attach(output, &self.registry);
                Some(ItemEvent::Completed(id))
            }
            Err(error) => {
                warn!("{}: '{}' failed: {}", self.tool, item.origin.name, error);
                Some(ItemEvent::Failed(ItemFailure {
                    id,
                    name: item.origin.name.clone(),
                    error,
                }))
            }
        }
    }

    fn origins(&self) -> Vec<Blob> {
        self.items.values().map(|i| i.origin.clone()).collect()
    }

    /// Merge every item, in order, into one PDF.
    pub async fn merge(&self, params: &ConversionParameters) -> Result<ConversionResult, ConvertError> {
        params.validate()?;
        document::merge(self.origins(), params.password.clone()).await
    }

    /// Place every item, in order, on its own page of a new PDF.
    pub async fn images_to_pdf(&self, params: &ConversionParameters) -> Result<ConversionResult, ConvertError> {
        params.validate()?;
        document::images_to_pdf(self.origins(), params.clone()).await
    }

    fn abort_all(&mut self) {
        for (_, task) in self.tasks.drain() {
            task.abort();
        }
    }
}

impl Drop for Workspace {
    fn drop(&mut self) {
        self.abort_all();
    }
}

impl fmt::Debug for Workspace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Workspace")
            .field("tool", &self.tool)
            .field("items", &self.items.len())
            .field("in_flight", &self.tasks.len())
            .finish()
    }
}
