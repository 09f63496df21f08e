/// Mesh resource registry
///
/// Maps mesh assets to GPU vertex/index buffer pairs, deduplicated by asset
/// name and shared by every mesh instance created from that asset.
///
/// Unregistering an instance only queues it. The queue is drained once per
/// frame, after the frame slot's fence wait, so buffers are never freed
/// while a command buffer that may read them is still executing. Each entry
/// also remembers the last submission that drew it: an entry whose last
/// instance goes away is removed at once, but its buffers are parked until
/// that submission is known complete.

use rustc_hash::FxHashMap;
use std::collections::BTreeSet;
use std::sync::Arc;

use crate::error::{Error, Result};
use crate::graphics_device::{Buffer, BufferUsage, GraphicsDevice};
use crate::resource::{MeshAsset, MeshInstanceId};
use crate::{engine_debug, engine_error, engine_trace, engine_warn};

const SOURCE: &str = "lumen::MeshRegistry";

// ============================================================================
// GPU mesh entry
// ============================================================================

/// GPU buffers shared by every instance of one mesh asset
pub struct GpuMeshEntry {
    asset_name: String,
    vertex_buffer: Arc<dyn Buffer>,
    index_buffer: Arc<dyn Buffer>,
    vertex_count: u32,
    index_count: u32,
    instance_ids: BTreeSet<MeshInstanceId>,
    last_submission: Option<u64>,
}

impl GpuMeshEntry {
    pub fn asset_name(&self) -> &str {
        &self.asset_name
    }

    pub fn vertex_buffer(&self) -> &Arc<dyn Buffer> {
        &self.vertex_buffer
    }

    pub fn index_buffer(&self) -> &Arc<dyn Buffer> {
        &self.index_buffer
    }

    pub fn vertex_count(&self) -> u32 {
        self.vertex_count
    }

    pub fn index_count(&self) -> u32 {
        self.index_count
    }

    /// Instances currently associated with this entry
    pub fn instance_ids(&self) -> &BTreeSet<MeshInstanceId> {
        &self.instance_ids
    }

    /// Index of the last submission whose commands referenced this entry
    pub fn last_submission(&self) -> Option<u64> {
        self.last_submission
    }
}

/// Buffers of a removed entry still possibly read by an in-flight frame
struct RetiredBuffers {
    asset_name: String,
    last_submission: u64,
    _vertex_buffer: Arc<dyn Buffer>,
    _index_buffer: Arc<dyn Buffer>,
}

/// What a drain pass did
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DrainReport {
    /// Instance IDs dissociated from their entry
    pub dissociated: usize,
    /// Entries removed from the registry
    pub removed_entries: usize,
    /// Entries whose buffers were released during this pass
    pub released: usize,
    /// Entries whose buffers are still waiting on an in-flight submission
    pub retired: usize,
}

// ============================================================================
// Registry
// ============================================================================

#[derive(Default)]
pub struct MeshRegistry {
    /// Entries keyed by asset name
    entries: FxHashMap<String, GpuMeshEntry>,
    /// Instance → asset name
    instances: FxHashMap<MeshInstanceId, String>,
    /// Pending deletion queue, in unregistration order
    pending: Vec<MeshInstanceId>,
    retired: Vec<RetiredBuffers>,
}

impl MeshRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Associate `id` with the GPU entry for `asset`, uploading the asset
    /// if no entry exists yet
    ///
    /// Associating an ID that is already associated is a caller logic error
    /// and is reported as `InvalidResource`.
    pub fn register_mesh(
        &mut self,
        device: &mut dyn GraphicsDevice,
        asset: &MeshAsset,
        id: MeshInstanceId,
    ) -> Result<()> {
        if let Some(existing) = self.instances.get(&id) {
            engine_error!(SOURCE, "{} is already associated with '{}'", id, existing);
            return Err(Error::InvalidResource(format!(
                "{} is already associated with '{}'",
                id, existing
            )));
        }

        if let Some(entry) = self.entries.get_mut(&asset.name) {
            entry.instance_ids.insert(id);
            self.instances.insert(id, asset.name.clone());
            engine_trace!(
                SOURCE,
                "{} shares '{}' ({} instances)",
                id,
                asset.name,
                entry.instance_ids.len()
            );
            return Ok(());
        }

        if asset.vertices.is_empty() || asset.indices.is_empty() {
            engine_error!(SOURCE, "Mesh asset '{}' has no geometry", asset.name);
            return Err(Error::InvalidResource(format!(
                "Mesh asset '{}' has no geometry",
                asset.name
            )));
        }

        let vertex_buffer = device.upload_buffer(
            &format!("{}/vertices", asset.name),
            BufferUsage::VERTEX,
            asset.vertex_bytes(),
        )?;
        let index_buffer = device.upload_buffer(
            &format!("{}/indices", asset.name),
            BufferUsage::INDEX,
            asset.index_bytes(),
        )?;

        let mut instance_ids = BTreeSet::new();
        instance_ids.insert(id);
        self.entries.insert(
            asset.name.clone(),
            GpuMeshEntry {
                asset_name: asset.name.clone(),
                vertex_buffer,
                index_buffer,
                vertex_count: asset.vertices.len() as u32,
                index_count: asset.index_count(),
                instance_ids,
                last_submission: None,
            },
        );
        self.instances.insert(id, asset.name.clone());

        engine_debug!(
            SOURCE,
            "Uploaded '{}' ({} vertices, {} indices) for {}",
            asset.name,
            asset.vertices.len(),
            asset.indices.len(),
            id
        );
        Ok(())
    }

    /// Queue `id` for dissociation at the next drain
    ///
    /// Unknown or already-queued IDs are ignored.
    pub fn unregister_mesh(&mut self, id: MeshInstanceId) {
        if !self.instances.contains_key(&id) {
            engine_warn!(SOURCE, "Ignoring unregister of unknown {}", id);
            return;
        }
        if self.pending.contains(&id) {
            return;
        }
        self.pending.push(id);
    }

    /// Entry currently associated with `id`
    pub fn resolve_mesh(&self, id: MeshInstanceId) -> Option<&GpuMeshEntry> {
        let name = self.instances.get(&id)?;
        self.entries.get(name)
    }

    /// Record that submission `submission` draws the entries of `ids`
    pub fn mark_referenced(&mut self, ids: &[MeshInstanceId], submission: u64) {
        for id in ids {
            if let Some(entry) = self.instances.get(id).and_then(|n| self.entries.get_mut(n)) {
                entry.last_submission = Some(submission);
            }
        }
    }

    /// Drain the pending deletion queue
    ///
    /// `completed` is the number of submissions known to have finished on
    /// the GPU: every submission index below it is complete. Must only be
    /// called after the current frame slot's fence wait.
    pub fn drain_pending(&mut self, completed: u64) -> DrainReport {
        let mut report = DrainReport::default();

        for id in std::mem::take(&mut self.pending) {
            let Some(name) = self.instances.remove(&id) else {
                continue;
            };
            let Some(entry) = self.entries.get_mut(&name) else {
                continue;
            };
            entry.instance_ids.remove(&id);
            report.dissociated += 1;

            if !entry.instance_ids.is_empty() {
                continue;
            }
            let Some(entry) = self.entries.remove(&name) else {
                continue;
            };
            report.removed_entries += 1;

            match entry.last_submission {
                Some(last) if last >= completed => {
                    engine_debug!(
                        SOURCE,
                        "Retiring '{}' until submission {} completes",
                        name,
                        last
                    );
                    self.retired.push(RetiredBuffers {
                        asset_name: entry.asset_name,
                        last_submission: last,
                        _vertex_buffer: entry.vertex_buffer,
                        _index_buffer: entry.index_buffer,
                    });
                }
                _ => {
                    engine_debug!(SOURCE, "Releasing buffers of '{}'", name);
                    report.released += 1;
                }
            }
        }

        report.released += self.collect_retired(completed);
        report.retired = self.retired.len();
        report
    }

    /// Release retired buffers whose last submission has completed
    pub fn collect_retired(&mut self, completed: u64) -> usize {
        let before = self.retired.len();
        self.retired.retain(|r| {
            let keep = r.last_submission >= completed;
            if !keep {
                engine_debug!(SOURCE, "Releasing retired buffers of '{}'", r.asset_name);
            }
            keep
        });
        before - self.retired.len()
    }

    /// Drop every entry, queued ID and retired buffer
    ///
    /// Only valid once the device is idle.
    pub fn release_all(&mut self) {
        if !self.entries.is_empty() || !self.retired.is_empty() {
            engine_debug!(
                SOURCE,
                "Releasing {} mesh entries and {} retired buffer pairs",
                self.entries.len(),
                self.retired.len()
            );
        }
        self.pending.clear();
        self.instances.clear();
        self.entries.clear();
        self.retired.clear();
    }

    /// Number of live GPU mesh entries
    pub fn entry_count(&self) -> usize {
        self.entries.len()
    }

    /// Entry for an asset name
    pub fn entry(&self, asset_name: &str) -> Option<&GpuMeshEntry> {
        self.entries.get(asset_name)
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    pub fn retired_count(&self) -> usize {
        self.retired.len()
    }
}

#[cfg(test)]
#[path = "mesh_registry_tests.rs"]
mod tests;
