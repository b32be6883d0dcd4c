// THEORY:
// The `reconciler` is the only code that touches spawned instances. Each frame
// it tears down every instance of the previous frame and builds the new frame
// from scratch; there is no incremental diffing.
//
// Key architectural principles:
// 1.  **Capability, not storage**: instances live in whatever scene the host
//     runs. The reconciler only calls `InstanceSpawner::create` and
//     `InstanceSpawner::destroy` and keeps the returned handles.
// 2.  **Exclusive ownership**: the live `InstanceSet` is moved into
//     `reconcile` and a fresh one is moved out. No one else can observe it half
//     rebuilt.
// 3.  **Teardown first, always**: the previous set is destroyed before
//     anything else happens, even for an empty frame and even when the records
//     turn out to be unusable.
// 4.  **All or nothing rebuild**: every record's bucket is checked against the
//     bucket set before the first instance is created. A record that points past
//     the palette means the bucket count and the prefab list disagree; that is a
//     configuration error, reported, never clamped.

use crate::core_modules::bucket_set::BucketSet;
use crate::core_modules::pixelizer::PlacementRecord;
use crate::error::{RenderError, RenderResult};
use glam::Vec3;

/// The scene-side half of instance lifecycle.
pub trait InstanceSpawner<P> {
    type Handle;

    /// Instantiates `prefab` at `position` and returns a handle to it.
    fn create(&mut self, prefab: &P, position: Vec3) -> Self::Handle;

    /// Destroys a previously created instance.
    fn destroy(&mut self, handle: Self::Handle);

    /// Destroys every handle in `handles`; override to batch the removals.
    fn destroy_all(&mut self, handles: impl IntoIterator<Item = Self::Handle>) {
        for handle in handles {
            self.destroy(handle);
        }
    }
}

/// Handles of the instances spawned for the current frame.
#[derive(Debug)]
pub struct InstanceSet<H> {
    handles: Vec<H>,
}

impl<H> Default for InstanceSet<H> {
    fn default() -> Self {
        Self {
            handles: Vec::new(),
        }
    }
}

impl<H> InstanceSet<H> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            handles: Vec::with_capacity(capacity),
        }
    }

    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &H> {
        self.handles.iter()
    }

    fn push(&mut self, handle: H) {
        self.handles.push(handle);
    }

    fn into_handles(self) -> Vec<H> {
        self.handles
    }
}

/// Destroys every instance in `instances`.
pub fn teardown<P, S>(instances: InstanceSet<S::Handle>, spawner: &mut S) -> usize
where
    S: InstanceSpawner<P>,
{
    let destroyed = instances.len();
    spawner.destroy_all(instances.into_handles());
    destroyed
}

/// Replaces `instances` with one instance per record.
///
/// On `ConfigMismatch` the previous instances are already gone and nothing new
/// was created; the caller's display is empty.
pub fn reconcile<P, S>(
    records: &[PlacementRecord],
    buckets: &BucketSet<P>,
    instances: InstanceSet<S::Handle>,
    spawner: &mut S,
) -> RenderResult<(InstanceSet<S::Handle>, usize)>
where
    S: InstanceSpawner<P>,
{
    let destroyed = teardown(instances, spawner);

    if let Some(bad) = records.iter().find(|r| buckets.get(r.bucket_index).is_none()) {
        return Err(RenderError::ConfigMismatch {
            index: bad.bucket_index,
            bucket_count: buckets.len(),
        });
    }

    let mut rebuilt = InstanceSet::with_capacity(records.len());
    for record in records {
        if let Some(prefab) = buckets.get(record.bucket_index) {
            rebuilt.push(spawner.create(prefab, record.position));
        }
    }

    let count = rebuilt.len();
    tracing::trace!(destroyed, created = count, "reconciled instance set");
    Ok((rebuilt, count))
}
