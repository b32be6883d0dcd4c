// THEORY:
// `MemoryScene` is an in-process stand-in for a real scene graph or ECS world:
// a flat arena of spawned instances keyed by a monotonically increasing id. It
// implements `InstanceSpawner` so the renderer can drive it exactly as it would
// drive an engine, and it keeps lifetime totals so a host (or a test) can check
// that nothing leaks from frame to frame.

use crate::core_modules::reconciler::InstanceSpawner;
use glam::Vec3;
use std::collections::HashMap;

/// Handle to an instance in a `MemoryScene`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct InstanceId(pub u64);

/// One live instance.
#[derive(Debug, Clone, PartialEq)]
pub struct SceneInstance<P> {
    pub prefab: P,
    pub position: Vec3,
}

#[derive(Debug)]
pub struct MemoryScene<P> {
    next_id: u64,
    live: HashMap<InstanceId, SceneInstance<P>>,
    created_total: u64,
    destroyed_total: u64,
}

impl<P> Default for MemoryScene<P> {
    fn default() -> Self {
        Self {
            next_id: 0,
            live: HashMap::new(),
            created_total: 0,
            destroyed_total: 0,
        }
    }
}

impl<P> MemoryScene<P> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn live_count(&self) -> usize {
        self.live.len()
    }

    pub fn created_total(&self) -> u64 {
        self.created_total
    }

    pub fn destroyed_total(&self) -> u64 {
        self.destroyed_total
    }

    pub fn get(&self, id: InstanceId) -> Option<&SceneInstance<P>> {
        self.live.get(&id)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&InstanceId, &SceneInstance<P>)> {
        self.live.iter()
    }
}

impl<P: Clone> InstanceSpawner<P> for MemoryScene<P> {
    type Handle = InstanceId;

    fn create(&mut self, prefab: &P, position: Vec3) -> InstanceId {
        let id = InstanceId(self.next_id);
        self.next_id += 1;
        self.created_total += 1;
        self.live.insert(
            id,
            SceneInstance {
                prefab: prefab.clone(),
                position,
            },
        );
        id
    }

    fn destroy(&mut self, handle: InstanceId) {
        if self.live.remove(&handle).is_some() {
            self.destroyed_total += 1;
        } else {
            tracing::warn!(?handle, "destroy called for an instance that is not live");
        }
    }
}
