// THEORY:
// The `pipeline` module is the top-level API of the renderer. `FrameRenderer`
// owns everything a render session needs between frames: the validated config,
// the prefab palette, the scene-side spawner and the live instance set. Its one
// job per frame is `render_new_frame`:
//
//   frame --pixelize--> placement records --reconcile--> new instance set + count
//
// Cycles cannot overlap: `render_new_frame` takes `&mut self`, so the instance
// set has exactly one writer at a time. Hosts that receive frames from several
// places (a tick timer, a decoder callback) wrap the renderer in a
// `RenderService`, which serializes them.
//
// A failed cycle never leaves a half-built scene: the previous instances are
// destroyed first, and on error nothing new is spawned. The error is logged and
// returned, the live count drops to zero, and the next frame starts clean.

use crate::config::RenderConfig;
use crate::core_modules::bucket_set::BucketSet;
use crate::core_modules::pixelizer::pixelize_frame;
use crate::core_modules::reconciler::{InstanceSet, InstanceSpawner, reconcile, teardown};
use crate::error::RenderResult;
use crate::frame_source::Frame;

/// The main, top-level struct for the renderer.
pub struct FrameRenderer<P, S: InstanceSpawner<P>> {
    config: RenderConfig,
    buckets: BucketSet<P>,
    spawner: S,
    instances: InstanceSet<S::Handle>,
    instance_count: usize,
    frames_rendered: u64,
}

impl<P, S: InstanceSpawner<P>> FrameRenderer<P, S> {
    /// Validates `config` and takes ownership of the palette and spawner.
    pub fn new(config: RenderConfig, buckets: BucketSet<P>, spawner: S) -> RenderResult<Self> {
        config.validate()?;
        tracing::info!(
            grid_width = config.grid_width,
            grid_height = config.grid_height,
            prefabs = buckets.len(),
            strategy = ?config.strategy,
            "frame renderer ready"
        );
        Ok(Self {
            config,
            buckets,
            spawner,
            instances: InstanceSet::new(),
            instance_count: 0,
            frames_rendered: 0,
        })
    }

    /// Runs one pixelize + reconcile cycle and returns the live instance count.
    #[tracing::instrument(skip_all, fields(frame = self.frames_rendered, samples = frame.len()))]
    pub async fn render_new_frame(&mut self, frame: &Frame) -> RenderResult<usize> {
        if !frame.is_empty() && frame.len() != self.config.sample_count() {
            tracing::warn!(
                expected = self.config.sample_count(),
                got = frame.len(),
                "frame size does not match the render grid"
            );
        }

        let previous = std::mem::take(&mut self.instances);
        self.instance_count = 0;
        self.frames_rendered += 1;

        let bucket_count = self.config.resolved_bucket_count(self.buckets.len());
        let records = match pixelize_frame(frame, &self.config, bucket_count).await {
            Ok(records) => records,
            Err(err) => {
                teardown::<P, S>(previous, &mut self.spawner);
                tracing::error!(%err, "pixelization failed, frame left empty");
                return Err(err);
            }
        };

        match reconcile::<P, S>(&records, &self.buckets, previous, &mut self.spawner) {
            Ok((instances, count)) => {
                self.instances = instances;
                self.instance_count = count;
                tracing::debug!(count, "frame rendered");
                Ok(count)
            }
            Err(err) => {
                tracing::error!(%err, "reconcile failed, frame left empty");
                Err(err)
            }
        }
    }

    /// Destroys every live instance without rendering anything new.
    pub fn clear_frame(&mut self) -> usize {
        let previous = std::mem::take(&mut self.instances);
        self.instance_count = 0;
        let destroyed = teardown::<P, S>(previous, &mut self.spawner);
        tracing::debug!(destroyed, "frame cleared");
        destroyed
    }

    /// Instances spawned by the last successful cycle.
    pub fn instance_count(&self) -> usize {
        self.instance_count
    }

    pub fn frames_rendered(&self) -> u64 {
        self.frames_rendered
    }

    pub fn config(&self) -> &RenderConfig {
        &self.config
    }

    pub fn buckets(&self) -> &BucketSet<P> {
        &self.buckets
    }

    pub fn spawner(&self) -> &S {
        &self.spawner
    }

    /// Clears the scene and hands the spawner back.
    pub fn into_spawner(mut self) -> S {
        self.clear_frame();
        self.spawner
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ExecutionStrategy;
    use crate::core_modules::memory_scene::MemoryScene;
    use crate::core_modules::sample::sample::Sample;
    use crate::error::RenderError;
    use glam::{Vec2, Vec3};

    type Renderer = FrameRenderer<&'static str, MemoryScene<&'static str>>;

    fn palette() -> BucketSet<&'static str> {
        BucketSet::new(vec!["black", "dark", "light", "white"]).expect("non-empty")
    }

    fn renderer(config: RenderConfig) -> Renderer {
        FrameRenderer::new(config, palette(), MemoryScene::new()).expect("valid config")
    }

    fn grid_4x2() -> RenderConfig {
        RenderConfig {
            grid_width: 4,
            grid_height: 2,
            ..RenderConfig::default()
        }
    }

    fn uniform(level: u8) -> Frame {
        Frame::new(4, 2, vec![Sample::gray(level); 8]).expect("4x2 samples")
    }

    #[test]
    fn degenerate_config_is_rejected_up_front() {
        let config = RenderConfig {
            grid_width: 0,
            ..grid_4x2()
        };
        let result = FrameRenderer::new(config, palette(), MemoryScene::<&'static str>::new());
        assert!(matches!(result, Err(RenderError::DegenerateConfig(_))));
    }

    #[tokio::test]
    async fn spawns_one_instance_per_sample() {
        let mut r = renderer(grid_4x2());
        let count = r.render_new_frame(&uniform(255)).await.expect("renders");
        assert_eq!(count, 8);
        assert_eq!(r.instance_count(), 8);
        assert_eq!(r.spawner().live_count(), 8);
        assert!(r.spawner().iter().all(|(_, i)| i.prefab == "white"));
    }

    #[tokio::test]
    async fn places_instances_on_the_grid() {
        let config = RenderConfig {
            axis_spacing: Vec2::new(2.0, 3.0),
            origin_offset: Vec3::new(100.0, 0.0, 0.0),
            ..grid_4x2()
        };
        let mut r = renderer(config);
        r.render_new_frame(&uniform(0)).await.expect("renders");
        let mut positions: Vec<(f32, f32)> = r.spawner().iter().map(|(_, i)| (i.position.x, i.position.z)).collect();
        positions.sort_by(|a, b| a.partial_cmp(b).expect("finite"));
        // index 5 -> column 1, row 2
        assert!(positions.contains(&(102.0, 6.0)));
        assert!(positions.contains(&(100.0, 0.0)));
    }

    #[tokio::test]
    async fn each_frame_replaces_the_previous_one() {
        let mut r = renderer(grid_4x2());
        r.render_new_frame(&uniform(0)).await.expect("first");
        r.render_new_frame(&uniform(255)).await.expect("second");
        assert_eq!(r.spawner().live_count(), 8);
        assert_eq!(r.spawner().created_total(), 16);
        assert_eq!(r.spawner().destroyed_total(), 8);
        assert!(r.spawner().iter().all(|(_, i)| i.prefab == "white"));
        assert_eq!(r.frames_rendered(), 2);
    }

    #[tokio::test]
    async fn suppression_spawns_nothing_for_a_black_frame() {
        let config = RenderConfig {
            suppress_darkest: true,
            ..grid_4x2()
        };
        let mut r = renderer(config);
        r.render_new_frame(&uniform(255)).await.expect("white");
        let count = r.render_new_frame(&uniform(0)).await.expect("black");
        assert_eq!(count, 0);
        assert_eq!(r.spawner().live_count(), 0);
    }

    #[tokio::test]
    async fn empty_frame_is_a_teardown_only_cycle() {
        let mut r = renderer(grid_4x2());
        r.render_new_frame(&uniform(90)).await.expect("renders");
        let count = r.render_new_frame(&Frame::empty()).await.expect("empty frame is fine");
        assert_eq!(count, 0);
        assert_eq!(r.spawner().live_count(), 0);
    }

    #[tokio::test]
    async fn mismatched_bucket_count_fails_the_cycle_and_leaves_it_empty() {
        let config = RenderConfig {
            bucket_count: Some(5),
            ..grid_4x2()
        };
        let mut r = renderer(config);
        assert_eq!(r.render_new_frame(&uniform(0)).await.expect("bucket 0 exists"), 8);

        let result = r.render_new_frame(&uniform(255)).await;
        assert!(matches!(
            result,
            Err(RenderError::ConfigMismatch { index: 4, bucket_count: 4 })
        ));
        assert_eq!(r.instance_count(), 0);
        assert_eq!(r.spawner().live_count(), 0);

        // the renderer recovers on the next good frame
        assert_eq!(r.render_new_frame(&uniform(0)).await.expect("recovers"), 8);
    }

    #[tokio::test]
    async fn failed_pixelization_tears_down_and_leaves_the_scene_empty() {
        for strategy in [ExecutionStrategy::Sequential, ExecutionStrategy::Batched] {
            let mut r = renderer(RenderConfig {
                strategy,
                ..grid_4x2()
            });
            assert_eq!(r.render_new_frame(&uniform(255)).await.expect("renders"), 8);

            // break the grid after construction so pixelization itself fails
            r.config.grid_height = 0;
            let result = r.render_new_frame(&uniform(255)).await;
            assert!(matches!(result, Err(RenderError::DegenerateConfig(_))), "{strategy:?}");
            assert_eq!(r.instance_count(), 0);
            assert_eq!(r.spawner().live_count(), 0);
            assert_eq!(r.spawner().destroyed_total(), 8);
            assert_eq!(r.frames_rendered(), 2);
        }
    }

    #[tokio::test]
    async fn batched_strategy_builds_the_same_scene() {
        let frame = Frame::new(
            4,
            2,
            (0..8u8).map(|i| Sample::new(i * 30, 255 - i * 20, i * 7)).collect(),
        )
        .expect("4x2 samples");
        let mut sequential = renderer(grid_4x2());
        let mut batched = renderer(RenderConfig {
            strategy: ExecutionStrategy::Batched,
            batch_size: 3,
            ..grid_4x2()
        });
        sequential.render_new_frame(&frame).await.expect("sequential");
        batched.render_new_frame(&frame).await.expect("batched");

        let scene = |r: &Renderer| {
            let mut v: Vec<(u64, &'static str, [f32; 3])> = r
                .spawner()
                .iter()
                .map(|(id, i)| (id.0, i.prefab, i.position.to_array()))
                .collect();
            v.sort_by_key(|(id, _, _)| *id);
            v
        };
        assert_eq!(scene(&sequential), scene(&batched));
    }

    #[tokio::test]
    async fn clear_frame_destroys_everything() {
        let mut r = renderer(grid_4x2());
        r.render_new_frame(&uniform(128)).await.expect("renders");
        assert_eq!(r.clear_frame(), 8);
        assert_eq!(r.instance_count(), 0);
        let scene = r.into_spawner();
        assert_eq!(scene.live_count(), 0);
        assert_eq!(scene.destroyed_total(), 8);
    }
}
