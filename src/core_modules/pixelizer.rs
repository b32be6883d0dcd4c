// THEORY:
// The `pixelizer` is the per-frame pass that turns raw samples into placement
// decisions. For every sample it asks the brightness mapper which bucket the
// sample belongs to and whether it is kept; kept samples get a world position
// from the geometry mapper and become a `PlacementRecord`. Suppressed samples
// produce nothing, so the output is sparse.
//
// Two execution strategies, one result:
// 1.  **Sequential**: a single ascending walk on the calling task.
// 2.  **Batched**: the index range is cut into contiguous batches of
//     `batch_size`. Each batch runs on tokio's blocking pool against the same
//     shared, immutable sample buffer and fills its own output vector; no batch
//     can see another's output. At most one batch per CPU is in flight. The
//     join collects outputs in batch order, so the concatenation is identical
//     to the sequential walk.
//
// Both strategies validate the config before touching a sample, so a zero
// grid dimension or batch size is a `DegenerateConfig` error, never a panic.
//
// The pixelizer never sees the instance set. It only produces records.

use crate::config::{ExecutionStrategy, RenderConfig};
use crate::core_modules::brightness::brightness::classify;
use crate::core_modules::geometry;
use crate::core_modules::sample::sample::Sample;
use crate::error::{RenderError, RenderResult};
use crate::frame_source::Frame;
use futures::stream::{self, StreamExt};
use glam::Vec3;
use std::sync::Arc;

/// A decision to spawn the prefab of `bucket_index` at `position`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlacementRecord {
    pub bucket_index: usize,
    pub position: Vec3,
}

/// Pixelizes `samples`, whose first element sits at linear index `first_index`.
pub fn pixelize_range(
    samples: &[Sample],
    first_index: usize,
    config: &RenderConfig,
    bucket_count: usize,
) -> Vec<PlacementRecord> {
    samples
        .iter()
        .enumerate()
        .filter_map(|(offset, sample)| {
            let class = classify(sample, bucket_count, config.suppress_darkest, config.invert_buckets);
            class.include.then(|| PlacementRecord {
                bucket_index: class.bucket_index,
                position: geometry::position(
                    first_index + offset,
                    config.grid_width,
                    config.grid_height,
                    config.axis_spacing,
                    config.origin_offset,
                ),
            })
        })
        .collect()
}

/// Sequential strategy: one ordered pass over the whole frame.
pub fn pixelize(
    frame: &Frame,
    config: &RenderConfig,
    bucket_count: usize,
) -> RenderResult<Vec<PlacementRecord>> {
    config.validate()?;
    Ok(pixelize_range(frame.samples(), 0, config, bucket_count))
}

/// Batched strategy: fan batches out to the blocking pool, join in order.
pub async fn pixelize_batched(
    frame: &Frame,
    config: &RenderConfig,
    bucket_count: usize,
) -> RenderResult<Vec<PlacementRecord>> {
    config.validate()?;
    if frame.is_empty() {
        return Ok(Vec::new());
    }

    let batch_size = config.batch_size;
    let samples: Arc<[Sample]> = frame.shared_samples();
    let total = samples.len();
    let batch_count = total.div_ceil(batch_size);
    let in_flight = num_cpus::get().max(1);
    tracing::debug!(total, batch_size, batch_count, in_flight, "pixelizing in batches");

    let outputs: Vec<RenderResult<Vec<PlacementRecord>>> = stream::iter(0..batch_count)
        .map(|batch| {
            let samples = Arc::clone(&samples);
            let config = config.clone();
            async move {
                let start = batch * batch_size;
                let end = (start + batch_size).min(total);
                tokio::task::spawn_blocking(move || {
                    pixelize_range(&samples[start..end], start, &config, bucket_count)
                })
                .await
                .map_err(|e| RenderError::worker(format!("batch {batch} failed: {e}")))
            }
        })
        .buffered(in_flight)
        .collect()
        .await;

    let mut records = Vec::with_capacity(total);
    for output in outputs {
        records.extend(output?);
    }
    Ok(records)
}

/// Runs whichever strategy `config.strategy` names.
pub async fn pixelize_frame(
    frame: &Frame,
    config: &RenderConfig,
    bucket_count: usize,
) -> RenderResult<Vec<PlacementRecord>> {
    match config.strategy {
        ExecutionStrategy::Sequential => pixelize(frame, config, bucket_count),
        ExecutionStrategy::Batched => pixelize_batched(frame, config, bucket_count).await,
    }
}
