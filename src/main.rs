// Plays a directory of frame images through the renderer against an
// in-memory scene and logs the live instance ("apple") count per frame.

use anyhow::Context as _;
use clap::Parser;
use entity_apple::core_modules::bucket_set::BucketSet;
use entity_apple::core_modules::geometry::camera_position;
use entity_apple::core_modules::memory_scene::MemoryScene;
use entity_apple::core_modules::utils::image_helper::image_helper::save_bucket_preview;
use entity_apple::{
    AppConfig, ExecutionStrategy, FrameRenderer, FrameSource, ImageSequence, RenderError,
    RenderResult, RenderService,
};
use std::path::PathBuf;
use tokio::task::JoinSet;
use tokio::time::MissedTickBehavior;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "entity_apple", version)]
struct Cli {
    /// Directory of frame images, played in file name order.
    #[arg(long)]
    frames: PathBuf,

    /// TOML config. Built-in defaults are used when omitted.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Pixelize in parallel batches regardless of the config.
    #[arg(long)]
    batched: bool,

    /// Restart the sequence when it ends.
    #[arg(long = "loop")]
    looping: bool,

    /// Stop after this many frames.
    #[arg(long)]
    max_frames: Option<u64>,

    /// Write a bucket preview PNG for every frame into this directory.
    #[arg(long)]
    preview_dir: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();

    let mut app = match &cli.config {
        Some(path) => AppConfig::load(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => AppConfig::default(),
    };
    if cli.batched {
        app.render.strategy = ExecutionStrategy::Batched;
    }
    if cli.looping {
        app.playback.looping = true;
    }
    app.validate()?;

    if let Some(dir) = &cli.preview_dir {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("creating preview dir {}", dir.display()))?;
    }

    let mut source = ImageSequence::open(
        &cli.frames,
        app.render.grid_width,
        app.render.grid_height,
        app.playback.looping,
    )?;

    let buckets = BucketSet::new(app.prefabs.clone())?;
    let bucket_count = app.render.resolved_bucket_count(buckets.len());
    let renderer = FrameRenderer::new(app.render.clone(), buckets, MemoryScene::<String>::new())?;
    tracing::info!(camera = ?camera_position(&app.render), "camera placed over grid");

    let service = RenderService::spawn(renderer);
    let handle = service.handle();

    let mut ticker = tokio::time::interval(app.playback.frame_interval());
    ticker.set_missed_tick_behavior(if app.playback.skip_on_drop {
        MissedTickBehavior::Skip
    } else {
        MissedTickBehavior::Burst
    });

    let mut in_flight: JoinSet<RenderResult<usize>> = JoinSet::new();
    let mut played = 0u64;
    loop {
        while let Some(joined) = in_flight.try_join_next() {
            keep_playing(joined.context("frame cycle task panicked")?)?;
        }

        tokio::select! {
            _ = ticker.tick() => {}
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("interrupted");
                break;
            }
        }

        let Some(next) = source.next_frame() else {
            break;
        };
        let frame = match next {
            Ok(frame) => frame,
            Err(err) => {
                tracing::warn!(%err, "skipping unreadable frame");
                continue;
            }
        };

        if let Some(dir) = &cli.preview_dir {
            let path = dir.join(format!("frame_{played:05}.png"));
            save_bucket_preview(&path, &frame, &app.render, bucket_count)
                .with_context(|| format!("writing preview {}", path.display()))?;
        }

        if app.playback.skip_on_drop {
            if let Some(pending) = handle.try_submit(frame)? {
                in_flight.spawn(pending.wait());
            }
        } else {
            keep_playing(handle.submit(frame).await)?;
        }

        played += 1;
        tracing::info!(frame = played, apple_count = handle.instance_count(), "Apple Count");

        if cli.max_frames.is_some_and(|max| played >= max) {
            break;
        }
    }

    while let Some(joined) = in_flight.join_next().await {
        keep_playing(joined.context("frame cycle task panicked")?)?;
    }
    handle.stop().await?;
    let renderer = service.shutdown().await?;
    let scene = renderer.spawner();
    tracing::info!(
        frames = renderer.frames_rendered(),
        created = scene.created_total(),
        destroyed = scene.destroyed_total(),
        "playback finished"
    );
    Ok(())
}

/// A failed cycle only costs its own frame; anything else ends playback.
fn keep_playing(cycle: RenderResult<usize>) -> Result<(), RenderError> {
    match cycle {
        Ok(_) => Ok(()),
        Err(err) if err.is_cycle_local() => {
            tracing::warn!(%err, "frame cycle failed, continuing");
            Ok(())
        }
        Err(err) => Err(err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cycle_local_errors_keep_playback_going() {
        assert!(keep_playing(Ok(12)).is_ok());
        let mismatch = RenderError::ConfigMismatch {
            index: 4,
            bucket_count: 4,
        };
        assert!(keep_playing(Err(mismatch)).is_ok());
        assert!(keep_playing(Err(RenderError::worker("batch 0 failed"))).is_ok());
        assert!(matches!(
            keep_playing(Err(RenderError::degenerate("grid must be at least 1x1"))),
            Err(RenderError::DegenerateConfig(_))
        ));
    }
}
