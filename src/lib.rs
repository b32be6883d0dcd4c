// THEORY:
// This file is the main entry point for the `entity_apple` library crate.
// It defines the public API exposed to external consumers (the `entity_apple`
// binary, or any host that owns a scene and a frame feed).
//
// The primary export is the `FrameRenderer` (and its actor wrapper, the
// `RenderService`): hand it a frame, it decides which prefab goes where and
// rebuilds the spawned instance set through an `InstanceSpawner`. The
// per-sample math (`brightness`, `geometry`) and the per-frame passes
// (`pixelizer`, `reconciler`) live in `core_modules` and can be used on their
// own.

pub mod config;
pub mod core_modules;
pub mod error;
pub mod frame_source;
pub mod parallel_pipeline;
pub mod pipeline;

pub use config::{AppConfig, ExecutionStrategy, PlaybackConfig, RenderConfig};
pub use error::{RenderError, RenderResult};
pub use frame_source::{Frame, FrameSource, ImageSequence};
pub use parallel_pipeline::{RenderHandle, RenderService};
pub use pipeline::FrameRenderer;
