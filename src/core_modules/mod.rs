pub mod brightness;
pub mod bucket_set;
pub mod geometry;
pub mod memory_scene;
pub mod pixelizer;
pub mod reconciler;
pub mod sample;
pub mod utils;
