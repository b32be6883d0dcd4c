pub mod image_helper {
    use crate::config::RenderConfig;
    use crate::core_modules::brightness::brightness::classify;
    use crate::frame_source::Frame;
    use image::ImageEncoder;
    use std::path::Path;

    /// Renders each sample's final bucket as a gray level, bucket 0 black and
    /// the last bucket white. Suppressed samples are black.
    pub fn bucket_levels(frame: &Frame, config: &RenderConfig, bucket_count: usize) -> Vec<u8> {
        let top = bucket_count.saturating_sub(1).max(1) as f32;
        frame
            .samples()
            .iter()
            .map(|sample| {
                let class = classify(sample, bucket_count, config.suppress_darkest, config.invert_buckets);
                if class.include {
                    (class.bucket_index as f32 / top * 255.0).round() as u8
                } else {
                    0
                }
            })
            .collect()
    }

    /// Writes the bucket quantization of `frame` as a grayscale PNG, top row first.
    pub fn save_bucket_preview(
        path: impl AsRef<Path>,
        frame: &Frame,
        config: &RenderConfig,
        bucket_count: usize,
    ) -> Result<(), image::error::ImageError> {
        let levels = bucket_levels(frame, config, bucket_count);
        let width = frame.width() as usize;
        let mut buffer = Vec::with_capacity(levels.len());
        if width > 0 {
            // frames are stored bottom row first
            for row in levels.chunks(width).rev() {
                buffer.extend_from_slice(row);
            }
        }

        let output = std::fs::File::create(path)?;
        let encoder = image::codecs::png::PngEncoder::new(output);
        encoder.write_image(&buffer, frame.width(), frame.height(), image::ExtendedColorType::L8)?;

        Ok(())
    }
}
