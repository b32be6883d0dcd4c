// THEORY:
// The `Sample` module is the most fundamental unit of the renderer. It is a
// "dumb" data container for a single frame pixel plus the one heuristic the
// renderer needs from it: perceived brightness.
//
// Key principles:
// 1) Single-sample scope: nothing here knows about neighbours, grids or frames.
// 2) Byte channels: samples are stored as 0..255 bytes, the range the luma
//    weights are defined on. Normalized float colours are converted on entry.
// 3) Alpha is dropped: a spawned instance is either there or not, so
//    transparency has no meaning downstream.

pub mod sample {
    pub type Byte = u8;
    pub type Channel = Byte;
    pub type NormalizedChannel = f32;
    pub type Luminance = f32;

    const RGB_CHANNELS: usize = 3;
    const RGBA_CHANNELS: usize = 4;

    /// A single RGB frame pixel.
    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
    pub struct Sample {
        /// The red channel value (0-255).
        pub red: Channel,
        /// The green channel value (0-255).
        pub green: Channel,
        /// The blue channel value (0-255).
        pub blue: Channel,
    }

    impl Sample {
        pub const BLACK: Sample = Sample::new(0, 0, 0);
        pub const WHITE: Sample = Sample::new(255, 255, 255);

        pub const fn new(red: Channel, green: Channel, blue: Channel) -> Self {
            Sample { red, green, blue }
        }

        pub const fn gray(level: Channel) -> Self {
            Sample::new(level, level, level)
        }

        /// Builds a sample from 0.0..=1.0 channels. Out-of-range values saturate.
        pub fn from_normalized(
            red: NormalizedChannel,
            green: NormalizedChannel,
            blue: NormalizedChannel,
        ) -> Self {
            let to_byte = |v: NormalizedChannel| (v.clamp(0.0, 1.0) * 255.0).round() as Channel;
            Sample::new(to_byte(red), to_byte(green), to_byte(blue))
        }

        /// Luminance estimate (Rec. 601 luma) on 0..255 channels.
        pub fn luminance(&self) -> Luminance {
            0.299_f32 * self.red as f32 + 0.587_f32 * self.green as f32 + 0.114_f32 * self.blue as f32
        }

        /// Reads a sample from a 3 (RGB) or 4 (RGBA) byte pixel.
        pub fn from_bytes(bytes: &[Byte]) -> Option<Self> {
            match bytes.len() {
                RGB_CHANNELS | RGBA_CHANNELS => Some(Sample::new(bytes[0], bytes[1], bytes[2])),
                _ => None,
            }
        }
    }

    impl From<[Byte; 3]> for Sample {
        fn from(rgb: [Byte; 3]) -> Self {
            Sample::new(rgb[0], rgb[1], rgb[2])
        }
    }

    impl From<image::Rgba<u8>> for Sample {
        fn from(pixel: image::Rgba<u8>) -> Self {
            Sample::new(pixel.0[0], pixel.0[1], pixel.0[2])
        }
    }

    impl From<Sample> for [Byte; 3] {
        fn from(sample: Sample) -> Self {
            [sample.red, sample.green, sample.blue]
        }
    }
}
