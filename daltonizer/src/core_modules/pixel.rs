// THEORY:
// The `Pixel` module is the smallest unit of work in the daltonizer. A `Pixel`
// is a "dumb" RGBA container; `transform` is the single place where one pixel
// travels through the whole correction pipeline:
//
//   linearize -> RGB->LMS -> simulate deficiency -> LMS->RGB -> error vs. original
//   -> compensate -> delinearize
//
// Key principles:
// 1)  Single-pixel scope: `transform` never looks at neighbors; images are just
//     this function mapped over a buffer, so file order and partitioning cannot
//     change the result.
// 2)  Alpha is not gamma-encoded and is never transformed. It is copied through.
// 3)  No hidden state: the matrices arrive as a plain value built once per run.

pub mod pixel {
    use crate::core_modules::color_space::color_space::{
        LinearColor, delinearize, linearize_rgb, lms_to_rgb, multiply, RGB_TO_LMS,
    };
    use crate::core_modules::deficiency::deficiency::CorrectionMatrices;

    pub type Channel = u8;
    pub type Bytes = Vec<Channel>;

    pub const CHANNELS: usize = 4;

    /// A "dumb" data container representing a single RGBA pixel.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct Pixel {
        /// The red channel value (0-255).
        pub red: Channel,
        /// The green channel value (0-255).
        pub green: Channel,
        /// The blue channel value (0-255).
        pub blue: Channel,
        /// The alpha (transparency) channel value (0-255).
        pub alpha: Channel,
    }

    impl Pixel {
        pub fn new(red: Channel, green: Channel, blue: Channel, alpha: Channel) -> Self {
            Pixel {
                red,
                green,
                blue,
                alpha,
            }
        }

        /// Gamma-decoded R, G, B in [0, 1].
        pub fn linear(&self) -> LinearColor {
            linearize_rgb(self.red, self.green, self.blue)
        }

        /// Largest per-channel difference to `other`, alpha included.
        #[cfg(test)]
        pub fn max_channel_delta(&self, other: &Pixel) -> Channel {
            let a: [Channel; CHANNELS] = (*self).into();
            let b: [Channel; CHANNELS] = (*other).into();
            a.iter().zip(b.iter()).map(|(x, y)| x.abs_diff(*y)).max().unwrap_or(0)
        }
    }

    impl From<[Channel; CHANNELS]> for Pixel {
        fn from(bytes: [Channel; CHANNELS]) -> Self {
            Pixel::new(bytes[0], bytes[1], bytes[2], bytes[3])
        }
    }

    impl From<Pixel> for [Channel; CHANNELS] {
        fn from(pixel: Pixel) -> Self {
            [pixel.red, pixel.green, pixel.blue, pixel.alpha]
        }
    }

    impl From<Pixel> for Bytes {
        fn from(pixel: Pixel) -> Self {
            vec![pixel.red, pixel.green, pixel.blue, pixel.alpha]
        }
    }

    /// Runs one pixel through the full daltonization pipeline.
    pub fn transform(pixel: Pixel, matrices: &CorrectionMatrices) -> Pixel {
        let linear = pixel.linear();
        let lms = multiply(&linear, &RGB_TO_LMS);
        let simulated_lms = multiply(&lms, &matrices.simulation);
        let simulated_rgb = multiply(&simulated_lms, lms_to_rgb());

        let error = [
            linear[0] - simulated_rgb[0],
            linear[1] - simulated_rgb[1],
            linear[2] - simulated_rgb[2],
        ];
        let compensation = multiply(&error, &matrices.compensation);

        Pixel {
            red: delinearize(linear[0] + compensation[0]),
            green: delinearize(linear[1] + compensation[1]),
            blue: delinearize(linear[2] + compensation[2]),
            alpha: pixel.alpha,
        }
    }

    /// In-place variant over a packed RGBA buffer.
    pub fn transform_buffer(buffer: &mut [Channel], matrices: &CorrectionMatrices) {
        for bytes in buffer.chunks_exact_mut(CHANNELS) {
            let source = Pixel::new(bytes[0], bytes[1], bytes[2], bytes[3]);
            let corrected: [Channel; CHANNELS] = transform(source, matrices).into();
            bytes.copy_from_slice(&corrected);
        }
    }
}
