// THEORY:
// An `ImageJob` owns exactly one file for its whole lifetime: decode once, map
// `transform` over every pixel in row-major order, then overwrite the file in
// place. Nothing is written until the whole buffer is done, so a failed decode
// leaves the original untouched.
//
// Files without the `.png` suffix are skipped, not rejected. The batch still
// counts them as processed. Reading and writing pixels goes through an
// `ImageCodec`; `PngCodec` is the one used outside of tests.

use crate::core_modules::deficiency::deficiency::CorrectionMatrices;
use crate::core_modules::pixel::pixel::transform_buffer;
use crate::error::{DaltonizeError, Result};
use image::RgbaImage;
use log::debug;
use std::path::{Path, PathBuf};

/// Case-sensitive suffix of the only format the daltonizer rewrites.
pub const IMAGE_EXTENSION: &str = ".png";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobOutcome {
    /// The image was decoded, corrected and written back.
    Transformed { width: u32, height: u32 },
    /// The file name does not end in [`IMAGE_EXTENSION`]; left as is.
    Skipped,
}

/// Loads and stores RGBA pixel grids for an `ImageJob`.
pub trait ImageCodec: Send + Sync {
    fn decode(&self, path: &Path) -> Result<RgbaImage>;

    fn encode(&self, path: &Path, image: &RgbaImage) -> Result<()>;
}

/// PNG through the `image` crate, always written back as RGBA8.
#[derive(Debug, Default, Clone, Copy)]
pub struct PngCodec;

impl ImageCodec for PngCodec {
    fn decode(&self, path: &Path) -> Result<RgbaImage> {
        image::open(path)
            .map(|image| image.to_rgba8())
            .map_err(|source| DaltonizeError::Decode {
                path: path.to_path_buf(),
                source,
            })
    }

    fn encode(&self, path: &Path, image: &RgbaImage) -> Result<()> {
        image
            .save_with_format(path, image::ImageFormat::Png)
            .map_err(|source| DaltonizeError::Encode {
                path: path.to_path_buf(),
                source,
            })
    }
}

#[derive(Debug, Clone)]
pub struct ImageJob {
    path: PathBuf,
}

impl ImageJob {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_image(&self) -> bool {
        is_image_path(&self.path)
    }

    pub fn run(&self, matrices: &CorrectionMatrices) -> Result<JobOutcome> {
        self.run_with(matrices, &PngCodec)
    }

    pub fn run_with(
        &self,
        matrices: &CorrectionMatrices,
        codec: &dyn ImageCodec,
    ) -> Result<JobOutcome> {
        if !self.is_image() {
            debug!("skipping {}", self.path.display());
            return Ok(JobOutcome::Skipped);
        }

        let mut image = codec.decode(&self.path)?;
        let (width, height) = image.dimensions();

        transform_buffer(&mut image, matrices);

        codec.encode(&self.path, &image)?;

        debug!("corrected {} ({}x{})", self.path.display(), width, height);
        Ok(JobOutcome::Transformed { width, height })
    }
}

/// Literal suffix match on the full path text, as written on disk.
pub fn is_image_path(path: &Path) -> bool {
    path.to_string_lossy().ends_with(IMAGE_EXTENSION)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core_modules::deficiency::deficiency::{DaltonizeConfig, Deficiency, Strength};
    use image::Rgba;

    /// Decodes normally but refuses every write.
    struct ReadOnlyCodec;

    impl ImageCodec for ReadOnlyCodec {
        fn decode(&self, path: &Path) -> Result<RgbaImage> {
            PngCodec.decode(path)
        }

        fn encode(&self, path: &Path, _image: &RgbaImage) -> Result<()> {
            Err(DaltonizeError::Encode {
                path: path.to_path_buf(),
                source: image::ImageError::IoError(std::io::Error::new(
                    std::io::ErrorKind::PermissionDenied,
                    "read-only",
                )),
            })
        }
    }

    fn matrices(kind: Deficiency, strength: u8) -> CorrectionMatrices {
        DaltonizeConfig::new(kind, Strength::new(strength).unwrap()).matrices()
    }

    #[test]
    fn extension_match_is_case_sensitive_and_literal() {
        assert!(is_image_path(Path::new("pack/textures/stone.png")));
        assert!(!is_image_path(Path::new("pack/textures/stone.PNG")));
        assert!(!is_image_path(Path::new("pack/textures/stone.png.mcmeta")));
        assert!(!is_image_path(Path::new("pack/pack.mcmeta")));
        assert!(!is_image_path(Path::new("png")));
    }

    #[test]
    fn transforms_png_in_place() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("red.png");
        RgbaImage::from_pixel(2, 3, Rgba([255, 0, 0, 255])).save(&path).unwrap();

        let outcome = ImageJob::new(&path)
            .run(&matrices(Deficiency::Deuteranopia, 100))
            .unwrap();
        assert_eq!(outcome, JobOutcome::Transformed { width: 2, height: 3 });

        let written = image::open(&path).unwrap().to_rgba8();
        assert_eq!(written.dimensions(), (2, 3));
        assert!(written.pixels().all(|p| *p == Rgba([255, 255, 159, 255])));
    }

    #[test]
    fn skips_other_extensions_without_touching_them() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.txt");
        std::fs::write(&path, b"not an image").unwrap();

        let outcome = ImageJob::new(&path)
            .run(&matrices(Deficiency::Protanopia, 100))
            .unwrap();
        assert_eq!(outcome, JobOutcome::Skipped);
        assert_eq!(std::fs::read(&path).unwrap(), b"not an image");
    }

    #[test]
    fn corrupt_png_is_a_decode_error_and_left_alone() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.png");
        std::fs::write(&path, b"definitely not png data").unwrap();

        let err = ImageJob::new(&path)
            .run(&matrices(Deficiency::Tritanopia, 50))
            .unwrap_err();
        assert!(matches!(err, DaltonizeError::Decode { .. }));
        assert!(err.is_recoverable());
        assert_eq!(std::fs::read(&path).unwrap(), b"definitely not png data");
    }

    #[test]
    fn failed_write_is_an_encode_error_and_left_alone() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("locked.png");
        RgbaImage::from_pixel(1, 1, Rgba([255, 0, 0, 255])).save(&path).unwrap();
        let before = std::fs::read(&path).unwrap();

        let err = ImageJob::new(&path)
            .run_with(&matrices(Deficiency::Deuteranopia, 100), &ReadOnlyCodec)
            .unwrap_err();
        assert!(matches!(err, DaltonizeError::Encode { .. }));
        assert!(err.is_recoverable());
        assert_eq!(std::fs::read(&path).unwrap(), before);
    }

    #[test]
    fn zero_strength_keeps_pixels() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mixed.png");
        let mut source = RgbaImage::new(4, 4);
        for (x, y, pixel) in source.enumerate_pixels_mut() {
            *pixel = Rgba([(x * 60) as u8, (y * 60) as u8, 128, 255 - (x * 10) as u8]);
        }
        source.save(&path).unwrap();

        ImageJob::new(&path)
            .run(&matrices(Deficiency::Protanopia, 0))
            .unwrap();
        let written = image::open(&path).unwrap().to_rgba8();
        for (before, after) in source.pixels().zip(written.pixels()) {
            for channel in 0..4 {
                assert!(before.0[channel].abs_diff(after.0[channel]) <= 1);
            }
        }
    }
}
