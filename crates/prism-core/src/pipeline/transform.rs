//! Transform dispatch: maps a [`TransformKind`] to a pixel operation.
//!
//! Workers only see the [`Transform`] trait. [`ImageTransformer`] is the real
//! implementation: a table from kind to a plain function over a decoded
//! image, wrapped with decode and encode through the `image` crate.

use image::DynamicImage;
use std::collections::HashMap;
use std::path::Path;

use crate::config::TransformConfig;
use crate::error::{PipelineError, PipelineResult};
use crate::types::TransformKind;

/// Applies a transform kind to one source file, writing the destination.
pub trait Transform: Send + Sync {
    fn apply(&self, kind: TransformKind, source: &Path, destination: &Path) -> PipelineResult<()>;
}

impl<F> Transform for F
where
    F: Fn(TransformKind, &Path, &Path) -> PipelineResult<()> + Send + Sync,
{
    fn apply(&self, kind: TransformKind, source: &Path, destination: &Path) -> PipelineResult<()> {
        self(kind, source, destination)
    }
}

/// A pixel operation bound to one transform kind.
pub type PixelOp = fn(DynamicImage, &TransformConfig) -> DynamicImage;

/// Colour negative. Alpha is left untouched.
pub fn invert(mut image: DynamicImage, _config: &TransformConfig) -> DynamicImage {
    image.invert();
    image
}

/// Gaussian blur with `config.blur_radius` as sigma.
pub fn blur(image: DynamicImage, config: &TransformConfig) -> DynamicImage {
    image.blur(config.blur_radius)
}

/// Horizontal mirror.
pub fn mirror(image: DynamicImage, _config: &TransformConfig) -> DynamicImage {
    image.fliph()
}

/// File-to-file transformer backed by a kind → [`PixelOp`] table.
pub struct ImageTransformer {
    config: TransformConfig,
    ops: HashMap<TransformKind, PixelOp>,
}

impl ImageTransformer {
    /// Create a transformer with every built-in kind bound.
    pub fn new(config: TransformConfig) -> Self {
        Self::empty(config)
            .bind(TransformKind::Invert, invert)
            .bind(TransformKind::Blur, blur)
            .bind(TransformKind::Mirror, mirror)
    }

    /// Create a transformer with no kind bound.
    pub fn empty(config: TransformConfig) -> Self {
        Self {
            config,
            ops: HashMap::new(),
        }
    }

    /// Bind (or rebind) `kind` to `op`.
    pub fn bind(mut self, kind: TransformKind, op: PixelOp) -> Self {
        self.ops.insert(kind, op);
        self
    }

    /// Kinds this transformer can apply, in declaration order.
    pub fn supported_kinds(&self) -> Vec<TransformKind> {
        TransformKind::ALL
            .into_iter()
            .filter(|kind| self.ops.contains_key(kind))
            .collect()
    }

    /// Apply `kind` to an in-memory image.
    pub fn apply_to_image(
        &self,
        kind: TransformKind,
        image: DynamicImage,
    ) -> PipelineResult<DynamicImage> {
        let op = self
            .ops
            .get(&kind)
            .ok_or_else(|| PipelineError::unsupported(kind))?;
        Ok(op(image, &self.config))
    }
}

impl Transform for ImageTransformer {
    fn apply(&self, kind: TransformKind, source: &Path, destination: &Path) -> PipelineResult<()> {
        // Reject unknown kinds before touching the filesystem
        if !self.ops.contains_key(&kind) {
            return Err(PipelineError::unsupported(kind));
        }

        let start = std::time::Instant::now();
        let image = image::open(source).map_err(|e| {
            PipelineError::transform_failure(source, format!("decode: {e}"))
        })?;
        tracing::trace!("  Decode: {:?}", start.elapsed());

        let output = self.apply_to_image(kind, image)?;

        // JPEG has no alpha channel
        let output = if is_jpeg(destination) {
            DynamicImage::ImageRgb8(output.to_rgb8())
        } else {
            output
        };

        output.save(destination).map_err(|e| {
            PipelineError::transform_failure(destination, format!("encode: {e}"))
        })?;
        tracing::trace!("  {} total: {:?}", kind, start.elapsed());
        Ok(())
    }
}

fn is_jpeg(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| matches!(ext.to_lowercase().as_str(), "jpg" | "jpeg"))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GenericImageView, Rgba, RgbaImage};

    fn sample() -> DynamicImage {
        let mut img = RgbaImage::new(4, 2);
        img.put_pixel(0, 0, Rgba([255, 0, 0, 255]));
        img.put_pixel(3, 0, Rgba([0, 0, 255, 128]));
        DynamicImage::ImageRgba8(img)
    }

    #[test]
    fn test_invert_keeps_alpha() {
        let out = invert(sample(), &TransformConfig::default());
        assert_eq!(out.get_pixel(0, 0), Rgba([0, 255, 255, 255]));
        assert_eq!(out.get_pixel(3, 0), Rgba([255, 255, 0, 128]));
    }

    #[test]
    fn test_mirror_flips_horizontally() {
        let out = mirror(sample(), &TransformConfig::default());
        assert_eq!(out.get_pixel(3, 0), Rgba([255, 0, 0, 255]));
        assert_eq!(out.get_pixel(0, 0), Rgba([0, 0, 255, 128]));
    }

    #[test]
    fn test_blur_keeps_dimensions() {
        let out = blur(sample(), &TransformConfig::default());
        assert_eq!(out.dimensions(), (4, 2));
    }

    #[test]
    fn test_supported_kinds() {
        let full = ImageTransformer::new(TransformConfig::default());
        assert_eq!(full.supported_kinds(), TransformKind::ALL.to_vec());

        let partial =
            ImageTransformer::empty(TransformConfig::default()).bind(TransformKind::Mirror, mirror);
        assert_eq!(partial.supported_kinds(), vec![TransformKind::Mirror]);
    }

    #[test]
    fn test_unbound_kind_is_unsupported() {
        let transformer = ImageTransformer::empty(TransformConfig::default());
        let err = transformer
            .apply(
                TransformKind::Blur,
                Path::new("/does/not/matter.png"),
                Path::new("/out.png"),
            )
            .unwrap_err();
        assert_eq!(err, PipelineError::unsupported(TransformKind::Blur));
    }

    #[test]
    fn test_apply_round_trip_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("in.png");
        let destination = dir.path().join("out.png");
        sample().save(&source).unwrap();

        let transformer = ImageTransformer::new(TransformConfig::default());
        transformer
            .apply(TransformKind::Invert, &source, &destination)
            .unwrap();

        let written = image::open(&destination).unwrap();
        assert_eq!(written.get_pixel(0, 0), Rgba([0, 255, 255, 255]));
    }

    #[test]
    fn test_apply_writes_jpeg_without_alpha() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("in.png");
        let destination = dir.path().join("out.jpg");
        sample().save(&source).unwrap();

        ImageTransformer::new(TransformConfig::default())
            .apply(TransformKind::Mirror, &source, &destination)
            .unwrap();
        assert!(destination.exists());
    }

    #[test]
    fn test_apply_reports_decode_failure() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("broken.png");
        std::fs::write(&source, b"not an image").unwrap();

        let err = ImageTransformer::new(TransformConfig::default())
            .apply(TransformKind::Invert, &source, &dir.path().join("out.png"))
            .unwrap_err();
        match err {
            PipelineError::TransformFailure { path, message } => {
                assert_eq!(path, source);
                assert!(message.starts_with("decode"));
            }
            other => panic!("expected TransformFailure, got {other:?}"),
        }
    }

    #[test]
    fn test_closure_implements_transform() {
        let always_ok = |_: TransformKind, _: &Path, _: &Path| -> PipelineResult<()> { Ok(()) };
        assert!(always_ok
            .apply(TransformKind::Invert, Path::new("a"), Path::new("b"))
            .is_ok());
    }
}
