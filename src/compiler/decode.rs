//! Format-specific image decoding.
//!
//! The pipeline treats image bytes as an opaque payload; decoding here
//! only validates that the external tool actually produced the requested
//! format and extracts pixel dimensions for consumers. The original
//! bytes are kept, so two identical compilations compare byte-equal.

use super::error::CompileError;
use super::request::ImageFormat;

/// A decoded diagram image: validated bytes plus dimensions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiagramImage {
    pub format: ImageFormat,
    pub bytes: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

/// Decoder seam: one implementation per supported [`ImageFormat`].
pub trait ImageDecoder: Sync {
    /// Validate `bytes` and return (width, height).
    fn probe(&self, bytes: &[u8]) -> Result<(u32, u32), CompileError>;
}

struct RasterDecoder;

impl ImageDecoder for RasterDecoder {
    fn probe(&self, bytes: &[u8]) -> Result<(u32, u32), CompileError> {
        let img = image::load_from_memory(bytes).map_err(|e| CompileError::Decode {
            format: "raster",
            reason: e.to_string(),
        })?;
        Ok((img.width(), img.height()))
    }
}

struct VectorDecoder;

impl ImageDecoder for VectorDecoder {
    fn probe(&self, bytes: &[u8]) -> Result<(u32, u32), CompileError> {
        let tree = usvg::Tree::from_data(bytes, &usvg::Options::default()).map_err(|e| {
            CompileError::Decode {
                format: "vector",
                reason: e.to_string(),
            }
        })?;
        let size = tree.size();
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        Ok((size.width().ceil() as u32, size.height().ceil() as u32))
    }
}

/// Select the decoder for a format.
pub fn decoder_for(format: ImageFormat) -> &'static dyn ImageDecoder {
    match format {
        ImageFormat::Raster => &RasterDecoder,
        ImageFormat::Vector => &VectorDecoder,
    }
}

/// Decode `bytes` as `format`, keeping the original payload.
pub fn decode(format: ImageFormat, bytes: Vec<u8>) -> Result<DiagramImage, CompileError> {
    let (width, height) = decoder_for(format).probe(&bytes)?;
    Ok(DiagramImage {
        format,
        bytes,
        width,
        height,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let img = image::RgbaImage::new(width, height);
        let mut buf = Cursor::new(Vec::new());
        img.write_to(&mut buf, image::ImageFormat::Png).unwrap();
        buf.into_inner()
    }

    #[test]
    fn test_decode_raster() {
        let bytes = png_bytes(2, 3);
        let img = decode(ImageFormat::Raster, bytes.clone()).unwrap();
        assert_eq!((img.width, img.height), (2, 3));
        assert_eq!(img.bytes, bytes); // payload untouched
    }

    #[test]
    fn test_decode_vector() {
        let svg = br#"<svg xmlns="http://www.w3.org/2000/svg" width="40" height="20"/>"#;
        let img = decode(ImageFormat::Vector, svg.to_vec()).unwrap();
        assert_eq!((img.width, img.height), (40, 20));
    }

    #[test]
    fn test_decode_garbage_fails() {
        let err = decode(ImageFormat::Raster, b"not an image".to_vec()).unwrap_err();
        assert!(matches!(err, CompileError::Decode { .. }));

        let err = decode(ImageFormat::Vector, b"<html/>".to_vec()).unwrap_err();
        assert!(matches!(err, CompileError::Decode { .. }));
    }
}
