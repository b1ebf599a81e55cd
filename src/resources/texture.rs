//! Texture loading and upload

use crate::backend::traits::*;
use crate::backend::types::*;
use image::{DynamicImage, GenericImageView};
use std::path::Path;
use thiserror::Error;

/// Texture loading error
#[derive(Error, Debug)]
pub enum TextureError {
    #[error("Failed to decode '{name}': {source}")]
    Decode {
        name: String,
        #[source]
        source: image::ImageError,
    },
    #[error("Texture '{name}' is empty")]
    Empty { name: String },
    #[error("Texture '{name}' has {actual} bytes, expected {expected}")]
    SizeMismatch {
        name: String,
        expected: usize,
        actual: usize,
    },
}

/// Decoded 8-bit RGBA texels, still sRGB-encoded
#[derive(Debug, Clone, PartialEq)]
pub struct TextureData {
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>,
    pub name: String,
}

impl TextureData {
    /// Load texture from file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, TextureError> {
        let path = path.as_ref();
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("unknown")
            .to_string();

        let img = image::open(path).map_err(|source| TextureError::Decode {
            name: name.clone(),
            source,
        })?;
        Self::from_image(img, &name)
    }

    /// Load texture from encoded bytes (PNG, JPEG, ...)
    pub fn from_bytes(bytes: &[u8], name: &str) -> Result<Self, TextureError> {
        let img = image::load_from_memory(bytes).map_err(|source| TextureError::Decode {
            name: name.to_string(),
            source,
        })?;
        Self::from_image(img, name)
    }

    /// Wrap raw RGBA8 texels
    pub fn from_rgba8(width: u32, height: u32, data: Vec<u8>, name: &str) -> Result<Self, TextureError> {
        if width == 0 || height == 0 {
            return Err(TextureError::Empty {
                name: name.to_string(),
            });
        }
        let expected = width as usize * height as usize * 4;
        if data.len() != expected {
            return Err(TextureError::SizeMismatch {
                name: name.to_string(),
                expected,
                actual: data.len(),
            });
        }
        Ok(Self {
            width,
            height,
            data,
            name: name.to_string(),
        })
    }

    fn from_image(img: DynamicImage, name: &str) -> Result<Self, TextureError> {
        let (width, height) = img.dimensions();
        Self::from_rgba8(width, height, img.to_rgba8().into_raw(), name)
    }

    /// Create a solid color texture
    pub fn solid_color(color: [u8; 4], name: &str) -> Self {
        Self {
            width: 1,
            height: 1,
            data: color.to_vec(),
            name: name.to_string(),
        }
    }

    /// Texel at integer coordinates, row 0 at the top.
    ///
    /// Coordinates clamp to the image. An empty image, or one whose data is
    /// shorter than its dimensions claim, reads as transparent black.
    pub fn texel(&self, x: u32, y: u32) -> [u8; 4] {
        let index = (y.min(self.height.saturating_sub(1)) as usize * self.width as usize
            + x.min(self.width.saturating_sub(1)) as usize)
            * 4;
        match self.data.get(index..index + 4) {
            Some(&[r, g, b, a]) if self.width > 0 && self.height > 0 => [r, g, b, a],
            _ => [0; 4],
        }
    }
}

/// GPU texture with its default view
#[derive(Debug, Clone, PartialEq)]
pub struct GpuTexture {
    pub handle: TextureHandle,
    pub view: TextureViewHandle,
    pub width: u32,
    pub height: u32,
    pub name: String,
}

impl GpuTexture {
    /// Upload sRGB-encoded texels under a linear format.
    ///
    /// The program decodes after sampling, so the hardware must not.
    pub fn create<B: GraphicsBackend + ?Sized>(
        backend: &mut B,
        data: &TextureData,
    ) -> BackendResult<Self> {
        let handle = backend.create_texture(&TextureDescriptor {
            label: Some(data.name.clone()),
            width: data.width,
            height: data.height,
            format: TextureFormat::Rgba8Unorm,
            usage: TextureUsage::TEXTURE_BINDING | TextureUsage::COPY_DST,
        })?;

        let view = match backend.create_texture_view(handle) {
            Ok(view) => view,
            Err(e) => {
                backend.destroy_texture(handle);
                return Err(e);
            }
        };
        backend.write_texture(handle, &data.data, data.width, data.height);

        Ok(Self {
            handle,
            view,
            width: data.width,
            height: data.height,
            name: data.name.clone(),
        })
    }

    pub fn destroy<B: GraphicsBackend + ?Sized>(self, backend: &mut B) {
        backend.destroy_texture(self.handle);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::dummy::DummyBackend;

    fn png_bytes() -> Vec<u8> {
        let img = DynamicImage::ImageRgba8(image::RgbaImage::from_pixel(
            2,
            1,
            image::Rgba([10, 20, 30, 255]),
        ));
        let mut bytes = std::io::Cursor::new(Vec::new());
        img.write_to(&mut bytes, image::ImageOutputFormat::Png).unwrap();
        bytes.into_inner()
    }

    #[test]
    fn decodes_png() {
        let texture = TextureData::from_bytes(&png_bytes(), "tiny").unwrap();
        assert_eq!((texture.width, texture.height), (2, 1));
        assert_eq!(texture.texel(1, 0), [10, 20, 30, 255]);
    }

    #[test]
    fn texel_clamps_to_the_image() {
        let texture = TextureData::from_rgba8(2, 1, vec![1, 2, 3, 4, 5, 6, 7, 8], "pair").unwrap();
        assert_eq!(texture.texel(9, 9), [5, 6, 7, 8]);
    }

    #[test]
    fn malformed_texture_reads_as_black() {
        let empty = TextureData {
            width: 4,
            height: 0,
            data: Vec::new(),
            name: "empty".into(),
        };
        assert_eq!(empty.texel(0, 0), [0; 4]);

        let short = TextureData {
            width: 2,
            height: 2,
            data: vec![255; 8],
            name: "short".into(),
        };
        assert_eq!(short.texel(0, 0), [255; 4]);
        assert_eq!(short.texel(1, 1), [0; 4]);
    }

    #[test]
    fn garbage_is_a_decode_error() {
        let err = TextureData::from_bytes(b"not an image", "garbage").unwrap_err();
        assert!(matches!(err, TextureError::Decode { .. }));
        assert!(err.to_string().contains("garbage"));
    }

    #[test]
    fn raw_size_is_checked() {
        let err = TextureData::from_rgba8(2, 2, vec![0; 4], "short").unwrap_err();
        assert!(matches!(
            err,
            TextureError::SizeMismatch {
                expected: 16,
                actual: 4,
                ..
            }
        ));
        assert!(matches!(
            TextureData::from_rgba8(0, 2, Vec::new(), "empty"),
            Err(TextureError::Empty { .. })
        ));
    }

    #[test]
    fn uploads_with_linear_format() {
        let mut backend = DummyBackend::new(8, 8);
        let data = TextureData::solid_color([1, 2, 3, 4], "solid");
        let gpu = GpuTexture::create(&mut backend, &data).unwrap();

        let stored = backend.view_texture(gpu.view).unwrap();
        assert_eq!(stored.descriptor.format, TextureFormat::Rgba8Unorm);
        assert_eq!(stored.data.as_deref(), Some(&[1u8, 2, 3, 4][..]));
    }
}
