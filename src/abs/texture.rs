//! Structs and functions for handling textures.
//!
//! The module provides the [`Texture`] struct which is a CPU representation of a GPU texture,
//! the non-owning [`TextureHandle`] describing it, and the [`TextureLoader`] cache that
//! owns every loaded texture.

use std::{borrow::Cow, path::Path, rc::Rc};

use image::{DynamicImage, GenericImageView};

use super::{GpuContext, ResourceCache, gpu::Gpu};
use crate::error::{Error, Result};

/// Pixel layout of texture storage and of uploaded data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextureFormat {
    Red,
    Rg,
    Rgb,
    Rgba,
    Depth,
}

impl TextureFormat {
    pub fn gl(self) -> u32 {
        match self {
            Self::Red => glow::RED,
            Self::Rg => glow::RG,
            Self::Rgb => glow::RGB,
            Self::Rgba => glow::RGBA,
            Self::Depth => glow::DEPTH_COMPONENT,
        }
    }

    /// The format matching an image with the given channel count, if there is one.
    pub fn from_channels(channels: u8) -> Option<Self> {
        match channels {
            1 => Some(Self::Red),
            3 => Some(Self::Rgb),
            4 => Some(Self::Rgba),
            _ => None,
        }
    }
}

/// Minification and magnification filters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextureFilter {
    Nearest,
    Linear,
    NearestMipmapNearest,
    LinearMipmapNearest,
    NearestMipmapLinear,
    LinearMipmapLinear,
}

impl TextureFilter {
    pub fn gl(self) -> u32 {
        match self {
            Self::Nearest => glow::NEAREST,
            Self::Linear => glow::LINEAR,
            Self::NearestMipmapNearest => glow::NEAREST_MIPMAP_NEAREST,
            Self::LinearMipmapNearest => glow::LINEAR_MIPMAP_NEAREST,
            Self::NearestMipmapLinear => glow::NEAREST_MIPMAP_LINEAR,
            Self::LinearMipmapLinear => glow::LINEAR_MIPMAP_LINEAR,
        }
    }

    /// Whether the filter samples from mipmap levels.
    pub fn uses_mipmaps(self) -> bool {
        !matches!(self, Self::Nearest | Self::Linear)
    }
}

/// Coordinate wrapping outside `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextureWrap {
    Repeat,
    MirroredRepeat,
    ClampToEdge,
    ClampToBorder,
}

impl TextureWrap {
    pub fn gl(self) -> u32 {
        match self {
            Self::Repeat => glow::REPEAT,
            Self::MirroredRepeat => glow::MIRRORED_REPEAT,
            Self::ClampToEdge => glow::CLAMP_TO_EDGE,
            Self::ClampToBorder => glow::CLAMP_TO_BORDER,
        }
    }
}

/// Creation parameters of a texture.
///
/// When loading from an image, `internal_format` and `format` are replaced by the layout
/// of the image and `data_type` is always `UNSIGNED_BYTE`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextureParams {
    pub internal_format: TextureFormat,
    pub format: TextureFormat,
    pub data_type: u32,
    pub mag_filter: TextureFilter,
    pub min_filter: TextureFilter,
    pub wrap_s: TextureWrap,
    pub wrap_t: TextureWrap,
    pub mipmapped: bool,
}

impl Default for TextureParams {
    fn default() -> Self {
        Self {
            internal_format: TextureFormat::Rgba,
            format: TextureFormat::Rgba,
            data_type: glow::UNSIGNED_BYTE,
            mag_filter: TextureFilter::Linear,
            min_filter: TextureFilter::LinearMipmapLinear,
            wrap_s: TextureWrap::Repeat,
            wrap_t: TextureWrap::Repeat,
            mipmapped: true,
        }
    }
}

impl TextureParams {
    /// Nearest filtering without mipmaps, for pixel art and procedural patterns.
    pub fn pixelated() -> Self {
        Self {
            mag_filter: TextureFilter::Nearest,
            min_filter: TextureFilter::Nearest,
            mipmapped: false,
            ..Self::default()
        }
    }
}

/// Represents a handle to a texture.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TextureHandle {
    id: glow::Texture,
    target: u32,
    width: u32,
    height: u32,
}

impl TextureHandle {
    /// Binds the texture handle to the specified texture unit.
    pub fn bind(&self, gpu: &dyn Gpu, unit: u32) {
        gpu.active_texture(glow::TEXTURE0 + unit);
        gpu.bind_texture(self.target, Some(self.id));
    }

    pub fn id(&self) -> glow::Texture {
        self.id
    }

    /// Returns the width of the texture.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Returns the height of the texture.
    pub fn height(&self) -> u32 {
        self.height
    }
}

/// Represents a texture stored on the GPU side.
pub struct Texture {
    gpu: GpuContext,
    id: glow::Texture,
    target: u32,
    width: u32,
    height: u32,
    params: TextureParams,
}

impl Texture {
    /// Creates a 2D texture, uploading `pixels` if given.
    ///
    /// `params.format` describes the layout of `pixels`. Without pixel data the storage
    /// is left uninitialised and no mipmaps are generated.
    pub fn new(
        gpu: &GpuContext,
        width: u32,
        height: u32,
        pixels: Option<&[u8]>,
        mut params: TextureParams,
    ) -> Result<Self> {
        if pixels.is_none() {
            params.mipmapped = false;
        }
        let target = glow::TEXTURE_2D;
        let id = gpu.create_texture().map_err(Error::Gpu)?;
        gpu.bind_texture(target, Some(id));

        // Rows of RED and RGB images are not 4-byte aligned in general.
        gpu.pixel_store_i32(glow::UNPACK_ALIGNMENT, 1);
        gpu.tex_image_2d(
            target,
            params.internal_format.gl() as i32,
            width as i32,
            height as i32,
            params.format.gl(),
            params.data_type,
            pixels,
        );
        if params.mipmapped {
            gpu.generate_mipmap(target);
        } else if params.min_filter.uses_mipmaps() {
            log::warn!("texture without mipmaps uses a mipmap min filter, it will sample black");
        }

        gpu.tex_parameter_i32(target, glow::TEXTURE_MIN_FILTER, params.min_filter.gl() as i32);
        gpu.tex_parameter_i32(target, glow::TEXTURE_MAG_FILTER, params.mag_filter.gl() as i32);
        gpu.tex_parameter_i32(target, glow::TEXTURE_WRAP_S, params.wrap_s.gl() as i32);
        gpu.tex_parameter_i32(target, glow::TEXTURE_WRAP_T, params.wrap_t.gl() as i32);
        gpu.bind_texture(target, None);

        Ok(Self {
            gpu: Rc::clone(gpu),
            id,
            target,
            width,
            height,
            params,
        })
    }

    /// Creates a texture from the given [`image::DynamicImage`].
    ///
    /// One, three and four channel 8-bit images are uploaded as RED, RGB and RGBA. Any
    /// other layout is converted to RGBA first.
    pub fn from_image(gpu: &GpuContext, image: &DynamicImage, params: TextureParams) -> Result<Self> {
        let (width, height) = image.dimensions();
        let (format, pixels) = pixel_data(image);
        let params = TextureParams {
            internal_format: format,
            format,
            data_type: glow::UNSIGNED_BYTE,
            ..params
        };
        Self::new(gpu, width, height, Some(&*pixels), params)
    }

    /// Returns the width of the texture.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Returns the height of the texture.
    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn id(&self) -> glow::Texture {
        self.id
    }

    pub fn target(&self) -> u32 {
        self.target
    }

    /// The parameters the texture was created with, after format detection.
    pub fn params(&self) -> &TextureParams {
        &self.params
    }

    /// Returns a handle to the texture.
    pub fn handle(&self) -> TextureHandle {
        TextureHandle {
            id: self.id,
            target: self.target,
            width: self.width,
            height: self.height,
        }
    }

    /// Binds the texture to the specified texture unit.
    pub fn bind(&self, unit: u32) {
        self.handle().bind(self.gpu.as_ref(), unit);
    }
}

impl Drop for Texture {
    fn drop(&mut self) {
        self.gpu.delete_texture(self.id);
    }
}

fn pixel_data(image: &DynamicImage) -> (TextureFormat, Cow<'_, [u8]>) {
    let color = image.color();
    match TextureFormat::from_channels(color.channel_count()) {
        Some(format) if color.bytes_per_pixel() == color.channel_count() => {
            (format, Cow::Borrowed(image.as_bytes()))
        }
        _ => (TextureFormat::Rgba, Cow::Owned(image.to_rgba8().into_raw())),
    }
}

/// Caches textures by name.
pub struct TextureLoader {
    gpu: GpuContext,
    textures: ResourceCache<Texture>,
}

impl TextureLoader {
    pub fn new(gpu: &GpuContext) -> Self {
        Self {
            gpu: Rc::clone(gpu),
            textures: ResourceCache::new("texture"),
        }
    }

    /// Decodes an image file and uploads it.
    ///
    /// A missing file fails with [`Error::ImageNotFound`] and registers nothing.
    pub fn load(
        &mut self,
        key: &str,
        path: impl AsRef<Path>,
        params: TextureParams,
    ) -> Result<&Texture> {
        self.textures.ensure_vacant(key)?;
        let path = path.as_ref();
        let image = image::open(path).map_err(|source| match source {
            image::ImageError::IoError(ref e) if e.kind() == std::io::ErrorKind::NotFound => {
                Error::ImageNotFound {
                    key: key.to_string(),
                    path: path.to_path_buf(),
                }
            }
            source => Error::ImageDecode {
                key: key.to_string(),
                source,
            },
        })?;
        self.load_image(key, &image, params)
    }

    /// Uploads an already decoded image.
    pub fn load_image(
        &mut self,
        key: &str,
        image: &DynamicImage,
        params: TextureParams,
    ) -> Result<&Texture> {
        self.textures.ensure_vacant(key)?;
        let texture = Texture::from_image(&self.gpu, image, params)?;
        self.textures.insert(key, texture)
    }

    /// Allocates an empty texture, e.g. as a render target. Mipmapping is forced off.
    pub fn generate(
        &mut self,
        key: &str,
        width: u32,
        height: u32,
        params: TextureParams,
    ) -> Result<&Texture> {
        self.textures.ensure_vacant(key)?;
        let texture = Texture::new(&self.gpu, width, height, None, params)?;
        self.textures.insert(key, texture)
    }

    pub fn get(&self, key: &str) -> Result<&Texture> {
        self.textures.get(key)
    }

    /// Deletes the texture stored under `key`.
    pub fn unload(&mut self, key: &str) -> Result<()> {
        self.textures.remove(key).map(drop)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.textures.contains(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.textures.keys()
    }

    pub fn len(&self) -> usize {
        self.textures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.textures.is_empty()
    }
}

/// A two-colour checkerboard with square cells of `cell` pixels.
pub fn checkerboard(size: u32, cell: u32, a: [u8; 4], b: [u8; 4]) -> DynamicImage {
    let cell = cell.max(1);
    let image = image::RgbaImage::from_fn(size, size, |x, y| {
        if (x / cell + y / cell) % 2 == 0 {
            image::Rgba(a)
        } else {
            image::Rgba(b)
        }
    });
    DynamicImage::ImageRgba8(image)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::abs::mock::{Call, MockGpu};

    #[test]
    fn test_channel_count_selects_format() {
        let (mock, gpu) = MockGpu::new();
        let mut loader = TextureLoader::new(&gpu);

        let grey = DynamicImage::ImageLuma8(image::GrayImage::new(3, 2));
        let rgb = DynamicImage::ImageRgb8(image::RgbImage::new(3, 2));
        let rgba = DynamicImage::ImageRgba8(image::RgbaImage::new(3, 2));
        let grey_alpha = DynamicImage::ImageLumaA8(image::GrayAlphaImage::new(3, 2));

        for (key, image, format) in [
            ("grey", &grey, TextureFormat::Red),
            ("rgb", &rgb, TextureFormat::Rgb),
            ("rgba", &rgba, TextureFormat::Rgba),
            ("grey_alpha", &grey_alpha, TextureFormat::Rgba),
        ] {
            mock.clear_calls();
            let texture = loader
                .load_image(key, image, TextureParams::default())
                .unwrap();
            assert_eq!(texture.params().format, format);
            assert_eq!(texture.params().internal_format, format);
            assert_eq!((texture.width(), texture.height()), (3, 2));
            assert!(mock.calls().contains(&Call::TexImage {
                internal_format: format.gl() as i32,
                width: 3,
                height: 2,
                format: format.gl(),
                has_data: true,
            }));
        }
        assert_eq!(mock.live_textures(), 4);
    }

    #[test]
    fn test_params_are_applied() {
        let (mock, gpu) = MockGpu::new();
        let mut loader = TextureLoader::new(&gpu);
        let params = TextureParams {
            wrap_s: TextureWrap::ClampToEdge,
            ..TextureParams::default()
        };
        loader
            .load_image("t", &checkerboard(4, 2, [0; 4], [255; 4]), params)
            .unwrap();

        let calls = mock.calls();
        assert!(calls.contains(&Call::GenerateMipmap));
        for (parameter, value) in [
            (glow::TEXTURE_MIN_FILTER, glow::LINEAR_MIPMAP_LINEAR),
            (glow::TEXTURE_MAG_FILTER, glow::LINEAR),
            (glow::TEXTURE_WRAP_S, glow::CLAMP_TO_EDGE),
            (glow::TEXTURE_WRAP_T, glow::REPEAT),
        ] {
            assert!(calls.contains(&Call::TexParameter {
                parameter,
                value: value as i32,
            }));
        }
    }

    #[test]
    fn test_missing_image_is_not_registered() {
        let (mock, gpu) = MockGpu::new();
        let mut loader = TextureLoader::new(&gpu);
        let err = loader
            .load("t", "missing.png", TextureParams::default())
            .err()
            .unwrap();
        assert!(matches!(err, Error::ImageNotFound { ref key, .. } if key == "t"));
        assert!(err.to_string().contains("image not found"));
        assert!(!loader.contains("t"));
        assert_eq!(mock.live_textures(), 0);
    }

    #[test]
    fn test_load_from_file() {
        let dir = std::env::temp_dir().join(format!("gl-workbench-texture-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("checker.png");
        checkerboard(8, 4, [255, 0, 0, 255], [0, 0, 255, 255])
            .save(&path)
            .unwrap();

        let (_mock, gpu) = MockGpu::new();
        let mut loader = TextureLoader::new(&gpu);
        let texture = loader.load("checker", &path, TextureParams::default()).unwrap();
        assert_eq!((texture.width(), texture.height()), (8, 8));

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_generate_has_no_data_and_no_mipmaps() {
        let (mock, gpu) = MockGpu::new();
        let mut loader = TextureLoader::new(&gpu);
        let texture = loader
            .generate("target", 800, 600, TextureParams::pixelated())
            .unwrap();
        assert!(!texture.params().mipmapped);

        let calls = mock.calls();
        assert!(!calls.contains(&Call::GenerateMipmap));
        assert!(calls.contains(&Call::TexImage {
            internal_format: glow::RGBA as i32,
            width: 800,
            height: 600,
            format: glow::RGBA,
            has_data: false,
        }));
    }

    #[test]
    fn test_duplicate_key_creates_nothing() {
        let (mock, gpu) = MockGpu::new();
        let mut loader = TextureLoader::new(&gpu);
        loader.generate("t", 4, 4, TextureParams::default()).unwrap();
        let err = loader
            .generate("t", 4, 4, TextureParams::default())
            .err()
            .unwrap();
        assert!(matches!(err, Error::DuplicateKey { kind: "texture", .. }));
        assert_eq!(mock.live_textures(), 1);
    }

    #[test]
    fn test_unload_and_drop_release_textures() {
        let (mock, gpu) = MockGpu::new();
        let mut loader = TextureLoader::new(&gpu);
        loader.generate("a", 4, 4, TextureParams::default()).unwrap();
        loader.generate("b", 4, 4, TextureParams::default()).unwrap();
        assert_eq!(mock.live_textures(), 2);

        loader.unload("a").unwrap();
        assert_eq!(mock.live_textures(), 1);
        assert!(loader.get("a").is_err());
        assert!(loader.unload("a").is_err());

        drop(loader);
        assert_eq!(mock.live_textures(), 0);
    }

    #[test]
    fn test_generate_render_target_formats() {
        let (mock, gpu) = MockGpu::new();
        let mut loader = TextureLoader::new(&gpu);
        for (key, format) in [("depth", TextureFormat::Depth), ("velocity", TextureFormat::Rg)] {
            let params = TextureParams {
                internal_format: format,
                format,
                data_type: glow::FLOAT,
                min_filter: TextureFilter::Nearest,
                ..TextureParams::pixelated()
            };
            mock.clear_calls();
            loader.generate(key, 64, 32, params).unwrap();
            assert!(mock.calls().contains(&Call::TexImage {
                internal_format: format.gl() as i32,
                width: 64,
                height: 32,
                format: format.gl(),
                has_data: false,
            }));
        }
        assert_eq!(TextureFormat::Depth.gl(), glow::DEPTH_COMPONENT);
        assert_eq!(TextureFormat::Rg.gl(), glow::RG);
        assert_eq!(mock.live_textures(), 2);
    }

    #[test]
    fn test_bind_to_unit() {
        let (mock, gpu) = MockGpu::new();
        let mut loader = TextureLoader::new(&gpu);
        let texture = loader.generate("t", 4, 2, TextureParams::default()).unwrap();
        let handle = texture.handle();
        assert_eq!((handle.width(), handle.height()), (4, 2));
        assert_eq!(handle.id(), texture.id());
        mock.clear_calls();

        texture.bind(2);
        assert_eq!(
            mock.calls(),
            vec![
                Call::ActiveTexture(glow::TEXTURE0 + 2),
                Call::BindTexture {
                    target: glow::TEXTURE_2D,
                    texture: Some(texture.id().0.get()),
                },
            ]
        );
    }
}
