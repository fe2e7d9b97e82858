//! Raw pixel buffers exchanged with the native engine.
//!
//! The engine sees an image as interleaved 8-bit samples plus width, height
//! and a channel count (ncnn calls it `elempack`). [`RawImage`] owns such a
//! buffer; [`to_native`] and [`from_native`] convert between it and
//! [`image::DynamicImage`].

use crate::error::{Result, Waifu2xError};
use image::{ColorType, DynamicImage, ImageBuffer};

/// Interleaved 8-bit pixel buffer.
///
/// Invariant: `data.len() == width * height * channels`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawImage {
    data: Vec<u8>,
    width: u32,
    height: u32,
    channels: u32,
}

impl RawImage {
    /// Wrap a buffer whose channel count is already known.
    pub fn new(data: Vec<u8>, width: u32, height: u32, channels: u32) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(Waifu2xError::MalformedImage(format!(
                "empty image ({width}x{height})"
            )));
        }
        let expected = width as usize * height as usize * channels as usize;
        if channels == 0 || data.len() != expected {
            return Err(Waifu2xError::MalformedImage(format!(
                "{width}x{height}x{channels} needs {expected} bytes, got {}",
                data.len()
            )));
        }
        Ok(Self {
            data,
            width,
            height,
            channels,
        })
    }

    /// Wrap a buffer and derive the channel count from its length.
    ///
    /// The length must be a non-zero multiple of `width * height`.
    pub fn from_bytes(data: Vec<u8>, width: u32, height: u32) -> Result<Self> {
        let pixels = width as usize * height as usize;
        if pixels == 0 {
            return Err(Waifu2xError::MalformedImage(format!(
                "empty image ({width}x{height})"
            )));
        }
        if data.is_empty() || data.len() % pixels != 0 {
            return Err(Waifu2xError::MalformedImage(format!(
                "{} bytes is not a whole number of channels for {width}x{height}",
                data.len()
            )));
        }
        let channels = (data.len() / pixels) as u32;
        Self::new(data, width, height, channels)
    }

    /// Zero-filled buffer for the engine to write a `scale`× result into.
    pub fn zeroed_output(&self, scale: u32) -> Self {
        let len = (scale * scale) as usize * self.data.len();
        Self {
            data: vec![0; len],
            width: self.width * scale,
            height: self.height * scale,
            channels: self.channels,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn channels(&self) -> u32 {
        self.channels
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn as_bytes_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.data
    }
}

/// 8-bit colour layouts the engine can process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorMode {
    L8,
    La8,
    Rgb8,
    Rgba8,
}

impl ColorMode {
    pub fn channels(self) -> u32 {
        match self {
            ColorMode::L8 => 1,
            ColorMode::La8 => 2,
            ColorMode::Rgb8 => 3,
            ColorMode::Rgba8 => 4,
        }
    }
}

impl TryFrom<ColorType> for ColorMode {
    type Error = Waifu2xError;

    fn try_from(color: ColorType) -> Result<Self> {
        match color {
            ColorType::L8 => Ok(ColorMode::L8),
            ColorType::La8 => Ok(ColorMode::La8),
            ColorType::Rgb8 => Ok(ColorMode::Rgb8),
            ColorType::Rgba8 => Ok(ColorMode::Rgba8),
            other => Err(Waifu2xError::MalformedImage(format!(
                "unsupported color type {other:?}; only 8-bit images can be processed"
            ))),
        }
    }
}

/// Copy a decoded image into an engine buffer, remembering its colour mode.
pub fn to_native(image: &DynamicImage) -> Result<(RawImage, ColorMode)> {
    let mode = ColorMode::try_from(image.color())?;
    let raw = RawImage::from_bytes(image.as_bytes().to_vec(), image.width(), image.height())?;
    Ok((raw, mode))
}

/// Rebuild a [`DynamicImage`] in `mode` from an engine buffer.
///
/// Upscaling never changes channel semantics, so the buffer must carry
/// exactly the channel count of `mode`.
pub fn from_native(raw: RawImage, mode: ColorMode) -> Result<DynamicImage> {
    if raw.channels != mode.channels() {
        return Err(Waifu2xError::MalformedImage(format!(
            "{mode:?} needs {} channels, buffer has {}",
            mode.channels(),
            raw.channels
        )));
    }
    let (width, height) = (raw.width, raw.height);
    let data = raw.into_bytes();
    let image = match mode {
        ColorMode::L8 => ImageBuffer::from_raw(width, height, data).map(DynamicImage::ImageLuma8),
        ColorMode::La8 => {
            ImageBuffer::from_raw(width, height, data).map(DynamicImage::ImageLumaA8)
        }
        ColorMode::Rgb8 => ImageBuffer::from_raw(width, height, data).map(DynamicImage::ImageRgb8),
        ColorMode::Rgba8 => {
            ImageBuffer::from_raw(width, height, data).map(DynamicImage::ImageRgba8)
        }
    };
    image.ok_or_else(|| {
        Waifu2xError::MalformedImage(format!("buffer does not fit {width}x{height} {mode:?}"))
    })
}
