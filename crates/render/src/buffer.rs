//! Captured image buffers and their export to PNG / GIF.

use crate::error::RenderError;
use image::codecs::gif::{GifEncoder, Repeat};
use image::{Delay, DynamicImage, Frame};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

/// Square 8-bit RGB image, row-major, 3 bytes per pixel.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawRgb")]
pub struct RgbImage {
    resolution: u32,
    pixels: Vec<u8>,
}

impl RgbImage {
    pub fn new(resolution: u32, pixels: Vec<u8>) -> Result<Self, RenderError> {
        let expected = pixel_count(resolution)? * 3;
        if pixels.len() != expected {
            return Err(RenderError::BufferSize { expected, actual: pixels.len() });
        }
        Ok(Self { resolution, pixels })
    }

    #[must_use]
    pub fn resolution(&self) -> u32 {
        self.resolution
    }

    #[must_use]
    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    #[must_use]
    pub fn pixel(&self, x: u32, y: u32) -> [u8; 3] {
        let i = (y as usize * self.resolution as usize + x as usize) * 3;
        [self.pixels[i], self.pixels[i + 1], self.pixels[i + 2]]
    }

    #[must_use]
    pub fn to_image(&self) -> image::RgbImage {
        image::RgbImage::from_raw(self.resolution, self.resolution, self.pixels.clone())
            .unwrap_or_else(|| image::RgbImage::new(self.resolution, self.resolution))
    }

    pub fn save_png(&self, path: impl AsRef<Path>) -> Result<(), RenderError> {
        self.to_image().save_with_format(path, image::ImageFormat::Png)?;
        Ok(())
    }
}

/// Square metric depth map in meters, row-major.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawDepth")]
pub struct DepthImage {
    resolution: u32,
    values: Vec<f32>,
}

// Decoded buffers go through the same size checks as constructed ones.
#[derive(Deserialize)]
struct RawRgb {
    resolution: u32,
    pixels: Vec<u8>,
}

impl TryFrom<RawRgb> for RgbImage {
    type Error = RenderError;

    fn try_from(raw: RawRgb) -> Result<Self, Self::Error> {
        Self::new(raw.resolution, raw.pixels)
    }
}

#[derive(Deserialize)]
struct RawDepth {
    resolution: u32,
    values: Vec<f32>,
}

impl TryFrom<RawDepth> for DepthImage {
    type Error = RenderError;

    fn try_from(raw: RawDepth) -> Result<Self, Self::Error> {
        Self::new(raw.resolution, raw.values)
    }
}

impl DepthImage {
    pub fn new(resolution: u32, values: Vec<f32>) -> Result<Self, RenderError> {
        let expected = pixel_count(resolution)?;
        if values.len() != expected {
            return Err(RenderError::BufferSize { expected, actual: values.len() });
        }
        Ok(Self { resolution, values })
    }

    #[must_use]
    pub fn resolution(&self) -> u32 {
        self.resolution
    }

    #[must_use]
    pub fn values(&self) -> &[f32] {
        &self.values
    }
}

pub(crate) fn pixel_count(resolution: u32) -> Result<usize, RenderError> {
    if resolution == 0 {
        return Err(RenderError::InvalidResolution(resolution));
    }
    Ok(resolution as usize * resolution as usize)
}

/// Write `frames` as an endlessly looping GIF at `fps` frames per second.
pub fn write_gif<'a, I>(frames: I, path: impl AsRef<Path>, fps: u32) -> Result<(), RenderError>
where
    I: IntoIterator<Item = &'a RgbImage>,
{
    let frames: Vec<Frame> = frames
        .into_iter()
        .map(|img| {
            let rgba = DynamicImage::ImageRgb8(img.to_image()).to_rgba8();
            Frame::from_parts(rgba, 0, 0, Delay::from_numer_denom_ms(1000, fps.max(1)))
        })
        .collect();
    if frames.is_empty() {
        return Err(RenderError::NoFrames);
    }
    let file = BufWriter::new(File::create(path)?);
    let mut encoder = GifEncoder::new(file);
    encoder.set_repeat(Repeat::Infinite)?;
    encoder.encode_frames(frames)?;
    Ok(())
}
