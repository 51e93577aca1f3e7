//! Image to point cloud sampling.
//!
//! Bright pixels of a source image become particle targets. The image is
//! visited on a regular grid (every `stride`-th row and column), a visited
//! pixel is kept when all three colour channels exceed `threshold`, and kept
//! pixels are mapped into world space centred on the origin with image-up
//! pointing along +Y:
//!
//! ```text
//! x' = (x - width / 2) * scale
//! y' = (height / 2 - y) * scale
//! z' = 0
//! ```
//!
//! Output is in raster order, so sampling is deterministic for a given image.

use std::path::Path;

use glam::Vec3;
use image::RgbaImage;
use serde::{Deserialize, Serialize};

use crate::error::SampleError;

/// An ordered list of sampled points.
pub type PointCloud = Vec<Vec3>;

/// Sampling parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SamplerConfig {
    /// Grid step in pixels along both axes.
    pub stride: u32,
    /// A channel must be strictly greater than this to count as bright.
    pub threshold: u8,
    /// World units per pixel.
    pub scale: f32,
}

impl Default for SamplerConfig {
    fn default() -> Self {
        Self {
            stride: 2,
            threshold: 200,
            scale: 0.5,
        }
    }
}

/// Turns decoded images into point clouds.
#[derive(Debug, Clone, Copy, Default)]
pub struct ImageSampler {
    config: SamplerConfig,
}

impl ImageSampler {
    pub fn new(config: SamplerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SamplerConfig {
        &self.config
    }

    /// Decode an image file and sample it.
    ///
    /// Blocks while decoding; the frame loop goes through
    /// [`ShapeLoader`](crate::loader::ShapeLoader) instead.
    pub fn sample_file<P: AsRef<Path>>(&self, path: P) -> Result<PointCloud, SampleError> {
        let path = path.as_ref();
        let img = image::open(path)
            .map_err(|source| SampleError::Decode {
                path: path.to_path_buf(),
                source,
            })?
            .into_rgba8();
        let cloud = self.sample(&img);
        log::debug!(
            "sampled {} points from {} ({}x{})",
            cloud.len(),
            path.display(),
            img.width(),
            img.height()
        );
        Ok(cloud)
    }

    /// Sample an already decoded image.
    pub fn sample(&self, img: &RgbaImage) -> PointCloud {
        let (width, height) = img.dimensions();
        self.sample_pixels(width, height, img.as_raw())
    }

    /// Sample a raw RGBA8 buffer of `width * height * 4` bytes.
    pub fn sample_rgba(
        &self,
        width: u32,
        height: u32,
        pixels: &[u8],
    ) -> Result<PointCloud, SampleError> {
        let expected = width as usize * height as usize * 4;
        if pixels.len() != expected {
            return Err(SampleError::BufferSize {
                width,
                height,
                expected,
                actual: pixels.len(),
            });
        }
        Ok(self.sample_pixels(width, height, pixels))
    }

    fn sample_pixels(&self, width: u32, height: u32, pixels: &[u8]) -> PointCloud {
        let SamplerConfig {
            stride,
            threshold,
            scale,
        } = self.config;
        let stride = stride.max(1) as usize;
        let half_w = width as f32 / 2.0;
        let half_h = height as f32 / 2.0;

        let mut cloud = Vec::new();
        for y in (0..height as usize).step_by(stride) {
            for x in (0..width as usize).step_by(stride) {
                let i = (y * width as usize + x) * 4;
                let [r, g, b] = [pixels[i], pixels[i + 1], pixels[i + 2]];
                if r > threshold && g > threshold && b > threshold {
                    cloud.push(Vec3::new(
                        (x as f32 - half_w) * scale,
                        (half_h - y as f32) * scale,
                        0.0,
                    ));
                }
            }
        }
        cloud
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    const WHITE: Rgba<u8> = Rgba([255, 255, 255, 255]);

    fn blank(width: u32, height: u32) -> RgbaImage {
        RgbaImage::from_pixel(width, height, Rgba([0, 0, 0, 255]))
    }

    #[test]
    fn test_only_even_coordinates_are_visited() {
        let mut img = blank(4, 4);
        img.put_pixel(0, 0, WHITE);
        img.put_pixel(1, 0, WHITE);
        img.put_pixel(2, 2, WHITE);
        img.put_pixel(3, 3, WHITE);
        img.put_pixel(0, 1, WHITE);

        let cloud = ImageSampler::default().sample(&img);
        assert_eq!(cloud, vec![Vec3::new(-1.0, 1.0, 0.0), Vec3::new(0.0, 0.0, 0.0)]);
    }

    #[test]
    fn test_every_channel_must_exceed_threshold() {
        let mut img = blank(6, 2);
        img.put_pixel(0, 0, Rgba([201, 201, 201, 0]));
        img.put_pixel(2, 0, Rgba([201, 201, 200, 255]));
        img.put_pixel(4, 0, Rgba([200, 255, 255, 255]));

        let cloud = ImageSampler::default().sample(&img);
        // Alpha is ignored, 200 is not bright.
        assert_eq!(cloud.len(), 1);
        assert_eq!(cloud[0], Vec3::new(-1.5, 0.5, 0.0));
    }

    #[test]
    fn test_raster_order_and_y_flip() {
        let img = RgbaImage::from_pixel(4, 4, WHITE);
        let cloud = ImageSampler::default().sample(&img);

        assert_eq!(
            cloud,
            vec![
                Vec3::new(-1.0, 1.0, 0.0),
                Vec3::new(0.0, 1.0, 0.0),
                Vec3::new(-1.0, 0.0, 0.0),
                Vec3::new(0.0, 0.0, 0.0),
            ]
        );
    }

    #[test]
    fn test_odd_dimensions_use_half_pixel_centre() {
        let mut img = blank(3, 3);
        img.put_pixel(0, 0, WHITE);
        let cloud = ImageSampler::default().sample(&img);
        assert_eq!(cloud, vec![Vec3::new(-0.75, 0.75, 0.0)]);
    }

    #[test]
    fn test_point_count_matches_qualifying_pixels() {
        let mut img = blank(20, 10);
        let mut expected = 0;
        for y in 0..10 {
            for x in 0..20 {
                if (x + y) % 3 == 0 {
                    img.put_pixel(x, y, WHITE);
                    if x % 2 == 0 && y % 2 == 0 {
                        expected += 1;
                    }
                }
            }
        }
        assert_eq!(ImageSampler::default().sample(&img).len(), expected);
    }

    #[test]
    fn test_raw_buffer_size_checked() {
        let sampler = ImageSampler::default();
        let err = sampler.sample_rgba(2, 2, &[255; 15]).unwrap_err();
        assert!(matches!(err, SampleError::BufferSize { expected: 16, actual: 15, .. }));

        let cloud = sampler.sample_rgba(2, 2, &[255; 16]).unwrap();
        assert_eq!(cloud, vec![Vec3::new(-0.5, 0.5, 0.0)]);
    }

    #[test]
    fn test_missing_file_is_decode_error() {
        let err = ImageSampler::default()
            .sample_file("/no/such/shape.png")
            .unwrap_err();
        assert!(matches!(err, SampleError::Decode { .. }));
    }
}
