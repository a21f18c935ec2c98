// ABOUTME: Byte-budget image compressor for API payloads
// ABOUTME: Downscales to a maximum dimension and lowers JPEG quality until the budget is met

use image::{codecs::jpeg::JpegEncoder, imageops::FilterType, DynamicImage, ImageEncoder};
use log;

use crate::constants::compression;
use crate::error::{PartlensError, Result};
use crate::media::{decode_data_uri, estimate_base64_size, to_data_uri, EncodedImage};

const OUTPUT_MIME_TYPE: &str = "image/jpeg";

#[derive(Debug, Clone)]
pub struct CompressionConfig {
    pub max_dimension: u32,
    /// Starting quality in (0, 1]
    pub initial_quality: f32,
    pub byte_budget: usize,
    pub quality_floor: f32,
    pub quality_step: f32,
    pub filter: FilterType,
}

impl Default for CompressionConfig {
    fn default() -> Self {
        Self {
            max_dimension: compression::MAX_DIMENSION,
            initial_quality: compression::INITIAL_QUALITY,
            byte_budget: compression::BYTE_BUDGET,
            quality_floor: compression::QUALITY_FLOOR,
            quality_step: compression::QUALITY_STEP,
            filter: FilterType::Lanczos3,
        }
    }
}

/// Result of one compression run. `byte_size` may still exceed the budget
/// when the quality floor was reached first.
#[derive(Debug, Clone)]
pub struct CompressionOutcome {
    pub image: EncodedImage,
    pub quality: f32,
    pub byte_size: usize,
    pub width: u32,
    pub height: u32,
    pub within_budget: bool,
}

#[derive(Debug, Clone, Default)]
pub struct Compressor {
    config: CompressionConfig,
}

impl Compressor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: CompressionConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &CompressionConfig {
        &self.config
    }

    /// Re-encode `image` so its payload fits the byte budget, best effort.
    pub fn compress(&self, image: &EncodedImage) -> Result<CompressionOutcome> {
        let data_uri = image
            .data_uri
            .as_deref()
            .ok_or_else(|| PartlensError::encoding(&image.name, "image has not been encoded"))?;

        let bytes = decode_data_uri(data_uri)
            .ok_or_else(|| PartlensError::encoding(&image.name, "malformed data URI"))?;

        let decoded = image::load_from_memory(&bytes)
            .map_err(|e| PartlensError::encoding(&image.name, e.to_string()))?;

        let (width, height) = target_dimensions(
            decoded.width(),
            decoded.height(),
            self.config.max_dimension,
        );
        let scaled = if (width, height) != (decoded.width(), decoded.height()) {
            log::debug!(
                "Scaling {} from {}x{} to {}x{}",
                image.name,
                decoded.width(),
                decoded.height(),
                width,
                height
            );
            decoded.resize_exact(width, height, self.config.filter)
        } else {
            decoded
        };

        let initial = quality_percent(self.config.initial_quality);
        let floor = quality_percent(self.config.quality_floor).min(initial);
        let step = quality_percent(self.config.quality_step);

        let mut quality = initial;
        let mut encoded = self.encode_at(&image.name, &scaled, quality)?;
        let mut byte_size = estimate_base64_size(&encoded);

        while byte_size > self.config.byte_budget && quality > floor {
            quality = quality.saturating_sub(step).max(floor);
            encoded = self.encode_at(&image.name, &scaled, quality)?;
            byte_size = estimate_base64_size(&encoded);
            log::debug!(
                "Re-encoded {} at quality {}: {} bytes",
                image.name,
                quality,
                byte_size
            );
        }

        let within_budget = byte_size <= self.config.byte_budget;
        if !within_budget {
            log::debug!(
                "{} is {} bytes at the quality floor, over the {} byte budget",
                image.name,
                byte_size,
                self.config.byte_budget
            );
        }

        Ok(CompressionOutcome {
            image: EncodedImage {
                index: image.index,
                name: image.name.clone(),
                mime_type: OUTPUT_MIME_TYPE.to_string(),
                data_uri: Some(encoded),
            },
            quality: f32::from(quality) / 100.0,
            byte_size,
            width,
            height,
            within_budget,
        })
    }

    fn encode_at(&self, name: &str, img: &DynamicImage, quality: u8) -> Result<String> {
        let rgb = img.to_rgb8();
        let mut buffer = Vec::new();

        JpegEncoder::new_with_quality(&mut buffer, quality)
            .write_image(
                rgb.as_raw(),
                rgb.width(),
                rgb.height(),
                image::ExtendedColorType::Rgb8,
            )
            .map_err(|e| PartlensError::encoding(name, format!("JPEG encoding failed: {e}")))?;

        Ok(to_data_uri(OUTPUT_MIME_TYPE, &buffer))
    }
}

/// Uniformly scale `(width, height)` so the longer side is at most
/// `max_dimension`. Never upscales and never returns a zero side.
pub fn target_dimensions(width: u32, height: u32, max_dimension: u32) -> (u32, u32) {
    let longest = width.max(height).max(1);
    let scale = (f64::from(max_dimension) / f64::from(longest)).min(1.0);

    let scaled = |side: u32| ((f64::from(side) * scale).round() as u32).max(1);
    (scaled(width), scaled(height))
}

/// Quality in (0, 1] as the integer percentage the JPEG encoder takes.
fn quality_percent(quality: f32) -> u8 {
    (quality * 100.0).round().clamp(1.0, 100.0) as u8
}
