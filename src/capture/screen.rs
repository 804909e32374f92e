//! Screen-zone grabbing and screenshot persistence.

use anyhow::{anyhow, Context, Result};
use image::codecs::jpeg::JpegEncoder;
use image::{ImageBuffer, Rgba};
use screenshots::Screen;
use std::collections::HashSet;
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use crate::config::CaptureZone;

/// A grab with more distinct colours than this is considered rendered
/// application UI rather than an empty desktop or a loading splash.
const MIN_COLOR_COUNT: usize = 100;

/// Matches the original capture tool's output quality.
const JPEG_QUALITY: u8 = 95;

/// Grabs the configured capture zone from the display containing it.
pub fn capture_zone(zone: &CaptureZone) -> Result<ImageBuffer<Rgba<u8>, Vec<u8>>> {
    let screen = Screen::from_point(zone.x, zone.y)
        .map_err(|e| anyhow!("no display at ({}, {}): {}", zone.x, zone.y, e))?;

    let image = screen
        .capture_area(
            zone.x - screen.display_info.x,
            zone.y - screen.display_info.y,
            zone.width,
            zone.height,
        )
        .map_err(|e| anyhow!("screen capture failed: {}", e))?;

    let bytes = image.to_vec();
    ImageBuffer::from_raw(image.width(), image.height(), bytes)
        .ok_or_else(|| anyhow!("capture buffer size mismatch"))
}

/// Quality check: counts distinct colours until the threshold is passed.
///
/// A blank zone (window not yet drawn) has a handful of colours; real
/// activity windows have hundreds.
pub fn looks_rendered(img: &ImageBuffer<Rgba<u8>, Vec<u8>>) -> bool {
    let mut colors: HashSet<[u8; 4]> = HashSet::new();

    for pixel in img.pixels() {
        colors.insert(pixel.0);
        if colors.len() > MIN_COLOR_COUNT {
            return true;
        }
    }

    false
}

/// Saves a captured frame as JPEG.
pub fn save_jpeg(img: &ImageBuffer<Rgba<u8>, Vec<u8>>, path: &Path) -> Result<()> {
    // JPEG has no alpha channel
    let rgb = image::DynamicImage::ImageRgba8(img.clone()).to_rgb8();

    let file = File::create(path)
        .with_context(|| format!("failed to create {}", path.display()))?;
    let mut encoder = JpegEncoder::new_with_quality(BufWriter::new(file), JPEG_QUALITY);
    encoder
        .encode_image(&rgb)
        .with_context(|| format!("failed to encode {}", path.display()))?;

    Ok(())
}
