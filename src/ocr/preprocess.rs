//! Image enhancement techniques applied before OCR.
//!
//! Each technique derives one enhanced grayscale image from the raw
//! capture. Techniques are independent and each starts from the raw
//! pixels, so a failure in one never corrupts another.

use anyhow::{anyhow, Result};
use image::imageops::{self, FilterType};
use image::{GrayImage, ImageBuffer, Luma, Rgba};
use imageproc::contrast::{otsu_level, threshold, ThresholdType};
use imageproc::filter::{gaussian_blur_f32, median_filter};
use serde::{Deserialize, Serialize};

/// Upscale factor for the `Upscale` technique. Activity windows render
/// completion text small; 3x brings glyphs near Tesseract's sweet spot.
const UPSCALE_FACTOR: u32 = 3;

/// Gain/bias for the `Contrast` technique.
const CONTRAST_GAIN: f32 = 2.0;
const CONTRAST_BIAS: f32 = 30.0;

/// One named enhancement technique.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Technique {
    /// Plain luma conversion, no further processing
    Grayscale,
    /// Gaussian smoothing followed by Otsu thresholding
    Binarize,
    /// Linear gain/bias brightness-contrast boost
    Contrast,
    /// 3x3 median filtering to suppress compression noise
    Denoise,
    /// Geometric upscaling to improve glyph resolution
    Upscale,
}

impl Technique {
    /// All techniques, in the order they are attempted.
    pub const ALL: [Technique; 5] = [
        Technique::Grayscale,
        Technique::Binarize,
        Technique::Contrast,
        Technique::Denoise,
        Technique::Upscale,
    ];

    /// Short name used in logs and evidence summaries.
    pub fn label(self) -> &'static str {
        match self {
            Technique::Grayscale => "grayscale",
            Technique::Binarize => "binarize",
            Technique::Contrast => "contrast",
            Technique::Denoise => "denoise",
            Technique::Upscale => "upscale",
        }
    }
}

/// Applies one technique to the raw capture.
pub fn apply(technique: Technique, img: &ImageBuffer<Rgba<u8>, Vec<u8>>) -> Result<GrayImage> {
    let (width, height) = img.dimensions();
    if width == 0 || height == 0 {
        return Err(anyhow!("cannot enhance empty image ({}x{})", width, height));
    }

    let gray = imageops::grayscale(img);

    let enhanced = match technique {
        Technique::Grayscale => gray,
        Technique::Binarize => {
            let smoothed = gaussian_blur_f32(&gray, 1.0);
            let level = otsu_level(&smoothed);
            threshold(&smoothed, level, ThresholdType::Binary)
        }
        Technique::Contrast => adjust_gain_bias(&gray, CONTRAST_GAIN, CONTRAST_BIAS),
        Technique::Denoise => median_filter(&gray, 1, 1),
        Technique::Upscale => imageops::resize(
            &gray,
            width * UPSCALE_FACTOR,
            height * UPSCALE_FACTOR,
            FilterType::CatmullRom,
        ),
    };

    Ok(enhanced)
}

/// Derives the enhanced image for each requested technique.
///
/// A technique that fails is logged and omitted; the remaining techniques
/// still run. The returned sequence preserves the requested order.
pub fn variants(
    techniques: &[Technique],
    img: &ImageBuffer<Rgba<u8>, Vec<u8>>,
) -> Vec<(Technique, GrayImage)> {
    let mut out = Vec::with_capacity(techniques.len());

    for &technique in techniques {
        match apply(technique, img) {
            Ok(enhanced) => out.push((technique, enhanced)),
            Err(e) => {
                crate::log(&format!(
                    "Preprocessing technique {} skipped: {}",
                    technique.label(),
                    e
                ));
            }
        }
    }

    out
}

/// Linear brightness/contrast adjustment: out = clamp(gain * in + bias).
fn adjust_gain_bias(img: &GrayImage, gain: f32, bias: f32) -> GrayImage {
    let (width, height) = img.dimensions();
    let mut output = ImageBuffer::new(width, height);

    for (x, y, pixel) in img.enumerate_pixels() {
        let value = (gain * pixel[0] as f32 + bias).clamp(0.0, 255.0) as u8;
        output.put_pixel(x, y, Luma([value]));
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gradient_image(width: u32, height: u32) -> ImageBuffer<Rgba<u8>, Vec<u8>> {
        ImageBuffer::from_fn(width, height, |x, y| {
            let v = ((x + y) % 256) as u8;
            Rgba([v, v, v, 255])
        })
    }

    #[test]
    fn test_all_techniques_preserve_or_scale_dimensions() {
        let img = gradient_image(40, 20);

        for technique in Technique::ALL {
            let enhanced = apply(technique, &img).unwrap();
            let expected = if technique == Technique::Upscale {
                (40 * UPSCALE_FACTOR, 20 * UPSCALE_FACTOR)
            } else {
                (40, 20)
            };
            assert_eq!(enhanced.dimensions(), expected, "{}", technique.label());
        }
    }

    #[test]
    fn test_binarize_is_two_level() {
        let img = gradient_image(32, 32);
        let enhanced = apply(Technique::Binarize, &img).unwrap();
        assert!(enhanced.pixels().all(|p| p[0] == 0 || p[0] == 255));
    }

    #[test]
    fn test_contrast_boosts_midtones() {
        let img: ImageBuffer<Rgba<u8>, Vec<u8>> =
            ImageBuffer::from_pixel(4, 4, Rgba([100, 100, 100, 255]));
        let enhanced = apply(Technique::Contrast, &img).unwrap();
        // 2.0 * 100 + 30 = 230
        assert_eq!(enhanced.get_pixel(0, 0)[0], 230);
    }

    #[test]
    fn test_contrast_saturates() {
        let img: ImageBuffer<Rgba<u8>, Vec<u8>> =
            ImageBuffer::from_pixel(2, 2, Rgba([200, 200, 200, 255]));
        let enhanced = apply(Technique::Contrast, &img).unwrap();
        assert_eq!(enhanced.get_pixel(0, 0)[0], 255);
    }

    #[test]
    fn test_single_pixel_input() {
        let img: ImageBuffer<Rgba<u8>, Vec<u8>> =
            ImageBuffer::from_pixel(1, 1, Rgba([128, 128, 128, 255]));
        for technique in Technique::ALL {
            assert!(apply(technique, &img).is_ok(), "{}", technique.label());
        }
    }

    #[test]
    fn test_empty_image_rejected_not_panicking() {
        let img: ImageBuffer<Rgba<u8>, Vec<u8>> = ImageBuffer::new(0, 0);
        for technique in Technique::ALL {
            assert!(apply(technique, &img).is_err());
        }
    }

    #[test]
    fn test_variants_omits_failures_and_keeps_order() {
        let img = gradient_image(16, 16);
        let all = variants(&Technique::ALL, &img);
        assert_eq!(all.len(), 5);
        let order: Vec<Technique> = all.iter().map(|(t, _)| *t).collect();
        assert_eq!(order, Technique::ALL.to_vec());

        let empty: ImageBuffer<Rgba<u8>, Vec<u8>> = ImageBuffer::new(0, 0);
        assert!(variants(&Technique::ALL, &empty).is_empty());
    }
}
