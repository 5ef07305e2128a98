//! # Pixel Statistics
//!
//! Scalar image statistics shared by the heuristic feature extractors and the
//! capture quality assessment. Every function returns a value in 0.0-1.0.

use image::{GrayImage, RgbImage};

/// Luma below which a pixel counts as dark
pub const DARK_LUMA: f32 = 0.35;

/// Sobel gradient magnitude above which a pixel counts as an edge
pub const EDGE_GRADIENT: u16 = 160;

fn pixel_count((width, height): (u32, u32)) -> usize {
    width as usize * height as usize
}

fn fraction(count: usize, total: usize) -> f32 {
    if total == 0 {
        return 0.0;
    }
    count as f32 / total as f32
}

/// Mean pixel intensity of a grayscale image.
pub fn mean_luma(image: &GrayImage) -> f32 {
    let total_pixels = image.width() as u64 * image.height() as u64;
    if total_pixels == 0 {
        return 0.5; // Default neutral brightness
    }

    let sum: u64 = image.pixels().map(|p| p[0] as u64).sum();
    (sum as f64 / total_pixels as f64 / 255.0) as f32
}

/// Spread between the 10th and 90th luma percentiles.
///
/// Uniform images score close to 0.0, strongly contrasted ones close to 1.0.
pub fn contrast_range(image: &GrayImage) -> f32 {
    let mut pixels: Vec<u8> = image.pixels().map(|p| p[0]).collect();
    if pixels.is_empty() {
        return 0.0;
    }

    pixels.sort_unstable();

    let len = pixels.len();
    let p10 = pixels[(len as f32 * 0.1) as usize] as f32 / 255.0;
    let p90 = pixels[((len as f32 * 0.9) as usize).min(len - 1)] as f32 / 255.0;

    (p90 - p10).clamp(0.0, 1.0)
}

/// Variance of the Laplacian, normalized to 0.0-1.0.
///
/// High-frequency content (fine grain, lesion borders, focus) raises the score.
pub fn laplacian_variance(image: &GrayImage) -> f32 {
    let (width, height) = image.dimensions();

    if width < 3 || height < 3 {
        return 0.0;
    }

    let mut laplacian_sum = 0.0f64;
    let mut samples = 0u64;

    // Laplacian kernel: [[0, 1, 0], [1, -4, 1], [0, 1, 0]]
    for y in 1..height - 1 {
        for x in 1..width - 1 {
            let center = image.get_pixel(x, y)[0] as f64;
            let top = image.get_pixel(x, y - 1)[0] as f64;
            let bottom = image.get_pixel(x, y + 1)[0] as f64;
            let left = image.get_pixel(x - 1, y)[0] as f64;
            let right = image.get_pixel(x + 1, y)[0] as f64;

            let laplacian = -4.0 * center + top + bottom + left + right;
            laplacian_sum += laplacian * laplacian;
            samples += 1;
        }
    }

    let variance = laplacian_sum / samples as f64;

    // Rough normalization based on typical photo values
    ((variance / 1000.0) as f32).min(1.0)
}

/// Fraction of pixels whose luma is below [`DARK_LUMA`].
pub fn dark_fraction(image: &GrayImage) -> f32 {
    let threshold = (DARK_LUMA * 255.0) as u8;
    let dark = image.pixels().filter(|p| p[0] < threshold).count();
    fraction(dark, pixel_count(image.dimensions()))
}

/// Fraction of pixels that are dark and not green-dominant: lesions, rot and
/// necrotic spots on an otherwise green leaf.
pub fn lesion_fraction(rgb: &RgbImage, gray: &GrayImage) -> f32 {
    let threshold = (DARK_LUMA * 255.0) as u8;
    let lesions = rgb
        .pixels()
        .zip(gray.pixels())
        .filter(|(color, luma)| {
            let [r, g, b] = color.0;
            let green_dominant = g > r && g > b;
            luma[0] < threshold && !green_dominant
        })
        .count();
    fraction(lesions, pixel_count(rgb.dimensions()))
}

/// Mean of the smallest RGB channel: white and grey-white coatings score high,
/// saturated foliage scores low.
pub fn mean_whiteness(rgb: &RgbImage) -> f32 {
    let total = pixel_count(rgb.dimensions());
    if total == 0 {
        return 0.0;
    }
    let sum: u64 = rgb
        .pixels()
        .map(|p| p.0.iter().copied().min().unwrap_or(0) as u64)
        .sum();
    (sum as f64 / total as f64 / 255.0) as f32
}

/// Mean HSV saturation.
pub fn mean_saturation(rgb: &RgbImage) -> f32 {
    let total = pixel_count(rgb.dimensions());
    if total == 0 {
        return 0.0;
    }
    let sum: f64 = rgb
        .pixels()
        .map(|p| {
            let max = p.0.iter().copied().max().unwrap_or(0) as f64;
            let min = p.0.iter().copied().min().unwrap_or(0) as f64;
            if max == 0.0 {
                0.0
            } else {
                (max - min) / max
            }
        })
        .sum();
    (sum / total as f64) as f32
}

/// Fraction of pixels whose Sobel gradient magnitude exceeds [`EDGE_GRADIENT`].
pub fn edge_density(image: &GrayImage) -> f32 {
    if image.width() < 3 || image.height() < 3 {
        return 0.0;
    }
    let gradients = imageproc::gradients::sobel_gradients(image);
    let edges = gradients.pixels().filter(|p| p[0] > EDGE_GRADIENT).count();
    fraction(edges, pixel_count(gradients.dimensions()))
}
