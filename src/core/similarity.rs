use std::path::Path;

use image::GrayImage;

/// One bin per 8-bit intensity value.
pub const HISTOGRAM_BINS: usize = 256;

/// Correlation at or above this classifies a pair as the same scene.
pub const SIMILARITY_THRESHOLD: f64 = 0.65;

/// Scores photo pairs by correlating their grayscale intensity
/// histograms. Spatial layout is ignored entirely, so a reshuffled
/// image with the same tonal distribution still scores as a match.
pub struct SimilarityEngine {
    threshold: f64,
}

impl SimilarityEngine {
    pub fn new() -> Self {
        Self {
            threshold: SIMILARITY_THRESHOLD,
        }
    }

    /// Classify two photo files as the same scene or not.
    ///
    /// Never fails: a missing, unreadable, or empty file on either side
    /// counts as "not similar".
    pub fn images_similar(&self, a: &Path, b: &Path) -> bool {
        match self.correlation(a, b) {
            Some(score) => score >= self.threshold,
            None => false,
        }
    }

    /// Histogram correlation for a pair, or `None` when either file
    /// cannot be decoded.
    pub fn correlation(&self, a: &Path, b: &Path) -> Option<f64> {
        let image_a = load_grayscale(a)?;
        let image_b = load_grayscale(b)?;

        let hist_a = normalized_histogram(&image_a);
        let hist_b = normalized_histogram(&image_b);

        Some(pearson_correlation(&hist_a, &hist_b))
    }
}

impl Default for SimilarityEngine {
    fn default() -> Self {
        Self::new()
    }
}

/// Decode a file as 8-bit grayscale. Missing, corrupt, zero-byte and
/// zero-pixel files all come back as `None`.
fn load_grayscale(path: &Path) -> Option<GrayImage> {
    let image = match image::open(path) {
        Ok(image) => image,
        Err(err) => {
            log::debug!("Failed to decode {}: {}", path.display(), err);
            return None;
        }
    };

    let gray = image.to_luma8();
    if gray.width() == 0 || gray.height() == 0 {
        log::debug!("Image {} has no pixels", path.display());
        return None;
    }

    Some(gray)
}

fn normalized_histogram(image: &GrayImage) -> [f64; HISTOGRAM_BINS] {
    let mut bins = intensity_histogram(image);
    normalize_min_max(&mut bins);
    bins
}

/// Count pixels per intensity value over `[0, 256)`, bin width 1.
fn intensity_histogram(image: &GrayImage) -> [f64; HISTOGRAM_BINS] {
    let mut bins = [0.0f64; HISTOGRAM_BINS];
    for pixel in image.iter() {
        bins[*pixel as usize] += 1.0;
    }
    bins
}

/// Min-max scale the bins into `[0.0, 1.0]` in place. A constant
/// histogram has no range to scale over and maps to all zeros.
fn normalize_min_max(bins: &mut [f64; HISTOGRAM_BINS]) {
    let mut min = f64::INFINITY;
    let mut max = f64::NEG_INFINITY;
    for &count in bins.iter() {
        min = min.min(count);
        max = max.max(count);
    }

    let range = max - min;
    if range <= f64::EPSILON {
        bins.fill(0.0);
        return;
    }

    for count in bins.iter_mut() {
        *count = (*count - min) / range;
    }
}

/// Pearson correlation coefficient between two equal-length vectors.
///
/// Zero variance on either side makes the usual formula divide by zero;
/// that case is pinned: 1.0 when the vectors are element-wise identical,
/// 0.0 otherwise.
fn pearson_correlation(a: &[f64], b: &[f64]) -> f64 {
    debug_assert_eq!(a.len(), b.len());
    let n = a.len() as f64;
    if n == 0.0 {
        return 0.0;
    }

    let mean_a = a.iter().sum::<f64>() / n;
    let mean_b = b.iter().sum::<f64>() / n;

    let mut cov = 0.0;
    let mut var_a = 0.0;
    let mut var_b = 0.0;
    for (&x, &y) in a.iter().zip(b.iter()) {
        let dx = x - mean_a;
        let dy = y - mean_b;
        cov += dx * dy;
        var_a += dx * dx;
        var_b += dy * dy;
    }

    let denom = (var_a * var_b).sqrt();
    if denom < f64::EPSILON {
        return if a == b { 1.0 } else { 0.0 };
    }

    cov / denom
}
