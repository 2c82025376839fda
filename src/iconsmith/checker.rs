//! # Acceptance Checker
//!
//! Pure pixel inspection: given a decoded RGBA image, decide whether it meets
//! the icon layer contract.
//!
//! ## Checks
//!
//! 1. **Dimensions**: the canvas must be exactly [`CANVAS_SIZE`] square.
//! 2. **Background**: the four corner pixels must match the background of the
//!    active [`BackgroundMode`] within [`CORNER_TOLERANCE`] per channel.
//! 3. **Color count**: the silhouette (every pixel that is not background)
//!    must collapse into exactly one color bucket.
//!
//! ## Color bucketing
//!
//! Silhouette colors are first quantized by dropping the low
//! [`QUANT_SHIFT`] bits of each channel, then clustered greedily: buckets are
//! seeded from the most frequent color downwards, and a color joins the first
//! bucket whose seed lies within [`COLOR_TOLERANCE`] on every channel.
//! Exactly one bucket may hold [`MIN_BUCKET_SHARE_PERCENT`] or more of the
//! silhouette. A smaller bucket is discounted as edge anti-aliasing only when
//! its color lies on the blend line between the background and the dominant
//! color, and all discounted buckets together must stay within
//! [`MAX_BLEND_SHARE_PERCENT`]. Any other small bucket is a second color.
//!
//! Nothing here touches the filesystem or the network. Decoding lives in
//! [`decode`] so callers can classify unreadable bytes separately.

use crate::error::{IconError, Result};
use crate::model::BackgroundMode;
use image::{Rgba, RgbaImage};
use std::collections::HashMap;
use std::fmt;

/// Required width and height, in pixels.
pub const CANVAS_SIZE: u32 = 1024;

/// Per-channel slack when matching a corner against the background.
pub const CORNER_TOLERANCE: u8 = 16;

/// Pixels below this alpha are edge blending, never silhouette.
pub const SILHOUETTE_ALPHA_MIN: u8 = 128;

/// Per-channel distance under which two colors share a bucket.
pub const COLOR_TOLERANCE: u8 = 24;

/// Buckets smaller than this share of the silhouette may be edge blending.
pub const MIN_BUCKET_SHARE_PERCENT: u64 = 1;

/// Upper bound on the silhouette share that edge blending may account for.
pub const MAX_BLEND_SHARE_PERCENT: u64 = 5;

const QUANT_SHIFT: u8 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Corner {
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
}

impl Corner {
    pub const ALL: [Corner; 4] = [
        Corner::TopLeft,
        Corner::TopRight,
        Corner::BottomLeft,
        Corner::BottomRight,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Corner::TopLeft => "top-left",
            Corner::TopRight => "top-right",
            Corner::BottomLeft => "bottom-left",
            Corner::BottomRight => "bottom-right",
        }
    }

    fn coords(&self, width: u32, height: u32) -> (u32, u32) {
        let (right, bottom) = (width - 1, height - 1);
        match self {
            Corner::TopLeft => (0, 0),
            Corner::TopRight => (right, 0),
            Corner::BottomLeft => (0, bottom),
            Corner::BottomRight => (right, bottom),
        }
    }
}

/// A single reason an image was rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Violation {
    Dimensions {
        width: u32,
        height: u32,
    },
    Background {
        corner: Corner,
        pixel: [u8; 4],
        expected: BackgroundMode,
    },
    MultiColor {
        count: usize,
    },
    EmptySilhouette,
}

impl Violation {
    /// Short stable identifier, also used to pick corrective prompt text.
    pub fn code(&self) -> &'static str {
        match self {
            Violation::Dimensions { .. } => "dimensions",
            Violation::Background { .. } => "background",
            Violation::MultiColor { .. } => "multi-color",
            Violation::EmptySilhouette => "empty-silhouette",
        }
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Violation::Dimensions { width, height } => write!(
                f,
                "dimensions: expected {CANVAS_SIZE}x{CANVAS_SIZE}, got {width}x{height}"
            ),
            Violation::Background {
                corner,
                pixel: [r, g, b, a],
                expected,
            } => write!(
                f,
                "background: {} corner is rgba({r},{g},{b},{a}), expected {}",
                corner.label(),
                expected.describe()
            ),
            Violation::MultiColor { count } => write!(
                f,
                "multi-color: found {count} distinct silhouette colors, expected 1"
            ),
            Violation::EmptySilhouette => write!(f, "empty-silhouette: no silhouette found"),
        }
    }
}

/// Outcome of checking one image.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationResult {
    /// Ordered by check: dimensions, background, color count.
    pub violations: Vec<Violation>,
    /// Non-fatal observations (e.g. anti-aliasing clusters).
    pub warnings: Vec<String>,
}

impl ValidationResult {
    pub fn passed(&self) -> bool {
        self.violations.is_empty()
    }
}

/// Decode raw provider bytes into an RGBA pixel grid.
pub fn decode(bytes: &[u8]) -> Result<RgbaImage> {
    image::load_from_memory(bytes)
        .map(|img| img.to_rgba8())
        .map_err(|e| IconError::Decode(e.to_string()))
}

/// Run every check against `image`.
pub fn check(image: &RgbaImage, mode: BackgroundMode) -> ValidationResult {
    let mut result = ValidationResult::default();
    let (width, height) = image.dimensions();

    if width != CANVAS_SIZE || height != CANVAS_SIZE {
        result
            .violations
            .push(Violation::Dimensions { width, height });
    } else {
        check_corners(image, mode, &mut result);
    }

    check_color_count(image, mode, &mut result);
    result
}

fn check_corners(image: &RgbaImage, mode: BackgroundMode, result: &mut ValidationResult) {
    let (width, height) = image.dimensions();
    for corner in Corner::ALL {
        let (x, y) = corner.coords(width, height);
        let pixel = *image.get_pixel(x, y);
        if !corner_matches(pixel, mode) {
            result.violations.push(Violation::Background {
                corner,
                pixel: pixel.0,
                expected: mode,
            });
        }
    }
}

fn corner_matches(Rgba([r, g, b, a]): Rgba<u8>, mode: BackgroundMode) -> bool {
    match mode {
        BackgroundMode::Black => {
            r <= CORNER_TOLERANCE
                && g <= CORNER_TOLERANCE
                && b <= CORNER_TOLERANCE
                && a >= u8::MAX - CORNER_TOLERANCE
        }
        BackgroundMode::Transparent => a <= CORNER_TOLERANCE,
    }
}

fn is_background(Rgba([r, g, b, a]): Rgba<u8>, mode: BackgroundMode) -> bool {
    if a <= CORNER_TOLERANCE {
        return true;
    }
    match mode {
        BackgroundMode::Black => {
            r <= CORNER_TOLERANCE && g <= CORNER_TOLERANCE && b <= CORNER_TOLERANCE
        }
        BackgroundMode::Transparent => false,
    }
}

#[derive(Debug)]
struct Bucket {
    seed: [u8; 3],
    pixels: u64,
}

fn check_color_count(image: &RgbaImage, mode: BackgroundMode, result: &mut ValidationResult) {
    let mut histogram: HashMap<[u8; 3], u64> = HashMap::new();
    let mut total: u64 = 0;

    for pixel in image.pixels() {
        if is_background(*pixel, mode) || pixel.0[3] < SILHOUETTE_ALPHA_MIN {
            continue;
        }
        let [r, g, b, _] = pixel.0;
        let key = [r >> QUANT_SHIFT, g >> QUANT_SHIFT, b >> QUANT_SHIFT];
        *histogram.entry(key).or_default() += 1;
        total += 1;
    }

    if total == 0 {
        result.violations.push(Violation::EmptySilhouette);
        return;
    }

    let buckets = cluster(histogram);
    let bucket_count = buckets.len();
    let (significant, minor): (Vec<_>, Vec<_>) = buckets
        .into_iter()
        .partition(|b| b.pixels * 100 >= total * MIN_BUCKET_SHARE_PERCENT);

    let dominant = match significant.as_slice() {
        [only] => only.seed,
        [] => {
            result.violations.push(Violation::MultiColor {
                count: bucket_count,
            });
            return;
        }
        _ => {
            result.violations.push(Violation::MultiColor {
                count: significant.len(),
            });
            return;
        }
    };

    let (blends, details): (Vec<_>, Vec<_>) = minor
        .into_iter()
        .partition(|b| on_blend_line(b.seed, dominant));
    let blended: u64 = blends.iter().map(|b| b.pixels).sum();

    if !details.is_empty() {
        result.violations.push(Violation::MultiColor {
            count: 1 + details.len(),
        });
    } else if blended * 100 > total * MAX_BLEND_SHARE_PERCENT {
        result.violations.push(Violation::MultiColor {
            count: bucket_count,
        });
    } else if !blends.is_empty() {
        result.warnings.push(format!(
            "{} edge blend cluster(s) ignored ({blended} px, anti-aliasing)",
            blends.len()
        ));
    }
}

/// Whether `color` is `dominant` faded toward a black background. Edge
/// anti-aliasing produces exactly these mixes; transparent layers fade
/// through alpha and keep their RGB, which clusters with `dominant` anyway.
fn on_blend_line(color: [u8; 3], dominant: [u8; 3]) -> bool {
    let c = dequantize(color);
    let d = dequantize(dominant);
    let norm: f32 = d.iter().map(|v| v * v).sum();
    if norm == 0.0 {
        return false;
    }
    let t = (c.iter().zip(&d).map(|(a, b)| a * b).sum::<f32>() / norm).clamp(0.0, 1.0);
    c.iter()
        .zip(&d)
        .all(|(a, b)| (a - t * b).abs() <= f32::from(COLOR_TOLERANCE))
}

fn dequantize(key: [u8; 3]) -> [f32; 3] {
    key.map(|v| f32::from(v) * f32::from(1u8 << QUANT_SHIFT))
}

fn cluster(histogram: HashMap<[u8; 3], u64>) -> Vec<Bucket> {
    let mut colors: Vec<([u8; 3], u64)> = histogram.into_iter().collect();
    // Frequency first, then color value, so the result never depends on hash order
    colors.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));

    let tolerance = COLOR_TOLERANCE >> QUANT_SHIFT;
    let mut buckets: Vec<Bucket> = Vec::new();
    for (color, count) in colors {
        match buckets
            .iter_mut()
            .find(|b| within(b.seed, color, tolerance))
        {
            Some(bucket) => bucket.pixels += count,
            None => buckets.push(Bucket {
                seed: color,
                pixels: count,
            }),
        }
    }
    buckets
}

fn within(a: [u8; 3], b: [u8; 3], tolerance: u8) -> bool {
    a.iter().zip(b.iter()).all(|(x, y)| x.abs_diff(*y) <= tolerance)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::fixtures::{IconFixture, BLACK, CLEAR};

    const ORANGE: Rgba<u8> = Rgba([240, 120, 20, 255]);
    const TEAL: Rgba<u8> = Rgba([20, 160, 160, 255]);

    #[test]
    fn accepts_single_color_on_black() {
        let img = IconFixture::new().disk(ORANGE).build();
        let result = check(&img, BackgroundMode::Black);
        assert!(result.passed(), "{:?}", result.violations);
    }

    #[test]
    fn accepts_single_color_on_transparent() {
        let img = IconFixture::new().background(CLEAR).disk(ORANGE).build();
        let result = check(&img, BackgroundMode::Transparent);
        assert!(result.passed(), "{:?}", result.violations);
    }

    #[test]
    fn black_background_fails_transparent_mode() {
        let img = IconFixture::new().disk(ORANGE).build();
        let result = check(&img, BackgroundMode::Transparent);
        assert_eq!(
            result
                .violations
                .iter()
                .filter(|v| v.code() == "background")
                .count(),
            4
        );
    }

    #[test]
    fn rejects_wrong_dimensions() {
        let img = IconFixture::new().size(512).disk(ORANGE).build();
        let result = check(&img, BackgroundMode::Black);
        assert_eq!(
            result.violations,
            vec![Violation::Dimensions {
                width: 512,
                height: 512
            }]
        );
    }

    #[test]
    fn rejects_lit_corner() {
        let img = IconFixture::new()
            .disk(ORANGE)
            .corner(Corner::BottomRight, Rgba([200, 200, 200, 255]))
            .build();
        let result = check(&img, BackgroundMode::Black);
        assert!(!result.passed());
        assert!(matches!(
            result.violations[0],
            Violation::Background {
                corner: Corner::BottomRight,
                ..
            }
        ));
    }

    #[test]
    fn tolerates_near_black_corners() {
        let img = IconFixture::new()
            .background(Rgba([10, 12, 9, 255]))
            .disk(ORANGE)
            .build();
        assert!(check(&img, BackgroundMode::Black).passed());
    }

    #[test]
    fn rejects_two_silhouette_colors() {
        let img = IconFixture::new().split_disk(ORANGE, TEAL).build();
        let result = check(&img, BackgroundMode::Black);
        assert_eq!(result.violations, vec![Violation::MultiColor { count: 2 }]);
    }

    #[test]
    fn groups_near_identical_colors() {
        let img = IconFixture::new()
            .split_disk(ORANGE, Rgba([236, 126, 24, 255]))
            .build();
        assert!(check(&img, BackgroundMode::Black).passed());
    }

    #[test]
    fn anti_aliasing_is_a_warning_not_a_color() {
        let img = IconFixture::new().disk(ORANGE).soft_edge().build();
        let result = check(&img, BackgroundMode::Black);
        assert!(result.passed(), "{:?}", result.violations);
        assert_eq!(result.warnings.len(), 1);
    }

    /// Black canvas with a 624px square in the middle painted by `paint`.
    fn square(paint: impl Fn(u32, u32) -> Rgba<u8>) -> RgbaImage {
        RgbaImage::from_fn(CANVAS_SIZE, CANVAS_SIZE, |x, y| {
            if (200..824).contains(&x) && (200..824).contains(&y) {
                paint(x, y)
            } else {
                BLACK
            }
        })
    }

    fn fade(color: Rgba<u8>, t: f32) -> Rgba<u8> {
        let [r, g, b, a] = color.0;
        let f = |v: u8| (f32::from(v) * t) as u8;
        Rgba([f(r), f(g), f(b), a])
    }

    #[test]
    fn palette_of_small_clusters_is_multi_color() {
        // 512 colors spaced 30 apart per channel, none above the bucket share
        let img = square(|x, y| {
            let i = (x + y * 7) % 512;
            let level = |n: u32| (30 + (n % 8) * 30) as u8;
            Rgba([level(i), level(i / 8), level(i / 64), 255])
        });
        let result = check(&img, BackgroundMode::Black);
        assert!(!result.passed());
        assert!(matches!(
            result.violations[..],
            [Violation::MultiColor { count }] if count > 1
        ));
    }

    #[test]
    fn small_detail_in_a_second_color_is_rejected() {
        // 57x57 teal patch, under 1% of the silhouette
        let img = square(|x, y| {
            if (400..457).contains(&x) && (400..457).contains(&y) {
                TEAL
            } else {
                ORANGE
            }
        });
        let result = check(&img, BackgroundMode::Black);
        assert_eq!(result.violations, vec![Violation::MultiColor { count: 2 }]);
    }

    #[test]
    fn faded_bands_beyond_the_blend_allowance_are_rejected() {
        // Six 6-row bands of orange faded toward black: each under 1%, together
        // over the blend allowance
        let fades = [0.1, 0.25, 0.4, 0.55, 0.7, 0.85];
        let img = square(|_, y| {
            let band = ((y - 200) / 6) as usize;
            fades.get(band).map_or(ORANGE, |&t| fade(ORANGE, t))
        });
        let result = check(&img, BackgroundMode::Black);
        assert!(matches!(
            result.violations[..],
            [Violation::MultiColor { .. }]
        ));
    }

    #[test]
    fn a_few_faded_bands_pass_as_edge_blending() {
        let fades = [0.25, 0.55];
        let img = square(|_, y| {
            let band = ((y - 200) / 6) as usize;
            fades.get(band).map_or(ORANGE, |&t| fade(ORANGE, t))
        });
        let result = check(&img, BackgroundMode::Black);
        assert!(result.passed(), "{:?}", result.violations);
        assert_eq!(result.warnings.len(), 1);
    }

    #[test]
    fn blank_canvas_has_no_silhouette() {
        let img = IconFixture::new().build();
        let result = check(&img, BackgroundMode::Black);
        assert_eq!(result.violations, vec![Violation::EmptySilhouette]);
    }

    #[test]
    fn violations_are_ordered_by_check() {
        let img = IconFixture::new()
            .split_disk(ORANGE, TEAL)
            .corner(Corner::TopLeft, Rgba([255, 255, 255, 255]))
            .build();
        let codes: Vec<_> = check(&img, BackgroundMode::Black)
            .violations
            .iter()
            .map(Violation::code)
            .collect();
        assert_eq!(codes, vec!["background", "multi-color"]);
    }

    #[test]
    fn check_is_deterministic() {
        let img = IconFixture::new().split_disk(ORANGE, TEAL).soft_edge().build();
        let first = check(&img, BackgroundMode::Black);
        for _ in 0..3 {
            assert_eq!(check(&img, BackgroundMode::Black), first);
        }
    }

    #[test]
    fn decode_rejects_garbage() {
        let err = decode(b"definitely not a png").unwrap_err();
        assert!(matches!(err, IconError::Decode(_)));
    }

    #[test]
    fn decode_reads_png_bytes() {
        let bytes = IconFixture::new().disk(ORANGE).png();
        let img = decode(&bytes).unwrap();
        assert_eq!(img.dimensions(), (CANVAS_SIZE, CANVAS_SIZE));
        assert_eq!(*img.get_pixel(0, 0), BLACK);
    }
}
