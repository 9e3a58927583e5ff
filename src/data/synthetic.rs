//! Procedurally drawn digit-like images, so training can be demonstrated
//! without a dataset on disk.
//!
//! Each image is a seven-segment rendering of the digit `i % 10` on a 28×28
//! grayscale canvas, with per-image jitter in position, slant and stroke
//! width so the set is not trivially repetitive. Pixels lie in [0, 1].

use rand::{rngs::StdRng, Rng, SeedableRng};

use crate::data::dataset::{Dataset, ImageShape};
use crate::Result;

const SIDE: usize = 28;

// Segments a..g as (x0, y0, x1, y1) in a unit box:
//  aaa
// f   b
//  ggg
// e   c
//  ddd
const SEGMENTS: [(f64, f64, f64, f64); 7] = [
    (0.0, 0.0, 1.0, 0.0), // a
    (1.0, 0.0, 1.0, 0.5), // b
    (1.0, 0.5, 1.0, 1.0), // c
    (0.0, 1.0, 1.0, 1.0), // d
    (0.0, 0.5, 0.0, 1.0), // e
    (0.0, 0.0, 0.0, 0.5), // f
    (0.0, 0.5, 1.0, 0.5), // g
];

// Bit i set = segment i lit, for digits 0-9.
const DIGITS: [u8; 10] = [
    0b0111111, 0b0000110, 0b1011011, 0b1001111, 0b1100110,
    0b1101101, 0b1111101, 0b0000111, 0b1111111, 0b1101111,
];

/// `count` images cycling through the digits 0-9.
pub fn seven_segment_digits(count: usize, seed: u64) -> Result<Dataset> {
    let mut rng = StdRng::seed_from_u64(seed);
    let images = (0..count).map(|i| draw_digit(i % 10, &mut rng)).collect();
    Dataset::from_images(ImageShape::mnist(), images)
}

fn draw_digit(digit: usize, rng: &mut StdRng) -> Vec<f64> {
    let width = rng.gen_range(8.0..12.0);
    let height = rng.gen_range(15.0..19.0);
    let left = rng.gen_range(4.0..(SIDE as f64 - width - 4.0));
    let top = rng.gen_range(3.0..(SIDE as f64 - height - 3.0));
    let slant = rng.gen_range(-0.25..0.25);
    let stroke = rng.gen_range(1.0..1.8);

    let to_canvas = |x: f64, y: f64| {
        let py = top + y * height;
        let px = left + x * width + slant * (height * 0.5 - y * height);
        (px, py)
    };

    let lit: Vec<_> = SEGMENTS.iter().enumerate()
        .filter(|(i, _)| DIGITS[digit] & (1 << i) != 0)
        .map(|(_, &(x0, y0, x1, y1))| (to_canvas(x0, y0), to_canvas(x1, y1)))
        .collect();

    let mut pixels = vec![0.0; SIDE * SIDE];
    for (idx, px) in pixels.iter_mut().enumerate() {
        let p = ((idx % SIDE) as f64 + 0.5, (idx / SIDE) as f64 + 0.5);
        let d = lit.iter()
            .map(|&(a, b)| segment_distance(p, a, b))
            .fold(f64::INFINITY, f64::min);
        // Anti-aliased edge one pixel wide.
        *px = (stroke + 0.5 - d).clamp(0.0, 1.0);
    }
    pixels
}

fn segment_distance(p: (f64, f64), a: (f64, f64), b: (f64, f64)) -> f64 {
    let (dx, dy) = (b.0 - a.0, b.1 - a.1);
    let len2 = dx * dx + dy * dy;
    let t = if len2 == 0.0 {
        0.0
    } else {
        (((p.0 - a.0) * dx + (p.1 - a.1) * dy) / len2).clamp(0.0, 1.0)
    };
    let (cx, cy) = (a.0 + t * dx, a.1 + t * dy);
    ((p.0 - cx).powi(2) + (p.1 - cy).powi(2)).sqrt()
}
