// Read colours out of a pixel buffer at fractional coordinates
//
// Lookups never fail, asking outside the image gives NoData and the caller
// decides what colour that turns into.

use crate::pixels::{Colour, PixelBuffer};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SampleResult {
    Colour(Colour),
    NoData
}

impl SampleResult {
    pub fn or_fallback(self, fallback : &Colour) -> Colour {
        match self {
            SampleResult::Colour(colour) => colour,
            SampleResult::NoData => *fallback
        }
    }

    pub fn is_no_data(&self) -> bool {
        matches!(self, SampleResult::NoData)
    }
}

// Blend between a and b, truncating to a byte as the result is stored
pub fn lerp(a : f64, b : f64, t : f64) -> u8 {
    ((1.0 - t) * a + t * b) as u8
}

// Truncate towards zero, keeping track of values that can't be a pixel
pub fn truncate(x : f64, y : f64) -> Option<(i64, i64)> {
    if !x.is_finite() || !y.is_finite() {
        return None;
    }
    Some((x.trunc() as i64, y.trunc() as i64))
}

pub fn sample_nearest(buffer : &PixelBuffer, x : f64, y : f64) -> SampleResult {
    match truncate(x, y) {
        Some((px, py)) if buffer.in_bounds(px, py) =>
            SampleResult::Colour(buffer.colour(px as u32, py as u32)),
        _ => SampleResult::NoData
    }
}

// The whole 2x2 cell has to be inside the image, so the last row and
// column can only ever be reached as the far side of a cell.
pub fn sample_bilinear(buffer : &PixelBuffer, sx : f64, sy : f64) -> SampleResult {
    let max_x = buffer.width() as f64 - 1.0;
    let max_y = buffer.height() as f64 - 1.0;
    if !(sx >= 0.0 && sx < max_x && sy >= 0.0 && sy < max_y) {
        return SampleResult::NoData;
    }
    let x1 = sx.floor() as u32;
    let y1 = sy.floor() as u32;
    let xd = sx - x1 as f64;
    let yd = sy - y1 as f64;
    let mut samples = [0u8; 4];
    let channels = buffer.channels() as usize;
    for (c, sample) in samples.iter_mut().enumerate().take(channels) {
        let top = lerp(
            buffer.sample(x1, y1, c) as f64,
            buffer.sample(x1 + 1, y1, c) as f64,
            xd
        );
        let bottom = lerp(
            buffer.sample(x1, y1 + 1, c) as f64,
            buffer.sample(x1 + 1, y1 + 1, c) as f64,
            xd
        );
        *sample = lerp(top as f64, bottom as f64, yd);
    }
    match Colour::new(&samples[..channels]) {
        Ok(colour) => SampleResult::Colour(colour),
        Err(_) => SampleResult::NoData
    }
}
