// Map between the pixel grid and a rectangle of the complex plane
//
// The mapping is affine on each axis. Going back to pixels gives fractional
// coordinates, callers decide whether to truncate or interpolate.

use json::JsonValue;
use num::complex::Complex;

use crate::error::WarpError;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Viewport {
    re_min : f64,
    re_max : f64,
    im_min : f64,
    im_max : f64,
    width : u32,
    height : u32
}

fn check_range(axis : &'static str, min : f64, max : f64) -> Result<(), WarpError> {
    let extent = max - min;
    if !min.is_finite() || !max.is_finite() || !extent.is_finite() || extent == 0.0 {
        return Err(WarpError::DegenerateRange { axis, min, max });
    }
    Ok(())
}

impl Viewport {
    pub fn new(
        re : (f64, f64),
        im : (f64, f64),
        width : u32,
        height : u32
    ) -> Result<Viewport, WarpError> {
        if width == 0 || height == 0 {
            return Err(WarpError::EmptyViewport { width, height });
        }
        check_range("real", re.0, re.1)?;
        check_range("imaginary", im.0, im.1)?;
        Ok(Viewport {
            re_min : re.0,
            re_max : re.1,
            im_min : im.0,
            im_max : im.1,
            width,
            height
        })
    }

    // The square [-2,2] x [-2,2] used when nothing else is asked for
    pub fn centred(width : u32, height : u32) -> Result<Viewport, WarpError> {
        Viewport::new((-2.0, 2.0), (-2.0, 2.0), width, height)
    }

    pub fn from_json(input : &JsonValue, width : u32, height : u32) -> Result<Viewport, WarpError> {
        if input.is_null() {
            return Viewport::centred(width, height);
        }
        let re_min = input["re_min"].as_f64().unwrap_or(-2.0);
        let re_max = input["re_max"].as_f64().unwrap_or(2.0);
        let im_min = input["im_min"].as_f64().unwrap_or(-2.0);
        let im_max = input["im_max"].as_f64().unwrap_or(2.0);
        Viewport::new((re_min, re_max), (im_min, im_max), width, height)
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn to_complex(&self, x : f64, y : f64) -> Complex<f64> {
        Complex::new(
            x / self.width as f64 * (self.re_max - self.re_min) + self.re_min,
            y / self.height as f64 * (self.im_max - self.im_min) + self.im_min
        )
    }

    pub fn to_pixel(&self, z : Complex<f64>) -> (f64, f64) {
        (
            (z.re - self.re_min) / (self.re_max - self.re_min) * self.width as f64,
            (z.im - self.im_min) / (self.im_max - self.im_min) * self.height as f64
        )
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;

    use super::*;

    #[test]
    fn test_corners() {
        let view = Viewport::centred(100, 50).unwrap();
        let origin = view.to_complex(0.0, 0.0);
        assert_abs_diff_eq!(origin.re, -2.0);
        assert_abs_diff_eq!(origin.im, -2.0);
        let centre = view.to_complex(50.0, 25.0);
        assert_abs_diff_eq!(centre.re, 0.0);
        assert_abs_diff_eq!(centre.im, 0.0);
        // The far edge is one past the last pixel
        let far = view.to_complex(100.0, 50.0);
        assert_abs_diff_eq!(far.re, 2.0);
        assert_abs_diff_eq!(far.im, 2.0);
    }

    #[test]
    fn test_to_pixel_keeps_fraction() {
        let view = Viewport::centred(4, 4).unwrap();
        let (x, y) = view.to_pixel(Complex::new(-1.5, 0.5));
        assert_abs_diff_eq!(x, 0.5);
        assert_abs_diff_eq!(y, 2.5);
    }

    #[test]
    fn test_round_trip() {
        let view = Viewport::new((-3.0, 1.0), (0.5, 2.5), 37, 11).unwrap();
        for (x, y) in [(0.0, 0.0), (3.25, 7.5), (36.0, 10.0)] {
            let (px, py) = view.to_pixel(view.to_complex(x, y));
            assert_abs_diff_eq!(px, x, epsilon = 1e-9);
            assert_abs_diff_eq!(py, y, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_flipped_range_is_allowed() {
        let view = Viewport::new((2.0, -2.0), (-2.0, 2.0), 4, 4).unwrap();
        assert_abs_diff_eq!(view.to_complex(0.0, 0.0).re, 2.0);
        assert_abs_diff_eq!(view.to_pixel(Complex::new(-2.0, 0.0)).0, 4.0);
    }

    #[test]
    fn test_degenerate_viewports() {
        assert!(matches!(
            Viewport::new((1.0, 1.0), (-2.0, 2.0), 4, 4),
            Err(WarpError::DegenerateRange { axis : "real", .. })
        ));
        assert!(matches!(
            Viewport::new((-2.0, 2.0), (0.0, f64::NAN), 4, 4),
            Err(WarpError::DegenerateRange { axis : "imaginary", .. })
        ));
        assert!(matches!(
            Viewport::centred(0, 4),
            Err(WarpError::EmptyViewport { .. })
        ));
    }

    #[test]
    fn test_from_json_defaults() {
        let input = json::parse(r#"{ "re_min" : -1.0 }"#).unwrap();
        let view = Viewport::from_json(&input, 8, 8).unwrap();
        assert_eq!(view, Viewport::new((-1.0, 2.0), (-2.0, 2.0), 8, 8).unwrap());
    }
}
