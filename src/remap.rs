// Push or pull every pixel of an image through a complex function
//
// Forward scatter sends each source pixel to wherever f takes it, which
// leaves holes and lets later pixels overwrite earlier ones in raster order.
// Inverse gather asks, for each destination pixel, where it came from and
// samples the source there, so every pixel gets a value.

use std::ops::Range;

use json::JsonValue;
use log::debug;

use crate::error::WarpError;
use crate::function::{ComplexFunction, InverseStrategy, Inverter, NewtonSolver};
use crate::pixels::{Colour, PixelBuffer};
use crate::plane::Viewport;
use crate::sampler::{sample_bilinear, sample_nearest, truncate, SampleResult};

// Round trips through the plane land within a few ulps of a whole pixel,
// treat anything that close as exact.
const SNAP_EPSILON : f64 = 1e-9;

fn snap(v : f64) -> f64 {
    let r = v.round();
    if (v - r).abs() < SNAP_EPSILON { r } else { v }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RemapMode {
    ForwardScatter,
    InverseGather
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Interpolation {
    Bilinear,
    Nearest
}

impl Interpolation {
    pub fn from_json(input : &JsonValue) -> Result<Interpolation, WarpError> {
        match input.as_str().unwrap_or("bilinear") {
            "bilinear" => Ok(Interpolation::Bilinear),
            "nearest" => Ok(Interpolation::Nearest),
            other => Err(WarpError::InvalidConfig(format!("unknown interpolation `{}`", other)))
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RemapOptions {
    pub strategy : InverseStrategy,
    pub solver : NewtonSolver,
    pub interpolation : Interpolation,
    // Starting colour of a fresh destination
    pub fill : Colour,
    // Written where inverse gather finds no source data
    pub fallback : Colour
}

impl Default for RemapOptions {
    fn default() -> RemapOptions {
        RemapOptions {
            strategy : InverseStrategy::Auto,
            solver : NewtonSolver::default(),
            interpolation : Interpolation::Bilinear,
            fill : Colour::transparent(),
            fallback : Colour::opaque_black()
        }
    }
}

impl RemapOptions {
    pub fn from_json(input : &JsonValue) -> Result<RemapOptions, WarpError> {
        let defaults = RemapOptions::default();
        Ok(RemapOptions {
            strategy : InverseStrategy::from_json(&input["inverse"])?,
            solver : NewtonSolver::from_json(&input["newton"]),
            interpolation : Interpolation::from_json(&input["interpolation"])?,
            fill : Colour::from_json(&input["fill"], defaults.fill)?,
            fallback : Colour::from_json(&input["fallback"], defaults.fallback)?
        })
    }
}

pub struct RemapEngine<'a> {
    source : &'a PixelBuffer,
    viewport : &'a Viewport,
    function : &'a ComplexFunction,
    inverter : Option<Inverter<'a>>,
    options : &'a RemapOptions,
    mode : RemapMode
}

impl<'a> RemapEngine<'a> {
    pub fn new(
        source : &'a PixelBuffer,
        viewport : &'a Viewport,
        function : &'a ComplexFunction,
        options : &'a RemapOptions,
        mode : RemapMode
    ) -> Result<RemapEngine<'a>, WarpError> {
        if viewport.width() != source.width() || viewport.height() != source.height() {
            return Err(WarpError::InvalidConfig(format!(
                "viewport grid {}x{} doesn't match image {}x{}",
                viewport.width(), viewport.height(), source.width(), source.height()
            )));
        }
        let inverter = match mode {
            RemapMode::ForwardScatter => None,
            RemapMode::InverseGather => Some(function.inverter(options.strategy, options.solver)?)
        };
        debug!(
            "{:?} of {}x{} image through {}, closed form inverse: {}",
            mode, source.width(), source.height(), function.name(),
            inverter.as_ref().map(|inv| inv.is_closed_form()).unwrap_or(false)
        );
        Ok(RemapEngine { source, viewport, function, inverter, options, mode })
    }

    pub fn mode(&self) -> RemapMode {
        self.mode
    }

    // Units of work in a full pass, one per pixel
    pub fn total(&self) -> usize {
        self.source.pixel_count()
    }

    pub fn blank_destination(&self) -> Result<PixelBuffer, WarpError> {
        PixelBuffer::filled(
            self.source.width(),
            self.source.height(),
            &self.options.fill,
            self.source.channels()
        )
    }

    // Where forward scatter sends source pixel (x, y), if anywhere
    pub fn scatter_target(&self, x : u32, y : u32) -> Option<(u32, u32)> {
        let z = self.viewport.to_complex(x as f64, y as f64);
        let w = self.function.forward(z);
        let (px, py) = self.viewport.to_pixel(w);
        let (nx, ny) = truncate(snap(px), snap(py))?;
        if self.source.in_bounds(nx, ny) {
            Some((nx as u32, ny as u32))
        } else {
            None
        }
    }

    // Where inverse gather samples the source for destination pixel (nx, ny)
    pub fn gather_source(&self, nx : u32, ny : u32) -> Option<(f64, f64)> {
        let inverter = self.inverter.as_ref()?;
        let w = self.viewport.to_complex(nx as f64, ny as f64);
        let z = inverter.invert(w);
        let (sx, sy) = self.viewport.to_pixel(z);
        Some((snap(sx), snap(sy)))
    }

    fn gather_colour(&self, nx : u32, ny : u32) -> Colour {
        let sample = match self.gather_source(nx, ny) {
            Some((sx, sy)) => match self.options.interpolation {
                Interpolation::Bilinear => sample_bilinear(self.source, sx, sy),
                Interpolation::Nearest => sample_nearest(self.source, sx, sy)
            },
            None => SampleResult::NoData
        };
        sample.or_fallback(&self.options.fallback)
    }

    // Run the pixels with raster indices in `range` into `dest`
    pub fn process(&self, range : Range<usize>, dest : &mut PixelBuffer) {
        let width = self.source.width() as usize;
        let end = range.end.min(self.total());
        for index in range.start..end {
            let x = (index % width) as u32;
            let y = (index / width) as u32;
            match self.mode {
                RemapMode::ForwardScatter => {
                    if let Some((nx, ny)) = self.scatter_target(x, y) {
                        dest.copy_pixel(nx, ny, self.source, x, y);
                    }
                },
                RemapMode::InverseGather => {
                    let colour = self.gather_colour(x, y);
                    dest.put_colour(x, y, &colour);
                }
            }
        }
    }

    // The whole image in one go
    pub fn run(&self) -> Result<PixelBuffer, WarpError> {
        let mut dest = self.blank_destination()?;
        self.process(0..self.total(), &mut dest);
        Ok(dest)
    }
}
