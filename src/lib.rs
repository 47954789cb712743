// Warp images by treating pixels as points on the complex plane
//
// A viewport ties the pixel grid to a rectangle of the plane. Pixels are
// either pushed forwards through a complex function or pulled back through
// its inverse and resampled, in one go or a slice at a time.

pub mod display;
pub mod error;
pub mod function;
pub mod io;
pub mod pixels;
pub mod plane;
pub mod progressive;
pub mod remap;
pub mod sampler;
pub mod session;

pub use error::{ImageIoError, WarpError};
pub use function::{ComplexFunction, ComplexPolynomial, InverseStrategy, NewtonSolver};
pub use pixels::{Colour, PixelBuffer};
pub use plane::Viewport;
pub use progressive::{MappingJob, ProgressiveRemap, SchedulerState, StepBudget};
pub use remap::{Interpolation, RemapEngine, RemapMode, RemapOptions};
pub use sampler::{sample_bilinear, sample_nearest, SampleResult};
