// Errors raised while setting up a warp or talking to the image files.
//
// Anything that can go wrong is caught before the first pixel is touched,
// pixel work itself is total.

use std::io::{Error, ErrorKind};
use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum WarpError {
    #[error("viewport must have a positive size, got {width}x{height}")]
    EmptyViewport { width : u32, height : u32 },

    #[error("viewport {axis} range [{min}, {max}] is degenerate")]
    DegenerateRange { axis : &'static str, min : f64, max : f64 },

    #[error("function `{0}` has neither an inverse nor a derivative")]
    NotInvertible(String),

    #[error("function `{0}` has no closed-form inverse")]
    NoClosedForm(String),

    #[error("function `{0}` has no derivative for newton iteration")]
    NoDerivative(String),

    #[error("unknown function `{0}`")]
    UnknownFunction(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("buffer of {len} bytes does not hold {width}x{height}x{channels} samples")]
    BufferSize { len : usize, width : u32, height : u32, channels : u8 },

    #[error("unsupported channel count {0}, expected 1 to 4")]
    ChannelCount(usize),

    #[error(transparent)]
    Image(#[from] ImageIoError),
}

// Failures of the decode/encode collaborator, kept apart from the core
// so the caller can tell a missing file from a bad one.
#[derive(Debug, Error)]
pub enum ImageIoError {
    #[error("image file not found: {0}")]
    NotFound(PathBuf),

    #[error("unsupported image format for {path}: {reason}")]
    Unsupported { path : PathBuf, reason : String },

    #[error("couldn't decode {path}: {reason}")]
    Decode { path : PathBuf, reason : String },

    #[error("couldn't write {path}: {reason}")]
    Write { path : PathBuf, reason : String },
}

impl From<WarpError> for Error {
    fn from(err : WarpError) -> Error {
        let kind = match &err {
            WarpError::Image(ImageIoError::NotFound(_)) => ErrorKind::NotFound,
            WarpError::Image(ImageIoError::Unsupported { .. }) => ErrorKind::Unsupported,
            WarpError::Image(ImageIoError::Decode { .. }) => ErrorKind::InvalidData,
            WarpError::Image(ImageIoError::Write { .. }) => ErrorKind::Other,
            _ => ErrorKind::InvalidInput,
        };
        Error::new(kind, err)
    }
}

impl From<ImageIoError> for Error {
    fn from(err : ImageIoError) -> Error {
        WarpError::from(err).into()
    }
}
