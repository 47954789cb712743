// Interleaved 8 bit pixel storage with 1 to 4 channels per pixel
//
// Rows are stored top to bottom, each pixel holds `channels` bytes.

use json::JsonValue;

use crate::error::WarpError;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Colour {
    samples : [u8; 4],
    channels : u8
}

impl Colour {
    pub fn new(samples : &[u8]) -> Result<Colour, WarpError> {
        if samples.is_empty() || samples.len() > 4 {
            return Err(WarpError::ChannelCount(samples.len()));
        }
        let mut colour = Colour { samples : [0; 4], channels : samples.len() as u8 };
        colour.samples[..samples.len()].copy_from_slice(samples);
        Ok(colour)
    }

    // Opaque black, the colour used where there is no source data
    pub fn opaque_black() -> Colour {
        Colour { samples : [0, 0, 0, 255], channels : 4 }
    }

    pub fn transparent() -> Colour {
        Colour { samples : [0, 0, 0, 0], channels : 4 }
    }

    // Accepts [r, g, b] style arrays of 1 to 4 integers
    pub fn from_json(input : &JsonValue, default : Colour) -> Result<Colour, WarpError> {
        if input.is_null() {
            return Ok(default);
        }
        if !input.is_array() {
            return Err(WarpError::InvalidConfig(format!("colour must be an array, got {}", input)));
        }
        let samples = input.members().map(
            |i| i.as_u8().ok_or_else(
                || WarpError::InvalidConfig(format!("bad colour sample {}", i))
            )
        ).collect::<Result<Vec<u8>, WarpError>>()?;
        Colour::new(&samples)
    }

    pub fn channels(&self) -> u8 {
        self.channels
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.samples[..self.channels as usize]
    }

    // Drop trailing samples to fit a buffer with fewer channels.
    // Missing ones are zero filled.
    pub fn truncated(&self, channels : u8) -> Colour {
        let channels = channels.clamp(1, 4);
        let mut samples = [0; 4];
        let keep = channels.min(self.channels) as usize;
        samples[..keep].copy_from_slice(&self.samples[..keep]);
        Colour { samples, channels }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PixelBuffer {
    width : u32,
    height : u32,
    channels : u8,
    data : Vec<u8>
}

impl PixelBuffer {
    pub fn new(width : u32, height : u32, channels : u8) -> Result<PixelBuffer, WarpError> {
        PixelBuffer::filled(width, height, &Colour::transparent().truncated(channels.max(1)), channels)
    }

    pub fn filled(
        width : u32,
        height : u32,
        colour : &Colour,
        channels : u8
    ) -> Result<PixelBuffer, WarpError> {
        if !(1..=4).contains(&channels) {
            return Err(WarpError::ChannelCount(channels as usize));
        }
        let colour = colour.truncated(channels);
        let data = colour.as_slice().repeat(width as usize * height as usize);
        Ok(PixelBuffer { width, height, channels, data })
    }

    pub fn from_raw(
        width : u32,
        height : u32,
        channels : u8,
        data : Vec<u8>
    ) -> Result<PixelBuffer, WarpError> {
        if !(1..=4).contains(&channels) {
            return Err(WarpError::ChannelCount(channels as usize));
        }
        if data.len() != width as usize * height as usize * channels as usize {
            return Err(WarpError::BufferSize { len : data.len(), width, height, channels });
        }
        Ok(PixelBuffer { width, height, channels, data })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn channels(&self) -> u8 {
        self.channels
    }

    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn in_bounds(&self, x : i64, y : i64) -> bool {
        x >= 0 && y >= 0 && x < self.width as i64 && y < self.height as i64
    }

    fn offset(&self, x : u32, y : u32) -> usize {
        (y as usize * self.width as usize + x as usize) * self.channels as usize
    }

    // Panics outside the image, callers bounds check first
    pub fn pixel(&self, x : u32, y : u32) -> &[u8] {
        let start = self.offset(x, y);
        &self.data[start..start + self.channels as usize]
    }

    pub fn colour(&self, x : u32, y : u32) -> Colour {
        Colour { samples : self.sample4(x, y), channels : self.channels }
    }

    fn sample4(&self, x : u32, y : u32) -> [u8; 4] {
        let mut samples = [0; 4];
        samples[..self.channels as usize].copy_from_slice(self.pixel(x, y));
        samples
    }

    pub fn sample(&self, x : u32, y : u32, channel : usize) -> u8 {
        self.data[self.offset(x, y) + channel]
    }

    pub fn put_pixel(&mut self, x : u32, y : u32, samples : &[u8]) {
        let start = self.offset(x, y);
        let len = self.channels as usize;
        self.data[start..start + len].copy_from_slice(&samples[..len]);
    }

    pub fn put_colour(&mut self, x : u32, y : u32, colour : &Colour) {
        let colour = colour.truncated(self.channels);
        self.put_pixel(x, y, colour.as_slice());
    }

    // Copy one pixel from another buffer with the same channel count
    pub fn copy_pixel(&mut self, x : u32, y : u32, from : &PixelBuffer, fx : u32, fy : u32) {
        let start = self.offset(x, y);
        let len = self.channels as usize;
        self.data[start..start + len].copy_from_slice(from.pixel(fx, fy));
    }

    pub fn fill(&mut self, colour : &Colour) {
        let colour = colour.truncated(self.channels);
        for pixel in self.data.chunks_exact_mut(self.channels as usize) {
            pixel.copy_from_slice(colour.as_slice());
        }
    }

    pub fn count_matching(&self, colour : &Colour) -> usize {
        let colour = colour.truncated(self.channels);
        self.data.chunks_exact(self.channels as usize).filter(
            |pixel| *pixel == colour.as_slice()
        ).count()
    }
}
