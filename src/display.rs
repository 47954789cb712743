// Where progressive frames are shown and where input comes from
//
// A display takes frames for a named pane and hands back whatever events
// arrived since it was last asked. The frame writer is a display with no
// window, it saves frames to numbered files and replays a fixed script of
// key presses.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use json::JsonValue;
use log::debug;

use crate::error::WarpError;
use crate::io;
use crate::pixels::PixelBuffer;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Key {
    Enter,
    Escape
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DisplayEvent {
    Quit,
    KeyPress(Key)
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Pane {
    // The source image being used up by forward scatter
    Source,
    // The holey forward scatter result
    Forward,
    // The single view used once forward scatter is over
    Main
}

impl Pane {
    pub fn name(&self) -> &'static str {
        match self {
            Pane::Source => "source",
            Pane::Forward => "forward",
            Pane::Main => "main"
        }
    }
}

pub trait Display {
    fn present(&mut self, pane : Pane, frame : &PixelBuffer) -> Result<(), WarpError>;
    fn poll_events(&mut self) -> Vec<DisplayEvent>;
}

pub struct FrameWriter {
    directory : PathBuf,
    frame_stride : usize,
    auto_continue : bool,
    quit_after : Option<usize>,
    polls : usize,
    presented : HashMap<Pane, usize>,
    written : usize
}

impl FrameWriter {
    pub fn new(directory : &Path) -> FrameWriter {
        FrameWriter {
            directory : directory.to_path_buf(),
            frame_stride : 1,
            auto_continue : true,
            quit_after : None,
            polls : 0,
            presented : HashMap::new(),
            written : 0
        }
    }

    pub fn from_json(input : &JsonValue, directory : &Path) -> Result<FrameWriter, WarpError> {
        let frame_stride = input["frame_stride"].as_usize().unwrap_or(1);
        if frame_stride == 0 {
            return Err(WarpError::InvalidConfig("frame_stride must be at least 1".to_string()));
        }
        let auto_continue = input["auto_continue"].as_bool().unwrap_or(true);
        let quit_after = input["quit_after"].as_usize();
        if !auto_continue && quit_after.is_none() {
            return Err(WarpError::InvalidConfig(
                "without auto_continue a quit_after is needed or nothing ever presses enter".to_string()
            ));
        }
        Ok(FrameWriter { frame_stride, auto_continue, quit_after, ..FrameWriter::new(directory) })
    }

    pub fn frames_written(&self) -> usize {
        self.written
    }

    fn frame_path(&self, pane : Pane, index : usize) -> PathBuf {
        self.directory.join(pane.name()).join(format!("{}.png", index))
    }
}

impl Display for FrameWriter {
    fn present(&mut self, pane : Pane, frame : &PixelBuffer) -> Result<(), WarpError> {
        let count = self.presented.entry(pane).or_insert(0);
        let index = *count;
        *count += 1;
        if index % self.frame_stride != 0 {
            return Ok(());
        }
        let path = self.frame_path(pane, index / self.frame_stride);
        debug!("Writing {} frame to {}", pane.name(), path.display());
        io::save(&path, frame)?;
        self.written += 1;
        Ok(())
    }

    fn poll_events(&mut self) -> Vec<DisplayEvent> {
        self.polls += 1;
        match self.quit_after {
            Some(limit) if self.polls > limit => vec![DisplayEvent::Quit],
            _ if self.auto_continue => vec![DisplayEvent::KeyPress(Key::Enter)],
            _ => Vec::new()
        }
    }
}
