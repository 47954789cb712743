// Animated two stage warp
//
// First the source is scattered forwards a few pixels per frame while the
// source pane empties out. The holey result then sits on screen until enter
// is pressed, after which it is repaired row by row with inverse gather.

use json::JsonValue;
use log::{debug, info};

use crate::display::{Display, DisplayEvent, Key, Pane};
use crate::error::WarpError;
use crate::pixels::{Colour, PixelBuffer};
use crate::progressive::{ProgressiveRemap, StepBudget};
use crate::remap::RemapMode;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    ForwardMapping,
    WaitForEnter,
    InverseMapping,
    Done
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AnimationSettings {
    pub forward_budget : StepBudget,
    pub inverse_budget : StepBudget
}

impl AnimationSettings {
    // Five rows worth of pixels forwards, five rows backwards per frame
    pub fn for_width(width : u32) -> AnimationSettings {
        AnimationSettings {
            forward_budget : StepBudget::Pixels(width as usize * 5),
            inverse_budget : StepBudget::Rows(5)
        }
    }

    pub fn from_json(input : &JsonValue, width : u32) -> Result<AnimationSettings, WarpError> {
        let defaults = AnimationSettings::for_width(width);
        let settings = AnimationSettings {
            forward_budget : input["pixels_per_frame"].as_usize()
                .map(StepBudget::Pixels)
                .unwrap_or(defaults.forward_budget),
            inverse_budget : input["rows_per_frame"].as_usize()
                .map(StepBudget::Rows)
                .unwrap_or(defaults.inverse_budget)
        };
        settings.check()?;
        Ok(settings)
    }

    // A zero budget would leave a phase running forever
    pub fn check(&self) -> Result<(), WarpError> {
        if self.forward_budget.is_empty() || self.inverse_budget.is_empty() {
            return Err(WarpError::InvalidConfig(format!(
                "per frame budgets must be at least 1, got {:?} and {:?}",
                self.forward_budget, self.inverse_budget
            )));
        }
        Ok(())
    }
}

pub struct Session {
    remap : ProgressiveRemap,
    // The source with every already scattered pixel blanked out
    consumed : PixelBuffer,
    phase : Phase,
    settings : AnimationSettings,
    quit : bool
}

impl Session {
    pub fn new(mut remap : ProgressiveRemap, settings : AnimationSettings) -> Result<Session, WarpError> {
        settings.check()?;
        // The repair stage has to be possible before any of this starts
        remap.validate(RemapMode::InverseGather)?;
        remap.start(RemapMode::ForwardScatter)?;
        let consumed = remap.source().clone();
        Ok(Session { remap, consumed, phase : Phase::ForwardMapping, settings, quit : false })
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn has_quit(&self) -> bool {
        self.quit
    }

    pub fn is_finished(&self) -> bool {
        self.quit || self.phase == Phase::Done
    }

    pub fn consumed_source(&self) -> &PixelBuffer {
        &self.consumed
    }

    pub fn frame(&self) -> &PixelBuffer {
        self.remap.current_frame()
    }

    pub fn handle_event(&mut self, event : DisplayEvent) -> Result<(), WarpError> {
        match event {
            DisplayEvent::Quit | DisplayEvent::KeyPress(Key::Escape) => {
                info!("Quit during {:?}", self.phase);
                self.quit = true;
            },
            DisplayEvent::KeyPress(Key::Enter) if self.phase == Phase::WaitForEnter => {
                self.remap.start_in_place(RemapMode::InverseGather)?;
                self.phase = Phase::InverseMapping;
                info!("Repairing with inverse gather");
            },
            DisplayEvent::KeyPress(_) => {}
        }
        Ok(())
    }

    // Move the current stage on by one frame's worth of work
    pub fn tick(&mut self) -> Result<(), WarpError> {
        match self.phase {
            Phase::ForwardMapping => {
                let before = self.cursor();
                let done = self.remap.advance(self.settings.forward_budget)?;
                self.blank_consumed(before, self.cursor());
                debug!("Forward scatter {:.0}% done", self.remap.progress() * 100.0);
                if done {
                    self.phase = Phase::WaitForEnter;
                    info!("Forward scatter finished, waiting for enter");
                }
            },
            Phase::InverseMapping => {
                if self.remap.advance(self.settings.inverse_budget)? {
                    self.phase = Phase::Done;
                    info!("Inverse gather finished");
                }
            },
            Phase::WaitForEnter | Phase::Done => {}
        }
        Ok(())
    }

    fn cursor(&self) -> usize {
        self.remap.job().map(|job| job.cursor).unwrap_or(0)
    }

    fn blank_consumed(&mut self, from : usize, to : usize) {
        let width = self.consumed.width() as usize;
        let blank = Colour::transparent();
        for index in from..to {
            self.consumed.put_colour((index % width) as u32, (index / width) as u32, &blank);
        }
    }

    // What should be on screen right now
    pub fn frames(&self) -> Vec<(Pane, &PixelBuffer)> {
        match self.phase {
            Phase::ForwardMapping => vec![
                (Pane::Source, &self.consumed),
                (Pane::Forward, self.remap.current_frame())
            ],
            _ => vec![(Pane::Main, self.remap.current_frame())]
        }
    }

    // Drive the session from a display until it is done or told to stop
    pub fn run(&mut self, display : &mut dyn Display) -> Result<Phase, WarpError> {
        while !self.is_finished() {
            for event in display.poll_events() {
                self.handle_event(event)?;
            }
            if self.quit {
                break;
            }
            self.tick()?;
            for (pane, frame) in self.frames() {
                display.present(pane, frame)?;
            }
        }
        Ok(self.phase)
    }

    pub fn into_frame(self) -> PixelBuffer {
        self.remap.into_frame()
    }
}
