// Run a remap a slice at a time so a display loop can show it being built
//
// The scheduler owns the destination buffer for the whole run. Between
// steps the buffer is always a valid image, part new and part whatever was
// there before, so it can be shown or abandoned at any point.

use log::{debug, info, warn};

use crate::error::WarpError;
use crate::function::ComplexFunction;
use crate::pixels::PixelBuffer;
use crate::plane::Viewport;
use crate::remap::{RemapEngine, RemapMode, RemapOptions};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StepBudget {
    Pixels(usize),
    // A partly done row counts as one of these
    Rows(usize)
}

impl StepBudget {
    fn end(&self, cursor : usize, width : usize, total : usize) -> usize {
        let end = match *self {
            StepBudget::Pixels(n) => cursor.saturating_add(n),
            StepBudget::Rows(0) => cursor,
            StepBudget::Rows(n) => (cursor / width).saturating_add(n).saturating_mul(width)
        };
        end.min(total)
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, StepBudget::Pixels(0) | StepBudget::Rows(0))
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MappingJob {
    pub mode : RemapMode,
    // Raster index of the next pixel to process
    pub cursor : usize,
    pub total : usize,
    pub done : bool
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SchedulerState {
    Idle,
    Running(RemapMode),
    Complete(RemapMode)
}

pub struct ProgressiveRemap {
    source : PixelBuffer,
    viewport : Viewport,
    function : ComplexFunction,
    options : RemapOptions,
    destination : PixelBuffer,
    job : Option<MappingJob>
}

impl ProgressiveRemap {
    pub fn new(
        source : PixelBuffer,
        viewport : Viewport,
        function : ComplexFunction,
        options : RemapOptions
    ) -> Result<ProgressiveRemap, WarpError> {
        let destination = RemapEngine::new(
            &source, &viewport, &function, &options, RemapMode::ForwardScatter
        )?.blank_destination()?;
        Ok(ProgressiveRemap { source, viewport, function, options, destination, job : None })
    }

    // Begin a run over a freshly filled destination
    pub fn start(&mut self, mode : RemapMode) -> Result<(), WarpError> {
        self.begin(mode)?;
        self.destination.fill(&self.options.fill);
        Ok(())
    }

    // Begin a run drawing over whatever the destination holds now
    pub fn start_in_place(&mut self, mode : RemapMode) -> Result<(), WarpError> {
        self.begin(mode)
    }

    // Check a run in this mode could be started, without starting it
    pub fn validate(&self, mode : RemapMode) -> Result<(), WarpError> {
        self.engine(mode).map(|_| ())
    }

    fn engine(&self, mode : RemapMode) -> Result<RemapEngine<'_>, WarpError> {
        RemapEngine::new(&self.source, &self.viewport, &self.function, &self.options, mode)
    }

    fn begin(&mut self, mode : RemapMode) -> Result<(), WarpError> {
        // Fail before touching the buffer if this mode can't run
        let total = self.engine(mode)?.total();
        info!("Starting {:?} over {} pixels", mode, total);
        self.job = Some(MappingJob { mode, cursor : 0, total, done : total == 0 });
        Ok(())
    }

    // Do up to `budget` more work, returning whether the run has finished.
    // With nothing running there is nothing to finish.
    pub fn advance(&mut self, budget : StepBudget) -> Result<bool, WarpError> {
        let mut job = match self.job {
            Some(job) => job,
            None => return Ok(false)
        };
        if job.done {
            return Ok(true);
        }
        if budget.is_empty() {
            warn!("Empty step budget, {:?} makes no progress", job.mode);
            return Ok(false);
        }
        let engine = RemapEngine::new(&self.source, &self.viewport, &self.function, &self.options, job.mode)?;
        let end = budget.end(job.cursor, self.source.width() as usize, job.total);
        engine.process(job.cursor..end, &mut self.destination);
        debug!("{:?} processed {}..{} of {}", job.mode, job.cursor, end, job.total);
        job.cursor = end;
        if job.cursor >= job.total {
            job.done = true;
            info!("{:?} complete", job.mode);
        }
        self.job = Some(job);
        Ok(job.done)
    }

    pub fn run_to_completion(&mut self, budget : StepBudget) -> Result<(), WarpError> {
        if self.job.is_none() || budget.is_empty() {
            return Ok(());
        }
        while !self.advance(budget)? {}
        Ok(())
    }

    // Drop the current run. The frame keeps whatever was drawn so far.
    pub fn cancel(&mut self) {
        if let Some(job) = self.job.take() {
            info!("Cancelled {:?} at {} of {}", job.mode, job.cursor, job.total);
        }
    }

    pub fn current_frame(&self) -> &PixelBuffer {
        &self.destination
    }

    pub fn into_frame(self) -> PixelBuffer {
        self.destination
    }

    pub fn source(&self) -> &PixelBuffer {
        &self.source
    }

    pub fn job(&self) -> Option<&MappingJob> {
        self.job.as_ref()
    }

    pub fn state(&self) -> SchedulerState {
        match self.job {
            None => SchedulerState::Idle,
            Some(job) if job.done => SchedulerState::Complete(job.mode),
            Some(job) => SchedulerState::Running(job.mode)
        }
    }

    pub fn progress(&self) -> f64 {
        match self.job {
            None => 0.0,
            Some(job) if job.total == 0 => 1.0,
            Some(job) => job.cursor as f64 / job.total as f64
        }
    }
}
