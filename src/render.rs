// Render scheduling for the task views
// At most one pending frame: requests made before the next tick merge into it

use crate::models::{Task, Theme};
use crate::view::{Stats, UpcomingEntry};

/// What a render request turned into
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderRequest {
    /// Render synchronously now
    Now,
    /// A frame was scheduled for the next tick
    Scheduled,
    /// A frame was already pending; this request merged into it
    Coalesced,
}

#[derive(Debug, Default)]
pub struct RenderScheduler {
    pending: bool,
    frames: u64,
}

impl RenderScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn request(&mut self, immediate: bool) -> RenderRequest {
        if immediate {
            // The synchronous render shows the latest state; a pending frame would repeat it
            self.pending = false;
            self.frames += 1;
            RenderRequest::Now
        } else if self.pending {
            RenderRequest::Coalesced
        } else {
            self.pending = true;
            RenderRequest::Scheduled
        }
    }

    /// Consume the pending frame, if any. Called once per tick.
    pub fn take_pending(&mut self) -> bool {
        if self.pending {
            self.pending = false;
            self.frames += 1;
            true
        } else {
            false
        }
    }

    pub fn is_pending(&self) -> bool {
        self.pending
    }

    /// Frames rendered so far (immediate and ticked)
    pub fn frames(&self) -> u64 {
        self.frames
    }
}

/// Everything a UI layer needs to draw one frame
#[derive(Debug)]
pub struct Frame<'a> {
    pub theme: Theme,
    pub today: &'a str,
    pub stats: Stats,
    pub due_today: &'a [Task],
    pub upcoming: &'a [UpcomingEntry],
}

/// Rendering backend supplied by the UI layer
pub trait Renderer: Send {
    fn render(&mut self, frame: &Frame<'_>);
}

/// Default renderer: emits a one-line summary of each frame
#[derive(Debug, Default)]
pub struct LogRenderer;

impl Renderer for LogRenderer {
    fn render(&mut self, frame: &Frame<'_>) {
        tracing::debug!(
            theme = frame.theme.as_str(),
            today = frame.today,
            total = frame.stats.total,
            pending = frame.stats.pending,
            due_today = frame.due_today.len(),
            upcoming = frame.upcoming.len(),
            "render"
        );
    }
}
