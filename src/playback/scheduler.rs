/// Handle for one scheduled animation frame. Passing it back to
/// [`FrameScheduler::cancel`] guarantees the frame never fires.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FrameToken(u64);

pub trait FrameScheduler {
    fn schedule_next_frame(&mut self) -> FrameToken;
    fn cancel(&mut self, token: FrameToken);
}

/// Display-refresh driven scheduler: frames requested before a refresh fire
/// on that refresh, frames requested while handling it wait for the next one.
#[derive(Debug, Default)]
pub struct AnimationClock {
    next_id: u64,
    pending: Vec<FrameToken>,
}

impl AnimationClock {
    pub fn new() -> Self {
        Self::default()
    }

    #[allow(dead_code)]
    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// Advance to the next display refresh and hand out the frames due on it.
    pub fn refresh(&mut self) -> Vec<FrameToken> {
        std::mem::take(&mut self.pending)
    }
}

impl FrameScheduler for AnimationClock {
    fn schedule_next_frame(&mut self) -> FrameToken {
        self.next_id += 1;
        let token = FrameToken(self.next_id);
        self.pending.push(token);
        token
    }

    fn cancel(&mut self, token: FrameToken) {
        self.pending.retain(|&t| t != token);
    }
}
