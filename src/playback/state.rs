use std::fmt;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PlaybackState {
    Unstarted,
    Loading,
    Playing,
    Paused,
    Finished,
}

impl fmt::Display for PlaybackState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PlaybackState::Unstarted => "unstarted",
            PlaybackState::Loading => "loading",
            PlaybackState::Playing => "playing",
            PlaybackState::Paused => "paused",
            PlaybackState::Finished => "finished",
        };
        f.write_str(name)
    }
}

/// Where the current playing segment started, in collaborator clock seconds,
/// and how far into the media playback had already got before it.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct PlaybackClock {
    pub start_time: f64,
    pub start_offset: f64,
}

impl PlaybackClock {
    pub fn begin(now: f64) -> Self {
        Self {
            start_time: now,
            start_offset: 0.0,
        }
    }

    /// Elapsed media time of a running segment.
    pub fn running_position(&self, now: f64) -> f64 {
        self.start_offset + (now - self.start_time)
    }

    /// Freeze the clock: fold the running segment into the offset.
    pub fn suspend(&mut self, now: f64) {
        self.start_offset += now - self.start_time;
    }

    /// Start a new segment at `now`. Returns the offset to seek the source
    /// to, wrapped into the media so an overshooting offset starts over.
    pub fn resume(&mut self, now: f64, duration: f64) -> f64 {
        self.start_time = now;
        if duration > 0.0 {
            self.start_offset % duration
        } else {
            0.0
        }
    }
}
