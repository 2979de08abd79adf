/// Observable playback phase derived from [`PlaybackState`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize)]
pub enum PlaybackPhase {
    /// No dataset loaded yet.
    Idle,
    /// Loaded, paused by the user.
    Paused,
    /// Loaded and advancing one frame per tick.
    Playing,
    /// All frames rendered; nothing leaves this phase.
    Finished,
}

/// The only mutable entity of the animation: the play flag and frame cursor.
///
/// The frame index moves forward by exactly 1 per tick while playing, never
/// decreases, and never exceeds the dataset length. There is no rewind,
/// scrubbing, or looping.
#[derive(Clone, Debug)]
pub struct PlaybackState {
    len: usize,
    frame_index: usize,
    is_playing: bool,
    loaded: bool,
}

impl PlaybackState {
    /// State before any dataset is available.
    pub fn idle() -> Self {
        Self {
            len: 0,
            frame_index: 0,
            is_playing: false,
            loaded: false,
        }
    }

    /// State entered once the dataset load completes; playback starts
    /// immediately (the play flag initializes to true).
    pub fn ready(len: usize) -> Self {
        Self {
            len,
            frame_index: 0,
            is_playing: true,
            loaded: true,
        }
    }

    pub fn phase(&self) -> PlaybackPhase {
        if !self.loaded {
            PlaybackPhase::Idle
        } else if self.frame_index >= self.len {
            PlaybackPhase::Finished
        } else if self.is_playing {
            PlaybackPhase::Playing
        } else {
            PlaybackPhase::Paused
        }
    }

    pub fn frame_index(&self) -> usize {
        self.frame_index
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn is_playing(&self) -> bool {
        self.is_playing
    }

    pub fn is_finished(&self) -> bool {
        self.phase() == PlaybackPhase::Finished
    }

    /// Flip the play/pause flag. Has no effect on the frame index, and none
    /// at all outside the two Ready phases.
    pub fn toggle_play(&mut self) -> PlaybackPhase {
        match self.phase() {
            PlaybackPhase::Playing | PlaybackPhase::Paused => {
                self.is_playing = !self.is_playing;
            }
            PlaybackPhase::Idle | PlaybackPhase::Finished => {}
        }
        self.phase()
    }

    /// One timer tick: while playing and frames remain, return the index to
    /// render and advance the cursor by 1. Returns `None` otherwise.
    pub fn advance_frame(&mut self) -> Option<usize> {
        if self.phase() != PlaybackPhase::Playing {
            return None;
        }
        let index = self.frame_index;
        self.frame_index += 1;
        Some(index)
    }
}

/// Normalized progress of the marker along the timeline while frame `index`
/// is on screen.
///
/// Computed as `(index - 1) / (len - 1)`: the marker lags the displayed year
/// by one frame, a deliberate quirk of the chart. The result is clamped to
/// `[0, 1]` and a single-frame dataset (denominator zero) maps to `0`.
pub fn progress_fraction(index: usize, len: usize) -> f64 {
    if len < 2 {
        return 0.0;
    }
    let adjusted = index as f64 - 1.0;
    (adjusted / (len as f64 - 1.0)).clamp(0.0, 1.0)
}
