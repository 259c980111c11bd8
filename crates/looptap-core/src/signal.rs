//! Stereo sawtooth test tone.
//!
//! Feeds a recognisable signal into headless captures. The right channel
//! rises three times faster than the left so the two are easy to tell apart.

/// Two-channel sawtooth ranging over `[-0.1, 0.1)`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Sawtooth {
    left_phase: f32,
    right_phase: f32,
}

impl Sawtooth {
    const LEFT_STEP: f32 = 0.001;
    const RIGHT_STEP: f32 = 0.003;
    const PEAK: f32 = 0.1;

    pub fn new() -> Self {
        Self::default()
    }

    /// Write `frames` interleaved frames into `out` (one value per channel).
    ///
    /// Channels beyond the second repeat the right channel.
    pub fn fill(&mut self, out: &mut [f32], channels: usize) {
        let channels = channels.max(1);
        for frame in out.chunks_mut(channels) {
            for (ch, sample) in frame.iter_mut().enumerate() {
                *sample = if ch == 0 {
                    self.left_phase
                } else {
                    self.right_phase
                };
            }
            self.advance();
        }
    }

    /// Generate `frames` interleaved frames.
    pub fn take(&mut self, frames: usize, channels: usize) -> Vec<f32> {
        let mut out = vec![0.0; frames * channels.max(1)];
        self.fill(&mut out, channels);
        out
    }

    fn advance(&mut self) {
        self.left_phase += Self::LEFT_STEP;
        if self.left_phase >= Self::PEAK {
            self.left_phase -= 2.0 * Self::PEAK;
        }
        self.right_phase += Self::RIGHT_STEP;
        if self.right_phase >= Self::PEAK {
            self.right_phase -= 2.0 * Self::PEAK;
        }
    }
}
