// Purpose - external interfaces, format conversions

pub mod converter;
pub mod midi;

/// Planar output buffers, one `Vec` per channel.
#[derive(Debug, Default, Clone)]
pub struct AudioOutput {
    pub buffers: Vec<Vec<f32>>,
}

impl AudioOutput {
    pub fn new(channels: usize, frames: usize) -> Self {
        Self {
            buffers: vec![vec![0.0; frames]; channels],
        }
    }

    pub fn channels(&self) -> usize {
        self.buffers.len()
    }

    /// Frames every channel can hold.
    pub fn frames(&self) -> usize {
        self.buffers.iter().map(Vec::len).min().unwrap_or(0)
    }

    /// Write the first `frames` frames into an interleaved buffer of
    /// `channels` channels. Extra output channels repeat the last buffer;
    /// with no buffers at all the output is silence.
    pub fn interleave_into(&self, out: &mut [f32], channels: usize, frames: usize) {
        if channels == 0 {
            return;
        }

        let frames = frames.min(self.frames());
        for (i, frame) in out.chunks_exact_mut(channels).take(frames).enumerate() {
            for (ch, sample) in frame.iter_mut().enumerate() {
                *sample = match self.buffers.len() {
                    0 => 0.0,
                    n => self.buffers[ch.min(n - 1)][i],
                };
            }
        }
    }
}
