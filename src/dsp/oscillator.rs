use std::f32::consts::TAU;

use crate::engine::Waveform;

/*
Oscillator Waveforms
====================

Phase-accumulator synthesis: phase runs 0..1 once per cycle and each
waveform is a cheap shaping of it.

  Sine       sin(TAU * phase). Fundamental only.
  Square     +1 for the first half cycle, -1 for the second. Odd
             harmonics falling off as 1/n.
  Sawtooth   linear ramp -1..1 over the cycle. All harmonics, 1/n.
  Triangle   fold of the ramp: -1 at the cycle edges, +1 at the middle.
             Odd harmonics, 1/n^2.

These are naive (non-bandlimited) shapes. Above a few kHz the square and
sawtooth alias audibly; for patch playback at musical pitches that is an
accepted trade for per-sample cost.
*/

/// One mono waveform generator at a fixed frequency.
#[derive(Debug, Clone)]
pub struct Oscillator {
    waveform: Waveform,
    frequency: f32,
    phase: f32, // 0..1, wraps each cycle
}

impl Oscillator {
    pub fn new(waveform: Waveform, frequency: f32) -> Self {
        Self {
            waveform,
            frequency,
            phase: 0.0,
        }
    }

    pub fn frequency(&self) -> f32 {
        self.frequency
    }

    /// Produce the sample for the current phase, then advance one step.
    pub fn next_sample(&mut self, sample_rate: f32) -> f32 {
        let value = match self.waveform {
            Waveform::Sine => (TAU * self.phase).sin(),
            Waveform::Square => {
                if self.phase < 0.5 {
                    1.0
                } else {
                    -1.0
                }
            }
            Waveform::Sawtooth => 2.0 * self.phase - 1.0,
            Waveform::Triangle => 1.0 - 4.0 * (self.phase - 0.5).abs(),
        };

        self.phase += self.frequency / sample_rate;
        if self.phase >= 1.0 {
            self.phase -= self.phase.floor();
        }

        value
    }

    /// Fill a buffer with consecutive samples.
    pub fn render(&mut self, out: &mut [f32], sample_rate: f32) {
        for sample in out.iter_mut() {
            *sample = self.next_sample(sample_rate);
        }
    }
}
