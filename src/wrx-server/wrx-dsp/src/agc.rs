// SPDX-FileCopyrightText: 2025 Stanislaw Grams <stanislawgrams@gmail.com>
//
// SPDX-License-Identifier: BSD-2-Clause

/// Level-tracking audio AGC.
///
/// Gain drops quickly (`attack`) when the amplified sample is above the
/// target and recovers slowly (`decay`) when below. Gain stays within
/// `[1, max_gain]` and the output is hard clipped to `±clip`.
#[derive(Debug, Clone)]
pub struct AudioAgc {
    target: f32,
    max_gain: f32,
    attack: f32,
    decay: f32,
    clip: f32,
    gain: f32,
}

impl AudioAgc {
    pub fn new(target: f32, max_gain: f32, attack: f32, decay: f32, clip: f32) -> Self {
        Self {
            target,
            max_gain: max_gain.max(1.0),
            attack,
            decay,
            clip,
            gain: 1.0,
        }
    }

    pub fn gain(&self) -> f32 {
        self.gain
    }

    #[inline]
    pub fn process(&mut self, x: f32) -> f32 {
        let level = (x * self.gain).abs();
        if level > self.target {
            self.gain -= self.attack * (level - self.target);
        } else if level < self.target {
            self.gain += self.decay * (self.target - level);
        }
        self.gain = self.gain.clamp(1.0, self.max_gain);
        (x * self.gain).clamp(-self.clip, self.clip)
    }

    pub fn process_in_place(&mut self, samples: &mut [f32]) {
        for s in samples {
            *s = self.process(*s);
        }
    }
}

impl Default for AudioAgc {
    fn default() -> Self {
        Self::new(0.3, 1000.0, 1.0, 0.01, 0.99)
    }
}
