// This file is part of residfp-core.
// Copyright (c) 2017-2019 Sebastian Jastrzebski <sebby2k@gmail.com>. All rights reserved.
// Portions (c) 2004 Dag Lem <resid@nimrod.no>
// Licensed under the GPLv3. See LICENSE file in the project root for full license text.

//! Sample rate conversion from the chip clock to the audio rate.
//!
//! All resamplers consume one sample per chip cycle and report when an
//! output sample is ready. They share a fixed-point phase accumulator with
//! 1024 subdivisions per output sample.

mod cache;
mod fir;
mod sinc;
mod soft_clip;
mod two_pass;
mod zero_order;

#[cfg(feature = "std")]
pub use self::cache::FirCache;
pub use self::cache::FirKey;
pub use self::fir::{i0, FirSpec, FirTable};
pub use self::sinc::{SincResampler, RING_SIZE};
pub use self::soft_clip::{soft_clip, SOFT_CLIP_THRESHOLD};
pub use self::two_pass::TwoPassSincResampler;
pub use self::zero_order::ZeroOrderResampler;

use crate::SamplingError;

/// Phase units per output sample.
const PHASE_SHIFT: u32 = 10;
const PHASE_ONE: i32 = 1 << PHASE_SHIFT;
const PHASE_MASK: usize = (PHASE_ONE - 1) as usize;

/// Streaming converter from chip-rate to output-rate samples.
pub trait Resampler {
    /// Feeds one input sample; returns true when a new output is ready.
    fn input(&mut self, sample: f32) -> bool;

    /// Most recent output sample.
    fn output(&self) -> f32;

    /// Discards all history.
    fn reset(&mut self);

    /// Feeds one input sample, returning the output if one became ready.
    #[inline]
    fn next_sample(&mut self, sample: f32) -> Option<f32> {
        if self.input(sample) {
            Some(self.output())
        } else {
            None
        }
    }

    /// Current output scaled and soft clipped into 16 bits.
    #[inline]
    fn output_i16(&self, scale: f32) -> i16 {
        soft_clip(self.output() * scale)
    }
}

/// Position of the next output sample relative to the input stream.
#[derive(Clone, Copy, Debug)]
struct PhaseAccumulator {
    /// Fixed-point, 1024 units per output sample.
    offset: i32,
    cycles_per_sample: i32,
}

impl PhaseAccumulator {
    fn new(clock_freq: f64, sample_freq: f64) -> Self {
        Self {
            offset: 0,
            cycles_per_sample: (clock_freq / sample_freq * PHASE_ONE as f64) as i32,
        }
    }

    /// Steps one input sample. Returns the sub-sample phase when an output
    /// falls due before the next input.
    #[inline]
    fn advance(&mut self) -> Option<i32> {
        let subcycle = if self.offset < PHASE_ONE {
            let subcycle = self.offset;
            self.offset += self.cycles_per_sample;
            Some(subcycle)
        } else {
            None
        };
        self.offset -= PHASE_ONE;
        subcycle
    }

    fn reset(&mut self) {
        self.offset = 0;
    }
}

/// Checks a clock/sample rate pair for a downsampling converter.
fn validate_rates(clock_freq: f64, sample_freq: f64) -> Result<(), SamplingError> {
    if !(clock_freq > 0.0) {
        return Err(SamplingError::ZeroClockFreq);
    }
    if !(sample_freq > 0.0) {
        return Err(SamplingError::ZeroSampleFreq);
    }
    if clock_freq < sample_freq {
        return Err(SamplingError::Upsampling);
    }
    Ok(())
}
