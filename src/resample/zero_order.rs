// This file is part of residfp-core.
// Copyright (c) 2017-2019 Sebastian Jastrzebski <sebby2k@gmail.com>. All rights reserved.
// Portions (c) 2004 Dag Lem <resid@nimrod.no>
// Licensed under the GPLv3. See LICENSE file in the project root for full license text.

//! Linear interpolation between consecutive input samples. Cheap, aliases.

use super::{validate_rates, PhaseAccumulator, Resampler, PHASE_ONE};
use crate::SamplingError;

/// Fast resampler without band limiting.
#[derive(Clone, Copy, Debug)]
pub struct ZeroOrderResampler {
    cached_sample: f32,
    phase: PhaseAccumulator,
    output_value: f32,
}

impl ZeroOrderResampler {
    /// Creates a resampler from `clock_freq` down to `sample_freq`.
    pub fn new(clock_freq: f64, sample_freq: f64) -> Result<Self, SamplingError> {
        validate_rates(clock_freq, sample_freq)?;
        Ok(Self {
            cached_sample: 0.0,
            phase: PhaseAccumulator::new(clock_freq, sample_freq),
            output_value: 0.0,
        })
    }

    /// Input samples per output sample, fixed-point with 10 fractional bits.
    pub fn cycles_per_sample(&self) -> i32 {
        self.phase.cycles_per_sample
    }
}

impl Resampler for ZeroOrderResampler {
    #[inline]
    fn input(&mut self, sample: f32) -> bool {
        let ready = match self.phase.advance() {
            Some(subcycle) => {
                self.output_value = self.cached_sample
                    + subcycle as f32 * (sample - self.cached_sample) / PHASE_ONE as f32;
                true
            }
            None => false,
        };
        self.cached_sample = sample;
        ready
    }

    #[inline]
    fn output(&self) -> f32 {
        self.output_value
    }

    fn reset(&mut self) {
        self.cached_sample = 0.0;
        self.phase.reset();
        self.output_value = 0.0;
    }
}
